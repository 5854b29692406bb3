/// Inbound request headers, as handed over by the host HTTP layer.
///
/// Names are case-insensitive. A value is a single string or a list; the
/// protocol only ever reads the first element.
use std::collections::HashMap;

/// One header's value(s).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValues {
    Single(String),
    Multi(Vec<String>),
}

impl HeaderValues {
    /// First value, if any.
    pub fn first(&self) -> Option<&str> {
        match self {
            HeaderValues::Single(value) => Some(value),
            HeaderValues::Multi(values) => values.first().map(String::as_str),
        }
    }
}

impl From<String> for HeaderValues {
    fn from(value: String) -> Self {
        HeaderValues::Single(value)
    }
}

impl From<&str> for HeaderValues {
    fn from(value: &str) -> Self {
        HeaderValues::Single(value.to_string())
    }
}

impl From<Vec<String>> for HeaderValues {
    fn from(values: Vec<String>) -> Self {
        HeaderValues::Multi(values)
    }
}

/// Case-insensitive header map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    values: HashMap<String, HeaderValues>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing any previous value under the same name.
    pub fn insert(
        &mut self,
        name: impl AsRef<str>,
        value: impl Into<HeaderValues>,
    ) -> Option<HeaderValues> {
        self.values
            .insert(name.as_ref().to_ascii_lowercase(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&HeaderValues> {
        self.values.get(&name.to_ascii_lowercase())
    }

    /// First value of `name`, trimmed. `None` if absent.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(HeaderValues::first).map(str::trim)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: AsRef<str>,
    V: Into<HeaderValues>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

impl From<&http::HeaderMap> for Headers {
    /// Non-UTF-8 values are skipped.
    fn from(map: &http::HeaderMap) -> Self {
        let mut headers = Headers::new();
        for name in map.keys() {
            let mut values: Vec<String> = map
                .get_all(name)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .map(str::to_string)
                .collect();
            match values.len() {
                0 => {}
                1 => {
                    headers.insert(name.as_str(), values.remove(0));
                }
                _ => {
                    headers.insert(name.as_str(), values);
                }
            }
        }
        headers
    }
}
