/// Deposit envelope: the JSON body a webhook posts.
///
/// `{"metadata": {"appSecret": "...", "userId": "...", "profileId": "..."}, "data": ...}`
///
/// Values are held as raw JSON in their original key order. Stripping the
/// secret rewrites the `metadata` object and nothing else, so `data` and
/// every unknown key reach the claimer byte-for-byte.
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::value::RawValue;

use crate::error::HandoffError;

/// JSON object with raw values, in document order.
type RawFields = IndexMap<String, Box<RawValue>>;

const METADATA: &str = "metadata";
const DATA: &str = "data";
const APP_SECRET: &str = "appSecret";

/// Envelope metadata. Only `appSecret` is consumed by the protocol.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    fields: RawFields,
    app_secret: Option<String>,
    user_id: Option<String>,
    profile_id: Option<String>,
}

impl Metadata {
    fn from_raw(raw: &RawValue) -> Result<Self, HandoffError> {
        let fields: RawFields = serde_json::from_str(raw.get())
            .map_err(|e| malformed(format!("metadata: {e}")))?;
        Ok(Self {
            app_secret: string_field(&fields, APP_SECRET)?,
            user_id: string_field(&fields, "userId")?,
            profile_id: string_field(&fields, "profileId")?,
            fields,
        })
    }

    /// Shared secret presented by the depositor, until stripped.
    pub fn app_secret(&self) -> Option<&str> {
        self.app_secret.as_deref()
    }

    /// Caller-side user identifier, carried through.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Caller-side profile identifier, carried through.
    pub fn profile_id(&self) -> Option<&str> {
        self.profile_id.as_deref()
    }

    /// Any metadata key, as raw JSON.
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.fields.get(key).map(|raw| &**raw)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A deposit body, or a claimed payload decoded back.
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    metadata: Metadata,
    fields: RawFields,
}

impl Envelope {
    /// Parse an envelope from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, HandoffError> {
        let fields: RawFields =
            serde_json::from_slice(bytes).map_err(|e| malformed(e.to_string()))?;
        let metadata = match fields.get(METADATA) {
            Some(raw) => Metadata::from_raw(raw)?,
            None => Metadata::default(),
        };
        Ok(Self { metadata, fields })
    }

    /// Serialize to JSON bytes, keys in their original order.
    pub fn to_vec(&self) -> Result<Vec<u8>, HandoffError> {
        serde_json::to_vec(self)
            .map_err(|e| HandoffError::bad_request(format!("cannot encode envelope: {e}")))
    }

    /// Remove and return the app secret.
    pub fn strip_secret(&mut self) -> Option<String> {
        self.metadata.fields.shift_remove(APP_SECRET);
        self.metadata.app_secret.take()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// User id from metadata, if any.
    pub fn user_id(&self) -> Option<&str> {
        self.metadata.user_id()
    }

    /// Profile id from metadata, if any.
    pub fn profile_id(&self) -> Option<&str> {
        self.metadata.profile_id()
    }

    /// Caller payload exactly as it was deposited.
    pub fn data(&self) -> Option<&RawValue> {
        self.fields.get(DATA).map(|raw| &**raw)
    }

    /// Decode the caller payload. `None` when the envelope carries no `data`.
    pub fn decode_data<T: DeserializeOwned>(&self) -> Result<Option<T>, HandoffError> {
        self.data()
            .map(|raw| serde_json::from_str(raw.get()).map_err(|e| malformed(format!("data: {e}"))))
            .transpose()
    }

    /// Any top-level key, as raw JSON.
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.fields.get(key).map(|raw| &**raw)
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            if key == METADATA {
                map.serialize_entry(key, &self.metadata.fields)?;
            } else {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

fn malformed(detail: String) -> HandoffError {
    HandoffError::bad_request(format!("malformed envelope: {detail}"))
}

/// A string-or-null field. Any other JSON type is malformed.
fn string_field(fields: &RawFields, key: &str) -> Result<Option<String>, HandoffError> {
    match fields.get(key) {
        Some(raw) => serde_json::from_str::<Option<String>>(raw.get())
            .map_err(|e| malformed(format!("metadata.{key}: {e}"))),
        None => Ok(None),
    }
}
