use std::fmt;

use subtle::ConstantTimeEq;

/// Shared app secret presented by depositors.
///
/// Never printed: `Debug` is redacted. Comparison is constant-time over the
/// bytes; only the length can leak through timing.
#[derive(Clone)]
pub struct AppSecret(String);

impl AppSecret {
    /// Wrap a secret. Empty strings are rejected.
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            None
        } else {
            Some(Self(secret))
        }
    }

    /// Whether `candidate` equals the secret.
    pub fn matches(&self, candidate: &str) -> bool {
        self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
    }

    /// Whether the secret appears anywhere in `bytes`.
    pub fn occurs_in(&self, bytes: &[u8]) -> bool {
        let needle = self.0.as_bytes();
        bytes.windows(needle.len()).any(|window| window == needle)
    }
}

impl fmt::Debug for AppSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AppSecret(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_secret_rejected() {
        assert!(AppSecret::new("").is_none());
    }

    #[test]
    fn matches_exactly() {
        let secret = AppSecret::new("s3cret").unwrap();
        assert!(secret.matches("s3cret"));
        assert!(!secret.matches("s3cre"));
        assert!(!secret.matches("s3cret "));
        assert!(!secret.matches("S3CRET"));
        assert!(!secret.matches(""));
    }

    #[test]
    fn debug_is_redacted() {
        let secret = AppSecret::new("s3cret").unwrap();
        assert_eq!(format!("{secret:?}"), "AppSecret(<redacted>)");
    }

    #[test]
    fn occurs_in_finds_substring() {
        let secret = AppSecret::new("s3cret").unwrap();
        assert!(secret.occurs_in(br#"{"appSecret":"s3cret"}"#));
        assert!(!secret.occurs_in(br#"{"metadata":{}}"#));
        assert!(!secret.occurs_in(b""));
    }
}
