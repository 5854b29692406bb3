use std::time::Duration;

use crate::secret::AppSecret;

/// Default header carrying the correlation id.
pub const DEFAULT_ID_HEADER: &str = "x-0account-uuid";

/// Default header carrying the claim flag.
pub const DEFAULT_CLAIM_HEADER: &str = "x-0account-auth";

/// Default deposit body limit (1 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Environment variable read by [`HandoffConfig::from_env`].
pub const APP_SECRET_ENV: &str = "HANDOFF_APP_SECRET";

/// Configuration for a [`Handoff`](crate::Handoff).
///
/// Built once at startup and owned by the handler. Use the builder pattern:
///
/// ```rust
/// use handoff_protocol::HandoffConfig;
///
/// let config = HandoffConfig::new()
///     .app_secret("s3cret")
///     .id_header("x-correlation-id")
///     .max_body_size(64 * 1024);
/// ```
#[derive(Debug, Clone)]
pub struct HandoffConfig {
    /// Shared secret depositors must present. `None` rejects every request.
    pub(crate) app_secret: Option<AppSecret>,
    /// Header carrying the correlation id.
    pub(crate) id_header: String,
    /// Header carrying the claim flag.
    pub(crate) claim_header: String,
    /// Maximum deposit body size in bytes.
    pub(crate) max_body_size: usize,
    /// Outbound HTTP settings for the host application.
    pub(crate) http_client: HttpClientConfig,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl HandoffConfig {
    /// Create a config with defaults and no secret.
    pub fn new() -> Self {
        Self {
            app_secret: None,
            id_header: DEFAULT_ID_HEADER.to_string(),
            claim_header: DEFAULT_CLAIM_HEADER.to_string(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            http_client: HttpClientConfig::default(),
        }
    }

    /// Defaults, with the secret taken from `HANDOFF_APP_SECRET` if set.
    pub fn from_env() -> Self {
        let config = Self::new();
        match std::env::var(APP_SECRET_ENV) {
            Ok(secret) => config.app_secret(secret),
            Err(_) => config,
        }
    }

    /// Set the shared app secret. An empty string leaves it unset.
    pub fn app_secret(mut self, secret: impl Into<String>) -> Self {
        self.app_secret = AppSecret::new(secret);
        self
    }

    /// Set the correlation id header name (default: `x-0account-uuid`).
    pub fn id_header(mut self, name: impl Into<String>) -> Self {
        self.id_header = name.into();
        self
    }

    /// Set the claim flag header name (default: `x-0account-auth`).
    pub fn claim_header(mut self, name: impl Into<String>) -> Self {
        self.claim_header = name.into();
        self
    }

    /// Set the maximum deposit body size (default: 1 MB).
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Replace the outbound HTTP settings.
    pub fn http_client(mut self, http_client: HttpClientConfig) -> Self {
        self.http_client = http_client;
        self
    }

    /// Whether a secret is configured.
    pub fn has_secret(&self) -> bool {
        self.app_secret.is_some()
    }

    pub fn id_header_name(&self) -> &str {
        &self.id_header
    }

    pub fn claim_header_name(&self) -> &str {
        &self.claim_header
    }

    pub fn body_limit(&self) -> usize {
        self.max_body_size
    }

    pub fn http_client_settings(&self) -> &HttpClientConfig {
        &self.http_client
    }
}

/// Outbound HTTP client settings.
///
/// The handoff itself makes no outbound calls; these are carried for the
/// host application that builds its client next to the handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Maximum idle connections kept in the pool.
    pub max_idle_connections: usize,
    /// How long an idle connection stays pooled.
    pub idle_connection_timeout: Duration,
    /// TLS handshake timeout.
    pub tls_handshake_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            max_idle_connections: 100,
            idle_connection_timeout: Duration::from_secs(90),
            tls_handshake_timeout: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = HandoffConfig::new();
        assert!(!config.has_secret());
        assert_eq!(config.id_header_name(), "x-0account-uuid");
        assert_eq!(config.claim_header_name(), "x-0account-auth");
        assert_eq!(config.body_limit(), 1024 * 1024);
        assert_eq!(config.http_client_settings(), &HttpClientConfig::default());
    }

    #[test]
    fn empty_secret_is_unset() {
        assert!(!HandoffConfig::new().app_secret("").has_secret());
        assert!(HandoffConfig::new().app_secret("x").has_secret());
    }

    #[test]
    fn builder_overrides() {
        let http = HttpClientConfig {
            connect_timeout: Duration::from_secs(5),
            ..HttpClientConfig::default()
        };
        let config = HandoffConfig::new()
            .id_header("x-id")
            .claim_header("x-claim")
            .max_body_size(10)
            .http_client(http.clone());
        assert_eq!(config.id_header_name(), "x-id");
        assert_eq!(config.claim_header_name(), "x-claim");
        assert_eq!(config.body_limit(), 10);
        assert_eq!(config.http_client_settings(), &http);
    }

    #[test]
    fn debug_never_shows_secret() {
        let config = HandoffConfig::new().app_secret("s3cret");
        assert!(!format!("{config:?}").contains("s3cret"));
    }
}
