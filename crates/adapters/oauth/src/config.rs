//! Token introspection configuration.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the introspection endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// Full URL of the introspection endpoint.
    pub introspection_url: String,
    /// Client id used for HTTP basic authentication.
    pub client_id: String,
    /// Client secret used for HTTP basic authentication.
    pub client_secret: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            introspection_url: "https://auth.wiklosoft.com/v1/oauth/introspect".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            timeout_secs: 10,
        }
    }
}

impl OAuthConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = OAuthConfig::default();
        assert!(config.introspection_url.ends_with("/v1/oauth/introspect"));
        assert!(config.client_id.is_empty());
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            introspection_url = "http://localhost:9000/introspect"
            client_id = "gateway"
            client_secret = "s3cret"
            timeout_secs = 3
        "#;
        let config: OAuthConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.introspection_url, "http://localhost:9000/introspect");
        assert_eq!(config.client_id, "gateway");
        assert_eq!(config.client_secret, "s3cret");
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn should_fill_missing_fields_with_defaults() {
        let config: OAuthConfig = toml::from_str(r#"client_id = "gateway""#).unwrap();
        assert_eq!(config.client_id, "gateway");
        assert_eq!(config.timeout_secs, 10);
    }
}
