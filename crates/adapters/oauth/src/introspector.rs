//! [`TokenIntrospector`] over an RFC 7662 introspection endpoint.

use hubgate_app::ports::TokenIntrospector;
use hubgate_domain::auth::TokenInfo;
use hubgate_domain::error::HubGateError;

use crate::config::OAuthConfig;
use crate::error::OAuthError;

/// Resolves bearer tokens by asking the configured authorization server.
#[derive(Debug, Clone)]
pub struct OAuthIntrospector {
    http: reqwest::Client,
    config: OAuthConfig,
}

impl OAuthIntrospector {
    /// Build an introspector with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::Client`] if the HTTP client cannot be built.
    pub fn new(config: OAuthConfig) -> Result<Self, OAuthError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("hubgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(OAuthError::Client)?;
        Ok(Self::from_reqwest(http, config))
    }

    /// Use an already configured client.
    #[must_use]
    pub fn from_reqwest(http: reqwest::Client, config: OAuthConfig) -> Self {
        Self { http, config }
    }

    async fn request(&self, token: &str) -> Result<TokenInfo, OAuthError> {
        let response = self
            .http
            .post(&self.config.introspection_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("token", token), ("token_type_hint", "access_token")])
            .send()
            .await
            .map_err(OAuthError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(OAuthError::Status(status.as_u16()));
        }
        response.json().await.map_err(OAuthError::Decode)
    }
}

impl TokenIntrospector for OAuthIntrospector {
    async fn introspect(&self, token: &str) -> Result<TokenInfo, HubGateError> {
        let info = self.request(token).await.inspect_err(|err| {
            tracing::warn!(error = %err, "token introspection failed");
        })?;
        tracing::debug!(active = info.active, username = %info.username, "token introspected");
        Ok(info)
    }
}
