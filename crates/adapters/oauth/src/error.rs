//! OAuth adapter error types.

use hubgate_domain::error::HubGateError;

/// Errors specific to the token introspection adapter.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// The request did not complete (connect, timeout, …).
    #[error("introspection request failed")]
    Request(#[source] reqwest::Error),

    /// The authority answered with a non-success status.
    #[error("introspection endpoint returned status {0}")]
    Status(u16),

    /// The answer was not a valid introspection response.
    #[error("failed to decode introspection response")]
    Decode(#[source] reqwest::Error),
}

impl OAuthError {
    /// Convert into a [`HubGateError::Upstream`] for propagation across port
    /// boundaries.
    #[must_use]
    pub fn into_domain(self) -> HubGateError {
        HubGateError::Upstream(Box::new(self))
    }
}

impl From<OAuthError> for HubGateError {
    fn from(err: OAuthError) -> Self {
        err.into_domain()
    }
}
