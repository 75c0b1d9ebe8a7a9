//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`HubGateError`] via `#[from]` (or an `into_domain` helper for adapters).

use std::time::Duration;

/// Top-level error shared by every crate of the workspace.
#[derive(Debug, thiserror::Error)]
pub enum HubGateError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("hub error")]
    Hub(#[from] HubError),

    /// The bearer token is inactive or does not resolve to a username.
    #[error("unauthorized")]
    Unauthorized,

    /// An external collaborator (token introspection, …) failed.
    #[error("upstream error")]
    Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Malformed or unsupported input.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("malformed appliance address {0:?}")]
    MalformedAddress(String),

    #[error("missing field {0}")]
    MissingField(&'static str),

    #[error("resource {path} of type {resource_type:?} does not support percentage control")]
    UnsupportedResource { path: String, resource_type: String },

    #[error("malformed {message} payload: {reason}")]
    MalformedPayload {
        message: &'static str,
        reason: String,
    },
}

/// A hub, device, or resource that is not currently known.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Failures of a correlated exchange with a hub connection.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HubError {
    /// The connection closed before (or while) the request was in flight.
    #[error("hub disconnected")]
    Disconnected,

    /// No reply arrived within the allotted time.
    #[error("hub did not reply within {0:?}")]
    Timeout(Duration),

    /// The outbound envelope could not be serialized.
    #[error("failed to encode hub command: {0}")]
    Encode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_not_found_into_top_level_error() {
        let err: HubGateError = NotFoundError {
            entity: "Device",
            id: "D1".to_string(),
        }
        .into();
        assert!(matches!(err, HubGateError::NotFound(_)));
    }

    #[test]
    fn should_display_not_found_with_entity_and_id() {
        let err = NotFoundError {
            entity: "Hub",
            id: "H1".to_string(),
        };
        assert_eq!(err.to_string(), "Hub H1 not found");
    }

    #[test]
    fn should_display_timeout_with_duration() {
        let err = HubError::Timeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "hub did not reply within 5s");
    }

    #[test]
    fn should_convert_hub_error_into_top_level_error() {
        let err: HubGateError = HubError::Disconnected.into();
        assert!(matches!(err, HubGateError::Hub(HubError::Disconnected)));
    }
}
