//! HTTP error response mapping.
//!
//! Control failures the voice assistant understands are answered with a
//! `200` error envelope; everything else becomes a bare status code.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use hubgate_domain::directive::{ControlFailure, Response as Envelope};
use hubgate_domain::error::{HubError, HubGateError, ValidationError};

/// Maps [`HubGateError`] to an HTTP response.
#[derive(Debug)]
pub struct ApiError(HubGateError);

impl From<HubGateError> for ApiError {
    fn from(err: HubGateError) -> Self {
        Self(err)
    }
}

fn envelope(failure: ControlFailure) -> Response {
    (StatusCode::OK, Json(Envelope::control_failure(failure))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            HubGateError::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            HubGateError::Upstream(err) => {
                tracing::error!(error = %err, "token introspection failed");
                StatusCode::BAD_GATEWAY.into_response()
            }
            HubGateError::NotFound(err) => {
                tracing::debug!(error = %err, "control target not found");
                envelope(ControlFailure::NoSuchTarget)
            }
            HubGateError::Validation(ValidationError::UnsupportedResource { path, .. }) => {
                tracing::debug!(%path, "unsupported operation on resource");
                envelope(ControlFailure::UnsupportedOperation)
            }
            HubGateError::Validation(err) => {
                tracing::warn!(error = %err, "rejecting malformed directive");
                StatusCode::BAD_REQUEST.into_response()
            }
            HubGateError::Hub(HubError::Disconnected) => envelope(ControlFailure::TargetOffline),
            HubGateError::Hub(HubError::Timeout(timeout)) => {
                tracing::warn!(?timeout, "hub did not confirm in time");
                StatusCode::GATEWAY_TIMEOUT.into_response()
            }
            HubGateError::Hub(HubError::Encode(reason)) => {
                tracing::error!(%reason, "failed to encode hub command");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
