//! `POST /`: the voice-assistant directive endpoint.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use hubgate_app::ports::TokenIntrospector;
use hubgate_domain::directive::{Directive, Response as Envelope};

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the directive endpoint.
pub enum DirectiveResponse {
    /// A synthesized discovery or confirmation envelope.
    Answered(Json<Envelope>),
    /// The directive is not implemented here; empty `200`.
    Unsupported,
    /// The body is not a directive; logged and rejected with `400`.
    Malformed,
}

impl IntoResponse for DirectiveResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Answered(json) => json.into_response(),
            Self::Unsupported => StatusCode::OK.into_response(),
            Self::Malformed => StatusCode::BAD_REQUEST.into_response(),
        }
    }
}

/// `POST /`
///
/// The body is parsed here rather than through the `Json` extractor so
/// malformed input is logged and answered with an empty `400`.
///
/// # Errors
///
/// Any gateway failure, mapped by [`ApiError`].
pub async fn handle<TI>(
    State(state): State<AppState<TI>>,
    body: String,
) -> Result<DirectiveResponse, ApiError>
where
    TI: TokenIntrospector + 'static,
{
    let directive: Directive = match serde_json::from_str(&body) {
        Ok(directive) => directive,
        Err(err) => {
            tracing::warn!(error = %err, "dropping malformed directive");
            return Ok(DirectiveResponse::Malformed);
        }
    };

    match state.gateway.handle_directive(&directive).await? {
        Some(envelope) => Ok(DirectiveResponse::Answered(Json(envelope))),
        None => {
            tracing::debug!(
                namespace = %directive.header.namespace,
                name = %directive.header.name,
                "unsupported directive"
            );
            Ok(DirectiveResponse::Unsupported)
        }
    }
}
