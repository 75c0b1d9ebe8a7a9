//! Axum router assembly.

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use hubgate_app::ports::TokenIntrospector;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Serves directives at `/`, hub sessions at `/connect`, and the operational
/// routes under `/api`. Includes a [`TraceLayer`] that logs each HTTP
/// request/response at the `DEBUG` level.
pub fn build<TI>(state: AppState<TI>) -> Router
where
    TI: TokenIntrospector + 'static,
{
    Router::new()
        .route("/", post(crate::api::directive::handle::<TI>))
        .route("/connect", get(crate::hub_socket::connect::<TI>))
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
