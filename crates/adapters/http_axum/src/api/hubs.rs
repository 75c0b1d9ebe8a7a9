//! `GET /api/hubs`: live hub sessions.

use axum::Json;
use axum::extract::State;

use hubgate_app::gateway::HubStatus;
use hubgate_app::ports::TokenIntrospector;

use crate::state::AppState;

/// `GET /api/hubs`
pub async fn list<TI>(State(state): State<AppState<TI>>) -> Json<Vec<HubStatus>>
where
    TI: TokenIntrospector + 'static,
{
    Json(state.gateway.hubs().await)
}
