//! HTTP handler modules.

pub mod directive;
pub mod hubs;

use axum::Router;
use axum::routing::get;

use hubgate_app::ports::TokenIntrospector;

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<TI>() -> Router<AppState<TI>>
where
    TI: TokenIntrospector + 'static,
{
    Router::new().route("/hubs", get(hubs::list::<TI>))
}
