//! Shared application state for axum handlers.

use std::sync::Arc;

use hubgate_app::gateway::Gateway;
use hubgate_app::ports::TokenIntrospector;

/// Application state shared across all axum handlers.
///
/// `Clone` is implemented manually so the introspector itself does not need
/// to be `Clone`. Only the `Arc` wrapper is cloned.
pub struct AppState<TI> {
    pub gateway: Arc<Gateway<TI>>,
}

impl<TI> Clone for AppState<TI> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
        }
    }
}

impl<TI> AppState<TI>
where
    TI: TokenIntrospector + 'static,
{
    pub fn new(gateway: Gateway<TI>) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }
}
