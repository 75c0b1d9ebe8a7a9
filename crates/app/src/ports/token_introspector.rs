//! Token introspection port: resolves a bearer token to a username.

use std::future::Future;

use hubgate_domain::auth::TokenInfo;
use hubgate_domain::error::HubGateError;

/// External authority that, given a bearer token, answers `{active, username}`.
pub trait TokenIntrospector: Send + Sync {
    /// Introspect `token`.
    ///
    /// An inactive token is a successful answer (`active == false`); errors
    /// are reserved for failures to reach or understand the authority.
    fn introspect(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<TokenInfo, HubGateError>> + Send;
}

impl<T: TokenIntrospector> TokenIntrospector for std::sync::Arc<T> {
    fn introspect(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<TokenInfo, HubGateError>> + Send {
        (**self).introspect(token)
    }
}
