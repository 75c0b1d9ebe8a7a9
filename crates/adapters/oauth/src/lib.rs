//! # hubgate-adapter-oauth
//!
//! Token introspection adapter over HTTP, built on
//! [reqwest](https://docs.rs/reqwest).
//!
//! ## Responsibilities
//! - Implement the `TokenIntrospector` port from `hubgate-app`
//! - POST an RFC 7662 introspection request authenticated with the client's
//!   credentials, and decode the `{active, username}` answer
//!
//! ## Dependency rule
//! Depends on `hubgate-app` (for the port trait) and `hubgate-domain` (for
//! [`TokenInfo`](hubgate_domain::auth::TokenInfo) and error types).

pub mod config;
pub mod error;
pub mod introspector;

pub use config::OAuthConfig;
pub use error::OAuthError;
pub use introspector::OAuthIntrospector;
