//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.

pub mod token_introspector;

pub use token_introspector::TokenIntrospector;
