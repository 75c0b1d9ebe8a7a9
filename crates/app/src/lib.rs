//! # hubgate-app
//!
//! Application layer: the request/response correlation engine, the
//! connection registry, the protocol translator, and **port definitions**.
//!
//! ## Responsibilities
//! - Turn an asynchronous, multiplexed hub connection into per-request
//!   call/response semantics ([`correlation`], [`connection`])
//! - Track live hub connections and their authenticated identity ([`registry`])
//! - Translate directives into hub commands and hub state into capability
//!   descriptions ([`translator`])
//! - Wire all of the above per inbound directive and per inbound hub
//!   message ([`gateway`])
//! - Define the **port traits** adapters implement (`TokenIntrospector`)
//!
//! ## Dependency rule
//! Depends on `hubgate-domain` only (plus `tokio` for channels, locks and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod connection;
pub mod correlation;
pub mod gateway;
pub mod ports;
pub mod registry;
pub mod translator;
