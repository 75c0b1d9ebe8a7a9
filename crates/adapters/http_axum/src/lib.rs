//! # hubgate-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the voice-assistant **directive endpoint** (`POST /`)
//! - Accept **hub sessions** over WebSocket (`GET /connect`) and pump their
//!   frames through the gateway
//! - Serve small operational endpoints (`/health`, `/api/hubs`)
//! - Map gateway results and errors into HTTP responses
//!
//! ## Dependency rule
//! Depends on `hubgate-app` (for the gateway and port traits) and
//! `hubgate-domain` (for envelope types). Never leaks axum types into the
//! domain.

pub mod api;
pub mod error;
pub mod hub_socket;
pub mod router;
pub mod state;
