//! # hubgate-domain
//!
//! Pure domain model for the hubgate voice-assistant ↔ hub gateway.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Devices** and their **Resources** as reported by a hub
//! - Define the **Device Store** and its snapshot reconciliation algorithm
//! - Define the **Appliance address** exposed to the voice-assistant side
//! - Define the **dimming** percentage ↔ raw value mapping
//! - Define the wire envelopes for both protocols (hub session and directives)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod address;
pub mod auth;
pub mod device;
pub mod device_store;
pub mod dimming;
pub mod directive;
pub mod hub;
