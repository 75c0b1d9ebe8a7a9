//! Protocol translator: hub device state to appliances, directives to hub
//! commands.
//!
//! Pure functions over a [`DeviceStore`](hubgate_domain::device_store::DeviceStore)
//! snapshot; callers hold the connection lock while translating.

pub mod control;
pub mod discovery;

pub use control::command_for;
pub use discovery::appliances;
