//! Device: one hub-exposed device and the resources it carries.

use serde::{Deserialize, Serialize};

use crate::dimming::DIMMABLE_RESOURCE_TYPE;

/// A physical or logical device reported by a hub.
///
/// Created and removed only by [`DeviceStore::reconcile`](crate::device_store::DeviceStore::reconcile);
/// resource values are mutated in place by value-update events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Hub-assigned id, unique within one connection.
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Resources keyed by `path`, in the order the hub reported them.
    #[serde(default)]
    pub resources: Vec<Resource>,
}

/// One controllable/observable variable of a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Addressing key, e.g. `/master` or `/light/1`.
    pub path: String,
    #[serde(default)]
    pub interface_type: String,
    #[serde(default)]
    pub resource_type: String,
    #[serde(default, rename = "name")]
    pub display_name: String,
    /// Last value reported by the hub, kept opaque.
    #[serde(default, rename = "value")]
    pub raw_value: serde_json::Value,
}

impl Device {
    /// Look up a resource by path.
    #[must_use]
    pub fn resource(&self, path: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.path == path)
    }

    pub(crate) fn resource_mut(&mut self, path: &str) -> Option<&mut Resource> {
        self.resources.iter_mut().find(|r| r.path == path)
    }
}

impl Resource {
    /// Whether this resource carries percentage (dimming) semantics.
    #[must_use]
    pub fn is_dimmable(&self) -> bool {
        self.resource_type == DIMMABLE_RESOURCE_TYPE
    }
}
