//! Device store: the devices a hub reported, reconciled against snapshots.
//!
//! Membership is reconciled from device-list snapshots, values from
//! value-update events. Devices present both in the store and in a snapshot
//! are left untouched by [`DeviceStore::reconcile`].

use crate::device::Device;
use crate::error::NotFoundError;

/// Device membership changes produced by one reconciliation pass.
///
/// The caller turns these into `RequestSubscribeDevice` /
/// `RequestUnsubscribeDevice` commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Ids of devices that were added and must be subscribed to.
    pub added: Vec<String>,
    /// Ids of devices that were removed and must be unsubscribed from.
    pub removed: Vec<String>,
}

impl SyncOutcome {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// A pushed value change for one resource of one device.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct ValueUpdate {
    /// Device id.
    pub di: String,
    /// Resource path.
    pub resource: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Ordered collection of devices keyed by id.
#[derive(Debug, Clone, Default)]
pub struct DeviceStore {
    devices: Vec<Device>,
}

impl DeviceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a full device-list snapshot.
    ///
    /// Idempotent: applying the same snapshot twice yields the same device
    /// set and an empty [`SyncOutcome`] the second time. Duplicate ids within
    /// one snapshot are added once.
    pub fn reconcile(&mut self, snapshot: Vec<Device>) -> SyncOutcome {
        let mut outcome = SyncOutcome::default();

        let removed: Vec<String> = self
            .devices
            .iter()
            .filter(|known| !snapshot.iter().any(|d| d.id == known.id))
            .map(|known| known.id.clone())
            .collect();
        self.devices.retain(|d| !removed.contains(&d.id));
        outcome.removed = removed;

        for device in snapshot {
            if self.get(&device.id).is_none() {
                outcome.added.push(device.id.clone());
                self.devices.push(device);
            }
        }

        outcome
    }

    /// Overwrite one resource's raw value in place.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] when the device or its resource is unknown,
    /// which happens when the event races a pending unsubscribe.
    pub fn apply_value_update(&mut self, update: ValueUpdate) -> Result<(), NotFoundError> {
        let device = self
            .devices
            .iter_mut()
            .find(|d| d.id == update.di)
            .ok_or_else(|| NotFoundError {
                entity: "Device",
                id: update.di.clone(),
            })?;
        let resource = device
            .resource_mut(&update.resource)
            .ok_or_else(|| NotFoundError {
                entity: "Resource",
                id: format!("{}{}", update.di, update.resource),
            })?;
        resource.raw_value = update.value;
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Resource;
    use serde_json::json;

    fn device(id: &str, paths: &[&str]) -> Device {
        Device {
            id: id.to_string(),
            name: format!("Device {id}"),
            resources: paths
                .iter()
                .map(|p| Resource {
                    path: (*p).to_string(),
                    interface_type: "oic.if.a".to_string(),
                    resource_type: "oic.r.switch.binary".to_string(),
                    display_name: String::new(),
                    raw_value: json!({"value": false}),
                })
                .collect(),
        }
    }

    fn ids(store: &DeviceStore) -> Vec<&str> {
        store.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn should_add_every_device_on_first_snapshot() {
        let mut store = DeviceStore::new();
        let outcome = store.reconcile(vec![device("D1", &["/master"]), device("D2", &[])]);
        assert_eq!(outcome.added, vec!["D1", "D2"]);
        assert!(outcome.removed.is_empty());
        assert_eq!(ids(&store), vec!["D1", "D2"]);
    }

    #[test]
    fn should_produce_empty_outcome_when_snapshot_applied_twice() {
        let mut store = DeviceStore::new();
        let snapshot = vec![device("D1", &["/master"]), device("D2", &["/dim"])];
        store.reconcile(snapshot.clone());
        let before: Vec<Device> = store.iter().cloned().collect();

        let outcome = store.reconcile(snapshot);

        assert!(outcome.is_empty());
        let after: Vec<Device> = store.iter().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn should_remove_devices_absent_from_snapshot() {
        let mut store = DeviceStore::new();
        store.reconcile(vec![device("D1", &[]), device("D2", &[])]);

        let outcome = store.reconcile(vec![device("D2", &[])]);

        assert_eq!(outcome.removed, vec!["D1"]);
        assert!(outcome.added.is_empty());
        assert_eq!(ids(&store), vec!["D2"]);
    }

    #[test]
    fn should_keep_existing_device_values_when_snapshot_differs() {
        let mut store = DeviceStore::new();
        store.reconcile(vec![device("D1", &["/master"])]);
        store
            .apply_value_update(ValueUpdate {
                di: "D1".to_string(),
                resource: "/master".to_string(),
                value: json!({"value": true}),
            })
            .unwrap();

        store.reconcile(vec![device("D1", &["/master"])]);

        let value = &store.get("D1").unwrap().resource("/master").unwrap().raw_value;
        assert_eq!(value, &json!({"value": true}));
    }

    #[test]
    fn should_add_duplicate_ids_in_one_snapshot_once() {
        let mut store = DeviceStore::new();
        let outcome = store.reconcile(vec![device("D1", &[]), device("D1", &[])]);
        assert_eq!(outcome.added, vec!["D1"]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn should_empty_store_when_snapshot_is_empty() {
        let mut store = DeviceStore::new();
        store.reconcile(vec![device("D1", &[])]);
        let outcome = store.reconcile(vec![]);
        assert_eq!(outcome.removed, vec!["D1"]);
        assert!(store.is_empty());
    }

    #[test]
    fn should_reject_value_update_for_unknown_device() {
        let mut store = DeviceStore::new();
        let result = store.apply_value_update(ValueUpdate {
            di: "ghost".to_string(),
            resource: "/master".to_string(),
            value: json!({}),
        });
        assert_eq!(
            result,
            Err(NotFoundError {
                entity: "Device",
                id: "ghost".to_string()
            })
        );
    }

    #[test]
    fn should_reject_value_update_for_unknown_resource() {
        let mut store = DeviceStore::new();
        store.reconcile(vec![device("D1", &["/master"])]);
        let result = store.apply_value_update(ValueUpdate {
            di: "D1".to_string(),
            resource: "/dim".to_string(),
            value: json!({}),
        });
        assert!(matches!(result, Err(NotFoundError { entity: "Resource", .. })));
    }
}
