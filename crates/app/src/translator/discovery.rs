//! Discovery: one appliance per switchable device and per dimmable resource.

use std::collections::BTreeMap;

use hubgate_domain::address::{ApplianceAddress, MASTER_RESOURCE};
use hubgate_domain::device::{Device, Resource};
use hubgate_domain::device_store::DeviceStore;
use hubgate_domain::dimming;
use hubgate_domain::directive::{ApplianceAction, DiscoveredAppliance};

use crate::registry::HubIdentity;

const MANUFACTURER: &str = "hubgate";
const APPLIANCE_VERSION: &str = "1";

/// Describe every controllable unit of one hub.
///
/// Devices without a `/master` resource contribute only their dimmable
/// resources; devices with neither contribute nothing.
#[must_use]
pub fn appliances(identity: &HubIdentity, store: &DeviceStore) -> Vec<DiscoveredAppliance> {
    let mut out = Vec::new();
    for device in store.iter() {
        if let Some(master) = device.resource(MASTER_RESOURCE) {
            out.push(switch_appliance(identity, device, master));
        }
        out.extend(
            device
                .resources
                .iter()
                .filter(|r| r.is_dimmable())
                .map(|r| dimmer_appliance(identity, device, r)),
        );
    }
    out
}

fn switch_appliance(identity: &HubIdentity, device: &Device, master: &Resource) -> DiscoveredAppliance {
    let address = ApplianceAddress::device(&identity.hub_id, &device.id);
    DiscoveredAppliance {
        appliance_id: address.to_string(),
        manufacturer_name: MANUFACTURER.to_string(),
        model_name: master.resource_type.clone(),
        version: APPLIANCE_VERSION.to_string(),
        friendly_name: device_name(device).to_string(),
        friendly_description: description(identity, device_name(device)),
        is_reachable: true,
        actions: vec![ApplianceAction::TurnOn, ApplianceAction::TurnOff],
        additional_appliance_details: details(identity, device, master),
    }
}

fn dimmer_appliance(identity: &HubIdentity, device: &Device, resource: &Resource) -> DiscoveredAppliance {
    let address = ApplianceAddress::resource(&identity.hub_id, &device.id, &resource.path);
    let label = if resource.display_name.is_empty() {
        resource.path.as_str()
    } else {
        resource.display_name.as_str()
    };
    let friendly_name = format!("{} {label}", device_name(device));

    let mut details = details(identity, device, resource);
    let max = dimming::range_max(&resource.raw_value);
    let setting = dimming::current_setting(&resource.raw_value);
    details.insert(
        "percentage".to_string(),
        dimming::to_percent(setting, max).to_string(),
    );

    DiscoveredAppliance {
        appliance_id: address.to_string(),
        manufacturer_name: MANUFACTURER.to_string(),
        model_name: resource.resource_type.clone(),
        version: APPLIANCE_VERSION.to_string(),
        friendly_description: description(identity, &friendly_name),
        friendly_name,
        is_reachable: true,
        actions: vec![
            ApplianceAction::SetPercentage,
            ApplianceAction::IncrementPercentage,
            ApplianceAction::DecrementPercentage,
        ],
        additional_appliance_details: details,
    }
}

fn device_name(device: &Device) -> &str {
    if device.name.is_empty() {
        &device.id
    } else {
        &device.name
    }
}

fn description(identity: &HubIdentity, name: &str) -> String {
    let hub = if identity.display_name.is_empty() {
        &identity.hub_id
    } else {
        &identity.display_name
    };
    format!("{name} connected via {hub}")
}

fn details(identity: &HubIdentity, device: &Device, resource: &Resource) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("hubId".to_string(), identity.hub_id.clone()),
        ("deviceId".to_string(), device.id.clone()),
        ("resource".to_string(), resource.path.clone()),
    ])
}
