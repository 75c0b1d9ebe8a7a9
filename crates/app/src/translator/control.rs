//! Control: turn a decoded control action into the `RequestSetValue` to send.

use serde_json::json;

use hubgate_domain::address::{ApplianceAddress, MASTER_RESOURCE};
use hubgate_domain::device::{Device, Resource};
use hubgate_domain::dimming::{self, Step};
use hubgate_domain::directive::ControlAction;
use hubgate_domain::error::{HubGateError, NotFoundError, ValidationError};
use hubgate_domain::hub::HubCommand;

/// Build the command that carries out `action` on the addressed resource.
///
/// On/off always targets `/master`. Percentage actions target the
/// addressed resource and are computed against its current raw value.
///
/// # Errors
///
/// - [`HubGateError::NotFound`] when the device lacks the targeted resource.
/// - [`ValidationError::UnsupportedResource`] when a percentage action
///   addresses a resource that is not dimmable.
pub fn command_for(
    device: &Device,
    address: &ApplianceAddress,
    action: ControlAction,
) -> Result<HubCommand, HubGateError> {
    let command = match action {
        ControlAction::TurnOn | ControlAction::TurnOff => {
            let master = lookup(device, address, MASTER_RESOURCE)?;
            set_value(
                device,
                master,
                json!({ "value": action == ControlAction::TurnOn }),
            )
        }
        ControlAction::SetPercentage(percent) => {
            let resource = dimmable(device, address)?;
            let max = dimming::range_max(&resource.raw_value);
            set_value(
                device,
                resource,
                json!({ "dimmingSetting": dimming::set_value(percent, max) }),
            )
        }
        ControlAction::IncrementPercentage(delta) => step(device, address, delta, Step::Increase)?,
        ControlAction::DecrementPercentage(delta) => step(device, address, delta, Step::Decrease)?,
    };
    Ok(command)
}

fn step(
    device: &Device,
    address: &ApplianceAddress,
    delta: i64,
    direction: Step,
) -> Result<HubCommand, HubGateError> {
    let resource = dimmable(device, address)?;
    let max = dimming::range_max(&resource.raw_value);
    let current = dimming::current_setting(&resource.raw_value);
    let value = dimming::step_value(current, delta, max, direction);
    Ok(set_value(device, resource, json!({ "dimmingSetting": value })))
}

fn lookup<'a>(
    device: &'a Device,
    address: &ApplianceAddress,
    path: &str,
) -> Result<&'a Resource, NotFoundError> {
    device.resource(path).ok_or_else(|| NotFoundError {
        entity: "Resource",
        id: address.to_string(),
    })
}

fn dimmable<'a>(device: &'a Device, address: &ApplianceAddress) -> Result<&'a Resource, HubGateError> {
    let resource = lookup(device, address, address.resource_path())?;
    if !resource.is_dimmable() {
        return Err(ValidationError::UnsupportedResource {
            path: resource.path.clone(),
            resource_type: resource.resource_type.clone(),
        }
        .into());
    }
    Ok(resource)
}

fn set_value(device: &Device, resource: &Resource, value: serde_json::Value) -> HubCommand {
    HubCommand::RequestSetValue {
        di: device.id.clone(),
        resource: resource.path.clone(),
        value,
    }
}
