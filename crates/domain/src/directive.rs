//! Voice-assistant directives and the envelopes the gateway answers with.
//!
//! Every message is `{"header": {namespace, name, payloadVersion, messageId}, "payload": {...}}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::address::ApplianceAddress;
use crate::error::ValidationError;
use crate::id::MessageId;

pub const DISCOVERY_NAMESPACE: &str = "Alexa.ConnectedHome.Discovery";
pub const CONTROL_NAMESPACE: &str = "Alexa.ConnectedHome.Control";
pub const PAYLOAD_VERSION: &str = "2";

const DISCOVER_APPLIANCES_REQUEST: &str = "DiscoverAppliancesRequest";
const DISCOVER_APPLIANCES_RESPONSE: &str = "DiscoverAppliancesResponse";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub payload_version: String,
    #[serde(default)]
    pub message_id: String,
}

impl Header {
    /// Header for a gateway-originated message, with a fresh message id.
    #[must_use]
    pub fn response(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            payload_version: PAYLOAD_VERSION.to_string(),
            message_id: MessageId::new().to_string(),
        }
    }
}

/// An inbound directive.
#[derive(Debug, Clone, Deserialize)]
pub struct Directive {
    pub header: Header,
    #[serde(default)]
    pub payload: DirectivePayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectivePayload {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub appliance: Option<ApplianceRef>,
    #[serde(default)]
    pub percentage_state: Option<PercentageValue>,
    #[serde(default)]
    pub delta_percentage: Option<PercentageValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplianceRef {
    pub appliance_id: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PercentageValue {
    pub value: f64,
}

impl PercentageValue {
    /// Whole percent, truncated toward zero.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn whole(self) -> i64 {
        self.value.trunc() as i64
    }
}

/// Which handler a directive is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Discovery,
    Control,
    /// Anything this gateway does not implement; answered with an empty body.
    Unsupported,
}

impl Directive {
    #[must_use]
    pub fn kind(&self) -> DirectiveKind {
        let namespace = self.header.namespace.as_str();
        if namespace.ends_with(".Discovery") && self.header.name == DISCOVER_APPLIANCES_REQUEST {
            DirectiveKind::Discovery
        } else if namespace.ends_with(".Control") {
            DirectiveKind::Control
        } else {
            DirectiveKind::Unsupported
        }
    }

    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.payload.access_token
    }
}

/// What a control directive asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    TurnOn,
    TurnOff,
    SetPercentage(i64),
    IncrementPercentage(i64),
    DecrementPercentage(i64),
}

impl ControlAction {
    #[must_use]
    pub fn confirmation_name(self) -> &'static str {
        match self {
            Self::TurnOn => "TurnOnConfirmation",
            Self::TurnOff => "TurnOffConfirmation",
            Self::SetPercentage(_) => "SetPercentageConfirmation",
            Self::IncrementPercentage(_) => "IncrementPercentageConfirmation",
            Self::DecrementPercentage(_) => "DecrementPercentageConfirmation",
        }
    }
}

/// A decoded control directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRequest {
    pub address: ApplianceAddress,
    pub action: ControlAction,
}

impl ControlRequest {
    /// Decode a control directive.
    ///
    /// Returns `Ok(None)` for directive names this gateway does not implement.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the appliance id or the percentage
    /// field the directive needs is missing or malformed.
    pub fn from_directive(directive: &Directive) -> Result<Option<Self>, ValidationError> {
        let payload = &directive.payload;
        let percentage = |field: Option<PercentageValue>, name: &'static str| {
            field
                .map(PercentageValue::whole)
                .ok_or(ValidationError::MissingField(name))
        };
        let action = match directive.header.name.as_str() {
            "TurnOnRequest" => ControlAction::TurnOn,
            "TurnOffRequest" => ControlAction::TurnOff,
            "SetPercentageRequest" => ControlAction::SetPercentage(percentage(
                payload.percentage_state,
                "percentageState",
            )?),
            "IncrementPercentageRequest" => ControlAction::IncrementPercentage(percentage(
                payload.delta_percentage,
                "deltaPercentage",
            )?),
            "DecrementPercentageRequest" => ControlAction::DecrementPercentage(percentage(
                payload.delta_percentage,
                "deltaPercentage",
            )?),
            _ => return Ok(None),
        };
        let appliance_id = payload
            .appliance
            .as_ref()
            .map(|a| a.appliance_id.as_str())
            .ok_or(ValidationError::MissingField("appliance"))?;
        Ok(Some(Self {
            address: appliance_id.parse()?,
            action,
        }))
    }
}

/// Control errors reported back to the voice assistant as an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFailure {
    /// The addressed hub, device, or resource is unknown.
    NoSuchTarget,
    /// The owning hub went away while the request was in flight.
    TargetOffline,
    /// The resource does not support the requested operation.
    UnsupportedOperation,
}

impl ControlFailure {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::NoSuchTarget => "NoSuchTargetError",
            Self::TargetOffline => "TargetOfflineError",
            Self::UnsupportedOperation => "UnsupportedOperationError",
        }
    }
}

/// Action an appliance advertises during discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ApplianceAction {
    TurnOn,
    TurnOff,
    SetPercentage,
    IncrementPercentage,
    DecrementPercentage,
}

/// One capability entry of a discovery response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredAppliance {
    pub appliance_id: String,
    pub manufacturer_name: String,
    pub model_name: String,
    pub version: String,
    pub friendly_name: String,
    pub friendly_description: String,
    pub is_reachable: bool,
    pub actions: Vec<ApplianceAction>,
    pub additional_appliance_details: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryPayload {
    pub discovered_appliances: Vec<DiscoveredAppliance>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmptyPayload {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponsePayload {
    Discovery(DiscoveryPayload),
    Empty(EmptyPayload),
}

/// A gateway-synthesized answer to a directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub header: Header,
    pub payload: ResponsePayload,
}

impl Response {
    #[must_use]
    pub fn discovery(appliances: Vec<DiscoveredAppliance>) -> Self {
        Self {
            header: Header::response(DISCOVERY_NAMESPACE, DISCOVER_APPLIANCES_RESPONSE),
            payload: ResponsePayload::Discovery(DiscoveryPayload {
                discovered_appliances: appliances,
            }),
        }
    }

    #[must_use]
    pub fn confirmation(action: ControlAction) -> Self {
        Self {
            header: Header::response(CONTROL_NAMESPACE, action.confirmation_name()),
            payload: ResponsePayload::Empty(EmptyPayload {}),
        }
    }

    #[must_use]
    pub fn control_failure(failure: ControlFailure) -> Self {
        Self {
            header: Header::response(CONTROL_NAMESPACE, failure.name()),
            payload: ResponsePayload::Empty(EmptyPayload {}),
        }
    }
}
