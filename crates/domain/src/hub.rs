//! Hub session protocol: JSON envelopes exchanged over the duplex channel.
//!
//! Outbound: `{"mid": <u64>, "name": <string>, "payload": <object>}`.
//! Inbound: the same shape, with `mid` present only on replies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::device::Device;
use crate::device_store::ValueUpdate;
use crate::error::ValidationError;
use crate::id::RequestId;

pub const REQUEST_AUTHORIZE: &str = "RequestAuthorize";
pub const EVENT_DEVICE_LIST_UPDATE: &str = "EventDeviceListUpdate";
pub const EVENT_VALUE_UPDATE: &str = "EventValueUpdate";

/// A command the gateway issues to a hub.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "name", content = "payload")]
pub enum HubCommand {
    RequestGetDevices {},
    RequestSubscribeDevice {
        uuid: String,
    },
    RequestUnsubscribeDevice {
        uuid: String,
    },
    RequestSetValue {
        di: String,
        resource: String,
        value: Value,
    },
}

impl HubCommand {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::RequestGetDevices {} => "RequestGetDevices",
            Self::RequestSubscribeDevice { .. } => "RequestSubscribeDevice",
            Self::RequestUnsubscribeDevice { .. } => "RequestUnsubscribeDevice",
            Self::RequestSetValue { .. } => "RequestSetValue",
        }
    }

    /// Serialize this command under correlation id `mid`.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if a payload value cannot be encoded.
    pub fn encode(&self, mid: RequestId) -> Result<String, serde_json::Error> {
        serde_json::to_string(&CommandEnvelope { mid, command: self })
    }
}

#[derive(Serialize)]
struct CommandEnvelope<'a> {
    mid: RequestId,
    #[serde(flatten)]
    command: &'a HubCommand,
}

/// Any message received from a hub.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HubMessage {
    /// Raw `mid`. Only positive values can name a gateway command; see
    /// [`HubMessage::reply_to`].
    #[serde(default)]
    pub mid: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub payload: Value,
}

/// `RequestAuthorize` payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthorizeRequest {
    pub token: String,
    /// Stable hub identifier, becomes the hub id of the connection.
    pub uuid: String,
    #[serde(default)]
    pub name: String,
}

/// Full device list, pushed by `EventDeviceListUpdate` or returned by
/// `RequestGetDevices`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeviceList {
    #[serde(default)]
    pub devices: Vec<Device>,
}

/// Hub-originated messages the gateway understands.
#[derive(Debug, Clone, PartialEq)]
pub enum HubEvent {
    Authorize(AuthorizeRequest),
    DeviceListUpdate(DeviceList),
    ValueUpdate(ValueUpdate),
    /// Any other name; ignored by the gateway.
    Unknown(String),
}

impl HubMessage {
    /// Parse a raw text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedPayload`] when the frame is not a
    /// JSON envelope.
    pub fn parse(frame: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(frame).map_err(|err| ValidationError::MalformedPayload {
            message: "hub envelope",
            reason: err.to_string(),
        })
    }

    /// The command this message answers, if `mid` can name one.
    ///
    /// Ids are allocated from 1, so zero and negative values are treated as
    /// absent.
    #[must_use]
    pub fn reply_to(&self) -> Option<RequestId> {
        self.mid
            .and_then(|mid| u64::try_from(mid).ok())
            .filter(|mid| *mid > 0)
            .map(RequestId::new)
    }

    /// Interpret the payload according to the message name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedPayload`] when a recognised
    /// message carries a payload of the wrong shape.
    pub fn event(&self) -> Result<HubEvent, ValidationError> {
        match self.name.as_str() {
            REQUEST_AUTHORIZE => decode(REQUEST_AUTHORIZE, &self.payload).map(HubEvent::Authorize),
            EVENT_DEVICE_LIST_UPDATE => {
                decode(EVENT_DEVICE_LIST_UPDATE, &self.payload).map(HubEvent::DeviceListUpdate)
            }
            EVENT_VALUE_UPDATE => {
                decode(EVENT_VALUE_UPDATE, &self.payload).map(HubEvent::ValueUpdate)
            }
            other => Ok(HubEvent::Unknown(other.to_string())),
        }
    }
}

/// Decode a reply or event payload into a typed value.
///
/// # Errors
///
/// Returns [`ValidationError::MalformedPayload`] tagged with `message`.
pub fn decode<T: serde::de::DeserializeOwned>(
    message: &'static str,
    payload: &Value,
) -> Result<T, ValidationError> {
    T::deserialize(payload).map_err(|err| ValidationError::MalformedPayload {
        message,
        reason: err.to_string(),
    })
}
