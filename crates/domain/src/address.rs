//! Appliance address: the identifier the voice-assistant side sees.
//!
//! Encodes `hubID`, `deviceID` and optionally a resource path so that the
//! triple survives being carried as a single opaque token:
//!
//! | Target | Encoding |
//! |--------|----------|
//! | whole device (`/master`) | `<hubID>:<deviceID>` |
//! | one resource | `<hubID>:<deviceID>:<path with '/' as '_'>` |

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Path of the on/off resource every switchable device exposes.
pub const MASTER_RESOURCE: &str = "/master";

const SEPARATOR: char = ':';

/// Decoded appliance address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApplianceAddress {
    pub hub_id: String,
    pub device_id: String,
    /// Resource path (with slashes), `None` when addressing the whole device.
    pub resource: Option<String>,
}

impl ApplianceAddress {
    /// Address a whole device (its `/master` resource).
    #[must_use]
    pub fn device(hub_id: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            hub_id: hub_id.into(),
            device_id: device_id.into(),
            resource: None,
        }
    }

    /// Address one resource of a device.
    #[must_use]
    pub fn resource(
        hub_id: impl Into<String>,
        device_id: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            hub_id: hub_id.into(),
            device_id: device_id.into(),
            resource: Some(path.into()),
        }
    }

    /// The resource path this address targets, `/master` for the 2-part form.
    #[must_use]
    pub fn resource_path(&self) -> &str {
        self.resource.as_deref().unwrap_or(MASTER_RESOURCE)
    }
}

impl fmt::Display for ApplianceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.hub_id, self.device_id)?;
        if let Some(path) = &self.resource {
            write!(f, "{SEPARATOR}{}", path.replace('/', "_"))?;
        }
        Ok(())
    }
}

impl FromStr for ApplianceAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ValidationError::MalformedAddress(s.to_string());
        let mut parts = s.splitn(3, SEPARATOR);
        let hub_id = parts.next().filter(|p| !p.is_empty()).ok_or_else(malformed)?;
        let device_id = parts.next().filter(|p| !p.is_empty()).ok_or_else(malformed)?;
        let resource = match parts.next() {
            None => None,
            Some("") => return Err(malformed()),
            Some(encoded) => Some(encoded.replace('_', "/")),
        };
        Ok(Self {
            hub_id: hub_id.to_string(),
            device_id: device_id.to_string(),
            resource,
        })
    }
}
