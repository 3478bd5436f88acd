use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Raw field mapping as returned by (or sent to) the dashboard API.
pub type Fields = Map<String, Value>;

/// Device attributes the dashboard reports but never accepts in an update.
const READ_ONLY_DEVICE_FIELDS: &[&str] = &["model", "mac"];

/// Errors produced while converting between raw field mappings and records.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The mapping could not be read as the requested record type.
    #[error("malformed {record} record: {source}")]
    Malformed {
        record: &'static str,
        source: serde_json::Error,
    },
    /// The record did not serialize to a JSON object.
    #[error("failed to encode {record} update payload: {source}")]
    Encode {
        record: &'static str,
        source: serde_json::Error,
    },
}

/// Device-level attributes of a switch.
///
/// Every attribute is optional. An attribute missing from the dashboard
/// response stays `None` and is never written back by an update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_plan_id: Option<String>,
}

impl DeviceConfig {
    /// Build a device record from a dashboard mapping, dropping unknown keys.
    pub fn from_fields(fields: &Fields) -> Result<Self, SnapshotError> {
        decode(fields, "device")
    }

    /// All attributes that carry a value, including read-only identity fields.
    pub fn to_fields(&self) -> Result<Fields, SnapshotError> {
        encode(self, "device")
    }

    /// Partial update payload: set, writable attributes only.
    pub fn to_update_fields(&self) -> Result<Fields, SnapshotError> {
        let mut fields = self.to_fields()?;
        for key in READ_ONLY_DEVICE_FIELDS {
            fields.remove(*key);
        }
        Ok(fields)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags
            .as_ref()
            .is_some_and(|tags| tags.iter().any(|t| t == tag))
    }

    /// Add `tag` unless already present. Returns whether the tag set changed.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        if self.has_tag(tag) {
            return false;
        }
        self.tags.get_or_insert_with(Vec::new).push(tag.to_string());
        true
    }

    /// Append `suffix` to the name. An unset name stays unset.
    pub fn append_name_suffix(&mut self, suffix: &str) {
        if let Some(name) = self.name.as_mut() {
            name.push_str(suffix);
        }
    }
}

/// Configuration of one switch port.
///
/// `port_id` identifies the port on its switch and is never part of an
/// update payload; everything else lives in [`PortSettings`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortConfig {
    pub port_id: String,
    #[serde(flatten)]
    pub settings: PortSettings,
}

/// Per-port settings copied between switches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poe_enabled: Option<bool>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub port_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_vlan: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_vlans: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isolation_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rstp_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stp_guard: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_negotiation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_schedule_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udld: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_policy_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_policy_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_allow_list: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sticky_mac_allow_list: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sticky_mac_allow_list_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storm_control_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adaptive_policy_group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_sgt_capable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flexible_stacking_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dai_trusted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Value>,
}

impl PortConfig {
    pub fn new(port_id: impl Into<String>, settings: PortSettings) -> Self {
        Self {
            port_id: port_id.into(),
            settings,
        }
    }

    /// Build a port record from a dashboard mapping, dropping unknown keys.
    pub fn from_fields(fields: &Fields) -> Result<Self, SnapshotError> {
        decode(fields, "port")
    }

    /// All set attributes including `portId`, for display.
    pub fn to_fields(&self) -> Result<Fields, SnapshotError> {
        encode(self, "port")
    }

    /// Partial update payload: set settings only, never `portId`.
    pub fn to_update_fields(&self) -> Result<Fields, SnapshotError> {
        encode(&self.settings, "port")
    }

    /// Numeric ordinal of the port, if `port_id` is a plain number.
    pub fn number(&self) -> Option<u32> {
        self.port_id.trim().parse().ok()
    }

    /// Copy of this port's settings under a different port number.
    pub fn renumbered(&self, number: u32) -> Self {
        Self::new(number.to_string(), self.settings.clone())
    }
}

fn decode<T: DeserializeOwned>(fields: &Fields, record: &'static str) -> Result<T, SnapshotError> {
    serde_json::from_value(Value::Object(fields.clone()))
        .map_err(|source| SnapshotError::Malformed { record, source })
}

fn encode<T: Serialize>(value: &T, record: &'static str) -> Result<Fields, SnapshotError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Ok(Fields::new()),
        Err(source) => Err(SnapshotError::Encode { record, source }),
    }
}
