use serde_json::Value;
use switchport_core::{DeviceConfig, Fields, UNDEPLOYED_TAG};
use thiserror::Error;
use tracing::info;

use crate::dashboard::{Dashboard, DashboardError};
use crate::snapshot::fetch_device;

#[derive(Debug, Error)]
pub enum TagError {
    #[error("error getting switch configuration for {serial}")]
    Fetch {
        serial: String,
        source: DashboardError,
    },
    #[error("error adding tag to switch {serial}")]
    Update {
        serial: String,
        source: DashboardError,
    },
}

/// Result of marking a switch as undeployed.
#[derive(Debug, Clone, PartialEq)]
pub enum TagOutcome {
    /// The tag was already present; nothing was written.
    AlreadyTagged(DeviceConfig),
    Tagged {
        before: DeviceConfig,
        response: Value,
        /// Device as re-read after the update.
        updated: DeviceConfig,
    },
}

/// Add the `undeployed` tag to a switch, writing only its tag list.
pub fn tag_undeployed(dashboard: &dyn Dashboard, serial: &str) -> Result<TagOutcome, TagError> {
    let fetch = |source| TagError::Fetch {
        serial: serial.to_string(),
        source,
    };

    let before = fetch_device(dashboard, serial).map_err(fetch)?;
    let mut device = before.clone();
    if !device.add_tag(UNDEPLOYED_TAG) {
        return Ok(TagOutcome::AlreadyTagged(before));
    }

    let tags = device.tags.unwrap_or_default();
    let mut fields = Fields::new();
    fields.insert(
        "tags".to_string(),
        Value::Array(tags.into_iter().map(Value::String).collect()),
    );
    let response = dashboard
        .update_device(serial, &fields)
        .map_err(|source| TagError::Update {
            serial: serial.to_string(),
            source,
        })?;
    info!(serial, "tag added");

    let updated = fetch_device(dashboard, serial).map_err(fetch)?;
    Ok(TagOutcome::Tagged {
        before,
        response,
        updated,
    })
}
