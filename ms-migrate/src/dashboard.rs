use serde_json::Value;
use switchport_core::{Fields, SnapshotError};
use thiserror::Error;

/// Errors returned by dashboard operations.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Request never produced an HTTP response.
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        source: reqwest::Error,
    },
    /// Dashboard has no such resource.
    #[error("{path} not found")]
    NotFound { path: String },
    /// Dashboard answered with a non-success status.
    #[error("dashboard returned {status} for {path}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },
    /// Still rate limited after every retry.
    #[error("rate limited on {path} after {attempts} attempts")]
    RateLimited { path: String, attempts: u32 },
    /// Response body was not the expected JSON shape.
    #[error("unexpected response from {path}: {detail}")]
    Decode { path: String, detail: String },
    /// Response body did not describe a valid record.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    /// Port listing came back empty.
    #[error("response contained zero port configurations for switch {serial}")]
    EmptyResult { serial: String },
}

/// Remote device-management operations a migration needs.
///
/// Implementations block until the dashboard answers. Updates are partial:
/// keys absent from `fields` are left untouched on the device.
pub trait Dashboard {
    fn get_device(&self, serial: &str) -> Result<Fields, DashboardError>;

    fn get_ports(&self, serial: &str) -> Result<Vec<Fields>, DashboardError>;

    fn update_device(&self, serial: &str, fields: &Fields) -> Result<Value, DashboardError>;

    fn update_port(
        &self,
        serial: &str,
        port_id: &str,
        fields: &Fields,
    ) -> Result<Value, DashboardError>;

    /// Best-effort bulk copy between switches of the same model.
    fn clone_devices(
        &self,
        org_id: &str,
        source_serial: &str,
        target_serials: &[&str],
    ) -> Result<Value, DashboardError>;
}
