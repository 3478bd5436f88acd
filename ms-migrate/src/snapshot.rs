use switchport_core::{DeviceConfig, PortConfig};

use crate::dashboard::{Dashboard, DashboardError};

/// Read a switch's device attributes.
pub fn fetch_device(dashboard: &dyn Dashboard, serial: &str) -> Result<DeviceConfig, DashboardError> {
    let fields = dashboard.get_device(serial)?;
    Ok(DeviceConfig::from_fields(&fields)?)
}

/// Read a switch's port configurations in the order the dashboard lists
/// them. A switch reporting no ports is an error.
pub fn fetch_ports(
    dashboard: &dyn Dashboard,
    serial: &str,
) -> Result<Vec<PortConfig>, DashboardError> {
    let ports = dashboard
        .get_ports(serial)?
        .iter()
        .map(PortConfig::from_fields)
        .collect::<Result<Vec<_>, _>>()?;

    if ports.is_empty() {
        return Err(DashboardError::EmptyResult {
            serial: serial.to_string(),
        });
    }
    Ok(ports)
}
