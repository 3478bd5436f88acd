use anyhow::{Context, Result};
use ms_migrate::dashboard::Dashboard;
use ms_migrate::report::{render_device, render_port, DEVICE_COLOR};
use ms_migrate::snapshot::{fetch_device, fetch_ports};
use serde::Serialize;
use switchport_core::{DeviceConfig, PortConfig};

use crate::cli::{DisplayArgs, OutputFormat};

#[derive(Debug, Serialize)]
struct SwitchSnapshot<'a> {
    serial: &'a str,
    device: DeviceConfig,
    ports: Vec<PortConfig>,
}

pub fn run_display(args: DisplayArgs, dashboard: &dyn Dashboard) -> Result<()> {
    let serial = args.serial.as_str();
    let device = fetch_device(dashboard, serial)
        .with_context(|| format!("error getting switch configuration for {serial}"))?;
    let ports = fetch_ports(dashboard, serial)
        .with_context(|| format!("error getting port configurations on switch {serial}"))?;

    match args.format {
        OutputFormat::Text => {
            println!("{}", render_device("Switch device", &device, DEVICE_COLOR)?);
            for port in &ports {
                println!("{}", render_port(port)?);
            }
        }
        OutputFormat::Json => {
            let snapshot = SwitchSnapshot {
                serial,
                device,
                ports,
            };
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }

    Ok(())
}
