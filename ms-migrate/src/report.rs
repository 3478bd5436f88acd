use colored::{Color, Colorize};
use serde_json::Value;
use switchport_core::{DeviceConfig, Fields, PortConfig, Reconciliation, SnapshotError};

use crate::migrate::{CloneOutcome, MigrationReport};

pub const DEVICE_COLOR: Color = Color::Cyan;
pub const PORT_COLOR: Color = Color::BrightMagenta;

/// Render a section banner, e.g. `---- Source device ----`.
pub fn render_heading(title: &str, color: Color) -> String {
    format!("---- {title} ----").color(color).reversed().to_string()
}

/// Render every set attribute of a device under `title`.
pub fn render_device(
    title: &str,
    device: &DeviceConfig,
    color: Color,
) -> Result<String, SnapshotError> {
    let mut out = vec![render_heading(title, color)];
    out.extend(field_lines(&device.to_fields()?, color));
    Ok(out.join("\n"))
}

/// Render every set setting of a port under a `Port <id>` banner.
pub fn render_port(port: &PortConfig) -> Result<String, SnapshotError> {
    let mut out = vec![render_heading(&format!("Port {}", port.port_id), PORT_COLOR)];
    out.extend(field_lines(&port.to_update_fields()?, PORT_COLOR));
    Ok(out.join("\n"))
}

/// One-line description of how the source ports map onto the target.
pub fn render_plan(plan: &Reconciliation) -> String {
    let mut line = format!(
        "plan source={} target={} ports={}",
        plan.source_class,
        plan.target_class,
        plan.ports.len()
    );
    if plan.synthesized > 0 {
        line.push_str(&format!(
            " synthesized={} (copied from first port)",
            plan.synthesized
        ));
    }
    if plan.dropped > 0 {
        line.push_str(&format!(" dropped={}", plan.dropped));
    }
    line.yellow().to_string()
}

/// Compact rendering of a dashboard response body.
pub fn render_response(response: &Value) -> String {
    match response {
        Value::Null => "(no content)".dimmed().to_string(),
        other => other.to_string().dimmed().to_string(),
    }
}

/// Final migration summary.
pub fn render_migration_report(report: &MigrationReport) -> String {
    let mut out = Vec::new();
    let status = if report.dry_run {
        "planned".yellow()
    } else {
        "migrated".green()
    };
    out.push(format!(
        "{status} source={} target={} topology={}->{}",
        report.source_serial, report.target_serial, report.source_class, report.target_class
    ));
    match &report.clone {
        CloneOutcome::Skipped => out.push("clone: skipped".to_string()),
        CloneOutcome::Cloned => out.push("clone: ok".to_string()),
        CloneOutcome::Failed { warning } => {
            out.push(format!("clone: failed ({warning})").yellow().to_string())
        }
    }
    if report.dry_run {
        out.push(format!(
            "ports to apply ({}): {}",
            report.planned_ports.len(),
            compress_ports(&report.planned_ports)
        ));
    } else {
        out.push(format!(
            "ports applied ({}): {}",
            report.applied_ports.len(),
            compress_ports(&report.applied_ports)
        ));
    }
    if let Some(name) = &report.device_name {
        out.push(format!("device name: {name}"));
    }
    out.join("\n")
}

/// Ports already written before a failure, for manual resumption.
pub fn render_applied_prefix(target_serial: &str, applied: &[String]) -> String {
    if applied.is_empty() {
        return format!("no ports were changed on {target_serial}");
    }
    format!(
        "ports already updated on {target_serial} ({}): {}",
        applied.len(),
        compress_ports(applied)
    )
    .red()
    .to_string()
}

fn field_lines(fields: &Fields, color: Color) -> Vec<String> {
    fields
        .iter()
        .map(|(key, value)| format!("{key}: {}", display_value(value)).color(color).to_string())
        .collect()
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Collapse consecutive numeric ids, e.g. `1-24, 49-52`.
fn compress_ports(ids: &[String]) -> String {
    if ids.is_empty() {
        return "none".to_string();
    }
    let mut parts: Vec<String> = Vec::new();
    let mut run: Option<(u32, u32)> = None;
    for id in ids {
        match (id.parse::<u32>().ok(), run) {
            (Some(n), Some((start, end))) if end.checked_add(1) == Some(n) => run = Some((start, n)),
            (Some(n), current) => {
                if let Some(range) = current {
                    parts.push(format_range(range));
                }
                run = Some((n, n));
            }
            (None, current) => {
                if let Some(range) = current {
                    parts.push(format_range(range));
                }
                run = None;
                parts.push(id.clone());
            }
        }
    }
    if let Some(range) = run {
        parts.push(format_range(range));
    }
    parts.join(", ")
}

fn format_range((start, end): (u32, u32)) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{start}-{end}")
    }
}
