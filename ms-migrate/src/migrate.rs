//! Switch-to-switch migration orchestration.
//!
//! ## Sequence
//!
//! 1. **Fetch** source and target device attributes
//! 2. **Gate** the target: not in use, tagged `undeployed`, confirmed
//! 3. **Fetch** source and target port lists
//! 4. **Reconcile** the source ports against the target's port count
//! 5. **Clone** via the dashboard's bulk copy when both switches are the
//!    same model and an organization id was given (failure is a warning)
//! 6. **Apply** each reconciled port, in ascending port order
//! 7. **Apply** the source device attributes, renamed `<name>-clone`
//!
//! Nothing is written to the target until steps 1-4 have succeeded.
//! Reconciliation runs before the bulk clone so a topology mismatch can
//! never leave a half-cloned target.
//!
//! ## Partial failure
//!
//! Port updates are not transactional. When one fails, the remaining ports
//! are skipped and the ports already written stay written; the error lists
//! them so the operator can resume by hand. A cancelled run stops the same
//! way, before the next port.

use serde::Serialize;
use serde_json::Value;
use switchport_core::{
    plan_reconciliation, Confirmer, DeviceConfig, GateError, PreconditionGate, Reconciliation,
    SnapshotError, TopologyClass, TopologyError, TopologyPolicy,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::dashboard::{Dashboard, DashboardError};
use crate::snapshot::{fetch_device, fetch_ports};

/// Appended to the source name when it is written to the target.
pub const CLONE_NAME_SUFFIX: &str = "-clone";

/// Parameters of one source -> target migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRequest {
    pub source_serial: String,
    pub target_serial: String,
    /// Enables the bulk clone for same-model switches.
    pub org_id: Option<String>,
    /// Skip the operator prompt.
    pub auto_confirm: bool,
    /// Stop after planning; write nothing.
    pub dry_run: bool,
    pub policy: TopologyPolicy,
}

impl MigrationRequest {
    pub fn new(source_serial: impl Into<String>, target_serial: impl Into<String>) -> Self {
        Self {
            source_serial: source_serial.into(),
            target_serial: target_serial.into(),
            org_id: None,
            auto_confirm: false,
            dry_run: false,
            policy: TopologyPolicy::default(),
        }
    }
}

/// Progress notifications emitted while a migration runs.
#[derive(Debug)]
pub enum MigrationEvent<'a> {
    DevicesFetched {
        source: &'a DeviceConfig,
        target: &'a DeviceConfig,
    },
    Planned {
        plan: &'a Reconciliation,
    },
    Cloned {
        response: &'a Value,
    },
    CloneFailed {
        error: &'a DashboardError,
    },
    PortApplied {
        port_id: &'a str,
        response: &'a Value,
    },
    DeviceApplied {
        response: &'a Value,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CloneOutcome {
    Skipped,
    Cloned,
    Failed { warning: String },
}

/// Summary of a finished migration (or of the plan, for a dry run).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationReport {
    pub source_serial: String,
    pub target_serial: String,
    pub dry_run: bool,
    pub source_class: TopologyClass,
    pub target_class: TopologyClass,
    pub synthesized_ports: usize,
    pub dropped_ports: usize,
    pub clone: CloneOutcome,
    pub planned_ports: Vec<String>,
    pub applied_ports: Vec<String>,
    pub device_name: Option<String>,
}

/// Reasons a migration stopped.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("failed to retrieve {what} for {serial}")]
    Retrieval {
        serial: String,
        what: &'static str,
        source: DashboardError,
    },
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error("cannot copy ports from {source_serial} to {target_serial}")]
    Topology {
        source_serial: String,
        target_serial: String,
        source: TopologyError,
    },
    #[error(transparent)]
    Payload(#[from] SnapshotError),
    #[error(
        "failed to update port {port_id} on {serial} ({} of {total} ports already applied)",
        .applied.len()
    )]
    PortApply {
        serial: String,
        port_id: String,
        applied: Vec<String>,
        total: usize,
        source: DashboardError,
    },
    #[error("failed to update device configuration for {serial} (all ports were applied)")]
    DeviceApply {
        serial: String,
        applied: Vec<String>,
        source: DashboardError,
    },
    #[error("migration to {serial} cancelled before {next_step} ({} ports applied)", .applied.len())]
    Cancelled {
        serial: String,
        applied: Vec<String>,
        next_step: String,
    },
}

impl MigrateError {
    /// Ports already written to the target when the migration stopped.
    pub fn applied_ports(&self) -> &[String] {
        match self {
            MigrateError::PortApply { applied, .. }
            | MigrateError::DeviceApply { applied, .. }
            | MigrateError::Cancelled { applied, .. } => applied,
            _ => &[],
        }
    }
}

/// Run one migration against `dashboard`.
///
/// `confirmer` is consulted only when the target passes its checks and the
/// request is neither auto-confirmed nor a dry run. `cancel` is checked
/// before every write in the port sequence.
pub fn migrate(
    dashboard: &dyn Dashboard,
    request: &MigrationRequest,
    confirmer: &mut dyn Confirmer,
    cancel: &CancellationToken,
    on_event: &mut dyn FnMut(MigrationEvent<'_>),
) -> Result<MigrationReport, MigrateError> {
    let source_serial = request.source_serial.as_str();
    let target_serial = request.target_serial.as_str();

    let mut source = fetch_device(dashboard, source_serial)
        .map_err(retrieval(source_serial, "device configuration"))?;
    let target = fetch_device(dashboard, target_serial)
        .map_err(retrieval(target_serial, "device configuration"))?;
    on_event(MigrationEvent::DevicesFetched {
        source: &source,
        target: &target,
    });

    let prompt = format!("Continue copying configuration from {source_serial} to {target_serial}?");
    PreconditionGate::new(
        &target,
        target_serial,
        prompt,
        request.auto_confirm || request.dry_run,
    )
    .run(confirmer)?;
    info!(source = source_serial, target = target_serial, "target passed preconditions");

    let source_ports = fetch_ports(dashboard, source_serial)
        .map_err(retrieval(source_serial, "port configurations"))?;
    let target_ports = fetch_ports(dashboard, target_serial)
        .map_err(retrieval(target_serial, "port configurations"))?;

    let plan = plan_reconciliation(&source_ports, target_ports.len(), &request.policy).map_err(
        |source| MigrateError::Topology {
            source_serial: source_serial.to_string(),
            target_serial: target_serial.to_string(),
            source,
        },
    )?;
    info!(
        from = %plan.source_class,
        to = %plan.target_class,
        ports = plan.ports.len(),
        "reconciled port topology"
    );
    on_event(MigrationEvent::Planned { plan: &plan });

    let mut report = MigrationReport {
        source_serial: source_serial.to_string(),
        target_serial: target_serial.to_string(),
        dry_run: request.dry_run,
        source_class: plan.source_class,
        target_class: plan.target_class,
        synthesized_ports: plan.synthesized,
        dropped_ports: plan.dropped,
        clone: CloneOutcome::Skipped,
        planned_ports: plan.ports.iter().map(|p| p.port_id.clone()).collect(),
        applied_ports: Vec::new(),
        device_name: None,
    };
    if request.dry_run {
        return Ok(report);
    }

    if let Some(org_id) = request.org_id.as_deref() {
        if source.model.is_some() && source.model == target.model {
            report.clone = match dashboard.clone_devices(org_id, source_serial, &[target_serial]) {
                Ok(response) => {
                    info!(org_id, "bulk clone accepted");
                    on_event(MigrationEvent::Cloned {
                        response: &response,
                    });
                    CloneOutcome::Cloned
                }
                Err(error) => {
                    warn!(%error, "bulk clone failed, continuing with per-port copy");
                    on_event(MigrationEvent::CloneFailed { error: &error });
                    CloneOutcome::Failed {
                        warning: format!(
                            "error cloning configuration from {source_serial} to {target_serial}: {error}"
                        ),
                    }
                }
            };
        }
    }

    let total = plan.ports.len();
    for port in &plan.ports {
        if cancel.is_cancelled() {
            return Err(MigrateError::Cancelled {
                serial: target_serial.to_string(),
                applied: report.applied_ports,
                next_step: format!("port {}", port.port_id),
            });
        }
        let fields = port.to_update_fields()?;
        match dashboard.update_port(target_serial, &port.port_id, &fields) {
            Ok(response) => {
                info!(port = %port.port_id, target = target_serial, "port updated");
                on_event(MigrationEvent::PortApplied {
                    port_id: &port.port_id,
                    response: &response,
                });
                report.applied_ports.push(port.port_id.clone());
            }
            Err(source) => {
                return Err(MigrateError::PortApply {
                    serial: target_serial.to_string(),
                    port_id: port.port_id.clone(),
                    applied: report.applied_ports,
                    total,
                    source,
                })
            }
        }
    }

    if cancel.is_cancelled() {
        return Err(MigrateError::Cancelled {
            serial: target_serial.to_string(),
            applied: report.applied_ports,
            next_step: "device update".to_string(),
        });
    }

    source.append_name_suffix(CLONE_NAME_SUFFIX);
    let fields = source.to_update_fields()?;
    match dashboard.update_device(target_serial, &fields) {
        Ok(response) => {
            info!(target = target_serial, name = ?source.name, "device updated");
            on_event(MigrationEvent::DeviceApplied {
                response: &response,
            });
        }
        Err(source) => {
            return Err(MigrateError::DeviceApply {
                serial: target_serial.to_string(),
                applied: report.applied_ports,
                source,
            })
        }
    }

    report.device_name = source.name;
    Ok(report)
}

fn retrieval<'a>(
    serial: &'a str,
    what: &'static str,
) -> impl FnOnce(DashboardError) -> MigrateError + 'a {
    move |source| MigrateError::Retrieval {
        serial: serial.to_string(),
        what,
        source,
    }
}
