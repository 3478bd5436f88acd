//! Switch configuration snapshots and the safety logic for copying them
//! between switches of possibly different sizes.
//!
//! - [`model`]: device and port records read from the dashboard, and the
//!   partial update payloads built from them
//! - [`topology`]: chassis size inference and port list reconciliation
//! - [`gate`]: preconditions a target switch must meet before it is changed
//!
//! Nothing here performs I/O; callers fetch records and apply the results.

pub mod gate;
pub mod model;
pub mod topology;

pub use gate::{
    AutoConfirm, ConfirmAnswer, Confirmer, GateError, GateState, PreconditionGate, UNDEPLOYED_TAG,
};
pub use model::{DeviceConfig, Fields, PortConfig, PortSettings, SnapshotError};
pub use topology::{
    nearest_class_at_or_below, plan_reconciliation, reconcile, Reconciliation, Side,
    TopologyClass, TopologyError, TopologyPolicy,
};
