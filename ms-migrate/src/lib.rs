//! Copy a Meraki switch's configuration onto another switch.
//!
//! The port and device records, the port topology reconciliation and the
//! target preconditions live in `switchport-core`. This crate connects them
//! to the dashboard and to an operator.
//!
//! - [`dashboard`]: the remote operations a migration needs
//! - [`meraki`]: blocking HTTP implementation of [`dashboard::Dashboard`]
//! - [`snapshot`]: fetch device and port records
//! - [`migrate`]: the migration sequence and its partial-failure rules
//! - [`confirm`]: operator confirmation prompt with timeout
//! - [`settings`]: TOML settings with embedded defaults
//! - [`tag`]: mark a switch as undeployed
//! - [`report`]: terminal rendering
//!
//! # Example
//!
//! ```ignore
//! use ms_migrate::meraki::{ApiKey, MerakiClient};
//! use ms_migrate::migrate::{migrate, MigrationRequest};
//! use ms_migrate::settings::default_settings;
//! use switchport_core::AutoConfirm;
//! use tokio_util::sync::CancellationToken;
//!
//! let settings = default_settings();
//! let client = MerakiClient::new(&settings.dashboard, ApiKey::new(key))?;
//! let mut request = MigrationRequest::new("Q2XX-SRC0-0001", "Q2XX-DST0-0001");
//! request.auto_confirm = true;
//! let report = migrate(&client, &request, &mut AutoConfirm, &CancellationToken::new(), &mut |_| {})?;
//! println!("applied {} ports", report.applied_ports.len());
//! ```

pub mod confirm;
pub mod dashboard;
pub mod meraki;
pub mod migrate;
pub mod report;
pub mod settings;
pub mod snapshot;
pub mod tag;
