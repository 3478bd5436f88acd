use anyhow::{Context, Result};
use ms_migrate::confirm::StdinConfirmer;
use ms_migrate::dashboard::Dashboard;
use ms_migrate::migrate::{migrate, MigrationEvent, MigrationRequest};
use ms_migrate::report::{
    render_applied_prefix, render_device, render_heading, render_migration_report, render_plan,
    render_response, DEVICE_COLOR, PORT_COLOR,
};
use ms_migrate::settings::Settings;
use switchport_core::SnapshotError;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cli::{MigrateArgs, OutputFormat};

pub fn run_migrate(args: MigrateArgs, dashboard: &dyn Dashboard, settings: &Settings) -> Result<()> {
    let cancel = CancellationToken::new();
    install_interrupt_handler(cancel.clone());

    let request = MigrationRequest {
        source_serial: args.source_serial.clone(),
        target_serial: args.target_serial.clone(),
        org_id: args.org_id.clone(),
        auto_confirm: args.yes,
        dry_run: args.dry_run,
        policy: settings.topology.policy(),
    };
    let mut confirmer = StdinConfirmer::stdin(settings.confirm.timeout(), cancel.clone());

    let text = args.format == OutputFormat::Text;
    let show_responses = !args.quiet;
    let mut on_event = |event: MigrationEvent<'_>| {
        if !text {
            return;
        }
        if let Err(err) = print_event(&event, show_responses) {
            warn!(%err, "failed to render migration progress");
        }
    };

    let report = match migrate(dashboard, &request, &mut confirmer, &cancel, &mut on_event) {
        Ok(report) => report,
        Err(err) => {
            if !err.applied_ports().is_empty() {
                eprintln!(
                    "{}",
                    render_applied_prefix(&args.target_serial, err.applied_ports())
                );
            }
            return Err(err).with_context(|| {
                format!(
                    "error migrating switch configuration from {} to {}",
                    args.source_serial, args.target_serial
                )
            });
        }
    };

    match args.format {
        OutputFormat::Text => println!("{}", render_migration_report(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn print_event(event: &MigrationEvent<'_>, show_responses: bool) -> Result<(), SnapshotError> {
    match event {
        MigrationEvent::DevicesFetched { source, target } => {
            println!("{}", render_device("Source device", source, DEVICE_COLOR)?);
            println!("{}", render_device("Target device", target, DEVICE_COLOR)?);
        }
        MigrationEvent::Planned { plan } => println!("{}", render_plan(plan)),
        MigrationEvent::Cloned { response } => {
            println!("{}", render_heading("Cloned switch configuration", DEVICE_COLOR));
            if show_responses {
                println!("{}", render_response(response));
            }
        }
        // Reported in the summary; the warning is already logged.
        MigrationEvent::CloneFailed { .. } => {}
        MigrationEvent::PortApplied { port_id, response } => {
            println!("{}", render_heading(&format!("Updated port {port_id}"), PORT_COLOR));
            if show_responses {
                println!("{}", render_response(response));
            }
        }
        MigrationEvent::DeviceApplied { response } => {
            println!("{}", render_heading("Updated switch configuration", DEVICE_COLOR));
            if show_responses {
                println!("{}", render_response(response));
            }
        }
    }
    Ok(())
}

fn install_interrupt_handler(cancel: CancellationToken) {
    let installed = ctrlc::set_handler(move || {
        if cancel.is_cancelled() {
            std::process::exit(130);
        }
        cancel.cancel();
        eprintln!("interrupt received; stopping before the next port (Ctrl-C again to exit now)");
    });
    if let Err(err) = installed {
        warn!(%err, "could not install interrupt handler");
    }
}
