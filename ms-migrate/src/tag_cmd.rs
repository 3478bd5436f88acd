use anyhow::Result;
use colored::{Color, Colorize};
use ms_migrate::dashboard::Dashboard;
use ms_migrate::report::{render_device, render_response, DEVICE_COLOR};
use ms_migrate::tag::{tag_undeployed, TagOutcome};
use switchport_core::UNDEPLOYED_TAG;

use crate::cli::TagArgs;

pub fn run_tag(args: TagArgs, dashboard: &dyn Dashboard) -> Result<()> {
    let serial = args.serial.as_str();
    match tag_undeployed(dashboard, serial)? {
        TagOutcome::AlreadyTagged(device) => {
            println!("{}", render_device("Switch device", &device, DEVICE_COLOR)?);
            println!("{serial} already has the \"{UNDEPLOYED_TAG}\" tag; nothing to do");
        }
        TagOutcome::Tagged {
            before,
            response,
            updated,
        } => {
            println!("{}", render_device("Switch device", &before, DEVICE_COLOR)?);
            println!("{}", format!("Added \"{UNDEPLOYED_TAG}\" tag").bright_green());
            println!("{}", render_response(&response));
            println!(
                "{}",
                render_device("Updated device config", &updated, Color::BrightGreen)?
            );
        }
    }
    Ok(())
}
