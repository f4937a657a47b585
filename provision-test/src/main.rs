// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::env;

use log::{debug, info, warn};
use miette::IntoDiagnostic;
use provisioning::{EventDocument, Provisioner, AE_REASON, AE_RESULT, AE_RETRY_INTERVAL};

/// Loads an event document and runs it against its mock VMs
///
/// # Arguments
///
/// * `path` - Path to a KDL event document
fn provision_event(path: &str) -> miette::Result<()> {
    info!("Loading event from {path}");
    let mut doc = EventDocument::new_for_path(path)?;
    debug!("Declared vms: {:?}", doc.vms.keys().collect::<Vec<_>>());

    let provisioner = Provisioner::new(&doc.context);
    match provisioner.plan() {
        Ok((target, plan)) => {
            println!("Target: {} (datastore {})", target.vm(), target.datastore_name());
            print!("{}", plan.describe());
        }
        Err(e) => warn!("Unable to plan: {e}"),
    }

    let outcome = provisioner.outcome().map_err(provisioning::Error::from)?;
    println!("Outcome: {outcome}");
    println!("{}", serde_json::to_string_pretty(&outcome).into_diagnostic()?);

    doc.context.signal(&outcome);
    for key in [AE_RESULT, AE_RETRY_INTERVAL, AE_REASON] {
        if let Some(value) = doc.context.root().get(key) {
            println!("  {key} = {value}");
        }
    }

    for (name, declared) in &doc.vms {
        let attached = declared.attached();
        if attached.is_empty() {
            continue;
        }
        println!("Disks attached to {name}:");
        println!("{}", serde_json::to_string_pretty(&attached).into_diagnostic()?);
    }

    Ok(())
}

fn main() -> miette::Result<()> {
    pretty_env_logger::formatted_timed_builder()
        .filter_level(log::LevelFilter::Debug)
        .init();

    let paths: Vec<String> = env::args().skip(1).collect();
    if paths.is_empty() {
        return Err(miette::miette!(
            help = "pass one or more .kdl event documents",
            "usage: provision-test <event.kdl>..."
        ));
    }

    for path in &paths {
        provision_event(path)?;
    }

    info!("Provisioned {} events", paths.len());
    Ok(())
}
