// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

use diskplan::{DiskPlan, DiskSpecParser};
use log::{debug, info, warn};
use options::{OptionsNormalizer, ProvisioningTarget};
use serde::Serialize;

use crate::{AddDiskError, Context, DiskOutcome, Error, Orchestrator, Outcome, Settings};

/// Runs the disk provisioning pipeline for one event
pub struct Provisioner<'a> {
    context: &'a Context,
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Name of the VM that received the disks
    pub vm: String,
    pub datastore: String,
    pub plan: DiskPlan,
    pub outcomes: Vec<DiskOutcome>,
}

impl Report {
    /// Number of disks actually attached to the VM
    pub fn added_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, DiskOutcome::Added { .. }))
            .count()
    }
}

impl<'a> Provisioner<'a> {
    /// Create a new provisioner
    pub fn new(context: &'a Context) -> Self {
        debug!("Creating new provisioner");
        Self { context }
    }

    /// Resolve the target and compute the disk plan without touching the VM
    pub fn plan(&self) -> Result<(ProvisioningTarget, DiskPlan), Error> {
        let resolver = self.context.resolver();
        let request = self.context.request();

        let normalized = OptionsNormalizer::new(resolver).build(&request)?;
        let settings = Settings::resolve(&resolver);
        let target = ProvisioningTarget::resolve(normalized.vm, &request)?;

        let parser = DiskSpecParser::new(&settings.disk_option_prefix)?;
        let plan = DiskPlan::build(&parser.parse(&normalized.options), settings.default_bootable);

        info!("{}", plan.describe().trim_end());
        Ok((target, plan))
    }

    /// Plan and apply all disks
    pub fn run(&self) -> Result<Report, Error> {
        let (target, plan) = self.plan()?;
        let outcomes = Orchestrator::new(&target).apply(&plan)?;

        Ok(Report {
            vm: target.vm().name().to_owned(),
            datastore: target.datastore_name().to_owned(),
            plan,
            outcomes,
        })
    }

    /// Run and translate the result into a scheduling outcome.
    ///
    /// A failed disk attachment is not translated and reaches the caller.
    pub fn outcome(&self) -> Result<Outcome, AddDiskError> {
        match self.run() {
            Ok(report) => {
                info!("Provisioned {} disks on {}", report.added_count(), report.vm);
                Ok(Outcome::Success)
            }
            Err(Error::AddDisk(e)) => Err(e),
            Err(e) => {
                if !e.is_fatal() {
                    warn!("Unexpected error while provisioning: {e:?}");
                }
                Ok(Outcome::fatal(e.to_string()))
            }
        }
    }
}
