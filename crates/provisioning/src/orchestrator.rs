// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use diskplan::{DiskIndex, DiskPlan, DiskSpec};
use log::{debug, info};
use options::ProvisioningTarget;
use serde::Serialize;
use vm::DiskOptions;

use crate::{AddDiskError, Error};

/// What happened to a single planned disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum DiskOutcome {
    /// Size 0, nothing requested from the VM
    Skipped { index: DiskIndex },
    /// Attached to the VM
    Added { index: DiskIndex, size_mb: u64 },
}

/// Applies a disk plan against a provisioning target
#[derive(Debug, Clone, Copy)]
pub struct Orchestrator<'a> {
    target: &'a ProvisioningTarget,
}

impl<'a> Orchestrator<'a> {
    pub fn new(target: &'a ProvisioningTarget) -> Self {
        Self { target }
    }

    /// Attach every requested disk, in ascending index order.
    ///
    /// Sizes are validated before the first VM call. The first failing
    /// attachment stops the run; disks attached before it are kept.
    pub fn apply(&self, plan: &DiskPlan) -> Result<Vec<DiskOutcome>, Error> {
        for disk in plan.requested() {
            size_mb(disk)?;
        }

        let vm = self.target.vm();
        info!("Applying {} disks to {vm}", plan.requested().count());

        let mut outcomes = Vec::with_capacity(plan.len());
        for disk in plan {
            if !disk.is_requested() {
                info!("Skipping disk {}, size is 0", disk.index);
                outcomes.push(DiskOutcome::Skipped {
                    index: disk.index.clone(),
                });
                continue;
            }

            let size_mb = size_mb(disk)?;
            let options = self.disk_options(disk);
            debug!("{}: add_disk({size_mb}MB, {options:?})", disk.index);

            vm.add_disk(None, size_mb, &options).map_err(|source| AddDiskError {
                index: disk.index.clone(),
                source,
            })?;

            info!("Added {}", disk.describe());
            outcomes.push(DiskOutcome::Added {
                index: disk.index.clone(),
                size_mb,
            });
        }

        Ok(outcomes)
    }

    fn disk_options(&self, disk: &DiskSpec) -> DiskOptions {
        DiskOptions {
            datastore: self.target.datastore_name().to_owned(),
            thin_provisioned: disk.thin_provisioned,
            dependent: disk.dependent,
            persistent: disk.persistent,
            bootable: disk.bootable,
        }
    }
}

fn size_mb(disk: &DiskSpec) -> Result<u64, Error> {
    disk.size_mb().ok_or_else(|| Error::SizeOverflow {
        index: disk.index.clone(),
        size_gb: disk.size_gb,
    })
}

#[cfg(test)]
mod tests {
    use diskplan::DiskSpecParser;
    use options::{OptionsBag, RequestContext};
    use test_log::test;
    use vm::{mock::MockVm, VmRef};

    use super::*;

    fn plan_for(options: OptionsBag) -> DiskPlan {
        let parser = DiskSpecParser::new("disk").unwrap();
        DiskPlan::build(&parser.parse(&options), false)
    }

    fn target_for(mock: MockVm) -> ProvisioningTarget {
        let request = RequestContext::new("vm", None);
        ProvisioningTarget::resolve(VmRef::new(mock), &request).unwrap()
    }

    #[test]
    fn test_apply_in_order() {
        let mock = MockVm::new("web01").with_storage("ds-01");
        let journal = mock.journal();
        let target = target_for(mock);

        let plan = plan_for(
            OptionsBag::new()
                .with("disk_10_size", 1)
                .with("disk_2_size", 2)
                .with("disk_3_size", 0)
                .with("disk_2_persistent", "no"),
        );
        let outcomes = Orchestrator::new(&target).apply(&plan).unwrap();

        assert_eq!(
            outcomes,
            vec![
                DiskOutcome::Added {
                    index: DiskIndex::new("2").unwrap(),
                    size_mb: 2048
                },
                DiskOutcome::Skipped {
                    index: DiskIndex::new("3").unwrap()
                },
                DiskOutcome::Added {
                    index: DiskIndex::new("10").unwrap(),
                    size_mb: 1024
                },
            ]
        );

        let attached = journal.lock().unwrap();
        assert_eq!(attached.len(), 2);
        assert_eq!(attached[0].size_mb, 2048);
        assert!(!attached[0].options.persistent);
        assert_eq!(attached[0].options.datastore, "ds-01");
        assert_eq!(attached[1].size_mb, 1024);
    }

    #[test]
    fn test_failure_aborts() {
        let mock = MockVm::new("web01").with_storage("ds-01").fail_after(1);
        let journal = mock.journal();
        let target = target_for(mock);

        let plan = plan_for(
            OptionsBag::new()
                .with("disk_1_size", 1)
                .with("disk_2_size", 2)
                .with("disk_3_size", 3),
        );
        let err = Orchestrator::new(&target).apply(&plan).unwrap_err();

        let Error::AddDisk(AddDiskError { index, .. }) = err else {
            panic!("expected add disk failure, got {err:?}");
        };
        assert_eq!(index.as_str(), "2");
        assert_eq!(journal.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_overflow_before_any_call() {
        let mock = MockVm::new("web01").with_storage("ds-01");
        let journal = mock.journal();
        let target = target_for(mock);

        let plan = plan_for(
            OptionsBag::new()
                .with("disk_1_size", 1)
                .with("disk_2_size", i64::MAX),
        );
        let err = Orchestrator::new(&target).apply(&plan).unwrap_err();

        assert!(matches!(err, Error::SizeOverflow { size_gb, .. } if size_gb == i64::MAX as u64));
        assert!(err.is_fatal());
        assert!(journal.lock().unwrap().is_empty());
    }
}
