// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Disk plan construction
//!
//! A [`DiskPlan`] holds one fully defaulted [`DiskSpec`] per disk index, in
//! ascending index order. Disks with a size of 0 stay in the plan so the
//! caller can report them, but are never requested from the VM.

use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;

use crate::{DiskIndex, PartialDisk};

/// Megabytes per gigabyte, as the VM API counts them
pub const MB_PER_GB: u64 = 1024;

/// A fully defaulted description of one disk to (possibly) create
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiskSpec {
    pub index: DiskIndex,
    /// Size in gigabytes, 0 for "no disk"
    pub size_gb: u64,
    pub thin_provisioned: bool,
    pub dependent: bool,
    pub persistent: bool,
    pub bootable: bool,
}

impl DiskSpec {
    /// Apply defaults to a partially specified disk
    pub fn from_partial(index: DiskIndex, partial: &PartialDisk, default_bootable: bool) -> Self {
        Self {
            index,
            size_gb: partial.size_gb.unwrap_or(0),
            thin_provisioned: partial.thin_provisioned.unwrap_or(true),
            dependent: partial.dependent.unwrap_or(true),
            persistent: partial.persistent.unwrap_or(true),
            bootable: partial.bootable.unwrap_or(default_bootable),
        }
    }

    /// Whether this disk should be created at all
    pub fn is_requested(&self) -> bool {
        self.size_gb > 0
    }

    /// Size in megabytes, or `None` if it does not fit in a u64
    pub fn size_mb(&self) -> Option<u64> {
        self.size_gb.checked_mul(MB_PER_GB)
    }

    /// Get a human readable description of this disk
    pub fn describe(&self) -> String {
        if !self.is_requested() {
            return format!("disk {}: skipped (size 0)", self.index);
        }

        let flags = [
            (self.thin_provisioned, "thin", "thick"),
            (self.dependent, "dependent", "independent"),
            (self.persistent, "persistent", "nonpersistent"),
            (self.bootable, "bootable", "not bootable"),
        ]
        .iter()
        .map(|(set, yes, no)| if *set { *yes } else { *no })
        .collect::<Vec<_>>()
        .join(", ");

        format!("disk {}: {}GB ({})", self.index, self.size_gb, flags)
    }
}

/// The ordered set of disks derived from one provisioning event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DiskPlan {
    disks: Vec<DiskSpec>,
}

impl DiskPlan {
    /// Build a plan from parsed disk attributes, applying defaults
    pub fn build(partials: &BTreeMap<DiskIndex, PartialDisk>, default_bootable: bool) -> Self {
        let disks: Vec<_> = partials
            .iter()
            .map(|(index, partial)| DiskSpec::from_partial(index.clone(), partial, default_bootable))
            .collect();

        debug!(
            "Built disk plan with {} disks, {} requested",
            disks.len(),
            disks.iter().filter(|d| d.is_requested()).count()
        );
        Self { disks }
    }

    pub fn len(&self) -> usize {
        self.disks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disks.is_empty()
    }

    /// All disks, ascending by index
    pub fn iter(&self) -> impl Iterator<Item = &DiskSpec> {
        self.disks.iter()
    }

    /// Disks that will actually be created
    pub fn requested(&self) -> impl Iterator<Item = &DiskSpec> {
        self.disks.iter().filter(|d| d.is_requested())
    }

    /// Look up a disk by its index as written in the options
    pub fn get(&self, index: &str) -> Option<&DiskSpec> {
        self.disks.iter().find(|d| d.index.as_str() == index)
    }

    /// Get a human readable description of the plan
    pub fn describe(&self) -> String {
        if self.disks.is_empty() {
            return "No disks requested".to_string();
        }

        let mut description = "Planned disks:\n".to_string();
        for disk in &self.disks {
            description.push_str(&format!("  {}\n", disk.describe()));
        }
        description
    }
}

impl<'a> IntoIterator for &'a DiskPlan {
    type Item = &'a DiskSpec;
    type IntoIter = std::slice::Iter<'a, DiskSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.disks.iter()
    }
}

#[cfg(test)]
mod tests {
    use options::OptionsBag;
    use test_log::test;

    use super::*;
    use crate::DiskSpecParser;

    fn plan_for(options: &OptionsBag, default_bootable: bool) -> DiskPlan {
        let partials = DiskSpecParser::new("disk").unwrap().parse(options);
        DiskPlan::build(&partials, default_bootable)
    }

    #[test]
    fn test_defaults() {
        let plan = plan_for(&OptionsBag::new().with("disk_1_size", 10), false);
        assert_eq!(plan.len(), 1);

        let disk = plan.get("1").unwrap();
        assert_eq!(disk.size_gb, 10);
        assert!(disk.thin_provisioned);
        assert!(disk.dependent);
        assert!(disk.persistent);
        assert!(!disk.bootable);

        let plan = plan_for(&OptionsBag::new().with("disk_1_size", 10), true);
        assert!(plan.get("1").unwrap().bootable);
    }

    #[test]
    fn test_missing_size_is_zero() {
        let plan = plan_for(&OptionsBag::new().with("disk_4_bootable", "yes"), false);
        let disk = plan.get("4").unwrap();
        assert_eq!(disk.size_gb, 0);
        assert!(disk.bootable);
        assert!(!disk.is_requested());
        assert_eq!(plan.requested().count(), 0);
    }

    #[test]
    fn test_scenario_a() {
        let options = OptionsBag::new()
            .with("dialog_disk_1_size", 10)
            .with("disk_2_size", 5)
            .with("disk_2_thin_provisioned", "false")
            .with("dialog_disk_3_size", 20)
            .with("dialog_disk_3_bootable", "no");
        let plan = plan_for(&options, true);

        let summary: Vec<_> = plan
            .iter()
            .map(|d| {
                (
                    d.index.to_string(),
                    d.size_gb,
                    d.thin_provisioned,
                    d.dependent,
                    d.persistent,
                    d.bootable,
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("1".to_string(), 10, true, true, true, true),
                ("2".to_string(), 5, false, true, true, true),
                ("3".to_string(), 20, true, true, true, false),
            ]
        );
    }

    #[test]
    fn test_ordering() {
        let options = OptionsBag::new()
            .with("disk_10_size", 1)
            .with("disk_2_size", 1)
            .with("disk_1_size", 1);
        let order: Vec<_> = plan_for(&options, false).iter().map(|d| d.index.to_string()).collect();
        assert_eq!(order, ["1", "2", "10"]);
    }

    #[test]
    fn test_size_mb() {
        let spec = |size_gb| DiskSpec {
            size_gb,
            ..DiskSpec::from_partial(DiskIndex::new("1").unwrap(), &PartialDisk::default(), false)
        };

        for size_gb in [0, 1, 5, 10, 20, 4096] {
            assert_eq!(spec(size_gb).size_mb(), Some(size_gb * 1024));
        }
        assert_eq!(spec(u64::MAX).size_mb(), None);
    }

    #[test]
    fn test_describe() {
        let options = OptionsBag::new()
            .with("disk_1_size", 10)
            .with("disk_1_thin_provisioned", false)
            .with("disk_2_size", 0);
        let plan = plan_for(&options, false);
        assert_eq!(
            plan.get("1").unwrap().describe(),
            "disk 1: 10GB (thick, dependent, persistent, not bootable)"
        );
        assert_eq!(plan.get("2").unwrap().describe(), "disk 2: skipped (size 0)");
        assert_eq!(DiskPlan::default().describe(), "No disks requested");
    }

    #[test]
    fn test_serialize() {
        let plan = plan_for(&OptionsBag::new().with("disk_1_size", 2), false);
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json[0]["index"], "1");
        assert_eq!(json[0]["size_gb"], 2);
        assert_eq!(json[0]["thin_provisioned"], true);
    }
}
