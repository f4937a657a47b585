// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{cmp::Ordering, fmt, str::FromStr};

use serde::Serialize;

use crate::Error;

/// The index of a disk, as written in its option keys.
///
/// Indices order numerically, so `disk_2` comes before `disk_10`. The
/// original spelling is kept: `disk_01` and `disk_1` are different disks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DiskIndex(String);

impl DiskIndex {
    /// Create an index from a string of ASCII digits
    pub fn new(digits: impl Into<String>) -> Result<Self, Error> {
        let digits = digits.into();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidIndex(digits));
        }
        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    // Digits without leading zeros, comparable by length then lexically
    fn significant(&self) -> &str {
        let trimmed = self.0.trim_start_matches('0');
        if trimmed.is_empty() {
            "0"
        } else {
            trimmed
        }
    }
}

impl Ord for DiskIndex {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.significant(), other.significant());
        a.len()
            .cmp(&b.len())
            .then_with(|| a.cmp(b))
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for DiskIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for DiskIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A disk attribute that can be set through options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiskAttribute {
    /// Size in gigabytes
    Size,
    /// Thin or thick provisioning
    ThinProvisioned,
    /// Included in VM snapshots
    Dependent,
    /// Writes persist across power cycles
    Persistent,
    /// Usable as a boot device
    Bootable,
}

impl fmt::Display for DiskAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Size => f.write_str("size"),
            Self::ThinProvisioned => f.write_str("thin_provisioned"),
            Self::Dependent => f.write_str("dependent"),
            Self::Persistent => f.write_str("persistent"),
            Self::Bootable => f.write_str("bootable"),
        }
    }
}

impl FromStr for DiskAttribute {
    type Err = Error;

    /// Attempt to convert an option key suffix to a disk attribute
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "size" => Ok(Self::Size),
            "thin_provisioned" | "thin_provision" => Ok(Self::ThinProvisioned),
            "dependent" => Ok(Self::Dependent),
            "persistent" => Ok(Self::Persistent),
            "bootable" => Ok(Self::Bootable),
            _ => Err(Error::UnknownAttribute(value.to_owned())),
        }
    }
}

/// A parsed disk option key such as `dialog_disk_3_size`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskAttributeKey {
    pub index: DiskIndex,
    pub attribute: DiskAttribute,
    pub had_dialog_prefix: bool,
}
