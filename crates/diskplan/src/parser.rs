// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Disk option parsing
//!
//! Disks are requested through flat option keys of the form
//! `[dialog_]<prefix>_<N>_<attribute>`, for example:
//!
//! ```text
//! disk_1_size                    => 10
//! disk_2_size                    => 5
//! disk_2_thin_provisioned        => "false"
//! dialog_disk_3_size             => 20
//! dialog_disk_3_bootable         => "no"
//! ```
//!
//! [`DiskSpecParser`] groups these by disk index and coerces the values.

use std::collections::BTreeMap;

use itertools::Itertools;
use log::{debug, trace};
use options::{OptionsBag, Value};
use regex::Regex;

use crate::{coerce_bool, coerce_size, DiskAttribute, DiskAttributeKey, DiskIndex, Error};

/// Attributes collected for one disk index, before defaults apply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialDisk {
    pub size_gb: Option<u64>,
    pub thin_provisioned: Option<bool>,
    pub dependent: Option<bool>,
    pub persistent: Option<bool>,
    pub bootable: Option<bool>,
}

impl PartialDisk {
    /// Coerce and store a value. `Null` values leave the attribute unset.
    pub fn set(&mut self, attribute: DiskAttribute, value: &Value) {
        match attribute {
            DiskAttribute::Size => {
                if let Some(size) = coerce_size(value) {
                    self.size_gb = Some(size);
                }
            }
            DiskAttribute::ThinProvisioned => set_flag(&mut self.thin_provisioned, value),
            DiskAttribute::Dependent => set_flag(&mut self.dependent, value),
            DiskAttribute::Persistent => set_flag(&mut self.persistent, value),
            DiskAttribute::Bootable => set_flag(&mut self.bootable, value),
        }
    }
}

fn set_flag(slot: &mut Option<bool>, value: &Value) {
    if let Some(flag) = coerce_bool(value) {
        *slot = Some(flag);
    }
}

/// Finds disk option keys for a given prefix
#[derive(Debug, Clone)]
pub struct DiskSpecParser {
    prefix: String,
    pattern: Regex,
}

impl DiskSpecParser {
    /// Create a parser for keys using `prefix`, e.g. `disk` for `disk_1_size`
    pub fn new(prefix: &str) -> Result<Self, Error> {
        if prefix.is_empty() {
            return Err(Error::EmptyPrefix);
        }
        let pattern = Regex::new(&format!("^(dialog_)?{}_([0-9]+)_(.*)$", regex::escape(prefix)))?;
        Ok(Self {
            prefix: prefix.to_owned(),
            pattern,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Parse a single option key, ignoring keys that are not disk options
    pub fn parse_key(&self, key: &str) -> Option<DiskAttributeKey> {
        let captures = self.pattern.captures(key)?;
        let attribute = match captures[3].parse::<DiskAttribute>() {
            Ok(attribute) => attribute,
            Err(e) => {
                debug!("Ignoring disk option '{key}': {e}");
                return None;
            }
        };

        Some(DiskAttributeKey {
            index: DiskIndex::new(&captures[2]).ok()?,
            attribute,
            had_dialog_prefix: captures.get(1).is_some(),
        })
    }

    /// Group every disk option in the bag by disk index.
    ///
    /// When the same attribute is set both with and without the `dialog_`
    /// prefix, the `dialog_` value wins.
    pub fn parse(&self, options: &OptionsBag) -> BTreeMap<DiskIndex, PartialDisk> {
        let matches = options
            .iter()
            .filter_map(|(key, value)| Some((self.parse_key(key)?, key, value)))
            .sorted_by_key(|(parsed, _, _)| parsed.had_dialog_prefix);

        let mut disks: BTreeMap<DiskIndex, PartialDisk> = BTreeMap::new();
        for (parsed, key, value) in matches {
            trace!("{key} => disk {} {} = {value}", parsed.index, parsed.attribute);
            disks.entry(parsed.index).or_default().set(parsed.attribute, value);
        }

        debug!("Found {} disks with prefix '{}'", disks.len(), self.prefix);
        disks
    }
}
