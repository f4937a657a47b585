// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use diskplan::coerce_bool;
use log::debug;
use options::ParameterResolver;

/// Default prefix of disk option keys
pub const DEFAULT_DISK_OPTION_PREFIX: &str = "disk";

/// Tunables resolved from the event's parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Prefix used to recognize disk option keys
    pub disk_option_prefix: String,
    /// Bootable flag for disks that do not set one
    pub default_bootable: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            disk_option_prefix: DEFAULT_DISK_OPTION_PREFIX.to_owned(),
            default_bootable: false,
        }
    }
}

impl Settings {
    /// Resolve settings, falling back to defaults for anything unset.
    ///
    /// `dialog_disk_option_prefix` is accepted as an older spelling of
    /// `disk_option_prefix`.
    pub fn resolve(resolver: &ParameterResolver<'_>) -> Self {
        let defaults = Self::default();

        let disk_option_prefix = resolver
            .resolve_str("disk_option_prefix")
            .or_else(|| resolver.resolve_str("dialog_disk_option_prefix"))
            .map(str::to_owned)
            .unwrap_or(defaults.disk_option_prefix);

        let default_bootable = resolver
            .resolve("default_bootable")
            .and_then(coerce_bool)
            .unwrap_or(defaults.default_bootable);

        let settings = Self {
            disk_option_prefix,
            default_bootable,
        };
        debug!("{settings:?}");
        settings
    }
}
