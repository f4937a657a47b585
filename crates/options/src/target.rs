// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use log::debug;
use vm::VmRef;

use crate::{Error, RequestContext};

/// The VM and datastore a disk plan is applied against
#[derive(Debug, Clone)]
pub struct ProvisioningTarget {
    vm: VmRef,
    datastore_name: String,
}

impl ProvisioningTarget {
    /// Determine the destination datastore for new disks.
    ///
    /// The VM's current storage wins; otherwise the provision request's
    /// `dest_storage` is used.
    pub fn resolve(vm: VmRef, request: &RequestContext) -> Result<Self, Error> {
        let datastore_name = vm
            .storage()
            .map(|s| s.name.as_str())
            .filter(|name| !name.is_empty())
            .or_else(|| {
                request
                    .provision()
                    .and_then(|p| p.dest_storage())
                    .filter(|name| !name.is_empty())
            })
            .ok_or(Error::UnresolvedDatastore)?
            .to_owned();

        debug!("datastore => '{datastore_name}'");
        Ok(Self { vm, datastore_name })
    }

    pub fn vm(&self) -> &VmRef {
        &self.vm
    }

    pub fn datastore_name(&self) -> &str {
        &self.datastore_name
    }
}
