// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Virtual machine references as seen by the disk provisioning engine.
//!
//! The provisioning platform owns the real VM objects. This crate only
//! describes the surface the engine needs: a name, an optional backing
//! storage, and the ability to attach a new disk.

use std::{fmt, ops::Deref, sync::Arc};

use serde::Serialize;
use thiserror::Error;

pub mod mock;

/// Errors reported by a VM when attaching a disk
#[derive(Debug, Error)]
pub enum Error {
    /// The VM refused the request
    #[error("vm {vm} rejected disk request: {reason}")]
    Rejected { vm: String, reason: String },

    /// The named datastore is not reachable from this VM
    #[error("datastore not found: {0}")]
    DatastoreNotFound(String),

    /// Transport or API failure talking to the VM's provider
    #[error("provider: {0}")]
    Provider(String),
}

/// The storage a VM currently lives on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Storage {
    /// Datastore name (e.g. "ds-01")
    pub name: String,
}

impl Storage {
    /// Create a storage reference with the given datastore name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Flags passed alongside a disk creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiskOptions {
    /// Datastore the new disk is created on
    pub datastore: String,
    /// Thin provision, or thick provision the disk
    pub thin_provisioned: bool,
    /// Whether the disk is dependent (included in snapshots)
    pub dependent: bool,
    /// Whether writes to the disk persist
    pub persistent: bool,
    /// Whether the disk is bootable
    pub bootable: bool,
}

/// A virtual machine that can receive new disks.
pub trait VirtualMachine: fmt::Debug + Send + Sync {
    /// Returns the name of the VM.
    fn name(&self) -> &str;

    /// Returns the storage the VM lives on, if the provider knows it.
    fn storage(&self) -> Option<&Storage>;

    /// Attaches a new disk of `size_mb` megabytes to the VM.
    ///
    /// # Arguments
    ///
    /// * `placeholder` - Reserved by the provider API, always passed as `None`
    /// * `size_mb` - Size of the new disk in megabytes
    /// * `options` - Datastore and provisioning flags for the disk
    fn add_disk(&self, placeholder: Option<&str>, size_mb: u64, options: &DiskOptions) -> Result<(), Error>;
}

/// Shared handle to a VM.
///
/// Handles are cheap to clone and compare by identity, so they can be stored
/// inside option values and scope attributes.
#[derive(Debug, Clone)]
pub struct VmRef(Arc<dyn VirtualMachine>);

impl VmRef {
    /// Wrap a VM implementation in a shared handle
    pub fn new<V: VirtualMachine + 'static>(vm: V) -> Self {
        Self(Arc::new(vm))
    }

    /// Build a handle from an already shared VM
    pub fn from_arc(vm: Arc<dyn VirtualMachine>) -> Self {
        Self(vm)
    }
}

impl Deref for VmRef {
    type Target = dyn VirtualMachine;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl PartialEq for VmRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for VmRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        if let Some(storage) = self.storage() {
            write!(f, " on {}", storage.name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use test_log::test;

    use super::*;
    use crate::mock::MockVm;

    #[test]
    fn test_identity() {
        let a = VmRef::new(MockVm::new("web01"));
        let b = a.clone();
        let c = VmRef::new(MockVm::new("web01"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_display() {
        let vm = VmRef::new(MockVm::new("web01").with_storage("ds-01"));
        assert_eq!(vm.to_string(), "web01 on ds-01");

        let shared: Arc<dyn VirtualMachine> = Arc::new(MockVm::new("bare"));
        assert_eq!(VmRef::from_arc(shared).to_string(), "bare");
    }
}
