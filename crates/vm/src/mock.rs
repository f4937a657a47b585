// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Mock VM for testing.
//!
//! This module provides a VM implementation that records every disk it is
//! asked to attach, without talking to any provider.

use std::sync::{Arc, Mutex};

use log::debug;
use serde::Serialize;

use crate::{DiskOptions, Error, Storage, VirtualMachine};

/// A disk attached to a [`MockVm`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachedDisk {
    pub size_mb: u64,
    pub options: DiskOptions,
}

/// Represents a mock VM.
#[derive(Debug, Default)]
pub struct MockVm {
    name: String,
    storage: Option<Storage>,
    /// Reject every request after this many disks have been attached
    fail_after: Option<usize>,
    attached: Arc<Mutex<Vec<AttachedDisk>>>,
}

impl MockVm {
    /// Creates a new mock VM without any storage
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Place the VM on the named datastore
    pub fn with_storage(self, name: impl Into<String>) -> Self {
        Self {
            storage: Some(Storage::new(name)),
            ..self
        }
    }

    /// Accept `count` disks, then reject every further request
    pub fn fail_after(self, count: usize) -> Self {
        Self {
            fail_after: Some(count),
            ..self
        }
    }

    /// Shared view of the attached disks, usable after the VM moves into a `VmRef`
    pub fn journal(&self) -> Arc<Mutex<Vec<AttachedDisk>>> {
        self.attached.clone()
    }

    /// Disks attached so far, in call order
    pub fn attached(&self) -> Vec<AttachedDisk> {
        self.attached.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

impl VirtualMachine for MockVm {
    fn name(&self) -> &str {
        &self.name
    }

    fn storage(&self) -> Option<&Storage> {
        self.storage.as_ref()
    }

    fn add_disk(&self, placeholder: Option<&str>, size_mb: u64, options: &DiskOptions) -> Result<(), Error> {
        let mut attached = self
            .attached
            .lock()
            .map_err(|_| Error::Provider("mock journal poisoned".into()))?;

        if placeholder.is_some() {
            return Err(Error::Rejected {
                vm: self.name.clone(),
                reason: "placeholder must be empty".into(),
            });
        }

        if self.fail_after.is_some_and(|n| attached.len() >= n) {
            return Err(Error::Rejected {
                vm: self.name.clone(),
                reason: "injected failure".into(),
            });
        }

        debug!("{}: attaching {}MB disk on {}", self.name, size_mb, options.datastore);
        attached.push(AttachedDisk {
            size_mb,
            options: options.clone(),
        });
        Ok(())
    }
}
