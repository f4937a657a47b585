// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Disk provisioning for newly requested VMs
//!
//! A [`Provisioner`] takes the [`Context`] of one provisioning event, works
//! out which VM and datastore it targets, builds a [`diskplan::DiskPlan`] from
//! the event's options and attaches every requested disk. The result is
//! reported back to the scheduler as an [`Outcome`].
//!
//! Events can also be described in KDL, see [`EventDocument`].

mod errors;
pub use errors::*;

mod helpers;
use helpers::*;

mod types;
pub use types::*;

mod context;
pub use context::*;

mod settings;
pub use settings::*;

mod outcome;
pub use outcome::*;

mod orchestrator;
pub use orchestrator::*;

mod provisioner;
pub use provisioner::*;

mod event;
pub use event::*;
