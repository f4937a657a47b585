// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Option resolution for provisioning events
//!
//! This crate turns the loosely structured attributes of a provisioning event
//! into something the disk planner can consume:
//!
//! - [`ParameterResolver`] finds a parameter across the five scopes
//! - [`OptionsNormalizer`] builds one flat [`OptionsBag`] for the request
//! - [`ProvisioningTarget`] pins down the VM and destination datastore

use miette::Diagnostic;
use thiserror::Error;

mod bag;
pub use bag::*;

mod value;
pub use value::*;

mod scope;
pub use scope::*;

mod request;
pub use request::*;

mod target;
pub use target::*;

/// Error type for the options crate
///
/// Every variant is a precondition failure: the event cannot be processed
/// and must not be retried automatically.
#[derive(Diagnostic, Debug, Error)]
pub enum Error {
    #[error("can not handle vmdb_object_type: {0}")]
    #[diagnostic(help("supported types are 'miq_provision', 'vm' and 'automation_task'"))]
    UnsupportedRequestType(String),

    #[error("provision request not found")]
    MissingProvisionRequest,

    #[error("vm not found")]
    #[diagnostic(help("pass a 'vm' parameter in any scope"))]
    MissingVm,

    #[error("options not found")]
    MissingOptions,

    #[error("invalid options payload")]
    InvalidOptions(#[from] serde_json::Error),

    #[error("could not determine destination datastore name")]
    #[diagnostic(help("the vm has no storage and no provision request names a 'dest_storage'"))]
    UnresolvedDatastore,

    #[error("unknown scope: {0}")]
    UnknownScope(String),
}
