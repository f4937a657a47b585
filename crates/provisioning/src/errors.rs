// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{io, sync::Arc};

use diskplan::DiskIndex;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::KdlType;

/// Error type for the provisioning crate
#[derive(Diagnostic, Debug, Error)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] io::Error),

    #[diagnostic(transparent)]
    #[error(transparent)]
    Kdl(#[from] kdl::KdlError),

    #[diagnostic(transparent)]
    #[error(transparent)]
    Options(#[from] options::Error),

    #[error(transparent)]
    Plan(#[from] diskplan::Error),

    #[error("disk {index}: {size_gb}GB does not fit in megabytes")]
    SizeOverflow { index: DiskIndex, size_gb: u64 },

    #[error(transparent)]
    AddDisk(#[from] AddDiskError),

    #[diagnostic(transparent)]
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[diagnostic(transparent)]
    #[error(transparent)]
    InvalidArguments(#[from] InvalidArguments),

    #[diagnostic(transparent)]
    #[error(transparent)]
    InvalidType(#[from] InvalidType),

    #[diagnostic(transparent)]
    #[error(transparent)]
    UnsupportedNode(#[from] UnsupportedNode),

    #[diagnostic(transparent)]
    #[error(transparent)]
    MissingEntry(#[from] MissingEntry),

    #[diagnostic(transparent)]
    #[error(transparent)]
    UnknownVm(#[from] UnknownVm),
}

impl Error {
    /// Precondition failures end the event; anything else is the caller's problem
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Options(_) | Error::Plan(_) | Error::SizeOverflow { .. })
    }
}

/// A VM refused to attach a disk. Disks attached earlier in the same run stay.
#[derive(Debug, Error)]
#[error("failed to add disk {index}")]
pub struct AddDiskError {
    pub index: DiskIndex,

    #[source]
    pub source: vm::Error,
}

/// Merged error for parsing failures
/// Returns a list of diagnostics for the user
#[derive(Debug, Diagnostic, Error)]
#[error("failed to parse event document")]
#[diagnostic(severity(error))]
pub struct ParseError {
    #[source_code]
    pub src: NamedSource<Arc<String>>,
    #[related]
    pub diagnostics: Vec<Error>,
}

/// Error for invalid types
#[derive(Debug, Diagnostic, Error)]
#[error("invalid type, expected {expected_type}, found {found_type}")]
#[diagnostic(severity(error))]
pub struct InvalidType {
    #[label]
    pub at: SourceSpan,

    /// The expected type
    pub expected_type: KdlType,

    /// The type actually present
    pub found_type: KdlType,
}

/// Error for missing mandatory entries
#[derive(Debug, Diagnostic, Error)]
#[error("missing entry: {id}")]
#[diagnostic(severity(error))]
pub struct MissingEntry {
    #[label]
    pub at: SourceSpan,

    pub id: &'static str,

    #[help]
    pub advice: Option<String>,
}

/// Error for unsupported node types
#[derive(Debug, Diagnostic, Error)]
#[error("unsupported node: {name}")]
#[diagnostic(severity(error))]
pub struct UnsupportedNode {
    #[label]
    pub at: SourceSpan,

    pub name: String,

    #[help]
    pub advice: Option<String>,
}

/// Error for references to VMs that were never declared
#[derive(Debug, Diagnostic, Error)]
#[error("unknown vm: {name}")]
#[diagnostic(severity(error))]
pub struct UnknownVm {
    #[label]
    pub at: SourceSpan,

    pub name: String,

    #[help]
    pub advice: Option<String>,
}

/// Error for invalid arguments
#[derive(Debug, Diagnostic, Error)]
#[error("invalid arguments")]
#[diagnostic(severity(error))]
pub struct InvalidArguments {
    #[label]
    pub at: SourceSpan,

    #[help]
    pub advice: Option<String>,
}
