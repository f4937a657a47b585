// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Disk specifications from provisioning options
//!
//! Parse `[dialog_]<prefix>_<N>_<attribute>` option keys into per-disk
//! attribute sets, then apply defaults to produce an ordered [`DiskPlan`].
//!
//! ```
//! use diskplan::{DiskPlan, DiskSpecParser};
//! use options::OptionsBag;
//!
//! let options = OptionsBag::new()
//!     .with("disk_1_size", 10)
//!     .with("dialog_disk_2_size", "5")
//!     .with("dialog_disk_2_bootable", "yes");
//!
//! let parser = DiskSpecParser::new("disk").unwrap();
//! let plan = DiskPlan::build(&parser.parse(&options), false);
//! assert_eq!(plan.requested().count(), 2);
//! ```

use thiserror::Error;

mod coerce;
pub use coerce::*;

mod key;
pub use key::*;

mod parser;
pub use parser::*;

mod plan;
pub use plan::*;

/// Error type for the diskplan crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("disk option prefix must not be empty")]
    EmptyPrefix,

    #[error("invalid disk option pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid disk index: {0:?}")]
    InvalidIndex(String),

    #[error("unknown disk attribute: {0}")]
    UnknownAttribute(String),
}
