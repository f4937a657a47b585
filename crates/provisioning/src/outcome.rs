// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::fmt;

use log::{error, info};
use options::OptionsBag;
use serde::Serialize;

/// Root attribute holding the scheduling directive
pub const AE_RESULT: &str = "ae_result";

/// Root attribute holding the delay before a retry, e.g. `"60.seconds"`
pub const AE_RETRY_INTERVAL: &str = "ae_retry_interval";

/// Root attribute holding a human readable reason
pub const AE_REASON: &str = "ae_reason";

/// What the external scheduler should do once the engine returns
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum Outcome {
    /// Finished, halt successfully
    Success,
    /// Re-invoke the whole event after a delay
    Retry { delay_seconds: u64, reason: String },
    /// Halt with an error
    Fatal { message: String },
}

impl Outcome {
    pub fn retry(delay_seconds: u64, reason: impl Into<String>) -> Self {
        Self::Retry {
            delay_seconds,
            reason: reason.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// Write the outcome into root attributes using the scheduler's keys
    pub fn signal(&self, root: &mut OptionsBag) {
        match self {
            Outcome::Success => {
                root.insert(AE_RESULT, "ok");
            }
            Outcome::Retry { delay_seconds, reason } => {
                info!("Retrying after {delay_seconds} seconds, because '{reason}'");
                root.insert(AE_RESULT, "retry");
                root.insert(AE_RETRY_INTERVAL, format!("{delay_seconds}.seconds"));
                root.insert(AE_REASON, reason.as_str());
            }
            Outcome::Fatal { message } => {
                error!("{message}");
                root.insert(AE_RESULT, "error");
                root.insert(AE_REASON, message.as_str());
            }
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => f.write_str("success"),
            Outcome::Retry { delay_seconds, reason } => write!(f, "retry in {delay_seconds}s: {reason}"),
            Outcome::Fatal { message } => write!(f, "fatal: {message}"),
        }
    }
}
