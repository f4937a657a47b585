// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use log::warn;
use options::Value;

/// Text prefixes that read as `true`, compared case-insensitively
const TRUTHY_PREFIXES: [&str; 4] = ["t", "true", "y", "yes"];

/// Coerce an option value to a boolean.
///
/// Text is `true` when it starts with one of `t`, `true`, `y` or `yes`,
/// ignoring case; any other text is `false`. `Null` is not a value and
/// yields `None` so that defaults can apply.
pub fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(*b),
        Value::String(s) => Some(is_truthy(s)),
        Value::Integer(i) => Some(*i != 0),
        _ => Some(false),
    }
}

fn is_truthy(text: &str) -> bool {
    TRUTHY_PREFIXES.iter().any(|prefix| {
        text.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

/// Coerce an option value to a size in gigabytes.
///
/// Text is read up to the first non-digit (`"20GB"` is 20), floats are
/// truncated. Negative sizes clamp to 0.
pub fn coerce_size(value: &Value) -> Option<u64> {
    let size = match value {
        Value::Null => return None,
        Value::Integer(i) => *i,
        Value::Float(f) => *f as i64,
        Value::String(s) => leading_integer(s),
        other => {
            warn!("Disk size of kind {} is not a number, using 0", other.kind());
            0
        }
    };

    if size < 0 {
        warn!("Negative disk size {size}, using 0");
        return Some(0);
    }

    Some(size as u64)
}

fn leading_integer(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    let digits = &digits[..end];

    // Only overflow can fail once the digits are non-empty
    let magnitude = match digits {
        "" => 0,
        _ => digits.parse::<i64>().unwrap_or(i64::MAX),
    };

    if negative {
        -magnitude
    } else {
        magnitude
    }
}
