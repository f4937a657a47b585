// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use itertools::Itertools;
use kdl::{KdlEntry, KdlNode};

use crate::{Error, InvalidArguments, InvalidType, KdlType, MissingEntry};

// Positional (unnamed) entries of a node
pub(crate) fn arguments(node: &KdlNode) -> Vec<&KdlEntry> {
    node.entries().iter().filter(|e| e.name().is_none()).collect_vec()
}

// Named entries of a node
pub(crate) fn properties(node: &KdlNode) -> Vec<&KdlEntry> {
    node.entries().iter().filter(|e| e.name().is_some()).collect_vec()
}

// Get the single positional string argument of a node
pub(crate) fn get_argument_str(node: &KdlNode, id: &'static str, usage: &str) -> Result<String, Error> {
    let arguments = arguments(node);
    match arguments.as_slice() {
        [] => Err(MissingEntry {
            at: node.span(),
            id,
            advice: Some(usage.to_owned()),
        }
        .into()),
        [entry] => Ok(entry_str(entry)?.to_owned()),
        _ => Err(InvalidArguments {
            at: node.span(),
            advice: Some(format!("{usage} - only one positional argument supported")),
        }
        .into()),
    }
}

// Get an optional string property from a node
pub(crate) fn get_property_str(node: &KdlNode, name: &'static str) -> Result<Option<String>, Error> {
    node.entry(name)
        .map(|entry| entry_str(entry).map(str::to_owned))
        .transpose()
}

// Get an optional non-negative integer property from a node
pub(crate) fn get_property_usize(node: &KdlNode, name: &'static str) -> Result<Option<usize>, Error> {
    let Some(entry) = node.entry(name) else {
        return Ok(None);
    };
    let value = entry.value().as_integer().ok_or(InvalidType {
        at: entry.span(),
        expected_type: KdlType::Integer,
        found_type: KdlType::for_value(entry.value()),
    })?;
    let value = usize::try_from(value).map_err(|_| InvalidArguments {
        at: entry.span(),
        advice: Some(format!("'{name}' must be a non-negative integer")),
    })?;
    Ok(Some(value))
}

// Get the string value of an entry
pub(crate) fn entry_str(entry: &KdlEntry) -> Result<&str, Error> {
    let value = entry.value();
    Ok(value.as_string().ok_or(InvalidType {
        at: entry.span(),
        expected_type: KdlType::String,
        found_type: KdlType::for_value(value),
    })?)
}
