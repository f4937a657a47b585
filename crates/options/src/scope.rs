// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Priority-ordered parameter lookup
//!
//! Parameters can be passed to a provisioning event in many places. The
//! [`ParameterResolver`] checks all of them, highest priority first:
//!
//! 1. Inputs
//! 2. Current
//! 3. Object
//! 4. Root
//! 5. State

use std::{fmt, str::FromStr};

use log::{debug, trace};
use vm::VmRef;

use crate::{Error, OptionsBag, Value};

/// A parameter scope, ordered by lookup priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParameterSource {
    Inputs,
    Current,
    Object,
    Root,
    State,
}

impl ParameterSource {
    /// All scopes, highest priority first
    pub const ALL: [ParameterSource; 5] = [
        ParameterSource::Inputs,
        ParameterSource::Current,
        ParameterSource::Object,
        ParameterSource::Root,
        ParameterSource::State,
    ];
}

impl fmt::Display for ParameterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inputs => f.write_str("inputs"),
            Self::Current => f.write_str("current"),
            Self::Object => f.write_str("object"),
            Self::Root => f.write_str("root"),
            Self::State => f.write_str("state"),
        }
    }
}

impl FromStr for ParameterSource {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "inputs" => Ok(Self::Inputs),
            "current" => Ok(Self::Current),
            "object" => Ok(Self::Object),
            "root" => Ok(Self::Root),
            "state" => Ok(Self::State),
            _ => Err(Error::UnknownScope(value.to_owned())),
        }
    }
}

/// The five attribute scopes of one provisioning event
#[derive(Debug, Clone, Default)]
pub struct Scopes {
    inputs: OptionsBag,
    current: OptionsBag,
    object: OptionsBag,
    root: OptionsBag,
    state: OptionsBag,
}

impl Scopes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents of one scope
    pub fn with(mut self, source: ParameterSource, bag: OptionsBag) -> Self {
        *self.get_mut(source) = bag;
        self
    }

    pub fn get(&self, source: ParameterSource) -> &OptionsBag {
        match source {
            ParameterSource::Inputs => &self.inputs,
            ParameterSource::Current => &self.current,
            ParameterSource::Object => &self.object,
            ParameterSource::Root => &self.root,
            ParameterSource::State => &self.state,
        }
    }

    pub fn get_mut(&mut self, source: ParameterSource) -> &mut OptionsBag {
        match source {
            ParameterSource::Inputs => &mut self.inputs,
            ParameterSource::Current => &mut self.current,
            ParameterSource::Object => &mut self.object,
            ParameterSource::Root => &mut self.root,
            ParameterSource::State => &mut self.state,
        }
    }

    /// The root attributes of the event
    pub fn root(&self) -> &OptionsBag {
        &self.root
    }
}

/// Looks up parameters across all scopes in priority order
#[derive(Debug, Clone, Copy)]
pub struct ParameterResolver<'a> {
    scopes: &'a Scopes,
}

impl<'a> ParameterResolver<'a> {
    pub fn new(scopes: &'a Scopes) -> Self {
        Self { scopes }
    }

    pub fn scopes(&self) -> &'a Scopes {
        self.scopes
    }

    /// Find the first non-empty value for `name`, and the scope it came from
    pub fn resolve_from(&self, name: &str) -> Option<(ParameterSource, &'a Value)> {
        for source in ParameterSource::ALL {
            match self.scopes.get(source).get(name) {
                Some(value) if !value.is_empty() => {
                    debug!("{{ '{name}' => {value} }} from {source}");
                    return Some((source, value));
                }
                Some(_) => trace!("{source}: '{name}' is empty, continuing"),
                None => trace!("{source}: '{name}' not set"),
            }
        }

        debug!("{{ '{name}' => absent }}");
        None
    }

    /// Find the first non-empty value for `name`
    pub fn resolve(&self, name: &str) -> Option<&'a Value> {
        self.resolve_from(name).map(|(_, value)| value)
    }

    /// Resolve a parameter that must be text to be useful
    pub fn resolve_str(&self, name: &str) -> Option<&'a str> {
        self.resolve(name).and_then(Value::as_str)
    }

    /// Resolve a nested options bag
    pub fn resolve_bag(&self, name: &str) -> Option<&'a OptionsBag> {
        self.resolve(name).and_then(Value::as_bag)
    }

    /// Resolve a VM reference
    pub fn resolve_vm(&self, name: &str) -> Option<VmRef> {
        self.resolve(name).and_then(Value::as_vm).cloned()
    }
}
