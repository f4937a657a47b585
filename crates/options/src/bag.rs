// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{collections::BTreeMap, fmt};

use crate::Value;

/// Returns the canonical spelling of an option key.
///
/// Keys may arrive in symbol notation (`:vm`) or as plain strings (`vm`);
/// both name the same option.
pub fn canonical_key(key: &str) -> &str {
    key.strip_prefix(':').unwrap_or(key)
}

/// A flat mapping of canonical option keys to values.
///
/// Keys are case-sensitive. Iteration is ordered by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionsBag(BTreeMap<String, Value>);

impl OptionsBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl AsRef<str>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value, returning the previous value for the same logical key
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(canonical_key(key.as_ref()).to_owned(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(canonical_key(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(canonical_key(key))
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(canonical_key(key))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Copy every entry of `other` into this bag, replacing on collision
    pub fn overlay(&mut self, other: &OptionsBag) {
        for (key, value) in other.iter() {
            self.0.insert(key.to_owned(), value.clone());
        }
    }
}

impl<K, V> FromIterator<(K, V)> for OptionsBag
where
    K: AsRef<str>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = Self::new();
        for (key, value) in iter {
            bag.insert(key, value);
        }
        bag
    }
}

impl<'a> IntoIterator for &'a OptionsBag {
    type Item = (&'a String, &'a Value);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for OptionsBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key} => {value}")?;
        }
        f.write_str("}")
    }
}
