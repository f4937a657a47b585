// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::fmt;

use vm::VmRef;

use crate::OptionsBag;

/// A dynamically typed option value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicitly unset
    Null,
    /// A boolean value
    Bool(bool),
    /// An integer value
    Integer(i64),
    /// A floating point value
    Float(f64),
    /// A string value
    String(String),
    /// An ordered list of values
    List(Vec<Value>),
    /// A nested options bag
    Map(OptionsBag),
    /// A reference to a virtual machine
    Vm(VmRef),
}

impl Value {
    /// Empty values are skipped during parameter resolution.
    ///
    /// `false` counts as empty, so a lower priority scope can still supply
    /// the parameter.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null | Value::Bool(false) => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_bag(&self) -> Option<&OptionsBag> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_vm(&self) -> Option<&VmRef> {
        match self {
            Value::Vm(vm) => Some(vm),
            _ => None,
        }
    }

    /// Name of the value's kind, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Vm(_) => "vm",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::List(l) => {
                f.write_str("[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            Value::Map(m) => write!(f, "{m}"),
            Value::Vm(vm) => write!(f, "vm({})", vm.name()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<OptionsBag> for Value {
    fn from(value: OptionsBag) -> Self {
        Value::Map(value)
    }
}

impl From<VmRef> for Value {
    fn from(value: VmRef) -> Self {
        Value::Vm(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(a) => Value::List(a.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(o) => Value::Map(o.into_iter().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use test_log::test;

    use super::*;

    #[test]
    fn test_emptiness() {
        assert!(Value::Null.is_empty());
        assert!(Value::from("").is_empty());
        assert!(!Value::from("disk").is_empty());
        assert!(Value::from(false).is_empty());
        assert!(!Value::from(true).is_empty());
        assert!(!Value::from(0).is_empty());
    }

    #[test]
    fn test_from_json() {
        let value = Value::from(json!({
            "disk_1_size": 10,
            "ratio": 1.5,
            "dest_storage": [7, "ds-02"],
            ":dialog": { "disk_2_size": "5" },
        }));

        let bag = value.as_bag().unwrap();
        assert_eq!(bag.get("disk_1_size"), Some(&Value::Integer(10)));
        assert_eq!(bag.get("ratio"), Some(&Value::Float(1.5)));
        assert_eq!(
            bag.get("dest_storage").and_then(Value::as_list).map(|l| l.len()),
            Some(2)
        );
        // nested keys are canonical too
        let dialog = bag.get("dialog").and_then(Value::as_bag).unwrap();
        assert_eq!(dialog.get("disk_2_size"), Some(&Value::from("5")));
    }

    #[test]
    fn test_display() {
        let value = Value::List(vec![Value::from(7), Value::from("ds-02")]);
        assert_eq!(value.to_string(), "[7, \"ds-02\"]");
    }
}
