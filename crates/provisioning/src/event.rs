// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! KDL descriptions of a provisioning event
//!
//! ```kdl
//! vm "web01" storage="ds-01"
//! inputs { default_bootable #true }
//! root {
//!     vmdb_object_type "vm"
//!     vm (vm)"web01"
//!     disk_1_size 10
//! }
//! ```
//!
//! VMs must be declared before they are referenced.

use std::{
    collections::BTreeMap,
    fs,
    path::Path,
    sync::{Arc, Mutex},
};

use itertools::Itertools;
use kdl::{KdlDocument, KdlEntry, KdlNode};
use log::{debug, trace};
use miette::NamedSource;
use options::{OptionsBag, ParameterSource, ProvisionRequest, Scopes, Value};
use vm::{
    mock::{AttachedDisk, MockVm},
    VmRef,
};

use crate::{
    arguments, entry_str, get_argument_str, get_property_str, get_property_usize, properties, Context, Error,
    InvalidArguments, InvalidType, KdlType, ParseError, UnknownVm, UnsupportedNode,
};

/// A VM declared by an event document, along with the disks it received
#[derive(Debug, Clone)]
pub struct DeclaredVm {
    pub vm: VmRef,
    journal: Arc<Mutex<Vec<AttachedDisk>>>,
}

impl DeclaredVm {
    /// Disks attached so far, in call order
    pub fn attached(&self) -> Vec<AttachedDisk> {
        self.journal.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

/// A parsed provisioning event
#[derive(Debug)]
pub struct EventDocument {
    /// Declared VMs by name
    pub vms: BTreeMap<String, DeclaredVm>,

    /// The event, ready to hand to a [`crate::Provisioner`]
    pub context: Context,
}

#[derive(Debug, Clone, Copy)]
enum NodeKind {
    Vm,
    Scope(ParameterSource),
    Provision,
}

/// Map of top-level node names to their handling
static NODES: phf::Map<&'static str, NodeKind> = phf::phf_map! {
    "vm" => NodeKind::Vm,
    "inputs" => NodeKind::Scope(ParameterSource::Inputs),
    "current" => NodeKind::Scope(ParameterSource::Current),
    "object" => NodeKind::Scope(ParameterSource::Object),
    "root" => NodeKind::Scope(ParameterSource::Root),
    "state" => NodeKind::Scope(ParameterSource::State),
    "provision" => NodeKind::Provision,
};

// Accumulates the document state while walking nodes in order
#[derive(Default)]
struct Builder {
    vms: BTreeMap<String, DeclaredVm>,
    scopes: Scopes,
    provision: Option<ProvisionRequest>,
}

impl EventDocument {
    /// Parse an event document from a file path
    pub fn new_for_path<P>(file: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let file = file.as_ref();
        let name = file.to_string_lossy();
        let txt = fs::read_to_string(file)?;
        Self::new(name.to_string(), txt)
    }

    /// Parse an event document from a string
    pub fn new(name: String, contents: String) -> Result<Self, Error> {
        let source = Arc::new(contents);
        let ns = NamedSource::new(name, source).with_language("KDL");
        let d = KdlDocument::parse_v2(ns.inner())?;

        let mut builder = Builder::default();

        // Collect all failures in this document
        let (_, errors): (Vec<()>, Vec<Error>) = d
            .nodes()
            .iter()
            .map(|node| builder.parse_node(node))
            .partition_result();

        if !errors.is_empty() {
            return Err(ParseError {
                src: ns.clone(),
                diagnostics: errors,
            })?;
        }

        debug!("Parsed event document with {} vms", builder.vms.len());

        let context = Context::new(builder.scopes);
        let context = match builder.provision {
            Some(provision) => context.with_provision(provision),
            None => context,
        };

        Ok(Self {
            vms: builder.vms,
            context,
        })
    }

    /// Look up a declared VM by name
    pub fn vm(&self, name: &str) -> Option<&DeclaredVm> {
        self.vms.get(name)
    }
}

impl Builder {
    fn parse_node(&mut self, node: &KdlNode) -> Result<(), Error> {
        let name = node.name().value();
        let kind = NODES.get(name).ok_or_else(|| UnsupportedNode {
            at: node.span(),
            name: name.into(),
            advice: Some(format!("supported nodes are: {}", NODES.keys().sorted().join(", "))),
        })?;

        trace!("node '{name}' => {kind:?}");
        match *kind {
            NodeKind::Vm => self.parse_vm(node),
            NodeKind::Scope(source) => {
                let bag = self.parse_bag(node)?;
                self.scopes.get_mut(source).overlay(&bag);
                Ok(())
            }
            NodeKind::Provision => self.parse_provision(node),
        }
    }

    // vm "name" storage="ds-01" fail-after=2
    fn parse_vm(&mut self, node: &KdlNode) -> Result<(), Error> {
        let name = get_argument_str(node, "name", "vm <name> - provide a name for the vm")?;
        if self.vms.contains_key(&name) {
            return Err(InvalidArguments {
                at: node.span(),
                advice: Some(format!("vm '{name}' is already declared")),
            }
            .into());
        }

        let mut mock = MockVm::new(name.clone());
        if let Some(storage) = get_property_str(node, "storage")? {
            mock = mock.with_storage(storage);
        }
        if let Some(count) = get_property_usize(node, "fail-after")? {
            mock = mock.fail_after(count);
        }

        let journal = mock.journal();
        self.vms.insert(
            name,
            DeclaredVm {
                vm: VmRef::new(mock),
                journal,
            },
        );
        Ok(())
    }

    // provision vm="name" { ...options... }
    fn parse_provision(&mut self, node: &KdlNode) -> Result<(), Error> {
        if self.provision.is_some() {
            return Err(InvalidArguments {
                at: node.span(),
                advice: Some("only one 'provision' node is supported".to_owned()),
            }
            .into());
        }

        let vm = match node.entry("vm") {
            Some(entry) => Some(self.lookup_vm(entry)?),
            None => None,
        };
        let options = self.parse_bag(node)?;

        self.provision = Some(ProvisionRequest::new(vm, options));
        Ok(())
    }

    // Every child node of a block is one option
    fn parse_bag(&self, node: &KdlNode) -> Result<OptionsBag, Error> {
        let mut bag = OptionsBag::new();
        for child in node.iter_children() {
            bag.insert(child.name().value(), self.parse_option(child)?);
        }
        Ok(bag)
    }

    fn parse_option(&self, node: &KdlNode) -> Result<Value, Error> {
        if !properties(node).is_empty() {
            return Err(InvalidArguments {
                at: node.span(),
                advice: Some("options take positional values only".to_owned()),
            }
            .into());
        }

        let arguments = arguments(node);
        if node.children().is_some() {
            if !arguments.is_empty() {
                return Err(InvalidArguments {
                    at: node.span(),
                    advice: Some("an option has either values or a block, not both".to_owned()),
                }
                .into());
            }
            return Ok(Value::Map(self.parse_bag(node)?));
        }

        match arguments.as_slice() {
            [] => Ok(Value::Null),
            [entry] => self.parse_value(entry),
            entries => Ok(Value::List(
                entries.iter().map(|e| self.parse_value(e)).collect::<Result<_, _>>()?,
            )),
        }
    }

    fn parse_value(&self, entry: &KdlEntry) -> Result<Value, Error> {
        if let Some(ty) = entry.ty() {
            return match ty.value() {
                "vm" => Ok(Value::Vm(self.lookup_vm(entry)?)),
                other => Err(InvalidArguments {
                    at: entry.span(),
                    advice: Some(format!("unsupported type annotation '{other}', only (vm) is supported")),
                }
                .into()),
            };
        }

        let value = entry.value();
        if let Some(s) = value.as_string() {
            Ok(Value::from(s))
        } else if let Some(i) = value.as_integer() {
            let i = i64::try_from(i).map_err(|_| InvalidArguments {
                at: entry.span(),
                advice: Some("integer does not fit in 64 bits".to_owned()),
            })?;
            Ok(Value::Integer(i))
        } else if let Some(f) = value.as_float() {
            Ok(Value::Float(f))
        } else if let Some(b) = value.as_bool() {
            Ok(Value::Bool(b))
        } else {
            Ok(Value::Null)
        }
    }

    fn lookup_vm(&self, entry: &KdlEntry) -> Result<VmRef, Error> {
        if !entry.value().is_string() {
            return Err(InvalidType {
                at: entry.span(),
                expected_type: KdlType::String,
                found_type: KdlType::for_value(entry.value()),
            }
            .into());
        }

        let name = entry_str(entry)?;
        self.vms.get(name).map(|d| d.vm.clone()).ok_or_else(|| {
            UnknownVm {
                at: entry.span(),
                name: name.to_owned(),
                advice: Some(format!("declare it first with: vm \"{name}\"")),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn parse(contents: &str) -> Result<EventDocument, Error> {
        EventDocument::new("test.kdl".to_owned(), contents.to_owned())
    }

    #[test]
    fn test_scopes_and_values() {
        let doc = parse(
            r#"
            vm "web01" storage="ds-01"
            inputs { default_bootable #true }
            root {
                vmdb_object_type "vm"
                vm (vm)"web01"
                disk_1_size 10
                ratio 1.5
                nothing #null
                pair 7 "ds-02"
                dialog { disk_2_size "5" }
            }
            "#,
        )
        .unwrap();

        let scopes = doc.context.scopes();
        assert_eq!(
            scopes.get(ParameterSource::Inputs).get("default_bootable"),
            Some(&Value::Bool(true))
        );

        let root = scopes.root();
        assert_eq!(root.get("vmdb_object_type"), Some(&Value::from("vm")));
        assert_eq!(root.get("disk_1_size"), Some(&Value::Integer(10)));
        assert_eq!(root.get("ratio"), Some(&Value::Float(1.5)));
        assert_eq!(root.get("nothing"), Some(&Value::Null));
        assert_eq!(root.get("pair"), Some(&Value::List(vec![Value::from(7), Value::from("ds-02")])));

        let dialog = root.get("dialog").and_then(Value::as_bag).unwrap();
        assert_eq!(dialog.get("disk_2_size"), Some(&Value::from("5")));

        let vm = root.get("vm").and_then(Value::as_vm).unwrap();
        assert_eq!(vm, &doc.vm("web01").unwrap().vm);
        assert!(doc.context.provision().is_none());
    }

    #[test]
    fn test_provision_node() {
        let doc = parse(
            r#"
            vm "new01"
            provision vm="new01" {
                dest_storage 7 "ds-02"
            }
            "#,
        )
        .unwrap();

        let provision = doc.context.provision().unwrap();
        assert_eq!(provision.dest_storage(), Some("ds-02"));
        assert_eq!(provision.vm().map(|vm| vm.name()), Some("new01"));
    }

    #[test]
    fn test_collected_errors() {
        let err = parse(
            r#"
            vm
            strategy "nope"
            root { vm (vm)"ghost" }
            "#,
        )
        .unwrap_err();

        let Error::Parse(ParseError { diagnostics, .. }) = err else {
            panic!("expected parse error, got {err:?}");
        };
        assert_eq!(diagnostics.len(), 3);
        assert!(matches!(diagnostics[0], Error::MissingEntry(_)));
        assert!(matches!(diagnostics[1], Error::UnsupportedNode(_)));
        assert!(matches!(diagnostics[2], Error::UnknownVm(_)));
    }

    #[test]
    fn test_invalid_vm_properties() {
        let err = parse(r#"vm "web01" fail-after="two""#).unwrap_err();
        let Error::Parse(ParseError { diagnostics, .. }) = err else {
            panic!("expected parse error, got {err:?}");
        };
        assert!(matches!(
            &diagnostics[0],
            Error::InvalidType(InvalidType {
                expected_type: KdlType::Integer,
                found_type: KdlType::String,
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_option_properties() {
        assert!(parse(r#"root { disk_1_size size=10 }"#).is_err());
        assert!(parse(r#"root { dialog 1 { disk_1_size 10 } }"#).is_err());
        assert!(parse(r#"vm "a"; vm "a""#).is_err());
    }

    #[test]
    fn test_invalid_syntax() {
        assert!(matches!(parse("root {"), Err(Error::Kdl(_))));
    }
}
