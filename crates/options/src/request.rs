// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Request discrimination and option bag normalization
//!
//! A provisioning event carries its options in different places depending
//! on what kind of request triggered it. [`OptionsNormalizer`] finds the VM
//! and the options for each kind, then flattens the `ws_values` and `dialog`
//! sub-bags on top so every option can be looked up by a single key.

use std::{fmt, str::FromStr};

use log::{debug, info};
use vm::VmRef;

use crate::{Error, OptionsBag, ParameterResolver, ParameterSource, Scopes, Value};

/// Root attribute naming the kind of object that triggered the event
pub const OBJECT_TYPE_KEY: &str = "vmdb_object_type";

/// Sub-bag of web service supplied values
pub const WS_VALUES_KEY: &str = "ws_values";

/// Sub-bag of dialog supplied values
pub const DIALOG_KEY: &str = "dialog";

/// The kind of request that triggered the provisioning event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    /// A VM provisioning request (`miq_provision`)
    ProvisionRequest,
    /// A request against an existing VM (`vm`)
    VmRequest,
    /// A generic automation task (`automation_task`)
    AutomationTask,
}

/// Map of object type discriminants to request types
static REQUEST_TYPES: phf::Map<&'static str, RequestType> = phf::phf_map! {
    "miq_provision" => RequestType::ProvisionRequest,
    "vm" => RequestType::VmRequest,
    "automation_task" => RequestType::AutomationTask,
};

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProvisionRequest => f.write_str("miq_provision"),
            Self::VmRequest => f.write_str("vm"),
            Self::AutomationTask => f.write_str("automation_task"),
        }
    }
}

impl FromStr for RequestType {
    type Err = Error;

    /// Attempt to convert an object type discriminant to a request type
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        REQUEST_TYPES
            .get(value)
            .copied()
            .ok_or_else(|| Error::UnsupportedRequestType(value.to_owned()))
    }
}

/// A VM provisioning request and the options it was submitted with
#[derive(Debug, Clone, Default)]
pub struct ProvisionRequest {
    vm: Option<VmRef>,
    options: OptionsBag,
}

impl ProvisionRequest {
    pub fn new(vm: Option<VmRef>, options: OptionsBag) -> Self {
        Self { vm, options }
    }

    /// The VM being provisioned, once the platform has created it
    pub fn vm(&self) -> Option<&VmRef> {
        self.vm.as_ref()
    }

    /// The raw request options, before any overlays
    pub fn options(&self) -> &OptionsBag {
        &self.options
    }

    /// Name of the destination datastore, the second element of the
    /// `dest_storage` (id, name) pair
    pub fn dest_storage(&self) -> Option<&str> {
        self.options
            .get("dest_storage")
            .and_then(Value::as_list)
            .and_then(|pair| pair.get(1))
            .and_then(Value::as_str)
    }
}

/// Everything known about the triggering request. Immutable once built.
#[derive(Debug, Clone)]
pub struct RequestContext {
    object_type: String,
    provision: Option<ProvisionRequest>,
}

impl RequestContext {
    pub fn new(object_type: impl Into<String>, provision: Option<ProvisionRequest>) -> Self {
        Self {
            object_type: object_type.into(),
            provision,
        }
    }

    /// Build the context from the event's root attributes
    pub fn from_scopes(scopes: &Scopes, provision: Option<ProvisionRequest>) -> Self {
        let object_type = scopes
            .root()
            .get(OBJECT_TYPE_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default();
        debug!("{OBJECT_TYPE_KEY} => '{object_type}'");
        Self::new(object_type, provision)
    }

    /// The raw object type discriminant
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    pub fn request_type(&self) -> Result<RequestType, Error> {
        self.object_type.parse()
    }

    pub fn provision(&self) -> Option<&ProvisionRequest> {
        self.provision.as_ref()
    }
}

/// The VM and flattened options of a request
#[derive(Debug, Clone)]
pub struct Normalized {
    pub vm: VmRef,
    pub options: OptionsBag,
}

/// Builds a single canonical options bag for a request
#[derive(Debug, Clone, Copy)]
pub struct OptionsNormalizer<'a> {
    resolver: ParameterResolver<'a>,
}

impl<'a> OptionsNormalizer<'a> {
    pub fn new(resolver: ParameterResolver<'a>) -> Self {
        Self { resolver }
    }

    /// Locate the VM and options for the request
    pub fn build(&self, request: &RequestContext) -> Result<Normalized, Error> {
        let request_type = request.request_type()?;
        info!("Normalizing options for {request_type} request");

        let (vm, base) = match request_type {
            RequestType::ProvisionRequest => {
                let provision = request.provision().ok_or(Error::MissingProvisionRequest)?;
                (provision.vm().cloned(), provision.options().clone())
            }
            RequestType::VmRequest => (
                self.resolver.resolve_vm("vm"),
                self.resolver.scopes().get(ParameterSource::Root).clone(),
            ),
            RequestType::AutomationTask => (self.resolver.resolve_vm("vm"), self.task_options()?),
        };

        let vm = vm.ok_or(Error::MissingVm)?;
        let options = flatten(base);
        if options.is_empty() {
            return Err(Error::MissingOptions);
        }

        debug!("vm => {vm}, options => {options}");
        Ok(Normalized { vm, options })
    }

    // Automation tasks may pass their options JSON encoded
    fn task_options(&self) -> Result<OptionsBag, Error> {
        let options = match self.resolver.resolve("options") {
            Some(Value::String(encoded)) => {
                let decoded: serde_json::Value = serde_json::from_str(encoded)?;
                Value::from(decoded)
            }
            Some(value) => value.clone(),
            None => Value::Null,
        };

        Ok(match options {
            Value::Map(bag) => bag,
            _ => OptionsBag::new(),
        })
    }
}

/// Overlay the `ws_values` and then `dialog` sub-bags onto the base bag
fn flatten(mut base: OptionsBag) -> OptionsBag {
    for key in [WS_VALUES_KEY, DIALOG_KEY] {
        if let Some(overlay) = base.get(key).and_then(Value::as_bag).cloned() {
            debug!("Merging {} {key} options", overlay.len());
            base.overlay(&overlay);
        }
    }
    base
}

#[cfg(test)]
mod tests {
    use test_log::test;
    use vm::mock::MockVm;

    use super::*;

    fn web01() -> VmRef {
        VmRef::new(MockVm::new("web01").with_storage("ds-01"))
    }

    #[test]
    fn test_request_types() {
        assert_eq!("miq_provision".parse::<RequestType>().unwrap(), RequestType::ProvisionRequest);
        assert_eq!("vm".parse::<RequestType>().unwrap(), RequestType::VmRequest);
        assert_eq!(
            "automation_task".parse::<RequestType>().unwrap(),
            RequestType::AutomationTask
        );
        assert!(matches!(
            "unknown".parse::<RequestType>(),
            Err(Error::UnsupportedRequestType(t)) if t == "unknown"
        ));
    }

    #[test]
    fn test_overlay_precedence() {
        let base = OptionsBag::new()
            .with("all", "base")
            .with("ws_and_base", "base")
            .with("only_base", "base")
            .with(
                WS_VALUES_KEY,
                OptionsBag::new().with("all", "ws").with("ws_and_base", "ws"),
            )
            .with(DIALOG_KEY, OptionsBag::new().with("all", "dialog"));

        let flat = flatten(base);
        assert_eq!(flat.get("all"), Some(&Value::from("dialog")));
        assert_eq!(flat.get("ws_and_base"), Some(&Value::from("ws")));
        assert_eq!(flat.get("only_base"), Some(&Value::from("base")));
    }

    #[test]
    fn test_provision_request() {
        let vm = web01();
        let options = OptionsBag::new()
            .with("disk_1_size", 10)
            .with(DIALOG_KEY, OptionsBag::new().with("disk_1_size", 20));
        let request = RequestContext::new("miq_provision", Some(ProvisionRequest::new(Some(vm.clone()), options)));

        let scopes = Scopes::new();
        let normalized = OptionsNormalizer::new(ParameterResolver::new(&scopes))
            .build(&request)
            .unwrap();
        assert_eq!(normalized.vm, vm);
        assert_eq!(normalized.options.get("disk_1_size"), Some(&Value::Integer(20)));
    }

    #[test]
    fn test_provision_request_missing() {
        let scopes = Scopes::new();
        let request = RequestContext::new("miq_provision", None);
        assert!(matches!(
            OptionsNormalizer::new(ParameterResolver::new(&scopes)).build(&request),
            Err(Error::MissingProvisionRequest)
        ));
    }

    #[test]
    fn test_vm_request_uses_root() {
        let vm = web01();
        let scopes = Scopes::new()
            .with(ParameterSource::Inputs, OptionsBag::new().with("vm", vm.clone()))
            .with(
                ParameterSource::Root,
                OptionsBag::new()
                    .with(OBJECT_TYPE_KEY, "vm")
                    .with(":disk_1_size", 5),
            );
        let request = RequestContext::from_scopes(&scopes, None);
        assert_eq!(request.object_type(), "vm");

        let normalized = OptionsNormalizer::new(ParameterResolver::new(&scopes))
            .build(&request)
            .unwrap();
        assert_eq!(normalized.vm, vm);
        assert_eq!(normalized.options.get("disk_1_size"), Some(&Value::Integer(5)));
    }

    #[test]
    fn test_automation_task_json_options() {
        let scopes = Scopes::new()
            .with(ParameterSource::Object, OptionsBag::new().with("vm", web01()))
            .with(
                ParameterSource::State,
                OptionsBag::new().with(
                    "options",
                    r#"{"disk_1_size": 10, "ws_values": {"disk_1_size": 15, "disk_2_size": "5"}}"#,
                ),
            );
        let request = RequestContext::new("automation_task", None);

        let normalized = OptionsNormalizer::new(ParameterResolver::new(&scopes))
            .build(&request)
            .unwrap();
        assert_eq!(normalized.options.get("disk_1_size"), Some(&Value::Integer(15)));
        assert_eq!(normalized.options.get("disk_2_size"), Some(&Value::from("5")));
    }

    #[test]
    fn test_automation_task_structured_options() {
        let scopes = Scopes::new().with(
            ParameterSource::Inputs,
            OptionsBag::new()
                .with("vm", web01())
                .with("options", OptionsBag::new().with("disk_1_size", 1)),
        );
        let request = RequestContext::new("automation_task", None);

        let normalized = OptionsNormalizer::new(ParameterResolver::new(&scopes))
            .build(&request)
            .unwrap();
        assert_eq!(normalized.options.len(), 1);
    }

    #[test]
    fn test_automation_task_invalid_json() {
        let scopes = Scopes::new().with(
            ParameterSource::Inputs,
            OptionsBag::new().with("vm", web01()).with("options", "{not json"),
        );
        let request = RequestContext::new("automation_task", None);
        assert!(matches!(
            OptionsNormalizer::new(ParameterResolver::new(&scopes)).build(&request),
            Err(Error::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_missing_vm_and_options() {
        let scopes = Scopes::new().with(ParameterSource::Root, OptionsBag::new().with("vm", "not a vm"));
        let normalizer = OptionsNormalizer::new(ParameterResolver::new(&scopes));
        assert!(matches!(
            normalizer.build(&RequestContext::new("vm", None)),
            Err(Error::MissingVm)
        ));

        let request = RequestContext::new("miq_provision", Some(ProvisionRequest::new(Some(web01()), OptionsBag::new())));
        assert!(matches!(normalizer.build(&request), Err(Error::MissingOptions)));
    }

    #[test]
    fn test_unsupported_request_type() {
        let scopes = Scopes::new().with(ParameterSource::Root, OptionsBag::new().with(OBJECT_TYPE_KEY, "unknown"));
        let request = RequestContext::from_scopes(&scopes, None);
        assert!(matches!(
            OptionsNormalizer::new(ParameterResolver::new(&scopes)).build(&request),
            Err(Error::UnsupportedRequestType(_))
        ));
    }

    #[test]
    fn test_dest_storage() {
        let request = ProvisionRequest::new(
            None,
            OptionsBag::new().with("dest_storage", vec![Value::from(7), Value::from("ds-02")]),
        );
        assert_eq!(request.dest_storage(), Some("ds-02"));
        assert_eq!(ProvisionRequest::default().dest_storage(), None);
    }
}
