// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use options::{OptionsBag, ParameterResolver, ParameterSource, ProvisionRequest, RequestContext, Scopes};

use crate::Outcome;

/// Everything a provisioning event hands to the engine.
///
/// Built once per event by the caller and passed by reference to every
/// stage; nothing is read from ambient state.
#[derive(Debug, Clone, Default)]
pub struct Context {
    scopes: Scopes,
    provision: Option<ProvisionRequest>,
}

impl Context {
    pub fn new(scopes: Scopes) -> Self {
        Self {
            scopes,
            provision: None,
        }
    }

    /// Attach the provision request that triggered the event
    pub fn with_provision(self, provision: ProvisionRequest) -> Self {
        Self {
            provision: Some(provision),
            ..self
        }
    }

    pub fn scopes(&self) -> &Scopes {
        &self.scopes
    }

    pub fn provision(&self) -> Option<&ProvisionRequest> {
        self.provision.as_ref()
    }

    /// Parameter lookup across all scopes
    pub fn resolver(&self) -> ParameterResolver<'_> {
        ParameterResolver::new(&self.scopes)
    }

    /// Describe the triggering request
    pub fn request(&self) -> RequestContext {
        RequestContext::from_scopes(&self.scopes, self.provision.clone())
    }

    /// Report an outcome back through the root attributes
    pub fn signal(&mut self, outcome: &Outcome) {
        outcome.signal(self.scopes.get_mut(ParameterSource::Root));
    }

    /// The root attributes, including any signalled outcome
    pub fn root(&self) -> &OptionsBag {
        self.scopes.root()
    }
}
