//! Dependencies and their candidates

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::criteria::Mask;
use crate::instantiate::Instance;
use crate::path;

use super::Version;

/// One registered implementation choice for a dependency
#[derive(Debug, Clone)]
pub struct Candidate {
    identifier: String,
    mask: Option<Arc<Mask>>,
    version: Version,
}

impl Candidate {
    pub(crate) fn new(identifier: String, mask: Option<Arc<Mask>>, version: Version) -> Self {
        Self {
            identifier,
            mask,
            version,
        }
    }

    /// What the instantiator is asked to build
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The mask gating this candidate; `None` matches every context
    pub fn mask(&self) -> Option<&Mask> {
        self.mask.as_deref()
    }

    pub fn mask_name(&self) -> Option<&str> {
        self.mask.as_ref().map(|m| m.name())
    }

    pub fn version(&self) -> Version {
        self.version
    }
}

/// The Rust type a dependency's instances must have
#[derive(Clone, Copy)]
pub struct Capability {
    type_id: TypeId,
    type_name: &'static str,
}

impl Capability {
    /// Require instances of `T`
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn satisfied_by(&self, instance: &Instance) -> bool {
        instance.value_type_id() == self.type_id
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Capability").field(&self.type_name).finish()
    }
}

impl PartialEq for Capability {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for Capability {}

/// A named dependency with its ordered candidates
#[derive(Debug, Clone)]
pub struct Dependency {
    name: String,
    description: String,
    capability: Option<Capability>,
    candidates: Vec<Candidate>,
}

impl Dependency {
    pub(crate) fn new(name: String, description: String) -> Self {
        Self {
            name,
            description,
            capability: None,
            candidates: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn capability(&self) -> Option<Capability> {
        self.capability
    }

    /// Candidates in registration order
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub(crate) fn set_description(&mut self, description: String) {
        self.description = description;
    }

    pub(crate) fn set_capability(&mut self, capability: Capability) {
        self.capability = Some(capability);
    }

    pub(crate) fn push_candidate(&mut self, candidate: Candidate) {
        self.candidates.push(candidate);
    }
}

/// Address of a registered dependency
///
/// Returned by registration and used to attach candidates to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DependencyHandle {
    set_path: String,
    name: String,
}

impl DependencyHandle {
    pub(crate) fn new(set_path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            set_path: set_path.into(),
            name: name.into(),
        }
    }

    pub fn set_path(&self) -> &str {
        &self.set_path
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for DependencyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&path::join(&self.set_path, &self.name))
    }
}
