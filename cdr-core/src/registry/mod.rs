//! Registry - masks, sets, dependencies and candidates
//!
//! The registry is written during a registration phase and read afterwards:
//!
//! ```text
//!   register_mask ─┐
//!   register_set ──┼──► Registry ──► Container::new(registry) ──► Arc<Registry>
//!   register_dependency            (&mut self)                     (read only)
//!   register_candidate ┘
//! ```
//!
//! Sets form a tree addressed by dotted paths. Referencing a path creates
//! every missing set along it.

mod dependency;
mod set;
mod version;

pub use dependency::{Candidate, Capability, Dependency, DependencyHandle};
pub use set::DependencySet;
pub use version::Version;

use std::any::Any;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::json;

use crate::criteria::Mask;
use crate::error::RegistrationError;
use crate::events::{null_sink, EngineEvent, EventType, SharedSink};
use crate::path;

/// Registered masks and the set tree
pub struct Registry {
    root: DependencySet,
    masks: IndexMap<String, Arc<Mask>>,
    sink: SharedSink,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("masks", &self.masks.keys().collect::<Vec<_>>())
            .field("sets", &self.set_paths())
            .finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            root: DependencySet::default(),
            masks: IndexMap::new(),
            sink: null_sink(),
        }
    }

    /// Publish registration events to `sink`
    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn sink(&self) -> &SharedSink {
        &self.sink
    }

    fn emit(&self, event_type: EventType, payload: serde_json::Value) {
        self.sink.publish(&EngineEvent::new(event_type, payload));
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Register a mask; names are unique
    pub fn register_mask(&mut self, mask: Mask) -> Result<Arc<Mask>, RegistrationError> {
        check_name(mask.name())?;
        if self.masks.contains_key(mask.name()) {
            return Err(RegistrationError::MaskAlreadyDefined {
                mask: mask.name().to_string(),
            });
        }

        let mask = Arc::new(mask);
        self.masks.insert(mask.name().to_string(), mask.clone());
        self.emit(
            EventType::MaskRegistered,
            json!({ "mask": mask.name(), "criteria": mask.len() }),
        );
        Ok(mask)
    }

    /// Register a set and every missing ancestor; existing sets are kept
    pub fn register_set(&mut self, set_path: &str) -> Result<(), RegistrationError> {
        check_name(set_path)?;
        for created in self.ensure_set(set_path) {
            self.emit(EventType::SetRegistered, json!({ "set": created }));
        }
        Ok(())
    }

    fn ensure_set(&mut self, set_path: &str) -> Vec<String> {
        let mut created = Vec::new();
        let mut node = &mut self.root;
        let mut current = String::new();
        for segment in path::segments(set_path) {
            current = path::join(&current, segment);
            if node.child(segment).is_none() {
                created.push(current.clone());
            }
            node = node.insert_child(segment, DependencySet::new(current.clone()));
        }
        created
    }

    /// Register a dependency in `set_path`, creating the set if needed.
    ///
    /// Registering an existing dependency again returns the same handle and
    /// replaces its description; its candidates are kept.
    pub fn register_dependency(
        &mut self,
        set_path: &str,
        name: &str,
        description: &str,
    ) -> Result<DependencyHandle, RegistrationError> {
        check_name(set_path)?;
        check_segment(name)?;
        self.register_set(set_path)?;

        let set = self.find_set_mut(set_path)?;
        let existing = match set.dependency_mut(name) {
            Some(dependency) => {
                dependency.set_description(description.to_string());
                true
            }
            None => {
                set.insert_dependency(Dependency::new(name.to_string(), description.to_string()));
                false
            }
        };

        self.emit(
            EventType::DependencyRegistered,
            json!({ "set": set_path, "dependency": name, "existing": existing }),
        );
        Ok(DependencyHandle::new(set_path, name))
    }

    /// Register a dependency whose instances must be of type `T`
    pub fn register_dependency_of<T: Any + ?Sized>(
        &mut self,
        set_path: &str,
        name: &str,
        description: &str,
    ) -> Result<DependencyHandle, RegistrationError> {
        let handle = self.register_dependency(set_path, name, description)?;
        self.find_dependency_mut(&handle)?
            .set_capability(Capability::of::<T>());
        Ok(handle)
    }

    /// Attach a candidate to a dependency.
    ///
    /// `mask` names a registered mask; `None` makes the candidate match every
    /// context. Unversioned candidates get `0.0.0`.
    pub fn register_candidate(
        &mut self,
        handle: &DependencyHandle,
        identifier: &str,
        mask: Option<&str>,
        version: Option<Version>,
    ) -> Result<(), RegistrationError> {
        check_name(identifier)?;
        let mask = match mask {
            Some(name) => Some(self.find_mask_arc(name)?),
            None => None,
        };
        let version = version.unwrap_or_default();

        let payload = json!({
            "set": handle.set_path(),
            "dependency": handle.name(),
            "candidate": identifier,
            "mask": mask.as_ref().map(|m| m.name()),
            "version": version.to_string(),
        });
        self.find_dependency_mut(handle)?
            .push_candidate(Candidate::new(identifier.to_string(), mask, version));
        self.emit(EventType::CandidateRegistered, payload);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    pub fn mask(&self, name: &str) -> Option<&Mask> {
        self.masks.get(name).map(|m| m.as_ref())
    }

    /// Like [`Registry::mask`] but failing with `MaskNotFound`
    pub fn find_mask(&self, name: &str) -> Result<&Mask, RegistrationError> {
        self.mask(name).ok_or_else(|| RegistrationError::MaskNotFound {
            mask: name.to_string(),
        })
    }

    fn find_mask_arc(&self, name: &str) -> Result<Arc<Mask>, RegistrationError> {
        self.masks
            .get(name)
            .cloned()
            .ok_or_else(|| RegistrationError::MaskNotFound {
                mask: name.to_string(),
            })
    }

    /// Registered masks in registration order
    pub fn masks(&self) -> impl Iterator<Item = &Mask> {
        self.masks.values().map(|m| m.as_ref())
    }

    /// Walk `set_path`, failing on the first missing segment
    pub fn find_set(&self, set_path: &str) -> Result<&DependencySet, RegistrationError> {
        check_name(set_path)?;
        let mut node = &self.root;
        for segment in path::segments(set_path) {
            node = node.child(segment).ok_or_else(|| set_not_found(set_path, segment))?;
        }
        Ok(node)
    }

    fn find_set_mut(&mut self, set_path: &str) -> Result<&mut DependencySet, RegistrationError> {
        let mut node = &mut self.root;
        for segment in path::segments(set_path) {
            node = match node.child_mut(segment) {
                Some(child) => child,
                None => return Err(set_not_found(set_path, segment)),
            };
        }
        Ok(node)
    }

    pub fn find_dependency(&self, set_path: &str, name: &str) -> Result<&Dependency, RegistrationError> {
        self.find_set(set_path)?
            .dependency(name)
            .ok_or_else(|| RegistrationError::DependencyNotFound {
                set_path: set_path.to_string(),
                name: name.to_string(),
            })
    }

    fn find_dependency_mut(&mut self, handle: &DependencyHandle) -> Result<&mut Dependency, RegistrationError> {
        self.find_set_mut(handle.set_path())?
            .dependency_mut(handle.name())
            .ok_or_else(|| RegistrationError::DependencyNotFound {
                set_path: handle.set_path().to_string(),
                name: handle.name().to_string(),
            })
    }

    /// Candidates of a dependency in registration order
    pub fn candidates(&self, set_path: &str, name: &str) -> Result<&[Candidate], RegistrationError> {
        Ok(self.find_dependency(set_path, name)?.candidates())
    }

    /// Every registered set path, parents before children
    pub fn set_paths(&self) -> Vec<String> {
        let mut sets = Vec::new();
        self.root.walk(&mut sets);
        sets.into_iter()
            .filter(|set| !set.path().is_empty())
            .map(|set| set.path().to_string())
            .collect()
    }
}

fn check_name(name: &str) -> Result<(), RegistrationError> {
    path::validate(name).map_err(|reason| RegistrationError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

fn check_segment(name: &str) -> Result<(), RegistrationError> {
    check_name(name)?;
    if name.contains(path::SEPARATOR) {
        return Err(RegistrationError::InvalidName {
            name: name.to_string(),
            reason: format!("dependency names must not contain '{}'", path::SEPARATOR),
        });
    }
    Ok(())
}

fn set_not_found(set_path: &str, segment: &str) -> RegistrationError {
    RegistrationError::SetNotFound {
        path: set_path.to_string(),
        segment: segment.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::Criterion;
    use crate::events::MemorySink;

    fn happy_hour() -> Mask {
        Mask::new("happyHour")
            .with_criterion(Criterion::equals("time.hour", 5).unwrap())
            .with_criterion(Criterion::equals("time.period", "pm").unwrap())
    }

    #[test]
    fn test_register_mask_rejects_duplicates() {
        let mut registry = Registry::new();
        registry.register_mask(happy_hour()).unwrap();

        assert_eq!(
            registry.register_mask(Mask::new("happyHour")).unwrap_err(),
            RegistrationError::MaskAlreadyDefined {
                mask: "happyHour".to_string()
            }
        );
        // The first registration wins
        assert_eq!(registry.find_mask("happyHour").unwrap().len(), 2);
    }

    #[test]
    fn test_sets_are_created_implicitly() {
        let mut registry = Registry::new();
        registry.register_dependency("app.pricing", "Discount", "").unwrap();
        registry.register_set("app.shipping").unwrap();

        assert_eq!(registry.set_paths(), vec!["app", "app.pricing", "app.shipping"]);
        assert!(registry.find_set("app").unwrap().dependency("Discount").is_none());
        assert_eq!(registry.find_set("app.pricing").unwrap().path(), "app.pricing");
    }

    #[test]
    fn test_lookup_failures() {
        let mut registry = Registry::new();
        registry.register_dependency("app.pricing", "Discount", "").unwrap();

        assert_eq!(
            registry.find_set("app.billing.tax").unwrap_err(),
            RegistrationError::SetNotFound {
                path: "app.billing.tax".to_string(),
                segment: "billing".to_string(),
            }
        );
        assert!(matches!(
            registry.find_dependency("app.pricing", "Tax"),
            Err(RegistrationError::DependencyNotFound { .. })
        ));
        assert!(matches!(
            registry.find_mask("weekend"),
            Err(RegistrationError::MaskNotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_names() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.register_set("a..b"),
            Err(RegistrationError::InvalidName { .. })
        ));
        assert!(matches!(
            registry.register_dependency("app", "pricing.Discount", ""),
            Err(RegistrationError::InvalidName { .. })
        ));
        assert!(matches!(
            registry.register_mask(Mask::new("")),
            Err(RegistrationError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_padded_set_paths_are_rejected() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.register_dependency(" examples", "Discount", ""),
            Err(RegistrationError::InvalidName { .. })
        ));
        assert!(matches!(
            registry.register_set("app. pricing"),
            Err(RegistrationError::InvalidName { .. })
        ));
        assert!(registry.set_paths().is_empty());
    }

    #[test]
    fn test_register_dependency_is_idempotent() {
        let mut registry = Registry::new();
        let first = registry.register_dependency("examples", "Discount", "old").unwrap();
        registry.register_candidate(&first, "NoDiscount", None, None).unwrap();
        let second = registry.register_dependency("examples", "Discount", "new").unwrap();

        assert_eq!(first, second);
        let dependency = registry.find_dependency("examples", "Discount").unwrap();
        assert_eq!(dependency.description(), "new");
        assert_eq!(dependency.candidates().len(), 1);
    }

    #[test]
    fn test_register_candidate() {
        let mut registry = Registry::new();
        registry.register_mask(happy_hour()).unwrap();
        let handle = registry.register_dependency("examples", "Discount", "").unwrap();

        registry.register_candidate(&handle, "NoDiscount", None, None).unwrap();
        registry
            .register_candidate(&handle, "HappyHourDiscount", Some("happyHour"), Some(Version::new(1, 2, 0)))
            .unwrap();

        let candidates = registry.candidates("examples", "Discount").unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].identifier(), "NoDiscount");
        assert_eq!(candidates[0].version(), Version::ZERO);
        assert_eq!(candidates[1].mask_name(), Some("happyHour"));
        assert_eq!(candidates[1].version(), Version::new(1, 2, 0));
    }

    #[test]
    fn test_register_candidate_with_unknown_mask() {
        let mut registry = Registry::new();
        let handle = registry.register_dependency("examples", "Discount", "").unwrap();
        assert_eq!(
            registry.register_candidate(&handle, "X", Some("weekend"), None),
            Err(RegistrationError::MaskNotFound {
                mask: "weekend".to_string()
            })
        );
        assert!(registry.candidates("examples", "Discount").unwrap().is_empty());
    }

    #[test]
    fn test_capability_is_recorded() {
        let mut registry = Registry::new();
        registry
            .register_dependency_of::<String>("examples", "Greeting", "")
            .unwrap();
        let dependency = registry.find_dependency("examples", "Greeting").unwrap();
        assert_eq!(dependency.capability(), Some(Capability::of::<String>()));
    }

    #[test]
    fn test_registration_events() {
        let sink = Arc::new(MemorySink::new());
        let mut registry = Registry::new().with_sink(sink.clone());
        registry.register_mask(happy_hour()).unwrap();
        let handle = registry.register_dependency("app.pricing", "Discount", "").unwrap();
        registry.register_candidate(&handle, "NoDiscount", None, None).unwrap();

        assert_eq!(
            sink.event_types(),
            vec![
                EventType::MaskRegistered,
                EventType::SetRegistered,
                EventType::SetRegistered,
                EventType::DependencyRegistered,
                EventType::CandidateRegistered,
            ]
        );
        assert_eq!(
            sink.events_of_type(EventType::SetRegistered)[1].payload_str("set"),
            Some("app.pricing")
        );
    }
}
