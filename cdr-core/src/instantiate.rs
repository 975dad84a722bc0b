//! Instantiation - turning a resolved candidate identifier into an object
//!
//! The engine never constructs objects itself. A container is given an
//! [`Instantiator`] and asks it for an [`Instance`] of whatever identifier
//! the resolver picked. [`FactoryInstantiator`] maps identifiers to
//! closures; any `Fn(&str) -> Result<Instance, InstantiationError>` works
//! as well.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::InstantiationError;

/// A type-erased, shareable object produced by an instantiator
#[derive(Clone)]
pub struct Instance {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Instance {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            inner: value,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Name of the concrete type held
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// `TypeId` of the concrete type held
    pub fn value_type_id(&self) -> TypeId {
        (*self.inner).type_id()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Shared handle to the object, if it is a `T`
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.inner.clone().downcast::<T>().ok()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Whether both handles point at the same object
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.type_name)
            .field("ptr", &Arc::as_ptr(&self.inner).cast::<()>())
            .finish()
    }
}

/// Builds objects from candidate identifiers
pub trait Instantiator: Send + Sync {
    fn instantiate(&self, identifier: &str) -> Result<Instance, InstantiationError>;
}

impl<F> Instantiator for F
where
    F: Fn(&str) -> Result<Instance, InstantiationError> + Send + Sync,
{
    fn instantiate(&self, identifier: &str) -> Result<Instance, InstantiationError> {
        self(identifier)
    }
}

type Factory = Box<dyn Fn() -> Result<Instance, String> + Send + Sync>;

/// Instantiator backed by a table of factory closures
#[derive(Default)]
pub struct FactoryInstantiator {
    factories: IndexMap<String, Factory>,
}

impl FactoryInstantiator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an infallible factory; a later registration replaces an
    /// earlier one for the same identifier
    pub fn register<T, F>(&mut self, identifier: impl Into<String>, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.factories
            .insert(identifier.into(), Box::new(move || Ok(Instance::new(factory()))));
    }

    /// Register a factory whose failures become `InstantiationFailed`
    pub fn register_fallible<T, E, F>(&mut self, identifier: impl Into<String>, factory: F)
    where
        T: Any + Send + Sync,
        E: fmt::Display,
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
    {
        self.factories.insert(
            identifier.into(),
            Box::new(move || factory().map(Instance::new).map_err(|e| e.to_string())),
        );
    }

    /// Builder form of [`FactoryInstantiator::register`]
    pub fn with_factory<T, F>(mut self, identifier: impl Into<String>, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.register(identifier, factory);
        self
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl fmt::Debug for FactoryInstantiator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryInstantiator")
            .field("identifiers", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Instantiator for FactoryInstantiator {
    fn instantiate(&self, identifier: &str) -> Result<Instance, InstantiationError> {
        let factory = self
            .factories
            .get(identifier)
            .ok_or_else(|| InstantiationError::ClassNotFound {
                identifier: identifier.to_string(),
            })?;
        factory().map_err(|reason| InstantiationError::InstantiationFailed {
            identifier: identifier.to_string(),
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_downcast() {
        let instance = Instance::new(String::from("hello"));
        assert!(instance.is::<String>());
        assert_eq!(instance.downcast_ref::<String>().map(String::as_str), Some("hello"));
        assert_eq!(instance.downcast::<String>().as_deref().map(String::as_str), Some("hello"));
        assert!(instance.downcast::<u32>().is_none());
        assert_eq!(instance.value_type_id(), TypeId::of::<String>());
        assert!(instance.type_name().contains("String"));
    }

    #[test]
    fn test_instance_identity() {
        let a = Instance::new(1u32);
        let b = a.clone();
        let c = Instance::new(1u32);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn test_factory_instantiator() {
        let mut factories = FactoryInstantiator::new().with_factory("Greeting", || String::from("hi"));
        factories.register_fallible("Broken", || Err::<String, _>("database unavailable"));

        let greeting = factories.instantiate("Greeting").unwrap();
        assert_eq!(greeting.downcast_ref::<String>().map(String::as_str), Some("hi"));

        assert_eq!(
            factories.instantiate("Missing").unwrap_err(),
            InstantiationError::ClassNotFound {
                identifier: "Missing".to_string()
            }
        );
        assert_eq!(
            factories.instantiate("Broken").unwrap_err(),
            InstantiationError::InstantiationFailed {
                identifier: "Broken".to_string(),
                reason: "database unavailable".to_string(),
            }
        );
        assert!(factories.contains("Greeting"));
        assert_eq!(factories.identifiers().count(), 2);
    }

    #[test]
    fn test_closure_instantiator() {
        let instantiator = |identifier: &str| -> Result<Instance, InstantiationError> {
            Ok(Instance::new(identifier.len()))
        };
        let instance = instantiator.instantiate("abc").unwrap();
        assert_eq!(instance.downcast_ref::<usize>(), Some(&3));
    }

    #[test]
    fn test_factories_build_fresh_objects() {
        let factories = FactoryInstantiator::new().with_factory("Counter", || vec![0u8]);
        let a = factories.instantiate("Counter").unwrap();
        let b = factories.instantiate("Counter").unwrap();
        assert!(!a.ptr_eq(&b));
    }
}
