//! Container - the retrieval surface
//!
//! A [`Container`] owns the published registry, the instantiator and the
//! shared instance cache. Contexts are created per unit of work and passed
//! to every call:
//!
//! ```text
//!   ctx ──► resolve ──► Resolution ──┬─► create: instantiate every time
//!                                    └─► share:  InstanceCache (per candidate)
//! ```
//!
//! The container is `Send + Sync`; wrap it in an `Arc` to serve many
//! threads, each with its own [`Context`].

use std::any::Any;
use std::sync::Arc;

use serde_json::json;

use crate::cache::{CacheStats, CandidateKey, InstanceCache};
use crate::config::EngineConfig;
use crate::context::Context;
use crate::error::{CDRError, InstantiationError, Result};
use crate::events::{EngineEvent, EventType, SharedSink};
use crate::instantiate::{Instance, Instantiator};
use crate::registry::Registry;
use crate::resolver::{Resolution, Resolver};

pub struct Container {
    registry: Arc<Registry>,
    instantiator: Arc<dyn Instantiator>,
    cache: InstanceCache,
    sink: SharedSink,
    config: EngineConfig,
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("registry", &self.registry)
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish()
    }
}

impl Container {
    /// Publish `registry` and serve it with `instantiator`.
    ///
    /// Taking the registry by value ends the registration phase: from here
    /// on it is only read. Events go to the registry's sink.
    pub fn new(registry: Registry, instantiator: impl Instantiator + 'static) -> Self {
        Self::with_config(registry, instantiator, EngineConfig::default())
    }

    pub fn with_config(registry: Registry, instantiator: impl Instantiator + 'static, config: EngineConfig) -> Self {
        let sink = registry.sink().clone();
        Self {
            registry: Arc::new(registry),
            instantiator: Arc::new(instantiator),
            cache: InstanceCache::new(),
            sink,
            config,
        }
    }

    /// Publish container and context events to `sink` instead of the
    /// registry's
    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Shared handle to the published registry
    pub fn shared_registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A fresh context configured like this container
    pub fn new_context(&self) -> Context {
        Context::with_config(self.config.context.clone()).with_sink(self.sink.clone())
    }

    fn emit(&self, event_type: EventType, payload: serde_json::Value) {
        self.sink.publish(&EngineEvent::new(event_type, payload));
    }

    // ------------------------------------------------------------------
    // Masks
    // ------------------------------------------------------------------

    /// Activate the registered mask `name` on `ctx`
    pub fn set_mask(&self, ctx: &mut Context, name: &str) -> Result<()> {
        let mask = self.registry.find_mask(name)?;
        ctx.activate_mask(mask);
        Ok(())
    }

    /// Deactivate the registered mask `name` on `ctx`
    pub fn remove_mask(&self, ctx: &mut Context, name: &str) -> Result<()> {
        let mask = self.registry.find_mask(name)?;
        ctx.deactivate_mask(mask);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Retrieval
    // ------------------------------------------------------------------

    /// Resolve without instantiating
    pub fn resolve(&self, set_path: &str, dependency: &str, ctx: &Context) -> Result<Resolution> {
        let result = Resolver::new(&self.registry).resolve(set_path, dependency, ctx.effective_circumstances());
        match &result {
            Ok(resolution) => self.emit(
                EventType::CandidateFound,
                json!({
                    "set": set_path,
                    "dependency": dependency,
                    "candidate": resolution.identifier,
                    "mask": resolution.mask,
                    "version": resolution.version.to_string(),
                    "matched": resolution.matched,
                }),
            ),
            Err(err) => self.emit(
                EventType::CandidateNotFound,
                json!({
                    "set": set_path,
                    "dependency": dependency,
                    "code": err.error_code(),
                    "message": err.to_string(),
                }),
            ),
        }
        result
    }

    /// Resolve and build a fresh instance; never cached
    pub fn create(&self, set_path: &str, dependency: &str, ctx: &Context) -> Result<Instance> {
        let resolution = self.resolve(set_path, dependency, ctx)?;
        let instance = self.instantiate(&resolution)?;
        self.emit_instance(EventType::InstanceCreated, &resolution, &instance);
        Ok(instance)
    }

    /// Resolve and return the instance shared by every caller that resolves
    /// to the same candidate, building it on first use
    pub fn share(&self, set_path: &str, dependency: &str, ctx: &Context) -> Result<Instance> {
        if !self.config.cache.share_instances {
            return self.create(set_path, dependency, ctx);
        }

        let resolution = self.resolve(set_path, dependency, ctx)?;
        let key = CandidateKey::new(set_path, dependency, resolution.identifier.as_str());
        let outcome = self
            .cache
            .get_or_try_insert_with(&key, || self.instantiate(&resolution))?;

        let event_type = if outcome.instantiated {
            EventType::InstanceCreated
        } else {
            EventType::InstanceShared
        };
        self.emit_instance(event_type, &resolution, &outcome.instance);
        Ok(outcome.instance)
    }

    /// [`Container::create`] downcast to `T`
    pub fn create_as<T: Any + Send + Sync>(&self, set_path: &str, dependency: &str, ctx: &Context) -> Result<Arc<T>> {
        let instance = self.create(set_path, dependency, ctx)?;
        downcast(set_path, dependency, instance)
    }

    /// [`Container::share`] downcast to `T`
    pub fn share_as<T: Any + Send + Sync>(&self, set_path: &str, dependency: &str, ctx: &Context) -> Result<Arc<T>> {
        let instance = self.share(set_path, dependency, ctx)?;
        downcast(set_path, dependency, instance)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Build the winner and check it against the dependency's capability
    fn instantiate(&self, resolution: &Resolution) -> Result<Instance> {
        let capability = self
            .registry
            .find_dependency(&resolution.set_path, &resolution.dependency)?
            .capability();

        let result = self
            .instantiator
            .instantiate(&resolution.identifier)
            .and_then(|instance| match capability {
                Some(required) if !required.satisfied_by(&instance) => Err(InstantiationError::UnexpectedType {
                    identifier: resolution.identifier.clone(),
                    expected: required.type_name().to_string(),
                    actual: instance.type_name().to_string(),
                }),
                _ => Ok(instance),
            });

        result.map_err(|err| {
            let err = CDRError::from(err);
            self.emit(
                EventType::InstanceFailed,
                json!({
                    "set": resolution.set_path,
                    "dependency": resolution.dependency,
                    "candidate": resolution.identifier,
                    "code": err.error_code(),
                    "message": err.to_string(),
                }),
            );
            err
        })
    }

    fn emit_instance(&self, event_type: EventType, resolution: &Resolution, instance: &Instance) {
        self.emit(
            event_type,
            json!({
                "set": resolution.set_path,
                "dependency": resolution.dependency,
                "candidate": resolution.identifier,
                "type": instance.type_name(),
            }),
        );
    }
}

fn downcast<T: Any + Send + Sync>(set_path: &str, dependency: &str, instance: Instance) -> Result<Arc<T>> {
    instance.downcast::<T>().ok_or_else(|| {
        InstantiationError::UnexpectedType {
            identifier: format!("{}.{}", set_path, dependency),
            expected: std::any::type_name::<T>().to_string(),
            actual: instance.type_name().to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::criteria::{Criterion, Mask};
    use crate::error::RegistrationError;
    use crate::events::MemorySink;
    use crate::instantiate::FactoryInstantiator;
    use crate::registry::Version;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .register_mask(Mask::new("loud").with_criterion(Criterion::equals("volume", "high").unwrap()))
            .unwrap();
        let greeting = registry
            .register_dependency_of::<String>("app", "Greeting", "How to greet")
            .unwrap();
        registry.register_candidate(&greeting, "Hello", None, None).unwrap();
        registry
            .register_candidate(&greeting, "Shout", Some("loud"), Some(Version::new(1, 0, 0)))
            .unwrap();
        let counter = registry
            .register_dependency_of::<String>("app", "Counter", "Mistyped")
            .unwrap();
        registry.register_candidate(&counter, "Number", None, None).unwrap();
        registry
    }

    fn factories() -> FactoryInstantiator {
        FactoryInstantiator::new()
            .with_factory("Hello", || String::from("hello"))
            .with_factory("Shout", || String::from("HELLO"))
            .with_factory("Number", || 42u32)
    }

    #[test]
    fn test_set_and_remove_mask() {
        let container = Container::new(registry(), factories());
        let mut ctx = container.new_context();

        let quiet = container.create_as::<String>("app", "Greeting", &ctx).unwrap();
        assert_eq!(quiet.as_str(), "hello");

        container.set_mask(&mut ctx, "loud").unwrap();
        let loud = container.create_as::<String>("app", "Greeting", &ctx).unwrap();
        assert_eq!(loud.as_str(), "HELLO");

        container.remove_mask(&mut ctx, "loud").unwrap();
        assert_eq!(container.resolve("app", "Greeting", &ctx).unwrap().identifier, "Hello");
    }

    #[test]
    fn test_unknown_mask() {
        let container = Container::new(registry(), factories());
        let mut ctx = container.new_context();
        assert_eq!(
            container.set_mask(&mut ctx, "weekend").unwrap_err(),
            CDRError::Registration(RegistrationError::MaskNotFound {
                mask: "weekend".to_string()
            })
        );
    }

    #[test]
    fn test_share_vs_create() {
        let container = Container::new(registry(), factories());
        let ctx = container.new_context();

        let a = container.share("app", "Greeting", &ctx).unwrap();
        let b = container.share("app", "Greeting", &ctx).unwrap();
        assert!(a.ptr_eq(&b));

        let c = container.create("app", "Greeting", &ctx).unwrap();
        let d = container.create("app", "Greeting", &ctx).unwrap();
        assert!(!c.ptr_eq(&d));
        assert!(!c.ptr_eq(&a));
    }

    #[test]
    fn test_sharing_is_per_candidate() {
        let container = Container::new(registry(), factories());
        let mut ctx = container.new_context();
        let quiet = container.share("app", "Greeting", &ctx).unwrap();
        container.set_mask(&mut ctx, "loud").unwrap();
        let loud = container.share("app", "Greeting", &ctx).unwrap();

        assert!(!quiet.ptr_eq(&loud));
        assert_eq!(container.cache_stats().entries, 2);
    }

    #[test]
    fn test_sharing_can_be_disabled() {
        let config = EngineConfig::default().with_cache(CacheConfig::default().with_sharing(false));
        let container = Container::with_config(registry(), factories(), config);
        let ctx = container.new_context();

        let a = container.share("app", "Greeting", &ctx).unwrap();
        let b = container.share("app", "Greeting", &ctx).unwrap();
        assert!(!a.ptr_eq(&b));
        assert_eq!(container.cache_stats().entries, 0);
    }

    #[test]
    fn test_capability_is_enforced() {
        let container = Container::new(registry(), factories());
        let ctx = container.new_context();

        let err = container.share("app", "Counter", &ctx).unwrap_err();
        assert_eq!(err.error_code(), "UNEXPECTED_TYPE");
        assert!(container.cache_stats().entries == 0);
    }

    #[test]
    fn test_typed_retrieval_mismatch() {
        let container = Container::new(registry(), factories());
        let ctx = container.new_context();
        assert!(matches!(
            container.create_as::<u64>("app", "Greeting", &ctx),
            Err(CDRError::Instantiation(InstantiationError::UnexpectedType { .. }))
        ));
    }

    #[test]
    fn test_missing_factory() {
        let mut registry = registry();
        let handle = registry.register_dependency("app", "Ghost", "").unwrap();
        registry.register_candidate(&handle, "Nobody", None, None).unwrap();
        let container = Container::new(registry, factories());

        let err = container.create("app", "Ghost", &container.new_context()).unwrap_err();
        assert_eq!(
            err,
            CDRError::Instantiation(InstantiationError::ClassNotFound {
                identifier: "Nobody".to_string()
            })
        );
    }

    #[test]
    fn test_retrieval_events() {
        let sink = Arc::new(MemorySink::new());
        let container = Container::new(registry(), factories()).with_sink(sink.clone());
        let ctx = container.new_context();

        container.share("app", "Greeting", &ctx).unwrap();
        container.share("app", "Greeting", &ctx).unwrap();
        let _ = container.share("app", "Missing", &ctx);
        let _ = container.create("app", "Counter", &ctx);

        assert_eq!(
            sink.event_types(),
            vec![
                EventType::CandidateFound,
                EventType::InstanceCreated,
                EventType::CandidateFound,
                EventType::InstanceShared,
                EventType::CandidateNotFound,
                EventType::CandidateFound,
                EventType::InstanceFailed,
            ]
        );
        let found = &sink.events_of_type(EventType::CandidateFound)[0];
        assert_eq!(found.payload_str("candidate"), Some("Hello"));
        let missing = &sink.events_of_type(EventType::CandidateNotFound)[0];
        assert_eq!(missing.payload_str("code"), Some("DEPENDENCY_NOT_FOUND"));
    }

    #[test]
    fn test_container_is_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Container>();
    }
}
