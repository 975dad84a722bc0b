//! # CDR Core - Contextual Dependency Resolution
//!
//! CDR picks, at run time, which implementation of a named dependency to use
//! based on the *circumstances* in effect for the current unit of work:
//!
//! - **Context**: a stack of scopes holding typed circumstances
//!   (`time.hour = 5`, `time.period = "pm"`)
//! - **Masks**: named sets of criteria that gate candidates and can be
//!   activated on a context as a batch of circumstances
//! - **Registry**: a tree of sets holding dependencies and their versioned,
//!   optionally masked candidates
//! - **Resolver**: selects exactly one candidate or fails with a typed error
//! - **Container**: builds the winner through an [`Instantiator`] and shares
//!   one instance per candidate
//!
//! ## Core Principle
//!
//! > Resolution is a pure function of the registry and the effective context.
//!
//! ## Example
//!
//! ```rust
//! use cdr_core::{Container, Criterion, FactoryInstantiator, Mask, Registry, Version};
//!
//! trait Discount: Send + Sync {
//!     fn amount(&self, price: f64) -> f64;
//! }
//!
//! struct NoDiscount;
//! impl Discount for NoDiscount {
//!     fn amount(&self, _price: f64) -> f64 { 0.0 }
//! }
//!
//! struct HappyHourDiscount;
//! impl Discount for HappyHourDiscount {
//!     fn amount(&self, price: f64) -> f64 { price * 0.2 }
//! }
//!
//! # fn main() -> cdr_core::Result<()> {
//! let mut registry = Registry::new();
//! registry.register_mask(
//!     Mask::new("happyHour")
//!         .with_criterion(Criterion::equals("time.hour", 5)?)
//!         .with_criterion(Criterion::equals("time.period", "pm")?),
//! )?;
//!
//! let discount = registry.register_dependency_of::<Box<dyn Discount>>("examples", "Discount", "Price reduction")?;
//! registry.register_candidate(&discount, "NoDiscount", None, None)?;
//! registry.register_candidate(&discount, "HappyHourDiscount", Some("happyHour"), Some(Version::new(1, 0, 0)))?;
//!
//! let factories = FactoryInstantiator::new()
//!     .with_factory("NoDiscount", || Box::new(NoDiscount) as Box<dyn Discount>)
//!     .with_factory("HappyHourDiscount", || Box::new(HappyHourDiscount) as Box<dyn Discount>);
//!
//! let container = Container::new(registry, factories);
//! let mut ctx = container.new_context();
//!
//! let regular = container.share_as::<Box<dyn Discount>>("examples", "Discount", &ctx)?;
//! assert_eq!(regular.amount(10.0), 0.0);
//!
//! container.set_mask(&mut ctx, "happyHour")?;
//! let happy = container.share_as::<Box<dyn Discount>>("examples", "Discount", &ctx)?;
//! assert_eq!(happy.amount(10.0), 2.0);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod container;
pub mod context;
pub mod criteria;
pub mod error;
pub mod events;
pub mod instantiate;
pub mod path;
pub mod registry;
pub mod resolver;

// Re-export main types
pub use cache::{CacheStats, CandidateKey, InstanceCache};
pub use config::{CacheConfig, ContextConfig, EngineConfig};
pub use container::Container;
pub use context::{Context, Scope};
pub use criteria::{Criterion, Expected, Mask, Operation, Value, ValueTag};
pub use error::{
    CDRError, ContextError, ErrorCategory, ErrorDetail, ErrorResponse, InstantiationError, MatchError,
    RegistrationError, ResolutionError, Result,
};
pub use events::{EngineEvent, EventSink, EventType, MemorySink, NullSink, SharedSink, TracingSink};
pub use instantiate::{FactoryInstantiator, Instance, Instantiator};
pub use registry::{Candidate, Capability, Dependency, DependencyHandle, DependencySet, Registry, Version};
pub use resolver::{Resolution, Resolver};
