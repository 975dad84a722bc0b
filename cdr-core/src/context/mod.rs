//! Context - the circumstance store a resolution matches against
//!
//! A [`Context`] is a stack of [`Scope`]s. The bottom one is the root and can
//! never be removed; the top one holds the *effective* circumstances.
//!
//! ```text
//!   open_scope()          close_scope()
//!        │                      │
//!        ▼                      ▼
//!  ┌───────────┐          ┌───────────┐
//!  │ scope 2   │ ◄─ top   │           │
//!  ├───────────┤          ├───────────┤
//!  │ scope 1   │          │ scope 1   │ ◄─ top
//!  ├───────────┤          ├───────────┤
//!  │ root      │          │ root      │
//!  └───────────┘          └───────────┘
//! ```
//!
//! Opening a scope copies the current top, so everything written afterwards
//! is discarded when that scope is closed.
//!
//! A context belongs to one unit of work (a request, a task). It is `Send`
//! so it can move between threads with its unit of work, but it is mutated
//! through `&mut self` and is not meant to be shared.

mod scope;
pub mod matcher;

pub use scope::Scope;

use serde_json::json;

use crate::config::ContextConfig;
use crate::criteria::{Mask, Value, ValueTag};
use crate::error::{ContextError, MatchError};
use crate::events::{null_sink, EngineEvent, EventType, SharedSink};
use crate::path;

/// The mutable circumstance store for one unit of work
pub struct Context {
    root: Scope,
    /// Scopes above the root, innermost last
    stack: Vec<Scope>,
    config: ContextConfig,
    sink: SharedSink,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("depth", &self.depth())
            .field("effective", self.effective_circumstances())
            .field("config", &self.config)
            .finish()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Create an empty context with default configuration and no event sink
    pub fn new() -> Self {
        Self::with_config(ContextConfig::default())
    }

    pub fn with_config(config: ContextConfig) -> Self {
        Self {
            root: Scope::new(),
            stack: Vec::new(),
            config,
            sink: null_sink(),
        }
    }

    /// Publish context events to `sink`
    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Number of scopes above the root
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Read-only view of the top scope
    pub fn effective_circumstances(&self) -> &Scope {
        self.stack.last().unwrap_or(&self.root)
    }

    /// Effective value of one circumstance
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.effective_circumstances().get(name)
    }

    fn top_mut(&mut self) -> &mut Scope {
        match self.stack.last_mut() {
            Some(scope) => scope,
            None => &mut self.root,
        }
    }

    fn emit(&self, event_type: EventType, payload: serde_json::Value) {
        self.sink.publish(&EngineEvent::new(event_type, payload));
    }

    /// Set a circumstance in the top scope, inferring its type from the
    /// literal: numbers become Number, parseable dates become Date, anything
    /// else is Text.
    pub fn set_circumstance(&mut self, name: impl Into<String>, literal: &str) -> Result<(), ContextError> {
        let value = Value::infer_with(literal, &self.config.date_formats);
        self.write_value(name.into(), value)
    }

    /// Set a circumstance with an explicit type.
    ///
    /// Prefer [`Context::set_circumstance`]: an explicit type can hide a
    /// literal that does not look like what its author thinks it is.
    pub fn set_circumstance_as(
        &mut self,
        name: impl Into<String>,
        literal: &str,
        tag: ValueTag,
    ) -> Result<(), ContextError> {
        let name = name.into();
        if !self.config.allow_explicit_types {
            return Err(ContextError::ExplicitTypeDisallowed { name });
        }
        let value = Value::parse_as(literal, tag, &self.config.date_formats).ok_or_else(|| {
            ContextError::InvalidLiteral {
                literal: literal.to_string(),
                tag,
            }
        })?;
        self.write_value(name, value)
    }

    /// Set an already-typed circumstance in the top scope.
    ///
    /// This is explicit typing, so it fails with
    /// [`ContextError::ExplicitTypeDisallowed`] under strict inference.
    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<(), ContextError> {
        let name = name.into();
        if !self.config.allow_explicit_types {
            return Err(ContextError::ExplicitTypeDisallowed { name });
        }
        self.write_value(name, value.into())
    }

    fn write_value(&mut self, name: String, value: Value) -> Result<(), ContextError> {
        if let Err(reason) = path::validate(&name) {
            return Err(ContextError::InvalidName { name, reason });
        }
        let payload = json!({
            "name": name,
            "value": value.to_string(),
            "type": value.tag(),
            "depth": self.depth(),
        });
        self.top_mut().insert(name, value);
        self.emit(EventType::CircumstanceSet, payload);
        Ok(())
    }

    /// Remove a circumstance from the top scope; absent names are a no-op.
    ///
    /// Parent scopes are untouched, so the value reappears once the current
    /// scope is closed.
    pub fn remove_circumstance(&mut self, name: &str) -> Option<Value> {
        let removed = self.top_mut().remove(name);
        if removed.is_some() {
            self.emit(
                EventType::CircumstanceRemoved,
                json!({ "name": name, "depth": self.depth() }),
            );
        }
        removed
    }

    /// Push a copy of the current top scope; returns the new depth
    pub fn open_scope(&mut self) -> usize {
        let child = self.effective_circumstances().clone();
        self.stack.push(child);
        let depth = self.depth();
        self.emit(EventType::ScopeOpened, json!({ "depth": depth }));
        depth
    }

    /// Pop the top scope, reverting to the parent's snapshot
    pub fn close_scope(&mut self) -> Result<(), ContextError> {
        if self.stack.pop().is_none() {
            return Err(ContextError::CloseRootScope);
        }
        self.emit(
            EventType::ScopeClosed,
            json!({ "depth": self.depth(), "closed": 1 }),
        );
        Ok(())
    }

    /// Pop every scope above the root; returns how many were closed
    pub fn close_all_sub_scopes(&mut self) -> usize {
        self.truncate(0)
    }

    fn truncate(&mut self, depth: usize) -> usize {
        if self.stack.len() <= depth {
            return 0;
        }
        let closed = self.stack.len() - depth;
        self.stack.truncate(depth);
        self.emit(
            EventType::ScopeClosed,
            json!({ "depth": self.depth(), "closed": closed }),
        );
        closed
    }

    /// Run `f` inside a fresh scope.
    ///
    /// The scope, and any scope `f` leaves open above it, is closed when `f`
    /// returns.
    pub fn with_scope<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut Context) -> R,
    {
        let depth = self.open_scope();
        let result = f(self);
        self.truncate(depth - 1);
        result
    }

    /// Write every criterion of `mask` into the top scope as a literal
    /// circumstance (field = expected value). The operation is ignored.
    ///
    /// The context does not remember which masks are active.
    pub fn activate_mask(&mut self, mask: &Mask) {
        let top = self.top_mut();
        for (name, value) in mask.activation_circumstances() {
            top.insert(name.to_string(), value.clone());
        }
        self.emit(
            EventType::MaskSet,
            json!({
                "mask": mask.name(),
                "fields": mask.field_names().collect::<Vec<_>>(),
                "depth": self.depth(),
            }),
        );
    }

    /// Remove from the top scope every circumstance name `mask` defines.
    ///
    /// Whatever is stored under those names goes, even if it was written by
    /// something other than this mask.
    pub fn deactivate_mask(&mut self, mask: &Mask) {
        let top = self.top_mut();
        for name in mask.field_names() {
            top.remove(name);
        }
        self.emit(
            EventType::MaskRemoved,
            json!({
                "mask": mask.name(),
                "fields": mask.field_names().collect::<Vec<_>>(),
                "depth": self.depth(),
            }),
        );
    }

    /// Whether `mask` matches the effective circumstances
    pub fn matches(&self, mask: &Mask) -> Result<bool, MatchError> {
        matcher::evaluate_mask(Some(mask), self.effective_circumstances())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::Criterion;
    use crate::events::MemorySink;
    use std::sync::Arc;

    fn happy_hour() -> Mask {
        Mask::new("happyHour")
            .with_criterion(Criterion::equals("time.hour", 5).unwrap())
            .with_criterion(Criterion::equals("time.period", "pm").unwrap())
    }

    #[test]
    fn test_set_circumstance_infers_type() {
        let mut ctx = Context::new();
        ctx.set_circumstance("time.hour", "5").unwrap();
        ctx.set_circumstance("time.period", "pm").unwrap();
        ctx.set_circumstance("today", "2024-03-01").unwrap();

        assert_eq!(ctx.get("time.hour"), Some(&Value::Number(5.0)));
        assert_eq!(ctx.get("time.period"), Some(&Value::text("pm")));
        assert_eq!(ctx.get("today").map(Value::tag), Some(ValueTag::Date));
    }

    #[test]
    fn test_explicit_type() {
        let mut ctx = Context::new();
        ctx.set_circumstance_as("zip", "01234", ValueTag::Text).unwrap();
        assert_eq!(ctx.get("zip"), Some(&Value::text("01234")));

        assert_eq!(
            ctx.set_circumstance_as("hour", "five", ValueTag::Number),
            Err(ContextError::InvalidLiteral {
                literal: "five".to_string(),
                tag: ValueTag::Number,
            })
        );
    }

    #[test]
    fn test_explicit_type_can_be_disabled() {
        let mut ctx = Context::with_config(ContextConfig::default().strict_inference());
        assert!(matches!(
            ctx.set_circumstance_as("zip", "01234", ValueTag::Text),
            Err(ContextError::ExplicitTypeDisallowed { .. })
        ));
        assert!(ctx.set_circumstance("zip", "01234").is_ok());
    }

    #[test]
    fn test_strict_inference_refuses_typed_values() {
        let mut ctx = Context::with_config(ContextConfig::default().strict_inference());
        assert_eq!(
            ctx.set_value("zip", "01234"),
            Err(ContextError::ExplicitTypeDisallowed {
                name: "zip".to_string()
            })
        );
        assert_eq!(ctx.get("zip"), None);

        ctx.set_circumstance("zip", "01234").unwrap();
        assert_eq!(ctx.get("zip"), Some(&Value::Number(1234.0)));
    }

    #[test]
    fn test_padded_names_are_rejected() {
        let mut ctx = Context::new();
        assert!(matches!(
            ctx.set_circumstance("time.hour ", "5"),
            Err(ContextError::InvalidName { .. })
        ));
        assert!(ctx.effective_circumstances().is_empty());
    }

    #[test]
    fn test_invalid_name() {
        let mut ctx = Context::new();
        assert!(matches!(
            ctx.set_circumstance("time..hour", "5"),
            Err(ContextError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_later_write_overwrites() {
        let mut ctx = Context::new();
        ctx.set_circumstance("x", "1").unwrap();
        ctx.set_circumstance("x", "2").unwrap();
        assert_eq!(ctx.get("x"), Some(&Value::Number(2.0)));
        assert_eq!(ctx.effective_circumstances().len(), 1);
    }

    #[test]
    fn test_scope_isolation() {
        let mut ctx = Context::new();
        ctx.set_circumstance("kept", "yes").unwrap();

        ctx.open_scope();
        assert_eq!(ctx.get("kept"), Some(&Value::text("yes")));
        ctx.set_circumstance("x", "1").unwrap();
        ctx.set_circumstance("kept", "no").unwrap();
        ctx.close_scope().unwrap();

        assert!(ctx.get("x").is_none());
        assert_eq!(ctx.get("kept"), Some(&Value::text("yes")));
    }

    #[test]
    fn test_remove_only_touches_top_scope() {
        let mut ctx = Context::new();
        ctx.set_circumstance("x", "1").unwrap();
        ctx.open_scope();
        assert_eq!(ctx.remove_circumstance("x"), Some(Value::Number(1.0)));
        assert!(ctx.get("x").is_none());
        assert_eq!(ctx.remove_circumstance("x"), None);
        ctx.close_scope().unwrap();
        assert_eq!(ctx.get("x"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn test_root_protection() {
        let mut ctx = Context::new();
        assert_eq!(ctx.close_scope(), Err(ContextError::CloseRootScope));

        ctx.open_scope();
        assert!(ctx.close_scope().is_ok());
        assert_eq!(ctx.close_scope(), Err(ContextError::CloseRootScope));
    }

    #[test]
    fn test_close_all_sub_scopes() {
        let mut ctx = Context::new();
        ctx.set_circumstance("base", "1").unwrap();
        for level in 0..3 {
            ctx.open_scope();
            ctx.set_value(format!("level{}", level), level).unwrap();
        }
        assert_eq!(ctx.depth(), 3);

        assert_eq!(ctx.close_all_sub_scopes(), 3);
        assert_eq!(ctx.depth(), 0);
        assert_eq!(ctx.effective_circumstances().len(), 1);
        assert_eq!(ctx.close_all_sub_scopes(), 0);
    }

    #[test]
    fn test_with_scope_closes_nested_scopes() {
        let mut ctx = Context::new();
        let seen = ctx.with_scope(|ctx| {
            ctx.set_circumstance("x", "1").unwrap();
            ctx.open_scope();
            ctx.open_scope();
            ctx.get("x").cloned()
        });
        assert_eq!(seen, Some(Value::Number(1.0)));
        assert_eq!(ctx.depth(), 0);
        assert!(ctx.get("x").is_none());
    }

    #[test]
    fn test_mask_activation_and_deactivation() {
        let mask = happy_hour();
        let mut ctx = Context::new();
        assert!(!ctx.matches(&mask).unwrap());

        ctx.activate_mask(&mask);
        assert_eq!(ctx.get("time.hour"), Some(&Value::Number(5.0)));
        assert_eq!(ctx.get("time.period"), Some(&Value::text("pm")));
        assert!(ctx.matches(&mask).unwrap());

        ctx.deactivate_mask(&mask);
        assert!(ctx.effective_circumstances().is_empty());
    }

    #[test]
    fn test_deactivation_removes_foreign_values() {
        let mask = happy_hour();
        let mut ctx = Context::new();
        ctx.set_circumstance("time.period", "am").unwrap();
        ctx.set_circumstance("other", "kept").unwrap();

        // Never activated, still removes what is stored under its names
        ctx.deactivate_mask(&mask);
        assert!(ctx.get("time.period").is_none());
        assert_eq!(ctx.get("other"), Some(&Value::text("kept")));
    }

    #[test]
    fn test_activation_inside_scope_is_reverted() {
        let mask = happy_hour();
        let mut ctx = Context::new();
        ctx.open_scope();
        ctx.activate_mask(&mask);
        ctx.close_scope().unwrap();
        assert!(!ctx.matches(&mask).unwrap());
    }

    #[test]
    fn test_events_are_published() {
        let sink = Arc::new(MemorySink::new());
        let mut ctx = Context::new().with_sink(sink.clone());

        ctx.open_scope();
        ctx.set_circumstance("x", "1").unwrap();
        ctx.activate_mask(&happy_hour());
        ctx.deactivate_mask(&happy_hour());
        ctx.remove_circumstance("x");
        ctx.close_scope().unwrap();

        assert_eq!(
            sink.event_types(),
            vec![
                EventType::ScopeOpened,
                EventType::CircumstanceSet,
                EventType::MaskSet,
                EventType::MaskRemoved,
                EventType::CircumstanceRemoved,
                EventType::ScopeClosed,
            ]
        );
        let mask_set = &sink.events_of_type(EventType::MaskSet)[0];
        assert_eq!(mask_set.payload_str("mask"), Some("happyHour"));
    }
}
