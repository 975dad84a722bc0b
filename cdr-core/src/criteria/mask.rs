//! Masks - named, ordered sets of criteria

use serde::Serialize;

use super::{Criterion, Value};

/// A named, ordered set of criteria
///
/// A mask plays two roles: attached to a candidate it is the predicate that
/// decides whether the candidate matches a context, and activated on a
/// context it is a batch of literal circumstances (each criterion's field set
/// to its expected value).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mask {
    name: String,
    criteria: Vec<Criterion>,
}

impl Mask {
    /// Create a mask with no criteria; it matches every context
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            criteria: Vec::new(),
        }
    }

    pub fn from_criteria(name: impl Into<String>, criteria: Vec<Criterion>) -> Self {
        Self {
            name: name.into(),
            criteria,
        }
    }

    /// Append a criterion
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    pub fn push(&mut self, criterion: Criterion) {
        self.criteria.push(criterion);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    /// Field names this mask constrains, in criterion order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.criteria.iter().map(|c| c.field_name())
    }

    /// The circumstances written when this mask is activated
    pub fn activation_circumstances(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.criteria
            .iter()
            .map(|c| (c.field_name(), c.activation_value()))
    }
}
