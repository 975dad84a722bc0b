//! A single typed comparison rule

use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::path;

use super::{Operation, Value, ValueTag};

/// What a criterion compares the circumstance against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expected {
    Single(Value),
    Range { low: Value, high: Value },
}

impl Expected {
    /// Type tag of the expected value; range bounds always share one tag
    pub fn tag(&self) -> ValueTag {
        match self {
            Expected::Single(value) => value.tag(),
            Expected::Range { low, .. } => low.tag(),
        }
    }
}

/// `(field, operation, expected)`
///
/// Construction validates the shape: range operations carry two bounds of
/// the same type, every other operation carries exactly one value. Whether
/// the operation is defined for the value's type is decided at evaluation
/// time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Criterion {
    field_name: String,
    operation: Operation,
    expected: Expected,
}

impl Criterion {
    /// Build a single-value criterion
    pub fn new(
        field_name: impl Into<String>,
        operation: Operation,
        expected: impl Into<Value>,
    ) -> Result<Self, MatchError> {
        let field_name = validated_field(field_name.into())?;
        if operation.is_range() {
            return Err(MatchError::InvalidCriterion {
                field: field_name,
                reason: format!("{} needs two bounds; use Criterion::range", operation),
            });
        }
        Ok(Self {
            field_name,
            operation,
            expected: Expected::Single(expected.into()),
        })
    }

    /// Build a BETWEEN or OUTSIDE criterion
    pub fn range(
        field_name: impl Into<String>,
        operation: Operation,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Result<Self, MatchError> {
        let field_name = validated_field(field_name.into())?;
        if !operation.is_range() {
            return Err(MatchError::InvalidCriterion {
                field: field_name,
                reason: format!("{} takes a single expected value", operation),
            });
        }
        let (low, high) = (low.into(), high.into());
        if low.tag() != high.tag() {
            return Err(MatchError::InvalidCriterion {
                field: field_name,
                reason: format!("bounds have different types ({} and {})", low.tag(), high.tag()),
            });
        }
        Ok(Self {
            field_name,
            operation,
            expected: Expected::Range { low, high },
        })
    }

    /// `field EQUALS value`; the common case, and the only one that makes
    /// sense for mask activation
    pub fn equals(field_name: impl Into<String>, value: impl Into<Value>) -> Result<Self, MatchError> {
        Self::new(field_name, Operation::Equals, value)
    }

    pub fn between(
        field_name: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Result<Self, MatchError> {
        Self::range(field_name, Operation::Between, low, high)
    }

    pub fn outside(
        field_name: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Result<Self, MatchError> {
        Self::range(field_name, Operation::Outside, low, high)
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn expected(&self) -> &Expected {
        &self.expected
    }

    /// The literal written into a context when the owning mask is activated.
    /// Range criteria contribute their lower bound.
    pub fn activation_value(&self) -> &Value {
        match &self.expected {
            Expected::Single(value) => value,
            Expected::Range { low, .. } => low,
        }
    }
}

fn validated_field(field_name: String) -> Result<String, MatchError> {
    match path::validate(&field_name) {
        Ok(()) => Ok(field_name),
        Err(reason) => Err(MatchError::InvalidCriterion {
            field: field_name,
            reason: format!("field name {}", reason),
        }),
    }
}
