//! Context Matcher - evaluates criteria and masks against circumstances
//!
//! Evaluation of one criterion:
//! 1. Look up the circumstance named by the criterion's field. Absent: false.
//! 2. Different value types: false (never an error).
//! 3. Dispatch on `(operation, value)`. Equality works for every type;
//!    ordering and range operations only for numbers and dates, and fail with
//!    [`MatchError::UnsupportedMatchOperation`] on text.
//!
//! A mask is the conjunction of its criteria; an absent or empty mask
//! matches everything.

use std::cmp::Ordering;

use crate::criteria::{Criterion, Expected, Mask, Operation, Value};
use crate::error::MatchError;

use super::Scope;

/// Evaluate a single criterion against a scope
pub fn evaluate_criterion(criterion: &Criterion, scope: &Scope) -> Result<bool, MatchError> {
    let Some(actual) = scope.get(criterion.field_name()) else {
        return Ok(false);
    };
    if actual.tag() != criterion.expected().tag() {
        return Ok(false);
    }
    compare(criterion, actual)
}

/// Evaluate a mask against a scope (`None` matches trivially)
pub fn evaluate_mask(mask: Option<&Mask>, scope: &Scope) -> Result<bool, MatchError> {
    let Some(mask) = mask else {
        return Ok(true);
    };
    for criterion in mask.criteria() {
        if !evaluate_criterion(criterion, scope)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn compare(criterion: &Criterion, actual: &Value) -> Result<bool, MatchError> {
    let operation = criterion.operation();
    match (operation, criterion.expected(), actual) {
        (Operation::Equals, Expected::Single(expected), _) => Ok(actual == expected),
        (Operation::NotEquals, Expected::Single(expected), _) => Ok(actual != expected),

        (_, _, Value::Text(_)) => Err(MatchError::UnsupportedMatchOperation {
            field: criterion.field_name().to_string(),
            operation,
            tag: actual.tag(),
        }),

        (Operation::Greater, Expected::Single(expected), _) => {
            Ok(order(actual, expected) == Some(Ordering::Greater))
        }
        (Operation::GreaterOrEquals, Expected::Single(expected), _) => Ok(matches!(
            order(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        (Operation::Less, Expected::Single(expected), _) => {
            Ok(order(actual, expected) == Some(Ordering::Less))
        }
        (Operation::LessOrEquals, Expected::Single(expected), _) => Ok(matches!(
            order(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        )),

        (Operation::Between, Expected::Range { low, high }, _) => Ok(strictly_between(actual, low, high)),
        (Operation::Outside, Expected::Range { low, high }, _) => {
            // Incomparable values (NaN) are neither inside nor outside
            if order(actual, low).is_none() || order(actual, high).is_none() {
                return Ok(false);
            }
            Ok(!strictly_between(actual, low, high))
        }

        // Shape mismatches are rejected when a criterion is built
        (operation, _, actual) => Err(MatchError::NoEvaluator {
            field: criterion.field_name().to_string(),
            operation,
            tag: actual.tag(),
        }),
    }
}

fn order(actual: &Value, expected: &Value) -> Option<Ordering> {
    actual.partial_cmp(expected)
}

fn strictly_between(actual: &Value, low: &Value, high: &Value) -> bool {
    order(actual, low) == Some(Ordering::Greater) && order(actual, high) == Some(Ordering::Less)
}
