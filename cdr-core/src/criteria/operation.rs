//! Comparison operations

use std::fmt;

use serde::{Deserialize, Serialize};

/// The eight comparison operations a criterion can apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Equals,
    NotEquals,
    Greater,
    GreaterOrEquals,
    Less,
    LessOrEquals,
    /// Open interval: `low < value < high`
    Between,
    /// Complement of [`Operation::Between`]
    Outside,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::Equals,
        Operation::NotEquals,
        Operation::Greater,
        Operation::GreaterOrEquals,
        Operation::Less,
        Operation::LessOrEquals,
        Operation::Between,
        Operation::Outside,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Equals => "EQUALS",
            Operation::NotEquals => "NOT_EQUALS",
            Operation::Greater => "GREATER",
            Operation::GreaterOrEquals => "GREATER_OR_EQUALS",
            Operation::Less => "LESS",
            Operation::LessOrEquals => "LESS_OR_EQUALS",
            Operation::Between => "BETWEEN",
            Operation::Outside => "OUTSIDE",
        }
    }

    /// Range operations take two bounds instead of one expected value
    pub fn is_range(&self) -> bool {
        matches!(self, Operation::Between | Operation::Outside)
    }

    /// Whether the operation needs ordered values (everything except
    /// equality)
    pub fn requires_ordering(&self) -> bool {
        !matches!(self, Operation::Equals | Operation::NotEquals)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EQUALS" | "=" | "==" => Ok(Operation::Equals),
            "NOT_EQUALS" | "!=" => Ok(Operation::NotEquals),
            "GREATER" | ">" => Ok(Operation::Greater),
            "GREATER_OR_EQUALS" | ">=" => Ok(Operation::GreaterOrEquals),
            "LESS" | "<" => Ok(Operation::Less),
            "LESS_OR_EQUALS" | "<=" => Ok(Operation::LessOrEquals),
            "BETWEEN" => Ok(Operation::Between),
            "OUTSIDE" => Ok(Operation::Outside),
            _ => Err(format!("Unknown operation: {}", s)),
        }
    }
}
