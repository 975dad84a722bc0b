//! Error types for CDR operations
//!
//! Every failure the engine can report belongs to exactly one category, and
//! each category has its own closed error type:
//!
//! - [`RegistrationError`] - building the registry, or looking up sets,
//!   dependencies and masks in it
//! - [`MatchError`] - a criterion that the matching engine cannot evaluate
//! - [`ResolutionError`] - no candidate, or more than one, won
//! - [`ContextError`] - invalid manipulation of a context's scope stack
//! - [`InstantiationError`] - the instantiation collaborator failed
//!
//! [`CDRError`] wraps all of them so `?` composes across layers, and adds
//! stable error codes and a JSON-serializable response shape for callers that
//! map failures onto their own error surface.
//!
//! # Example
//!
//! ```rust
//! use cdr_core::error::{CDRError, ErrorCategory, ResolutionError};
//!
//! fn handle_error(err: CDRError) {
//!     match err.category() {
//!         ErrorCategory::Resolution => println!("nothing matched the context"),
//!         ErrorCategory::Matching => println!("mask is misconfigured"),
//!         _ => println!("other error"),
//!     }
//!     println!("code: {}", err.error_code());
//! }
//!
//! handle_error(ResolutionError::NoCandidateFound {
//!     set_path: "examples".to_string(),
//!     dependency: "Discount".to_string(),
//! }.into());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::criteria::{Operation, ValueTag};
use crate::registry::Version;

/// Result type alias for CDR operations
pub type Result<T> = std::result::Result<T, CDRError>;

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Registry construction or lookup
    Registration,
    /// Criterion evaluation
    Matching,
    /// Candidate selection
    Resolution,
    /// Scope stack manipulation
    Context,
    /// Instance construction
    Instantiation,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Registration => "registration",
            ErrorCategory::Matching => "matching",
            ErrorCategory::Resolution => "resolution",
            ErrorCategory::Context => "context",
            ErrorCategory::Instantiation => "instantiation",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while building or querying the registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// A mask with this name was already registered
    #[error("Mask already defined: '{mask}'. Mask names must be unique within a registry.")]
    MaskAlreadyDefined { mask: String },

    /// No mask with this name is registered
    #[error("Mask not found: '{mask}'. Register it with register_mask() first.")]
    MaskNotFound { mask: String },

    /// A segment of the set path does not exist
    #[error("Set not found: '{path}' (missing segment '{segment}')")]
    SetNotFound { path: String, segment: String },

    /// The set exists but holds no dependency with this name
    #[error("Dependency not found: '{name}' in set '{set_path}'")]
    DependencyNotFound { set_path: String, name: String },

    /// A path, name or identifier is empty or has empty segments
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },
}

/// Errors raised by the matching engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// Ordering and range operations are not defined for text values
    #[error("Operation {operation} is not supported for {tag} values (criterion on '{field}')")]
    UnsupportedMatchOperation {
        field: String,
        operation: Operation,
        tag: ValueTag,
    },

    /// No evaluator handles this (operation, value type) pair
    #[error("No evaluator for operation {operation} on {tag} values (criterion on '{field}')")]
    NoEvaluator {
        field: String,
        operation: Operation,
        tag: ValueTag,
    },

    /// The criterion was built with the wrong shape
    #[error("Invalid criterion on '{field}': {reason}")]
    InvalidCriterion { field: String, reason: String },
}

/// Errors raised when candidate selection does not yield exactly one winner
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// Every candidate's mask evaluated false
    #[error("No candidate found for '{set_path}.{dependency}': no candidate mask matches the current context")]
    NoCandidateFound { set_path: String, dependency: String },

    /// More than one candidate matched at the highest version
    #[error(
        "Multiple candidates found for '{set_path}.{dependency}' at version {version}: {}",
        .candidates.join(", ")
    )]
    MultipleCandidatesFound {
        set_path: String,
        dependency: String,
        version: Version,
        candidates: Vec<String>,
    },
}

/// Errors raised by context operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// The root scope can never be closed
    #[error("Cannot close the root scope")]
    CloseRootScope,

    /// Circumstance names are dotted paths
    #[error("Invalid circumstance name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// The literal cannot be read as the requested type
    #[error("Literal '{literal}' is not a valid {tag} value")]
    InvalidLiteral { literal: String, tag: ValueTag },

    /// Explicit typing is disabled by configuration
    #[error("Explicit typing is disabled; set '{name}' from an inferred literal instead")]
    ExplicitTypeDisallowed { name: String },
}

/// Errors reported by the instantiation collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstantiationError {
    /// The identifier does not name anything the instantiator can build
    #[error("Class not found: '{identifier}'")]
    ClassNotFound { identifier: String },

    /// Construction itself failed
    #[error("Failed to instantiate '{identifier}': {reason}")]
    InstantiationFailed { identifier: String, reason: String },

    /// The instance does not provide the capability the dependency requires
    #[error("Instance of '{identifier}' is a {actual}, expected {expected}")]
    UnexpectedType {
        identifier: String,
        expected: String,
        actual: String,
    },
}

/// Any error the engine can report
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CDRError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Matching(#[from] MatchError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Instantiation(#[from] InstantiationError),
}

impl CDRError {
    /// Returns the error category for grouping
    pub fn category(&self) -> ErrorCategory {
        match self {
            CDRError::Registration(_) => ErrorCategory::Registration,
            CDRError::Matching(_) => ErrorCategory::Matching,
            CDRError::Resolution(_) => ErrorCategory::Resolution,
            CDRError::Context(_) => ErrorCategory::Context,
            CDRError::Instantiation(_) => ErrorCategory::Instantiation,
        }
    }

    /// Returns true if the error comes from how the registry or its masks
    /// were set up, so no change to the context can make the call succeed.
    ///
    /// Resolution errors are the opposite case: a different context may well
    /// resolve, which is why callers usually map them to a "not available"
    /// response rather than an internal error.
    pub fn is_configuration_defect(&self) -> bool {
        match self {
            CDRError::Matching(_) => true,
            CDRError::Registration(err) => !matches!(
                err,
                RegistrationError::SetNotFound { .. } | RegistrationError::DependencyNotFound { .. }
            ),
            CDRError::Instantiation(_) => true,
            CDRError::Resolution(_) | CDRError::Context(_) => false,
        }
    }

    /// Returns the stable error code for this error
    ///
    /// Error codes are uppercase, underscore-separated identifiers that
    /// remain stable across versions.
    pub fn error_code(&self) -> &'static str {
        match self {
            CDRError::Registration(err) => match err {
                RegistrationError::MaskAlreadyDefined { .. } => "MASK_ALREADY_DEFINED",
                RegistrationError::MaskNotFound { .. } => "MASK_NOT_FOUND",
                RegistrationError::SetNotFound { .. } => "SET_NOT_FOUND",
                RegistrationError::DependencyNotFound { .. } => "DEPENDENCY_NOT_FOUND",
                RegistrationError::InvalidName { .. } => "INVALID_NAME",
            },
            CDRError::Matching(err) => match err {
                MatchError::UnsupportedMatchOperation { .. } => "UNSUPPORTED_MATCH_OPERATION",
                MatchError::NoEvaluator { .. } => "NO_EVALUATOR",
                MatchError::InvalidCriterion { .. } => "INVALID_CRITERION",
            },
            CDRError::Resolution(err) => match err {
                ResolutionError::NoCandidateFound { .. } => "NO_CANDIDATE_FOUND",
                ResolutionError::MultipleCandidatesFound { .. } => "MULTIPLE_CANDIDATES_FOUND",
            },
            CDRError::Context(err) => match err {
                ContextError::CloseRootScope => "CLOSE_ROOT_SCOPE",
                ContextError::InvalidName { .. } => "INVALID_CIRCUMSTANCE_NAME",
                ContextError::InvalidLiteral { .. } => "INVALID_LITERAL",
                ContextError::ExplicitTypeDisallowed { .. } => "EXPLICIT_TYPE_DISALLOWED",
            },
            CDRError::Instantiation(err) => match err {
                InstantiationError::ClassNotFound { .. } => "CLASS_NOT_FOUND",
                InstantiationError::InstantiationFailed { .. } => "INSTANTIATION_FAILED",
                InstantiationError::UnexpectedType { .. } => "UNEXPECTED_TYPE",
            },
        }
    }

    /// Converts this error to a JSON-serializable response object
    ///
    /// ```json
    /// {
    ///   "error": {
    ///     "code": "NO_CANDIDATE_FOUND",
    ///     "message": "No candidate found for 'examples.Discount': ...",
    ///     "category": "resolution",
    ///     "configuration_defect": false
    ///   }
    /// }
    /// ```
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                category: self.category(),
                configuration_defect: self.is_configuration_defect(),
            },
        }
    }
}

/// JSON-serializable error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail for JSON responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable error code (e.g., "NO_CANDIDATE_FOUND")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    pub category: ErrorCategory,
    /// Whether the registry itself needs fixing
    pub configuration_defect: bool,
}
