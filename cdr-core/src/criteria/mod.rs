//! Value & operation model
//!
//! Typed values, the eight comparison operations, criteria and masks. Nothing
//! here holds state; evaluation against a context lives in
//! [`crate::context::matcher`].
//!
//! ```text
//! Mask "happyHour"
//!   ├── Criterion  time.hour   EQUALS  Number(5)
//!   └── Criterion  time.period EQUALS  Text("pm")
//! ```

mod value;
mod operation;
mod criterion;
mod mask;

pub use value::{Value, ValueTag, DEFAULT_DATE_FORMATS};
pub use operation::Operation;
pub use criterion::{Criterion, Expected};
pub use mask::Mask;
