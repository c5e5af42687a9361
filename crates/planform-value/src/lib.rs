//! Planform Value Model
//!
//! Typed, tri-state value trees with path addressing and diagnostics.
//!
//! # Core Concepts
//!
//! - [`DynamicValue`]: Immutable value node that is null, unknown, or known
//! - [`ValueType`]: Structural type carried by every node
//! - [`Path`]: Sequence of [`PathStep`]s addressing a node from the root
//! - [`Diagnostics`]: Path-attributed errors and warnings accumulated by a walk
//!
//! # Example
//!
//! ```rust,ignore
//! use planform_value::{DynamicValue, Path};
//!
//! let root = DynamicValue::object([("name", DynamicValue::string("web"))]);
//! let updated = root.replace(&Path::attr_root("name"), DynamicValue::string("db"))?;
//! assert_eq!(updated.resolve(&Path::attr_root("name")), Some(&DynamicValue::string("db")));
//! ```

#![warn(unreachable_pub)]

mod diag;
mod error;
mod path;
mod types;
mod value;

pub use diag::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use error::ValueError;
pub use path::{Path, PathStep};
pub use types::{Number, Primitive, ValueType};
pub use value::{DynamicValue, Payload, ValueState};
