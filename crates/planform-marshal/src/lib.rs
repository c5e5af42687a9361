//! Planform Marshaling
//!
//! Two-way conversion between native Rust data and [`DynamicValue`] trees,
//! plus the Config / Plan / State containers that read and write those
//! trees by path.
//!
//! # Core Concepts
//!
//! - [`FromValue`] / [`IntoValue`]: Native shapes decodable from and
//!   encodable into dynamic values
//! - [`object_shape!`]: Struct whose fields are bound to attribute names
//! - [`Tri`]: Native wrapper for null / unknown / known
//! - [`Config`], [`Plan`], [`State`]: Schema-typed containers
//!
//! # Example
//!
//! ```rust,ignore
//! let mut diags = Diagnostics::new();
//! let disks: Option<Vec<Disk>> = plan.get_at(&Path::attr_root("disks"), &mut diags);
//! let diags = plan.set_attribute(&Path::attr_root("disks").at_index(1), &new_disk);
//! ```
//!
//! [`DynamicValue`]: planform_value::DynamicValue

#![warn(unreachable_pub)]

mod container;
mod convert;
mod error;
mod impls;
mod options;
mod shape;

pub use container::{Config, DataKind, Plan, State};
pub use convert::{check_shape_contract, from_dynamic, to_dynamic, Decoder, FromValue, IntoValue};
pub use error::{ConvertError, OptionsError};
pub use impls::Tri;
pub use options::MarshalOptions;
pub use shape::ObjectShape;

#[doc(hidden)]
pub mod __private {
    pub use crate::shape::{encode_field, zero_field};
    pub use planform_value::{DynamicValue, Path, ValueType};
}
