//! Planform Attribute Tree
//!
//! Recursive schema definitions describing the shape of config, plan and
//! state values.
//!
//! # Core Concepts
//!
//! - [`Schema`]: Named attributes and blocks describing one resource
//! - [`Attribute`]: Leaf-typed or nested field with a requirement tier
//! - [`NestedAttributes`]: Nested object shape plus its [`NestingMode`]
//! - [`Block`]: Repeatable structural field with item limits
//! - [`AttributeValidator`] / [`PlanModifier`]: Ordered, attribute-local logic
//!
//! # Example
//!
//! ```rust,ignore
//! use planform_schema::{Attribute, NestedAttributes, Schema};
//! use planform_value::{Path, ValueType};
//!
//! let schema = Schema::new([
//!     ("name", Attribute::leaf(ValueType::String).required()),
//!     ("disks", Attribute::nested(NestedAttributes::list([
//!         ("id", Attribute::leaf(ValueType::String).required()),
//!     ])).optional().computed()),
//! ]);
//! schema.validate_definition()?;
//! let node = schema.type_at(&Path::attr_root("disks").at_index(0).attr("id"))?;
//! ```

#![warn(unreachable_pub)]

mod attr_type;
mod attribute;
mod block;
mod describe;
mod error;
mod nested;
mod plan_modifier;
mod schema;
mod validator;

pub use attr_type::{AttrType, LeafType, TypeValidation, ValidatedType};
pub use attribute::Attribute;
pub use block::Block;
pub use describe::{
    AttributeDescription, BlockDescription, DescriptionKind, NestedBlockDescription,
    NestedObjectDescription, SchemaDescription,
};
pub use error::SchemaError;
pub use nested::{NestedAttributes, NestingMode};
pub use plan_modifier::{
    plan_modifier_fn, FnPlanModifier, ModifyPlanRequest, ModifyPlanResponse, PlanModifier,
    RequiresReplace, RequiresReplaceIf, RequiresReplaceIfFn, UseStateForUnknown,
};
pub use schema::{Schema, SchemaItem, SchemaNode};
pub use validator::{validator_fn, AttributeValidator, FnValidator, ValidateAttributeRequest};
