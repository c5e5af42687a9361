//! Planform Walkers
//!
//! Recursive descents over the attribute tree.
//!
//! # Core Concepts
//!
//! - [`validate_config`]: Runs attribute validators over a [`Config`]
//! - [`modify_plan`]: Runs plan modifier chains and rewrites a [`Plan`]
//! - [`child_objects`]: Nesting-mode expansion shared by both walkers
//!
//! # Example
//!
//! ```rust,ignore
//! let diagnostics = validate_config(&config, &WalkOptions::default());
//! let response = modify_plan(&config, &state, &plan);
//! for path in &response.requires_replace {
//!     println!("{path} forces replacement");
//! }
//! ```
//!
//! [`Config`]: planform_marshal::Config
//! [`Plan`]: planform_marshal::Plan

#![warn(unreachable_pub)]

mod expand;
mod options;
mod plan;
mod validate;

pub use expand::{child_objects, member_value, ChildObject, Position};
pub use options::WalkOptions;
pub use plan::{modify_plan, PlanModificationResponse};
pub use validate::validate_config;
