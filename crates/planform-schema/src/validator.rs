//! Attribute validators
//!
//! Validators are ordered, attribute-local lists owned by each
//! [`Attribute`](crate::Attribute) or [`Block`](crate::Block).

use std::sync::Arc;

use planform_value::{Diagnostics, DynamicValue, Path};

use crate::schema::Schema;

/// Inputs handed to an [`AttributeValidator`]
#[derive(Debug, Clone, Copy)]
pub struct ValidateAttributeRequest<'a> {
    /// Path of the attribute being validated
    pub path: &'a Path,

    /// Config value at `path`
    pub config_value: &'a DynamicValue,

    /// Whole config root
    pub config: &'a DynamicValue,

    /// Schema describing `config`
    pub schema: &'a Schema,
}

/// Checks a single attribute's config value
pub trait AttributeValidator: Send + Sync {
    /// Plain text description
    fn description(&self) -> String;

    /// Markdown description
    fn markdown_description(&self) -> String {
        self.description()
    }

    /// Validate the attribute, returning any diagnostics
    fn validate(&self, request: &ValidateAttributeRequest<'_>) -> Diagnostics;
}

/// Validator backed by a closure
pub struct FnValidator<F> {
    description: String,
    check: F,
}

impl<F> AttributeValidator for FnValidator<F>
where
    F: Fn(&ValidateAttributeRequest<'_>) -> Diagnostics + Send + Sync,
{
    fn description(&self) -> String {
        self.description.clone()
    }

    fn validate(&self, request: &ValidateAttributeRequest<'_>) -> Diagnostics {
        (self.check)(request)
    }
}

/// Wrap a closure as a shared validator
pub fn validator_fn<F>(description: impl Into<String>, check: F) -> Arc<dyn AttributeValidator>
where
    F: Fn(&ValidateAttributeRequest<'_>) -> Diagnostics + Send + Sync + 'static,
{
    Arc::new(FnValidator {
        description: description.into(),
        check,
    })
}
