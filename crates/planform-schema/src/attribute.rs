//! Attribute definitions
//!
//! Provides [`Attribute`], one named node of the attribute tree. An
//! attribute has exactly one of a leaf type or nested attributes, a
//! requirement tier, and ordered validator / plan-modifier lists.
//!
//! # Example
//!
//! ```rust,ignore
//! let name = Attribute::leaf(ValueType::String)
//!     .required()
//!     .description("Instance name")
//!     .plan_modifier(Arc::new(RequiresReplace));
//! ```

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use planform_value::{Path, ValueType};

use crate::attr_type::LeafType;
use crate::error::SchemaError;
use crate::nested::NestedAttributes;
use crate::plan_modifier::PlanModifier;
use crate::validator::AttributeValidator;

/// Attribute definition
#[derive(Clone, Default)]
pub struct Attribute {
    leaf_type: Option<LeafType>,
    nested: Option<NestedAttributes>,
    required: bool,
    optional: bool,
    computed: bool,
    sensitive: bool,
    description: Option<String>,
    markdown_description: Option<String>,
    deprecation_message: Option<String>,
    validators: Vec<Arc<dyn AttributeValidator>>,
    plan_modifiers: Vec<Arc<dyn PlanModifier>>,
}

impl Attribute {
    /// Attribute with a leaf type
    #[must_use]
    pub fn leaf(ty: impl Into<LeafType>) -> Self {
        Self {
            leaf_type: Some(ty.into()),
            ..Self::default()
        }
    }

    /// Attribute with nested attributes
    #[must_use]
    pub fn nested(nested: NestedAttributes) -> Self {
        Self {
            nested: Some(nested),
            ..Self::default()
        }
    }

    /// Set the leaf type
    #[must_use]
    pub fn with_leaf_type(mut self, ty: impl Into<LeafType>) -> Self {
        self.leaf_type = Some(ty.into());
        self
    }

    /// Set the nested attributes
    #[must_use]
    pub fn with_nested(mut self, nested: NestedAttributes) -> Self {
        self.nested = Some(nested);
        self
    }

    /// Mark required
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark optional
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Mark computed
    #[must_use]
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Mark sensitive
    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Plain text description
    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Markdown description, preferred over plain text when both are set
    #[must_use]
    pub fn markdown_description(mut self, text: impl Into<String>) -> Self {
        self.markdown_description = Some(text.into());
        self
    }

    /// Mark deprecated with an upgrade message
    #[must_use]
    pub fn deprecated(mut self, message: impl Into<String>) -> Self {
        self.deprecation_message = Some(message.into());
        self
    }

    /// Append a validator
    #[must_use]
    pub fn validator(mut self, validator: Arc<dyn AttributeValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    /// Append a plan modifier
    #[must_use]
    pub fn plan_modifier(mut self, modifier: Arc<dyn PlanModifier>) -> Self {
        self.plan_modifiers.push(modifier);
        self
    }

    /// Leaf type, if any
    #[inline]
    #[must_use]
    pub fn leaf_type(&self) -> Option<&LeafType> {
        self.leaf_type.as_ref()
    }

    /// Nested attributes, if any (including an empty set)
    #[inline]
    #[must_use]
    pub fn nested_attributes(&self) -> Option<&NestedAttributes> {
        self.nested.as_ref()
    }

    /// Nested attributes that declare at least one member
    #[inline]
    #[must_use]
    pub fn defines_attributes(&self) -> bool {
        self.nested.as_ref().is_some_and(|n| !n.is_empty())
    }

    /// Check if required
    #[inline]
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Check if optional
    #[inline]
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Check if computed
    #[inline]
    #[must_use]
    pub fn is_computed(&self) -> bool {
        self.computed
    }

    /// Check if sensitive
    #[inline]
    #[must_use]
    pub fn is_sensitive(&self) -> bool {
        self.sensitive
    }

    /// Plain text description
    #[inline]
    #[must_use]
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Markdown description
    #[inline]
    #[must_use]
    pub fn markdown_description_text(&self) -> Option<&str> {
        self.markdown_description.as_deref()
    }

    /// Deprecation message
    #[inline]
    #[must_use]
    pub fn deprecation_message(&self) -> Option<&str> {
        self.deprecation_message.as_deref()
    }

    /// Validators in declaration order
    #[inline]
    #[must_use]
    pub fn validators(&self) -> &[Arc<dyn AttributeValidator>] {
        &self.validators
    }

    /// Plan modifiers in declaration order
    #[inline]
    #[must_use]
    pub fn plan_modifiers(&self) -> &[Arc<dyn PlanModifier>] {
        &self.plan_modifiers
    }

    /// Structural type of this attribute's values
    ///
    /// # Errors
    /// - [`SchemaError::InvalidDefinition`] if the definition is invalid
    /// - [`SchemaError::SchemaMismatch`] for an unknown nesting mode
    pub fn value_type(&self, path: &Path) -> Result<ValueType, SchemaError> {
        self.check_shape(path)?;
        match (&self.leaf_type, &self.nested) {
            (Some(leaf), _) => Ok(leaf.value_type()),
            (None, Some(nested)) => nested.value_type(path),
            (None, None) => Err(SchemaError::invalid_definition(
                path,
                "Attribute must define either Attributes or Type",
            )),
        }
    }

    /// Check the leaf-or-nested exclusivity rule
    fn check_shape(&self, path: &Path) -> Result<(), SchemaError> {
        match (self.leaf_type.is_some(), self.defines_attributes()) {
            (true, true) => Err(SchemaError::invalid_definition(
                path,
                "Attribute cannot define both Attributes and Type. This is always a problem \
                 with the provider and should be reported to the provider developer.",
            )),
            (false, false) => Err(SchemaError::invalid_definition(
                path,
                "Attribute must define either Attributes or Type. This is always a problem \
                 with the provider and should be reported to the provider developer.",
            )),
            _ => Ok(()),
        }
    }

    /// Check this attribute's own structural invariants
    ///
    /// Nested members are not checked; see [`Attribute::validate_tree`].
    ///
    /// # Errors
    /// Returns [`SchemaError::InvalidDefinition`] naming the violated rule
    pub fn validate_definition(&self, path: &Path) -> Result<(), SchemaError> {
        self.check_shape(path)?;

        if !self.required && !self.optional && !self.computed {
            return Err(SchemaError::invalid_definition(
                path,
                "Attribute missing Required, Optional, or Computed definition. This is always \
                 a problem with the provider and should be reported to the provider developer.",
            ));
        }

        if self.required && (self.optional || self.computed) {
            return Err(SchemaError::invalid_definition(
                path,
                "Attribute cannot be Required together with Optional or Computed. This is \
                 always a problem with the provider and should be reported to the provider \
                 developer.",
            ));
        }

        Ok(())
    }

    /// Check this attribute and every nested member
    ///
    /// # Errors
    /// Returns the first [`SchemaError::InvalidDefinition`] found
    pub fn validate_tree(&self, path: &Path) -> Result<(), SchemaError> {
        self.validate_definition(path)?;
        if let Some(nested) = &self.nested {
            for (name, attr) in nested.attributes() {
                attr.validate_tree(&path.attr(name.clone()))?;
            }
        }
        Ok(())
    }
}

impl Debug for Attribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("leaf_type", &self.leaf_type)
            .field("nested", &self.nested)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field("deprecation_message", &self.deprecation_message)
            .field("validators", &self.validators.len())
            .field("plan_modifiers", &self.plan_modifiers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> Path {
        Path::attr_root("attr")
    }

    #[test]
    fn leaf_attribute_is_valid() {
        let attr = Attribute::leaf(ValueType::String).optional().computed();
        assert!(attr.validate_definition(&root()).is_ok());
        assert_eq!(attr.value_type(&root()).unwrap(), ValueType::String);
    }

    #[test]
    fn both_type_and_attributes_is_invalid() {
        let attr = Attribute::leaf(ValueType::String)
            .with_nested(NestedAttributes::single([(
                "a",
                Attribute::leaf(ValueType::Bool).optional(),
            )]))
            .optional();
        assert!(matches!(
            attr.validate_definition(&root()),
            Err(SchemaError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn neither_type_nor_attributes_is_invalid() {
        let attr = Attribute::default().optional();
        assert!(matches!(
            attr.validate_definition(&root()),
            Err(SchemaError::InvalidDefinition { .. })
        ));

        let empty_nested =
            Attribute::nested(NestedAttributes::map(Vec::<(String, Attribute)>::new())).optional();
        assert!(matches!(
            empty_nested.validate_definition(&root()),
            Err(SchemaError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn tier_rules() {
        let none = Attribute::leaf(ValueType::Bool);
        assert!(none.validate_definition(&root()).is_err());

        let required_optional = Attribute::leaf(ValueType::Bool).required().optional();
        assert!(required_optional.validate_definition(&root()).is_err());

        let required_computed = Attribute::leaf(ValueType::Bool).required().computed();
        assert!(required_computed.validate_definition(&root()).is_err());

        let computed = Attribute::leaf(ValueType::Bool).computed();
        assert!(computed.validate_definition(&root()).is_ok());
    }

    #[test]
    fn nested_value_type_wraps_object() {
        let attr = Attribute::nested(NestedAttributes::list([
            ("id", Attribute::leaf(ValueType::String).required()),
            ("size", Attribute::leaf(ValueType::Number).optional()),
        ]))
        .optional();

        let expected = ValueType::list(ValueType::object([
            ("id", ValueType::String),
            ("size", ValueType::Number),
        ]));
        assert_eq!(attr.value_type(&root()).unwrap(), expected);
    }

    #[test]
    fn unknown_nesting_mode_is_schema_mismatch() {
        let attr = Attribute::nested(NestedAttributes::new(
            crate::nested::NestingMode::Unknown,
            [("a", Attribute::leaf(ValueType::Bool).optional())],
        ))
        .optional();
        assert!(attr.validate_definition(&root()).is_ok());
        assert!(matches!(
            attr.value_type(&root()),
            Err(SchemaError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn validate_tree_reaches_nested_members() {
        let attr = Attribute::nested(NestedAttributes::single([(
            "bad",
            Attribute::leaf(ValueType::Bool),
        )]))
        .optional();
        match attr.validate_tree(&root()) {
            Err(SchemaError::InvalidDefinition { path, .. }) => {
                assert_eq!(path, root().attr("bad"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
