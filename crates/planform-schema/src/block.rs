//! Nested blocks
//!
//! Provides [`Block`], a repeatable structural field that behaves like
//! nested attributes but carries no requirement tier or sensitivity and is
//! never settable as a scalar leaf.

use std::collections::BTreeMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use planform_value::{Path, ValueType};

use crate::attribute::Attribute;
use crate::error::SchemaError;
use crate::nested::NestingMode;
use crate::plan_modifier::PlanModifier;
use crate::validator::AttributeValidator;

/// Block definition
#[derive(Clone, Default)]
pub struct Block {
    mode: NestingMode,
    attributes: BTreeMap<String, Attribute>,
    blocks: BTreeMap<String, Block>,
    min_items: u64,
    max_items: u64,
    description: Option<String>,
    markdown_description: Option<String>,
    deprecation_message: Option<String>,
    validators: Vec<Arc<dyn AttributeValidator>>,
    plan_modifiers: Vec<Arc<dyn PlanModifier>>,
}

impl Block {
    /// Create block with the given nesting mode
    #[must_use]
    pub fn new(mode: NestingMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// List block
    #[must_use]
    pub fn list() -> Self {
        Self::new(NestingMode::List)
    }

    /// Set block
    #[must_use]
    pub fn set() -> Self {
        Self::new(NestingMode::Set)
    }

    /// Single block
    #[must_use]
    pub fn single() -> Self {
        Self::new(NestingMode::Single)
    }

    /// Add an attribute
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    /// Add a nested block
    #[must_use]
    pub fn block(mut self, name: impl Into<String>, block: Block) -> Self {
        self.blocks.insert(name.into(), block);
        self
    }

    /// Minimum number of items in config (0 = unbounded)
    #[must_use]
    pub fn min_items(mut self, min: u64) -> Self {
        self.min_items = min;
        self
    }

    /// Maximum number of items in config (0 = unbounded)
    #[must_use]
    pub fn max_items(mut self, max: u64) -> Self {
        self.max_items = max;
        self
    }

    /// Plain text description
    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Markdown description
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

    /// Nesting mode
    #[inline]
    #[must_use]
    pub fn mode(&self) -> NestingMode {
        self.mode
    }

    /// Attributes, ordered by name
    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, Attribute> {
        &self.attributes
    }

    /// Nested blocks, ordered by name
    #[inline]
    #[must_use]
    pub fn blocks(&self) -> &BTreeMap<String, Block> {
        &self.blocks
    }

    /// Minimum item count (0 = unbounded)
    #[inline]
    #[must_use]
    pub fn min_item_count(&self) -> u64 {
        self.min_items
    }

    /// Maximum item count (0 = unbounded)
    #[inline]
    #[must_use]
    pub fn max_item_count(&self) -> u64 {
        self.max_items
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

    /// Type of one block object (attributes and nested blocks)
    ///
    /// # Errors
    /// Returns error if any member has no resolvable type
    pub fn object_type(&self, path: &Path) -> Result<ValueType, SchemaError> {
        let mut types = BTreeMap::new();
        for (name, attr) in &self.attributes {
            types.insert(name.clone(), attr.value_type(&path.attr(name.clone()))?);
        }
        for (name, block) in &self.blocks {
            types.insert(name.clone(), block.value_type(&path.attr(name.clone()))?);
        }
        Ok(ValueType::object(types))
    }

    /// Type of the whole block value, wrapped per nesting mode
    ///
    /// # Errors
    /// Returns error for an unsupported nesting mode or unresolvable members
    pub fn value_type(&self, path: &Path) -> Result<ValueType, SchemaError> {
        self.check_mode(path)?;
        let object = self.object_type(path)?;
        self.mode.wrap(object, path)
    }

    fn check_mode(&self, path: &Path) -> Result<(), SchemaError> {
        match self.mode {
            NestingMode::List | NestingMode::Set | NestingMode::Single => Ok(()),
            NestingMode::Map | NestingMode::Unknown => Err(SchemaError::invalid_definition(
                path,
                format!("unsupported block nesting mode: {}", self.mode),
            )),
        }
    }

    /// Check this block's own structural invariants
    ///
    /// # Errors
    /// Returns [`SchemaError::InvalidDefinition`] naming the violated rule
    pub fn validate_definition(&self, path: &Path) -> Result<(), SchemaError> {
        self.check_mode(path)?;

        if self.max_items > 0 && self.min_items > self.max_items {
            return Err(SchemaError::invalid_definition(
                path,
                format!(
                    "Block MinItems ({}) cannot exceed MaxItems ({})",
                    self.min_items, self.max_items
                ),
            ));
        }

        if self.mode == NestingMode::Single && (self.min_items > 1 || self.max_items > 1) {
            return Err(SchemaError::invalid_definition(
                path,
                "Single blocks cannot declare item limits above one",
            ));
        }

        if let Some(name) = self.attributes.keys().find(|k| self.blocks.contains_key(*k)) {
            return Err(SchemaError::invalid_definition(
                path,
                format!("Block declares {name:?} as both an attribute and a block"),
            ));
        }

        Ok(())
    }

    /// Check this block and every member
    ///
    /// # Errors
    /// Returns the first [`SchemaError::InvalidDefinition`] found
    pub fn validate_tree(&self, path: &Path) -> Result<(), SchemaError> {
        self.validate_definition(path)?;
        for (name, attr) in &self.attributes {
            attr.validate_tree(&path.attr(name.clone()))?;
        }
        for (name, block) in &self.blocks {
            block.validate_tree(&path.attr(name.clone()))?;
        }
        Ok(())
    }
}

impl Debug for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("mode", &self.mode)
            .field("attributes", &self.attributes)
            .field("blocks", &self.blocks)
            .field("min_items", &self.min_items)
            .field("max_items", &self.max_items)
            .field("deprecation_message", &self.deprecation_message)
            .field("validators", &self.validators.len())
            .field("plan_modifiers", &self.plan_modifiers.len())
            .finish_non_exhaustive()
    }
}
