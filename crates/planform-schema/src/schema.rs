//! Schema root and path resolution
//!
//! Provides [`Schema`], the named attribute and block mapping describing one
//! resource, and [`SchemaNode`], the result of resolving a [`Path`] against
//! it.
//!
//! # Resolution rules
//! - The root and every nested object accept only attribute-name steps
//! - `Single` nested attributes and blocks accept attribute-name steps
//!   directly, with no element step in between
//! - `List`, `Set` and `Map` accept exactly their element step kind
//! - Leaf types accept whatever their structural [`ValueType`] accepts

use std::collections::BTreeMap;
use std::sync::Arc;

use planform_value::{Path, PathStep, ValueType};

use crate::attribute::Attribute;
use crate::block::Block;
use crate::error::SchemaError;
use crate::nested::{NestedAttributes, NestingMode};
use crate::plan_modifier::PlanModifier;
use crate::validator::AttributeValidator;

/// Resource schema
#[derive(Debug, Clone, Default)]
pub struct Schema {
    attributes: BTreeMap<String, Attribute>,
    blocks: BTreeMap<String, Block>,
    version: i64,
    description: Option<String>,
    markdown_description: Option<String>,
    deprecation_message: Option<String>,
}

impl Schema {
    /// Create schema from named attributes
    #[must_use]
    pub fn new<I, K>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, Attribute)>,
        K: Into<String>,
    {
        Self {
            attributes: attributes
                .into_iter()
                .map(|(name, attr)| (name.into(), attr))
                .collect(),
            ..Self::default()
        }
    }

    /// Add a top-level block
    #[must_use]
    pub fn block(mut self, name: impl Into<String>, block: Block) -> Self {
        self.blocks.insert(name.into(), block);
        self
    }

    /// Set schema version
    #[must_use]
    pub fn version(mut self, version: i64) -> Self {
        self.version = version;
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

    /// Mark the whole schema deprecated
    #[must_use]
    pub fn deprecated(mut self, message: impl Into<String>) -> Self {
        self.deprecation_message = Some(message.into());
        self
    }

    /// Top-level attributes, ordered by name
    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, Attribute> {
        &self.attributes
    }

    /// Top-level blocks, ordered by name
    #[inline]
    #[must_use]
    pub fn blocks(&self) -> &BTreeMap<String, Block> {
        &self.blocks
    }

    /// Schema version
    #[inline]
    #[must_use]
    pub fn schema_version(&self) -> i64 {
        self.version
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

    /// Top-level attributes then blocks, each ordered by name
    pub fn items(&self) -> impl Iterator<Item = (&String, SchemaItem<'_>)> {
        object_items(&self.attributes, &self.blocks)
    }

    /// Object type of the whole tree
    ///
    /// # Errors
    /// Returns error if any member has no resolvable type
    pub fn value_type(&self) -> Result<ValueType, SchemaError> {
        let mut types = BTreeMap::new();
        for (name, item) in self.items() {
            types.insert(name.clone(), item.value_type(&Path::attr_root(name.clone()))?);
        }
        Ok(ValueType::object(types))
    }

    /// Check every attribute and block definition in the tree
    ///
    /// # Errors
    /// Returns the first [`SchemaError::InvalidDefinition`] found
    pub fn validate_definition(&self) -> Result<(), SchemaError> {
        if let Some(name) = self.attributes.keys().find(|k| self.blocks.contains_key(*k)) {
            return Err(SchemaError::invalid_definition(
                &Path::attr_root(name.clone()),
                format!("Schema declares {name:?} as both an attribute and a block"),
            ));
        }
        for (name, attr) in &self.attributes {
            attr.validate_tree(&Path::attr_root(name.clone()))?;
        }
        for (name, block) in &self.blocks {
            block.validate_tree(&Path::attr_root(name.clone()))?;
        }
        Ok(())
    }

    /// Resolve a path to the schema node it addresses
    ///
    /// # Errors
    /// Returns [`SchemaError::SchemaMismatch`] naming the first step that
    /// does not correspond to declared structure
    pub fn type_at(&self, path: &Path) -> Result<SchemaNode<'_>, SchemaError> {
        let mut node = SchemaNode::Root(self);
        for (depth, step) in path.iter().enumerate() {
            let prefix: Path = path.steps()[..=depth].iter().cloned().collect();
            node = node.step(step, &prefix)?;
        }
        Ok(node)
    }

    /// Attribute definition at a path
    ///
    /// # Errors
    /// - [`SchemaError::PathIsBlock`] if the path leads to a block
    /// - [`SchemaError::PathInsideAtomicAttribute`] if the path leads into a
    ///   leaf type
    /// - [`SchemaError::SchemaMismatch`] for any other node or unresolvable path
    pub fn attribute_at(&self, path: &Path) -> Result<&Attribute, SchemaError> {
        match self.type_at(path)? {
            SchemaNode::Attribute(attr) => Ok(attr),
            SchemaNode::Block(_) => Err(SchemaError::PathIsBlock { path: path.clone() }),
            SchemaNode::Element(_) => {
                Err(SchemaError::PathInsideAtomicAttribute { path: path.clone() })
            }
            SchemaNode::Root(_) | SchemaNode::NestedObject(_) | SchemaNode::BlockObject(_) => {
                Err(SchemaError::schema_mismatch(path, "path does not lead to an attribute"))
            }
        }
    }
}

/// Attributes then blocks of one object level, each ordered by name
fn object_items<'a>(
    attributes: &'a BTreeMap<String, Attribute>,
    blocks: &'a BTreeMap<String, Block>,
) -> impl Iterator<Item = (&'a String, SchemaItem<'a>)> {
    attributes
        .iter()
        .map(|(name, attr)| (name, SchemaItem::Attribute(attr)))
        .chain(
            blocks
                .iter()
                .map(|(name, block)| (name, SchemaItem::Block(block))),
        )
}

/// Node reached by resolving a path against a [`Schema`]
#[derive(Debug, Clone)]
pub enum SchemaNode<'a> {
    /// The schema root
    Root(&'a Schema),

    /// An attribute definition
    Attribute(&'a Attribute),

    /// A block definition
    Block(&'a Block),

    /// One object of a collection-nested attribute
    NestedObject(&'a NestedAttributes),

    /// One object of a collection block
    BlockObject(&'a Block),

    /// A position inside a leaf type
    Element(ValueType),
}

impl<'a> SchemaNode<'a> {
    /// Apply one step; `path` is the path up to and including `step`
    fn step(self, step: &PathStep, path: &Path) -> Result<SchemaNode<'a>, SchemaError> {
        let mismatch = |what: &str| {
            SchemaError::schema_mismatch(path, format!("cannot apply step {step} to {what}"))
        };

        match self {
            Self::Root(schema) => object_member(&schema.attributes, &schema.blocks, step, path),
            Self::Attribute(attr) => {
                if let Some(leaf) = attr.leaf_type() {
                    return leaf
                        .value_type()
                        .step_type(step)
                        .cloned()
                        .map(SchemaNode::Element)
                        .ok_or_else(|| mismatch(&format!("leaf type {}", leaf.value_type())));
                }
                let Some(nested) = attr.nested_attributes() else {
                    return Err(mismatch("attribute without type"));
                };
                match (nested.mode(), step) {
                    (NestingMode::Single, PathStep::AttributeName(name)) => nested
                        .attribute(name)
                        .map(SchemaNode::Attribute)
                        .ok_or_else(|| no_attribute(name, path)),
                    (NestingMode::List, PathStep::ElementKeyInt(_))
                    | (NestingMode::Set, PathStep::ElementKeyValue(_))
                    | (NestingMode::Map, PathStep::ElementKeyString(_)) => {
                        Ok(SchemaNode::NestedObject(nested))
                    }
                    (mode, _) => Err(mismatch(&format!("nested attributes with mode {mode}"))),
                }
            }
            Self::NestedObject(nested) => match step {
                PathStep::AttributeName(name) => nested
                    .attribute(name)
                    .map(SchemaNode::Attribute)
                    .ok_or_else(|| no_attribute(name, path)),
                _ => Err(mismatch("nested object")),
            },
            Self::Block(block) => match (block.mode(), step) {
                (NestingMode::Single, PathStep::AttributeName(_)) => {
                    object_member(block.attributes(), block.blocks(), step, path)
                }
                (NestingMode::List, PathStep::ElementKeyInt(_))
                | (NestingMode::Set, PathStep::ElementKeyValue(_)) => {
                    Ok(SchemaNode::BlockObject(block))
                }
                (mode, _) => Err(mismatch(&format!("block with mode {mode}"))),
            },
            Self::BlockObject(block) => {
                object_member(block.attributes(), block.blocks(), step, path)
            }
            Self::Element(ty) => ty
                .step_type(step)
                .cloned()
                .map(SchemaNode::Element)
                .ok_or_else(|| mismatch(&format!("value of type {ty}"))),
        }
    }

    /// Structural type of values at this node
    ///
    /// # Errors
    /// Returns error if the node's definition has no resolvable type
    pub fn value_type(&self, path: &Path) -> Result<ValueType, SchemaError> {
        match self {
            Self::Root(schema) => schema.value_type(),
            Self::Attribute(attr) => attr.value_type(path),
            Self::Block(block) => block.value_type(path),
            Self::NestedObject(nested) => nested.object_type(path),
            Self::BlockObject(block) => block.object_type(path),
            Self::Element(ty) => Ok(ty.clone()),
        }
    }
}

fn no_attribute(name: &str, path: &Path) -> SchemaError {
    SchemaError::schema_mismatch(path, format!("could not find attribute {name:?} in schema"))
}

fn object_member<'a>(
    attributes: &'a BTreeMap<String, Attribute>,
    blocks: &'a BTreeMap<String, Block>,
    step: &PathStep,
    path: &Path,
) -> Result<SchemaNode<'a>, SchemaError> {
    let PathStep::AttributeName(name) = step else {
        return Err(SchemaError::schema_mismatch(
            path,
            format!("cannot apply step {step} to an object"),
        ));
    };
    if let Some(attr) = attributes.get(name) {
        return Ok(SchemaNode::Attribute(attr));
    }
    if let Some(block) = blocks.get(name) {
        return Ok(SchemaNode::Block(block));
    }
    Err(no_attribute(name, path))
}

/// Attribute or block, as enumerated by the walkers
#[derive(Debug, Clone, Copy)]
pub enum SchemaItem<'a> {
    /// Attribute definition
    Attribute(&'a Attribute),

    /// Block definition
    Block(&'a Block),
}

impl<'a> SchemaItem<'a> {
    /// Check the item's own definition
    ///
    /// # Errors
    /// Returns [`SchemaError::InvalidDefinition`] naming the violated rule
    pub fn validate_definition(&self, path: &Path) -> Result<(), SchemaError> {
        match *self {
            Self::Attribute(attr) => attr.validate_definition(path),
            Self::Block(block) => block.validate_definition(path),
        }
    }

    /// Structural type of the item's values
    ///
    /// # Errors
    /// Returns error if the item has no resolvable type
    pub fn value_type(&self, path: &Path) -> Result<ValueType, SchemaError> {
        match *self {
            Self::Attribute(attr) => attr.value_type(path),
            Self::Block(block) => block.value_type(path),
        }
    }

    /// Nesting mode, if the item has nested members
    #[must_use]
    pub fn nesting(&self) -> Option<NestingMode> {
        match *self {
            Self::Attribute(attr) => attr.nested_attributes().map(NestedAttributes::mode),
            Self::Block(block) => Some(block.mode()),
        }
    }

    /// Nested members of one object, attributes then blocks
    #[must_use]
    pub fn children(&self) -> Vec<(&'a String, SchemaItem<'a>)> {
        match *self {
            Self::Attribute(attr) => attr
                .nested_attributes()
                .map(|nested| {
                    nested
                        .attributes()
                        .iter()
                        .map(|(name, attr)| (name, SchemaItem::Attribute(attr)))
                        .collect()
                })
                .unwrap_or_default(),
            Self::Block(block) => object_items(block.attributes(), block.blocks()).collect(),
        }
    }

    /// Validators in declaration order
    #[must_use]
    pub fn validators(&self) -> &'a [Arc<dyn AttributeValidator>] {
        match *self {
            Self::Attribute(attr) => attr.validators(),
            Self::Block(block) => block.validators(),
        }
    }

    /// Plan modifiers in declaration order
    #[must_use]
    pub fn plan_modifiers(&self) -> &'a [Arc<dyn PlanModifier>] {
        match *self {
            Self::Attribute(attr) => attr.plan_modifiers(),
            Self::Block(block) => block.plan_modifiers(),
        }
    }

    /// Deprecation message
    #[must_use]
    pub fn deprecation_message(&self) -> Option<&'a str> {
        match *self {
            Self::Attribute(attr) => attr.deprecation_message(),
            Self::Block(block) => block.deprecation_message(),
        }
    }

    /// Check if this is a block
    #[inline]
    #[must_use]
    pub fn is_block(&self) -> bool {
        matches!(self, Self::Block(_))
    }
}
