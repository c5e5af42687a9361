//! Wire description of a schema
//!
//! Provides [`SchemaDescription`], the serializable form of a [`Schema`]
//! handed to the host orchestrator. Attributes and blocks are always
//! emitted sorted by name.

use serde::{Deserialize, Serialize};

use planform_value::Path;

use crate::attribute::Attribute;
use crate::block::Block;
use crate::error::SchemaError;
use crate::nested::NestingMode;
use crate::schema::Schema;

/// Format of a description string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionKind {
    /// Plain text
    Plain,

    /// Markdown
    Markdown,
}

/// Serializable schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescription {
    /// Schema version
    pub version: i64,

    /// Root block
    pub block: BlockDescription,
}

/// Serializable block body
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockDescription {
    /// Attributes, sorted by name
    pub attributes: Vec<AttributeDescription>,

    /// Nested blocks, sorted by name
    pub block_types: Vec<NestedBlockDescription>,

    /// Description text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Description format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_kind: Option<DescriptionKind>,

    /// Deprecation flag
    #[serde(default)]
    pub deprecated: bool,
}

/// Serializable attribute
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AttributeDescription {
    /// Attribute name
    pub name: String,

    /// Leaf type, rendered in `list[string]` form
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,

    /// Nested object shape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested_type: Option<NestedObjectDescription>,

    /// Required flag
    #[serde(default)]
    pub required: bool,

    /// Optional flag
    #[serde(default)]
    pub optional: bool,

    /// Computed flag
    #[serde(default)]
    pub computed: bool,

    /// Sensitive flag
    #[serde(default)]
    pub sensitive: bool,

    /// Description text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Description format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_kind: Option<DescriptionKind>,

    /// Deprecation flag
    #[serde(default)]
    pub deprecated: bool,
}

/// Serializable nested attribute object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedObjectDescription {
    /// Nesting mode
    pub nesting: NestingMode,

    /// Attributes, sorted by name
    pub attributes: Vec<AttributeDescription>,
}

/// Serializable nested block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedBlockDescription {
    /// Block name
    pub type_name: String,

    /// Nesting mode
    pub nesting: NestingMode,

    /// Block body
    pub block: BlockDescription,

    /// Minimum item count (0 = unbounded)
    #[serde(default)]
    pub min_items: u64,

    /// Maximum item count (0 = unbounded)
    #[serde(default)]
    pub max_items: u64,
}

impl SchemaDescription {
    /// Serialize to JSON
    ///
    /// # Errors
    /// Returns [`SchemaError::Serialization`] if encoding fails
    pub fn to_json(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Markdown wins over plain text when both are set
fn pick_description(
    plain: Option<&str>,
    markdown: Option<&str>,
) -> (Option<String>, Option<DescriptionKind>) {
    match (markdown, plain) {
        (Some(text), _) if !text.is_empty() => {
            (Some(text.to_string()), Some(DescriptionKind::Markdown))
        }
        (_, Some(text)) if !text.is_empty() => {
            (Some(text.to_string()), Some(DescriptionKind::Plain))
        }
        _ => (None, None),
    }
}

impl Schema {
    /// Build the wire description
    ///
    /// # Errors
    /// Returns [`SchemaError::InvalidDefinition`] if any definition in the
    /// tree is structurally invalid or has an unrecognized nesting mode
    pub fn describe(&self) -> Result<SchemaDescription, SchemaError> {
        self.validate_definition()?;

        let (description, description_kind) =
            pick_description(self.description_text(), self.markdown_description_text());

        let mut block = BlockDescription {
            description,
            description_kind,
            deprecated: self.deprecation_message().is_some(),
            ..BlockDescription::default()
        };
        for (name, attr) in self.attributes() {
            block
                .attributes
                .push(describe_attribute(name, attr, &Path::attr_root(name.clone()))?);
        }
        for (name, nested) in self.blocks() {
            block
                .block_types
                .push(describe_block(name, nested, &Path::attr_root(name.clone()))?);
        }

        tracing::debug!(
            attributes = block.attributes.len(),
            blocks = block.block_types.len(),
            "described schema"
        );

        Ok(SchemaDescription {
            version: self.schema_version(),
            block,
        })
    }
}

fn describe_attribute(
    name: &str,
    attr: &Attribute,
    path: &Path,
) -> Result<AttributeDescription, SchemaError> {
    let (description, description_kind) =
        pick_description(attr.description_text(), attr.markdown_description_text());

    let mut out = AttributeDescription {
        name: name.to_string(),
        required: attr.is_required(),
        optional: attr.is_optional(),
        computed: attr.is_computed(),
        sensitive: attr.is_sensitive(),
        description,
        description_kind,
        deprecated: attr.deprecation_message().is_some(),
        ..AttributeDescription::default()
    };

    if let Some(leaf) = attr.leaf_type() {
        out.value_type = Some(leaf.value_type().to_string());
        return Ok(out);
    }

    let Some(nested) = attr.nested_attributes() else {
        return Err(SchemaError::invalid_definition(
            path,
            "must have Attributes or Type set",
        ));
    };
    if nested.mode() == NestingMode::Unknown {
        return Err(SchemaError::invalid_definition(
            path,
            format!("unrecognized nesting mode {}", nested.mode()),
        ));
    }

    let mut attributes = Vec::with_capacity(nested.attributes().len());
    for (child_name, child) in nested.attributes() {
        attributes.push(describe_attribute(
            child_name,
            child,
            &path.attr(child_name.clone()),
        )?);
    }
    out.nested_type = Some(NestedObjectDescription {
        nesting: nested.mode(),
        attributes,
    });
    Ok(out)
}

fn describe_block(
    name: &str,
    block: &Block,
    path: &Path,
) -> Result<NestedBlockDescription, SchemaError> {
    let (description, description_kind) =
        pick_description(block.description_text(), block.markdown_description_text());

    let mut body = BlockDescription {
        description,
        description_kind,
        deprecated: block.deprecation_message().is_some(),
        ..BlockDescription::default()
    };
    for (child_name, child) in block.attributes() {
        body.attributes.push(describe_attribute(
            child_name,
            child,
            &path.attr(child_name.clone()),
        )?);
    }
    for (child_name, child) in block.blocks() {
        body.block_types.push(describe_block(
            child_name,
            child,
            &path.attr(child_name.clone()),
        )?);
    }

    Ok(NestedBlockDescription {
        type_name: name.to_string(),
        nesting: block.mode(),
        block: body,
        min_items: block.min_item_count(),
        max_items: block.max_item_count(),
    })
}
