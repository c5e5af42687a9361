//! Nested attributes
//!
//! Provides [`NestingMode`] and [`NestedAttributes`], the nested-shape half
//! of an [`Attribute`] definition.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use planform_value::{Path, ValueType};
use serde::{Deserialize, Serialize};

use crate::attribute::Attribute;
use crate::error::SchemaError;

/// How nested objects are arranged under an attribute or block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NestingMode {
    /// Not set; rejected wherever the tree is walked
    #[default]
    Unknown,

    /// One object
    Single,

    /// Ordered objects addressed by index
    List,

    /// Deduplicated objects addressed by value
    Set,

    /// String-keyed objects
    Map,
}

impl NestingMode {
    /// Wrap the nested object type according to this mode
    ///
    /// # Errors
    /// Returns [`SchemaError::SchemaMismatch`] for [`NestingMode::Unknown`]
    pub fn wrap(self, object: ValueType, path: &Path) -> Result<ValueType, SchemaError> {
        match self {
            Self::Single => Ok(object),
            Self::List => Ok(ValueType::list(object)),
            Self::Set => Ok(ValueType::set(object)),
            Self::Map => Ok(ValueType::map(object)),
            Self::Unknown => Err(SchemaError::schema_mismatch(
                path,
                "unrecognized nesting mode",
            )),
        }
    }
}

impl Display for NestingMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Single => "single",
            Self::List => "list",
            Self::Set => "set",
            Self::Map => "map",
        };
        f.write_str(name)
    }
}

/// Nested attribute set plus its nesting mode
#[derive(Debug, Clone, Default)]
pub struct NestedAttributes {
    mode: NestingMode,
    attributes: BTreeMap<String, Attribute>,
}

impl NestedAttributes {
    /// Create nested attributes with an explicit mode
    #[must_use]
    pub fn new<I, K>(mode: NestingMode, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, Attribute)>,
        K: Into<String>,
    {
        Self {
            mode,
            attributes: attributes
                .into_iter()
                .map(|(name, attr)| (name.into(), attr))
                .collect(),
        }
    }

    /// One nested object
    #[must_use]
    pub fn single<I, K>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, Attribute)>,
        K: Into<String>,
    {
        Self::new(NestingMode::Single, attributes)
    }

    /// List of nested objects
    #[must_use]
    pub fn list<I, K>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, Attribute)>,
        K: Into<String>,
    {
        Self::new(NestingMode::List, attributes)
    }

    /// Set of nested objects
    #[must_use]
    pub fn set<I, K>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, Attribute)>,
        K: Into<String>,
    {
        Self::new(NestingMode::Set, attributes)
    }

    /// Map of nested objects
    #[must_use]
    pub fn map<I, K>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, Attribute)>,
        K: Into<String>,
    {
        Self::new(NestingMode::Map, attributes)
    }

    /// Nesting mode
    #[inline]
    #[must_use]
    pub fn mode(&self) -> NestingMode {
        self.mode
    }

    /// Nested attributes, ordered by name
    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, Attribute> {
        &self.attributes
    }

    /// Nested attribute by name
    #[inline]
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Check if any attributes are declared
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Type of one nested object
    ///
    /// # Errors
    /// Returns error if any nested attribute has no resolvable type
    pub fn object_type(&self, path: &Path) -> Result<ValueType, SchemaError> {
        let mut types = BTreeMap::new();
        for (name, attr) in &self.attributes {
            types.insert(name.clone(), attr.value_type(&path.attr(name.clone()))?);
        }
        Ok(ValueType::object(types))
    }

    /// Type of the whole nested value, wrapped per nesting mode
    ///
    /// # Errors
    /// Returns error for an unknown nesting mode or unresolvable nested types
    pub fn value_type(&self, path: &Path) -> Result<ValueType, SchemaError> {
        let object = self.object_type(path)?;
        self.mode.wrap(object, path)
    }
}
