//! Structural value types
//!
//! Provides [`ValueType`], the type identity every [`DynamicValue`] node
//! carries, even when it is null or unknown.
//!
//! [`DynamicValue`]: crate::DynamicValue

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Structural type of a dynamic value
///
/// Collection and object types share their inner types through `Arc`, so
/// cloning a type (which every value node does) never deep-copies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Boolean primitive
    Bool,

    /// Arbitrary number (integer or floating point)
    Number,

    /// UTF-8 string primitive
    String,

    /// Ordered list of elements of one type
    List(Arc<ValueType>),

    /// Unordered, deduplicated set of elements of one type
    Set(Arc<ValueType>),

    /// String-keyed map of elements of one type
    Map(Arc<ValueType>),

    /// Fixed set of named attributes
    Object(Arc<BTreeMap<String, ValueType>>),
}

impl ValueType {
    /// List of `elem`
    #[inline]
    #[must_use]
    pub fn list(elem: ValueType) -> Self {
        Self::List(Arc::new(elem))
    }

    /// Set of `elem`
    #[inline]
    #[must_use]
    pub fn set(elem: ValueType) -> Self {
        Self::Set(Arc::new(elem))
    }

    /// Map of string to `elem`
    #[inline]
    #[must_use]
    pub fn map(elem: ValueType) -> Self {
        Self::Map(Arc::new(elem))
    }

    /// Object with the given attribute types
    #[must_use]
    pub fn object<I, K>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, ValueType)>,
        K: Into<String>,
    {
        Self::Object(Arc::new(
            attributes
                .into_iter()
                .map(|(name, ty)| (name.into(), ty))
                .collect(),
        ))
    }

    /// Element type for lists, sets and maps
    #[inline]
    #[must_use]
    pub fn element_type(&self) -> Option<&ValueType> {
        match self {
            Self::List(elem) | Self::Set(elem) | Self::Map(elem) => Some(&**elem),
            _ => None,
        }
    }

    /// Attribute types for objects
    #[inline]
    #[must_use]
    pub fn attribute_types(&self) -> Option<&BTreeMap<String, ValueType>> {
        match self {
            Self::Object(attrs) => Some(&**attrs),
            _ => None,
        }
    }

    /// Check if this is a primitive (leaf) type
    #[inline]
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Bool | Self::Number | Self::String)
    }

    /// Check if this is a list, set or map
    #[inline]
    #[must_use]
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::List(_) | Self::Set(_) | Self::Map(_))
    }

    /// Short name of the type's kind, without inner types
    #[inline]
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool | Self::Number | Self::String => f.write_str(self.kind_name()),
            Self::List(elem) => write!(f, "list[{elem}]"),
            Self::Set(elem) => write!(f, "set[{elem}]"),
            Self::Map(elem) => write!(f, "map[{elem}]"),
            Self::Object(attrs) => {
                f.write_str("object{")?;
                for (i, (name, ty)) in attrs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {ty}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Numeric payload
///
/// Integers and floats compare equal when they denote the same number.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    /// Whole number
    Int(i64),

    /// Floating point number
    Float(f64),
}

impl Number {
    /// Integer view, if the number is whole and in range
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        // 2^63; `i64::MAX as f64` rounds up to this, so the upper bound is exclusive
        const UPPER: f64 = 9_223_372_036_854_775_808.0;
        match *self {
            Self::Int(i) => Some(i),
            #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
            Self::Float(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < UPPER => {
                Some(f as i64)
            }
            Self::Float(_) => None,
        }
    }

    /// Floating point view (may lose precision for large integers)
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits() || a == b,
            (Self::Int(i), Self::Float(f)) | (Self::Float(f), Self::Int(i)) => {
                Self::Float(f).as_i64() == Some(i)
            }
        }
    }
}

impl Eq for Number {}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
        }
    }
}

/// Opaque leaf payload of a known primitive value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Primitive {
    /// Boolean
    Bool(bool),

    /// Number
    Number(Number),

    /// String
    String(String),
}

impl Primitive {
    /// The type this primitive belongs to
    #[inline]
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Number(_) => ValueType::Number,
            Self::String(_) => ValueType::String,
        }
    }
}

impl Display for Primitive {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}
