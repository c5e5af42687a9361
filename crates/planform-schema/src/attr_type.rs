//! Leaf attribute types
//!
//! Provides the [`AttrType`] capability contract for leaf attributes. A leaf
//! type names its structural [`ValueType`] and may optionally expose a
//! [`TypeValidation`] hook that the marshaling engine runs before converting
//! a value of that type.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use planform_value::{Diagnostics, DynamicValue, Path, ValueType};

/// Minimal contract a leaf attribute type satisfies
pub trait AttrType: Send + Sync {
    /// Structural type of values of this attribute type
    fn value_type(&self) -> ValueType;

    /// Optional validation capability
    fn validation(&self) -> Option<&dyn TypeValidation> {
        None
    }
}

/// Validation capability of an [`AttrType`]
///
/// Invoked with the value about to be converted and its path; returned
/// errors make the marshaling engine leave the target field at its zero form.
pub trait TypeValidation: Send + Sync {
    /// Validate a value of this type
    fn validate(&self, value: &DynamicValue, path: &Path) -> Diagnostics;
}

impl AttrType for ValueType {
    fn value_type(&self) -> ValueType {
        self.clone()
    }
}

/// Shared handle to a leaf type
#[derive(Clone)]
pub struct LeafType(Arc<dyn AttrType>);

impl LeafType {
    /// Wrap a leaf type implementation
    #[inline]
    #[must_use]
    pub fn new(ty: impl AttrType + 'static) -> Self {
        Self(Arc::new(ty))
    }

    /// Structural type
    #[inline]
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        self.0.value_type()
    }

    /// Validation capability, if the type declares one
    #[inline]
    #[must_use]
    pub fn validation(&self) -> Option<&dyn TypeValidation> {
        self.0.validation()
    }
}

impl From<ValueType> for LeafType {
    fn from(ty: ValueType) -> Self {
        Self::new(ty)
    }
}

impl Debug for LeafType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LeafType")
            .field(&self.value_type().to_string())
            .field(&self.validation().is_some())
            .finish()
    }
}

/// Leaf type adding a validation hook to a plain [`ValueType`]
pub struct ValidatedType<F> {
    ty: ValueType,
    check: F,
}

impl<F> ValidatedType<F>
where
    F: Fn(&DynamicValue, &Path) -> Diagnostics + Send + Sync,
{
    /// Create validated type
    #[must_use]
    pub fn new(ty: ValueType, check: F) -> Self {
        Self { ty, check }
    }
}

impl<F> AttrType for ValidatedType<F>
where
    F: Fn(&DynamicValue, &Path) -> Diagnostics + Send + Sync,
{
    fn value_type(&self) -> ValueType {
        self.ty.clone()
    }

    fn validation(&self) -> Option<&dyn TypeValidation> {
        Some(self)
    }
}

impl<F> TypeValidation for ValidatedType<F>
where
    F: Fn(&DynamicValue, &Path) -> Diagnostics + Send + Sync,
{
    fn validate(&self, value: &DynamicValue, path: &Path) -> Diagnostics {
        (self.check)(value, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planform_value::DiagnosticKind;

    #[test]
    fn plain_type_has_no_validation() {
        let leaf = LeafType::from(ValueType::String);
        assert!(leaf.validation().is_none());
        assert_eq!(leaf.value_type(), ValueType::String);
    }

    #[test]
    fn validated_type_runs_hook() {
        let non_empty = |value: &DynamicValue, path: &Path| {
            let mut diags = Diagnostics::new();
            if value.as_str() == Some("") {
                diags.add_attribute_error(path, DiagnosticKind::Validation, "Empty", "empty");
            }
            diags
        };
        let leaf = LeafType::new(ValidatedType::new(ValueType::String, non_empty));

        let hook = leaf.validation().unwrap();
        let path = Path::attr_root("name");
        assert!(hook.validate(&DynamicValue::string(""), &path).has_error());
        assert!(hook.validate(&DynamicValue::string("x"), &path).is_empty());
    }
}
