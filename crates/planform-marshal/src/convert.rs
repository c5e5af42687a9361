//! Conversion traits and decoding context
//!
//! Provides [`FromValue`] and [`IntoValue`], the two directions of the
//! native <-> [`DynamicValue`] bridge, and [`Decoder`], which carries the
//! current path, options and schema while decoding so leaf type validation
//! hooks run for every attribute on the way down.

use planform_schema::{Schema, SchemaNode};
use planform_value::{Diagnostics, DynamicValue, Path, PathStep, ValueType};

use crate::error::ConvertError;
use crate::options::MarshalOptions;

/// Native shape decodable from a dynamic value
pub trait FromValue: Sized {
    /// Name used in conversion errors
    fn target_name() -> String;

    /// Zero form, used when validation fails or unhandled values are
    /// treated as empty
    fn zero_value(ty: &ValueType) -> Self;

    /// Decode `value`, which sits at `decoder.path()`
    ///
    /// # Errors
    /// Returns error if this shape cannot represent `value`
    fn from_value(value: &DynamicValue, decoder: &mut Decoder<'_>) -> Result<Self, ConvertError>;
}

/// Native shape encodable into a dynamic value
pub trait IntoValue {
    /// Encode as a value of type `ty`; `path` is used for error attribution
    ///
    /// # Errors
    /// Returns error if this shape cannot produce a value of type `ty`
    fn into_value(&self, ty: &ValueType, path: &Path) -> Result<DynamicValue, ConvertError>;
}

/// Decoding context
#[derive(Debug)]
pub struct Decoder<'a> {
    schema: Option<&'a Schema>,
    options: MarshalOptions,
    path: Path,
    diagnostics: Diagnostics,
}

impl<'a> Decoder<'a> {
    /// Create decoder rooted at `path`
    #[must_use]
    pub fn new(schema: Option<&'a Schema>, options: MarshalOptions, path: Path) -> Self {
        Self {
            schema,
            options,
            path,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Current path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Active options
    #[inline]
    #[must_use]
    pub fn options(&self) -> &MarshalOptions {
        &self.options
    }

    /// Diagnostics collected so far (validation hook output)
    #[inline]
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Finish decoding, returning collected diagnostics
    #[must_use]
    pub fn finish(self) -> Diagnostics {
        self.diagnostics
    }

    /// Decode `value` at the current path, running the type validation hook
    /// declared for this path first
    ///
    /// A hook error leaves the result at its zero form.
    ///
    /// # Errors
    /// Returns error if `T` cannot represent `value`
    pub fn decode<T: FromValue>(&mut self, value: &DynamicValue) -> Result<T, ConvertError> {
        if self.run_type_validation(value) {
            return Ok(T::zero_value(value.ty()));
        }
        T::from_value(value, self)
    }

    /// Decode a child value with the path extended by `step`
    ///
    /// # Errors
    /// Returns error if `T` cannot represent `value`
    pub fn decode_child<T: FromValue>(
        &mut self,
        step: PathStep,
        value: &DynamicValue,
    ) -> Result<T, ConvertError> {
        let child = self.path.child(step);
        let parent = std::mem::replace(&mut self.path, child);
        let result = self.decode(value);
        self.path = parent;
        result
    }

    /// Decode the named attribute of an object value
    ///
    /// # Errors
    /// Returns error if the attribute is absent or `T` cannot represent it
    pub fn decode_attribute<T: FromValue>(
        &mut self,
        object: &DynamicValue,
        name: &str,
    ) -> Result<T, ConvertError> {
        let child = object.attribute(name).ok_or_else(|| {
            ConvertError::incompatible(
                &self.path,
                T::target_name(),
                format!("object without attribute {name:?}"),
            )
        })?;
        self.decode_child(PathStep::AttributeName(name.to_string()), child)
    }

    /// Resolve a null value for a target without null representation
    ///
    /// # Errors
    /// Returns [`ConvertError::UnhandledNull`] unless nulls are treated as empty
    pub fn unhandled_null<T: FromValue>(&self, value: &DynamicValue) -> Result<T, ConvertError> {
        if self.options.unhandled_null_as_empty {
            return Ok(T::zero_value(value.ty()));
        }
        Err(ConvertError::UnhandledNull {
            path: self.path.clone(),
            target: T::target_name(),
        })
    }

    /// Resolve an unknown value for a target without unknown representation
    ///
    /// # Errors
    /// Returns [`ConvertError::UnhandledUnknown`] unless unknowns are treated
    /// as empty
    pub fn unhandled_unknown<T: FromValue>(&self, value: &DynamicValue) -> Result<T, ConvertError> {
        if self.options.unhandled_unknown_as_empty {
            return Ok(T::zero_value(value.ty()));
        }
        Err(ConvertError::UnhandledUnknown {
            path: self.path.clone(),
            target: T::target_name(),
        })
    }

    /// Incompatible target error at the current path
    #[must_use]
    pub fn incompatible<T: FromValue>(&self, value: &DynamicValue) -> ConvertError {
        ConvertError::incompatible(&self.path, T::target_name(), format!("{}", value.ty()))
    }

    /// Check an object value against a native shape's attribute names
    ///
    /// Returns `Ok(false)` when the value is null or unknown and the options
    /// say to treat it as empty.
    ///
    /// # Errors
    /// - [`ConvertError::IncompatibleTarget`] if the value is not an object,
    ///   or its attribute names do not match `attributes` one to one
    /// - unhandled null / unknown errors per the options
    pub fn begin_object<T: FromValue>(
        &self,
        value: &DynamicValue,
        attributes: &[&str],
    ) -> Result<bool, ConvertError> {
        let Some(types) = value.ty().attribute_types() else {
            return Err(self.incompatible::<T>(value));
        };
        check_shape_contract::<T>(types.keys().map(String::as_str), attributes, &self.path)?;

        if value.is_null() {
            self.unhandled_null::<T>(value).map(|_| false)
        } else if value.is_unknown() {
            self.unhandled_unknown::<T>(value).map(|_| false)
        } else {
            Ok(true)
        }
    }

    /// Run the leaf type validation hook declared at the current path
    ///
    /// Returns `true` if the hook reported an error.
    fn run_type_validation(&mut self, value: &DynamicValue) -> bool {
        if !self.options.allow_type_validation {
            return false;
        }
        let Some(schema) = self.schema else {
            return false;
        };
        let Ok(SchemaNode::Attribute(attribute)) = schema.type_at(&self.path) else {
            return false;
        };
        let Some(hook) = attribute.leaf_type().and_then(|leaf| leaf.validation()) else {
            return false;
        };

        tracing::debug!(path = %self.path, "calling type validation hook");
        let diagnostics = hook.validate(value, &self.path);
        let failed = diagnostics.has_error();
        self.diagnostics.append(diagnostics);
        if failed {
            tracing::debug!(path = %self.path, "type validation failed, using zero value");
        }
        failed
    }
}

/// Check that a native shape's attribute names match an object type's names
/// one to one
///
/// # Errors
/// Returns [`ConvertError::IncompatibleTarget`] describing the mismatch
pub fn check_shape_contract<'n, T: FromValue>(
    object_names: impl Iterator<Item = &'n str>,
    shape_names: &[&str],
    path: &Path,
) -> Result<(), ConvertError> {
    for (i, name) in shape_names.iter().enumerate() {
        if shape_names[..i].contains(name) {
            return Err(ConvertError::incompatible(
                path,
                T::target_name(),
                format!("an object: attribute {name:?} is bound to more than one field"),
            ));
        }
    }

    let object_names: Vec<&str> = object_names.collect();
    let missing_fields: Vec<&str> = object_names
        .iter()
        .copied()
        .filter(|name| !shape_names.contains(name))
        .collect();
    let missing_attributes: Vec<&str> = shape_names
        .iter()
        .copied()
        .filter(|name| !object_names.contains(name))
        .collect();

    if missing_fields.is_empty() && missing_attributes.is_empty() {
        return Ok(());
    }

    let mut reasons = Vec::new();
    if !missing_fields.is_empty() {
        reasons.push(format!(
            "object attributes without fields [{}]",
            missing_fields.join(", ")
        ));
    }
    if !missing_attributes.is_empty() {
        reasons.push(format!(
            "fields without object attributes [{}]",
            missing_attributes.join(", ")
        ));
    }
    Err(ConvertError::incompatible(
        path,
        T::target_name(),
        format!("an object with {}", reasons.join(" and ")),
    ))
}

/// Decode a dynamic value into a native shape with default options and no
/// schema
///
/// # Errors
/// Returns error if `T` cannot represent `value`
pub fn from_dynamic<T: FromValue>(value: &DynamicValue) -> Result<T, ConvertError> {
    let mut decoder = Decoder::new(None, MarshalOptions::default(), Path::root());
    decoder.decode(value)
}

/// Encode a native shape as a dynamic value of type `ty`
///
/// # Errors
/// Returns error if `native` cannot produce a value of type `ty`
pub fn to_dynamic<T: IntoValue + ?Sized>(
    native: &T,
    ty: &ValueType,
) -> Result<DynamicValue, ConvertError> {
    native.into_value(ty, &Path::root())
}
