//! [`FromValue`] / [`IntoValue`] for scalars, collections, the value box
//! and [`Tri`]

use std::collections::{BTreeMap, HashMap};

use planform_value::{
    DynamicValue, Number, Path, PathStep, Payload, ValueState, ValueType,
};

use crate::convert::{Decoder, FromValue, IntoValue};
use crate::error::ConvertError;

/// Outcome of checking a value before reading its payload
enum Checked<'v, T> {
    Payload(&'v Payload),
    Empty(T),
}

/// Check the value's type with `accepts`, then resolve null and unknown per
/// the decoder's options
fn check<'v, T: FromValue>(
    value: &'v DynamicValue,
    decoder: &Decoder<'_>,
    accepts: fn(&ValueType) -> bool,
) -> Result<Checked<'v, T>, ConvertError> {
    if !accepts(value.ty()) {
        return Err(decoder.incompatible::<T>(value));
    }
    match value.state() {
        ValueState::Null => decoder.unhandled_null(value).map(Checked::Empty),
        ValueState::Unknown => decoder.unhandled_unknown(value).map(Checked::Empty),
        ValueState::Known(payload) => Ok(Checked::Payload(payload)),
    }
}

fn encode_mismatch(target: &str, ty: &ValueType, path: &Path) -> ConvertError {
    ConvertError::incompatible(path, target, format!("{ty}"))
}

macro_rules! primitive_impl {
    ($native:ty, $name:literal, $value_ty:ident, $zero:expr,
     |$p:ident, $decoder:ident| $read:expr,
     |$n:ident| $write:expr) => {
        impl FromValue for $native {
            fn target_name() -> String {
                $name.to_string()
            }

            fn zero_value(_ty: &ValueType) -> Self {
                $zero
            }

            fn from_value(
                value: &DynamicValue,
                $decoder: &mut Decoder<'_>,
            ) -> Result<Self, ConvertError> {
                match check::<Self>(value, $decoder, |ty| *ty == ValueType::$value_ty)? {
                    Checked::Empty(zero) => Ok(zero),
                    Checked::Payload(Payload::Primitive($p)) => $read,
                    Checked::Payload(_) => Err($decoder.incompatible::<Self>(value)),
                }
            }
        }

        impl IntoValue for $native {
            fn into_value(
                &self,
                ty: &ValueType,
                path: &Path,
            ) -> Result<DynamicValue, ConvertError> {
                if *ty != ValueType::$value_ty {
                    return Err(encode_mismatch($name, ty, path));
                }
                let $n = self;
                Ok($write)
            }
        }
    };
}

primitive_impl!(
    bool, "bool", Bool, false,
    |p, decoder| match p {
        planform_value::Primitive::Bool(b) => Ok(*b),
        _ => Err(decoder.incompatible::<bool>(&DynamicValue::primitive(p.clone()))),
    },
    |n| DynamicValue::bool(*n)
);

primitive_impl!(
    String, "String", String, String::new(),
    |p, decoder| match p {
        planform_value::Primitive::String(s) => Ok(s.clone()),
        _ => Err(decoder.incompatible::<String>(&DynamicValue::primitive(p.clone()))),
    },
    |n| DynamicValue::string(n.clone())
);

primitive_impl!(
    f64, "f64", Number, 0.0,
    |p, decoder| match p {
        planform_value::Primitive::Number(n) => Ok(n.as_f64()),
        _ => Err(decoder.incompatible::<f64>(&DynamicValue::primitive(p.clone()))),
    },
    |n| DynamicValue::float(*n)
);

primitive_impl!(
    i64, "i64", Number, 0,
    |p, decoder| match p {
        planform_value::Primitive::Number(n) => integer(n, decoder),
        _ => Err(decoder.incompatible::<i64>(&DynamicValue::primitive(p.clone()))),
    },
    |n| DynamicValue::int(*n)
);

primitive_impl!(
    i32, "i32", Number, 0,
    |p, decoder| match p {
        planform_value::Primitive::Number(n) => integer(n, decoder),
        _ => Err(decoder.incompatible::<i32>(&DynamicValue::primitive(p.clone()))),
    },
    |n| DynamicValue::int(i64::from(*n))
);

primitive_impl!(
    u32, "u32", Number, 0,
    |p, decoder| match p {
        planform_value::Primitive::Number(n) => integer(n, decoder),
        _ => Err(decoder.incompatible::<u32>(&DynamicValue::primitive(p.clone()))),
    },
    |n| DynamicValue::int(i64::from(*n))
);

/// Narrow a number into an integer target
fn integer<T>(number: &Number, decoder: &Decoder<'_>) -> Result<T, ConvertError>
where
    T: FromValue + TryFrom<i64>,
{
    number
        .as_i64()
        .and_then(|i| T::try_from(i).ok())
        .ok_or_else(|| ConvertError::OutOfRange {
            path: decoder.path().clone(),
            value: number.to_string(),
            target: T::target_name(),
        })
}

impl<T: FromValue> FromValue for Option<T> {
    fn target_name() -> String {
        format!("Option<{}>", T::target_name())
    }

    fn zero_value(_ty: &ValueType) -> Self {
        None
    }

    fn from_value(value: &DynamicValue, decoder: &mut Decoder<'_>) -> Result<Self, ConvertError> {
        match value.state() {
            ValueState::Null => Ok(None),
            ValueState::Unknown => decoder.unhandled_unknown(value),
            ValueState::Known(_) => T::from_value(value, decoder).map(Some),
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(&self, ty: &ValueType, path: &Path) -> Result<DynamicValue, ConvertError> {
        match self {
            Some(inner) => inner.into_value(ty, path),
            None => Ok(ty.zero_null()),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn target_name() -> String {
        format!("Vec<{}>", T::target_name())
    }

    fn zero_value(_ty: &ValueType) -> Self {
        Vec::new()
    }

    fn from_value(value: &DynamicValue, decoder: &mut Decoder<'_>) -> Result<Self, ConvertError> {
        let accepts = |ty: &ValueType| matches!(ty, ValueType::List(_) | ValueType::Set(_));
        match check::<Self>(value, decoder, accepts)? {
            Checked::Empty(zero) => Ok(zero),
            Checked::Payload(Payload::List(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| decoder.decode_child(PathStep::ElementKeyInt(i), item))
                .collect(),
            Checked::Payload(Payload::Set(members)) => members
                .iter()
                .map(|m| decoder.decode_child(PathStep::ElementKeyValue(m.clone()), m))
                .collect(),
            Checked::Payload(_) => Err(decoder.incompatible::<Self>(value)),
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(&self, ty: &ValueType, path: &Path) -> Result<DynamicValue, ConvertError> {
        self.as_slice().into_value(ty, path)
    }
}

impl<T: IntoValue> IntoValue for [T] {
    fn into_value(&self, ty: &ValueType, path: &Path) -> Result<DynamicValue, ConvertError> {
        match ty {
            ValueType::List(elem) => {
                let items = self
                    .iter()
                    .enumerate()
                    .map(|(i, item)| item.into_value(elem, &path.at_index(i)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(DynamicValue::list((**elem).clone(), items)?)
            }
            ValueType::Set(elem) => {
                let members = self
                    .iter()
                    .map(|item| item.into_value(elem, path))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(DynamicValue::set((**elem).clone(), members)?)
            }
            _ => Err(encode_mismatch("sequence", ty, path)),
        }
    }
}

fn decode_map<T, C>(value: &DynamicValue, decoder: &mut Decoder<'_>) -> Result<C, ConvertError>
where
    T: FromValue,
    C: FromValue + FromIterator<(String, T)>,
{
    let accepts = |ty: &ValueType| matches!(ty, ValueType::Map(_));
    match check::<C>(value, decoder, accepts)? {
        Checked::Empty(zero) => Ok(zero),
        Checked::Payload(Payload::Map(entries)) => entries
            .iter()
            .map(|(k, v)| {
                decoder
                    .decode_child(PathStep::ElementKeyString(k.clone()), v)
                    .map(|native| (k.clone(), native))
            })
            .collect(),
        Checked::Payload(_) => Err(decoder.incompatible::<C>(value)),
    }
}

fn encode_map<'a, T: IntoValue + 'a>(
    entries: impl Iterator<Item = (&'a String, &'a T)>,
    ty: &ValueType,
    path: &Path,
) -> Result<DynamicValue, ConvertError> {
    let ValueType::Map(elem) = ty else {
        return Err(encode_mismatch("map", ty, path));
    };
    let entries = entries
        .map(|(k, v)| v.into_value(elem, &path.at_key(k.clone())).map(|v| (k.clone(), v)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DynamicValue::map((**elem).clone(), entries)?)
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn target_name() -> String {
        format!("BTreeMap<String, {}>", T::target_name())
    }

    fn zero_value(_ty: &ValueType) -> Self {
        BTreeMap::new()
    }

    fn from_value(value: &DynamicValue, decoder: &mut Decoder<'_>) -> Result<Self, ConvertError> {
        decode_map::<T, Self>(value, decoder)
    }
}

impl<T: IntoValue> IntoValue for BTreeMap<String, T> {
    fn into_value(&self, ty: &ValueType, path: &Path) -> Result<DynamicValue, ConvertError> {
        encode_map(self.iter(), ty, path)
    }
}

impl<T: FromValue> FromValue for HashMap<String, T> {
    fn target_name() -> String {
        format!("HashMap<String, {}>", T::target_name())
    }

    fn zero_value(_ty: &ValueType) -> Self {
        HashMap::new()
    }

    fn from_value(value: &DynamicValue, decoder: &mut Decoder<'_>) -> Result<Self, ConvertError> {
        decode_map::<T, Self>(value, decoder)
    }
}

impl<T: IntoValue> IntoValue for HashMap<String, T> {
    fn into_value(&self, ty: &ValueType, path: &Path) -> Result<DynamicValue, ConvertError> {
        encode_map(self.iter(), ty, path)
    }
}

// Value box: accepts any resolved value un-narrowed
impl FromValue for DynamicValue {
    fn target_name() -> String {
        "DynamicValue".to_string()
    }

    fn zero_value(ty: &ValueType) -> Self {
        ty.zero_null()
    }

    fn from_value(value: &DynamicValue, _decoder: &mut Decoder<'_>) -> Result<Self, ConvertError> {
        Ok(value.clone())
    }
}

impl IntoValue for DynamicValue {
    fn into_value(&self, ty: &ValueType, path: &Path) -> Result<DynamicValue, ConvertError> {
        if self.ty() != ty {
            return Err(ConvertError::incompatible(
                path,
                "DynamicValue",
                format!("{ty} with a value of type {}", self.ty()),
            ));
        }
        Ok(self.clone())
    }
}

/// Native wrapper carrying the full null / unknown / known state
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Tri<T> {
    /// Value is absent
    #[default]
    Null,
    /// Value is not yet determined
    Unknown,
    /// Value is known
    Known(T),
}

impl<T> Tri<T> {
    /// Known value, if any
    #[inline]
    #[must_use]
    pub fn known(&self) -> Option<&T> {
        match self {
            Self::Known(value) => Some(value),
            _ => None,
        }
    }

    /// Check if null
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if unknown
    #[inline]
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl<T: FromValue> FromValue for Tri<T> {
    fn target_name() -> String {
        format!("Tri<{}>", T::target_name())
    }

    fn zero_value(_ty: &ValueType) -> Self {
        Self::Null
    }

    fn from_value(value: &DynamicValue, decoder: &mut Decoder<'_>) -> Result<Self, ConvertError> {
        match value.state() {
            ValueState::Null => Ok(Self::Null),
            ValueState::Unknown => Ok(Self::Unknown),
            ValueState::Known(_) => T::from_value(value, decoder).map(Self::Known),
        }
    }
}

impl<T: IntoValue> IntoValue for Tri<T> {
    fn into_value(&self, ty: &ValueType, path: &Path) -> Result<DynamicValue, ConvertError> {
        match self {
            Self::Null => Ok(ty.zero_null()),
            Self::Unknown => Ok(DynamicValue::unknown(ty.clone())),
            Self::Known(inner) => inner.into_value(ty, path),
        }
    }
}

impl<T: IntoValue + ?Sized> IntoValue for &T {
    fn into_value(&self, ty: &ValueType, path: &Path) -> Result<DynamicValue, ConvertError> {
        (**self).into_value(ty, path)
    }
}

impl IntoValue for str {
    fn into_value(&self, ty: &ValueType, path: &Path) -> Result<DynamicValue, ConvertError> {
        if *ty != ValueType::String {
            return Err(encode_mismatch("str", ty, path));
        }
        Ok(DynamicValue::string(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{from_dynamic, to_dynamic};
    use crate::MarshalOptions;

    #[test]
    fn scalars_decode() {
        assert!(from_dynamic::<bool>(&DynamicValue::bool(true)).unwrap());
        assert_eq!(from_dynamic::<String>(&DynamicValue::string("a")).unwrap(), "a");
        assert_eq!(from_dynamic::<i64>(&DynamicValue::int(-4)).unwrap(), -4);
        assert_eq!(from_dynamic::<f64>(&DynamicValue::float(1.5)).unwrap(), 1.5);
    }

    #[test]
    fn out_of_range_integer() {
        let err = from_dynamic::<u32>(&DynamicValue::int(-1)).unwrap_err();
        assert!(matches!(err, ConvertError::OutOfRange { .. }));
        let err = from_dynamic::<i64>(&DynamicValue::float(1.5)).unwrap_err();
        assert!(matches!(err, ConvertError::OutOfRange { .. }));
    }

    #[test]
    fn float_past_i64_max_is_out_of_range() {
        let two_pow_63 = DynamicValue::float(9_223_372_036_854_775_808.0);
        let err = from_dynamic::<i64>(&two_pow_63).unwrap_err();
        assert!(matches!(err, ConvertError::OutOfRange { .. }));

        let set = DynamicValue::set(ValueType::Number, [DynamicValue::int(i64::MAX), two_pow_63])
            .unwrap();
        assert_eq!(set.len(), Some(2));
    }

    #[test]
    fn scalar_from_object_is_incompatible() {
        let object = DynamicValue::object([("a", DynamicValue::bool(true))]);
        let err = from_dynamic::<String>(&object).unwrap_err();
        assert!(matches!(err, ConvertError::IncompatibleTarget { .. }));
    }

    #[test]
    fn null_needs_option_or_tri() {
        let null = DynamicValue::null(ValueType::String);
        assert!(matches!(
            from_dynamic::<String>(&null),
            Err(ConvertError::UnhandledNull { .. })
        ));
        assert_eq!(from_dynamic::<Option<String>>(&null).unwrap(), None);
        assert_eq!(from_dynamic::<Tri<String>>(&null).unwrap(), Tri::Null);
    }

    #[test]
    fn unknown_needs_tri() {
        let unknown = DynamicValue::unknown(ValueType::Bool);
        assert!(matches!(
            from_dynamic::<Option<bool>>(&unknown),
            Err(ConvertError::UnhandledUnknown { .. })
        ));
        assert_eq!(from_dynamic::<Tri<bool>>(&unknown).unwrap(), Tri::Unknown);
    }

    #[test]
    fn unhandled_as_empty_yields_zero() {
        let options = MarshalOptions {
            unhandled_null_as_empty: true,
            unhandled_unknown_as_empty: true,
            ..MarshalOptions::default()
        };
        let mut decoder = Decoder::new(None, options, Path::root());
        let n: i64 = decoder
            .decode(&DynamicValue::null(ValueType::Number))
            .unwrap();
        assert_eq!(n, 0);
        let v: Vec<String> = decoder
            .decode(&DynamicValue::unknown(ValueType::list(ValueType::String)))
            .unwrap();
        assert!(v.is_empty());
    }

    #[test]
    fn collections_round_trip() {
        let ty = ValueType::map(ValueType::list(ValueType::Number));
        let native: BTreeMap<String, Vec<i64>> =
            [("a".to_string(), vec![1, 2]), ("b".to_string(), vec![])]
                .into_iter()
                .collect();
        let value = to_dynamic(&native, &ty).unwrap();
        let back: BTreeMap<String, Vec<i64>> = from_dynamic(&value).unwrap();
        assert_eq!(back, native);
    }

    #[test]
    fn set_encoding_dedups() {
        let ty = ValueType::set(ValueType::String);
        let value = to_dynamic(&vec!["a", "b", "a"], &ty).unwrap();
        assert_eq!(value.len(), Some(2));
    }

    #[test]
    fn value_box_requires_matching_type() {
        let value = DynamicValue::string("x");
        assert_eq!(to_dynamic(&value, &ValueType::String).unwrap(), value);
        assert!(to_dynamic(&value, &ValueType::Bool).is_err());
        assert_eq!(from_dynamic::<DynamicValue>(&value).unwrap(), value);
    }

    #[test]
    fn element_errors_carry_the_element_path() {
        let value = DynamicValue::list(
            ValueType::Number,
            [DynamicValue::int(1), DynamicValue::float(0.5)],
        )
        .unwrap();
        let err = from_dynamic::<Vec<i32>>(&value).unwrap_err();
        let ConvertError::OutOfRange { path, .. } = err else {
            panic!("expected out of range, got {err:?}");
        };
        assert_eq!(path, Path::root().at_index(1));
    }
}
