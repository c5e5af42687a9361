//! Native object shapes
//!
//! [`object_shape!`](crate::object_shape) declares a struct whose fields are
//! bound to object attribute names with a required `#[attr("name")]`
//! annotation, and derives [`FromValue`] / [`IntoValue`] for it.
//!
//! ```rust,ignore
//! planform_marshal::object_shape! {
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub struct Disk {
//!         #[attr("id")]
//!         pub id: String,
//!         #[attr("delete_with_instance")]
//!         pub delete_with_instance: Option<bool>,
//!     }
//! }
//! ```
//!
//! The binding annotation must come first on each field; doc comments and
//! other attributes follow it.

use planform_value::{Path, ValueType};

use crate::convert::{FromValue, IntoValue};
use crate::error::ConvertError;

/// Native struct bound to an object type by attribute name
pub trait ObjectShape: FromValue + IntoValue {
    /// Attribute names bound by this shape's fields, in field order
    const ATTRIBUTES: &'static [&'static str];
}

/// Zero form of a field typed from the object's attribute type
///
/// Falls back to the object type itself when `object_ty` is not an object.
#[doc(hidden)]
pub fn zero_field<T: FromValue>(object_ty: &ValueType, name: &str) -> T {
    match object_ty.attribute_types().and_then(|attrs| attrs.get(name)) {
        Some(ty) => T::zero_value(ty),
        None => T::zero_value(object_ty),
    }
}

/// Encode one field as the named attribute of `object_ty`
#[doc(hidden)]
pub fn encode_field<T: IntoValue + ?Sized>(
    field: &T,
    object_ty: &ValueType,
    name: &str,
    path: &Path,
) -> Result<(String, planform_value::DynamicValue), ConvertError> {
    let attr_path = path.attr(name);
    let ty = object_ty
        .attribute_types()
        .and_then(|attrs| attrs.get(name))
        .ok_or_else(|| {
            ConvertError::incompatible(
                path,
                format!("field bound to {name:?}"),
                format!("{object_ty}"),
            )
        })?;
    field
        .into_value(ty, &attr_path)
        .map(|value| (name.to_string(), value))
}

/// Declare a native struct bound to an object type
///
/// Every field carries `#[attr("name")]` as its first attribute.
#[macro_export]
macro_rules! object_shape {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                #[attr($attr:literal)]
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $fty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $fty,
            )*
        }

        impl $crate::ObjectShape for $name {
            const ATTRIBUTES: &'static [&'static str] = &[$($attr),*];
        }

        impl $crate::FromValue for $name {
            fn target_name() -> ::std::string::String {
                ::std::string::String::from(::std::stringify!($name))
            }

            fn zero_value(ty: &$crate::__private::ValueType) -> Self {
                Self {
                    $( $field: $crate::__private::zero_field::<$fty>(ty, $attr), )*
                }
            }

            fn from_value(
                value: &$crate::__private::DynamicValue,
                decoder: &mut $crate::Decoder<'_>,
            ) -> ::std::result::Result<Self, $crate::ConvertError> {
                let attributes = <Self as $crate::ObjectShape>::ATTRIBUTES;
                if !decoder.begin_object::<Self>(value, attributes)? {
                    return ::std::result::Result::Ok(
                        <Self as $crate::FromValue>::zero_value(value.ty()),
                    );
                }
                ::std::result::Result::Ok(Self {
                    $( $field: decoder.decode_attribute::<$fty>(value, $attr)?, )*
                })
            }
        }

        impl $crate::IntoValue for $name {
            fn into_value(
                &self,
                ty: &$crate::__private::ValueType,
                path: &$crate::__private::Path,
            ) -> ::std::result::Result<$crate::__private::DynamicValue, $crate::ConvertError> {
                let ::std::option::Option::Some(types) = ty.attribute_types() else {
                    return ::std::result::Result::Err($crate::ConvertError::incompatible(
                        path,
                        ::std::stringify!($name),
                        ::std::format!("{ty}"),
                    ));
                };
                $crate::check_shape_contract::<Self>(
                    types.keys().map(::std::string::String::as_str),
                    <Self as $crate::ObjectShape>::ATTRIBUTES,
                    path,
                )?;
                let attributes = ::std::vec![
                    $( $crate::__private::encode_field(&self.$field, ty, $attr, path)?, )*
                ];
                ::std::result::Result::Ok($crate::__private::DynamicValue::object_of(
                    ty.clone(),
                    attributes,
                )?)
            }
        }
    };
}
