//! Config, Plan and State containers
//!
//! Each container pairs one [`DynamicValue`] root with the [`Schema`]
//! describing it. Reads resolve a path against both at once; writes
//! (Plan and State only) encode a native value for the schema type at the
//! path and upsert it, creating missing parents on the way down.
//!
//! Config reads treat a missing collection position as a read error since
//! configuration is never partially computed. Plan and State reads return a
//! typed null for the same position.

use std::fmt;
use std::sync::Arc;

use planform_schema::Schema;
use planform_value::{
    Diagnostic, DiagnosticKind, Diagnostics, DynamicValue, Path, PathStep, ValueError, ValueState,
    ValueType,
};

use crate::convert::{Decoder, FromValue, IntoValue};
use crate::error::ConvertError;
use crate::options::MarshalOptions;

/// Which evaluation tree a container holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    /// Practitioner configuration
    Config,
    /// Proposed new state
    Plan,
    /// Prior or applied state
    State,
}

impl DataKind {
    /// Summary for read diagnostics
    fn read_summary(self) -> &'static str {
        match self {
            Self::Config => "Config Read Error",
            Self::Plan => "Plan Read Error",
            Self::State => "State Read Error",
        }
    }

    /// Summary for write diagnostics
    fn write_summary(self) -> &'static str {
        match self {
            Self::Config => "Config Write Error",
            Self::Plan => "Plan Write Error",
            Self::State => "State Write Error",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => write!(f, "config"),
            Self::Plan => write!(f, "plan"),
            Self::State => write!(f, "state"),
        }
    }
}

/// Shared container implementation
#[derive(Debug, Clone)]
struct Data {
    kind: DataKind,
    schema: Arc<Schema>,
    raw: DynamicValue,
    options: MarshalOptions,
}

impl Data {
    fn new(kind: DataKind, schema: Arc<Schema>, raw: DynamicValue) -> Result<Self, ConvertError> {
        let expected = schema.value_type()?;
        if *raw.ty() != expected {
            return Err(ConvertError::Value(ValueError::TypeMismatch {
                path: Path::root(),
                expected,
                actual: raw.ty().clone(),
            }));
        }
        Ok(Self {
            kind,
            schema,
            raw,
            options: MarshalOptions::default(),
        })
    }

    fn null(kind: DataKind, schema: Arc<Schema>) -> Result<Self, ConvertError> {
        let ty = schema.value_type()?;
        Self::new(kind, schema, DynamicValue::null(ty))
    }

    fn read_error(&self, path: &Path, detail: impl Into<String>) -> Diagnostic {
        Diagnostic::error(DiagnosticKind::ReadError, self.kind.read_summary(), detail)
            .with_path(path.clone())
    }

    fn type_at(&self, path: &Path, summary: &str) -> Result<ValueType, Diagnostic> {
        self.schema
            .type_at(path)
            .and_then(|node| node.value_type(path))
            .map_err(|err| err.to_diagnostic(path, summary))
    }

    fn get_attribute(&self, path: &Path) -> Result<DynamicValue, Diagnostic> {
        let ty = self.type_at(path, self.kind.read_summary())?;

        let mut current = &self.raw;
        for (depth, step) in path.iter().enumerate() {
            match current.state() {
                ValueState::Null => return Ok(ty.zero_null()),
                ValueState::Unknown => return Ok(DynamicValue::unknown(ty)),
                ValueState::Known(_) => {}
            }
            if let Some(child) = current.child(step) {
                current = child;
                continue;
            }

            let at: Path = path.steps()[..depth].iter().cloned().collect();
            if step.is_element() && self.kind != DataKind::Config {
                tracing::trace!(
                    path = %path,
                    missing = %step,
                    "unmaterialized position, reading null"
                );
                return Ok(ty.zero_null());
            }
            return Err(self.read_error(
                path,
                format!("{} has no element {step} at {at}", self.kind),
            ));
        }
        Ok(current.clone())
    }

    fn get_at<T: FromValue>(&self, path: &Path, diagnostics: &mut Diagnostics) -> Option<T> {
        let value = match self.get_attribute(path) {
            Ok(value) => value,
            Err(diag) => {
                diagnostics.push(diag);
                return None;
            }
        };

        let mut decoder = Decoder::new(Some(self.schema.as_ref()), self.options, path.clone());
        let result = decoder.decode::<T>(&value);
        diagnostics.append(decoder.finish());
        match result {
            Ok(native) => Some(native),
            Err(err) => {
                diagnostics.push(err.to_diagnostic(path, "Value Conversion Error"));
                None
            }
        }
    }

    fn path_exists(&self, path: &Path) -> bool {
        if path.is_empty() {
            return true;
        }
        if !self.raw.is_known() {
            return false;
        }
        self.schema.type_at(path).is_ok() && self.raw.resolve(path).is_some()
    }

    fn set_attribute_value(
        &mut self,
        path: &Path,
        value: DynamicValue,
    ) -> Result<Path, Diagnostic> {
        let summary = self.kind.write_summary();
        let ty = self.type_at(path, summary)?;
        if *value.ty() != ty {
            return Err(ValueError::TypeMismatch {
                path: path.clone(),
                expected: ty,
                actual: value.ty().clone(),
            }
            .to_diagnostic(path, summary));
        }

        let (raw, steps) = upsert(&self.raw, path.steps(), &Path::root(), value)
            .map_err(|err| err.to_diagnostic(path, summary))?;
        self.raw = raw;
        let written = Path::new(steps);
        tracing::trace!(kind = %self.kind, path = %written, "wrote value");
        Ok(written)
    }

    fn set_attribute<T: IntoValue + ?Sized>(&mut self, path: &Path, native: &T) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        let ty = match self.type_at(path, self.kind.write_summary()) {
            Ok(ty) => ty,
            Err(diag) => {
                diagnostics.push(diag);
                return diagnostics;
            }
        };
        let value = match native.into_value(&ty, path) {
            Ok(value) => value,
            Err(err) => {
                diagnostics.push(err.to_diagnostic(path, "Value Conversion Error"));
                return diagnostics;
            }
        };
        if let Err(diag) = self.set_attribute_value(path, value) {
            diagnostics.push(diag);
        }
        diagnostics
    }
}

/// Write `value` at `steps` below `node`, returning the new node and the
/// steps to the written value (set member steps follow the new member)
fn upsert(
    node: &DynamicValue,
    steps: &[PathStep],
    at: &Path,
    value: DynamicValue,
) -> Result<(DynamicValue, Vec<PathStep>), ValueError> {
    let Some((step, rest)) = steps.split_first() else {
        return Ok((value, Vec::new()));
    };

    let parent = if node.is_known() {
        node.clone()
    } else {
        DynamicValue::empty_of(node.ty(), node.is_unknown()).map_err(|_| {
            ValueError::PathNotFound {
                path: at.child(step.clone()),
                step: step.clone(),
            }
        })?
    };
    let child_ty = parent
        .ty()
        .step_type(step)
        .ok_or_else(|| ValueError::PathNotFound {
            path: at.child(step.clone()),
            step: step.clone(),
        })?;
    let current = parent
        .child(step)
        .cloned()
        .unwrap_or_else(|| child_ty.zero_null());

    let (child, mut tail) = upsert(&current, rest, &at.child(step.clone()), value)?;
    let (parent, new_step) = parent.upsert_child(at, step, child)?;

    let mut written = Vec::with_capacity(tail.len() + 1);
    written.push(new_step);
    written.append(&mut tail);
    Ok((parent, written))
}

macro_rules! container {
    ($(#[$meta:meta])* $name:ident, $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name(Data);

        impl $name {
            /// Pair `raw` with `schema`
            ///
            /// # Errors
            /// Returns error if the schema has no resolvable type or `raw`
            /// is not of that type
            pub fn new(schema: Arc<Schema>, raw: DynamicValue) -> Result<Self, ConvertError> {
                Data::new(DataKind::$kind, schema, raw).map(Self)
            }

            /// Container whose root is typed null
            ///
            /// # Errors
            /// Returns error if the schema has no resolvable type
            pub fn null(schema: Arc<Schema>) -> Result<Self, ConvertError> {
                Data::null(DataKind::$kind, schema).map(Self)
            }

            /// Replace marshaling options
            #[must_use]
            pub fn with_options(mut self, options: MarshalOptions) -> Self {
                self.0.options = options;
                self
            }

            /// Container kind
            #[inline]
            #[must_use]
            pub fn kind(&self) -> DataKind {
                self.0.kind
            }

            /// Root value
            #[inline]
            #[must_use]
            pub fn raw(&self) -> &DynamicValue {
                &self.0.raw
            }

            /// Consume into the root value
            #[inline]
            #[must_use]
            pub fn into_raw(self) -> DynamicValue {
                self.0.raw
            }

            /// Describing schema
            #[inline]
            #[must_use]
            pub fn schema(&self) -> &Arc<Schema> {
                &self.0.schema
            }

            /// Decode the whole root into `T`
            ///
            /// Errors and hook warnings are appended to `diagnostics`.
            pub fn get<T: FromValue>(&self, diagnostics: &mut Diagnostics) -> Option<T> {
                self.0.get_at(&Path::root(), diagnostics)
            }

            /// Decode the value at `path` into `T`
            ///
            /// Errors and hook warnings are appended to `diagnostics`.
            pub fn get_at<T: FromValue>(
                &self,
                path: &Path,
                diagnostics: &mut Diagnostics,
            ) -> Option<T> {
                self.0.get_at(path, diagnostics)
            }

            /// Resolve the value at `path`
            pub fn get_attribute(
                &self,
                path: &Path,
                diagnostics: &mut Diagnostics,
            ) -> Option<DynamicValue> {
                match self.0.get_attribute(path) {
                    Ok(value) => Some(value),
                    Err(diag) => {
                        diagnostics.push(diag);
                        None
                    }
                }
            }

            /// Check that `path` resolves against both schema and value
            #[must_use]
            pub fn path_exists(&self, path: &Path) -> bool {
                self.0.path_exists(path)
            }
        }
    };
}

macro_rules! writable {
    ($name:ident) => {
        impl $name {
            /// Encode `native` as the whole root
            pub fn set<T: IntoValue + ?Sized>(&mut self, native: &T) -> Diagnostics {
                self.0.set_attribute(&Path::root(), native)
            }

            /// Encode `native` for the schema type at `path` and write it
            pub fn set_attribute<T: IntoValue + ?Sized>(
                &mut self,
                path: &Path,
                native: &T,
            ) -> Diagnostics {
                self.0.set_attribute(path, native)
            }

            /// Write a dynamic value at `path`
            ///
            /// Returns the path of the written value, which differs from
            /// `path` when a set member was replaced.
            ///
            /// # Errors
            /// Returns a diagnostic if the path does not resolve, the
            /// value's type disagrees with the schema, or a list write is
            /// ambiguous
            pub fn set_attribute_value(
                &mut self,
                path: &Path,
                value: DynamicValue,
            ) -> Result<Path, Diagnostic> {
                self.0.set_attribute_value(path, value)
            }
        }
    };
}

container!(
    /// Practitioner configuration, read-only
    Config,
    Config
);
container!(
    /// Proposed new state
    Plan,
    Plan
);
container!(
    /// Prior or applied state
    State,
    State
);

writable!(Plan);
writable!(State);

impl State {
    /// Mark the resource as removed by setting the root to typed null
    pub fn remove_resource(&mut self) {
        self.0.raw = self.0.raw.ty().zero_null();
    }
}

#[cfg(test)]
mod tests {
    use planform_schema::{Attribute, NestedAttributes};
    use pretty_assertions::assert_eq;

    use super::*;

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new([
            ("name", Attribute::leaf(ValueType::String).required()),
            (
                "tags",
                Attribute::leaf(ValueType::list(ValueType::String)).optional(),
            ),
            (
                "labels",
                Attribute::nested(NestedAttributes::map([(
                    "value",
                    Attribute::leaf(ValueType::String).optional(),
                )]))
                .optional(),
            ),
        ]))
    }

    fn root() -> DynamicValue {
        let ty = schema().value_type().unwrap();
        DynamicValue::object_of(
            ty.clone(),
            [
                ("name", DynamicValue::string("web")),
                (
                    "tags",
                    DynamicValue::list(ValueType::String, [DynamicValue::string("a")]).unwrap(),
                ),
                (
                    "labels",
                    ty.attribute_types().unwrap()["labels"].zero_null(),
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn rejects_root_of_wrong_type() {
        assert!(Config::new(schema(), DynamicValue::string("x")).is_err());
    }

    #[test]
    fn missing_position_is_config_error_but_plan_null() {
        let path = Path::attr_root("tags").at_index(3);
        let config = Config::new(schema(), root()).unwrap();
        let mut diags = Diagnostics::new();
        assert!(config.get_attribute(&path, &mut diags).is_none());
        assert_eq!(diags.errors().next().unwrap().kind(), DiagnosticKind::ReadError);

        let plan = Plan::new(schema(), root()).unwrap();
        let mut diags = Diagnostics::new();
        let value = plan.get_attribute(&path, &mut diags).unwrap();
        assert_eq!(value, DynamicValue::null(ValueType::String));
        assert!(diags.is_empty());
    }

    #[test]
    fn null_parent_reads_typed_null() {
        let config = Config::new(schema(), root()).unwrap();
        let mut diags = Diagnostics::new();
        let value = config
            .get_attribute(&Path::attr_root("labels").at_key("x").attr("value"), &mut diags)
            .unwrap();
        assert_eq!(value, DynamicValue::null(ValueType::String));
        assert!(diags.is_empty());
    }

    #[test]
    fn undeclared_path_is_schema_mismatch() {
        let config = Config::new(schema(), root()).unwrap();
        let mut diags = Diagnostics::new();
        assert!(config
            .get_attribute(&Path::attr_root("nope"), &mut diags)
            .is_none());
        assert_eq!(
            diags.iter().next().unwrap().kind(),
            DiagnosticKind::SchemaMismatch
        );
    }

    #[test]
    fn write_creates_null_parents() {
        let mut plan = Plan::new(schema(), root()).unwrap();
        let path = Path::attr_root("labels").at_key("env").attr("value");
        let diags = plan.set_attribute(&path, "prod");
        assert!(diags.is_empty(), "{diags:?}");
        let mut diags = Diagnostics::new();
        let value: String = plan.get_at(&path, &mut diags).unwrap();
        assert_eq!(value, "prod");
    }

    #[test]
    fn write_type_mismatch() {
        let mut plan = Plan::new(schema(), root()).unwrap();
        let err = plan
            .set_attribute_value(&Path::attr_root("name"), DynamicValue::bool(true))
            .unwrap_err();
        assert_eq!(err.kind(), DiagnosticKind::TypeMismatch);
    }

    #[test]
    fn remove_resource_nulls_root() {
        let mut state = State::new(schema(), root()).unwrap();
        state.remove_resource();
        assert!(state.raw().is_null());
        assert!(state.path_exists(&Path::root()));
        assert!(!state.path_exists(&Path::attr_root("name")));
    }
}
