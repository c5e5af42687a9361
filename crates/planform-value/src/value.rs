//! Tri-state dynamic values
//!
//! Provides [`DynamicValue`], the immutable, typed value tree exchanged
//! between the host and provider logic.
//!
//! # Invariants
//! - Every node carries its [`ValueType`], including null and unknown nodes
//! - A known payload always matches the node's type (checked on construction)
//! - Set payloads never hold two deeply-equal members
//!
//! Updates are persistent: [`DynamicValue::replace`] rebuilds only the nodes
//! along the path and shares every other subtree with the previous root
//! through `im` collections.

use std::fmt::{self, Display, Formatter};

use im::{OrdMap, Vector};

use crate::error::ValueError;
use crate::path::{Path, PathStep};
use crate::types::{Number, Primitive, ValueType};

/// Typed value node: null, unknown, or known
#[derive(Debug, Clone)]
pub struct DynamicValue {
    ty: ValueType,
    state: ValueState,
}

/// Null / unknown / known state of a node
#[derive(Debug, Clone)]
pub enum ValueState {
    /// Typed absence
    Null,

    /// Value determined later
    Unknown,

    /// Resolved payload
    Known(Payload),
}

/// Known payload
#[derive(Debug, Clone)]
pub enum Payload {
    /// Opaque leaf
    Primitive(Primitive),

    /// Ordered elements
    List(Vector<DynamicValue>),

    /// Deduplicated members, kept in insertion order
    Set(Vector<DynamicValue>),

    /// String-keyed entries
    Map(OrdMap<String, DynamicValue>),

    /// Named attributes, exactly the type's attribute set
    Object(OrdMap<String, DynamicValue>),
}

impl DynamicValue {
    /// Typed null
    #[inline]
    #[must_use]
    pub fn null(ty: ValueType) -> Self {
        Self {
            ty,
            state: ValueState::Null,
        }
    }

    /// Typed unknown
    #[inline]
    #[must_use]
    pub fn unknown(ty: ValueType) -> Self {
        Self {
            ty,
            state: ValueState::Unknown,
        }
    }

    /// Known value, validated against `ty`
    ///
    /// Set payloads are deduplicated.
    ///
    /// # Errors
    /// Returns [`ValueError::ShapeMismatch`] if the payload does not fit `ty`
    pub fn known(ty: ValueType, payload: Payload) -> Result<Self, ValueError> {
        let payload = check_payload(&ty, payload)?;
        Ok(Self {
            ty,
            state: ValueState::Known(payload),
        })
    }

    /// Known boolean
    #[inline]
    #[must_use]
    pub fn bool(value: bool) -> Self {
        Self::primitive(Primitive::Bool(value))
    }

    /// Known integer number
    #[inline]
    #[must_use]
    pub fn int(value: i64) -> Self {
        Self::primitive(Primitive::Number(Number::Int(value)))
    }

    /// Known floating point number
    #[inline]
    #[must_use]
    pub fn float(value: f64) -> Self {
        Self::primitive(Primitive::Number(Number::Float(value)))
    }

    /// Known string
    #[inline]
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::primitive(Primitive::String(value.into()))
    }

    /// Known primitive
    #[inline]
    #[must_use]
    pub fn primitive(value: Primitive) -> Self {
        Self {
            ty: value.value_type(),
            state: ValueState::Known(Payload::Primitive(value)),
        }
    }

    /// Known list of `elem`
    ///
    /// # Errors
    /// Returns error if any element is not of type `elem`
    pub fn list<I>(elem: ValueType, items: I) -> Result<Self, ValueError>
    where
        I: IntoIterator<Item = DynamicValue>,
    {
        Self::known(
            ValueType::list(elem),
            Payload::List(items.into_iter().collect()),
        )
    }

    /// Known set of `elem`, deduplicated
    ///
    /// # Errors
    /// Returns error if any member is not of type `elem`
    pub fn set<I>(elem: ValueType, items: I) -> Result<Self, ValueError>
    where
        I: IntoIterator<Item = DynamicValue>,
    {
        Self::known(
            ValueType::set(elem),
            Payload::Set(items.into_iter().collect()),
        )
    }

    /// Known map of `elem`
    ///
    /// # Errors
    /// Returns error if any entry is not of type `elem`
    pub fn map<I, K>(elem: ValueType, entries: I) -> Result<Self, ValueError>
    where
        I: IntoIterator<Item = (K, DynamicValue)>,
        K: Into<String>,
    {
        Self::known(
            ValueType::map(elem),
            Payload::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        )
    }

    /// Known object whose type is inferred from its attributes
    #[must_use]
    pub fn object<I, K>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, DynamicValue)>,
        K: Into<String>,
    {
        let attrs: OrdMap<String, DynamicValue> = attributes
            .into_iter()
            .map(|(k, v)| (k.into(), v))
            .collect();
        let ty = ValueType::object(attrs.iter().map(|(k, v)| (k.clone(), v.ty.clone())));
        Self {
            ty,
            state: ValueState::Known(Payload::Object(attrs)),
        }
    }

    /// Known object checked against an object type
    ///
    /// # Errors
    /// Returns error if attribute names or types differ from `ty`
    pub fn object_of<I, K>(ty: ValueType, attributes: I) -> Result<Self, ValueError>
    where
        I: IntoIterator<Item = (K, DynamicValue)>,
        K: Into<String>,
    {
        Self::known(
            ty,
            Payload::Object(
                attributes
                    .into_iter()
                    .map(|(k, v)| (k.into(), v))
                    .collect(),
            ),
        )
    }

    /// Known, empty value usable as a parent for child writes
    ///
    /// Collections start empty; objects start with every attribute null,
    /// or unknown when `unknown_children` is set.
    ///
    /// # Errors
    /// Returns error for primitive types, which cannot hold children
    pub fn empty_of(ty: &ValueType, unknown_children: bool) -> Result<Self, ValueError> {
        let payload = match ty {
            ValueType::List(_) => Payload::List(Vector::new()),
            ValueType::Set(_) => Payload::Set(Vector::new()),
            ValueType::Map(_) => Payload::Map(OrdMap::new()),
            ValueType::Object(attrs) => Payload::Object(
                attrs
                    .iter()
                    .map(|(name, attr_ty)| {
                        let child = if unknown_children {
                            Self::unknown(attr_ty.clone())
                        } else {
                            Self::null(attr_ty.clone())
                        };
                        (name.clone(), child)
                    })
                    .collect(),
            ),
            _ => {
                return Err(ValueError::shape_mismatch(
                    &Path::root(),
                    format!("{ty} cannot hold child values"),
                ))
            }
        };
        Ok(Self {
            ty: ty.clone(),
            state: ValueState::Known(payload),
        })
    }

    /// Declared type
    #[inline]
    #[must_use]
    pub fn ty(&self) -> &ValueType {
        &self.ty
    }

    /// Null / unknown / known state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &ValueState {
        &self.state
    }

    /// Known payload
    #[inline]
    #[must_use]
    pub fn payload(&self) -> Option<&Payload> {
        match &self.state {
            ValueState::Known(payload) => Some(payload),
            _ => None,
        }
    }

    /// Check if null
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self.state, ValueState::Null)
    }

    /// Check if unknown
    #[inline]
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self.state, ValueState::Unknown)
    }

    /// Check if known (neither null nor unknown)
    #[inline]
    #[must_use]
    pub fn is_known(&self) -> bool {
        matches!(self.state, ValueState::Known(_))
    }

    /// Check that no node in this tree is unknown
    #[must_use]
    pub fn is_fully_known(&self) -> bool {
        match &self.state {
            ValueState::Null => true,
            ValueState::Unknown => false,
            ValueState::Known(Payload::Primitive(_)) => true,
            ValueState::Known(Payload::List(items) | Payload::Set(items)) => {
                items.iter().all(Self::is_fully_known)
            }
            ValueState::Known(Payload::Map(entries) | Payload::Object(entries)) => {
                entries.values().all(Self::is_fully_known)
            }
        }
    }

    /// Primitive payload
    #[inline]
    #[must_use]
    pub fn as_primitive(&self) -> Option<&Primitive> {
        match &self.state {
            ValueState::Known(Payload::Primitive(p)) => Some(p),
            _ => None,
        }
    }

    /// String payload
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self.as_primitive() {
            Some(Primitive::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Boolean payload
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self.as_primitive() {
            Some(Primitive::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Number payload
    #[inline]
    #[must_use]
    pub fn as_number(&self) -> Option<Number> {
        match self.as_primitive() {
            Some(Primitive::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// List elements or set members
    #[inline]
    pub fn elements(&self) -> Option<impl Iterator<Item = &DynamicValue>> {
        match &self.state {
            ValueState::Known(Payload::List(items) | Payload::Set(items)) => Some(items.iter()),
            _ => None,
        }
    }

    /// Map entries or object attributes, ordered by key
    #[inline]
    pub fn entries(&self) -> Option<impl Iterator<Item = (&String, &DynamicValue)>> {
        match &self.state {
            ValueState::Known(Payload::Map(entries) | Payload::Object(entries)) => {
                Some(entries.iter())
            }
            _ => None,
        }
    }

    /// Object attribute by name
    #[inline]
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&DynamicValue> {
        match &self.state {
            ValueState::Known(Payload::Object(attrs)) => attrs.get(name),
            _ => None,
        }
    }

    /// Number of children of a known collection or object
    #[inline]
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        match &self.state {
            ValueState::Known(Payload::List(items) | Payload::Set(items)) => Some(items.len()),
            ValueState::Known(Payload::Map(entries) | Payload::Object(entries)) => {
                Some(entries.len())
            }
            _ => None,
        }
    }

    /// Check if a known collection or object has no children
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Apply a single step
    ///
    /// Returns `None` when this node is null or unknown, when the step kind
    /// does not fit the node, or when the addressed child does not exist.
    #[must_use]
    pub fn child(&self, step: &PathStep) -> Option<&DynamicValue> {
        let ValueState::Known(payload) = &self.state else {
            return None;
        };
        match (payload, step) {
            (Payload::List(items), PathStep::ElementKeyInt(index)) => items.get(*index),
            (Payload::Set(items), PathStep::ElementKeyValue(member)) => {
                items.iter().find(|m| *m == member)
            }
            (Payload::Map(entries), PathStep::ElementKeyString(key)) => entries.get(key),
            (Payload::Object(attrs), PathStep::AttributeName(name)) => attrs.get(name),
            _ => None,
        }
    }

    /// Resolve a path to a node
    ///
    /// # Errors
    /// Returns [`ValueError::PathNotFound`] naming the first step that does
    /// not resolve
    pub fn walk(&self, path: &Path) -> Result<&DynamicValue, ValueError> {
        let mut current = self;
        for step in path.iter() {
            current = current.child(step).ok_or_else(|| ValueError::PathNotFound {
                path: path.clone(),
                step: step.clone(),
            })?;
        }
        Ok(current)
    }

    /// Resolve a path to a node, or absent
    #[inline]
    #[must_use]
    pub fn resolve(&self, path: &Path) -> Option<&DynamicValue> {
        self.walk(path).ok()
    }

    /// Replace the subtree at `path`, returning the new root
    ///
    /// `self` is left untouched; the new root shares every subtree not on
    /// `path` with it.
    ///
    /// # Errors
    /// - [`ValueError::PathNotFound`] if a step does not resolve
    /// - [`ValueError::TypeMismatch`] if `value` has a different type than
    ///   the node it replaces
    pub fn replace(&self, path: &Path, value: DynamicValue) -> Result<DynamicValue, ValueError> {
        self.replace_tracking(path, value).map(|(root, _)| root)
    }

    /// Replace the subtree at `path`, returning the new root and the path
    /// that now addresses the replaced node
    ///
    /// The returned path differs from `path` only when a set member on the
    /// path changed: its value step is rewritten to the member's new value.
    ///
    /// # Errors
    /// Same as [`DynamicValue::replace`]
    pub fn replace_tracking(
        &self,
        path: &Path,
        value: DynamicValue,
    ) -> Result<(DynamicValue, Path), ValueError> {
        let (root, mut steps) = self.replace_steps(path.steps(), path, value)?;
        steps.reverse();
        Ok((root, Path::new(steps)))
    }

    /// Recursive worker for [`DynamicValue::replace_tracking`]; rebased
    /// steps are returned leaf-first.
    fn replace_steps(
        &self,
        steps: &[PathStep],
        full: &Path,
        value: DynamicValue,
    ) -> Result<(DynamicValue, Vec<PathStep>), ValueError> {
        let Some((step, rest)) = steps.split_first() else {
            if value.ty != self.ty {
                return Err(ValueError::TypeMismatch {
                    path: full.clone(),
                    expected: self.ty.clone(),
                    actual: value.ty,
                });
            }
            return Ok((value, Vec::new()));
        };

        let child = self.child(step).ok_or_else(|| ValueError::PathNotFound {
            path: full.clone(),
            step: step.clone(),
        })?;
        let (new_child, mut rebased) = child.replace_steps(rest, full, value)?;
        let (new_self, new_step) = self.with_child(step, new_child);
        rebased.push(new_step);
        Ok((new_self, rebased))
    }

    /// Rebuild this node with the child at an existing `step` swapped out
    fn with_child(&self, step: &PathStep, child: DynamicValue) -> (DynamicValue, PathStep) {
        let ValueState::Known(payload) = &self.state else {
            return (self.clone(), step.clone());
        };
        let (payload, step) = match (payload, step) {
            (Payload::List(items), PathStep::ElementKeyInt(index)) => (
                Payload::List(items.update(*index, child)),
                step.clone(),
            ),
            (Payload::Set(items), PathStep::ElementKeyValue(old)) => {
                let mut items = items.clone();
                items.retain(|m| m != old);
                let new_step = PathStep::ElementKeyValue(child.clone());
                set_insert(&mut items, child);
                (Payload::Set(items), new_step)
            }
            (Payload::Map(entries), PathStep::ElementKeyString(key)) => (
                Payload::Map(entries.update(key.clone(), child)),
                step.clone(),
            ),
            (Payload::Object(attrs), PathStep::AttributeName(name)) => (
                Payload::Object(attrs.update(name.clone(), child)),
                step.clone(),
            ),
            _ => return (self.clone(), step.clone()),
        };
        (
            Self {
                ty: self.ty.clone(),
                state: ValueState::Known(payload),
            },
            step,
        )
    }

    /// Insert or overwrite the child addressed by `step`
    ///
    /// - Lists accept an existing index or exactly the current length
    /// - Maps accept any key
    /// - Sets add the member, or swap out an equal member
    /// - Objects accept any attribute declared by the type
    ///
    /// `path` is the path of this node, used for error attribution. Returns
    /// the new node and the step that now addresses the child.
    ///
    /// # Errors
    /// - [`ValueError::AmbiguousInsert`] for list writes past the end
    /// - [`ValueError::TypeMismatch`] if `child` has the wrong type
    /// - [`ValueError::PathNotFound`] if the step does not fit this node
    pub fn upsert_child(
        &self,
        path: &Path,
        step: &PathStep,
        child: DynamicValue,
    ) -> Result<(DynamicValue, PathStep), ValueError> {
        let not_found = || ValueError::PathNotFound {
            path: path.child(step.clone()),
            step: step.clone(),
        };

        let ValueState::Known(payload) = &self.state else {
            return Err(not_found());
        };
        let expected = self.ty.step_type(step).ok_or_else(not_found)?;
        if *expected != child.ty {
            return Err(ValueError::TypeMismatch {
                path: path.child(step.clone()),
                expected: expected.clone(),
                actual: child.ty,
            });
        }

        let (payload, new_step) = match (payload, step) {
            (Payload::List(items), PathStep::ElementKeyInt(index)) => {
                let length = items.len();
                let mut items = items.clone();
                if *index < length {
                    items = items.update(*index, child);
                } else if *index == length {
                    items.push_back(child);
                } else {
                    return Err(ValueError::AmbiguousInsert {
                        path: path.child(step.clone()),
                        index: *index,
                        length,
                    });
                }
                (Payload::List(items), step.clone())
            }
            (Payload::Set(items), PathStep::ElementKeyValue(old)) => {
                let mut items = items.clone();
                items.retain(|m| m != old);
                let new_step = PathStep::ElementKeyValue(child.clone());
                set_insert(&mut items, child);
                (Payload::Set(items), new_step)
            }
            (Payload::Map(entries), PathStep::ElementKeyString(key)) => (
                Payload::Map(entries.update(key.clone(), child)),
                step.clone(),
            ),
            (Payload::Object(attrs), PathStep::AttributeName(name)) => (
                Payload::Object(attrs.update(name.clone(), child)),
                step.clone(),
            ),
            _ => return Err(not_found()),
        };

        Ok((
            Self {
                ty: self.ty.clone(),
                state: ValueState::Known(payload),
            },
            new_step,
        ))
    }
}

impl ValueType {
    /// Type of the child addressed by `step`, if the step fits this type
    #[must_use]
    pub fn step_type(&self, step: &PathStep) -> Option<&ValueType> {
        match (self, step) {
            (Self::List(elem), PathStep::ElementKeyInt(_))
            | (Self::Set(elem), PathStep::ElementKeyValue(_))
            | (Self::Map(elem), PathStep::ElementKeyString(_)) => Some(&**elem),
            (Self::Object(attrs), PathStep::AttributeName(name)) => attrs.get(name),
            _ => None,
        }
    }

    /// Typed null of this type
    #[inline]
    #[must_use]
    pub fn zero_null(&self) -> DynamicValue {
        DynamicValue::null(self.clone())
    }
}

/// Add a member unless a deeply-equal one is present
fn set_insert(items: &mut Vector<DynamicValue>, member: DynamicValue) {
    if !items.iter().any(|m| *m == member) {
        items.push_back(member);
    }
}

/// Validate a payload against its declared type, deduplicating sets
fn check_payload(ty: &ValueType, payload: Payload) -> Result<Payload, ValueError> {
    let root = Path::root();
    let child_mismatch = |what: &str, expected: &ValueType, actual: &ValueType| {
        ValueError::shape_mismatch(
            &root,
            format!("{what} of type {actual} does not match {expected}"),
        )
    };

    match (ty, payload) {
        (_, Payload::Primitive(p)) => {
            if p.value_type() == *ty {
                Ok(Payload::Primitive(p))
            } else {
                Err(ValueError::shape_mismatch(
                    &root,
                    format!("{} payload for type {ty}", p.value_type()),
                ))
            }
        }
        (ValueType::List(elem), Payload::List(items)) => {
            if let Some(bad) = items.iter().find(|v| v.ty != **elem) {
                return Err(child_mismatch("list element", &**elem, &bad.ty));
            }
            Ok(Payload::List(items))
        }
        (ValueType::Set(elem), Payload::Set(items)) => {
            let mut deduped = Vector::new();
            for member in items {
                if member.ty != **elem {
                    return Err(child_mismatch("set member", &**elem, &member.ty));
                }
                set_insert(&mut deduped, member);
            }
            Ok(Payload::Set(deduped))
        }
        (ValueType::Map(elem), Payload::Map(entries)) => {
            if let Some(bad) = entries.values().find(|v| v.ty != **elem) {
                return Err(child_mismatch("map entry", &**elem, &bad.ty));
            }
            Ok(Payload::Map(entries))
        }
        (ValueType::Object(types), Payload::Object(attrs)) => {
            if types.len() != attrs.len() || types.keys().any(|k| !attrs.contains_key(k)) {
                return Err(ValueError::shape_mismatch(
                    &root,
                    format!(
                        "object attributes [{}] do not match {ty}",
                        attrs.keys().cloned().collect::<Vec<_>>().join(", ")
                    ),
                ));
            }
            for (name, attr_ty) in types.iter() {
                if let Some(v) = attrs.get(name) {
                    if v.ty != *attr_ty {
                        return Err(child_mismatch(
                            &format!("attribute {name:?}"),
                            attr_ty,
                            &v.ty,
                        ));
                    }
                }
            }
            Ok(Payload::Object(attrs))
        }
        (ty, _) => Err(ValueError::shape_mismatch(
            &root,
            format!("payload kind does not match {ty}"),
        )),
    }
}

impl PartialEq for DynamicValue {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty
            && match (&self.state, &other.state) {
                (ValueState::Null, ValueState::Null)
                | (ValueState::Unknown, ValueState::Unknown) => true,
                (ValueState::Known(a), ValueState::Known(b)) => a == b,
                _ => false,
            }
    }
}

impl Eq for DynamicValue {}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Primitive(a), Self::Primitive(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            // members are unique, so equal length plus containment is set equality
            (Self::Set(a), Self::Set(b)) => {
                a.len() == b.len() && a.iter().all(|m| b.iter().any(|n| n == m))
            }
            (Self::Map(a), Self::Map(b)) | (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Payload {}

impl Display for DynamicValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.state {
            ValueState::Null => f.write_str("null"),
            ValueState::Unknown => f.write_str("unknown"),
            ValueState::Known(Payload::Primitive(p)) => write!(f, "{p}"),
            ValueState::Known(Payload::List(items) | Payload::Set(items)) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            ValueState::Known(Payload::Map(entries)) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key:?}: {value}")?;
                }
                f.write_str("}")
            }
            ValueState::Known(Payload::Object(attrs)) => {
                f.write_str("{")?;
                for (i, (name, value)) in attrs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}
