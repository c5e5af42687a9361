//! Child object expansion shared by both walkers
//!
//! A nested attribute or block holds one or more objects depending on its
//! nesting mode. [`child_objects`] enumerates them as paths plus the
//! position used to find the matching object in another tree.

use planform_schema::{NestingMode, SchemaError, SchemaItem};
use planform_value::{Diagnostics, DynamicValue, Path, PathStep, ValueType};

/// Where a child object sits inside its collection
#[derive(Debug, Clone, PartialEq)]
pub enum Position {
    /// The value is the object (single nesting)
    Itself,
    /// Element at this index (list)
    Index(usize),
    /// Set member equal to this value
    Member(DynamicValue),
    /// Entry under this key (map)
    Key(String),
}

impl Position {
    /// Select the object at this position in `collection`
    #[must_use]
    pub fn select<'v>(&self, collection: &'v DynamicValue) -> Option<&'v DynamicValue> {
        match self {
            Self::Itself => Some(collection),
            Self::Index(i) => collection.child(&PathStep::ElementKeyInt(*i)),
            Self::Member(member) => collection.child(&PathStep::ElementKeyValue(member.clone())),
            Self::Key(key) => collection.child(&PathStep::ElementKeyString(key.clone())),
        }
    }
}

/// One object reached by expanding a nested attribute or block
#[derive(Debug, Clone, PartialEq)]
pub struct ChildObject {
    /// Path of the object
    pub path: Path,
    /// Position of the object in its collection
    pub position: Position,
}

impl ChildObject {
    /// Path of this object below `parent`, the possibly rebased path of the
    /// item holding it
    #[must_use]
    pub fn under(&self, parent: &Path) -> Path {
        match (&self.position, self.path.last_step()) {
            (Position::Itself, _) | (_, None) => parent.clone(),
            (_, Some(step)) => parent.child(step.clone()),
        }
    }
}

/// Enumerate the objects held by `value` under nesting `mode`
///
/// Null and unknown values hold no objects.
///
/// # Errors
/// Returns [`SchemaError::SchemaMismatch`] for [`NestingMode::Unknown`]
pub fn child_objects(
    mode: NestingMode,
    value: &DynamicValue,
    path: &Path,
) -> Result<Vec<ChildObject>, SchemaError> {
    let objects = match mode {
        NestingMode::Unknown => {
            return Err(SchemaError::schema_mismatch(
                path,
                "unrecognized nesting mode",
            ))
        }
        NestingMode::Single if value.is_known() => vec![ChildObject {
            path: path.clone(),
            position: Position::Itself,
        }],
        NestingMode::Single => Vec::new(),
        NestingMode::List => value
            .elements()
            .into_iter()
            .flatten()
            .enumerate()
            .map(|(i, _)| ChildObject {
                path: path.at_index(i),
                position: Position::Index(i),
            })
            .collect(),
        NestingMode::Set => value
            .elements()
            .into_iter()
            .flatten()
            .map(|member| ChildObject {
                path: path.at_value(member.clone()),
                position: Position::Member(member.clone()),
            })
            .collect(),
        NestingMode::Map => value
            .entries()
            .into_iter()
            .flatten()
            .map(|(key, _)| ChildObject {
                path: path.at_key(key.clone()),
                position: Position::Key(key.clone()),
            })
            .collect(),
    };
    Ok(objects)
}

/// Attribute `name` of the object at `position` in `collection`
///
/// Missing objects read as null of `ty`; objects under an unknown
/// collection read as unknown.
#[must_use]
pub fn member_value(
    collection: &DynamicValue,
    position: &Position,
    name: &str,
    ty: &ValueType,
) -> DynamicValue {
    if collection.is_unknown() {
        return DynamicValue::unknown(ty.clone());
    }
    match position.select(collection) {
        Some(object) if object.is_unknown() => DynamicValue::unknown(ty.clone()),
        Some(object) => object
            .attribute(name)
            .cloned()
            .unwrap_or_else(|| ty.zero_null()),
        None => ty.zero_null(),
    }
}

/// A nested item's place inside the value of its parent item
#[derive(Debug, Clone, Copy)]
pub(crate) struct Member<'v> {
    pub(crate) parent: &'v DynamicValue,
    pub(crate) position: &'v Position,
    pub(crate) name: &'v str,
}

impl Member<'_> {
    /// Resolve the value of `item`, which sits at `path`
    pub(crate) fn resolve(
        &self,
        item: SchemaItem<'_>,
        path: &Path,
        diagnostics: &mut Diagnostics,
    ) -> Option<DynamicValue> {
        match item.value_type(path) {
            Ok(ty) => Some(member_value(self.parent, self.position, self.name, &ty)),
            Err(err) => {
                diagnostics.push(err.to_diagnostic(path, "Invalid Attribute Definition"));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(id: &str) -> DynamicValue {
        DynamicValue::object([("id", DynamicValue::string(id))])
    }

    fn object_type() -> ValueType {
        ValueType::object([("id", ValueType::String)])
    }

    #[test]
    fn list_expands_by_index() {
        let list = DynamicValue::list(object_type(), [object("a"), object("b")]).unwrap();
        let root = Path::attr_root("items");
        let children = child_objects(NestingMode::List, &list, &root).unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[1].path, root.at_index(1));
        assert_eq!(
            member_value(&list, &children[1].position, "id", &ValueType::String),
            DynamicValue::string("b")
        );
    }

    #[test]
    fn set_expands_by_member() {
        let set = DynamicValue::set(object_type(), [object("a")]).unwrap();
        let root = Path::attr_root("items");
        let children = child_objects(NestingMode::Set, &set, &root).unwrap();
        assert_eq!(children[0].path, root.at_value(object("a")));
        assert_eq!(children[0].position, Position::Member(object("a")));
    }

    #[test]
    fn set_member_found_by_value_not_order() {
        let plan = DynamicValue::set(object_type(), [object("b"), object("a")]).unwrap();
        let state = DynamicValue::set(object_type(), [object("a"), object("b")]).unwrap();
        let children = child_objects(NestingMode::Set, &plan, &Path::attr_root("items")).unwrap();
        for child in &children {
            assert_eq!(
                member_value(&state, &child.position, "id", &ValueType::String),
                member_value(&plan, &child.position, "id", &ValueType::String)
            );
        }
        let missing = Position::Member(object("c"));
        assert_eq!(
            member_value(&state, &missing, "id", &ValueType::String),
            DynamicValue::null(ValueType::String)
        );
    }

    #[test]
    fn map_expands_by_key() {
        let map = DynamicValue::map(object_type(), [("k", object("a"))]).unwrap();
        let root = Path::attr_root("items");
        let children = child_objects(NestingMode::Map, &map, &root).unwrap();
        assert_eq!(children[0].path, root.at_key("k"));
        assert_eq!(children[0].position, Position::Key("k".into()));
    }

    #[test]
    fn single_expands_only_when_known() {
        let root = Path::attr_root("item");
        assert_eq!(
            child_objects(NestingMode::Single, &object("a"), &root)
                .unwrap()
                .len(),
            1
        );
        let null = DynamicValue::null(object_type());
        assert!(child_objects(NestingMode::Single, &null, &root)
            .unwrap()
            .is_empty());
        let unknown = DynamicValue::unknown(object_type());
        assert!(child_objects(NestingMode::Single, &unknown, &root)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn unknown_mode_is_schema_mismatch() {
        let err = child_objects(NestingMode::Unknown, &object("a"), &Path::attr_root("x"))
            .unwrap_err();
        assert!(matches!(err, SchemaError::SchemaMismatch { .. }));
    }

    #[test]
    fn missing_member_reads_null() {
        let list = DynamicValue::list(object_type(), [object("a")]).unwrap();
        let value = member_value(&list, &Position::Index(3), "id", &ValueType::String);
        assert_eq!(value, DynamicValue::null(ValueType::String));
        let unknown = DynamicValue::unknown(ValueType::list(object_type()));
        assert!(member_value(&unknown, &Position::Index(0), "id", &ValueType::String).is_unknown());
    }
}
