//! Attribute paths
//!
//! Provides [`Path`] for addressing a node in both an attribute tree and a
//! matching value tree.

use std::fmt::{self, Display, Formatter};

use crate::value::DynamicValue;

/// One addressing step within a [`Path`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    /// Named attribute of an object (or of the schema root)
    AttributeName(String),

    /// Position within a list
    ElementKeyInt(usize),

    /// Key within a map
    ElementKeyString(String),

    /// Member of a set, matched by deep value equality
    ElementKeyValue(DynamicValue),
}

impl PathStep {
    /// Check if this step addresses a collection element
    #[inline]
    #[must_use]
    pub fn is_element(&self) -> bool {
        !matches!(self, Self::AttributeName(_))
    }
}

impl Display for PathStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttributeName(name) => f.write_str(name),
            Self::ElementKeyInt(index) => write!(f, "[{index}]"),
            Self::ElementKeyString(key) => write!(f, "[{key:?}]"),
            Self::ElementKeyValue(value) => write!(f, "[Value({value})]"),
        }
    }
}

/// Ordered sequence of steps from the root
///
/// # Examples
/// - `disks[1].id`
/// - `tags["env"]`
/// - `rules[Value({port: 22})].cidr`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Path(Vec<PathStep>);

impl Path {
    /// Empty path (root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path with a single attribute step
    #[inline]
    #[must_use]
    pub fn attr_root(name: impl Into<String>) -> Self {
        Self(vec![PathStep::AttributeName(name.into())])
    }

    /// Create path from steps
    #[inline]
    #[must_use]
    pub fn new(steps: Vec<PathStep>) -> Self {
        Self(steps)
    }

    /// Append an attribute step, returning new path
    #[inline]
    #[must_use]
    pub fn attr(&self, name: impl Into<String>) -> Self {
        self.child(PathStep::AttributeName(name.into()))
    }

    /// Append a list index step, returning new path
    #[inline]
    #[must_use]
    pub fn at_index(&self, index: usize) -> Self {
        self.child(PathStep::ElementKeyInt(index))
    }

    /// Append a map key step, returning new path
    #[inline]
    #[must_use]
    pub fn at_key(&self, key: impl Into<String>) -> Self {
        self.child(PathStep::ElementKeyString(key.into()))
    }

    /// Append a set member step, returning new path
    #[inline]
    #[must_use]
    pub fn at_value(&self, value: DynamicValue) -> Self {
        self.child(PathStep::ElementKeyValue(value))
    }

    /// Append any step, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, step: PathStep) -> Self {
        let mut new = self.clone();
        new.0.push(step);
        new
    }

    /// Get path steps
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    /// Get number of steps
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty (root)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get parent path (if not root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Get last step (if not root)
    #[inline]
    #[must_use]
    pub fn last_step(&self) -> Option<&PathStep> {
        self.0.last()
    }

    /// Check if this path is a prefix of another
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.0.len() <= other.0.len() && self.0 == other.0[..self.0.len()]
    }

    /// Iterator over steps from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &PathStep> {
        self.0.iter()
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 && !step.is_element() {
                f.write_str(".")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

impl From<Vec<PathStep>> for Path {
    fn from(steps: Vec<PathStep>) -> Self {
        Self(steps)
    }
}

impl FromIterator<PathStep> for Path {
    fn from_iter<I: IntoIterator<Item = PathStep>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
