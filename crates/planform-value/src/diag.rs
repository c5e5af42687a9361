//! Path-attributed diagnostics
//!
//! Walkers and marshaling never throw: every problem is recorded as a
//! [`Diagnostic`] in a [`Diagnostics`] accumulator owned by one walk.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::path::Path;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Evaluation of the affected attribute cannot be trusted
    Error,

    /// Informational, evaluation continues unchanged
    Warning,
}

/// Classification of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Schema authoring bug
    InvalidDefinition,

    /// Path does not correspond to declared structure
    SchemaMismatch,

    /// Value could not be resolved
    ReadError,

    /// Value could not be converted to or from a native shape
    ConversionError,

    /// List write beyond the next free index
    AmbiguousInsert,

    /// Value shape disagrees with declared type
    TypeMismatch,

    /// Emitted by an attribute validator or type validation hook
    Validation,

    /// Emitted by a plan modifier
    PlanModification,

    /// Deprecated attribute or schema in use
    Deprecated,

    /// Anything else
    Custom,
}

/// Error or warning, optionally attributed to a path
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    severity: Severity,
    kind: DiagnosticKind,
    summary: String,
    detail: String,
    path: Option<Path>,
}

impl Diagnostic {
    /// Create error diagnostic
    #[must_use]
    pub fn error(
        kind: DiagnosticKind,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            summary: summary.into(),
            detail: detail.into(),
            path: None,
        }
    }

    /// Create warning diagnostic
    #[must_use]
    pub fn warning(
        kind: DiagnosticKind,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            summary: summary.into(),
            detail: detail.into(),
            path: None,
        }
    }

    /// Attribute to a path
    #[inline]
    #[must_use]
    pub fn with_path(mut self, path: Path) -> Self {
        self.path = Some(path);
        self
    }

    /// Severity
    #[inline]
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    /// Short summary
    #[inline]
    #[must_use]
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Longer detail
    #[inline]
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Path the diagnostic is attributed to
    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    /// Check if this is an error
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match &self.path {
            Some(path) if !path.is_empty() => {
                write!(f, "{level} at {path}: {}: {}", self.summary, self.detail)
            }
            _ => write!(f, "{level}: {}: {}", self.summary, self.detail),
        }
    }
}

/// Ordered diagnostic accumulator
///
/// Identical diagnostics are recorded once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// Create empty accumulator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add a diagnostic unless an identical one is already present
    pub fn push(&mut self, diagnostic: Diagnostic) {
        if !self.0.contains(&diagnostic) {
            self.0.push(diagnostic);
        }
    }

    /// Append all diagnostics from another accumulator
    pub fn append(&mut self, other: Diagnostics) {
        for diagnostic in other.0 {
            self.push(diagnostic);
        }
    }

    /// Add an error attributed to `path`
    pub fn add_attribute_error(
        &mut self,
        path: &Path,
        kind: DiagnosticKind,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.push(Diagnostic::error(kind, summary, detail).with_path(path.clone()));
    }

    /// Add a warning attributed to `path`
    pub fn add_attribute_warning(
        &mut self,
        path: &Path,
        kind: DiagnosticKind,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.push(Diagnostic::warning(kind, summary, detail).with_path(path.clone()));
    }

    /// Add an error with no path
    pub fn add_error(
        &mut self,
        kind: DiagnosticKind,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.push(Diagnostic::error(kind, summary, detail));
    }

    /// Add a warning with no path
    pub fn add_warning(
        &mut self,
        kind: DiagnosticKind,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.push(Diagnostic::warning(kind, summary, detail));
    }

    /// Check if any diagnostic is an error
    #[inline]
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    /// Error diagnostics
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.is_error())
    }

    /// Warning diagnostics
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| !d.is_error())
    }

    /// Number of diagnostics
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no diagnostics
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    /// Attribute every path-less diagnostic to `path`
    #[must_use]
    pub fn with_path(self, path: &Path) -> Self {
        Self(
            self.0
                .into_iter()
                .map(|d| if d.path.is_some() { d } else { d.with_path(path.clone()) })
                .collect(),
        )
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Self(vec![diagnostic])
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        for diagnostic in iter {
            self.push(diagnostic);
        }
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
