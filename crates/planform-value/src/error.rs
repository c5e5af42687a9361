//! Value model errors

use crate::diag::{Diagnostic, DiagnosticKind};
use crate::path::{Path, PathStep};
use crate::types::ValueType;

/// Errors raised while constructing or updating value trees
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    /// Payload does not fit the declared type
    #[error("shape mismatch at {path}: {reason}")]
    ShapeMismatch {
        /// Node that failed to construct
        path: Path,
        /// What does not fit
        reason: String,
    },

    /// A path step does not resolve in the current shape
    #[error("path not found: step {step} of {path} does not resolve")]
    PathNotFound {
        /// Full path being resolved
        path: Path,
        /// First step that did not resolve
        step: PathStep,
    },

    /// Replacement value type disagrees with the type at the path
    #[error("type mismatch at {path}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Target of the write
        path: Path,
        /// Type declared at the path
        expected: ValueType,
        /// Type of the rejected value
        actual: ValueType,
    },

    /// List write beyond the next free index
    #[error(
        "cannot add list element {index} at {path} as list currently has {length} length; \
         only the next element can be added to a list"
    )]
    AmbiguousInsert {
        /// Path of the list
        path: Path,
        /// Index the write targeted
        index: usize,
        /// Current list length
        length: usize,
    },
}

impl ValueError {
    /// Create shape mismatch error
    pub fn shape_mismatch(path: &Path, reason: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            path: path.clone(),
            reason: reason.into(),
        }
    }

    /// Path the error is attributed to
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::ShapeMismatch { path, .. }
            | Self::PathNotFound { path, .. }
            | Self::TypeMismatch { path, .. }
            | Self::AmbiguousInsert { path, .. } => path,
        }
    }

    /// Diagnostic kind for this error
    #[inline]
    #[must_use]
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::ShapeMismatch { .. } | Self::TypeMismatch { .. } => DiagnosticKind::TypeMismatch,
            Self::PathNotFound { .. } => DiagnosticKind::SchemaMismatch,
            Self::AmbiguousInsert { .. } => DiagnosticKind::AmbiguousInsert,
        }
    }

    /// Convert into an error diagnostic at `path` with the given summary
    #[must_use]
    pub fn to_diagnostic(&self, path: &Path, summary: &str) -> Diagnostic {
        Diagnostic::error(self.kind(), summary, self.to_string()).with_path(path.clone())
    }
}

impl From<ValueError> for Diagnostic {
    fn from(err: ValueError) -> Self {
        let path = err.path().clone();
        err.to_diagnostic(&path, "Value Error")
    }
}
