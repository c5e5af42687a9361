//! Schema errors

use planform_value::{Diagnostic, DiagnosticKind, Path};

/// Errors raised while checking or walking an attribute tree
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// Structural invariant violated; always a provider-authoring bug
    #[error("invalid definition at {path}: {reason}")]
    InvalidDefinition {
        /// Offending attribute or block
        path: Path,
        /// Violated invariant
        reason: String,
    },

    /// Path does not correspond to declared structure
    #[error("schema mismatch at {path}: {reason}")]
    SchemaMismatch {
        /// Path that failed to resolve
        path: Path,
        /// Why it does not resolve
        reason: String,
    },

    /// Path leads to a block where an attribute was requested
    #[error("path {path} leads to a block, not an attribute")]
    PathIsBlock {
        /// Path of the block
        path: Path,
    },

    /// Path leads into a leaf type, which has no attribute schema
    #[error(
        "path {path} leads to an element or attribute of an attribute that has no schema \
         associated with it"
    )]
    PathInsideAtomicAttribute {
        /// Requested path
        path: Path,
    },

    /// Wire description could not be serialized
    #[error("schema description serialization failed: {0}")]
    Serialization(String),
}

impl SchemaError {
    /// Create invalid definition error
    pub fn invalid_definition(path: &Path, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            path: path.clone(),
            reason: reason.into(),
        }
    }

    /// Create schema mismatch error
    pub fn schema_mismatch(path: &Path, reason: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            path: path.clone(),
            reason: reason.into(),
        }
    }

    /// Diagnostic kind for this error
    #[inline]
    #[must_use]
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::InvalidDefinition { .. } => DiagnosticKind::InvalidDefinition,
            Self::Serialization(_) => DiagnosticKind::Custom,
            Self::SchemaMismatch { .. }
            | Self::PathIsBlock { .. }
            | Self::PathInsideAtomicAttribute { .. } => DiagnosticKind::SchemaMismatch,
        }
    }

    /// Convert into an error diagnostic at `path`
    #[must_use]
    pub fn to_diagnostic(&self, path: &Path, summary: &str) -> Diagnostic {
        Diagnostic::error(self.kind(), summary, self.to_string()).with_path(path.clone())
    }
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
