//! Marshaling errors

use planform_schema::SchemaError;
use planform_value::{Diagnostic, DiagnosticKind, Path, ValueError};

/// Errors raised while converting between native and dynamic values
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvertError {
    /// Native shape cannot represent the value's type
    #[error("incompatible target at {path}: {target} cannot represent {reason}")]
    IncompatibleTarget {
        /// Path of the value
        path: Path,
        /// Native target name
        target: String,
        /// What the target cannot represent
        reason: String,
    },

    /// Null value for a target with no null representation
    #[error(
        "unhandled null value at {path}: {target} cannot represent null; use an optional \
         or tri-state target"
    )]
    UnhandledNull {
        /// Path of the null value
        path: Path,
        /// Native target name
        target: String,
    },

    /// Unknown value for a target with no unknown representation
    #[error(
        "unhandled unknown value at {path}: {target} cannot represent unknown; use a \
         tri-state target"
    )]
    UnhandledUnknown {
        /// Path of the unknown value
        path: Path,
        /// Native target name
        target: String,
    },

    /// Number does not fit the native numeric type
    #[error("value {value} at {path} is out of range for {target}")]
    OutOfRange {
        /// Path of the number
        path: Path,
        /// Number as written
        value: String,
        /// Native numeric type
        target: String,
    },

    /// Value tree operation failed
    #[error(transparent)]
    Value(#[from] ValueError),

    /// Schema lookup failed
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl ConvertError {
    /// Create incompatible target error
    pub fn incompatible(path: &Path, target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::IncompatibleTarget {
            path: path.clone(),
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Diagnostic kind for this error
    #[inline]
    #[must_use]
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::IncompatibleTarget { .. }
            | Self::UnhandledNull { .. }
            | Self::UnhandledUnknown { .. }
            | Self::OutOfRange { .. } => DiagnosticKind::ConversionError,
            Self::Value(err) => err.kind(),
            Self::Schema(err) => err.kind(),
        }
    }

    /// Convert into an error diagnostic at `path`
    #[must_use]
    pub fn to_diagnostic(&self, path: &Path, summary: &str) -> Diagnostic {
        Diagnostic::error(self.kind(), summary, self.to_string()).with_path(path.clone())
    }
}

/// Errors raised while loading [`MarshalOptions`](crate::MarshalOptions)
#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    /// TOML input could not be parsed
    #[error("invalid TOML options: {0}")]
    InvalidToml(#[source] toml::de::Error),

    /// JSON input could not be parsed
    #[error("invalid JSON options: {0}")]
    InvalidJson(#[source] serde_json::Error),
}
