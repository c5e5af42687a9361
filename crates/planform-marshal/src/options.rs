//! Marshaling options
//!
//! Loadable from TOML or JSON:
//!
//! ```toml
//! unhandled_null_as_empty = true
//! unhandled_unknown_as_empty = false
//! allow_type_validation = true
//! ```

use serde::{Deserialize, Serialize};

use crate::error::OptionsError;

/// Controls how native targets receive values they cannot represent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarshalOptions {
    /// A null value decoded into a target with no null representation
    /// yields the target's zero form instead of an error
    pub unhandled_null_as_empty: bool,

    /// An unknown value decoded into a target with no unknown
    /// representation yields the target's zero form instead of an error
    pub unhandled_unknown_as_empty: bool,

    /// Run leaf type validation hooks before conversion
    pub allow_type_validation: bool,
}

impl Default for MarshalOptions {
    fn default() -> Self {
        Self {
            unhandled_null_as_empty: false,
            unhandled_unknown_as_empty: false,
            allow_type_validation: true,
        }
    }
}

impl MarshalOptions {
    /// Parse from TOML string
    ///
    /// # Errors
    /// Returns error if TOML is invalid or has unexpected field types
    pub fn from_toml_str(input: &str) -> Result<Self, OptionsError> {
        toml::from_str(input).map_err(OptionsError::InvalidToml)
    }

    /// Parse from JSON string
    ///
    /// # Errors
    /// Returns error if JSON is invalid or has unexpected field types
    pub fn from_json_str(input: &str) -> Result<Self, OptionsError> {
        serde_json::from_str(input).map_err(OptionsError::InvalidJson)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_allow_type_validation() {
        let options = MarshalOptions::default();
        assert!(options.allow_type_validation);
        assert!(!options.unhandled_null_as_empty);
    }

    #[test]
    fn toml_overrides_only_given_fields() {
        let options = MarshalOptions::from_toml_str("unhandled_null_as_empty = true").unwrap();
        assert!(options.unhandled_null_as_empty);
        assert!(!options.unhandled_unknown_as_empty);
        assert!(options.allow_type_validation);
    }

    #[test]
    fn json_parses() {
        let options =
            MarshalOptions::from_json_str(r#"{"allow_type_validation": false}"#).unwrap();
        assert!(!options.allow_type_validation);
    }

    #[test]
    fn invalid_input_is_rejected() {
        assert!(matches!(
            MarshalOptions::from_toml_str("unhandled_null_as_empty = 3"),
            Err(OptionsError::InvalidToml(_))
        ));
        assert!(matches!(
            MarshalOptions::from_json_str("{"),
            Err(OptionsError::InvalidJson(_))
        ));
    }
}
