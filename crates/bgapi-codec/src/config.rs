//! Codec configuration.
//!
//! Loaded from YAML, e.g.:
//!
//! ```yaml
//! unknown_enums: reject
//! catalog_files:
//!   - vendor_extensions.yaml
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

/// What the parser does with an enum tag outside the field's domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownEnumPolicy {
    /// Keep the message and record the raw tag as unrecognized.
    #[default]
    Surface,
    /// Fail the parse with `UnknownEnumValue`.
    Reject,
}

/// Settings shared by the parser and catalog loading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecConfig {
    /// Handling of unknown enum tags on decode.
    pub unknown_enums: UnknownEnumPolicy,
    /// Extra YAML catalog definitions to load on top of the built-in catalog.
    pub catalog_files: Vec<PathBuf>,
}

impl CodecConfig {
    /// Parse a configuration from YAML text.
    pub fn from_yaml(text: &str) -> CodecResult<Self> {
        serde_yaml::from_str(text).map_err(|e| CodecError::InvalidConfig(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CodecConfig::default();
        assert_eq!(config.unknown_enums, UnknownEnumPolicy::Surface);
        assert!(config.catalog_files.is_empty());

        let parsed = CodecConfig::from_yaml("{}").unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_from_yaml() {
        let config = CodecConfig::from_yaml(
            "unknown_enums: reject\ncatalog_files:\n  - extra.yaml\n",
        )
        .unwrap();
        assert_eq!(config.unknown_enums, UnknownEnumPolicy::Reject);
        assert_eq!(config.catalog_files, vec![PathBuf::from("extra.yaml")]);
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let err = CodecConfig::from_yaml("unknown_enum: reject\n").unwrap_err();
        assert!(matches!(err, CodecError::InvalidConfig(_)));
    }
}
