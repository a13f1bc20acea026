// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sanitizer settings, stored as RON.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the sanitizer treats nodes it cannot migrate cleanly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizeConfig {
    /// Migrate a node even when some of its links do not fit the replacement.
    ///
    /// Dropped links are listed in the migration report. When `false`, such
    /// a node is left untouched and reported as unmigratable.
    pub fail_open: bool,
    /// Keep unmigratable nodes in the graph instead of removing them
    pub keep_unmigratable: bool,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            fail_open: true,
            keep_unmigratable: true,
        }
    }
}

impl SanitizeConfig {
    /// Serialize to RON format
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default().struct_names(true))
    }

    /// Deserialize from RON format
    pub fn from_ron(s: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(s)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_ron(&content)?)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }
}

/// Error loading or saving settings
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid RON
    #[error("invalid settings: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Settings could not be serialized
    #[error("cannot serialize settings: {0}")]
    Serialize(#[from] ron::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ron_round_trip() {
        let config = SanitizeConfig {
            fail_open: false,
            keep_unmigratable: true,
        };
        let ron_str = config.to_ron().unwrap();
        assert!(ron_str.contains("SanitizeConfig"));
        assert_eq!(SanitizeConfig::from_ron(&ron_str).unwrap(), config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = SanitizeConfig::from_ron("(keep_unmigratable: false)").unwrap();
        assert!(config.fail_open);
        assert!(!config.keep_unmigratable);
    }

    #[test]
    fn test_load_and_save() {
        let path = std::env::temp_dir().join(format!("sanitize-{}.ron", uuid::Uuid::new_v4()));
        let config = SanitizeConfig {
            fail_open: false,
            keep_unmigratable: false,
        };
        config.save(&path).unwrap();
        assert_eq!(SanitizeConfig::load(&path).unwrap(), config);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(SanitizeConfig::load(&path), Err(ConfigError::Io(_))));
    }
}
