// SPDX-License-Identifier: GPL-3.0-only

//! Presentation options for on-screen keys.
//!
//! Options never affect activation logic; they only decide which affordance
//! callbacks the widget makes. They can be built in code or loaded from a JSON
//! document, where missing fields fall back to the defaults in
//! [`crate::app_settings`]:
//!
//! ```json
//! { "are_animations_enabled": false, "is_hover_effect_enabled": true }
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::app_settings;

// ============================================================================
// Key Options
// ============================================================================

/// Presentation toggles recognised by [`crate::OnScreenKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyOptions {
    /// Fade the released affordance out instead of removing it instantly.
    ///
    /// Only simple keys fade; modifier keys always release instantly.
    pub are_animations_enabled: bool,
    /// Report pointer enter/leave to the presentation adapter.
    pub is_hover_effect_enabled: bool,
}

impl Default for KeyOptions {
    fn default() -> Self {
        Self {
            are_animations_enabled: app_settings::DEFAULT_ARE_ANIMATIONS_ENABLED,
            is_hover_effect_enabled: app_settings::DEFAULT_IS_HOVER_EFFECT_ENABLED,
        }
    }
}

impl KeyOptions {
    /// Creates options with the crate defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with animations enabled or disabled.
    #[must_use]
    pub fn with_animations(mut self, enabled: bool) -> Self {
        self.are_animations_enabled = enabled;
        self
    }

    /// Returns a copy with hover effects enabled or disabled.
    #[must_use]
    pub fn with_hover_effect(mut self, enabled: bool) -> Self {
        self.is_hover_effect_enabled = enabled;
        self
    }

    /// Parses options from a JSON string.
    ///
    /// Unknown fields are ignored and missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(ConfigError::json_error)
    }

    /// Reads and parses options from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display_path = path.display().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::io_error_with_path(e, display_path.clone()))?;

        let options = serde_json::from_str(&contents)
            .map_err(|e| ConfigError::json_error_with_path(e, display_path.clone()))?;

        tracing::debug!(
            target: app_settings::LOG_TARGET,
            "Loaded key options from {}: {:?}",
            display_path,
            options
        );

        Ok(options)
    }

    /// Serializes the options as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(ConfigError::json_error)
    }
}

// ============================================================================
// Config Errors
// ============================================================================

/// Errors raised while loading [`KeyOptions`].
#[derive(Debug)]
pub enum ConfigError {
    /// The options file could not be read.
    IoError {
        /// The underlying I/O error
        source: std::io::Error,
        /// Optional file path that caused the error
        file_path: Option<String>,
        /// Optional suggestion for fixing the error
        suggestion: Option<String>,
    },

    /// The options document is not valid JSON or has mistyped fields.
    JsonError {
        /// The underlying JSON error
        source: serde_json::Error,
        /// Optional file path being parsed
        file_path: Option<String>,
        /// Line number reported by serde_json
        line_number: Option<usize>,
    },
}

impl ConfigError {
    /// Creates an I/O error without path context.
    pub fn io_error(source: std::io::Error) -> Self {
        Self::IoError {
            source,
            file_path: None,
            suggestion: None,
        }
    }

    /// Creates an I/O error with file path.
    pub fn io_error_with_path(source: std::io::Error, file_path: impl Into<String>) -> Self {
        Self::IoError {
            source,
            file_path: Some(file_path.into()),
            suggestion: Some("Check that the file exists and you have read permissions".into()),
        }
    }

    /// Creates a JSON error without path context.
    pub fn json_error(source: serde_json::Error) -> Self {
        let line_number = Some(source.line()).filter(|line| *line > 0);
        Self::JsonError {
            source,
            file_path: None,
            line_number,
        }
    }

    /// Creates a JSON error with file path.
    pub fn json_error_with_path(source: serde_json::Error, file_path: impl Into<String>) -> Self {
        match Self::json_error(source) {
            Self::JsonError {
                source, line_number, ..
            } => Self::JsonError {
                source,
                file_path: Some(file_path.into()),
                line_number,
            },
            other => other,
        }
    }

    /// Returns the file path associated with the error, if any.
    pub fn file_path(&self) -> Option<&str> {
        match self {
            Self::IoError { file_path, .. } | Self::JsonError { file_path, .. } => {
                file_path.as_deref()
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError {
                source,
                file_path,
                suggestion,
            } => {
                write!(f, "Failed to read key options")?;
                if let Some(path) = file_path {
                    write!(f, " from '{}'", path)?;
                }
                write!(f, ": {}", source)?;
                if let Some(hint) = suggestion {
                    write!(f, "\n  Suggestion: {}", hint)?;
                }
                Ok(())
            }
            ConfigError::JsonError {
                source,
                file_path,
                line_number,
            } => {
                write!(f, "Invalid key options")?;
                if let Some(path) = file_path {
                    write!(f, " in '{}'", path)?;
                }
                if let Some(line) = line_number {
                    write!(f, " at line {}", line)?;
                }
                write!(f, ": {}", source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::JsonError { source, .. } => Some(source),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::io_error(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::json_error(err)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Test defaults match the documented configuration surface
    #[test]
    fn test_default_options() {
        let options = KeyOptions::default();
        assert!(options.are_animations_enabled, "Animations default to on");
        assert!(!options.is_hover_effect_enabled, "Hover defaults to off");
    }

    /// Test partial JSON documents fall back to defaults
    #[test]
    fn test_partial_json_uses_defaults() {
        let options = KeyOptions::from_json_str(r#"{ "is_hover_effect_enabled": true }"#)
            .expect("partial document should parse");
        assert!(options.are_animations_enabled);
        assert!(options.is_hover_effect_enabled);

        let empty = KeyOptions::from_json_str("{}").expect("empty document should parse");
        assert_eq!(empty, KeyOptions::default());
    }

    /// Test mistyped fields are rejected with a JSON error
    #[test]
    fn test_mistyped_field_is_rejected() {
        let result = KeyOptions::from_json_str(r#"{ "are_animations_enabled": "yes" }"#);
        match result {
            Err(ConfigError::JsonError { line_number, .. }) => {
                assert_eq!(line_number, Some(1));
            }
            other => panic!("Expected JsonError, got {:?}", other),
        }
    }

    /// Test builder helpers
    #[test]
    fn test_builder_helpers() {
        let options = KeyOptions::new().with_animations(false).with_hover_effect(true);
        assert!(!options.are_animations_enabled);
        assert!(options.is_hover_effect_enabled);
    }

    /// Test loading from a file on disk
    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "are_animations_enabled": false }}"#).expect("write options");

        let options = KeyOptions::from_json_file(file.path()).expect("file should load");
        assert!(!options.are_animations_enabled);
        assert!(!options.is_hover_effect_enabled);
    }

    /// Test missing files produce an I/O error carrying the path
    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("missing.json");

        let err = KeyOptions::from_json_file(&path).expect_err("missing file must fail");
        assert!(matches!(err, ConfigError::IoError { .. }));
        assert_eq!(err.file_path(), Some(path.display().to_string().as_str()));
        assert!(err.to_string().contains("Suggestion"));
    }

    /// Test options survive serialization
    #[test]
    fn test_to_json_string() {
        let options = KeyOptions::new().with_hover_effect(true);
        let json = options.to_json_string().expect("serialize");
        assert!(json.contains("\"is_hover_effect_enabled\": true"));
        assert_eq!(KeyOptions::from_json_str(&json).expect("parse"), options);
    }
}
