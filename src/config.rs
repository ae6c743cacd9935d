//! Session configuration.
//!
//! The deployed VM program fixes how it reads its operand stack; which build
//! is targeted is a deployment choice, so it lives here rather than on each
//! call.
//!
//! ```json
//! { "stack_layout": "nonce_first", "program_nonce": 9999999 }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Nonce the reference program build expects
pub const DEFAULT_PROGRAM_NONCE: u64 = 9_999_999;

/// Operand stack slot order of the targeted program build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackLayout {
    /// `[side, quantity, price, timestamp, program_nonce]`
    SideFirst,
    /// `[program_nonce, timestamp, price, quantity, side]`
    #[default]
    NonceFirst,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub stack_layout: StackLayout,
    pub program_nonce: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stack_layout: StackLayout::default(),
            program_nonce: DEFAULT_PROGRAM_NONCE,
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = SessionConfig::default();

        assert_eq!(config.stack_layout, StackLayout::NonceFirst);
        assert_eq!(config.program_nonce, 9999999);
    }

    #[test]
    fn test_config_from_json() {
        let config =
            SessionConfig::from_json_str(r#"{"stack_layout":"side_first","program_nonce":7}"#)
                .unwrap();

        assert_eq!(config.stack_layout, StackLayout::SideFirst);
        assert_eq!(config.program_nonce, 7);
    }

    #[test]
    fn test_config_partial_json_uses_defaults() {
        let config = SessionConfig::from_json_str(r#"{"stack_layout":"side_first"}"#).unwrap();
        assert_eq!(config.program_nonce, DEFAULT_PROGRAM_NONCE);
    }

    #[test]
    fn test_config_rejects_unknown_layout() {
        let err = SessionConfig::from_json_str(r#"{"stack_layout":"sideways"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_config_missing_file() {
        let err = SessionConfig::from_json_file("/nonexistent/zkbook.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
