//! Configuration for the invite service.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use brigade_invite_core::{DEFAULT_CODE_LEN, DEFAULT_TOKEN_BYTES, SHORT_CODE_LEN};

/// Fewest random bytes a link token may carry. The token alone grants entry.
pub const MIN_TOKEN_BYTES: usize = 16;

/// Shortest human code.
pub const MIN_CODE_LEN: usize = 4;

/// A configuration that cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for [`InviteService`](crate::InviteService).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InviteConfig {
    /// Length of generated human codes.
    pub code_length: usize,
    /// Attempts to find a free code (or token) before giving up.
    pub max_code_attempts: u32,
    /// Random bytes per link token.
    pub token_bytes: usize,
    /// Length of the short code derived from a link token.
    pub short_code_length: usize,
    /// Attempts to give back a use after a failed membership write.
    pub compensation_attempts: u32,
    /// Retries of the guarded increment when the store reports busy.
    pub busy_retry_attempts: u32,
    /// Origin that join links are built on, without a trailing slash.
    pub join_origin: String,
}

impl Default for InviteConfig {
    fn default() -> Self {
        Self {
            code_length: DEFAULT_CODE_LEN,
            max_code_attempts: 10,
            token_bytes: DEFAULT_TOKEN_BYTES,
            short_code_length: SHORT_CODE_LEN,
            compensation_attempts: 3,
            busy_retry_attempts: 3,
            join_origin: "http://localhost:3000".to_string(),
        }
    }
}

impl InviteConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that issued secrets stay long enough to resist guessing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_bytes < MIN_TOKEN_BYTES {
            return Err(ConfigError::Invalid(format!(
                "token_bytes must be at least {}, got {}",
                MIN_TOKEN_BYTES, self.token_bytes
            )));
        }
        if self.code_length < MIN_CODE_LEN {
            return Err(ConfigError::Invalid(format!(
                "code_length must be at least {}, got {}",
                MIN_CODE_LEN, self.code_length
            )));
        }
        if self.short_code_length == 0 {
            return Err(ConfigError::Invalid(
                "short_code_length must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = InviteConfig::from_json(r#"{"join_origin": "https://prep.example"}"#).unwrap();
        assert_eq!(config.join_origin, "https://prep.example");
        assert_eq!(config.code_length, 6);
        assert_eq!(config.max_code_attempts, 10);
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(InviteConfig::from_json("{}").unwrap(), InviteConfig::default());
    }

    #[test]
    fn test_default_is_valid() {
        assert!(InviteConfig::default().validate().is_ok());
    }

    #[test]
    fn test_short_secrets_are_rejected() {
        for json in [
            r#"{"token_bytes": 0}"#,
            r#"{"token_bytes": 2}"#,
            r#"{"code_length": 1}"#,
            r#"{"short_code_length": 0}"#,
        ] {
            assert!(
                matches!(InviteConfig::from_json(json), Err(ConfigError::Invalid(_))),
                "{} should be rejected",
                json
            );
        }
    }

    #[test]
    fn test_minimums_are_accepted() {
        let config = InviteConfig {
            token_bytes: MIN_TOKEN_BYTES,
            code_length: MIN_CODE_LEN,
            short_code_length: 1,
            ..InviteConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        assert!(matches!(
            InviteConfig::from_json(r#"{"token_bytes": "many"}"#),
            Err(ConfigError::Parse(_))
        ));
    }
}
