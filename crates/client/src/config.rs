//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TRUEWAVE_PROJECT_ID` - Hosted backend project identifier
//! - `TRUEWAVE_API_KEY` - Backend API key
//!
//! ## Optional
//! - `TRUEWAVE_CART_SYNC_DEBOUNCE_MS` - Cart sync debounce delay (default: 500)
//! - `TRUEWAVE_CATALOG_CACHE_TTL_SECS` - Catalog cache TTL (default: 300)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &["your-", "changeme", "replace", "placeholder", "example"];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Client application configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// Hosted backend project identifier
    pub project_id: String,
    /// Backend API key
    pub api_key: SecretString,
    /// Delay between a cart mutation and the remote write it schedules
    pub cart_sync_debounce: Duration,
    /// How long catalog reads stay fresh before refetching
    pub catalog_cache_ttl: Duration,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("project_id", &self.project_id)
            .field("api_key", &"[REDACTED]")
            .field("cart_sync_debounce", &self.cart_sync_debounce)
            .field("catalog_cache_ttl", &self.catalog_cache_ttl)
            .finish()
    }
}

impl ClientConfig {
    /// Default cart sync debounce delay.
    pub const DEFAULT_SYNC_DEBOUNCE: Duration = Duration::from_millis(500);
    /// Default catalog cache TTL.
    pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the API key fails placeholder validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let project_id = get_required_env("TRUEWAVE_PROJECT_ID")?;
        let api_key = get_validated_secret("TRUEWAVE_API_KEY")?;

        let cart_sync_debounce = get_env_or_default("TRUEWAVE_CART_SYNC_DEBOUNCE_MS", "500")
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| {
                ConfigError::InvalidEnvVar("TRUEWAVE_CART_SYNC_DEBOUNCE_MS".to_string(), e.to_string())
            })?;

        let catalog_cache_ttl = get_env_or_default("TRUEWAVE_CATALOG_CACHE_TTL_SECS", "300")
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| {
                ConfigError::InvalidEnvVar("TRUEWAVE_CATALOG_CACHE_TTL_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            project_id,
            api_key,
            cart_sync_debounce,
            catalog_cache_ttl,
        })
    }

    /// A configuration suitable for tests and local development.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            project_id: "truewave-test".to_string(),
            api_key: SecretString::from("test-api-key-0000"),
            cart_sync_debounce: Duration::from_millis(25),
            catalog_cache_ttl: Duration::from_secs(60),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a secret is not an obvious placeholder.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }
    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));

        let result = validate_secret_strength("changeme123", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("AIzaSyD4k9q2m8x1v7b3n6", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ClientConfig::for_testing();
        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("truewave-test"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("test-api-key"));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(
            ClientConfig::DEFAULT_SYNC_DEBOUNCE,
            Duration::from_millis(500)
        );
        assert_eq!(ClientConfig::DEFAULT_CACHE_TTL, Duration::from_secs(300));
    }
}
