//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `AURIC_API_BASE_URL` - Base URL of the commerce API
//! - `AURIC_API_KEY` - Commerce API key (placeholder and entropy checked)
//!
//! ## Optional
//! - `AURIC_STORAGE_DIR` - Local persistence directory (default: .auric)
//! - `AURIC_CURRENCY` - ISO 4217 currency code (default: USD)
//! - `AURIC_FREE_SHIPPING_THRESHOLD` - Orders strictly above this ship free (default: 5000)
//! - `AURIC_FLAT_SHIPPING_FEE` - Fee charged below the threshold (default: 99)
//! - `AURIC_COUPON_CODE` - The accepted coupon code (default: AURIC10)
//! - `AURIC_COUPON_RATE` - Discount rate for the coupon, 0 to 1 (default: 0.10)
//! - `AURIC_EMAIL_LINK_URL` - Continue URL for email sign-in links
//!   (default: derived from the API base URL)
//! - `AURIC_GOOGLE_CLIENT_ID` - OAuth client ID for Google sign-in
//! - `AURIC_HTTP_TIMEOUT_SECS` - HTTP request timeout (default: 10)

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use auric_core::CurrencyCode;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Commerce API configuration
    pub api: ApiConfig,
    /// Directory holding the local persistence file
    pub storage_dir: PathBuf,
    /// Currency all prices are quoted in
    pub currency: CurrencyCode,
    /// Shipping thresholds and fees
    pub pricing: PricingConfig,
    /// The single accepted coupon
    pub coupon: CouponConfig,
    /// Continue URL embedded in email sign-in links
    pub email_link_url: String,
}

/// Commerce API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL of the commerce API
    pub base_url: Url,
    /// API key sent with every request
    pub api_key: SecretString,
    /// OAuth client ID for Google sign-in
    pub google_client_id: Option<String>,
    /// Timeout applied to every HTTP request
    pub http_timeout: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .field("google_client_id", &self.google_client_id)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

/// Shipping thresholds and fees.
#[derive(Debug, Clone, Copy)]
pub struct PricingConfig {
    /// Orders strictly above this amount ship free
    pub free_shipping_threshold: Decimal,
    /// Flat fee charged below the threshold
    pub flat_shipping_fee: Decimal,
}

/// The single accepted coupon code and its discount rate.
#[derive(Debug, Clone)]
pub struct CouponConfig {
    /// The code customers type in
    pub code: String,
    /// Fraction of the subtotal taken off, 0 to 1
    pub rate: Decimal,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the API key fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api = ApiConfig::from_env()?;
        let storage_dir = PathBuf::from(get_env_or_default("AURIC_STORAGE_DIR", ".auric"));
        let currency = get_env_or_default("AURIC_CURRENCY", "USD")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("AURIC_CURRENCY".to_string(), e))?;
        let pricing = PricingConfig {
            free_shipping_threshold: get_decimal_or_default("AURIC_FREE_SHIPPING_THRESHOLD", "5000")?,
            flat_shipping_fee: get_decimal_or_default("AURIC_FLAT_SHIPPING_FEE", "99")?,
        };
        let coupon = CouponConfig {
            code: get_env_or_default("AURIC_COUPON_CODE", "AURIC10"),
            rate: get_decimal_or_default("AURIC_COUPON_RATE", "0.10")?,
        };
        validate_rate(coupon.rate, "AURIC_COUPON_RATE")?;
        let email_link_url = match get_optional_env("AURIC_EMAIL_LINK_URL") {
            Some(value) => value,
            None => api
                .base_url
                .join("auth/email-link")
                .map_err(|e| {
                    ConfigError::InvalidEnvVar("AURIC_API_BASE_URL".to_string(), e.to_string())
                })?
                .to_string(),
        };

        Ok(Self {
            api,
            storage_dir,
            currency,
            pricing,
            coupon,
            email_link_url,
        })
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_required_env("AURIC_API_BASE_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("AURIC_API_BASE_URL".to_string(), e.to_string())
            })?;
        let timeout_secs = get_env_or_default("AURIC_HTTP_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("AURIC_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            base_url,
            api_key: get_validated_secret("AURIC_API_KEY")?,
            google_client_id: get_optional_env("AURIC_GOOGLE_CLIENT_ID"),
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an environment variable parsed as a decimal, with a default.
fn get_decimal_or_default(key: &str, default: &str) -> Result<Decimal, ConfigError> {
    get_env_or_default(key, default)
        .parse::<Decimal>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a rate sits between 0 and 1 inclusive.
fn validate_rate(rate: Decimal, var_name: &str) -> Result<(), ConfigError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("must be between 0 and 1 (got {rate})"),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
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
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_shannon_entropy_high() {
        // Random-looking string should have high entropy
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_changeme() {
        let result = validate_secret_strength("changeme123", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_rate_bounds() {
        assert!(validate_rate(Decimal::ZERO, "TEST_RATE").is_ok());
        assert!(validate_rate(Decimal::new(10, 2), "TEST_RATE").is_ok());
        assert!(validate_rate(Decimal::ONE, "TEST_RATE").is_ok());
        assert!(validate_rate(Decimal::new(101, 2), "TEST_RATE").is_err());
        assert!(validate_rate(Decimal::new(-1, 2), "TEST_RATE").is_err());
    }

    #[test]
    fn test_api_config_debug_redacts_key() {
        let config = ApiConfig {
            base_url: "https://api.auric.example/".parse().unwrap(),
            api_key: SecretString::from("kQ7zR2mX9pW4vN8c"),
            google_client_id: Some("client_id_value".to_string()),
            http_timeout: Duration::from_secs(10),
        };

        let debug_output = format!("{config:?}");

        // Public fields should be visible
        assert!(debug_output.contains("https://api.auric.example/"));
        assert!(debug_output.contains("client_id_value"));

        // The key should be redacted
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("kQ7zR2mX9pW4vN8c"));
    }
}
