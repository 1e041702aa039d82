//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_SESSION_SECRET` - Session cookie signing key (min 64 chars, high entropy)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `CHECKOUT_ORDER_PREFIX` - Order id prefix (default: A10)
//! - `CHECKOUT_STORE_NAME` - Store name in order messages (default: After10)
//! - `CHECKOUT_MESSAGING_HOST` - Deep link host (default: wa.me)
//! - `CHECKOUT_COUNTRY_CODE` - Dialling code prepended to phone numbers (default: 91)
//! - `CHECKOUT_ORDER_PHONE` - Number that receives orders (default: the customer's own)
//! - `CHECKOUT_DEFAULT_CITY`, `CHECKOUT_DEFAULT_STATE`, `CHECKOUT_DEFAULT_PIN_CODE`,
//!   `CHECKOUT_DEFAULT_COUNTRY` - Checkout form defaults
//! - `GEOCODER_BASE_URL` - Nominatim-compatible service (default: <https://nominatim.openstreetmap.org/>)
//! - `GEOCODER_USER_AGENT` - User-Agent sent to the geocoder
//! - `CATALOG_CACHE_TTL_SECS` - Menu cache lifetime (default: 60)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance traces sample rate (default: 0.1)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

/// Cookie signing keys need 64 bytes of key material.
const MIN_SESSION_SECRET_LENGTH: usize = 64;
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
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Checkout and order handoff settings
    pub checkout: CheckoutConfig,
    /// Reverse geocoding service
    pub geocoder: GeocoderConfig,
    /// How long the menu catalog is cached
    pub catalog_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "production", "staging")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Checkout and messaging handoff settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// Prefix of generated order ids
    pub order_prefix: String,
    /// Store name shown in the order message
    pub store_name: String,
    /// Host of the messaging deep link
    pub messaging_host: String,
    /// Country dialling code, digits only
    pub country_code: String,
    /// Number that receives orders; `None` sends to the customer's number
    pub order_phone: Option<String>,
    /// Pre-filled checkout form values
    pub defaults: FormDefaults,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            order_prefix: "A10".to_string(),
            store_name: "After10".to_string(),
            messaging_host: "wa.me".to_string(),
            country_code: "91".to_string(),
            order_phone: None,
            defaults: FormDefaults::default(),
        }
    }
}

/// Pre-filled location fields of the checkout form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDefaults {
    pub city: String,
    pub state: String,
    pub pin_code: String,
    pub country: String,
}

impl Default for FormDefaults {
    fn default() -> Self {
        Self {
            city: "Bhilwara".to_string(),
            state: "Rajasthan".to_string(),
            pin_code: "311001".to_string(),
            country: "India".to_string(),
        }
    }
}

/// Reverse geocoding service settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocoderConfig {
    /// Base URL, always ending in `/`
    pub base_url: Url,
    /// User-Agent identifying this application to the service
    pub user_agent: String,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = parse_env_or_default::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        let session_secret = get_validated_secret("STOREFRONT_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "STOREFRONT_SESSION_SECRET")?;

        let checkout = CheckoutConfig::from_env()?;
        let geocoder = GeocoderConfig::from_env()?;
        let catalog_cache_ttl =
            Duration::from_secs(parse_env_or_default::<u64>("CATALOG_CACHE_TTL_SECS", "60")?);

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = parse_env_or_default::<f32>("SENTRY_SAMPLE_RATE", "1.0")?;
        let sentry_traces_sample_rate =
            parse_env_or_default::<f32>("SENTRY_TRACES_SAMPLE_RATE", "0.1")?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            checkout,
            geocoder,
            catalog_cache_ttl,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl CheckoutConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let fallback = Self::default();

        let country_code = get_env_or_default("CHECKOUT_COUNTRY_CODE", &fallback.country_code)
            .trim_start_matches('+')
            .to_string();
        if country_code.is_empty() || !country_code.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::InvalidEnvVar(
                "CHECKOUT_COUNTRY_CODE".to_string(),
                "must be digits only".to_string(),
            ));
        }

        Ok(Self {
            order_prefix: get_env_or_default("CHECKOUT_ORDER_PREFIX", &fallback.order_prefix),
            store_name: get_env_or_default("CHECKOUT_STORE_NAME", &fallback.store_name),
            messaging_host: get_env_or_default(
                "CHECKOUT_MESSAGING_HOST",
                &fallback.messaging_host,
            ),
            country_code,
            order_phone: get_optional_env("CHECKOUT_ORDER_PHONE").filter(|p| !p.trim().is_empty()),
            defaults: FormDefaults {
                city: get_env_or_default("CHECKOUT_DEFAULT_CITY", &fallback.defaults.city),
                state: get_env_or_default("CHECKOUT_DEFAULT_STATE", &fallback.defaults.state),
                pin_code: get_env_or_default(
                    "CHECKOUT_DEFAULT_PIN_CODE",
                    &fallback.defaults.pin_code,
                ),
                country: get_env_or_default(
                    "CHECKOUT_DEFAULT_COUNTRY",
                    &fallback.defaults.country,
                ),
            },
        })
    }
}

impl GeocoderConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = get_env_or_default("GEOCODER_BASE_URL", "https://nominatim.openstreetmap.org/");
        let base_url = parse_base_url(&raw)
            .map_err(|e| ConfigError::InvalidEnvVar("GEOCODER_BASE_URL".to_string(), e))?;
        let user_agent = get_env_or_default(
            "GEOCODER_USER_AGENT",
            concat!("after10-storefront/", env!("CARGO_PKG_VERSION")),
        );
        Ok(Self {
            base_url,
            user_agent,
        })
    }
}

/// Parse a base URL and make sure relative joins append to its path.
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw).map_err(|e| e.to_string())?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to a default.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
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

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

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
