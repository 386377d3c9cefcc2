//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `CATALOG_BASE_URL` - Product catalog REST endpoint (default: <http://localhost:3333>)
//! - `CATALOG_TIMEOUT_SECS` - Per-request HTTP timeout (default: 10)
//! - `CATALOG_CACHE_TTL_SECS` - Catalog response cache lifetime (default: 300)
//! - `CART_LOOKUP_TIMEOUT_SECS` - Upper bound on an add-to-cart product lookup (default: 10)
//! - `STOREFRONT_CURRENCY` - ISO 4217 code used for prices (default: BRL)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::time::Duration;

use solemate_core::CurrencyCode;
use thiserror::Error;
use url::Url;

const DEFAULT_CATALOG_BASE_URL: &str = "http://localhost:3333";
const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CATALOG_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_CART_LOOKUP_TIMEOUT_SECS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Product catalog client configuration
    pub catalog: CatalogConfig,
    /// Cart store behaviour
    pub cart: CartSettings,
    /// Currency every catalog price is expressed in
    pub currency: CurrencyCode,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production", "staging")
    pub sentry_environment: Option<String>,
}

/// Product catalog client configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL of the REST catalog; `/products` is appended to it
    pub base_url: Url,
    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,
    /// How long catalog responses stay cached
    pub cache_ttl: Duration,
}

/// Cart store settings.
#[derive(Debug, Clone, Copy)]
pub struct CartSettings {
    /// Upper bound on the product lookup performed when adding a new product.
    ///
    /// A lookup that exceeds it fails the add and releases the pending marker.
    pub lookup_timeout: Duration,
    /// Currency assigned to line item unit prices
    pub currency: CurrencyCode,
}

impl Default for CartSettings {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_secs(DEFAULT_CART_LOOKUP_TIMEOUT_SECS),
            currency: CurrencyCode::default(),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let currency = match env.optional("STOREFRONT_CURRENCY") {
            Some(value) => value.parse::<CurrencyCode>().map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_CURRENCY".to_string(), e.to_string())
            })?,
            None => CurrencyCode::default(),
        };

        let base_url = env.or_default("CATALOG_BASE_URL", DEFAULT_CATALOG_BASE_URL);
        let base_url = Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("CATALOG_BASE_URL".to_string(), e.to_string())
        })?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "CATALOG_BASE_URL".to_string(),
                "must be an absolute http(s) URL".to_string(),
            ));
        }

        let catalog = CatalogConfig {
            base_url,
            request_timeout: env.seconds("CATALOG_TIMEOUT_SECS", DEFAULT_CATALOG_TIMEOUT_SECS)?,
            cache_ttl: env.seconds("CATALOG_CACHE_TTL_SECS", DEFAULT_CATALOG_CACHE_TTL_SECS)?,
        };

        let cart = CartSettings {
            lookup_timeout: env
                .seconds("CART_LOOKUP_TIMEOUT_SECS", DEFAULT_CART_LOOKUP_TIMEOUT_SECS)?,
            currency,
        };

        Ok(Self {
            catalog,
            cart,
            currency,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Get a positive number of seconds.
    fn seconds(&self, key: &str, default: u64) -> Result<Duration, ConfigError> {
        let Some(raw) = self.optional(key) else {
            return Ok(Duration::from_secs(default));
        };
        let secs = raw
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
        if secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        Ok(Duration::from_secs(secs))
    }
}
