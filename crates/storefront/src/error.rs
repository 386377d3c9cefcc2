//! Unified error handling with Sentry integration.
//!
//! Provides a unified `StorefrontError` type for front ends that drive the
//! catalog and the cart together, plus helpers that record user actions and
//! failures to Sentry. Without an initialized Sentry client the helpers are
//! no-ops.

use thiserror::Error;

use crate::cart::CartError;
use crate::catalog::CatalogError;
use crate::config::ConfigError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Cart command was rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),
}

impl StorefrontError {
    /// Whether the error comes from an external system rather than from the
    /// user's input, and should be reported.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        match self {
            Self::Config(_) | Self::Catalog(_) => true,
            Self::Cart(err) => matches!(err, CartError::CatalogLookupFailed { .. }),
        }
    }

    /// Short message suitable for showing to a shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(_) => "The store is misconfigured".to_string(),
            Self::Catalog(_) => "Could not load products, please try again".to_string(),
            Self::Cart(err) => match err {
                CartError::CatalogLookupFailed { .. } => {
                    "Could not add the product to your cart".to_string()
                }
                CartError::InvalidQuantity { requested, .. } if *requested < 1 => {
                    "Quantity must be at least 1; remove the item instead".to_string()
                }
                CartError::InvalidQuantity { .. } => "That quantity is too large".to_string(),
                CartError::NotInCart(_) => "That product is not in your cart".to_string(),
                CartError::AlreadyPending(_) => {
                    "Still working on that product, please wait".to_string()
                }
            },
        }
    }
}

/// Capture a reportable error to Sentry and log it.
pub fn report(err: &StorefrontError) {
    if err.is_reportable() {
        let event_id = sentry::capture_error(err);
        tracing::error!(
            error = %err,
            sentry_event_id = %event_id,
            "Storefront error"
        );
    } else {
        tracing::debug!(error = %err, "Rejected command");
    }
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added product", Some(&[("product_id", "3")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
