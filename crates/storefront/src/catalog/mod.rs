//! Product catalog clients.
//!
//! # Architecture
//!
//! - [`ProductCatalog`] is the capability the cart store and the product
//!   listing depend on; anything that can list products and resolve one by id
//!   qualifies
//! - [`HttpCatalog`] talks to a REST catalog (`GET /products`,
//!   `GET /products/{id}`) with `reqwest` and caches responses with `moka`
//! - [`InMemoryCatalog`] serves a fixed product list, loaded from JSON for
//!   offline use
//!
//! # Example
//!
//! ```rust,ignore
//! use solemate_storefront::catalog::{HttpCatalog, ProductCatalog};
//!
//! let catalog = HttpCatalog::new(&config.catalog)?;
//!
//! let products = catalog.get_all_products().await?;
//! let shoe = catalog.get_product(products[0].id).await?;
//! ```

mod cache;
mod http;
mod memory;

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use solemate_core::ProductId;
use thiserror::Error;

pub use http::HttpCatalog;
pub use memory::InMemoryCatalog;

/// A product as delivered by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog identifier.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Unit price in the storefront currency.
    pub price: Decimal,
    /// Image URL.
    pub image: String,
}

/// Errors that can occur when reading from a product catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Catalog answered with a non-success status.
    #[error("Catalog returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// First bytes of the response body.
        body: String,
    },

    /// Reading a local catalog file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The catalog did not answer in time.
    #[error("Catalog lookup timed out after {0:?}")]
    Timeout(Duration),

    /// The configured base URL cannot carry a path.
    #[error("Invalid catalog URL: {0}")]
    InvalidUrl(String),
}

impl CatalogError {
    /// Whether this error means the product does not exist, as opposed to
    /// the catalog being unreachable.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Read access to product metadata.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// List every product in the catalog.
    async fn get_all_products(&self) -> Result<Vec<Product>, CatalogError>;

    /// Resolve a single product's details.
    async fn get_product(&self, id: ProductId) -> Result<Product, CatalogError>;
}
