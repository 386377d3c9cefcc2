//! Solemate Storefront library.
//!
//! The client-side core of the storefront: a product catalog client, the cart
//! store that owns the shopper's cart, and the listing model behind the
//! product page. Rendering is left to the front end (see the `solemate` CLI).
//!
//! # Modules
//!
//! - [`catalog`] - `ProductCatalog` capability with HTTP and in-memory backends
//! - [`cart`] - `CartStore` commands and derived display values
//! - [`listing`] - Product listing joined with cart amounts
//! - [`config`] - Environment configuration
//! - [`error`] - Unified error type and Sentry helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod listing;

pub use cart::{CartError, CartStore};
pub use catalog::{CatalogError, Product, ProductCatalog};
pub use config::StorefrontConfig;
pub use error::StorefrontError;
