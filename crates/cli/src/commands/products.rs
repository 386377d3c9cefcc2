//! Product listing command.

use std::io::Write;

use solemate_storefront::StorefrontConfig;
use solemate_storefront::cart::CartStore;
use solemate_storefront::catalog::ProductCatalog;
use solemate_storefront::error::{StorefrontError, report};
use solemate_storefront::listing::ProductListing;

use super::render;

/// Print every catalog product with its formatted price.
///
/// # Errors
///
/// Returns an error if the catalog cannot be read or stdout is closed.
pub async fn list(
    catalog: &dyn ProductCatalog,
    config: &StorefrontConfig,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut listing = ProductListing::new(config.currency);
    if let Err(e) = listing.load(catalog).await {
        let err = StorefrontError::from(e);
        report(&err);
        return Err(err.into());
    }

    // No session here, so every tile shows an empty cart
    let tiles = listing.tiles(&CartStore::new(config.cart));

    let mut out = std::io::stdout().lock();
    render::tiles(&mut out, &tiles, json)?;
    out.flush()?;
    Ok(())
}
