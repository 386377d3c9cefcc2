//! Product listing page model.
//!
//! Holds the catalog products shown on the home page and joins them with the
//! cart at read time: each tile carries the product's current cart amount and
//! whether an add-to-cart for it is in flight (the disabled button state).

use serde::Serialize;
use solemate_core::{CurrencyCode, Price, ProductId};
use tracing::{info, instrument, warn};

use crate::cart::CartStore;
use crate::catalog::{CatalogError, Product, ProductCatalog};

/// A catalog product with its price pre-formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedProduct {
    pub product: Product,
    pub price_formatted: String,
}

/// One product tile as displayed on the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductTile {
    pub id: ProductId,
    pub title: String,
    pub image: String,
    pub price: String,
    /// Units of this product in the cart.
    pub amount: u32,
    /// An add-to-cart for this product is in flight.
    pub adding: bool,
}

/// Listing state: loading until the first load completes, then the products.
#[derive(Debug, Clone)]
pub struct ProductListing {
    currency: CurrencyCode,
    loading: bool,
    products: Vec<ListedProduct>,
}

impl ProductListing {
    /// A listing that has not loaded yet.
    #[must_use]
    pub const fn new(currency: CurrencyCode) -> Self {
        Self {
            currency,
            loading: true,
            products: Vec::new(),
        }
    }

    /// Fetch every product from `catalog` and format its price.
    ///
    /// The loading flag is cleared whether or not the fetch succeeds; on
    /// failure the previously loaded products are kept.
    ///
    /// # Errors
    ///
    /// Returns the catalog error if the product list cannot be fetched.
    #[instrument(skip(self, catalog))]
    pub async fn load<C>(&mut self, catalog: &C) -> Result<(), CatalogError>
    where
        C: ProductCatalog + ?Sized,
    {
        let result = catalog.get_all_products().await;
        self.loading = false;

        let products = result.inspect_err(|e| warn!(error = %e, "Failed to load products"))?;
        info!(count = products.len(), "Loaded product listing");

        self.products = products
            .into_iter()
            .map(|product| ListedProduct {
                price_formatted: Price::new(product.price, self.currency).display(),
                product,
            })
            .collect();
        Ok(())
    }

    /// Whether the first load is still outstanding.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Loaded products in catalog order.
    #[must_use]
    pub fn products(&self) -> &[ListedProduct] {
        &self.products
    }

    /// Tiles for every product, joined with a single snapshot of `cart`.
    #[must_use]
    pub fn tiles(&self, cart: &CartStore) -> Vec<ProductTile> {
        let snapshot = cart.snapshot();
        self.products
            .iter()
            .map(|listed| ProductTile {
                id: listed.product.id,
                title: listed.product.title.clone(),
                image: listed.product.image.clone(),
                price: listed.price_formatted.clone(),
                amount: snapshot.quantity_of(listed.product.id),
                adding: snapshot.is_pending(listed.product.id),
            })
            .collect()
    }
}
