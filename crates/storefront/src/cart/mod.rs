//! Cart store.
//!
//! [`CartStore`] is the sole owner of the cart's [`CartState`]. Every change
//! goes through one of its commands:
//!
//! - [`add_to_cart`](CartStore::add_to_cart) - one more unit of a product,
//!   resolving catalog details the first time a product is added
//! - [`update_amount`](CartStore::update_amount) - set an absolute quantity
//! - [`remove_from_cart`](CartStore::remove_from_cart) - drop a line
//!
//! Readers take a [`snapshot`](CartStore::snapshot) and derive display values
//! from it with the [`view`] functions.
//!
//! # Concurrency
//!
//! The whole cart sits behind one mutex that is never held across an
//! `.await`. Only adding a new product suspends (on the catalog lookup); while
//! it does, the product is marked pending and any further add or quantity
//! update for that product is rejected with [`CartError::AlreadyPending`].
//! Commands for other products are unaffected and may finish first.

mod pending;
mod state;
pub mod view;

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use solemate_core::ProductId;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::catalog::{CatalogError, ProductCatalog};
use crate::config::CartSettings;

use pending::PendingGuard;
pub use state::{CartState, LineItem};
pub use view::{CartLineView, CartView};

/// Errors returned by cart commands.
///
/// None of these leave the cart in a modified state.
#[derive(Debug, Error)]
pub enum CartError {
    /// Product details could not be resolved for a product not yet in the cart.
    #[error("Could not add product {product_id}: {source}")]
    CatalogLookupFailed {
        /// Product that was being added.
        product_id: ProductId,
        /// Underlying catalog failure.
        #[source]
        source: CatalogError,
    },

    /// Requested quantity is zero or negative, beyond `u32::MAX`, or would
    /// make a subtotal or the cart total overflow.
    #[error("Invalid quantity {requested} for product {product_id}")]
    InvalidQuantity {
        /// Product whose quantity was being changed.
        product_id: ProductId,
        /// The rejected quantity.
        requested: i64,
    },

    /// Quantity change for a product that has no line in the cart.
    #[error("Product {0} is not in the cart")]
    NotInCart(ProductId),

    /// Another command for the same product has not finished yet.
    #[error("A request for product {0} is already in progress")]
    AlreadyPending(ProductId),
}

impl CartError {
    /// Product the failed command targeted.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        match self {
            Self::CatalogLookupFailed { product_id, .. }
            | Self::InvalidQuantity { product_id, .. } => *product_id,
            Self::NotInCart(product_id) | Self::AlreadyPending(product_id) => *product_id,
        }
    }
}

// =============================================================================
// CartStore
// =============================================================================

/// Shared handle to a cart.
///
/// Cheap to clone; all clones operate on the same cart.
#[derive(Debug, Clone, Default)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

#[derive(Debug, Default)]
struct CartStoreInner {
    state: Mutex<CartState>,
    settings: CartSettings,
}

impl CartStoreInner {
    /// Lock the cart, recovering from a poisoned mutex.
    ///
    /// No critical section can leave the state half-updated, so the data is
    /// still consistent after a panic elsewhere.
    fn lock(&self) -> MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CartStore {
    /// Create an empty cart.
    #[must_use]
    pub fn new(settings: CartSettings) -> Self {
        Self {
            inner: Arc::new(CartStoreInner {
                state: Mutex::new(CartState::new(settings.currency)),
                settings,
            }),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Copy of the current cart contents.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.inner.lock().clone()
    }

    /// Display-ready view of the current cart contents.
    #[must_use]
    pub fn view(&self) -> CartView {
        CartView::from(&self.snapshot())
    }

    /// Whether an add or quantity update for `product_id` is in flight.
    #[must_use]
    pub fn is_pending(&self, product_id: ProductId) -> bool {
        self.inner.lock().is_pending(product_id)
    }

    /// Quantity of `product_id` in the cart, zero when absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.inner.lock().quantity_of(product_id)
    }

    /// Product id → quantity for every line.
    #[must_use]
    pub fn amounts(&self) -> HashMap<ProductId, u32> {
        self.inner.lock().amounts()
    }

    /// Total number of units in the cart.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.inner.lock().item_count()
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Add one unit of `product_id` to the cart.
    ///
    /// A product already in the cart gains one unit without consulting the
    /// catalog. A new product is resolved through `catalog`, bounded by the
    /// configured lookup timeout, and appended with quantity 1.
    ///
    /// The product is pending for the duration of the command. Dropping the
    /// returned future before it completes releases the marker and leaves the
    /// cart unchanged.
    ///
    /// # Errors
    ///
    /// - [`CartError::AlreadyPending`] if a command for this product is in flight
    /// - [`CartError::CatalogLookupFailed`] if the lookup fails or times out
    /// - [`CartError::InvalidQuantity`] if one more unit would overflow the
    ///   line's quantity or the cart total
    #[instrument(skip(self, catalog), fields(product_id = %product_id))]
    pub async fn add_to_cart<C>(
        &self,
        product_id: ProductId,
        catalog: &C,
    ) -> Result<LineItem, CartError>
    where
        C: ProductCatalog + ?Sized,
    {
        let pending = {
            let mut state = self.inner.lock();
            if state.is_pending(product_id) {
                return Err(CartError::AlreadyPending(product_id));
            }
            if state.line(product_id).is_some() {
                let line = state.increment(product_id)?;
                debug!(quantity = line.quantity.get(), "Incremented existing line");
                return Ok(line);
            }
            state.mark_pending(product_id);
            PendingGuard::new(Arc::clone(&self.inner), product_id)
        };

        let timeout = self.inner.settings.lookup_timeout;
        let product = match tokio::time::timeout(timeout, catalog.get_product(product_id)).await {
            Ok(Ok(product)) => product,
            Ok(Err(source)) => {
                warn!(error = %source, "Product lookup failed");
                return Err(CartError::CatalogLookupFailed { product_id, source });
            }
            Err(_) => {
                warn!(?timeout, "Product lookup timed out");
                return Err(CartError::CatalogLookupFailed {
                    product_id,
                    source: CatalogError::Timeout(timeout),
                });
            }
        };

        let line = LineItem::from_product(product_id, product, self.inner.settings.currency);
        let mut state = self.inner.lock();
        let inserted = state.insert(line);
        pending.release(&mut state);
        drop(state);

        let line = inserted.inspect_err(|e| warn!(error = %e, "Line rejected"))?;

        debug!(title = %line.title, "Added new line");
        Ok(line)
    }

    /// Set the quantity of a product already in the cart.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`] if `new_quantity` is not positive or
    ///   the resulting total would overflow
    /// - [`CartError::AlreadyPending`] if an add for this product is in flight
    /// - [`CartError::NotInCart`] if the product has no line
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub fn update_amount(
        &self,
        product_id: ProductId,
        new_quantity: i64,
    ) -> Result<LineItem, CartError> {
        let quantity = positive_quantity(product_id, new_quantity)?;
        let mut state = self.inner.lock();
        let line = set_amount(&mut state, product_id, quantity)?;
        drop(state);

        debug!(quantity = line.quantity.get(), "Updated amount");
        Ok(line)
    }

    /// Add one unit to a product already in the cart.
    ///
    /// # Errors
    ///
    /// Same as [`update_amount`](Self::update_amount).
    pub fn increment(&self, product_id: ProductId) -> Result<LineItem, CartError> {
        self.step(product_id, 1)
    }

    /// Remove one unit from a product already in the cart.
    ///
    /// Decrementing a single-unit line is rejected with
    /// [`CartError::InvalidQuantity`]; use
    /// [`remove_from_cart`](Self::remove_from_cart) to drop it.
    ///
    /// # Errors
    ///
    /// Same as [`update_amount`](Self::update_amount).
    pub fn decrement(&self, product_id: ProductId) -> Result<LineItem, CartError> {
        self.step(product_id, -1)
    }

    /// Remove a product's line. Returns `false` if it was not in the cart.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub fn remove_from_cart(&self, product_id: ProductId) -> bool {
        let removed = self.inner.lock().remove(product_id).is_some();
        debug!(removed, "Remove from cart");
        removed
    }

    /// Empty the cart at the end of a session.
    ///
    /// Adds still in flight are not cancelled and will land in the emptied cart.
    pub fn clear(&self) {
        self.inner.lock().clear_lines();
        debug!("Cart cleared");
    }

    /// Read-modify-write of a quantity under a single lock.
    fn step(&self, product_id: ProductId, delta: i64) -> Result<LineItem, CartError> {
        let mut state = self.inner.lock();
        let current = state
            .line(product_id)
            .map(|l| i64::from(l.quantity.get()))
            .ok_or(CartError::NotInCart(product_id))?;
        let quantity = positive_quantity(product_id, current + delta)?;
        set_amount(&mut state, product_id, quantity)
    }
}

fn positive_quantity(product_id: ProductId, requested: i64) -> Result<NonZeroU32, CartError> {
    u32::try_from(requested)
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or(CartError::InvalidQuantity {
            product_id,
            requested,
        })
}

fn set_amount(
    state: &mut CartState,
    product_id: ProductId,
    quantity: NonZeroU32,
) -> Result<LineItem, CartError> {
    if state.is_pending(product_id) {
        return Err(CartError::AlreadyPending(product_id));
    }
    state.set_quantity(product_id, quantity)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use solemate_core::CurrencyCode;

    use super::*;
    use crate::catalog::{InMemoryCatalog, Product};

    /// Catalog with one product that counts lookups.
    #[derive(Default)]
    struct CountingCatalog {
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl ProductCatalog for CountingCatalog {
        async fn get_all_products(&self) -> Result<Vec<Product>, CatalogError> {
            Ok(vec![])
        }

        async fn get_product(&self, id: ProductId) -> Result<Product, CatalogError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if id.as_i32() == 1 {
                Ok(Product {
                    id,
                    title: "Shoe".to_string(),
                    price: Decimal::new(10000, 2),
                    image: "https://img/1.jpg".to_string(),
                })
            } else {
                Err(CatalogError::NotFound(format!("Product not found: {id}")))
            }
        }
    }

    /// Catalog whose lookups never resolve.
    struct StalledCatalog;

    #[async_trait]
    impl ProductCatalog for StalledCatalog {
        async fn get_all_products(&self) -> Result<Vec<Product>, CatalogError> {
            std::future::pending().await
        }

        async fn get_product(&self, _id: ProductId) -> Result<Product, CatalogError> {
            std::future::pending().await
        }
    }

    const P1: ProductId = ProductId::new(1);
    const MISSING: ProductId = ProductId::new(99);

    #[tokio::test]
    async fn test_add_new_then_existing() {
        let store = CartStore::default();
        let catalog = CountingCatalog::default();

        let line = store.add_to_cart(P1, &catalog).await.unwrap();
        assert_eq!(line.quantity.get(), 1);
        assert_eq!(line.title, "Shoe");
        assert_eq!(line.unit_price.currency_code, CurrencyCode::BRL);

        let line = store.add_to_cart(P1, &catalog).await.unwrap();
        assert_eq!(line.quantity.get(), 2);
        assert_eq!(catalog.lookups.load(Ordering::SeqCst), 1);
        assert!(!store.is_pending(P1));
    }

    #[tokio::test]
    async fn test_failed_lookup_leaves_cart_unchanged() {
        let store = CartStore::default();
        let catalog = CountingCatalog::default();
        store.add_to_cart(P1, &catalog).await.unwrap();
        let before = store.snapshot();

        let err = store.add_to_cart(MISSING, &catalog).await.unwrap_err();
        assert!(matches!(
            err,
            CartError::CatalogLookupFailed { product_id, ref source }
                if product_id == MISSING && source.is_not_found()
        ));
        assert_eq!(store.snapshot(), before);
        assert!(!store.is_pending(MISSING));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_timeout_releases_pending() {
        let store = CartStore::new(CartSettings {
            lookup_timeout: Duration::from_secs(5),
            currency: CurrencyCode::BRL,
        });

        let err = store.add_to_cart(P1, &StalledCatalog).await.unwrap_err();
        assert!(matches!(
            err,
            CartError::CatalogLookupFailed {
                source: CatalogError::Timeout(_),
                ..
            }
        ));
        assert!(!store.is_pending(P1));
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_add_releases_pending() {
        let store = CartStore::default();
        let add = store.add_to_cart(P1, &StalledCatalog);
        let mut add = Box::pin(add);

        // Poll once so the command marks the product pending and suspends.
        assert!(poll_once(add.as_mut()).await.is_none());
        assert!(store.is_pending(P1));

        drop(add);
        assert!(!store.is_pending(P1));
        assert!(store.snapshot().is_empty());
    }

    async fn poll_once<F: std::future::Future + Unpin>(fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            out = fut => Some(out),
            () = std::future::ready(()) => None,
        }
    }

    #[tokio::test]
    async fn test_update_amount() {
        let store = CartStore::default();
        store.add_to_cart(P1, &CountingCatalog::default()).await.unwrap();

        let line = store.update_amount(P1, 5).unwrap();
        assert_eq!(line.quantity.get(), 5);
        assert_eq!(store.quantity_of(P1), 5);
    }

    #[tokio::test]
    async fn test_update_amount_rejects_non_positive() {
        let store = CartStore::default();
        store.add_to_cart(P1, &CountingCatalog::default()).await.unwrap();

        for requested in [0, -1, i64::from(u32::MAX) + 1] {
            let err = store.update_amount(P1, requested).unwrap_err();
            assert!(matches!(
                err,
                CartError::InvalidQuantity { requested: r, .. } if r == requested
            ));
        }
        assert_eq!(store.quantity_of(P1), 1);
    }

    fn huge_catalog(price: Decimal) -> InMemoryCatalog {
        InMemoryCatalog::new(
            [1, 2]
                .into_iter()
                .map(|id| Product {
                    id: ProductId::new(id),
                    title: format!("Gold shoe {id}"),
                    price,
                    image: String::new(),
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_update_amount_rejects_overflowing_subtotal() {
        let store = CartStore::default();
        let catalog = huge_catalog(Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0));
        store.add_to_cart(P1, &catalog).await.unwrap();

        let err = store.update_amount(P1, 1_000_000_000).unwrap_err();
        assert!(matches!(
            err,
            CartError::InvalidQuantity { requested: 1_000_000_000, .. }
        ));
        assert_eq!(store.quantity_of(P1), 1);
        assert_eq!(store.view().total, "R$100000000000000000000.00");
    }

    #[tokio::test]
    async fn test_add_rejects_overflowing_total() {
        let store = CartStore::default();
        let half = Decimal::from_i128_with_scale(50_000_000_000_000_000_000_000_000_000, 0);
        let catalog = huge_catalog(half);
        store.add_to_cart(P1, &catalog).await.unwrap();

        let p2 = ProductId::new(2);
        let err = store.add_to_cart(p2, &catalog).await.unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity { product_id, requested: 1 } if product_id == p2));
        assert!(!store.is_pending(p2));
        assert_eq!(store.view().items.len(), 1);

        // Incrementing the existing line overflows the same way
        assert!(matches!(
            store.add_to_cart(P1, &catalog).await,
            Err(CartError::InvalidQuantity { requested: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_add_at_max_quantity_is_rejected() {
        let store = CartStore::default();
        let catalog = CountingCatalog::default();
        store.add_to_cart(P1, &catalog).await.unwrap();
        store.update_amount(P1, i64::from(u32::MAX)).unwrap();

        let err = store.add_to_cart(P1, &catalog).await.unwrap_err();
        assert!(matches!(
            err,
            CartError::InvalidQuantity { requested, .. } if requested == i64::from(u32::MAX) + 1
        ));
        assert_eq!(store.quantity_of(P1), u32::MAX);
        assert!(store.increment(P1).is_err());
    }

    #[test]
    fn test_update_amount_absent_product() {
        let store = CartStore::default();
        assert!(matches!(
            store.update_amount(P1, 2),
            Err(CartError::NotInCart(id)) if id == P1
        ));
        // Validation happens before the presence check
        assert!(matches!(
            store.update_amount(P1, 0),
            Err(CartError::InvalidQuantity { .. })
        ));
    }

    #[tokio::test]
    async fn test_increment_and_decrement() {
        let store = CartStore::default();
        store.add_to_cart(P1, &CountingCatalog::default()).await.unwrap();

        assert_eq!(store.increment(P1).unwrap().quantity.get(), 2);
        assert_eq!(store.decrement(P1).unwrap().quantity.get(), 1);

        let err = store.decrement(P1).unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity { requested: 0, .. }));
        assert_eq!(store.quantity_of(P1), 1);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let store = CartStore::default();
        let catalog = CountingCatalog::default();
        store.add_to_cart(P1, &catalog).await.unwrap();

        assert!(!store.remove_from_cart(MISSING));
        assert_eq!(store.item_count(), 1);
        assert!(store.remove_from_cart(P1));
        assert!(store.snapshot().is_empty());

        store.add_to_cart(P1, &catalog).await.unwrap();
        store.clear();
        assert!(store.snapshot().is_empty());
        assert!(store.amounts().is_empty());
    }

    #[test]
    fn test_cart_error_product_id() {
        let err = CartError::AlreadyPending(P1);
        assert_eq!(err.product_id(), P1);
        assert_eq!(
            err.to_string(),
            "A request for product 1 is already in progress"
        );

        let err = CartError::InvalidQuantity {
            product_id: P1,
            requested: -2,
        };
        assert_eq!(err.to_string(), "Invalid quantity -2 for product 1");
    }
}
