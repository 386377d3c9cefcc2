//! Derived cart values for display.
//!
//! Everything here is recomputed from a [`CartState`] on each call; nothing is
//! cached.

use serde::Serialize;
use solemate_core::{CurrencyCode, Price, ProductId};

use super::state::{CartState, LineItem};

/// Formatted `unit_price × quantity` for one line.
#[must_use]
pub fn line_subtotal(item: &LineItem) -> String {
    item.subtotal().display()
}

/// Sum of every line's subtotal; zero for an empty cart.
#[must_use]
pub fn cart_total(state: &CartState) -> Price {
    Price::total(
        state.currency(),
        state.lines().iter().map(|l| l.subtotal().amount),
    )
}

/// Whether the cart has no lines, i.e. the empty-cart view applies.
#[must_use]
pub fn is_empty(state: &CartState) -> bool {
    state.is_empty()
}

/// Cart line display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub title: String,
    pub image: String,
    /// Formatted unit price.
    pub price: String,
    pub quantity: u32,
    /// Formatted line subtotal.
    pub subtotal: String,
    /// A command for this product is still in flight.
    pub pending: bool,
}

/// Cart display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    /// Formatted cart total.
    pub total: String,
    pub item_count: u64,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty(currency: CurrencyCode) -> Self {
        Self {
            items: Vec::new(),
            total: Price::zero(currency).display(),
            item_count: 0,
        }
    }

    /// Whether the empty-cart view applies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&CartState> for CartView {
    fn from(state: &CartState) -> Self {
        Self {
            items: state
                .lines()
                .iter()
                .map(|line| CartLineView {
                    product_id: line.product_id,
                    title: line.title.clone(),
                    image: line.image.clone(),
                    price: line.unit_price.display(),
                    quantity: line.quantity.get(),
                    subtotal: line_subtotal(line),
                    pending: state.is_pending(line.product_id),
                })
                .collect(),
            total: cart_total(state).display(),
            item_count: state.item_count(),
        }
    }
}
