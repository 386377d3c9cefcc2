//! Cart contents: line items and pending markers.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;

use rust_decimal::Decimal;
use serde::Serialize;
use solemate_core::{CurrencyCode, Price, ProductId};

use super::CartError;
use crate::catalog::Product;

/// One product's entry in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    /// Catalog identifier, unique within a cart.
    pub product_id: ProductId,
    /// Display title.
    pub title: String,
    /// Price of a single unit.
    pub unit_price: Price,
    /// Number of units; never zero.
    pub quantity: NonZeroU32,
    /// Image URL.
    pub image: String,
}

impl LineItem {
    /// A single unit of `product`, filed under `product_id`.
    #[must_use]
    pub fn from_product(product_id: ProductId, product: Product, currency: CurrencyCode) -> Self {
        Self {
            product_id,
            title: product.title,
            unit_price: Price::new(product.price, currency),
            quantity: NonZeroU32::MIN,
            image: product.image,
        }
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.unit_price.times(self.quantity.get())
    }
}

/// Line items in insertion order plus the ids with a command in flight.
///
/// Read-only outside the cart store; obtain one with
/// [`CartStore::snapshot`](super::CartStore::snapshot).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartState {
    currency: CurrencyCode,
    lines: Vec<LineItem>,
    pending: HashSet<ProductId>,
}

impl Default for CartState {
    fn default() -> Self {
        Self::new(CurrencyCode::default())
    }
}

impl CartState {
    /// An empty cart priced in `currency`.
    #[must_use]
    pub fn new(currency: CurrencyCode) -> Self {
        Self {
            currency,
            lines: Vec::new(),
            pending: HashSet::new(),
        }
    }

    /// Currency the cart totals are expressed in.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Line items in the order they were first added.
    #[must_use]
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    /// The line for `product_id`, if present.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&LineItem> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether a command for `product_id` is in flight.
    #[must_use]
    pub fn is_pending(&self, product_id: ProductId) -> bool {
        self.pending.contains(&product_id)
    }

    /// Quantity of `product_id`, zero when absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.line(product_id).map_or(0, |l| l.quantity.get())
    }

    /// Product id → quantity for every line.
    #[must_use]
    pub fn amounts(&self) -> HashMap<ProductId, u32> {
        self.lines
            .iter()
            .map(|l| (l.product_id, l.quantity.get()))
            .collect()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity.get())).sum()
    }

    // -------------------------------------------------------------------------
    // Mutation (cart store only)
    // -------------------------------------------------------------------------

    fn line_mut(&mut self, product_id: ProductId) -> Option<&mut LineItem> {
        self.lines.iter_mut().find(|l| l.product_id == product_id)
    }

    /// Cart total if `product_id` had `quantity` units at `unit_price`.
    ///
    /// `None` when a subtotal or the total would overflow.
    fn total_with(
        &self,
        product_id: ProductId,
        unit_price: Price,
        quantity: NonZeroU32,
    ) -> Option<Decimal> {
        let subtotal = unit_price.checked_times(quantity.get())?.amount;
        self.lines
            .iter()
            .filter(|l| l.product_id != product_id)
            .try_fold(subtotal, |total, l| total.checked_add(l.subtotal().amount))
    }

    pub(super) fn mark_pending(&mut self, product_id: ProductId) {
        let inserted = self.pending.insert(product_id);
        debug_assert!(inserted, "product {product_id} was already pending");
    }

    pub(super) fn clear_pending(&mut self, product_id: ProductId) {
        self.pending.remove(&product_id);
    }

    /// Add one unit to an existing line.
    pub(super) fn increment(&mut self, product_id: ProductId) -> Result<LineItem, CartError> {
        let current = self
            .line(product_id)
            .map(|l| l.quantity)
            .ok_or(CartError::NotInCart(product_id))?;
        let quantity = current.checked_add(1).ok_or(CartError::InvalidQuantity {
            product_id,
            requested: i64::from(current.get()) + 1,
        })?;
        self.set_quantity(product_id, quantity)
    }

    /// Append `line`, or add one unit if its product is already present.
    pub(super) fn insert(&mut self, line: LineItem) -> Result<LineItem, CartError> {
        if self.line(line.product_id).is_some() {
            return self.increment(line.product_id);
        }
        if self
            .total_with(line.product_id, line.unit_price, line.quantity)
            .is_none()
        {
            return Err(CartError::InvalidQuantity {
                product_id: line.product_id,
                requested: i64::from(line.quantity.get()),
            });
        }
        self.lines.push(line.clone());
        Ok(line)
    }

    /// Set an existing line's quantity, keeping every subtotal and the total
    /// representable.
    pub(super) fn set_quantity(
        &mut self,
        product_id: ProductId,
        quantity: NonZeroU32,
    ) -> Result<LineItem, CartError> {
        let unit_price = self
            .line(product_id)
            .map(|l| l.unit_price)
            .ok_or(CartError::NotInCart(product_id))?;
        if self.total_with(product_id, unit_price, quantity).is_none() {
            return Err(CartError::InvalidQuantity {
                product_id,
                requested: i64::from(quantity.get()),
            });
        }
        let line = self
            .line_mut(product_id)
            .ok_or(CartError::NotInCart(product_id))?;
        line.quantity = quantity;
        Ok(line.clone())
    }

    pub(super) fn remove(&mut self, product_id: ProductId) -> Option<LineItem> {
        let index = self.lines.iter().position(|l| l.product_id == product_id)?;
        Some(self.lines.remove(index))
    }

    /// Drop every line. Pending markers belong to in-flight commands and stay.
    pub(super) fn clear_lines(&mut self) {
        self.lines.clear();
    }
}
