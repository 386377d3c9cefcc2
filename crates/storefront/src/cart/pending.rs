//! Scoped pending markers.

use std::sync::Arc;

use solemate_core::ProductId;

use super::CartStoreInner;
use super::state::CartState;

/// Clears a product's pending marker when the owning command ends.
///
/// Created under the cart lock right after the marker is set. The marker is
/// released either explicitly with [`release`](Self::release), in the same
/// critical section that applies the command's outcome, or on drop. Dropping
/// covers early returns and futures cancelled mid-lookup.
pub(super) struct PendingGuard {
    store: Arc<CartStoreInner>,
    product_id: ProductId,
    armed: bool,
}

impl PendingGuard {
    pub(super) fn new(store: Arc<CartStoreInner>, product_id: ProductId) -> Self {
        Self {
            store,
            product_id,
            armed: true,
        }
    }

    /// Clear the marker inside a critical section the caller already holds.
    pub(super) fn release(mut self, state: &mut CartState) {
        state.clear_pending(self.product_id);
        self.armed = false;
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!(product_id = %self.product_id, "Releasing pending marker");
            self.store.lock().clear_pending(self.product_id);
        }
    }
}
