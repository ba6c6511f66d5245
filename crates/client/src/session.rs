//! Per-session cart persistence.
//!
//! Guest carts live in a session-scoped slot so a page reload does not
//! lose them. The slot holds the cart as a JSON string; a value that no
//! longer parses is treated as absent. Slot operations are infallible by
//! contract: a failed write degrades the experience, it never fails an
//! action.

use std::sync::{Arc, RwLock};

use tracing::warn;

use truewave_core::Cart;

use crate::store::{Action, CartAction, Middleware, RootState, Store};

/// A session-scoped storage slot for the cart.
pub trait CartSlot: Send + Sync {
    /// Read the stored cart, if any. Unparseable contents read as `None`.
    fn load(&self) -> Option<Cart>;

    /// Store a snapshot of the cart.
    fn store(&self, cart: &Cart);

    /// Remove the stored cart.
    fn clear(&self);
}

/// An in-memory slot holding the serialized form, like the real one does.
#[derive(Clone, Default)]
pub struct MemorySlot {
    value: Arc<RwLock<Option<String>>>,
}

impl MemorySlot {
    /// An empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw stored string, for tests.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.value
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Overwrite the raw stored string, for tests.
    pub fn set_raw(&self, raw: impl Into<String>) {
        *self
            .value
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(raw.into());
    }
}

impl CartSlot for MemorySlot {
    fn load(&self) -> Option<Cart> {
        let raw = self.raw()?;
        match serde_json::from_str(&raw) {
            Ok(items) => Some(Cart::from_items(items)),
            Err(error) => {
                warn!(%error, "discarding unparseable session cart");
                None
            }
        }
    }

    fn store(&self, cart: &Cart) {
        match serde_json::to_string(cart) {
            Ok(json) => self.set_raw(json),
            Err(error) => warn!(%error, "failed to serialize cart for session slot"),
        }
    }

    fn clear(&self) {
        *self
            .value
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
    }
}

/// Middleware mirroring cart mutations into the session slot.
///
/// `Replace` is skipped on purpose: reconciled snapshots arrive from the
/// remote mirror after sign-in, and the guest slot has already been cleared
/// by then.
pub struct SlotPersistence {
    slot: Arc<dyn CartSlot>,
}

impl SlotPersistence {
    pub fn new(slot: Arc<dyn CartSlot>) -> Self {
        Self { slot }
    }
}

impl Middleware for SlotPersistence {
    fn after_dispatch(&self, _store: &Store, action: &Action, state: &RootState) {
        match action {
            Action::Cart(CartAction::Clear) => self.slot.clear(),
            Action::Cart(CartAction::Replace(_)) | Action::Auth(_) => {}
            Action::Cart(_) => self.slot.store(&state.cart.cart),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use truewave_core::{Price, Product, ProductId};

    fn product(id: &str) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            description: String::new(),
            price: Price::from_cents(1000),
            category: "misc".into(),
            image_url: String::new(),
            image_path: None,
            rating: 0.0,
            rating_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_slot_roundtrip() {
        let slot = MemorySlot::new();
        assert!(slot.load().is_none());

        let mut cart = Cart::new();
        cart.add(product("p1"));
        CartSlot::store(&slot, &cart);

        assert_eq!(slot.load().unwrap(), cart);

        slot.clear();
        assert!(slot.load().is_none());
    }

    #[test]
    fn test_unparseable_slot_reads_as_empty() {
        let slot = MemorySlot::new();
        slot.set_raw("not json at all");
        assert!(slot.load().is_none());
    }

    #[test]
    fn test_mutations_mirror_into_slot() {
        let slot = Arc::new(MemorySlot::new());
        let store = Store::new();
        store.add_middleware(Arc::new(SlotPersistence::new(
            Arc::<MemorySlot>::clone(&slot),
        )));

        store.dispatch(Action::Cart(CartAction::Add(product("p1"))));
        assert_eq!(slot.load().unwrap().item_count(), 1);

        store.dispatch(Action::Cart(CartAction::SetQuantity {
            product_id: ProductId::new("p1"),
            quantity: 3,
        }));
        assert_eq!(slot.load().unwrap().item_count(), 3);

        store.dispatch(Action::Cart(CartAction::Clear));
        assert!(slot.raw().is_none());
    }

    #[test]
    fn test_replace_does_not_touch_slot() {
        let slot = Arc::new(MemorySlot::new());
        let store = Store::new();
        store.add_middleware(Arc::new(SlotPersistence::new(
            Arc::<MemorySlot>::clone(&slot),
        )));

        let mut cart = Cart::new();
        cart.add(product("p1"));
        store.dispatch(Action::Cart(CartAction::Replace(cart)));

        assert!(slot.raw().is_none());
    }
}
