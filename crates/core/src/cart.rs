//! The cart collection and its mutation semantics.
//!
//! A [`Cart`] is an insertion-ordered sequence of [`CartItem`]s with two
//! invariants:
//!
//! - at most one item per distinct product id
//! - no item with quantity zero (an item reaching zero is removed)
//!
//! All operations here are pure and synchronous; persistence and remote
//! sync live in the client crate's middleware layer.

use serde::{Deserialize, Serialize};

use crate::types::{Price, Product, ProductId};

/// A (product, quantity) pair. Quantity is strictly positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

/// Outcome of a cart mutation, used to drive user-facing notices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartMutation {
    /// A new line was appended for the product ("product added" notice).
    Added {
        /// Title of the added product.
        title: String,
    },
    /// An existing line changed quantity; no notice.
    Changed,
    /// A line was removed ("product removed" notice).
    Removed {
        /// Title of the removed product.
        title: String,
    },
    /// No line matched; the cart is unchanged.
    Noop,
}

/// An insertion-ordered cart: the first-added product stays first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from raw items, restoring the invariants.
    ///
    /// Items read back from the session slot or the remote document may
    /// predate an invariant-violating write; duplicates are summed into the
    /// first occurrence and non-positive quantities are dropped.
    #[must_use]
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            if item.quantity == 0 {
                continue;
            }
            match cart.find_mut(&item.product.id) {
                Some(existing) => existing.quantity += item.quantity,
                None => cart.items.push(item),
            }
        }
        cart
    }

    /// Add one unit of `product`.
    ///
    /// If a line for the product already exists its quantity is incremented
    /// by 1; otherwise a new line with quantity 1 is appended and
    /// [`CartMutation::Added`] is reported.
    pub fn add(&mut self, product: Product) -> CartMutation {
        if let Some(existing) = self.find_mut(&product.id) {
            existing.quantity += 1;
            return CartMutation::Changed;
        }

        let title = product.title.clone();
        self.items.push(CartItem {
            product,
            quantity: 1,
        });
        CartMutation::Added { title }
    }

    /// Set the quantity of the line for `product_id`.
    ///
    /// A quantity of 0 removes the line (reported as
    /// [`CartMutation::Removed`]). Negative quantities are unrepresentable
    /// here; callers clamp them to 0 at the edge. An absent product id is a
    /// no-op.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> CartMutation {
        let Some(position) = self.items.iter().position(|i| &i.product.id == product_id) else {
            return CartMutation::Noop;
        };

        if quantity == 0 {
            let removed = self.items.remove(position);
            return CartMutation::Removed {
                title: removed.product.title,
            };
        }

        if let Some(item) = self.items.get_mut(position) {
            item.quantity = quantity;
        }
        CartMutation::Changed
    }

    /// Remove the line for `product_id`, if present.
    pub fn remove(&mut self, product_id: &ProductId) -> CartMutation {
        let Some(position) = self.items.iter().position(|i| &i.product.id == product_id) else {
            return CartMutation::Noop;
        };

        let removed = self.items.remove(position);
        CartMutation::Removed {
            title: removed.product.title,
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Merge a guest cart into a remote cart.
    ///
    /// For each guest item: if the remote cart has a line for the same
    /// product the quantities are summed, otherwise the guest line is
    /// appended. Remote ordering is preserved; guest-only lines keep their
    /// guest order at the tail.
    #[must_use]
    pub fn merge(guest: Self, mut remote: Self) -> Self {
        for guest_item in guest.items {
            match remote.find_mut(&guest_item.product.id) {
                Some(existing) => existing.quantity += guest_item.quantity,
                None => remote.items.push(guest_item),
            }
        }
        remote
    }

    /// The items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// The line for `product_id`, if present.
    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.product.id == product_id)
    }

    /// Total item count: the sum of quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Total price: the sum over items of price x quantity.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items
            .iter()
            .map(|i| i.product.price * i.quantity)
            .sum()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn find_mut(&mut self, product_id: &ProductId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|i| &i.product.id == product_id)
    }
}
