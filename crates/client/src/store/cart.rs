//! The cart slice: actions and pure reducer.

use truewave_core::{Cart, CartMutation, Product, ProductId};

use super::Notice;

/// The cart slice of the root state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartState {
    pub cart: Cart,
}

/// Cart slice actions.
#[derive(Debug, Clone)]
pub enum CartAction {
    /// Add one unit of the product.
    Add(Product),
    /// Set the quantity of an existing line; 0 removes it.
    SetQuantity { product_id: ProductId, quantity: u32 },
    /// Remove a line.
    Remove(ProductId),
    /// Empty the cart (also the remote-erase path for signed-in users).
    Clear,
    /// Replace the whole cart with a reconciled snapshot. Not persisted or
    /// synced by middleware; the snapshot already came from those places.
    Replace(Cart),
}

pub(super) fn reduce(state: &mut CartState, action: &CartAction) -> Option<Notice> {
    let mutation = match action {
        CartAction::Add(product) => state.cart.add(product.clone()),
        CartAction::SetQuantity {
            product_id,
            quantity,
        } => state.cart.set_quantity(product_id, *quantity),
        CartAction::Remove(product_id) => state.cart.remove(product_id),
        CartAction::Clear => {
            state.cart.clear();
            CartMutation::Changed
        }
        CartAction::Replace(cart) => {
            state.cart = cart.clone();
            CartMutation::Changed
        }
    };

    match mutation {
        CartMutation::Added { title } => Some(Notice::ProductAdded { title }),
        CartMutation::Removed { title } => Some(Notice::ProductRemoved { title }),
        CartMutation::Changed | CartMutation::Noop => None,
    }
}
