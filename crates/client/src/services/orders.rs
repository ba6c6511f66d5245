//! Checkout and order history.
//!
//! Totals are computed in decimal space at full precision: the stored
//! order total for a $25.00 subtotal is 26.8125, and "$26.81" appears only
//! when a total is formatted for display.

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, instrument, warn};

use truewave_core::{Cart, Order, OrderDraft, OrderId, OrderItem, OrderStatus, Price, UserId};

use crate::backend::{BackendError, OrderRepository};
use crate::store::{Action, CartAction, Store};

/// Sales tax applied at checkout (7.25%).
pub const TAX_RATE: Decimal = Decimal::from_parts(725, 0, 0, false, 4);

/// Errors surfaced by checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Orders require a signed-in user.
    #[error("checkout requires a signed-in user")]
    Unauthenticated,

    /// There is nothing to order.
    #[error("the cart is empty")]
    EmptyCart,

    /// The order could not be submitted.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// The three figures shown at checkout, at full precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutSummary {
    pub subtotal: Price,
    pub tax: Price,
    pub total: Price,
}

impl CheckoutSummary {
    /// Compute checkout figures for a cart.
    #[must_use]
    pub fn for_cart(cart: &Cart) -> Self {
        let subtotal = cart.subtotal();
        let total = subtotal.with_rate(TAX_RATE);
        // Non-negative by construction; fall back to zero rather than panic
        let tax = Price::new(subtotal.amount() * TAX_RATE).unwrap_or(Price::ZERO);
        Self {
            subtotal,
            tax,
            total,
        }
    }
}

/// Checkout and order history over the orders collection.
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
}

impl OrderService {
    #[must_use]
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    /// Submit the current cart as an order and clear the cart.
    ///
    /// The order captures each line's title, price, and image at submission
    /// time, and stores the taxed total at full precision with status
    /// `pending`. On success the cart is cleared locally and remotely; on
    /// failure the cart is left untouched so the shopper can retry.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Unauthenticated`] for guests,
    /// [`CheckoutError::EmptyCart`] for an empty cart, and
    /// [`CheckoutError::Backend`] when the submission fails.
    #[instrument(skip_all)]
    pub async fn place_order(&self, store: &Store) -> Result<OrderId, CheckoutError> {
        let state = store.state();
        let user = state.auth.user.ok_or(CheckoutError::Unauthenticated)?;
        let cart = state.cart.cart;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let summary = CheckoutSummary::for_cart(&cart);
        let draft = OrderDraft {
            user_id: user.id.clone(),
            user_email: user.email.clone(),
            items: cart.items().iter().map(OrderItem::from).collect(),
            total_amount: summary.total,
            status: OrderStatus::Pending,
        };

        let id = match self.orders.insert(draft).await {
            Ok(id) => id,
            Err(error) => {
                warn!(user = %user.id, %error, "order submission failed; cart kept");
                return Err(error.into());
            }
        };

        info!(order = %id, user = %user.id, total = %summary.total, "order placed");
        store.dispatch(Action::Cart(CartAction::Clear));
        Ok(id)
    }

    /// A user's orders, newest first, falling back to unordered retrieval
    /// when the ordered query is unavailable.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if both retrieval paths fail.
    pub async fn orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, BackendError> {
        match self.orders.list_for_user_ordered(user_id).await {
            Ok(orders) => Ok(orders),
            Err(BackendError::OrderedQueryUnavailable(reason)) => {
                warn!(user = %user_id, %reason, "ordered order query unavailable; falling back");
                self.orders.list_for_user(user_id).await
            }
            Err(error) => Err(error),
        }
    }

    /// A single order.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the lookup fails.
    pub async fn order(&self, id: &OrderId) -> Result<Option<Order>, BackendError> {
        self.orders.get(id).await
    }

    /// Every order in the store, for the admin panel.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the listing fails.
    pub async fn all_orders(&self) -> Result<Vec<Order>, BackendError> {
        self.orders.list_all().await
    }

    /// Move an order to a new status, for the admin panel.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the order is missing or the write fails.
    pub async fn set_status(&self, id: &OrderId, status: OrderStatus) -> Result<(), BackendError> {
        self.orders.set_status(id, status).await?;
        info!(order = %id, %status, "order status updated");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use truewave_core::{Email, Product, ProductId, User};

    use crate::backend::memory::MemoryBackend;
    use crate::store::AuthAction;

    fn product(id: &str, cents: u64) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            description: String::new(),
            price: Price::from_cents(cents),
            category: "misc".into(),
            image_url: format!("https://cdn.example.com/{id}.jpg"),
            image_path: None,
            rating: 0.0,
            rating_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn user(id: &str) -> User {
        User {
            id: UserId::new(id),
            email: Email::parse("user@example.com").unwrap(),
            display_name: None,
            photo_url: None,
            email_verified: true,
            is_admin: false,
        }
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_checkout_summary_for_25_dollar_cart() {
        let mut cart = Cart::new();
        cart.add(product("a", 2500));

        let summary = CheckoutSummary::for_cart(&cart);
        assert_eq!(summary.subtotal.amount(), dec("25.00"));
        assert_eq!(summary.tax.amount(), dec("1.812500"));
        assert_eq!(summary.total.amount(), dec("26.812500"));
        assert_eq!(summary.total.display(), "$26.81");
    }

    #[tokio::test]
    async fn test_place_order_captures_cart_and_clears_it() {
        let backend = MemoryBackend::new();
        let service = OrderService::new(Arc::new(backend.clone()));
        let store = Store::new();

        store.dispatch(Action::Auth(AuthAction::SetUser(Some(user("u1")))));
        store.dispatch(Action::Cart(CartAction::Add(product("a", 2500))));

        let id = service.place_order(&store).await.unwrap();

        let order = service.order(&id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount.amount(), dec("26.812500"));
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 1);

        assert!(store.state().cart.cart.is_empty());
    }

    #[tokio::test]
    async fn test_guest_checkout_is_rejected() {
        let backend = MemoryBackend::new();
        let service = OrderService::new(Arc::new(backend));
        let store = Store::new();
        store.dispatch(Action::Cart(CartAction::Add(product("a", 2500))));

        assert!(matches!(
            service.place_order(&store).await,
            Err(CheckoutError::Unauthenticated)
        ));
        // The cart survives the rejection
        assert_eq!(store.state().cart.cart.item_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_cart_checkout_is_rejected() {
        let service = OrderService::new(Arc::new(MemoryBackend::new()));
        let store = Store::new();
        store.dispatch(Action::Auth(AuthAction::SetUser(Some(user("u1")))));

        assert!(matches!(
            service.place_order(&store).await,
            Err(CheckoutError::EmptyCart)
        ));
    }

    #[tokio::test]
    async fn test_failed_submission_keeps_cart() {
        let backend = MemoryBackend::new();
        backend.fail_order_inserts(true);
        let service = OrderService::new(Arc::new(backend));
        let store = Store::new();

        store.dispatch(Action::Auth(AuthAction::SetUser(Some(user("u1")))));
        store.dispatch(Action::Cart(CartAction::Add(product("a", 2500))));

        assert!(matches!(
            service.place_order(&store).await,
            Err(CheckoutError::Backend(_))
        ));
        assert_eq!(store.state().cart.cart.item_count(), 1);
    }

    #[tokio::test]
    async fn test_order_history_falls_back_when_unordered() {
        let backend = MemoryBackend::new();
        let service = OrderService::new(Arc::new(backend.clone()));
        let store = Store::new();

        store.dispatch(Action::Auth(AuthAction::SetUser(Some(user("u1")))));
        store.dispatch(Action::Cart(CartAction::Add(product("a", 2500))));
        service.place_order(&store).await.unwrap();

        backend.disable_ordered_queries();
        let orders = service.orders_for_user(&UserId::new("u1")).await.unwrap();
        assert_eq!(orders.len(), 1);
    }
}
