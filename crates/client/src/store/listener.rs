//! Auth-driven cart reconciliation.
//!
//! The listener consumes identity events and keeps the store's auth and
//! cart slices in step:
//!
//! - sign-in with a non-empty guest cart: merge guest into the remote
//!   mirror, write the merged cart back, adopt it locally
//! - sign-in with an empty guest cart: adopt the remote mirror as-is
//! - sign-out: drop the user and empty the local cart, leaving the remote
//!   mirror untouched for the next session
//!
//! If any step of the merge fails, reading the mirror or writing it back,
//! the guest cart wins unmerged; nothing the shopper put in their cart is
//! ever lost to a backend hiccup.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use truewave_core::{Cart, User};

use crate::backend::{CartRepository, Identity, IdentityProvider, UserRepository};
use crate::services::auth::resolve_user;
use crate::session::CartSlot;

use super::{Action, AuthAction, CartAction, Store};

/// Subscribes to identity events and reconciles the cart on each one.
pub struct AuthListener {
    store: Store,
    identities: Arc<dyn IdentityProvider>,
    carts: Arc<dyn CartRepository>,
    users: Arc<dyn UserRepository>,
    slot: Arc<dyn CartSlot>,
}

impl AuthListener {
    #[must_use]
    pub fn new(
        store: Store,
        identities: Arc<dyn IdentityProvider>,
        carts: Arc<dyn CartRepository>,
        users: Arc<dyn UserRepository>,
        slot: Arc<dyn CartSlot>,
    ) -> Self {
        Self {
            store,
            identities,
            carts,
            users,
            slot,
        }
    }

    /// Consume identity events until the provider goes away.
    ///
    /// The current identity is handled immediately, then every change.
    pub async fn run(self) {
        let mut events = self.identities.watch();
        loop {
            let identity = events.borrow_and_update().clone();
            self.handle(identity).await;
            if events.changed().await.is_err() {
                break;
            }
        }
    }

    /// Apply a single identity event to the store.
    #[instrument(skip_all, fields(signed_in = identity.is_some()))]
    pub async fn handle(&self, identity: Option<Identity>) {
        match identity {
            Some(identity) => self.signed_in(identity).await,
            None => self.signed_out(),
        }
    }

    async fn signed_in(&self, identity: Identity) {
        let user = resolve_user(self.users.as_ref(), &identity).await;

        let guest = self.store.state().cart.cart;
        let cart = self.reconcile(&user, guest).await;

        // The guest cart has been consumed; it must not merge again on the
        // next sign-in from this session
        self.slot.clear();

        self.store
            .dispatch(Action::Auth(AuthAction::SetUser(Some(user))));
        self.store.dispatch(Action::Cart(CartAction::Replace(cart)));
    }

    fn signed_out(&self) {
        let had_user = self.store.state().auth.is_authenticated();
        self.store.dispatch(Action::Auth(AuthAction::SetUser(None)));

        // Only a real sign-out empties the cart. The initial event of a
        // fresh session is also `None`, and must not wipe a guest cart
        // restored from the session slot.
        if had_user {
            self.store.dispatch(Action::Cart(CartAction::Clear));
        }
    }

    /// Decide the signed-in cart from the guest cart and the remote mirror.
    async fn reconcile(&self, user: &User, guest: Cart) -> Cart {
        if guest.is_empty() {
            return match self.carts.get(&user.id).await {
                Ok(remote) => remote.unwrap_or_default(),
                Err(error) => {
                    warn!(user = %user.id, %error, "remote cart unavailable; starting empty");
                    Cart::new()
                }
            };
        }

        let remote = match self.carts.get(&user.id).await {
            Ok(remote) => remote.unwrap_or_default(),
            Err(error) => {
                warn!(user = %user.id, %error, "remote cart unavailable; keeping guest cart");
                return guest;
            }
        };

        let merged = Cart::merge(guest.clone(), remote);
        if let Err(error) = self.carts.set(&user.id, &merged).await {
            warn!(user = %user.id, %error, "failed to store merged cart; keeping guest cart");
            return guest;
        }
        info!(user = %user.id, items = merged.len(), "merged guest cart into account");
        merged
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use truewave_core::{Email, Price, Product, ProductId, UserId};

    use crate::backend::memory::{MemoryBackend, MemoryIdentityProvider};
    use crate::session::{MemorySlot, SlotPersistence};

    fn product(id: &str, cents: u64) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            description: String::new(),
            price: Price::from_cents(cents),
            category: "misc".into(),
            image_url: String::new(),
            image_path: None,
            rating: 0.0,
            rating_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn identity(id: &str) -> Identity {
        Identity {
            id: UserId::new(id),
            email: Email::parse("user@example.com").unwrap(),
            display_name: Some("Shopper".into()),
            photo_url: None,
            email_verified: true,
        }
    }

    struct Fixture {
        store: Store,
        backend: MemoryBackend,
        slot: Arc<MemorySlot>,
        listener: AuthListener,
    }

    fn fixture() -> Fixture {
        let store = Store::new();
        let backend = MemoryBackend::new();
        let slot = Arc::new(MemorySlot::new());
        store.add_middleware(Arc::new(SlotPersistence::new(
            Arc::<MemorySlot>::clone(&slot),
        )));

        let listener = AuthListener::new(
            store.clone(),
            Arc::new(MemoryIdentityProvider::new()),
            Arc::new(backend.clone()),
            Arc::new(backend.clone()),
            Arc::<MemorySlot>::clone(&slot),
        );

        Fixture {
            store,
            backend,
            slot,
            listener,
        }
    }

    #[tokio::test]
    async fn test_sign_in_merges_guest_cart_with_remote() {
        let fx = fixture();
        let user_id = UserId::new("u1");

        // Remote mirror holds a:1, b:3
        let remote = Cart::from_items(vec![
            truewave_core::CartItem {
                product: product("a", 1000),
                quantity: 1,
            },
            truewave_core::CartItem {
                product: product("b", 500),
                quantity: 3,
            },
        ]);
        fx.backend.set(&user_id, &remote).await.unwrap();

        // Guest added a:2 before signing in
        fx.store.dispatch(Action::Cart(CartAction::Add(product("a", 1000))));
        fx.store.dispatch(Action::Cart(CartAction::Add(product("a", 1000))));

        fx.listener.handle(Some(identity("u1"))).await;

        let state = fx.store.state();
        assert!(state.auth.is_authenticated());
        let lines: Vec<_> = state
            .cart
            .cart
            .items()
            .iter()
            .map(|i| (i.product.id.as_str(), i.quantity))
            .collect();
        assert_eq!(lines, [("a", 3), ("b", 3)]);

        // The merge was written back and the guest slot consumed
        let stored = CartRepository::get(&fx.backend, &user_id).await.unwrap().unwrap();
        assert_eq!(stored.item_count(), 6);
        assert!(fx.slot.raw().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_with_empty_guest_cart_adopts_remote() {
        let fx = fixture();
        let user_id = UserId::new("u1");

        let mut remote = Cart::new();
        remote.add(product("a", 1000));
        fx.backend.set(&user_id, &remote).await.unwrap();

        fx.listener.handle(Some(identity("u1"))).await;

        assert_eq!(fx.store.state().cart.cart, remote);
    }

    #[tokio::test]
    async fn test_unreadable_remote_keeps_guest_cart_without_writing() {
        let fx = fixture();

        fx.store.dispatch(Action::Cart(CartAction::Add(product("a", 1000))));
        fx.backend.fail_cart_reads(true);

        fx.listener.handle(Some(identity("u1"))).await;

        assert_eq!(fx.store.state().cart.cart.item_count(), 1);
        fx.backend.fail_cart_reads(false);
        assert!(CartRepository::get(&fx.backend, &UserId::new("u1"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_unwritable_merge_keeps_guest_cart_unmerged() {
        let fx = fixture();
        let user_id = UserId::new("u1");

        let remote = Cart::from_items(vec![truewave_core::CartItem {
            product: product("b", 500),
            quantity: 3,
        }]);
        fx.backend.set(&user_id, &remote).await.unwrap();

        fx.store.dispatch(Action::Cart(CartAction::Add(product("a", 1000))));
        fx.store.dispatch(Action::Cart(CartAction::Add(product("a", 1000))));
        fx.backend.fail_cart_writes(true);

        fx.listener.handle(Some(identity("u1"))).await;

        // The merge could not be persisted, so it is not adopted locally
        let state = fx.store.state();
        let lines: Vec<_> = state
            .cart
            .cart
            .items()
            .iter()
            .map(|i| (i.product.id.as_str(), i.quantity))
            .collect();
        assert_eq!(lines, [("a", 2)]);

        // The remote mirror still holds its pre-merge contents
        fx.backend.fail_cart_writes(false);
        let stored = CartRepository::get(&fx.backend, &user_id).await.unwrap().unwrap();
        assert_eq!(stored, remote);
    }

    #[tokio::test]
    async fn test_sign_out_clears_local_cart_but_not_remote() {
        let fx = fixture();
        let user_id = UserId::new("u1");

        fx.store.dispatch(Action::Cart(CartAction::Add(product("a", 1000))));
        fx.listener.handle(Some(identity("u1"))).await;
        assert_eq!(fx.backend.cart_document_count(), 1);

        fx.listener.handle(None).await;

        let state = fx.store.state();
        assert!(!state.auth.is_authenticated());
        assert!(state.cart.cart.is_empty());
        // Remote mirror survives for the next session
        assert!(CartRepository::get(&fx.backend, &user_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_initial_none_event_preserves_restored_guest_cart() {
        let fx = fixture();

        fx.store.dispatch(Action::Cart(CartAction::Add(product("a", 1000))));
        fx.listener.handle(None).await;

        let state = fx.store.state();
        assert!(state.auth.initialized);
        assert_eq!(state.cart.cart.item_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_profile_yields_non_admin_user() {
        let fx = fixture();
        fx.listener.handle(Some(identity("u1"))).await;

        let user = fx.store.state().auth.user.unwrap();
        assert!(!user.is_admin);
        assert_eq!(user.display_name.as_deref(), Some("Shopper"));
    }

    #[tokio::test]
    async fn test_admin_flag_comes_from_profile_document() {
        let fx = fixture();
        let user_id = UserId::new("u1");
        let email = Email::parse("user@example.com").unwrap();
        fx.backend
            .create(&user_id, &email, Some("Shopper"), None)
            .await
            .unwrap();
        fx.backend.set_admin(&user_id, true).await.unwrap();

        fx.listener.handle(Some(identity("u1"))).await;

        assert!(fx.store.state().auth.user.unwrap().is_admin);
    }
}
