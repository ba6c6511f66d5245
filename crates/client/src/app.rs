//! The application composition root.
//!
//! [`App::new`] wires the store, middleware, auth listener, and services
//! over a set of backend collaborators, restoring any guest cart left in
//! the session slot. Must be called inside a tokio runtime: the sync
//! middleware and the auth listener spawn tasks.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use crate::backend::{
    CartRepository, IdentityProvider, ObjectStore, OrderRepository, ProductRepository,
    UserRepository,
};
use crate::config::ClientConfig;
use crate::services::{AuthService, CatalogService, MediaService, OrderService};
use crate::session::{CartSlot, SlotPersistence};
use crate::store::{Action, AuthListener, CartAction, CartSync, Store};

/// The backend collaborators the application runs against.
///
/// Production wires the hosted platform adapters; tests wire the
/// [`memory`](crate::backend::memory) implementations.
#[derive(Clone)]
pub struct Collaborators {
    pub carts: Arc<dyn CartRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub users: Arc<dyn UserRepository>,
    pub identities: Arc<dyn IdentityProvider>,
    pub objects: Arc<dyn ObjectStore>,
    pub slot: Arc<dyn CartSlot>,
}

struct AppInner {
    config: ClientConfig,
    store: Store,
    catalog: CatalogService,
    orders: OrderService,
    auth: AuthService,
    media: MediaService,
    listener: JoinHandle<()>,
}

impl Drop for AppInner {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// A fully wired application. Cheap to clone; clones share everything.
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

impl App {
    /// Wire the application and start the auth listener.
    #[must_use]
    pub fn new(config: ClientConfig, collaborators: Collaborators) -> Self {
        let store = Store::new();

        // A guest cart left by a previous page load comes back before any
        // middleware is attached; restoring is not a mutation
        if let Some(cart) = collaborators.slot.load() {
            info!(items = cart.len(), "restored guest cart from session");
            store.dispatch(Action::Cart(CartAction::Replace(cart)));
        }

        store.add_middleware(Arc::new(SlotPersistence::new(Arc::clone(
            &collaborators.slot,
        ))));
        store.add_middleware(Arc::new(CartSync::new(
            Arc::clone(&collaborators.carts),
            config.cart_sync_debounce,
        )));

        let listener = AuthListener::new(
            store.clone(),
            Arc::clone(&collaborators.identities),
            Arc::clone(&collaborators.carts),
            Arc::clone(&collaborators.users),
            Arc::clone(&collaborators.slot),
        );
        let listener = tokio::spawn(listener.run());

        let catalog = CatalogService::new(
            Arc::clone(&collaborators.products),
            config.catalog_cache_ttl,
        );
        let orders = OrderService::new(Arc::clone(&collaborators.orders));
        let auth = AuthService::new(
            Arc::clone(&collaborators.identities),
            Arc::clone(&collaborators.users),
        );
        let media = MediaService::new(Arc::clone(&collaborators.objects));

        Self {
            inner: Arc::new(AppInner {
                config,
                store,
                catalog,
                orders,
                auth,
                media,
                listener,
            }),
        }
    }

    /// The application configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The state container.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    /// Catalog reads and admin product management.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Checkout and order history.
    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    /// Account lifecycle.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// Product image handling.
    #[must_use]
    pub fn media(&self) -> &MediaService {
        &self.inner.media
    }
}
