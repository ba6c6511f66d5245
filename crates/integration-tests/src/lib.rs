//! Integration tests for TrueWave.
//!
//! Every test wires a full [`App`] over the in-memory backend
//! implementations, so the whole pipeline is exercised: dispatch, pure
//! reduction, session slot persistence, debounced remote sync, the auth
//! listener, and the services.
//!
//! # Test Categories
//!
//! - `cart_flows` - Guest carts, sync, and sign-in reconciliation
//! - `checkout` - Totals, order placement, and order history
//! - `accounts` - Registration, profiles, admin, and media uploads

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use truewave_client::app::Collaborators;
use truewave_client::backend::memory::{
    MemoryBackend, MemoryIdentityProvider, MemoryObjectStore,
};
use truewave_client::config::ClientConfig;
use truewave_client::session::MemorySlot;
use truewave_client::store::RootState;
use truewave_client::App;

use truewave_core::{Price, Product, ProductId};

/// A fully wired application over in-memory backends.
pub struct TestContext {
    pub app: App,
    pub backend: MemoryBackend,
    pub identities: Arc<MemoryIdentityProvider>,
    pub objects: Arc<MemoryObjectStore>,
    pub slot: Arc<MemorySlot>,
}

impl TestContext {
    /// Wire a fresh application with the short test debounce.
    #[must_use]
    pub fn new() -> Self {
        Self::with_slot(Arc::new(MemorySlot::new()))
    }

    /// Wire a fresh application around an existing session slot, as a
    /// page reload would.
    #[must_use]
    pub fn with_slot(slot: Arc<MemorySlot>) -> Self {
        let backend = MemoryBackend::new();
        let identities = Arc::new(MemoryIdentityProvider::new());
        let objects = Arc::new(MemoryObjectStore::new());

        let collaborators = Collaborators {
            carts: Arc::new(backend.clone()),
            products: Arc::new(backend.clone()),
            orders: Arc::new(backend.clone()),
            users: Arc::new(backend.clone()),
            identities: Arc::<MemoryIdentityProvider>::clone(&identities),
            objects: Arc::<MemoryObjectStore>::clone(&objects),
            slot: Arc::<MemorySlot>::clone(&slot),
        };

        Self {
            app: App::new(ClientConfig::for_testing(), collaborators),
            backend,
            identities,
            objects,
            slot,
        }
    }

    /// Wait until `predicate` holds on the store state, panicking after a
    /// second. Auth events and sync writes land asynchronously.
    pub async fn wait_for(&self, predicate: impl Fn(&RootState) -> bool) {
        for _ in 0..100 {
            if predicate(&self.app.store().state()) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("state never reached the expected shape");
    }

    /// Sleep past the test debounce so scheduled sync writes land.
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A catalog product for cart tests.
#[must_use]
pub fn product(id: &str, cents: u64) -> Product {
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
