//! Debounced background sync of the cart to its remote mirror.
//!
//! Every cart mutation by a signed-in user schedules a remote write after a
//! short delay; a mutation arriving before the delay elapses replaces the
//! scheduled write. The write snapshots the store at fire time, so a burst
//! of mutations collapses into one write of the final cart.
//!
//! `Clear` is the remote-erase path and deletes the mirror immediately, no
//! debounce. `Replace` carries a snapshot that just came from the mirror
//! and is never written back. Failed writes are logged and dropped; the
//! local cart stays authoritative and the next mutation retries naturally.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::backend::CartRepository;

use super::{Action, CartAction, Middleware, RootState, Store};

/// Middleware mirroring the signed-in user's cart to the remote store.
pub struct CartSync {
    carts: Arc<dyn CartRepository>,
    debounce: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl CartSync {
    #[must_use]
    pub fn new(carts: Arc<dyn CartRepository>, debounce: Duration) -> Self {
        Self {
            carts,
            debounce,
            pending: Mutex::new(None),
        }
    }

    /// Cancel the scheduled write, if any, and schedule a fresh one.
    fn schedule(&self, store: &Store) {
        let carts = Arc::clone(&self.carts);
        let debounce = self.debounce;
        let store = store.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;

            // Fresh state at fire time, not the snapshot from dispatch
            let state = store.state();
            let Some(user) = state.auth.user else {
                return;
            };

            match carts.set(&user.id, &state.cart.cart).await {
                Ok(()) => debug!(user = %user.id, items = state.cart.cart.len(), "cart synced"),
                Err(error) => warn!(user = %user.id, %error, "cart sync failed; keeping local cart"),
            }
        });

        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Delete the remote mirror right away.
    fn erase(&self, state: &RootState) {
        // Cancel any scheduled write so it cannot resurrect the cart
        if let Some(previous) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            previous.abort();
        }

        let Some(user) = state.auth.user.clone() else {
            return;
        };

        let carts = Arc::clone(&self.carts);
        tokio::spawn(async move {
            if let Err(error) = carts.delete(&user.id).await {
                warn!(user = %user.id, %error, "failed to erase remote cart");
            }
        });
    }
}

impl Middleware for CartSync {
    fn after_dispatch(&self, store: &Store, action: &Action, state: &RootState) {
        match action {
            Action::Cart(CartAction::Clear) => self.erase(state),
            Action::Cart(CartAction::Replace(_)) | Action::Auth(_) => {}
            Action::Cart(_) => self.schedule(store),
        }
    }
}
