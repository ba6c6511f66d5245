//! The synchronous state container.
//!
//! A single [`Store`] holds the [`RootState`] (cart and auth slices).
//! [`Store::dispatch`] applies an [`Action`] through a pure reducer, then
//! notifies subscribers with the new state, then runs each registered
//! [`Middleware`] with the action and the post-reduction snapshot.
//!
//! Reducers never perform IO. Session slot writes and remote cart writes
//! are middleware concerns; see [`crate::session::SlotPersistence`] and
//! [`sync::CartSync`].

use std::sync::{Arc, Mutex, PoisonError};

pub mod auth;
pub mod cart;
pub mod listener;
pub mod sync;

pub use auth::{AuthAction, AuthState};
pub use cart::{CartAction, CartState};
pub use listener::AuthListener;
pub use sync::CartSync;

/// The whole application state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RootState {
    pub cart: CartState,
    pub auth: AuthState,
}

/// Every dispatchable action.
#[derive(Debug, Clone)]
pub enum Action {
    Cart(CartAction),
    Auth(AuthAction),
}

/// A user-facing notice produced by a reduction.
///
/// The UI layer turns these into toasts; reducers only report them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A product entered the cart for the first time.
    ProductAdded { title: String },
    /// A product left the cart.
    ProductRemoved { title: String },
}

/// Observes dispatched actions after the state has been reduced.
///
/// `state` is the post-reduction snapshot. Middleware needing the state at
/// a later point in time (e.g. after a debounce delay) must re-read it from
/// the store instead of holding on to the snapshot.
pub trait Middleware: Send + Sync {
    fn after_dispatch(&self, store: &Store, action: &Action, state: &RootState);
}

type Subscriber = Arc<dyn Fn(&RootState) + Send + Sync>;

/// The state container. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: Mutex<RootState>,
    subscribers: Mutex<Vec<Subscriber>>,
    middleware: Mutex<Vec<Arc<dyn Middleware>>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// A store with empty cart and signed-out, uninitialized auth state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(RootState::default()),
                subscribers: Mutex::new(Vec::new()),
                middleware: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Register a middleware. Middleware run in registration order.
    pub fn add_middleware(&self, middleware: Arc<dyn Middleware>) {
        self.inner
            .middleware
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(middleware);
    }

    /// Subscribe to state changes. The callback runs synchronously inside
    /// every dispatch, after reduction.
    pub fn subscribe(&self, subscriber: impl Fn(&RootState) + Send + Sync + 'static) {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(subscriber));
    }

    /// A snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> RootState {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply `action`, notify subscribers and middleware, and return the
    /// notices the reduction produced.
    pub fn dispatch(&self, action: Action) -> Vec<Notice> {
        let (snapshot, notices) = {
            let mut state = self
                .inner
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let notices = reduce(&mut state, &action);
            (state.clone(), notices)
        };

        // Both lists are cloned out before iteration so a subscriber or
        // middleware may call back into the store without deadlocking.
        let subscribers: Vec<Subscriber> = self
            .inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for subscriber in &subscribers {
            subscriber(&snapshot);
        }

        let middleware: Vec<Arc<dyn Middleware>> = self
            .inner
            .middleware
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for mw in &middleware {
            mw.after_dispatch(self, &action, &snapshot);
        }

        notices
    }
}

/// The root reducer. Pure: no IO, no clock, no randomness.
fn reduce(state: &mut RootState, action: &Action) -> Vec<Notice> {
    match action {
        Action::Cart(action) => cart::reduce(&mut state.cart, action).into_iter().collect(),
        Action::Auth(action) => {
            auth::reduce(&mut state.auth, action);
            Vec::new()
        }
    }
}
