//! Collaborator contracts for the hosted backend platform.
//!
//! The document store, identity provider, and object store are external
//! services; the application only ever sees the traits in this module. The
//! [`memory`] implementations back tests and local development.
//!
//! Every record read from the document store passes through the explicit
//! deserialization step in [`document`], which applies the uniform
//! absent-timestamp coercion.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use truewave_core::{
    Cart, Email, Order, OrderDraft, OrderId, OrderStatus, Product, ProductDraft, ProductId,
    ProfileUpdate, UserId,
};

pub mod document;
pub mod memory;

pub use document::UserRecord;

/// Errors surfaced by the document and object stores.
#[derive(Debug, Error)]
pub enum BackendError {
    /// An ordered query could not be served (e.g. a missing index).
    /// Callers are expected to fall back to unordered retrieval.
    #[error("ordered query unavailable: {0}")]
    OrderedQueryUnavailable(String),

    /// A referenced document does not exist.
    #[error("document not found: {0}")]
    NotFound(String),

    /// A stored document could not be (de)serialized.
    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The store could not be reached or rejected the request.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by the identity provider.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email/password combination, or no such account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("an account with this email already exists")]
    UserAlreadyExists,

    /// The password does not meet the provider's requirements.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// The operation requires a signed-in user.
    #[error("no authenticated user")]
    NotSignedIn,

    /// The provider could not be reached or rejected the request.
    #[error("identity provider error: {0}")]
    Provider(String),
}

/// A user descriptor as reported by the identity provider.
///
/// `is_admin` is deliberately absent here: admin status lives in the user's
/// document in the external store, not in the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub email: Email,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub email_verified: bool,
}

/// The per-user remote cart mirror.
///
/// One document per user id; singly-owned, last write wins. No version
/// token, so concurrent sessions of the same user can overwrite each other.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Fetch the user's cart document, if one exists.
    async fn get(&self, user_id: &UserId) -> Result<Option<Cart>, BackendError>;

    /// Replace the user's cart document with the given snapshot.
    ///
    /// Writing an empty cart deletes the document instead.
    async fn set(&self, user_id: &UserId, cart: &Cart) -> Result<(), BackendError>;

    /// Delete the user's cart document. Absent documents are not an error.
    async fn delete(&self, user_id: &UserId) -> Result<(), BackendError>;
}

/// The product catalog collection.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// All products, newest first.
    ///
    /// # Errors
    ///
    /// May fail with [`BackendError::OrderedQueryUnavailable`]; callers fall
    /// back to [`list`](Self::list).
    async fn list_ordered(&self) -> Result<Vec<Product>, BackendError>;

    /// All products in unspecified order.
    async fn list(&self) -> Result<Vec<Product>, BackendError>;

    /// Products in a category, newest first. Same fallback contract as
    /// [`list_ordered`](Self::list_ordered).
    async fn list_by_category_ordered(&self, category: &str) -> Result<Vec<Product>, BackendError>;

    /// Products in a category, unordered.
    async fn list_by_category(&self, category: &str) -> Result<Vec<Product>, BackendError>;

    /// A single product by id.
    async fn get(&self, id: &ProductId) -> Result<Option<Product>, BackendError>;

    /// Create a product document. Rating starts at 0 with no votes; both
    /// timestamps are stamped by the store.
    async fn insert(&self, draft: ProductDraft) -> Result<ProductId, BackendError>;

    /// Apply a partial update and bump `updated_at`.
    async fn update(&self, id: &ProductId, patch: ProductPatch) -> Result<(), BackendError>;

    /// Delete a product document.
    async fn delete(&self, id: &ProductId) -> Result<(), BackendError>;
}

/// A partial product update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<truewave_core::Price>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub image_path: Option<String>,
}

impl ProductPatch {
    /// Whether the patch carries no changes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.image_url.is_none()
            && self.image_path.is_none()
    }
}

/// The append-only orders collection.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Submit an order; the store assigns the id and timestamps.
    async fn insert(&self, draft: OrderDraft) -> Result<OrderId, BackendError>;

    /// A user's orders, newest first. May fail with
    /// [`BackendError::OrderedQueryUnavailable`]; callers fall back to
    /// [`list_for_user`](Self::list_for_user).
    async fn list_for_user_ordered(&self, user_id: &UserId) -> Result<Vec<Order>, BackendError>;

    /// A user's orders in unspecified order.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, BackendError>;

    /// A single order by id.
    async fn get(&self, id: &OrderId) -> Result<Option<Order>, BackendError>;

    /// Every order in the store (admin panel).
    async fn list_all(&self) -> Result<Vec<Order>, BackendError>;

    /// Set an order's status and bump `updated_at` (admin panel).
    async fn set_status(&self, id: &OrderId, status: OrderStatus) -> Result<(), BackendError>;
}

/// The per-user profile documents (source of `is_admin`).
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create the user document at registration. `is_admin` starts false.
    async fn create(
        &self,
        id: &UserId,
        email: &Email,
        display_name: Option<&str>,
        photo_url: Option<&str>,
    ) -> Result<(), BackendError>;

    /// Fetch a user document.
    async fn get(&self, id: &UserId) -> Result<Option<UserRecord>, BackendError>;

    /// Apply profile changes and bump `updated_at`.
    async fn update(&self, id: &UserId, update: &ProfileUpdate) -> Result<(), BackendError>;

    /// Grant or revoke admin status.
    async fn set_admin(&self, id: &UserId, is_admin: bool) -> Result<(), BackendError>;

    /// Delete a user document.
    async fn delete(&self, id: &UserId) -> Result<(), BackendError>;
}

/// The external identity provider.
///
/// Emits `Some(identity)`/`None` on every sign-in/sign-out through the
/// [`watch`](Self::watch) channel; the auth listener drives cart
/// reconciliation from those events.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create a new account and sign it in.
    async fn create_account(&self, email: &Email, password: &str) -> Result<Identity, AuthError>;

    /// Sign in with email and password.
    async fn sign_in(&self, email: &Email, password: &str) -> Result<Identity, AuthError>;

    /// Sign out the current user.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Update the current user's provider profile.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotSignedIn`] if no user is signed in.
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), AuthError>;

    /// Refetch the current user from the provider.
    async fn reload(&self) -> Result<Identity, AuthError>;

    /// The currently signed-in user, if any.
    fn current(&self) -> Option<Identity>;

    /// Subscribe to sign-in/sign-out notifications.
    fn watch(&self) -> watch::Receiver<Option<Identity>>;
}

/// A stored object's location and public URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub path: String,
    pub url: String,
}

/// Upload progress callback, called with a percentage in `0.0..=100.0`.
pub type ProgressFn = Box<dyn Fn(f32) + Send + Sync>;

/// The external object storage service.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload bytes to `path`, optionally reporting progress.
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        progress: Option<ProgressFn>,
    ) -> Result<StoredObject, BackendError>;

    /// Delete the object at `path`.
    async fn delete(&self, path: &str) -> Result<(), BackendError>;

    /// Public download URL for an existing object.
    async fn download_url(&self, path: &str) -> Result<String, BackendError>;
}
