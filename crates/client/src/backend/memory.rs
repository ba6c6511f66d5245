//! In-memory collaborator implementations for tests and local development.
//!
//! Documents are held as raw JSON values and go through the same
//! [`document`](super::document) deserialization step as a real store
//! would, so the timestamp coercion and ordered-query fallback paths are
//! exercised for real. Failure injection toggles let tests drive the
//! degraded paths (missing index, rejected writes).

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::watch;

use truewave_core::{
    Cart, Email, Order, OrderDraft, OrderId, OrderStatus, Product, ProductDraft, ProductId,
    ProfileUpdate, UserId,
};

use super::document::{CartDocument, OrderDocument, ProductDocument, UserDocument, UserRecord};
use super::{
    AuthError, BackendError, CartRepository, Identity, IdentityProvider, ObjectStore,
    OrderRepository, ProductPatch, ProductRepository, ProgressFn, StoredObject, UserRepository,
};

// =============================================================================
// Document store
// =============================================================================

/// In-memory document store backing all four repositories.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Collections>,
}

#[derive(Default)]
struct Collections {
    products: RwLock<HashMap<String, Value>>,
    orders: RwLock<HashMap<String, Value>>,
    users: RwLock<HashMap<String, Value>>,
    carts: RwLock<HashMap<String, Value>>,
    ordered_queries: Toggle,
    cart_reads: Toggle,
    cart_writes: Toggle,
    order_inserts: Toggle,
}

/// An on-by-default switch tests can flip.
struct Toggle(AtomicBool);

impl Default for Toggle {
    fn default() -> Self {
        Self(AtomicBool::new(true))
    }
}

impl Toggle {
    fn enabled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::Relaxed);
    }
}

impl MemoryBackend {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make ordered queries fail as if an index were missing.
    pub fn disable_ordered_queries(&self) {
        self.inner.ordered_queries.set(false);
    }

    /// Make cart document reads fail.
    pub fn fail_cart_reads(&self, fail: bool) {
        self.inner.cart_reads.set(!fail);
    }

    /// Make cart document writes fail.
    pub fn fail_cart_writes(&self, fail: bool) {
        self.inner.cart_writes.set(!fail);
    }

    /// Make order submissions fail.
    pub fn fail_order_inserts(&self, fail: bool) {
        self.inner.order_inserts.set(!fail);
    }

    /// Insert a raw product document, bypassing the typed write path.
    ///
    /// Lets tests seed documents that predate the current shape (e.g.
    /// missing timestamps).
    pub fn insert_raw_product(&self, id: &ProductId, document: Value) {
        self.write(&self.inner.products)
            .insert(id.as_str().to_owned(), document);
    }

    /// Number of cart documents currently stored.
    #[must_use]
    pub fn cart_document_count(&self) -> usize {
        self.read(&self.inner.carts).len()
    }

    fn read<'a, T>(&self, lock: &'a RwLock<T>) -> std::sync::RwLockReadGuard<'a, T> {
        lock.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write<'a, T>(&self, lock: &'a RwLock<T>) -> std::sync::RwLockWriteGuard<'a, T> {
        lock.write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn parse_products(
        &self,
        filter: Option<&str>,
    ) -> Result<Vec<Product>, BackendError> {
        let docs = self.read(&self.inner.products);
        let mut products = Vec::with_capacity(docs.len());
        for (id, value) in docs.iter() {
            let doc: ProductDocument = serde_json::from_value(value.clone())?;
            if filter.is_some_and(|category| doc.category != category) {
                continue;
            }
            products.push(doc.into_product(ProductId::new(id.clone())));
        }
        Ok(products)
    }

    fn parse_orders(&self, filter: Option<&UserId>) -> Result<Vec<Order>, BackendError> {
        let docs = self.read(&self.inner.orders);
        let mut orders = Vec::with_capacity(docs.len());
        for (id, value) in docs.iter() {
            let doc: OrderDocument = serde_json::from_value(value.clone())?;
            if filter.is_some_and(|user| &doc.user_id != user) {
                continue;
            }
            orders.push(doc.into_order(OrderId::new(id.clone())));
        }
        Ok(orders)
    }

    fn ordered_or_missing_index(&self, what: &str) -> Result<(), BackendError> {
        if self.inner.ordered_queries.enabled() {
            Ok(())
        } else {
            Err(BackendError::OrderedQueryUnavailable(format!(
                "no index for {what}"
            )))
        }
    }
}

#[async_trait]
impl ProductRepository for MemoryBackend {
    async fn list_ordered(&self) -> Result<Vec<Product>, BackendError> {
        self.ordered_or_missing_index("products.createdAt")?;
        let mut products = self.parse_products(None)?;
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn list(&self) -> Result<Vec<Product>, BackendError> {
        self.parse_products(None)
    }

    async fn list_by_category_ordered(&self, category: &str) -> Result<Vec<Product>, BackendError> {
        self.ordered_or_missing_index("products.category+createdAt")?;
        let mut products = self.parse_products(Some(category))?;
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<Product>, BackendError> {
        self.parse_products(Some(category))
    }

    async fn get(&self, id: &ProductId) -> Result<Option<Product>, BackendError> {
        let value = self.read(&self.inner.products).get(id.as_str()).cloned();
        match value {
            Some(value) => {
                let doc: ProductDocument = serde_json::from_value(value)?;
                Ok(Some(doc.into_product(id.clone())))
            }
            None => Ok(None),
        }
    }

    async fn insert(&self, draft: ProductDraft) -> Result<ProductId, BackendError> {
        let id = ProductId::random();
        let now = Utc::now();
        let doc = ProductDocument {
            title: draft.title,
            description: draft.description,
            price: draft.price,
            category: draft.category,
            image_url: draft.image_url,
            image_path: draft.image_path,
            rating: 0.0,
            rating_count: 0,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.write(&self.inner.products)
            .insert(id.as_str().to_owned(), serde_json::to_value(doc)?);
        Ok(id)
    }

    async fn update(&self, id: &ProductId, patch: ProductPatch) -> Result<(), BackendError> {
        let existing = self.read(&self.inner.products).get(id.as_str()).cloned();
        let value = existing.ok_or_else(|| BackendError::NotFound(id.to_string()))?;
        let mut doc: ProductDocument = serde_json::from_value(value)?;

        if let Some(title) = patch.title {
            doc.title = title;
        }
        if let Some(description) = patch.description {
            doc.description = description;
        }
        if let Some(price) = patch.price {
            doc.price = price;
        }
        if let Some(category) = patch.category {
            doc.category = category;
        }
        if let Some(image_url) = patch.image_url {
            doc.image_url = image_url;
        }
        if let Some(image_path) = patch.image_path {
            doc.image_path = Some(image_path);
        }
        doc.updated_at = Some(Utc::now());

        self.write(&self.inner.products)
            .insert(id.as_str().to_owned(), serde_json::to_value(doc)?);
        Ok(())
    }

    async fn delete(&self, id: &ProductId) -> Result<(), BackendError> {
        self.write(&self.inner.products).remove(id.as_str());
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for MemoryBackend {
    async fn insert(&self, draft: OrderDraft) -> Result<OrderId, BackendError> {
        if !self.inner.order_inserts.enabled() {
            return Err(BackendError::Unavailable("order write rejected".into()));
        }

        let id = OrderId::random();
        let now = Utc::now();
        let doc = OrderDocument {
            user_id: draft.user_id,
            user_email: draft.user_email,
            items: draft.items,
            total_amount: draft.total_amount,
            status: draft.status,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.write(&self.inner.orders)
            .insert(id.as_str().to_owned(), serde_json::to_value(doc)?);
        Ok(id)
    }

    async fn list_for_user_ordered(&self, user_id: &UserId) -> Result<Vec<Order>, BackendError> {
        self.ordered_or_missing_index("orders.userId+createdAt")?;
        let mut orders = self.parse_orders(Some(user_id))?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, BackendError> {
        self.parse_orders(Some(user_id))
    }

    async fn get(&self, id: &OrderId) -> Result<Option<Order>, BackendError> {
        let value = self.read(&self.inner.orders).get(id.as_str()).cloned();
        match value {
            Some(value) => {
                let doc: OrderDocument = serde_json::from_value(value)?;
                Ok(Some(doc.into_order(id.clone())))
            }
            None => Ok(None),
        }
    }

    async fn list_all(&self) -> Result<Vec<Order>, BackendError> {
        let mut orders = self.parse_orders(None)?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn set_status(&self, id: &OrderId, status: OrderStatus) -> Result<(), BackendError> {
        let existing = self.read(&self.inner.orders).get(id.as_str()).cloned();
        let value = existing.ok_or_else(|| BackendError::NotFound(id.to_string()))?;
        let mut doc: OrderDocument = serde_json::from_value(value)?;
        doc.status = status;
        doc.updated_at = Some(Utc::now());
        self.write(&self.inner.orders)
            .insert(id.as_str().to_owned(), serde_json::to_value(doc)?);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryBackend {
    async fn create(
        &self,
        id: &UserId,
        email: &Email,
        display_name: Option<&str>,
        photo_url: Option<&str>,
    ) -> Result<(), BackendError> {
        let now = Utc::now();
        let doc = UserDocument {
            email: email.clone(),
            display_name: display_name.map(str::to_owned),
            photo_url: photo_url.map(str::to_owned),
            is_admin: false,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.write(&self.inner.users)
            .insert(id.as_str().to_owned(), serde_json::to_value(doc)?);
        Ok(())
    }

    async fn get(&self, id: &UserId) -> Result<Option<UserRecord>, BackendError> {
        let value = self.read(&self.inner.users).get(id.as_str()).cloned();
        match value {
            Some(value) => {
                let doc: UserDocument = serde_json::from_value(value)?;
                Ok(Some(doc.into_record(id.clone())))
            }
            None => Ok(None),
        }
    }

    async fn update(&self, id: &UserId, update: &ProfileUpdate) -> Result<(), BackendError> {
        let existing = self.read(&self.inner.users).get(id.as_str()).cloned();
        let value = existing.ok_or_else(|| BackendError::NotFound(id.to_string()))?;
        let mut doc: UserDocument = serde_json::from_value(value)?;

        if let Some(display_name) = &update.display_name {
            doc.display_name = Some(display_name.clone());
        }
        if let Some(photo_url) = &update.photo_url {
            doc.photo_url = Some(photo_url.clone());
        }
        doc.updated_at = Some(Utc::now());

        self.write(&self.inner.users)
            .insert(id.as_str().to_owned(), serde_json::to_value(doc)?);
        Ok(())
    }

    async fn set_admin(&self, id: &UserId, is_admin: bool) -> Result<(), BackendError> {
        let existing = self.read(&self.inner.users).get(id.as_str()).cloned();
        let value = existing.ok_or_else(|| BackendError::NotFound(id.to_string()))?;
        let mut doc: UserDocument = serde_json::from_value(value)?;
        doc.is_admin = is_admin;
        doc.updated_at = Some(Utc::now());
        self.write(&self.inner.users)
            .insert(id.as_str().to_owned(), serde_json::to_value(doc)?);
        Ok(())
    }

    async fn delete(&self, id: &UserId) -> Result<(), BackendError> {
        self.write(&self.inner.users).remove(id.as_str());
        Ok(())
    }
}

#[async_trait]
impl CartRepository for MemoryBackend {
    async fn get(&self, user_id: &UserId) -> Result<Option<Cart>, BackendError> {
        if !self.inner.cart_reads.enabled() {
            return Err(BackendError::Unavailable("cart read rejected".into()));
        }

        let value = self.read(&self.inner.carts).get(user_id.as_str()).cloned();
        match value {
            Some(value) => {
                let doc: CartDocument = serde_json::from_value(value)?;
                Ok(Some(doc.into_cart()))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, user_id: &UserId, cart: &Cart) -> Result<(), BackendError> {
        if !self.inner.cart_writes.enabled() {
            return Err(BackendError::Unavailable("cart write rejected".into()));
        }

        // An empty cart deletes the document instead of storing an empty one
        if cart.is_empty() {
            self.write(&self.inner.carts).remove(user_id.as_str());
            return Ok(());
        }

        let doc = CartDocument {
            user_id: user_id.clone(),
            items: cart.items().to_vec(),
            updated_at: Some(Utc::now()),
        };
        self.write(&self.inner.carts)
            .insert(user_id.as_str().to_owned(), serde_json::to_value(doc)?);
        Ok(())
    }

    async fn delete(&self, user_id: &UserId) -> Result<(), BackendError> {
        if !self.inner.cart_writes.enabled() {
            return Err(BackendError::Unavailable("cart write rejected".into()));
        }
        self.write(&self.inner.carts).remove(user_id.as_str());
        Ok(())
    }
}

// =============================================================================
// Identity provider
// =============================================================================

const MIN_PASSWORD_LENGTH: usize = 6;

struct StoredAccount {
    password: String,
    identity: Identity,
}

struct Accounts {
    by_email: RwLock<HashMap<String, StoredAccount>>,
    current: RwLock<Option<Identity>>,
    events: watch::Sender<Option<Identity>>,
}

/// In-memory identity provider with a watch channel for auth events.
#[derive(Clone)]
pub struct MemoryIdentityProvider {
    inner: Arc<Accounts>,
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIdentityProvider {
    /// Create a provider with no accounts and no signed-in user.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = watch::channel(None);
        Self {
            inner: Arc::new(Accounts {
                by_email: RwLock::new(HashMap::new()),
                current: RwLock::new(None),
                events,
            }),
        }
    }

    fn set_current(&self, identity: Option<Identity>) {
        *self
            .inner
            .current
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = identity.clone();
        // Receivers may come and go; a send with no receiver is fine
        let _ = self.inner.events.send(identity);
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn create_account(&self, email: &Email, password: &str) -> Result<Identity, AuthError> {
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        let identity = Identity {
            id: UserId::random(),
            email: email.clone(),
            display_name: None,
            photo_url: None,
            email_verified: false,
        };

        {
            let mut accounts = self
                .inner
                .by_email
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if accounts.contains_key(email.as_str()) {
                return Err(AuthError::UserAlreadyExists);
            }
            accounts.insert(
                email.as_str().to_owned(),
                StoredAccount {
                    password: password.to_owned(),
                    identity: identity.clone(),
                },
            );
        }

        self.set_current(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_in(&self, email: &Email, password: &str) -> Result<Identity, AuthError> {
        let identity = {
            let accounts = self
                .inner
                .by_email
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let account = accounts
                .get(email.as_str())
                .ok_or(AuthError::InvalidCredentials)?;
            if account.password != password {
                return Err(AuthError::InvalidCredentials);
            }
            account.identity.clone()
        };

        self.set_current(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.set_current(None);
        Ok(())
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), AuthError> {
        let current = self.current().ok_or(AuthError::NotSignedIn)?;

        let mut accounts = self
            .inner
            .by_email
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let account = accounts
            .get_mut(current.email.as_str())
            .ok_or(AuthError::NotSignedIn)?;

        if let Some(display_name) = &update.display_name {
            account.identity.display_name = Some(display_name.clone());
        }
        if let Some(photo_url) = &update.photo_url {
            account.identity.photo_url = Some(photo_url.clone());
        }

        let identity = account.identity.clone();
        drop(accounts);

        // Keep `current` in step without re-emitting an auth event; profile
        // edits are not sign-ins
        *self
            .inner
            .current
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(identity);
        Ok(())
    }

    async fn reload(&self) -> Result<Identity, AuthError> {
        let current = self.current().ok_or(AuthError::NotSignedIn)?;
        let accounts = self
            .inner
            .by_email
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        accounts
            .get(current.email.as_str())
            .map(|account| account.identity.clone())
            .ok_or(AuthError::NotSignedIn)
    }

    fn current(&self) -> Option<Identity> {
        self.inner
            .current
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn watch(&self) -> watch::Receiver<Option<Identity>> {
        self.inner.events.subscribe()
    }
}

// =============================================================================
// Object store
// =============================================================================

/// In-memory object store.
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<HashMap<String, (Vec<u8>, String)>>>,
}

impl MemoryObjectStore {
    const BASE_URL: &'static str = "https://storage.truewave.test";

    /// Create an empty object store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn url_for(path: &str) -> String {
        format!("{}/{path}", Self::BASE_URL)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        progress: Option<ProgressFn>,
    ) -> Result<StoredObject, BackendError> {
        if let Some(progress) = &progress {
            progress(0.0);
        }

        self.objects
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(path.to_owned(), (bytes, content_type.to_owned()));

        if let Some(progress) = &progress {
            progress(100.0);
        }

        Ok(StoredObject {
            path: path.to_owned(),
            url: Self::url_for(path),
        })
    }

    async fn delete(&self, path: &str) -> Result<(), BackendError> {
        self.objects
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| BackendError::NotFound(path.to_owned()))
    }

    async fn download_url(&self, path: &str) -> Result<String, BackendError> {
        let objects = self
            .objects
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if objects.contains_key(path) {
            Ok(Self::url_for(path))
        } else {
            Err(BackendError::NotFound(path.to_owned()))
        }
    }
}
