//! Catalog reads with caching, plus the admin product CRUD.
//!
//! Listing queries ask for newest-first ordering and fall back to
//! unordered retrieval when the store cannot serve the ordered query, so a
//! missing index degrades ordering instead of emptying the storefront.
//! Results are cached with a TTL; any admin write invalidates the cache.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{info, instrument, warn};

use truewave_core::{Product, ProductDraft, ProductId};

use crate::backend::{BackendError, ProductPatch, ProductRepository};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    All,
    Category(String),
}

/// Catalog reads and admin product management.
pub struct CatalogService {
    products: Arc<dyn ProductRepository>,
    cache: Cache<CacheKey, Arc<Vec<Product>>>,
}

impl CatalogService {
    #[must_use]
    pub fn new(products: Arc<dyn ProductRepository>, cache_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(64)
            .time_to_live(cache_ttl)
            .build();
        Self { products, cache }
    }

    /// All products, newest first when the ordered query is available.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if both retrieval paths fail.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, BackendError> {
        if let Some(cached) = self.cache.get(&CacheKey::All).await {
            return Ok(cached);
        }

        let products = match self.products.list_ordered().await {
            Ok(products) => products,
            Err(BackendError::OrderedQueryUnavailable(reason)) => {
                warn!(%reason, "ordered product query unavailable; falling back");
                self.products.list().await?
            }
            Err(error) => return Err(error),
        };

        let products = Arc::new(products);
        self.cache
            .insert(CacheKey::All, Arc::clone(&products))
            .await;
        Ok(products)
    }

    /// Products in one category, newest first when available.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if both retrieval paths fail.
    #[instrument(skip(self))]
    pub async fn products_by_category(
        &self,
        category: &str,
    ) -> Result<Arc<Vec<Product>>, BackendError> {
        let key = CacheKey::Category(category.to_owned());
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let products = match self.products.list_by_category_ordered(category).await {
            Ok(products) => products,
            Err(BackendError::OrderedQueryUnavailable(reason)) => {
                warn!(category, %reason, "ordered category query unavailable; falling back");
                self.products.list_by_category(category).await?
            }
            Err(error) => return Err(error),
        };

        let products = Arc::new(products);
        self.cache.insert(key, Arc::clone(&products)).await;
        Ok(products)
    }

    /// The distinct categories currently in the catalog, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the catalog cannot be read.
    pub async fn categories(&self) -> Result<Vec<String>, BackendError> {
        let products = self.products().await?;
        let mut categories: Vec<String> =
            products.iter().map(|p| p.category.clone()).collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    /// A single product by id.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the lookup fails.
    pub async fn product(&self, id: &ProductId) -> Result<Option<Product>, BackendError> {
        self.products.get(id).await
    }

    /// Create a product (admin panel).
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the write fails.
    pub async fn create_product(&self, draft: ProductDraft) -> Result<ProductId, BackendError> {
        let id = self.products.insert(draft).await?;
        info!(product = %id, "product created");
        self.cache.invalidate_all();
        Ok(id)
    }

    /// Apply a partial update to a product (admin panel).
    ///
    /// Empty-string fields are dropped from the patch before the write, so
    /// a blank form field leaves the stored value alone. A patch with no
    /// remaining changes is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the product is missing or the write
    /// fails.
    pub async fn update_product(
        &self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> Result<(), BackendError> {
        let patch = sanitize_patch(patch);
        if patch.is_empty() {
            return Ok(());
        }

        self.products.update(id, patch).await?;
        info!(product = %id, "product updated");
        self.cache.invalidate_all();
        Ok(())
    }

    /// Delete a product (admin panel).
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the delete fails.
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), BackendError> {
        self.products.delete(id).await?;
        info!(product = %id, "product deleted");
        self.cache.invalidate_all();
        Ok(())
    }
}

/// Drop empty-string fields from a patch.
fn sanitize_patch(patch: ProductPatch) -> ProductPatch {
    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    ProductPatch {
        title: non_empty(patch.title),
        description: non_empty(patch.description),
        price: patch.price,
        category: non_empty(patch.category),
        image_url: non_empty(patch.image_url),
        image_path: non_empty(patch.image_path),
    }
}
