//! Product image handling over the object store.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, instrument};

use truewave_core::ProductId;

use crate::backend::{BackendError, ObjectStore, ProgressFn, StoredObject};

/// Errors surfaced by media uploads.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Only image uploads are accepted.
    #[error("not an image: {0}")]
    NotAnImage(String),

    /// The object store rejected the request.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Product image uploads and deletion.
pub struct MediaService {
    store: Arc<dyn ObjectStore>,
}

impl MediaService {
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Upload a product image under `products/{category}/`.
    ///
    /// With a product id the stored name is `{id}_{millis}.{ext}`;
    /// without one it is `{millis}_{file_name}`. Either way the upload
    /// time keeps repeated uploads of the same file from colliding.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::NotAnImage`] for a non-image content type and
    /// [`MediaError::Backend`] when the upload fails.
    #[instrument(skip(self, bytes, progress), fields(size = bytes.len()))]
    pub async fn upload_product_image(
        &self,
        category: &str,
        file_name: &str,
        product_id: Option<&ProductId>,
        bytes: Vec<u8>,
        content_type: &str,
        progress: Option<ProgressFn>,
    ) -> Result<StoredObject, MediaError> {
        if !content_type.starts_with("image/") {
            return Err(MediaError::NotAnImage(content_type.to_owned()));
        }

        let millis = Utc::now().timestamp_millis();
        let object_name = match product_id {
            Some(id) => {
                let extension = std::path::Path::new(file_name)
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("bin");
                format!("{id}_{millis}.{extension}")
            }
            None => format!("{millis}_{file_name}"),
        };
        let path = format!("products/{category}/{object_name}");
        let stored = self
            .store
            .upload(&path, bytes, content_type, progress)
            .await?;
        info!(path = %stored.path, "product image uploaded");
        Ok(stored)
    }

    /// Delete a previously uploaded image.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::Backend`] if the object is missing or the
    /// delete fails.
    pub async fn delete_image(&self, path: &str) -> Result<(), MediaError> {
        self.store.delete(path).await?;
        Ok(())
    }

    /// Public URL for a stored image.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::Backend`] if the object is missing.
    pub async fn image_url(&self, path: &str) -> Result<String, MediaError> {
        Ok(self.store.download_url(path).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::backend::memory::MemoryObjectStore;

    #[tokio::test]
    async fn test_upload_rejects_non_images() {
        let media = MediaService::new(Arc::new(MemoryObjectStore::new()));

        let result = media
            .upload_product_image("home", "notes.txt", None, vec![1], "text/plain", None)
            .await;
        assert!(matches!(result, Err(MediaError::NotAnImage(_))));
    }

    #[tokio::test]
    async fn test_upload_places_image_under_category() {
        let media = MediaService::new(Arc::new(MemoryObjectStore::new()));

        let stored = media
            .upload_product_image("home", "lamp.jpg", None, vec![1, 2, 3], "image/jpeg", None)
            .await
            .unwrap();

        assert!(stored.path.starts_with("products/home/"));
        assert!(stored.path.ends_with("_lamp.jpg"));
        assert_eq!(media.image_url(&stored.path).await.unwrap(), stored.url);

        media.delete_image(&stored.path).await.unwrap();
        assert!(media.image_url(&stored.path).await.is_err());
    }

    #[tokio::test]
    async fn test_upload_with_product_id_uses_id_and_extension() {
        let media = MediaService::new(Arc::new(MemoryObjectStore::new()));
        let id = ProductId::new("p1");

        let stored = media
            .upload_product_image("tech", "photo.png", Some(&id), vec![1], "image/png", None)
            .await
            .unwrap();

        assert!(stored.path.starts_with("products/tech/p1_"));
        assert!(stored.path.ends_with(".png"));
    }
}
