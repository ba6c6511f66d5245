//! Product catalog records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// A catalog product, owned by the external store and read-only to the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: Price,
    /// Free-text category label.
    pub category: String,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    /// Object-store path of the image, when uploaded through the admin panel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    /// Average rating, 0-5.
    pub rating: f32,
    pub rating_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Form data for creating or updating a product.
///
/// Ratings and timestamps are owned by the store, so they are absent here;
/// creation initializes the rating to 0/0 and stamps both timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub title: String,
    pub description: String,
    pub price: Price,
    pub category: String,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}
