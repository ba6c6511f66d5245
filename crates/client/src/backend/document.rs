//! Raw document shapes and the timestamp coercion applied on every read.
//!
//! Documents written by earlier client versions (or by the store's own
//! server-timestamp mechanism mid-write) may lack `createdAt`/`updatedAt`.
//! The documented default is: an absent timestamp becomes the current time
//! at read time. Conversion from a raw document to a domain record is the
//! single place that rule is applied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use truewave_core::{
    Cart, CartItem, Email, Order, OrderId, OrderItem, OrderStatus, Price, Product, ProductId,
    UserId,
};

/// Resolve an optional stored timestamp, defaulting to now.
#[must_use]
pub fn resolve_timestamp(ts: Option<DateTime<Utc>>) -> DateTime<Utc> {
    ts.unwrap_or_else(Utc::now)
}

/// A product document as stored (id lives in the document key).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDocument {
    pub title: String,
    pub description: String,
    pub price: Price,
    pub category: String,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub rating_count: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProductDocument {
    /// Convert to the domain record, applying the timestamp coercion.
    #[must_use]
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            title: self.title,
            description: self.description,
            price: self.price,
            category: self.category,
            image_url: self.image_url,
            image_path: self.image_path,
            rating: self.rating,
            rating_count: self.rating_count,
            created_at: resolve_timestamp(self.created_at),
            updated_at: resolve_timestamp(self.updated_at),
        }
    }
}

/// An order document as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDocument {
    pub user_id: UserId,
    pub user_email: Email,
    pub items: Vec<OrderItem>,
    pub total_amount: Price,
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl OrderDocument {
    /// Convert to the domain record, applying the timestamp coercion.
    #[must_use]
    pub fn into_order(self, id: OrderId) -> Order {
        Order {
            id,
            user_id: self.user_id,
            user_email: self.user_email,
            items: self.items,
            total_amount: self.total_amount,
            status: self.status,
            created_at: resolve_timestamp(self.created_at),
            updated_at: resolve_timestamp(self.updated_at),
        }
    }
}

/// A user profile document as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    pub email: Email,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, rename = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A user profile as read back, with timestamps resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub email: Email,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserDocument {
    /// Convert to the domain record, applying the timestamp coercion.
    #[must_use]
    pub fn into_record(self, id: UserId) -> UserRecord {
        UserRecord {
            id,
            email: self.email,
            display_name: self.display_name,
            photo_url: self.photo_url,
            is_admin: self.is_admin,
            created_at: resolve_timestamp(self.created_at),
            updated_at: resolve_timestamp(self.updated_at),
        }
    }
}

/// The per-user cart mirror document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDocument {
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CartDocument {
    /// Extract the cart, restoring its invariants.
    #[must_use]
    pub fn into_cart(self) -> Cart {
        Cart::from_items(self.items)
    }
}
