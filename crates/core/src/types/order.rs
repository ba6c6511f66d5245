//! Order records.
//!
//! An order is an immutable snapshot of a cart at checkout time. Item
//! titles, prices, and images are captured at submission and do not track
//! later product edits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Email, OrderId, OrderStatus, Price, ProductId, UserId};
use crate::cart::CartItem;

/// A single line of an order, captured at submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub title: String,
    pub price: Price,
    pub quantity: u32,
    #[serde(rename = "imageURL")]
    pub image_url: String,
}

impl From<&CartItem> for OrderItem {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product.id.clone(),
            title: item.product.title.clone(),
            price: item.product.price,
            quantity: item.quantity,
            image_url: item.product.image_url.clone(),
        }
    }
}

/// An order as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub user_email: Email,
    pub items: Vec<OrderItem>,
    /// Full-precision total (subtotal plus tax). Display rounding happens
    /// at the presentation boundary via [`Price::display`].
    pub total_amount: Price,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order data submitted at checkout; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub user_id: UserId,
    pub user_email: Email,
    pub items: Vec<OrderItem>,
    pub total_amount: Price,
    pub status: OrderStatus,
}
