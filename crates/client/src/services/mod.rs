//! Application services over the backend collaborators.
//!
//! Services own the policy the UI surfaces rely on: catalog caching and
//! query fallback, checkout totals and order submission, account lifecycle,
//! and product image handling.

pub mod auth;
pub mod catalog;
pub mod media;
pub mod orders;

pub use auth::AuthService;
pub use catalog::CatalogService;
pub use media::{MediaError, MediaService};
pub use orders::{CheckoutError, CheckoutSummary, OrderService};
