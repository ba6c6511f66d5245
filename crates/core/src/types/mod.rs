//! Core types for TrueWave.
//!
//! This module provides type-safe wrappers for common domain concepts and
//! the records exchanged with the hosted backend.

pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod status;
pub mod user;

pub use email::{Email, EmailError};
pub use id::*;
pub use order::{Order, OrderDraft, OrderItem};
pub use price::{Price, PriceError};
pub use product::{Product, ProductDraft};
pub use status::OrderStatus;
pub use user::{ProfileUpdate, User};
