//! TrueWave Core - Shared domain types library.
//!
//! This crate provides the domain model shared by all TrueWave components:
//! - `client` - The storefront application core (state, sync, services)
//! - `integration-tests` - Cross-crate scenario tests
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no async,
//! no backend access. The cart state machine lives here so its invariants
//! can be tested without touching any collaborator.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, emails, statuses, and domain records
//! - [`cart`] - The cart collection with its mutation and merge semantics

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{Cart, CartItem, CartMutation};
pub use types::*;
