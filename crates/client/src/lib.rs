//! TrueWave client library.
//!
//! The storefront application core: a synchronous state container for the
//! cart and auth slices, middleware for session persistence and debounced
//! remote sync, auth-triggered cart reconciliation, and the services backing
//! the catalog, checkout, profile, and admin panel surfaces.
//!
//! # Architecture
//!
//! All persistence, authentication, and file storage are delegated to a
//! hosted backend reached only through the collaborator traits in
//! [`backend`]. Reducers are pure; every side effect (session slot writes,
//! remote cart writes) lives in a middleware observing dispatched actions.
//!
//! ```text
//! dispatch(action) -> reduce (pure) -> notices -> middleware
//!                                                  |- slot persistence
//!                                                  |- debounced cart sync
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod services;
pub mod session;
pub mod store;
pub mod telemetry;

pub use app::App;
pub use error::{AppError, Result};
