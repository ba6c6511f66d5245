//! The application-level error type.

use thiserror::Error;

use crate::backend::{AuthError, BackendError};
use crate::config::ConfigError;
use crate::services::{CheckoutError, MediaError};

/// Convenience alias for application results.
pub type Result<T> = std::result::Result<T, AppError>;

/// Any error the application surfaces to its caller.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Media(#[from] MediaError),
}
