//! Unified error handling.
//!
//! Provides a single `StorefrontError` wrapping every layer's error,
//! so frontends can match one type and branch on [`ErrorKind`].

use thiserror::Error;

use auric_core::ErrorKind;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::services::{AuthError, CartError, WishlistError};
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Configuration loading failed.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Wishlist operation failed.
    #[error("Wishlist error: {0}")]
    Wishlist(#[from] WishlistError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Local persistence failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Commerce API operation failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl StorefrontError {
    /// Machine-readable classification for frontends.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Validation,
            Self::Cart(err) => err.kind(),
            Self::Wishlist(err) => err.kind(),
            Self::Auth(err) => err.kind(),
            Self::Storage(err) => err.kind(),
            Self::Api(err) => err.kind(),
            Self::Http(_) => ErrorKind::NetworkError,
        }
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorefrontError::from(AuthError::InvalidCredentials);
        assert_eq!(err.to_string(), "Auth error: invalid credentials");

        let err = StorefrontError::from(ApiError::NotFound("no such line".to_string()));
        assert_eq!(err.to_string(), "API error: not found: no such line");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            StorefrontError::from(AuthError::NotAuthenticated).kind(),
            ErrorKind::AuthRequired
        );
        assert_eq!(
            StorefrontError::from(ApiError::RateLimited(30)).kind(),
            ErrorKind::RateLimited
        );
        assert_eq!(
            StorefrontError::from(StorageError::QuotaExceeded).kind(),
            ErrorKind::ServerError
        );
        assert_eq!(
            StorefrontError::from(ConfigError::MissingEnvVar("AURIC_API_KEY".to_string())).kind(),
            ErrorKind::Validation
        );
    }
}
