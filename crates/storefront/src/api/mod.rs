//! Commerce API integration.
//!
//! The backend speaks a uniform JSON envelope over REST:
//! `{"success": true, "data": ...}` on success and
//! `{"success": false, "error": {"code", "message"}}` on failure.
//! This module owns the HTTP client, the wire types, and the gateway
//! traits the rest of the crate programs against.
//!
//! Every gateway call is sent at most once. Retry policy belongs to
//! callers, who decide based on [`ApiError::kind`] whether a retry is
//! worth offering.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use auric_core::{Email, ErrorKind, PhoneNumber};

use crate::models::{Cart, CustomerProfile, LineKey, ProfileUpdate, Wishlist};

pub mod auth;
pub mod cart;
pub mod client;
pub mod types;
pub mod wishlist;

pub use client::CommerceClient;
pub use types::{
    ApiEnvelope, ApiErrorBody, CartItemInput, RegisterInput, TokenGrant, WishlistItemInput,
};

// ============================================================================
// Errors
// ============================================================================

/// Errors from the commerce API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport failure, including connect errors and timeouts.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body was not valid JSON.
    #[error("failed to parse API response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Response parsed but violated the expected shape.
    #[error("unexpected API response: {0}")]
    Decode(String),

    /// The request needs a valid customer token.
    #[error("authentication required: {0}")]
    AuthRequired(String),

    /// The backend rejected the request as invalid.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The addressed resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request conflicts with current server state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Rate limited; retry after the given number of seconds.
    #[error("rate limited, retry after {0}s")]
    RateLimited(u64),

    /// The backend failed.
    #[error("server error (status {status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Server-provided diagnostic.
        message: String,
    },
}

impl ApiError {
    /// Machine-readable classification for callers.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::NetworkError,
            Self::Parse(_) | Self::Decode(_) | Self::Server { .. } => ErrorKind::ServerError,
            Self::AuthRequired(_) => ErrorKind::AuthRequired,
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::RateLimited(_) => ErrorKind::RateLimited,
        }
    }
}

// ============================================================================
// Response decoding
// ============================================================================

/// Unwrap an envelope response into its data payload.
///
/// Rate limiting is checked before anything else so the Retry-After
/// header survives even when the body is empty or malformed.
pub(crate) async fn decode_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(1);
        return Err(ApiError::RateLimited(retry_after));
    }

    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body)
            .ok()
            .and_then(|envelope| envelope.error)
            .map_or_else(
                || body.chars().take(500).collect::<String>(),
                |error| error.message,
            );
        tracing::error!(
            status = %status,
            message = %message,
            "Commerce API request failed"
        );
        return Err(classify_status(status.as_u16(), message));
    }

    let envelope: ApiEnvelope<T> = serde_json::from_str(&body)?;
    if !envelope.success {
        let error = envelope.error.unwrap_or_else(|| ApiErrorBody {
            code: ErrorKind::ServerError.as_str().to_owned(),
            message: "response marked unsuccessful without an error body".to_owned(),
        });
        tracing::error!(
            code = %error.code,
            message = %error.message,
            "Commerce API returned an error envelope"
        );
        return Err(classify_code(&error.code, error.message));
    }
    envelope
        .data
        .ok_or_else(|| ApiError::Decode("successful response missing data payload".to_owned()))
}

/// Unwrap an envelope response that carries no data payload.
pub(crate) async fn decode_empty_response(response: reqwest::Response) -> Result<(), ApiError> {
    match decode_response::<serde_json::Value>(response).await {
        Ok(_) => Ok(()),
        // Some endpoints answer success with no data field at all.
        Err(ApiError::Decode(_)) => Ok(()),
        Err(error) => Err(error),
    }
}

fn classify_status(status: u16, message: String) -> ApiError {
    match status {
        401 | 403 => ApiError::AuthRequired(message),
        404 => ApiError::NotFound(message),
        409 => ApiError::Conflict(message),
        400 | 410 | 422 => ApiError::Validation(message),
        _ => ApiError::Server { status, message },
    }
}

fn classify_code(code: &str, message: String) -> ApiError {
    match code.parse::<ErrorKind>() {
        Ok(ErrorKind::AuthRequired) => ApiError::AuthRequired(message),
        Ok(ErrorKind::Validation) => ApiError::Validation(message),
        Ok(ErrorKind::NotFound) => ApiError::NotFound(message),
        Ok(ErrorKind::Conflict) => ApiError::Conflict(message),
        Ok(ErrorKind::RateLimited) => ApiError::RateLimited(1),
        // The envelope arrived over a 200, so the status carries no signal.
        Ok(ErrorKind::NetworkError | ErrorKind::ServerError) | Err(_) => {
            ApiError::Server { status: 200, message }
        }
    }
}

// ============================================================================
// Gateway traits
// ============================================================================

/// Server-side cart operations for an authenticated customer.
///
/// Every call targets the customer identified by `access_token` and
/// returns the full post-operation cart as the server sees it.
#[async_trait]
pub trait CartGateway: Send + Sync {
    /// Fetch the customer's cart.
    async fn fetch_cart(&self, access_token: &str) -> Result<Cart, ApiError>;

    /// Add an item. The server increments quantity if the line exists
    /// and prices the line from its own catalog.
    async fn add_item(&self, access_token: &str, item: &CartItemInput) -> Result<Cart, ApiError>;

    /// Set the quantity of an existing line.
    async fn update_item(
        &self,
        access_token: &str,
        key: &LineKey,
        quantity: u32,
    ) -> Result<Cart, ApiError>;

    /// Remove a line.
    async fn remove_item(&self, access_token: &str, key: &LineKey) -> Result<Cart, ApiError>;
}

/// Server-side wishlist operations for an authenticated customer.
#[async_trait]
pub trait WishlistGateway: Send + Sync {
    /// Fetch the customer's wishlist.
    async fn fetch_wishlist(&self, access_token: &str) -> Result<Wishlist, ApiError>;

    /// Save an item. Saving an already-saved key is not an error.
    async fn add_item(
        &self,
        access_token: &str,
        item: &WishlistItemInput,
    ) -> Result<Wishlist, ApiError>;

    /// Remove a saved item.
    async fn remove_item(&self, access_token: &str, key: &LineKey) -> Result<Wishlist, ApiError>;
}

/// Authentication and account endpoints.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Create an account with email and password.
    async fn register(&self, input: &RegisterInput) -> Result<TokenGrant, ApiError>;

    /// Sign in with email and password.
    async fn login_password(&self, email: &Email, password: &str) -> Result<TokenGrant, ApiError>;

    /// Exchange an identity provider token (e.g. Google) for a session.
    async fn verify_provider_token(
        &self,
        provider: &str,
        id_token: &str,
    ) -> Result<TokenGrant, ApiError>;

    /// Send a one-time code to a phone number.
    async fn send_phone_code(
        &self,
        phone: &PhoneNumber,
        bot_check_token: &str,
    ) -> Result<(), ApiError>;

    /// Exchange a received one-time code for a session.
    async fn verify_phone_code(
        &self,
        phone: &PhoneNumber,
        code: &str,
    ) -> Result<TokenGrant, ApiError>;

    /// Send a sign-in link to an email address.
    async fn send_email_link(&self, email: &Email, continue_url: &str) -> Result<(), ApiError>;

    /// Exchange a received sign-in link for a session.
    async fn verify_email_link(&self, email: &Email, link: &str) -> Result<TokenGrant, ApiError>;

    /// Mint a fresh access token from a refresh token.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, ApiError>;

    /// Invalidate an access token server-side.
    async fn revoke(&self, access_token: &str) -> Result<(), ApiError>;

    /// Fetch the customer profile.
    async fn fetch_profile(&self, access_token: &str) -> Result<CustomerProfile, ApiError>;

    /// Apply a partial profile update and return the updated profile.
    async fn update_profile(
        &self,
        access_token: &str,
        update: &ProfileUpdate,
    ) -> Result<CustomerProfile, ApiError>;

    /// Email a password reset code.
    async fn request_password_reset(&self, email: &Email) -> Result<(), ApiError>;

    /// Redeem a password reset code.
    async fn confirm_password_reset(&self, code: &str, new_password: &str)
    -> Result<(), ApiError>;
}
