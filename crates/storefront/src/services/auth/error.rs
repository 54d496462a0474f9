//! Authentication error types.

use thiserror::Error;

use auric_core::{EmailError, ErrorKind, PhoneError};

use crate::api::ApiError;
use crate::storage::StorageError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Invalid phone number format.
    #[error("invalid phone number: {0}")]
    InvalidPhone(#[from] PhoneError),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Invalid credentials (wrong password or unknown account).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("an account with this email already exists")]
    AccountExists,

    /// A code was submitted before any code was requested.
    #[error("no phone code was requested")]
    ChallengeMissing,

    /// The requested phone code is no longer redeemable.
    #[error("the phone code has expired; request a new one")]
    ChallengeExpired,

    /// The confirmed number differs from the one the code was sent to.
    #[error("phone number does not match the one the code was sent to")]
    PhoneMismatch,

    /// The submitted code is wrong.
    #[error("incorrect code")]
    InvalidCode,

    /// A link was submitted with no address on record and none given.
    #[error("no sign-in link was requested")]
    PendingAddressMissing,

    /// The sign-in link is no longer redeemable.
    #[error("the sign-in link has expired; request a new one")]
    LinkExpired,

    /// The confirmed address differs from the one the link was sent to.
    #[error("email address does not match the one the link was sent to")]
    AddressMismatch,

    /// The sign-in link is malformed or was already used.
    #[error("invalid sign-in link")]
    InvalidLink,

    /// No customer is signed in.
    #[error("no customer is signed in")]
    NotAuthenticated,

    /// Rate limited; retry after the given number of seconds.
    #[error("too many attempts, retry after {0}s")]
    RateLimited(u64),

    /// Device storage failed.
    #[error("session storage error: {0}")]
    Storage(#[from] StorageError),

    /// The auth backend failed.
    #[error("auth API error: {0}")]
    Api(ApiError),
}

impl AuthError {
    /// Machine-readable classification for callers.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidEmail(_)
            | Self::InvalidPhone(_)
            | Self::WeakPassword(_)
            | Self::ChallengeMissing
            | Self::ChallengeExpired
            | Self::PhoneMismatch
            | Self::InvalidCode
            | Self::PendingAddressMissing
            | Self::LinkExpired
            | Self::AddressMismatch
            | Self::InvalidLink => ErrorKind::Validation,
            Self::InvalidCredentials | Self::NotAuthenticated => ErrorKind::AuthRequired,
            Self::AccountExists => ErrorKind::Conflict,
            Self::RateLimited(_) => ErrorKind::RateLimited,
            Self::Storage(error) => error.kind(),
            Self::Api(error) => error.kind(),
        }
    }

    /// Wrap a backend error, keeping rate limiting first-class so the
    /// retry-after hint survives.
    pub(crate) fn from_api(error: ApiError) -> Self {
        match error {
            ApiError::RateLimited(retry_after) => Self::RateLimited(retry_after),
            other => Self::Api(other),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(AuthError::ChallengeMissing.kind(), ErrorKind::Validation);
        assert_eq!(AuthError::InvalidCredentials.kind(), ErrorKind::AuthRequired);
        assert_eq!(AuthError::AccountExists.kind(), ErrorKind::Conflict);
        assert_eq!(AuthError::RateLimited(5).kind(), ErrorKind::RateLimited);
    }

    #[test]
    fn test_from_api_preserves_retry_after() {
        let error = AuthError::from_api(ApiError::RateLimited(42));
        assert!(matches!(error, AuthError::RateLimited(42)));

        let error = AuthError::from_api(ApiError::NotFound("x".into()));
        assert!(matches!(error, AuthError::Api(ApiError::NotFound(_))));
    }
}
