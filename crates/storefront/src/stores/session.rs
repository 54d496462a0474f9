//! Session persistence.
//!
//! The access token record and the refresh token live under separate
//! keys so either can be rotated or cleared without rewriting the
//! other. The pending email-link address is durable too, because the
//! link usually lands after a restart.

use serde::{Deserialize, Serialize};

use auric_core::CustomerId;

use crate::models::{AuthMethod, CustomerProfile, Session};
use crate::storage::{Storage, StorageError, keys};

/// The persisted access token record.
#[derive(Debug, Serialize, Deserialize)]
struct AccessTokenRecord {
    token: String,
    customer_id: CustomerId,
    auth_method: AuthMethod,
    expires_in: Option<i64>,
    obtained_at: i64,
}

/// An email address awaiting magic-link confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEmail {
    /// The address the link was sent to.
    pub email: String,
    /// Unix timestamp when the link was requested.
    pub sent_at: i64,
}

/// Persists the auth session across restarts.
#[derive(Debug, Clone)]
pub struct SessionStore {
    storage: Storage,
}

impl SessionStore {
    /// Build a store over the given storage handle.
    #[must_use]
    pub const fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Persist a session, splitting it across the token keys.
    pub fn persist(&self, session: &Session) -> Result<(), StorageError> {
        let record = AccessTokenRecord {
            token: session.access_token.clone(),
            customer_id: session.customer_id.clone(),
            auth_method: session.auth_method,
            expires_in: session.expires_in,
            obtained_at: session.obtained_at,
        };
        self.storage.set_json(keys::ACCESS_TOKEN, &record)?;
        match &session.refresh_token {
            Some(refresh) => self.storage.set_json(keys::REFRESH_TOKEN, refresh)?,
            None => self.storage.remove(keys::REFRESH_TOKEN)?,
        }
        Ok(())
    }

    /// Recompose the persisted session, if one exists.
    pub fn restore(&self) -> Result<Option<Session>, StorageError> {
        let Some(record) = self.storage.get_json::<AccessTokenRecord>(keys::ACCESS_TOKEN)? else {
            return Ok(None);
        };
        let refresh_token = self.storage.get_json::<String>(keys::REFRESH_TOKEN)?;
        Ok(Some(Session {
            customer_id: record.customer_id,
            auth_method: record.auth_method,
            access_token: record.token,
            refresh_token,
            expires_in: record.expires_in,
            obtained_at: record.obtained_at,
        }))
    }

    /// Drop the session and everything derived from it.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(keys::ACCESS_TOKEN)?;
        self.storage.remove(keys::REFRESH_TOKEN)?;
        self.storage.remove(keys::PROFILE)
    }

    /// Cache the customer profile for offline display.
    pub fn cache_profile(&self, profile: &CustomerProfile) -> Result<(), StorageError> {
        self.storage.set_json(keys::PROFILE, profile)
    }

    /// The cached profile, if any.
    pub fn cached_profile(&self) -> Result<Option<CustomerProfile>, StorageError> {
        self.storage.get_json(keys::PROFILE)
    }

    /// Record the address a magic link was just sent to.
    pub fn set_pending_email(&self, pending: &PendingEmail) -> Result<(), StorageError> {
        self.storage.set_json(keys::PENDING_EMAIL, pending)
    }

    /// The address awaiting link confirmation, if any.
    pub fn pending_email(&self) -> Result<Option<PendingEmail>, StorageError> {
        self.storage.get_json(keys::PENDING_EMAIL)
    }

    /// Forget the pending address.
    pub fn clear_pending_email(&self) -> Result<(), StorageError> {
        self.storage.remove(keys::PENDING_EMAIL)
    }
}
