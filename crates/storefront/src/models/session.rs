//! Session and customer profile types.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use auric_core::{CustomerId, Email, PhoneNumber};

/// How a session was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Email address and password.
    Password,
    /// Google identity token.
    Google,
    /// One-time code sent to a phone number.
    PhoneOtp,
    /// Magic link sent to an email address.
    EmailLink,
}

/// An authenticated customer session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// The signed-in customer.
    pub customer_id: CustomerId,
    /// How the session was established.
    pub auth_method: AuthMethod,
    /// Bearer token for authenticated API calls.
    pub access_token: String,
    /// Token used to mint a fresh access token, when the backend issues one.
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds, if bounded.
    pub expires_in: Option<i64>,
    /// Unix timestamp when the access token was obtained.
    pub obtained_at: i64,
}

impl Session {
    /// Check if the access token is expired or about to expire.
    ///
    /// Returns true if the token expires within the next 60 seconds,
    /// so callers refresh before hitting an expired-token error mid-flow.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_in.is_some_and(|expires_in| {
            let now = Utc::now().timestamp();
            let expires_at = self.obtained_at + expires_in;
            now >= (expires_at - 60)
        })
    }
}

/// Customer profile as served by the account endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    /// Customer identifier.
    pub id: CustomerId,
    /// Primary email address, when one is on file.
    pub email: Option<Email>,
    /// Verified phone number, when one is on file.
    pub phone: Option<PhoneNumber>,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Marketing consent flag.
    pub accepts_marketing: bool,
}

impl CustomerProfile {
    /// Full display name, falling back through the available parts.
    #[must_use]
    pub fn full_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => "Customer".to_owned(),
        }
    }
}

/// Partial profile update. Only set fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// New given name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// New family name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// New phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<PhoneNumber>,
    /// New marketing consent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepts_marketing: Option<bool>,
}
