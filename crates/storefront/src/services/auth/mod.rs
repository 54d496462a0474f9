//! Authentication service.
//!
//! Bridges the storefront to the auth backend: password, Google,
//! phone-code, and email-link sign-in, plus session persistence,
//! token refresh, and the cached profile.

mod error;

pub use error::AuthError;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rand::RngCore;
use tokio::sync::Mutex;
use tracing::instrument;

use auric_core::{ChallengeId, Email, ErrorKind, PhoneNumber};

use crate::api::{ApiError, AuthBackend, RegisterInput, TokenGrant};
use crate::models::{AuthMethod, CustomerProfile, ProfileUpdate, Session};
use crate::stores::SessionStore;
use crate::stores::session::PendingEmail;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// How long a phone code stays redeemable client-side.
const PHONE_CHALLENGE_TTL_SECS: i64 = 600;

/// How long an email link stays redeemable client-side.
const EMAIL_LINK_TTL_SECS: i64 = 3600;

/// Identity providers the storefront can sign in through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthProvider {
    /// Google identity token sign-in.
    Google,
}

impl AuthProvider {
    /// Name the backend expects on the wire.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Google => "google",
        }
    }

    const fn method(self) -> AuthMethod {
        match self {
            Self::Google => AuthMethod::Google,
        }
    }
}

/// Produces the anti-bot token the phone-code endpoint requires.
#[async_trait]
pub trait BotCheck: Send + Sync {
    /// A fresh token proving the caller is not a bot.
    async fn token(&self) -> Result<String, AuthError>;
}

/// Stand-in bot check minting random tokens, for environments without
/// a real challenge provider.
#[derive(Debug, Default)]
pub struct StubBotCheck;

#[async_trait]
impl BotCheck for StubBotCheck {
    async fn token(&self) -> Result<String, AuthError> {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Ok(bytes.iter().map(|byte| format!("{byte:02x}")).collect())
    }
}

/// An outstanding phone-code challenge.
#[derive(Debug, Clone)]
struct PhoneChallenge {
    id: ChallengeId,
    number: PhoneNumber,
    expires_at: i64,
}

#[derive(Debug, Default)]
struct AuthState {
    session: Option<Session>,
    pending_phone: Option<PhoneChallenge>,
}

struct AuthBridgeInner {
    backend: Arc<dyn AuthBackend>,
    bot_check: Arc<dyn BotCheck>,
    sessions: SessionStore,
    email_link_url: String,
    state: Mutex<AuthState>,
}

/// The authentication engine.
///
/// Cheap to clone; all clones share one session.
#[derive(Clone)]
pub struct AuthBridge {
    inner: Arc<AuthBridgeInner>,
}

impl AuthBridge {
    /// Build a bridge with no active session.
    ///
    /// `email_link_url` is the continue URL embedded in sign-in links.
    #[must_use]
    pub fn new(
        backend: Arc<dyn AuthBackend>,
        bot_check: Arc<dyn BotCheck>,
        sessions: SessionStore,
        email_link_url: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(AuthBridgeInner {
                backend,
                bot_check,
                sessions,
                email_link_url: email_link_url.into(),
                state: Mutex::new(AuthState::default()),
            }),
        }
    }

    // =========================================================================
    // Session Lifecycle
    // =========================================================================

    /// The active session, if any.
    pub async fn current_session(&self) -> Option<Session> {
        self.inner.state.lock().await.session.clone()
    }

    /// Load the persisted session from a previous run.
    ///
    /// An expired session is refreshed when a refresh token exists and
    /// silently discarded otherwise.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<Option<Session>, AuthError> {
        let mut state = self.inner.state.lock().await;
        let Some(session) = self.inner.sessions.restore()? else {
            return Ok(None);
        };
        if !session.is_expired() {
            state.session = Some(session.clone());
            return Ok(Some(session));
        }
        let Some(refresh) = session.refresh_token.clone() else {
            self.inner.sessions.clear()?;
            return Ok(None);
        };
        match self.inner.backend.refresh(&refresh).await {
            Ok(grant) => {
                let session = self.store_grant(&mut state, grant, session.auth_method)?;
                Ok(Some(session))
            }
            Err(error) => {
                tracing::warn!(error = %error, "Failed to refresh restored session");
                self.inner.sessions.clear()?;
                Ok(None)
            }
        }
    }

    /// The active session, refreshed first if it is about to expire.
    pub async fn ensure_fresh(&self) -> Result<Session, AuthError> {
        let mut state = self.inner.state.lock().await;
        self.fresh_session_locked(&mut state).await
    }

    /// Sign out.
    ///
    /// Revocation is best-effort: a backend failure is logged and the
    /// local session is dropped regardless.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AuthError> {
        let mut state = self.inner.state.lock().await;
        if let Some(session) = state.session.take() {
            if let Err(error) = self.inner.backend.revoke(&session.access_token).await {
                tracing::warn!(error = %error, "Failed to revoke access token");
            }
        }
        state.pending_phone = None;
        self.inner.sessions.clear()?;
        self.inner.sessions.clear_pending_email()?;
        Ok(())
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a new account with email and password and sign in.
    #[instrument(skip(self, password, first_name, last_name))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Result<Session, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let mut state = self.inner.state.lock().await;
        let grant = self
            .inner
            .backend
            .register(&RegisterInput {
                email,
                password: password.to_owned(),
                first_name,
                last_name,
            })
            .await
            .map_err(|error| match error {
                ApiError::Conflict(_) => AuthError::AccountExists,
                other => AuthError::from_api(other),
            })?;
        self.store_grant(&mut state, grant, AuthMethod::Password)
    }

    /// Sign in with email and password.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = Email::parse(email)?;
        let mut state = self.inner.state.lock().await;
        let grant = self
            .inner
            .backend
            .login_password(&email, password)
            .await
            .map_err(|error| match error {
                ApiError::AuthRequired(_) | ApiError::NotFound(_) => {
                    AuthError::InvalidCredentials
                }
                other => AuthError::from_api(other),
            })?;
        self.store_grant(&mut state, grant, AuthMethod::Password)
    }

    /// Email a password reset code.
    #[instrument(skip(self))]
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        self.inner
            .backend
            .request_password_reset(&email)
            .await
            .map_err(AuthError::from_api)
    }

    /// Redeem a password reset code with a new password.
    #[instrument(skip(self, code, new_password))]
    pub async fn confirm_password_reset(
        &self,
        code: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(new_password)?;
        self.inner
            .backend
            .confirm_password_reset(code, new_password)
            .await
            .map_err(|error| match error {
                ApiError::Validation(_) | ApiError::NotFound(_) => AuthError::InvalidCode,
                other => AuthError::from_api(other),
            })
    }

    // =========================================================================
    // Provider Sign-In
    // =========================================================================

    /// Exchange an identity provider token for a session.
    #[instrument(skip(self, id_token))]
    pub async fn login_with_provider(
        &self,
        provider: AuthProvider,
        id_token: &str,
    ) -> Result<Session, AuthError> {
        let mut state = self.inner.state.lock().await;
        let grant = self
            .inner
            .backend
            .verify_provider_token(provider.wire_name(), id_token)
            .await
            .map_err(|error| match error {
                ApiError::AuthRequired(_) => AuthError::InvalidCredentials,
                other => AuthError::from_api(other),
            })?;
        self.store_grant(&mut state, grant, provider.method())
    }

    /// Exchange a Google identity token for a session.
    pub async fn login_with_google(&self, id_token: &str) -> Result<Session, AuthError> {
        self.login_with_provider(AuthProvider::Google, id_token).await
    }

    // =========================================================================
    // Phone Code Sign-In
    // =========================================================================

    /// Send a one-time code to a phone number.
    ///
    /// Returns the challenge ID for the outstanding code. Requesting a
    /// new code replaces any previous outstanding one.
    #[instrument(skip(self))]
    pub async fn request_phone_code(&self, number: &str) -> Result<ChallengeId, AuthError> {
        let number = PhoneNumber::parse(number)?;
        let mut state = self.inner.state.lock().await;
        let bot_token = self.inner.bot_check.token().await?;
        self.inner
            .backend
            .send_phone_code(&number, &bot_token)
            .await
            .map_err(AuthError::from_api)?;
        let challenge = PhoneChallenge {
            id: ChallengeId::new(uuid::Uuid::new_v4().to_string()),
            number,
            expires_at: Utc::now().timestamp() + PHONE_CHALLENGE_TTL_SECS,
        };
        let id = challenge.id.clone();
        state.pending_phone = Some(challenge);
        Ok(id)
    }

    /// Redeem a received one-time code.
    ///
    /// The number must match the one the outstanding code was sent to.
    #[instrument(skip(self, code))]
    pub async fn confirm_phone_code(
        &self,
        number: &str,
        code: &str,
    ) -> Result<Session, AuthError> {
        let number = PhoneNumber::parse(number)?;
        let mut state = self.inner.state.lock().await;
        let Some(challenge) = state.pending_phone.clone() else {
            return Err(AuthError::ChallengeMissing);
        };
        if challenge.number != number {
            return Err(AuthError::PhoneMismatch);
        }
        if Utc::now().timestamp() >= challenge.expires_at {
            state.pending_phone = None;
            return Err(AuthError::ChallengeExpired);
        }
        let grant = self
            .inner
            .backend
            .verify_phone_code(&number, code)
            .await
            .map_err(|error| match error {
                ApiError::AuthRequired(_) | ApiError::Validation(_) => AuthError::InvalidCode,
                other => AuthError::from_api(other),
            })?;
        state.pending_phone = None;
        self.store_grant(&mut state, grant, AuthMethod::PhoneOtp)
    }

    // =========================================================================
    // Email Link Sign-In
    // =========================================================================

    /// Send a sign-in link to an email address.
    ///
    /// The address is persisted so the link can be redeemed after a
    /// restart, which is how these links usually arrive.
    #[instrument(skip(self))]
    pub async fn request_email_link(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        let _state = self.inner.state.lock().await;
        self.inner
            .backend
            .send_email_link(&email, &self.inner.email_link_url)
            .await
            .map_err(AuthError::from_api)?;
        self.inner.sessions.set_pending_email(&PendingEmail {
            email: email.as_str().to_owned(),
            sent_at: Utc::now().timestamp(),
        })?;
        Ok(())
    }

    /// Redeem a received sign-in link.
    ///
    /// When `address` is given it must match the one the link was sent
    /// to; when it is not, the persisted pending address is used. With
    /// neither available the link cannot be attributed and the call
    /// fails.
    #[instrument(skip(self, link))]
    pub async fn confirm_email_link(
        &self,
        link: &str,
        address: Option<&str>,
    ) -> Result<Session, AuthError> {
        let mut state = self.inner.state.lock().await;
        let pending = self.inner.sessions.pending_email()?;
        let email = match (&pending, address) {
            (None, None) => return Err(AuthError::PendingAddressMissing),
            (None, Some(given)) => Email::parse(given)?,
            (Some(pending), given) => {
                if let Some(given) = given {
                    let given = Email::parse(given)?;
                    if given.as_str() != pending.email {
                        return Err(AuthError::AddressMismatch);
                    }
                }
                if Utc::now().timestamp() >= pending.sent_at + EMAIL_LINK_TTL_SECS {
                    self.inner.sessions.clear_pending_email()?;
                    return Err(AuthError::LinkExpired);
                }
                Email::parse(&pending.email)?
            }
        };
        let grant = self
            .inner
            .backend
            .verify_email_link(&email, link)
            .await
            .map_err(|error| match error {
                ApiError::AuthRequired(_) | ApiError::Validation(_) | ApiError::NotFound(_) => {
                    AuthError::InvalidLink
                }
                other => AuthError::from_api(other),
            })?;
        self.inner.sessions.clear_pending_email()?;
        self.store_grant(&mut state, grant, AuthMethod::EmailLink)
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Fetch the customer profile, refreshing the offline cache.
    ///
    /// When the backend is unreachable the cached copy is served
    /// instead, if one exists.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<CustomerProfile, AuthError> {
        let mut state = self.inner.state.lock().await;
        let session = self.fresh_session_locked(&mut state).await?;
        match self.inner.backend.fetch_profile(&session.access_token).await {
            Ok(profile) => {
                self.inner.sessions.cache_profile(&profile)?;
                Ok(profile)
            }
            Err(error) if error.kind() == ErrorKind::NetworkError => {
                if let Some(cached) = self.inner.sessions.cached_profile()? {
                    tracing::warn!(error = %error, "Serving cached profile, fetch failed");
                    return Ok(cached);
                }
                Err(AuthError::from_api(error))
            }
            Err(error) => Err(AuthError::from_api(error)),
        }
    }

    /// Apply a partial profile update and refresh the cache.
    #[instrument(skip(self, update))]
    pub async fn update_profile(
        &self,
        update: &ProfileUpdate,
    ) -> Result<CustomerProfile, AuthError> {
        let mut state = self.inner.state.lock().await;
        let session = self.fresh_session_locked(&mut state).await?;
        let profile = self
            .inner
            .backend
            .update_profile(&session.access_token, update)
            .await
            .map_err(AuthError::from_api)?;
        self.inner.sessions.cache_profile(&profile)?;
        Ok(profile)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn store_grant(
        &self,
        state: &mut AuthState,
        grant: TokenGrant,
        method: AuthMethod,
    ) -> Result<Session, AuthError> {
        let session = Session {
            customer_id: grant.customer_id,
            auth_method: method,
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_in: grant.expires_in,
            obtained_at: Utc::now().timestamp(),
        };
        self.inner.sessions.persist(&session)?;
        state.session = Some(session.clone());
        Ok(session)
    }

    async fn fresh_session_locked(&self, state: &mut AuthState) -> Result<Session, AuthError> {
        let Some(session) = state.session.clone() else {
            return Err(AuthError::NotAuthenticated);
        };
        if !session.is_expired() {
            return Ok(session);
        }
        let Some(refresh) = session.refresh_token.clone() else {
            state.session = None;
            self.inner.sessions.clear()?;
            return Err(AuthError::NotAuthenticated);
        };
        match self.inner.backend.refresh(&refresh).await {
            Ok(grant) => self.store_grant(state, grant, session.auth_method),
            Err(error) if error.kind() == ErrorKind::AuthRequired => {
                state.session = None;
                self.inner.sessions.clear()?;
                Err(AuthError::NotAuthenticated)
            }
            Err(error) => Err(AuthError::from_api(error)),
        }
    }

    #[cfg(test)]
    async fn expire_pending_phone(&self) {
        let mut state = self.inner.state.lock().await;
        if let Some(challenge) = &mut state.pending_phone {
            challenge.expires_at = 0;
        }
    }
}

impl std::fmt::Debug for AuthBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthBridge").finish_non_exhaustive()
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}
