//! Account sign-in, sign-out, and inspection commands.
//!
//! # Usage
//!
//! ```bash
//! auric auth register -e shopper@example.com -p <password> --first-name Ada
//! auric auth login -e shopper@example.com -p <password>
//! auric auth phone-request +14155550123
//! auric auth phone-confirm +14155550123 123456
//! auric auth whoami
//! auric auth logout
//! ```
//!
//! Signing in folds the guest cart and wishlist into the account; any
//! lines that fail to merge stay on this device and `auric sync`
//! retries them.

use rand::RngCore;
use thiserror::Error;

use auric_storefront::api::CommerceClient;
use auric_storefront::config::StorefrontConfig;
use auric_storefront::shop::LoginOutcome;
use auric_storefront::{Shopfront, StorefrontError};

/// Errors that can occur during auth commands.
#[derive(Debug, Error)]
pub enum AuthCliError {
    /// No Google OAuth client ID in the configuration.
    #[error("Google sign-in is not configured; set AURIC_GOOGLE_CLIENT_ID")]
    GoogleNotConfigured,

    /// The storefront rejected or failed the operation.
    #[error("Storefront error: {0}")]
    Storefront(#[from] StorefrontError),
}

/// Register a new account and sign in.
pub async fn register(
    shop: &Shopfront,
    email: &str,
    password: &str,
    first_name: Option<String>,
    last_name: Option<String>,
) -> Result<(), StorefrontError> {
    let outcome = shop.register(email, password, first_name, last_name).await?;
    tracing::info!("Account created");
    report_outcome(&outcome);
    Ok(())
}

/// Sign in with email and password.
pub async fn login(shop: &Shopfront, email: &str, password: &str) -> Result<(), StorefrontError> {
    let outcome = shop.login(email, password).await?;
    report_outcome(&outcome);
    Ok(())
}

/// Sign out. The account cart stays on the server for next time.
pub async fn logout(shop: &Shopfront) -> Result<(), StorefrontError> {
    shop.logout().await?;
    tracing::info!("Signed out");
    Ok(())
}

/// Show the signed-in customer.
pub async fn whoami(shop: &Shopfront) -> Result<(), StorefrontError> {
    let Some(session) = shop.auth().current_session().await else {
        tracing::info!("Not signed in");
        return Ok(());
    };
    let profile = shop.auth().profile().await?;
    tracing::info!(
        "Signed in as {} ({})",
        profile.full_name(),
        session.customer_id
    );
    if let Some(email) = &profile.email {
        tracing::info!("  Email: {}", email.as_str());
    }
    if let Some(phone) = &profile.phone {
        tracing::info!("  Phone: {}", phone.as_str());
    }
    tracing::info!("  Method: {:?}", session.auth_method);
    Ok(())
}

/// Send a one-time code to a phone number.
pub async fn request_phone_code(shop: &Shopfront, number: &str) -> Result<(), StorefrontError> {
    let challenge_id = shop.auth().request_phone_code(number).await?;
    tracing::info!("Code sent to {number} (challenge {challenge_id})");
    tracing::info!("Redeem it with: auric auth phone-confirm {number} <code>");
    Ok(())
}

/// Redeem a received one-time code and sign in.
pub async fn confirm_phone_code(
    shop: &Shopfront,
    number: &str,
    code: &str,
) -> Result<(), StorefrontError> {
    let outcome = shop.confirm_phone_code(number, code).await?;
    report_outcome(&outcome);
    Ok(())
}

/// Send a sign-in link to an email address.
pub async fn request_email_link(shop: &Shopfront, email: &str) -> Result<(), StorefrontError> {
    shop.auth().request_email_link(email).await?;
    tracing::info!("Sign-in link sent to {email}");
    tracing::info!("Redeem it with: auric auth email-link-confirm <link>");
    Ok(())
}

/// Redeem a received sign-in link and sign in.
pub async fn confirm_email_link(
    shop: &Shopfront,
    link: &str,
    address: Option<&str>,
) -> Result<(), StorefrontError> {
    let outcome = shop.confirm_email_link(link, address).await?;
    report_outcome(&outcome);
    Ok(())
}

/// Print the Google sign-in URL with fresh state and nonce values.
pub fn google_url(config: &StorefrontConfig, redirect_uri: &str) -> Result<(), AuthCliError> {
    let client = CommerceClient::new(&config.api).map_err(StorefrontError::from)?;
    let state = random_token();
    let nonce = random_token();
    let url = client
        .google_authorization_url(redirect_uri, &state, &nonce)
        .ok_or(AuthCliError::GoogleNotConfigured)?;
    tracing::info!("Open this URL to sign in with Google:");
    tracing::info!("  {url}");
    tracing::info!("Expect state={state} on the callback, then run:");
    tracing::info!("  auric auth google-login <id-token>");
    Ok(())
}

/// Exchange a Google ID token for a session.
pub async fn google_login(shop: &Shopfront, id_token: &str) -> Result<(), StorefrontError> {
    let outcome = shop.login_with_google(id_token).await?;
    report_outcome(&outcome);
    Ok(())
}

fn report_outcome(outcome: &LoginOutcome) {
    tracing::info!(
        "Signed in as {} via {:?}",
        outcome.session.customer_id,
        outcome.session.auth_method
    );
    if let Some(error) = &outcome.cart_merge {
        tracing::warn!("Cart merge incomplete: {error}. Run `auric sync` to retry.");
    }
    if let Some(error) = &outcome.wishlist_merge {
        tracing::warn!("Wishlist merge incomplete: {error}. Run `auric sync` to retry.");
    }
}

fn random_token() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}
