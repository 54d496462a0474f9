//! Authentication and account endpoints.

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use auric_core::{Email, PhoneNumber};

use crate::models::{CustomerProfile, ProfileUpdate};

use super::types::{RegisterInput, TokenGrant, WireProfile};
use super::{ApiError, AuthBackend, CommerceClient, decode_empty_response, decode_response};

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a Email,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProviderTokenBody<'a> {
    provider: &'a str,
    id_token: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PhoneCodeBody<'a> {
    phone: &'a PhoneNumber,
    bot_check_token: &'a str,
}

#[derive(Serialize)]
struct PhoneVerifyBody<'a> {
    phone: &'a PhoneNumber,
    code: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailLinkBody<'a> {
    email: &'a Email,
    continue_url: &'a str,
}

#[derive(Serialize)]
struct EmailVerifyBody<'a> {
    email: &'a Email,
    link: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
struct PasswordResetBody<'a> {
    email: &'a Email,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResetConfirmBody<'a> {
    code: &'a str,
    new_password: &'a str,
}

#[async_trait]
impl AuthBackend for CommerceClient {
    #[instrument(skip(self, input), fields(email = %input.email))]
    async fn register(&self, input: &RegisterInput) -> Result<TokenGrant, ApiError> {
        let response = self
            .request(Method::POST, "/v1/auth/register")
            .json(input)
            .send()
            .await?;
        decode_response(response).await
    }

    #[instrument(skip(self, password))]
    async fn login_password(&self, email: &Email, password: &str) -> Result<TokenGrant, ApiError> {
        let response = self
            .request(Method::POST, "/v1/auth/login")
            .json(&LoginBody { email, password })
            .send()
            .await?;
        decode_response(response).await
    }

    #[instrument(skip(self, id_token))]
    async fn verify_provider_token(
        &self,
        provider: &str,
        id_token: &str,
    ) -> Result<TokenGrant, ApiError> {
        let response = self
            .request(Method::POST, "/v1/auth/provider")
            .json(&ProviderTokenBody { provider, id_token })
            .send()
            .await?;
        decode_response(response).await
    }

    #[instrument(skip(self, bot_check_token))]
    async fn send_phone_code(
        &self,
        phone: &PhoneNumber,
        bot_check_token: &str,
    ) -> Result<(), ApiError> {
        let response = self
            .request(Method::POST, "/v1/auth/phone/send")
            .json(&PhoneCodeBody {
                phone,
                bot_check_token,
            })
            .send()
            .await?;
        decode_empty_response(response).await
    }

    #[instrument(skip(self, code))]
    async fn verify_phone_code(
        &self,
        phone: &PhoneNumber,
        code: &str,
    ) -> Result<TokenGrant, ApiError> {
        let response = self
            .request(Method::POST, "/v1/auth/phone/verify")
            .json(&PhoneVerifyBody { phone, code })
            .send()
            .await?;
        decode_response(response).await
    }

    #[instrument(skip(self))]
    async fn send_email_link(&self, email: &Email, continue_url: &str) -> Result<(), ApiError> {
        let response = self
            .request(Method::POST, "/v1/auth/email-link/send")
            .json(&EmailLinkBody { email, continue_url })
            .send()
            .await?;
        decode_empty_response(response).await
    }

    #[instrument(skip(self, link))]
    async fn verify_email_link(&self, email: &Email, link: &str) -> Result<TokenGrant, ApiError> {
        let response = self
            .request(Method::POST, "/v1/auth/email-link/verify")
            .json(&EmailVerifyBody { email, link })
            .send()
            .await?;
        decode_response(response).await
    }

    #[instrument(skip(self, refresh_token))]
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, ApiError> {
        let response = self
            .request(Method::POST, "/v1/auth/refresh")
            .json(&RefreshBody { refresh_token })
            .send()
            .await?;
        decode_response(response).await
    }

    #[instrument(skip(self, access_token))]
    async fn revoke(&self, access_token: &str) -> Result<(), ApiError> {
        let response = self
            .authed_request(Method::POST, "/v1/auth/revoke", access_token)
            .send()
            .await?;
        decode_empty_response(response).await
    }

    #[instrument(skip(self, access_token))]
    async fn fetch_profile(&self, access_token: &str) -> Result<CustomerProfile, ApiError> {
        let response = self
            .authed_request(Method::GET, "/v1/account/profile", access_token)
            .send()
            .await?;
        let wire: WireProfile = decode_response(response).await?;
        wire.try_into()
    }

    #[instrument(skip(self, access_token, update))]
    async fn update_profile(
        &self,
        access_token: &str,
        update: &ProfileUpdate,
    ) -> Result<CustomerProfile, ApiError> {
        let response = self
            .authed_request(Method::PATCH, "/v1/account/profile", access_token)
            .json(update)
            .send()
            .await?;
        let wire: WireProfile = decode_response(response).await?;
        wire.try_into()
    }

    #[instrument(skip(self))]
    async fn request_password_reset(&self, email: &Email) -> Result<(), ApiError> {
        let response = self
            .request(Method::POST, "/v1/auth/password-reset/send")
            .json(&PasswordResetBody { email })
            .send()
            .await?;
        decode_empty_response(response).await
    }

    #[instrument(skip(self, code, new_password))]
    async fn confirm_password_reset(
        &self,
        code: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let response = self
            .request(Method::POST, "/v1/auth/password-reset/confirm")
            .json(&PasswordResetConfirmBody { code, new_password })
            .send()
            .await?;
        decode_empty_response(response).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_request_bodies_use_camel_case() {
        let body = ProviderTokenBody {
            provider: "google",
            id_token: "tok",
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"provider":"google","idToken":"tok"}"#
        );

        let body = RefreshBody {
            refresh_token: "rt",
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"refreshToken":"rt"}"#
        );
    }

    #[test]
    fn test_phone_body_serializes_normalized_number() {
        let phone = PhoneNumber::parse("+1 (415) 555-0123").unwrap();
        let body = PhoneCodeBody {
            phone: &phone,
            bot_check_token: "bct",
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"phone":"+14155550123","botCheckToken":"bct"}"#
        );
    }
}
