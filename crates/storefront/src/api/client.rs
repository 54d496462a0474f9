//! HTTP client for the commerce API.

use std::sync::Arc;

use secrecy::ExposeSecret;

use crate::config::ApiConfig;

/// Shared client for all commerce API calls.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

#[derive(Debug)]
struct CommerceClientInner {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    google_client_id: Option<String>,
}

impl CommerceClient {
    /// Build a client from configuration.
    ///
    /// The configured timeout applies to every request; a request that
    /// exceeds it fails as a network error.
    pub fn new(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self {
            inner: Arc::new(CommerceClientInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_owned(),
                api_key: config.api_key.expose_secret().to_owned(),
                google_client_id: config.google_client_id.clone(),
            }),
        })
    }

    /// Absolute URL for an API path.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Start a request with the store API key attached.
    pub(crate) fn request(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> reqwest::RequestBuilder {
        self.inner
            .client
            .request(method, self.url(path))
            .header("X-Api-Key", &self.inner.api_key)
    }

    /// Start a request authenticated as a customer.
    pub(crate) fn authed_request(
        &self,
        method: reqwest::Method,
        path: &str,
        access_token: &str,
    ) -> reqwest::RequestBuilder {
        self.request(method, path).bearer_auth(access_token)
    }

    /// Build the Google OAuth authorization URL for browser sign-in.
    ///
    /// Returns `None` when no Google client ID is configured. The
    /// resulting `code`/`id_token` comes back through
    /// [`AuthBackend::verify_provider_token`](super::AuthBackend::verify_provider_token).
    #[must_use]
    pub fn google_authorization_url(
        &self,
        redirect_uri: &str,
        state: &str,
        nonce: &str,
    ) -> Option<String> {
        let client_id = self.inner.google_client_id.as_deref()?;
        Some(format!(
            "https://accounts.google.com/o/oauth2/v2/auth\
             ?client_id={}\
             &redirect_uri={}\
             &response_type=code\
             &scope=openid%20email%20profile\
             &state={}\
             &nonce={}",
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state),
            urlencoding::encode(nonce),
        ))
    }
}
