//! Cart endpoints.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use tracing::instrument;

use crate::models::{Cart, LineKey};

use super::types::{CartItemInput, RemoteCart};
use super::{ApiError, CartGateway, CommerceClient, decode_response};

/// Path addressing one cart line by its key.
fn item_path(key: &LineKey) -> String {
    let mut path = format!(
        "/v1/cart/items/{}",
        urlencoding::encode(key.product_id.as_str())
    );
    if let Some(variant) = &key.variant_id {
        path.push_str("?variant=");
        path.push_str(&urlencoding::encode(variant.as_str()));
    }
    path
}

#[async_trait]
impl CartGateway for CommerceClient {
    #[instrument(skip(self, access_token))]
    async fn fetch_cart(&self, access_token: &str) -> Result<Cart, ApiError> {
        let response = self
            .authed_request(Method::GET, "/v1/cart", access_token)
            .send()
            .await?;
        decode_response::<RemoteCart>(response)
            .await
            .map(Cart::from)
    }

    #[instrument(skip(self, access_token))]
    async fn add_item(&self, access_token: &str, item: &CartItemInput) -> Result<Cart, ApiError> {
        let response = self
            .authed_request(Method::POST, "/v1/cart/items", access_token)
            .json(item)
            .send()
            .await?;
        decode_response::<RemoteCart>(response)
            .await
            .map(Cart::from)
    }

    #[instrument(skip(self, access_token))]
    async fn update_item(
        &self,
        access_token: &str,
        key: &LineKey,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        let response = self
            .authed_request(Method::PATCH, &item_path(key), access_token)
            .json(&json!({ "quantity": quantity }))
            .send()
            .await?;
        decode_response::<RemoteCart>(response)
            .await
            .map(Cart::from)
    }

    #[instrument(skip(self, access_token))]
    async fn remove_item(&self, access_token: &str, key: &LineKey) -> Result<Cart, ApiError> {
        let response = self
            .authed_request(Method::DELETE, &item_path(key), access_token)
            .send()
            .await?;
        decode_response::<RemoteCart>(response)
            .await
            .map(Cart::from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use auric_core::VariantId;

    use super::*;

    #[test]
    fn test_item_path_without_variant() {
        assert_eq!(
            item_path(&LineKey::new("ring-gold", None)),
            "/v1/cart/items/ring-gold"
        );
    }

    #[test]
    fn test_item_path_encodes_variant() {
        assert_eq!(
            item_path(&LineKey::new("ring-gold", Some(VariantId::new("size 7")))),
            "/v1/cart/items/ring-gold?variant=size%207"
        );
    }
}
