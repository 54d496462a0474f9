//! Wishlist endpoints.

use async_trait::async_trait;
use reqwest::Method;
use tracing::instrument;

use crate::models::{LineKey, Wishlist};

use super::types::{RemoteWishlist, WishlistItemInput};
use super::{ApiError, CommerceClient, WishlistGateway, decode_response};

/// Path addressing one saved item by its key.
fn item_path(key: &LineKey) -> String {
    let mut path = format!(
        "/v1/wishlist/items/{}",
        urlencoding::encode(key.product_id.as_str())
    );
    if let Some(variant) = &key.variant_id {
        path.push_str("?variant=");
        path.push_str(&urlencoding::encode(variant.as_str()));
    }
    path
}

#[async_trait]
impl WishlistGateway for CommerceClient {
    #[instrument(skip(self, access_token))]
    async fn fetch_wishlist(&self, access_token: &str) -> Result<Wishlist, ApiError> {
        let response = self
            .authed_request(Method::GET, "/v1/wishlist", access_token)
            .send()
            .await?;
        decode_response::<RemoteWishlist>(response)
            .await
            .map(Wishlist::from)
    }

    #[instrument(skip(self, access_token))]
    async fn add_item(
        &self,
        access_token: &str,
        item: &WishlistItemInput,
    ) -> Result<Wishlist, ApiError> {
        let response = self
            .authed_request(Method::POST, "/v1/wishlist/items", access_token)
            .json(item)
            .send()
            .await?;
        decode_response::<RemoteWishlist>(response)
            .await
            .map(Wishlist::from)
    }

    #[instrument(skip(self, access_token))]
    async fn remove_item(&self, access_token: &str, key: &LineKey) -> Result<Wishlist, ApiError> {
        let response = self
            .authed_request(Method::DELETE, &item_path(key), access_token)
            .send()
            .await?;
        decode_response::<RemoteWishlist>(response)
            .await
            .map(Wishlist::from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use auric_core::VariantId;

    use super::*;

    #[test]
    fn test_item_path_shapes() {
        assert_eq!(
            item_path(&LineKey::new("bracelet-silver", None)),
            "/v1/wishlist/items/bracelet-silver"
        );
        assert_eq!(
            item_path(&LineKey::new("ring-gold", Some(VariantId::new("size-7")))),
            "/v1/wishlist/items/ring-gold?variant=size-7"
        );
    }
}
