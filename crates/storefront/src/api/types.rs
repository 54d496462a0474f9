//! Wire types for the commerce API.
//!
//! Remote shapes are kept separate from the domain models so server
//! payload quirks (camelCase fields, the dual image shape, string
//! decimals) are absorbed here and nowhere else.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use auric_core::{CurrencyCode, CustomerId, Email, ImageRef, Money, ProductId, VariantId};

use crate::models::{Cart, CartLine, CustomerProfile, Wishlist, WishlistItem};

use super::ApiError;

// ============================================================================
// Envelope
// ============================================================================

/// The uniform response envelope every endpoint answers with.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Whether the request succeeded.
    pub success: bool,
    /// Payload, present on success.
    pub data: Option<T>,
    /// Error details, present on failure.
    pub error: Option<ApiErrorBody>,
}

/// Error details inside a failed envelope.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable diagnostic.
    pub message: String,
}

// ============================================================================
// Money and carts
// ============================================================================

/// Monetary amount as the API serializes it.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WireMoney {
    /// Decimal amount, transported as a string.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: CurrencyCode,
}

impl From<WireMoney> for Money {
    fn from(wire: WireMoney) -> Self {
        Self::new(wire.amount, wire.currency)
    }
}

/// A cart line as the API serializes it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCartItem {
    /// Product identifier.
    pub product_id: ProductId,
    /// Variant identifier, if the product has variants.
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    /// Display name.
    pub name: String,
    /// Catalog unit price.
    pub price: WireMoney,
    /// Units of this line.
    pub quantity: u32,
    /// Product image, as either a bare URL or an object.
    #[serde(default)]
    pub image: Option<ImageRef>,
}

impl From<RemoteCartItem> for CartLine {
    fn from(item: RemoteCartItem) -> Self {
        Self {
            product_id: item.product_id,
            variant_id: item.variant_id,
            name: item.name,
            unit_price: item.price.into(),
            quantity: item.quantity,
            // Collapse the dual wire shape here so downstream code and
            // storage only ever see the URL form.
            image: item.image.map(|image| ImageRef::from(image.into_url())),
        }
    }
}

/// A cart as the API serializes it.
#[derive(Debug, Deserialize)]
pub struct RemoteCart {
    /// The cart lines, in server order.
    pub items: Vec<RemoteCartItem>,
}

impl From<RemoteCart> for Cart {
    fn from(cart: RemoteCart) -> Self {
        Self {
            lines: cart.items.into_iter().map(CartLine::from).collect(),
        }
    }
}

/// Body for adding a cart line. The server prices the line itself, so
/// no price is sent.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemInput {
    /// Product identifier.
    pub product_id: ProductId,
    /// Variant identifier, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    /// Units to add.
    pub quantity: u32,
}

impl From<&CartLine> for CartItemInput {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            variant_id: line.variant_id.clone(),
            quantity: line.quantity,
        }
    }
}

// ============================================================================
// Wishlists
// ============================================================================

/// A wishlist item as the API serializes it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteWishlistItem {
    /// Product identifier.
    pub product_id: ProductId,
    /// Variant identifier, if any.
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    /// Display name.
    pub name: String,
    /// Catalog price.
    pub price: WireMoney,
    /// Product image, as either a bare URL or an object.
    #[serde(default)]
    pub image: Option<ImageRef>,
    /// Shopper note.
    #[serde(default)]
    pub note: Option<String>,
}

impl From<RemoteWishlistItem> for WishlistItem {
    fn from(item: RemoteWishlistItem) -> Self {
        Self {
            product_id: item.product_id,
            variant_id: item.variant_id,
            name: item.name,
            price: item.price.into(),
            image: item.image.map(|image| ImageRef::from(image.into_url())),
            note: item.note,
        }
    }
}

/// A wishlist as the API serializes it.
#[derive(Debug, Deserialize)]
pub struct RemoteWishlist {
    /// The saved items, in server order.
    pub items: Vec<RemoteWishlistItem>,
}

impl From<RemoteWishlist> for Wishlist {
    fn from(wishlist: RemoteWishlist) -> Self {
        Self {
            items: wishlist.items.into_iter().map(WishlistItem::from).collect(),
        }
    }
}

/// Body for saving a wishlist item.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItemInput {
    /// Product identifier.
    pub product_id: ProductId,
    /// Variant identifier, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    /// Shopper note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl From<&WishlistItem> for WishlistItemInput {
    fn from(item: &WishlistItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            variant_id: item.variant_id.clone(),
            note: item.note.clone(),
        }
    }
}

// ============================================================================
// Auth
// ============================================================================

/// Registration request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    /// Email address for the new account.
    pub email: Email,
    /// Chosen password.
    pub password: String,
    /// Given name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Tokens issued by any successful authentication flow.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    /// The authenticated customer.
    pub customer_id: CustomerId,
    /// Bearer token for API calls.
    pub access_token: String,
    /// Refresh token, when the backend issues one.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds, if bounded.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Customer profile as the API serializes it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireProfile {
    /// Customer identifier.
    pub id: CustomerId,
    /// Email address on file.
    #[serde(default)]
    pub email: Option<String>,
    /// Phone number on file.
    #[serde(default)]
    pub phone: Option<String>,
    /// Given name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Marketing consent flag.
    #[serde(default)]
    pub accepts_marketing: bool,
}

impl TryFrom<WireProfile> for CustomerProfile {
    type Error = ApiError;

    fn try_from(wire: WireProfile) -> Result<Self, Self::Error> {
        let email = wire
            .email
            .map(|raw| {
                Email::parse(&raw)
                    .map_err(|error| ApiError::Decode(format!("invalid profile email: {error}")))
            })
            .transpose()?;
        let phone = wire
            .phone
            .map(|raw| {
                auric_core::PhoneNumber::parse(&raw)
                    .map_err(|error| ApiError::Decode(format!("invalid profile phone: {error}")))
            })
            .transpose()?;
        Ok(Self {
            id: wire.id,
            email,
            phone,
            first_name: wire.first_name,
            last_name: wire.last_name,
            accepts_marketing: wire.accepts_marketing,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_cart_accepts_both_image_shapes() {
        let json = r#"{
            "items": [
                {
                    "productId": "ring-gold",
                    "name": "Gold Ring",
                    "price": {"amount": "120.00", "currency": "USD"},
                    "quantity": 1,
                    "image": "https://cdn.example.com/ring.jpg"
                },
                {
                    "productId": "necklace-pearl",
                    "variantId": "18-inch",
                    "name": "Pearl Necklace",
                    "price": {"amount": "340.00", "currency": "USD"},
                    "quantity": 2,
                    "image": {"url": "https://cdn.example.com/necklace.jpg"}
                }
            ]
        }"#;
        let cart: Cart = serde_json::from_str::<RemoteCart>(json).unwrap().into();
        assert_eq!(cart.lines.len(), 2);
        let urls: Vec<_> = cart
            .lines
            .iter()
            .map(|line| line.image.as_ref().map(ImageRef::url))
            .collect();
        assert_eq!(
            urls,
            [
                Some("https://cdn.example.com/ring.jpg"),
                Some("https://cdn.example.com/necklace.jpg")
            ]
        );
        // Both shapes collapse to the literal form.
        assert!(cart
            .lines
            .iter()
            .all(|line| matches!(line.image, Some(ImageRef::Literal(_)))));
    }

    #[test]
    fn test_envelope_error_shape() {
        let json = r#"{"success": false, "error": {"code": "not-found", "message": "no such item"}}"#;
        let envelope: ApiEnvelope<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.error.unwrap().code, "not-found");
    }

    #[test]
    fn test_token_grant_camel_case() {
        let json = r#"{
            "customerId": "cust_42",
            "accessToken": "at",
            "refreshToken": "rt",
            "expiresIn": 3600
        }"#;
        let grant: TokenGrant = serde_json::from_str(json).unwrap();
        assert_eq!(grant.customer_id.as_str(), "cust_42");
        assert_eq!(grant.refresh_token.as_deref(), Some("rt"));
        assert_eq!(grant.expires_in, Some(3600));
    }

    #[test]
    fn test_cart_item_input_omits_missing_variant() {
        let input = CartItemInput {
            product_id: ProductId::new("ring-gold"),
            variant_id: None,
            quantity: 2,
        };
        let json = serde_json::to_string(&input).unwrap();
        assert_eq!(json, r#"{"productId":"ring-gold","quantity":2}"#);
    }

    #[test]
    fn test_profile_with_invalid_email_is_a_decode_error() {
        let wire = WireProfile {
            id: CustomerId::new("cust_1"),
            email: Some("not-an-email".to_owned()),
            phone: None,
            first_name: None,
            last_name: None,
            accepts_marketing: false,
        };
        let result = CustomerProfile::try_from(wire);
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }
}
