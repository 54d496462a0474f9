//! Wishlist inspection and editing commands.
//!
//! # Usage
//!
//! ```bash
//! auric wishlist add pendant-orbit --price 459.00 --note "anniversary"
//! auric wishlist show
//! auric wishlist move pendant-orbit --quantity 1
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

use auric_core::{CurrencyCode, ImageRef, Money, ProductId, VariantId};
use auric_storefront::StorefrontError;
use auric_storefront::models::{LineKey, Wishlist, WishlistItem};
use auric_storefront::Shopfront;

/// Errors that can occur during wishlist commands.
#[derive(Debug, Error)]
pub enum WishlistCliError {
    /// The price argument did not parse as a decimal amount.
    #[error("Invalid price '{0}': expected a decimal amount like 129.99")]
    InvalidPrice(String),

    /// The storefront rejected or failed the operation.
    #[error("Storefront error: {0}")]
    Storefront(#[from] StorefrontError),
}

/// Show the saved items.
pub async fn show(shop: &Shopfront) -> Result<(), WishlistCliError> {
    let wishlist = shop
        .wishlist()
        .wishlist()
        .await
        .map_err(StorefrontError::from)?;
    print_wishlist(&wishlist);

    let status = shop.wishlist().status();
    tracing::info!("Mode: {:?}", status.authority);
    Ok(())
}

/// Save an item for later. Already-saved items are left as they are.
#[allow(clippy::too_many_arguments)]
pub async fn add(
    shop: &Shopfront,
    currency: CurrencyCode,
    product: &str,
    variant: Option<String>,
    name: Option<String>,
    price: &str,
    note: Option<String>,
    image: Option<String>,
) -> Result<(), WishlistCliError> {
    let amount = price
        .parse::<Decimal>()
        .map_err(|_| WishlistCliError::InvalidPrice(price.to_owned()))?;
    let item = WishlistItem {
        product_id: ProductId::new(product),
        variant_id: variant.map(VariantId::new),
        name: name.unwrap_or_else(|| product.to_owned()),
        price: Money::new(amount, currency),
        image: image.map(ImageRef::from),
        note,
    };

    let wishlist = shop
        .wishlist()
        .add_item(item)
        .await
        .map_err(StorefrontError::from)?;
    tracing::info!("Saved {product}");
    print_wishlist(&wishlist);
    Ok(())
}

/// Remove a saved item.
pub async fn remove(
    shop: &Shopfront,
    product: &str,
    variant: Option<String>,
) -> Result<(), WishlistCliError> {
    let key = LineKey::new(product, variant.map(VariantId::new));
    let wishlist = shop
        .wishlist()
        .remove_item(&key)
        .await
        .map_err(StorefrontError::from)?;
    tracing::info!("Removed {key}");
    print_wishlist(&wishlist);
    Ok(())
}

/// Remove every saved item.
pub async fn clear(shop: &Shopfront) -> Result<(), WishlistCliError> {
    shop
        .wishlist()
        .clear()
        .await
        .map_err(StorefrontError::from)?;
    tracing::info!("Wishlist cleared");
    Ok(())
}

/// Move a saved item into the cart.
///
/// If the cart accepts the item but the wishlist removal fails, the
/// item is reported in both places rather than lost.
pub async fn move_to_cart(
    shop: &Shopfront,
    product: &str,
    variant: Option<String>,
    quantity: u32,
) -> Result<(), WishlistCliError> {
    let key = LineKey::new(product, variant.map(VariantId::new));
    let wishlist = shop.move_to_cart(&key, quantity).await?;
    tracing::info!("Moved {key} to the cart");
    print_wishlist(&wishlist);
    Ok(())
}

fn print_wishlist(wishlist: &Wishlist) {
    if wishlist.is_empty() {
        tracing::info!("Wishlist is empty");
        return;
    }
    tracing::info!("Wishlist: {} items", wishlist.len());
    for item in &wishlist.items {
        match &item.note {
            Some(note) => tracing::info!("  {} @ {} ({note})", item.key(), item.price),
            None => tracing::info!("  {} @ {}", item.key(), item.price),
        }
    }
}
