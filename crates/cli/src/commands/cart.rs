//! Cart inspection and editing commands.
//!
//! # Usage
//!
//! ```bash
//! auric cart add ring-solitaire --variant gold-6 --price 1299.00 --quantity 2
//! auric cart update ring-solitaire --variant gold-6 --quantity 1
//! auric cart coupon-apply AURIC10
//! auric cart show
//! ```
//!
//! As a guest the cart lives on this device; once signed in, commands
//! go to the account cart on the server.

use rust_decimal::Decimal;
use thiserror::Error;

use auric_core::{CurrencyCode, ImageRef, Money, ProductId, VariantId};
use auric_storefront::StorefrontError;
use auric_storefront::models::{Cart, CartLine, LineKey};
use auric_storefront::Shopfront;

/// Errors that can occur during cart commands.
#[derive(Debug, Error)]
pub enum CartCliError {
    /// The price argument did not parse as a decimal amount.
    #[error("Invalid price '{0}': expected a decimal amount like 129.99")]
    InvalidPrice(String),

    /// The storefront rejected or failed the operation.
    #[error("Storefront error: {0}")]
    Storefront(#[from] StorefrontError),
}

/// Show the cart, its totals, and where it currently lives.
pub async fn show(shop: &Shopfront) -> Result<(), CartCliError> {
    let cart = shop.cart().cart().await.map_err(StorefrontError::from)?;
    print_cart(&cart);

    if !cart.is_empty() {
        let totals = shop.cart().totals().await.map_err(StorefrontError::from)?;
        if let Some(coupon) = shop.cart().applied_coupon().await {
            tracing::info!("  Coupon:    {} (-{})", coupon.code, totals.discount);
        }
        tracing::info!("  Subtotal:  {}", totals.final_subtotal);
        if totals.shipping.is_zero() {
            tracing::info!("  Shipping:  free");
        } else {
            tracing::info!("  Shipping:  {}", totals.shipping);
        }
        tracing::info!("  Total:     {}", totals.grand_total);
    }

    let status = shop.cart().status();
    tracing::info!("Mode: {:?}", status.authority);
    Ok(())
}

/// Add an item to the cart, or increase its quantity if present.
#[allow(clippy::too_many_arguments)]
pub async fn add(
    shop: &Shopfront,
    currency: CurrencyCode,
    product: &str,
    variant: Option<String>,
    name: Option<String>,
    price: &str,
    quantity: u32,
    image: Option<String>,
) -> Result<(), CartCliError> {
    let unit_price = parse_price(price, currency)?;
    let line = CartLine {
        product_id: ProductId::new(product),
        variant_id: variant.map(VariantId::new),
        name: name.unwrap_or_else(|| product.to_owned()),
        unit_price,
        quantity,
        image: image.map(ImageRef::from),
    };

    let cart = shop.cart().add_item(line).await.map_err(StorefrontError::from)?;
    tracing::info!("Added {quantity} x {product}");
    print_cart(&cart);
    Ok(())
}

/// Set an item's quantity.
pub async fn update(
    shop: &Shopfront,
    product: &str,
    variant: Option<String>,
    quantity: u32,
) -> Result<(), CartCliError> {
    let key = LineKey::new(product, variant.map(VariantId::new));
    let cart = shop
        .cart()
        .update_quantity(&key, quantity)
        .await
        .map_err(StorefrontError::from)?;
    tracing::info!("Updated {key} to quantity {quantity}");
    print_cart(&cart);
    Ok(())
}

/// Remove an item.
pub async fn remove(
    shop: &Shopfront,
    product: &str,
    variant: Option<String>,
) -> Result<(), CartCliError> {
    let key = LineKey::new(product, variant.map(VariantId::new));
    let cart = shop
        .cart()
        .remove_item(&key)
        .await
        .map_err(StorefrontError::from)?;
    tracing::info!("Removed {key}");
    print_cart(&cart);
    Ok(())
}

/// Remove every item.
pub async fn clear(shop: &Shopfront) -> Result<(), CartCliError> {
    shop.cart().clear().await.map_err(StorefrontError::from)?;
    tracing::info!("Cart cleared");
    Ok(())
}

/// Apply a coupon code and show the repriced totals.
pub async fn apply_coupon(shop: &Shopfront, code: &str) -> Result<(), CartCliError> {
    let totals = shop
        .cart()
        .apply_coupon(code)
        .await
        .map_err(StorefrontError::from)?;
    tracing::info!("Coupon {code} applied: -{}", totals.discount);
    tracing::info!("  Subtotal:  {}", totals.final_subtotal);
    tracing::info!("  Total:     {}", totals.grand_total);
    Ok(())
}

/// Drop the applied coupon.
pub async fn clear_coupon(shop: &Shopfront) -> Result<(), CartCliError> {
    shop.cart().clear_coupon().await;
    tracing::info!("Coupon removed");
    Ok(())
}

fn parse_price(price: &str, currency: CurrencyCode) -> Result<Money, CartCliError> {
    let amount = price
        .parse::<Decimal>()
        .map_err(|_| CartCliError::InvalidPrice(price.to_owned()))?;
    Ok(Money::new(amount, currency))
}

fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        tracing::info!("Cart is empty");
        return;
    }
    tracing::info!(
        "Cart: {} lines, {} items",
        cart.line_count(),
        cart.total_quantity()
    );
    for line in &cart.lines {
        tracing::info!(
            "  {} x{} @ {} = {}",
            line.key(),
            line.quantity,
            line.unit_price,
            line.line_total()
        );
    }
}
