//! Checkout pricing.
//!
//! [`compute_totals`] is a pure function over a cart snapshot: no I/O,
//! no clock, no hidden state. Anything that varies (coupon rate,
//! shipping rules) comes in as an argument, which is what makes the
//! totals pipeline testable in isolation.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;

use auric_core::{CurrencyCode, Money, MoneyError};

use crate::models::Cart;

/// Shipping and currency rules for a storefront.
#[derive(Debug, Clone, Copy)]
pub struct PricingRules {
    /// Currency all lines must be priced in.
    pub currency: CurrencyCode,
    /// Orders strictly above this amount ship free.
    pub free_shipping_threshold: Decimal,
    /// Flat fee charged below the threshold.
    pub flat_shipping_fee: Decimal,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            currency: CurrencyCode::USD,
            free_shipping_threshold: Decimal::new(5000, 0),
            flat_shipping_fee: Decimal::new(99, 0),
        }
    }
}

/// The fully derived totals for one cart state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricingSnapshot {
    /// Sum of all line totals before any discount.
    pub subtotal: Money,
    /// Amount removed by the applied coupon.
    pub discount: Money,
    /// Subtotal after discount.
    pub final_subtotal: Money,
    /// Shipping charge.
    pub shipping: Money,
    /// What the customer pays.
    pub grand_total: Money,
}

/// Derive totals for a cart.
///
/// The discount is `subtotal * coupon_rate`, rounded to cents and
/// clamped to `0..=subtotal`. Shipping is free for empty carts and for
/// discounted subtotals strictly above the threshold; an order landing
/// exactly on the threshold still pays the flat fee.
///
/// Fails only if line currencies disagree with the configured currency.
pub fn compute_totals(
    cart: &Cart,
    coupon_rate: Decimal,
    rules: &PricingRules,
) -> Result<PricingSnapshot, MoneyError> {
    let mut subtotal = Money::zero(rules.currency);
    for line in &cart.lines {
        subtotal = subtotal.checked_add(line.line_total())?;
    }

    let raw_discount = subtotal.scale(coupon_rate).rounded();
    let discount = if raw_discount.amount < Decimal::ZERO {
        Money::zero(rules.currency)
    } else if raw_discount.amount > subtotal.amount {
        subtotal
    } else {
        raw_discount
    };
    let final_subtotal = subtotal.checked_sub(discount)?;

    let free_shipping =
        final_subtotal.is_zero() || final_subtotal.amount > rules.free_shipping_threshold;
    let shipping = if free_shipping {
        Money::zero(rules.currency)
    } else {
        Money::new(rules.flat_shipping_fee, rules.currency)
    };
    let grand_total = final_subtotal.checked_add(shipping)?;

    Ok(PricingSnapshot {
        subtotal,
        discount,
        final_subtotal,
        shipping,
        grand_total,
    })
}

/// Resolves a coupon code to its discount rate.
#[async_trait]
pub trait CouponLookup: Send + Sync {
    /// The rate for `code`, or `None` if the code is not recognized.
    async fn resolve(&self, code: &str) -> Option<Decimal>;
}

/// A lookup backed by a single configured code.
#[derive(Debug, Clone)]
pub struct StaticCouponCodes {
    code: String,
    rate: Decimal,
}

impl StaticCouponCodes {
    /// A lookup recognizing exactly `code` at `rate`.
    #[must_use]
    pub fn new(code: impl Into<String>, rate: Decimal) -> Self {
        Self {
            code: code.into(),
            rate,
        }
    }
}

impl Default for StaticCouponCodes {
    fn default() -> Self {
        Self::new("AURIC10", Decimal::new(10, 2))
    }
}

#[async_trait]
impl CouponLookup for StaticCouponCodes {
    async fn resolve(&self, code: &str) -> Option<Decimal> {
        code.trim()
            .eq_ignore_ascii_case(&self.code)
            .then_some(self.rate)
    }
}
