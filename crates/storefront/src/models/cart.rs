//! Cart domain types.
//!
//! A [`Cart`] is an ordered sequence of [`CartLine`]s, unique by
//! (product, variant). Whether the cart lives in local storage (guest) or
//! mirrors the remote cart (authenticated) is the reconciliation engine's
//! concern; these types carry no authority themselves.

use core::fmt;

use serde::{Deserialize, Serialize};

use auric_core::{ImageRef, Money, ProductId, VariantId};

/// Identity of a cart or wishlist line: product plus optional variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineKey {
    /// The product this line refers to.
    pub product_id: ProductId,
    /// The specific variant, if the product has variants.
    pub variant_id: Option<VariantId>,
}

impl LineKey {
    /// Create a new line key.
    pub fn new(product_id: impl Into<ProductId>, variant_id: Option<VariantId>) -> Self {
        Self {
            product_id: product_id.into(),
            variant_id,
        }
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variant_id {
            Some(variant) => write!(f, "{}/{variant}", self.product_id),
            None => write!(f, "{}", self.product_id),
        }
    }
}

/// One line in a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// The product this line refers to.
    pub product_id: ProductId,
    /// The specific variant, if any.
    pub variant_id: Option<VariantId>,
    /// Display name of the product.
    pub name: String,
    /// Price per unit. For guest lines this is a display hint; the remote
    /// catalog price replaces it once the line reaches the server.
    pub unit_price: Money,
    /// Number of units. Always at least 1.
    pub quantity: u32,
    /// Product image, if known.
    pub image: Option<ImageRef>,
}

impl CartLine {
    /// The identity key for this line.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey {
            product_id: self.product_id.clone(),
            variant_id: self.variant_id.clone(),
        }
    }

    /// The line total, always recomputed from unit price and quantity.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// A shopping cart: ordered lines, unique by [`LineKey`].
///
/// Line order is insertion order and doubles as display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    /// The lines in the cart, in insertion order.
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Find a line by key.
    #[must_use]
    pub fn find(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.key() == *key)
    }

    /// Find a line by key, mutably.
    pub fn find_mut(&mut self, key: &LineKey) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| line.key() == *key)
    }

    /// Whether a line with this key exists.
    #[must_use]
    pub fn contains(&self, key: &LineKey) -> bool {
        self.find(key).is_some()
    }
}
