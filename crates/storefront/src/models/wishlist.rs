//! Wishlist domain types.
//!
//! Wishlist items are unit entries (no quantity), unique by the same
//! (product, variant) key as cart lines.

use serde::{Deserialize, Serialize};

use auric_core::{ImageRef, Money, ProductId, VariantId};

use super::cart::LineKey;

/// One saved item in a wishlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistItem {
    /// The product this item refers to.
    pub product_id: ProductId,
    /// The specific variant, if any.
    pub variant_id: Option<VariantId>,
    /// Display name of the product.
    pub name: String,
    /// Display price. A hint for guest items, the catalog price for remote.
    pub price: Money,
    /// Product image, if known.
    pub image: Option<ImageRef>,
    /// Shopper note attached to the item.
    pub note: Option<String>,
}

impl WishlistItem {
    /// The identity key for this item.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey {
            product_id: self.product_id.clone(),
            variant_id: self.variant_id.clone(),
        }
    }
}

/// A wishlist: ordered items, unique by [`LineKey`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wishlist {
    /// The saved items, in insertion order.
    pub items: Vec<WishlistItem>,
}

impl Wishlist {
    /// An empty wishlist.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Whether the wishlist has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of saved items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Find an item by key.
    #[must_use]
    pub fn find(&self, key: &LineKey) -> Option<&WishlistItem> {
        self.items.iter().find(|item| item.key() == *key)
    }

    /// Whether an item with this key exists.
    #[must_use]
    pub fn contains(&self, key: &LineKey) -> bool {
        self.find(key).is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use auric_core::CurrencyCode;

    use super::*;

    fn item(product: &str) -> WishlistItem {
        WishlistItem {
            product_id: ProductId::new(product),
            variant_id: None,
            name: product.to_owned(),
            price: Money::from_major(900, CurrencyCode::USD),
            image: None,
            note: None,
        }
    }

    #[test]
    fn test_find_by_key() {
        let wishlist = Wishlist {
            items: vec![item("bracelet-silver")],
        };
        assert!(wishlist.contains(&LineKey::new("bracelet-silver", None)));
        assert!(!wishlist.contains(&LineKey::new("ring-gold", None)));
        assert_eq!(wishlist.len(), 1);
    }

    #[test]
    fn test_item_key_includes_variant() {
        let mut saved = item("ring-gold");
        saved.variant_id = Some(VariantId::new("size-7"));
        assert_eq!(
            saved.key(),
            LineKey::new("ring-gold", Some(VariantId::new("size-7")))
        );
    }
}
