//! Guest cart persistence.

use crate::models::{Cart, CartLine, LineKey};
use crate::storage::{Storage, StorageError, keys};

/// The device-local cart used while no customer is signed in.
///
/// Purely storage-backed: every mutation loads the cart, applies the
/// change, and writes it back. No network traffic ever originates here.
#[derive(Debug, Clone)]
pub struct LocalCartStore {
    storage: Storage,
}

impl LocalCartStore {
    /// Build a store over the given storage handle.
    #[must_use]
    pub const fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// The current cart. Read failures surface as an empty cart so
    /// display paths never crash on bad storage.
    #[must_use]
    pub fn get(&self) -> Cart {
        match self.storage.get_json(keys::GUEST_CART) {
            Ok(cart) => cart.unwrap_or_default(),
            Err(error) => {
                tracing::warn!(error = %error, "Failed to read guest cart");
                Cart::new()
            }
        }
    }

    /// Replace the stored cart wholesale.
    pub fn set(&self, cart: &Cart) -> Result<(), StorageError> {
        self.storage.set_json(keys::GUEST_CART, cart)
    }

    /// Add a line to the cart.
    ///
    /// If a line with the same key already exists its quantity is
    /// incremented; the incoming display fields are ignored so an
    /// earlier price hint is never silently replaced. Returns the
    /// updated cart.
    pub fn add_item(&self, line: CartLine) -> Result<Cart, StorageError> {
        let mut cart = self.get();
        match cart.find_mut(&line.key()) {
            Some(existing) => existing.quantity += line.quantity,
            None => cart.lines.push(line),
        }
        self.set(&cart)?;
        Ok(cart)
    }

    /// Set the quantity of an existing line.
    ///
    /// A quantity of zero and an unknown key are both no-ops here; the
    /// service layer decides whether those are errors.
    pub fn update_quantity(&self, key: &LineKey, quantity: u32) -> Result<Cart, StorageError> {
        let mut cart = self.get();
        if quantity == 0 {
            return Ok(cart);
        }
        let Some(line) = cart.find_mut(key) else {
            return Ok(cart);
        };
        line.quantity = quantity;
        self.set(&cart)?;
        Ok(cart)
    }

    /// Remove the line with the given key, if present.
    pub fn remove_item(&self, key: &LineKey) -> Result<Cart, StorageError> {
        let mut cart = self.get();
        let before = cart.lines.len();
        cart.lines.retain(|line| line.key() != *key);
        if cart.lines.len() != before {
            self.set(&cart)?;
        }
        Ok(cart)
    }

    /// Empty the cart.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(keys::GUEST_CART)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use auric_core::{CurrencyCode, Money, ProductId};

    use crate::storage::MemoryStorage;

    use super::*;

    fn store() -> LocalCartStore {
        LocalCartStore::new(Storage::in_memory())
    }

    fn line(product: &str, quantity: u32, unit_price: i64) -> CartLine {
        CartLine {
            product_id: ProductId::new(product),
            variant_id: None,
            name: product.to_owned(),
            unit_price: Money::from_major(unit_price, CurrencyCode::USD),
            quantity,
            image: None,
        }
    }

    #[test]
    fn test_add_then_get_persists() {
        let store = store();
        store.add_item(line("ring-gold", 2, 100)).unwrap();
        let cart = store.get();
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.lines.len(), 1);
    }

    #[test]
    fn test_duplicate_add_increments_quantity() {
        let store = store();
        store.add_item(line("ring-gold", 2, 100)).unwrap();
        let cart = store.add_item(line("ring-gold", 3, 100)).unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines.first().map(|l| l.quantity), Some(5));
    }

    #[test]
    fn test_duplicate_add_keeps_original_price_hint() {
        let store = store();
        store.add_item(line("ring-gold", 1, 100)).unwrap();
        let cart = store.add_item(line("ring-gold", 1, 250)).unwrap();
        assert_eq!(
            cart.lines.first().map(|l| l.unit_price),
            Some(Money::from_major(100, CurrencyCode::USD))
        );
    }

    #[test]
    fn test_insertion_order_preserved() {
        let store = store();
        store.add_item(line("a", 1, 10)).unwrap();
        store.add_item(line("b", 1, 20)).unwrap();
        store.add_item(line("c", 1, 30)).unwrap();
        let names: Vec<_> = store.get().lines.iter().map(|l| l.name.clone()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn test_update_quantity_zero_is_noop() {
        let store = store();
        store.add_item(line("ring-gold", 2, 100)).unwrap();
        let cart = store
            .update_quantity(&LineKey::new("ring-gold", None), 0)
            .unwrap();
        assert_eq!(cart.lines.first().map(|l| l.quantity), Some(2));
    }

    #[test]
    fn test_update_quantity_unknown_key_is_noop() {
        let store = store();
        store.add_item(line("ring-gold", 2, 100)).unwrap();
        let cart = store
            .update_quantity(&LineKey::new("missing", None), 7)
            .unwrap();
        assert_eq!(cart.total_quantity(), 2);
    }

    #[test]
    fn test_remove_and_clear() {
        let store = store();
        store.add_item(line("a", 1, 10)).unwrap();
        store.add_item(line("b", 1, 20)).unwrap();
        let cart = store.remove_item(&LineKey::new("a", None)).unwrap();
        assert_eq!(cart.lines.len(), 1);
        store.clear().unwrap();
        assert!(store.get().is_empty());
    }

    #[test]
    fn test_quota_error_surfaces_without_panic() {
        let storage = Storage::new(Arc::new(MemoryStorage::with_capacity(4)));
        let store = LocalCartStore::new(storage);
        let result = store.add_item(line("ring-gold", 1, 100));
        assert!(matches!(result, Err(StorageError::QuotaExceeded)));
    }
}
