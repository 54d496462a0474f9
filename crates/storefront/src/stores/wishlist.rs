//! Guest wishlist persistence.

use crate::models::{LineKey, Wishlist, WishlistItem};
use crate::storage::{Storage, StorageError, keys};

/// The device-local wishlist used while no customer is signed in.
#[derive(Debug, Clone)]
pub struct LocalWishlistStore {
    storage: Storage,
}

impl LocalWishlistStore {
    /// Build a store over the given storage handle.
    #[must_use]
    pub const fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// The current wishlist, empty on read failure.
    #[must_use]
    pub fn get(&self) -> Wishlist {
        match self.storage.get_json(keys::GUEST_WISHLIST) {
            Ok(wishlist) => wishlist.unwrap_or_default(),
            Err(error) => {
                tracing::warn!(error = %error, "Failed to read guest wishlist");
                Wishlist::new()
            }
        }
    }

    /// Replace the stored wishlist wholesale.
    pub fn set(&self, wishlist: &Wishlist) -> Result<(), StorageError> {
        self.storage.set_json(keys::GUEST_WISHLIST, wishlist)
    }

    /// Add an item. Items are unit entries, so adding an already-saved
    /// key keeps the existing item untouched.
    pub fn add_item(&self, item: WishlistItem) -> Result<Wishlist, StorageError> {
        let mut wishlist = self.get();
        if !wishlist.contains(&item.key()) {
            wishlist.items.push(item);
            self.set(&wishlist)?;
        }
        Ok(wishlist)
    }

    /// Remove the item with the given key, if present.
    pub fn remove_item(&self, key: &LineKey) -> Result<Wishlist, StorageError> {
        let mut wishlist = self.get();
        let before = wishlist.items.len();
        wishlist.items.retain(|item| item.key() != *key);
        if wishlist.items.len() != before {
            self.set(&wishlist)?;
        }
        Ok(wishlist)
    }

    /// Empty the wishlist.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(keys::GUEST_WISHLIST)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use auric_core::{CurrencyCode, Money, ProductId};

    use super::*;

    fn store() -> LocalWishlistStore {
        LocalWishlistStore::new(Storage::in_memory())
    }

    fn item(product: &str, price: i64) -> WishlistItem {
        WishlistItem {
            product_id: ProductId::new(product),
            variant_id: None,
            name: product.to_owned(),
            price: Money::from_major(price, CurrencyCode::USD),
            image: None,
            note: None,
        }
    }

    #[test]
    fn test_add_and_get() {
        let store = store();
        store.add_item(item("bracelet-silver", 900)).unwrap();
        assert_eq!(store.get().len(), 1);
    }

    #[test]
    fn test_duplicate_add_keeps_existing_item() {
        let store = store();
        let mut first = item("bracelet-silver", 900);
        first.note = Some("anniversary".to_owned());
        store.add_item(first).unwrap();
        let wishlist = store.add_item(item("bracelet-silver", 950)).unwrap();
        assert_eq!(wishlist.len(), 1);
        let saved = wishlist.find(&LineKey::new("bracelet-silver", None)).unwrap();
        assert_eq!(saved.note.as_deref(), Some("anniversary"));
        assert_eq!(saved.price, Money::from_major(900, CurrencyCode::USD));
    }

    #[test]
    fn test_remove_and_clear() {
        let store = store();
        store.add_item(item("a", 10)).unwrap();
        store.add_item(item("b", 20)).unwrap();
        let wishlist = store.remove_item(&LineKey::new("a", None)).unwrap();
        assert_eq!(wishlist.len(), 1);
        store.clear().unwrap();
        assert!(store.get().is_empty());
    }
}
