//! Wishlist service.
//!
//! Mirrors the cart service's state machine: guest items live in
//! device storage, authenticated items on the server, and signing in
//! merges the former into the latter. Items are unit entries keyed the
//! same way as cart lines.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::instrument;

use auric_core::{ErrorKind, OpStatus};

use crate::api::{ApiError, WishlistGateway, WishlistItemInput};
use crate::models::{CartLine, LineKey, Wishlist, WishlistItem};
use crate::storage::StorageError;
use crate::stores::LocalWishlistStore;

use super::cart::{CartError, CartService};
use super::{StatusCell, StoreAuthority, SyncStatus};

/// Errors from wishlist operations.
#[derive(Debug, thiserror::Error)]
pub enum WishlistError {
    /// No saved item matches the given key.
    #[error("no wishlist item for {0}")]
    ItemNotFound(String),

    /// The operation needs a signed-in customer.
    #[error("no customer is signed in")]
    NotAuthenticated,

    /// Device storage failed.
    #[error("wishlist storage error: {0}")]
    Storage(#[from] StorageError),

    /// The commerce API failed.
    #[error("wishlist API error: {0}")]
    Api(#[from] ApiError),

    /// A move-to-cart stopped at the cart step; the wishlist is
    /// untouched.
    #[error("could not add the item to the cart: {0}")]
    CartAdd(#[from] CartError),

    /// A login merge pushed some local items but not all of them.
    #[error("wishlist merge incomplete: {failed} of {total} local items failed")]
    MergeIncomplete {
        /// Items that could not be pushed.
        failed: usize,
        /// Local items the merge started with.
        total: usize,
        /// Per-item failures, in local wishlist order.
        errors: Vec<(LineKey, ApiError)>,
    },

    /// A move-to-cart added the item to the cart but could not remove
    /// it from the wishlist, so it currently appears in both.
    #[error("moved {key} to the cart but failed to remove it from the wishlist: {source}")]
    PartialMove {
        /// The item that was moved.
        key: String,
        /// Why the removal failed.
        #[source]
        source: Box<WishlistError>,
    },
}

impl WishlistError {
    /// Machine-readable classification for callers.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ItemNotFound(_) => ErrorKind::NotFound,
            Self::NotAuthenticated => ErrorKind::AuthRequired,
            Self::Storage(error) => error.kind(),
            Self::Api(error) => error.kind(),
            Self::CartAdd(error) => error.kind(),
            Self::MergeIncomplete { .. } | Self::PartialMove { .. } => ErrorKind::Conflict,
        }
    }
}

#[derive(Debug, Default)]
struct WishlistState {
    access_token: Option<String>,
    remote: Option<Wishlist>,
}

struct WishlistServiceInner {
    local: LocalWishlistStore,
    gateway: Arc<dyn WishlistGateway>,
    state: Mutex<WishlistState>,
    status: StatusCell,
}

impl WishlistServiceInner {
    fn finish<T>(&self, result: &Result<T, WishlistError>) {
        let op = match result {
            Ok(_) => OpStatus::Succeeded,
            Err(error) => OpStatus::Failed(error.kind()),
        };
        self.status.set_operation(op);
    }
}

/// The wishlist engine.
///
/// Cheap to clone; all clones share one state and one operation queue.
#[derive(Clone)]
pub struct WishlistService {
    inner: Arc<WishlistServiceInner>,
}

impl WishlistService {
    /// Build a service in guest mode.
    #[must_use]
    pub fn new(local: LocalWishlistStore, gateway: Arc<dyn WishlistGateway>) -> Self {
        Self {
            inner: Arc::new(WishlistServiceInner {
                local,
                gateway,
                state: Mutex::new(WishlistState::default()),
                status: StatusCell::default(),
            }),
        }
    }

    /// Current status snapshot. Never blocks on in-flight operations.
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        self.inner.status.get()
    }

    /// Which store answers operations right now.
    #[must_use]
    pub fn authority(&self) -> StoreAuthority {
        self.status().authority
    }

    /// Lifecycle of the most recently started mutation.
    #[must_use]
    pub fn last_operation(&self) -> OpStatus {
        self.status().last_operation
    }

    /// The current wishlist.
    pub async fn wishlist(&self) -> Result<Wishlist, WishlistError> {
        let mut state = self.inner.state.lock().await;
        self.current_wishlist_locked(&mut state).await
    }

    /// Save an item. Saving an already-saved key keeps the existing
    /// entry untouched.
    #[instrument(skip(self, item), fields(product = %item.product_id))]
    pub async fn add_item(&self, item: WishlistItem) -> Result<Wishlist, WishlistError> {
        let mut state = self.inner.state.lock().await;
        self.inner.status.set_operation(OpStatus::Pending);
        let result = self.add_item_locked(&mut state, item).await;
        self.inner.finish(&result);
        result
    }

    /// Remove a saved item.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, key: &LineKey) -> Result<Wishlist, WishlistError> {
        let mut state = self.inner.state.lock().await;
        self.inner.status.set_operation(OpStatus::Pending);
        let result = self.remove_item_locked(&mut state, key).await;
        self.inner.finish(&result);
        result
    }

    /// Empty the wishlist.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<Wishlist, WishlistError> {
        let mut state = self.inner.state.lock().await;
        self.inner.status.set_operation(OpStatus::Pending);
        let result = self.clear_locked(&mut state).await;
        self.inner.finish(&result);
        result
    }

    /// Move a saved item into the cart.
    ///
    /// Runs as add-to-cart first, then remove-from-wishlist. If the
    /// cart step fails the wishlist is untouched. If the removal fails
    /// the item is left in both places and the error says so; removing
    /// it again later is safe.
    #[instrument(skip(self, cart))]
    pub async fn move_to_cart(
        &self,
        key: &LineKey,
        quantity: u32,
        cart: &CartService,
    ) -> Result<Wishlist, WishlistError> {
        let mut state = self.inner.state.lock().await;
        self.inner.status.set_operation(OpStatus::Pending);
        let result = self
            .move_to_cart_locked(&mut state, key, quantity, cart)
            .await;
        self.inner.finish(&result);
        result
    }

    /// Switch to the server wishlist for a freshly signed-in customer
    /// and merge the guest wishlist into it.
    ///
    /// Same contract as the cart merge: items already on the server
    /// stay as the server has them, local-only items are pushed in
    /// order, and failures leave their items in local storage behind a
    /// single [`WishlistError::MergeIncomplete`].
    #[instrument(skip(self, access_token))]
    pub async fn on_login(&self, access_token: String) -> Result<Wishlist, WishlistError> {
        let mut state = self.inner.state.lock().await;
        state.access_token = Some(access_token);
        state.remote = None;
        self.merge_locked(&mut state).await
    }

    /// Re-run the login merge for items a previous merge left behind.
    pub async fn retry_merge(&self) -> Result<Wishlist, WishlistError> {
        let mut state = self.inner.state.lock().await;
        if state.access_token.is_none() {
            return Err(WishlistError::NotAuthenticated);
        }
        state.remote = None;
        self.merge_locked(&mut state).await
    }

    /// Return to guest mode with a fresh empty wishlist.
    #[instrument(skip(self))]
    pub async fn on_logout(&self) -> Result<(), WishlistError> {
        let mut state = self.inner.state.lock().await;
        state.access_token = None;
        state.remote = None;
        self.inner.local.clear()?;
        self.inner.status.set_authority(StoreAuthority::Guest);
        self.inner.status.set_operation(OpStatus::Idle);
        Ok(())
    }

    // ========================================================================
    // Locked internals
    // ========================================================================

    async fn current_wishlist_locked(
        &self,
        state: &mut WishlistState,
    ) -> Result<Wishlist, WishlistError> {
        let Some(token) = state.access_token.clone() else {
            return Ok(self.inner.local.get());
        };
        if let Some(remote) = &state.remote {
            return Ok(remote.clone());
        }
        let wishlist = self.inner.gateway.fetch_wishlist(&token).await?;
        state.remote = Some(wishlist.clone());
        Ok(wishlist)
    }

    async fn add_item_locked(
        &self,
        state: &mut WishlistState,
        item: WishlistItem,
    ) -> Result<Wishlist, WishlistError> {
        let Some(token) = state.access_token.clone() else {
            return Ok(self.inner.local.add_item(item)?);
        };
        match self
            .inner
            .gateway
            .add_item(&token, &WishlistItemInput::from(&item))
            .await
        {
            Ok(wishlist) => {
                state.remote = Some(wishlist.clone());
                Ok(wishlist)
            }
            Err(error) => {
                state.remote = None;
                Err(error.into())
            }
        }
    }

    async fn remove_item_locked(
        &self,
        state: &mut WishlistState,
        key: &LineKey,
    ) -> Result<Wishlist, WishlistError> {
        let Some(token) = state.access_token.clone() else {
            if !self.inner.local.get().contains(key) {
                return Err(WishlistError::ItemNotFound(key.to_string()));
            }
            return Ok(self.inner.local.remove_item(key)?);
        };
        match self.inner.gateway.remove_item(&token, key).await {
            Ok(wishlist) => {
                state.remote = Some(wishlist.clone());
                Ok(wishlist)
            }
            Err(error) => {
                state.remote = None;
                Err(error.into())
            }
        }
    }

    async fn clear_locked(&self, state: &mut WishlistState) -> Result<Wishlist, WishlistError> {
        let Some(token) = state.access_token.clone() else {
            self.inner.local.clear()?;
            return Ok(Wishlist::new());
        };
        let snapshot = self.current_wishlist_locked(state).await?;
        let keys: Vec<LineKey> = snapshot.items.iter().map(WishlistItem::key).collect();
        let mut wishlist = snapshot;
        for key in &keys {
            match self.inner.gateway.remove_item(&token, key).await {
                Ok(next) => wishlist = next,
                Err(error) => {
                    state.remote = None;
                    return Err(error.into());
                }
            }
        }
        state.remote = Some(wishlist.clone());
        Ok(wishlist)
    }

    async fn move_to_cart_locked(
        &self,
        state: &mut WishlistState,
        key: &LineKey,
        quantity: u32,
        cart: &CartService,
    ) -> Result<Wishlist, WishlistError> {
        let current = self.current_wishlist_locked(state).await?;
        let Some(item) = current.find(key) else {
            return Err(WishlistError::ItemNotFound(key.to_string()));
        };
        let line = CartLine {
            product_id: item.product_id.clone(),
            variant_id: item.variant_id.clone(),
            name: item.name.clone(),
            unit_price: item.price,
            quantity,
            image: item.image.clone(),
        };
        // Cart first; a failure here leaves the wishlist untouched.
        cart.add_item(line).await?;
        match self.remove_item_locked(state, key).await {
            Ok(wishlist) => Ok(wishlist),
            Err(error) => Err(WishlistError::PartialMove {
                key: key.to_string(),
                source: Box::new(error),
            }),
        }
    }

    async fn merge_locked(&self, state: &mut WishlistState) -> Result<Wishlist, WishlistError> {
        self.inner.status.set_authority(StoreAuthority::Authenticating);
        self.inner.status.set_operation(OpStatus::Pending);
        let result = self.merge_inner(state).await;
        // A failed merge does not undo the sign-in itself.
        self.inner.status.set_authority(StoreAuthority::Authenticated);
        self.inner.finish(&result);
        result
    }

    async fn merge_inner(&self, state: &mut WishlistState) -> Result<Wishlist, WishlistError> {
        let token = state
            .access_token
            .clone()
            .ok_or(WishlistError::NotAuthenticated)?;
        let mut remote = self.inner.gateway.fetch_wishlist(&token).await?;

        let local = self.inner.local.get();
        let total = local.items.len();
        let mut errors: Vec<(LineKey, ApiError)> = Vec::new();
        let mut unmerged: Vec<WishlistItem> = Vec::new();

        for item in local.items {
            let key = item.key();
            if remote.contains(&key) {
                continue;
            }
            match self
                .inner
                .gateway
                .add_item(&token, &WishlistItemInput::from(&item))
                .await
            {
                Ok(wishlist) => remote = wishlist,
                Err(error) => {
                    tracing::warn!(item = %key, error = %error, "Failed to merge wishlist item");
                    errors.push((key, error));
                    unmerged.push(item);
                }
            }
        }

        state.remote = Some(remote.clone());
        if errors.is_empty() {
            self.inner.local.clear()?;
            Ok(remote)
        } else {
            self.inner.local.set(&Wishlist { items: unmerged })?;
            Err(WishlistError::MergeIncomplete {
                failed: errors.len(),
                total,
                errors,
            })
        }
    }
}

impl std::fmt::Debug for WishlistService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WishlistService")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use auric_core::{CurrencyCode, Money, ProductId};

    use crate::api::{CartGateway, CartItemInput};
    use crate::models::Cart;
    use crate::pricing::{PricingRules, StaticCouponCodes};
    use crate::storage::Storage;
    use crate::stores::LocalCartStore;

    use super::*;

    /// Cart gateway that must never be reached; the carts in these
    /// tests stay in guest mode.
    struct NullCartGateway;

    #[async_trait]
    impl CartGateway for NullCartGateway {
        async fn fetch_cart(&self, _access_token: &str) -> Result<Cart, ApiError> {
            panic!("cart gateway should not be used")
        }

        async fn add_item(
            &self,
            _access_token: &str,
            _item: &CartItemInput,
        ) -> Result<Cart, ApiError> {
            panic!("cart gateway should not be used")
        }

        async fn update_item(
            &self,
            _access_token: &str,
            _key: &LineKey,
            _quantity: u32,
        ) -> Result<Cart, ApiError> {
            panic!("cart gateway should not be used")
        }

        async fn remove_item(
            &self,
            _access_token: &str,
            _key: &LineKey,
        ) -> Result<Cart, ApiError> {
            panic!("cart gateway should not be used")
        }
    }

    /// In-memory stand-in for the wishlist endpoints.
    #[derive(Default)]
    struct FakeWishlistGateway {
        wishlist: std::sync::Mutex<Wishlist>,
        fail_removes: AtomicBool,
    }

    #[async_trait]
    impl WishlistGateway for FakeWishlistGateway {
        async fn fetch_wishlist(&self, _access_token: &str) -> Result<Wishlist, ApiError> {
            Ok(self.wishlist.lock().unwrap().clone())
        }

        async fn add_item(
            &self,
            _access_token: &str,
            item: &WishlistItemInput,
        ) -> Result<Wishlist, ApiError> {
            let mut wishlist = self.wishlist.lock().unwrap();
            let key = LineKey::new(item.product_id.clone(), item.variant_id.clone());
            if !wishlist.contains(&key) {
                wishlist.items.push(WishlistItem {
                    product_id: item.product_id.clone(),
                    variant_id: item.variant_id.clone(),
                    name: item.product_id.as_str().to_owned(),
                    price: Money::from_major(100, CurrencyCode::USD),
                    image: None,
                    note: item.note.clone(),
                });
            }
            Ok(wishlist.clone())
        }

        async fn remove_item(
            &self,
            _access_token: &str,
            key: &LineKey,
        ) -> Result<Wishlist, ApiError> {
            if self.fail_removes.load(Ordering::SeqCst) {
                return Err(ApiError::Server {
                    status: 503,
                    message: "unavailable".to_owned(),
                });
            }
            let mut wishlist = self.wishlist.lock().unwrap();
            wishlist.items.retain(|item| item.key() != *key);
            Ok(wishlist.clone())
        }
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

    fn wishlist_service(gateway: Arc<FakeWishlistGateway>) -> WishlistService {
        WishlistService::new(LocalWishlistStore::new(Storage::in_memory()), gateway)
    }

    fn cart_service() -> CartService {
        CartService::new(
            LocalCartStore::new(Storage::in_memory()),
            Arc::new(NullCartGateway),
            Arc::new(StaticCouponCodes::default()),
            PricingRules::default(),
        )
    }

    #[tokio::test]
    async fn test_guest_add_is_duplicate_safe() {
        let service = wishlist_service(Arc::new(FakeWishlistGateway::default()));
        service.add_item(item("bracelet-silver", 900)).await.unwrap();
        let wishlist = service.add_item(item("bracelet-silver", 950)).await.unwrap();
        assert_eq!(wishlist.len(), 1);
    }

    #[tokio::test]
    async fn test_move_to_cart_moves_item() {
        let service = wishlist_service(Arc::new(FakeWishlistGateway::default()));
        let cart = cart_service();
        service.add_item(item("bracelet-silver", 900)).await.unwrap();

        let key = LineKey::new("bracelet-silver", None);
        let wishlist = service.move_to_cart(&key, 1, &cart).await.unwrap();

        assert!(wishlist.is_empty());
        let cart_state = cart.cart().await.unwrap();
        assert!(cart_state.contains(&key));
        // The wishlist price travels with the item as the cart hint.
        assert_eq!(
            cart_state.lines.first().map(|l| l.unit_price),
            Some(Money::from_major(900, CurrencyCode::USD))
        );
    }

    #[tokio::test]
    async fn test_move_to_cart_missing_item() {
        let service = wishlist_service(Arc::new(FakeWishlistGateway::default()));
        let cart = cart_service();
        let result = service
            .move_to_cart(&LineKey::new("missing", None), 1, &cart)
            .await;
        assert!(matches!(result, Err(WishlistError::ItemNotFound(_))));
        assert!(cart.cart().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_move_to_cart_zero_quantity_leaves_wishlist_untouched() {
        let service = wishlist_service(Arc::new(FakeWishlistGateway::default()));
        let cart = cart_service();
        service.add_item(item("bracelet-silver", 900)).await.unwrap();

        let result = service
            .move_to_cart(&LineKey::new("bracelet-silver", None), 0, &cart)
            .await;

        assert!(matches!(
            result,
            Err(WishlistError::CartAdd(CartError::InvalidQuantity))
        ));
        assert_eq!(service.wishlist().await.unwrap().len(), 1);
        assert!(cart.cart().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_move_partial_failure_leaves_item_in_both() {
        let gateway = Arc::new(FakeWishlistGateway::default());
        let service = wishlist_service(Arc::clone(&gateway));
        let cart = cart_service();

        service.add_item(item("ring-gold", 1200)).await.unwrap();
        service.on_login("token".to_owned()).await.unwrap();
        gateway.fail_removes.store(true, Ordering::SeqCst);

        let key = LineKey::new("ring-gold", None);
        let result = service.move_to_cart(&key, 1, &cart).await;

        assert!(matches!(result, Err(WishlistError::PartialMove { .. })));
        // Item is now in the cart and still on the wishlist.
        assert!(cart.cart().await.unwrap().contains(&key));
        assert!(service.wishlist().await.unwrap().contains(&key));
        // A later plain removal succeeds once the backend recovers.
        gateway.fail_removes.store(false, Ordering::SeqCst);
        let wishlist = service.remove_item(&key).await.unwrap();
        assert!(wishlist.is_empty());
    }

    #[tokio::test]
    async fn test_login_merge_parity_with_cart() {
        let gateway = Arc::new(FakeWishlistGateway::default());
        {
            let mut remote = gateway.wishlist.lock().unwrap();
            remote.items.push(item("a", 100));
        }
        let service = wishlist_service(Arc::clone(&gateway));
        service.add_item(item("a", 555)).await.unwrap();
        service.add_item(item("b", 200)).await.unwrap();

        let merged = service.on_login("token".to_owned()).await.unwrap();

        let products: Vec<_> = merged
            .items
            .iter()
            .map(|i| i.product_id.as_str().to_owned())
            .collect();
        assert_eq!(products, ["a", "b"]);
        // The remote copy of "a" wins, price included.
        assert_eq!(
            merged.find(&LineKey::new("a", None)).map(|i| i.price),
            Some(Money::from_major(100, CurrencyCode::USD))
        );
        assert_eq!(service.authority(), StoreAuthority::Authenticated);
    }

    #[tokio::test]
    async fn test_logout_resets_to_empty_guest_wishlist() {
        let gateway = Arc::new(FakeWishlistGateway::default());
        let service = wishlist_service(Arc::clone(&gateway));
        service.add_item(item("a", 100)).await.unwrap();
        service.on_login("token".to_owned()).await.unwrap();

        service.on_logout().await.unwrap();

        assert_eq!(service.authority(), StoreAuthority::Guest);
        assert!(service.wishlist().await.unwrap().is_empty());
        assert!(!gateway.wishlist.lock().unwrap().is_empty());
    }
}
