//! Cart service.
//!
//! One service instance owns the cart for its storefront: a guest cart
//! in device storage, or the server cart once a customer signs in.
//! Every operation runs under a single fair async lock, so concurrent
//! callers resolve strictly in the order they were issued and
//! mutations queue behind an in-flight login merge.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::instrument;

use auric_core::{ErrorKind, MoneyError, OpStatus};

use crate::api::{ApiError, CartGateway, CartItemInput};
use crate::models::{Cart, CartLine, LineKey};
use crate::pricing::{self, CouponLookup, PricingRules, PricingSnapshot};
use crate::storage::StorageError;
use crate::stores::LocalCartStore;

use super::{StatusCell, StoreAuthority, SyncStatus};

/// A coupon currently applied to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedCoupon {
    /// The code as the shopper entered it.
    pub code: String,
    /// Discount rate resolved for the code.
    pub rate: Decimal,
}

/// Errors from cart operations.
#[derive(Debug, thiserror::Error)]
pub enum CartError {
    /// Quantity was zero where at least one unit is required.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// No cart line matches the given key.
    #[error("no cart line for {0}")]
    LineNotFound(String),

    /// The coupon code is not recognized.
    #[error("unknown coupon code: {0}")]
    UnknownCoupon(String),

    /// The operation needs a signed-in customer.
    #[error("no customer is signed in")]
    NotAuthenticated,

    /// Device storage failed.
    #[error("cart storage error: {0}")]
    Storage(#[from] StorageError),

    /// The commerce API failed.
    #[error("cart API error: {0}")]
    Api(#[from] ApiError),

    /// Line prices disagree on currency.
    #[error("cart money error: {0}")]
    Money(#[from] MoneyError),

    /// A login merge pushed some local lines but not all of them.
    ///
    /// The lines that failed are still in local storage; call
    /// [`CartService::retry_merge`] to push them again.
    #[error("cart merge incomplete: {failed} of {total} local lines failed")]
    MergeIncomplete {
        /// Lines that could not be pushed.
        failed: usize,
        /// Local lines the merge started with.
        total: usize,
        /// Per-line failures, in local cart order.
        errors: Vec<(LineKey, ApiError)>,
    },
}

impl CartError {
    /// Machine-readable classification for callers.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidQuantity | Self::UnknownCoupon(_) | Self::Money(_) => {
                ErrorKind::Validation
            }
            Self::LineNotFound(_) => ErrorKind::NotFound,
            Self::NotAuthenticated => ErrorKind::AuthRequired,
            Self::Storage(error) => error.kind(),
            Self::Api(error) => error.kind(),
            Self::MergeIncomplete { .. } => ErrorKind::Conflict,
        }
    }
}

#[derive(Debug, Default)]
struct CartState {
    access_token: Option<String>,
    remote: Option<Cart>,
    coupon: Option<AppliedCoupon>,
}

struct CartServiceInner {
    local: LocalCartStore,
    gateway: Arc<dyn CartGateway>,
    coupons: Arc<dyn CouponLookup>,
    rules: PricingRules,
    // Fair lock: waiters acquire in arrival order.
    state: Mutex<CartState>,
    status: StatusCell,
}

impl CartServiceInner {
    fn finish<T>(&self, result: &Result<T, CartError>) {
        let op = match result {
            Ok(_) => OpStatus::Succeeded,
            Err(error) => OpStatus::Failed(error.kind()),
        };
        self.status.set_operation(op);
    }
}

/// The cart engine.
///
/// Cheap to clone; all clones share one state and one operation queue.
/// Operations keep running once started, so dropping a clone never
/// cancels work issued through it.
#[derive(Clone)]
pub struct CartService {
    inner: Arc<CartServiceInner>,
}

impl CartService {
    /// Build a service in guest mode.
    #[must_use]
    pub fn new(
        local: LocalCartStore,
        gateway: Arc<dyn CartGateway>,
        coupons: Arc<dyn CouponLookup>,
        rules: PricingRules,
    ) -> Self {
        Self {
            inner: Arc::new(CartServiceInner {
                local,
                gateway,
                coupons,
                rules,
                state: Mutex::new(CartState::default()),
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

    /// The coupon currently applied, if any.
    pub async fn applied_coupon(&self) -> Option<AppliedCoupon> {
        self.inner.state.lock().await.coupon.clone()
    }

    /// The current cart.
    ///
    /// Guest carts come from device storage; authenticated carts from
    /// the cached server snapshot, fetched on first use.
    pub async fn cart(&self) -> Result<Cart, CartError> {
        let mut state = self.inner.state.lock().await;
        self.current_cart_locked(&mut state).await
    }

    /// Totals for the current cart under the applied coupon.
    pub async fn totals(&self) -> Result<PricingSnapshot, CartError> {
        let mut state = self.inner.state.lock().await;
        let cart = self.current_cart_locked(&mut state).await?;
        let rate = state.coupon.as_ref().map_or(Decimal::ZERO, |c| c.rate);
        Ok(pricing::compute_totals(&cart, rate, &self.inner.rules)?)
    }

    /// Add a line to the cart.
    ///
    /// Guest adds keep the line's display fields as hints; once signed
    /// in the server prices the line from its catalog and the returned
    /// cart reflects that.
    #[instrument(skip(self, line), fields(product = %line.product_id))]
    pub async fn add_item(&self, line: CartLine) -> Result<Cart, CartError> {
        let mut state = self.inner.state.lock().await;
        self.inner.status.set_operation(OpStatus::Pending);
        let result = self.add_item_locked(&mut state, line).await;
        self.inner.finish(&result);
        result
    }

    /// Set the quantity of an existing line. Zero is rejected and the
    /// cart is left untouched; removal is its own operation.
    #[instrument(skip(self))]
    pub async fn update_quantity(&self, key: &LineKey, quantity: u32) -> Result<Cart, CartError> {
        let mut state = self.inner.state.lock().await;
        self.inner.status.set_operation(OpStatus::Pending);
        let result = self.update_quantity_locked(&mut state, key, quantity).await;
        self.inner.finish(&result);
        result
    }

    /// Remove a line.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, key: &LineKey) -> Result<Cart, CartError> {
        let mut state = self.inner.state.lock().await;
        self.inner.status.set_operation(OpStatus::Pending);
        let result = self.remove_item_locked(&mut state, key).await;
        self.inner.finish(&result);
        result
    }

    /// Empty the cart.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<Cart, CartError> {
        let mut state = self.inner.state.lock().await;
        self.inner.status.set_operation(OpStatus::Pending);
        let result = self.clear_locked(&mut state).await;
        self.inner.finish(&result);
        result
    }

    /// Apply a coupon code and return the resulting totals.
    #[instrument(skip(self))]
    pub async fn apply_coupon(&self, code: &str) -> Result<PricingSnapshot, CartError> {
        let mut state = self.inner.state.lock().await;
        self.inner.status.set_operation(OpStatus::Pending);
        let result = self.apply_coupon_locked(&mut state, code).await;
        self.inner.finish(&result);
        result
    }

    /// Drop the applied coupon, if any.
    pub async fn clear_coupon(&self) {
        let mut state = self.inner.state.lock().await;
        state.coupon = None;
    }

    /// Switch to the server cart for a freshly signed-in customer and
    /// merge the guest cart into it.
    ///
    /// Local lines already on the server keep the server quantity;
    /// lines the server has never seen are pushed in local order. The
    /// guest cart is cleared only once every line is accounted for. If
    /// some pushes fail, the failed lines stay in local storage and a
    /// single [`CartError::MergeIncomplete`] reports all of them.
    ///
    /// Errors here never undo the sign-in: the service stays
    /// authenticated and [`retry_merge`](Self::retry_merge) can finish
    /// the job.
    #[instrument(skip(self, access_token))]
    pub async fn on_login(&self, access_token: String) -> Result<Cart, CartError> {
        let mut state = self.inner.state.lock().await;
        state.access_token = Some(access_token);
        state.remote = None;
        self.merge_locked(&mut state).await
    }

    /// Re-run the login merge for lines a previous merge left behind.
    pub async fn retry_merge(&self) -> Result<Cart, CartError> {
        let mut state = self.inner.state.lock().await;
        if state.access_token.is_none() {
            return Err(CartError::NotAuthenticated);
        }
        state.remote = None;
        self.merge_locked(&mut state).await
    }

    /// Return to guest mode with a fresh empty cart.
    ///
    /// Nothing is copied back from the server cart; it stays intact
    /// under the customer's account.
    #[instrument(skip(self))]
    pub async fn on_logout(&self) -> Result<(), CartError> {
        let mut state = self.inner.state.lock().await;
        state.access_token = None;
        state.remote = None;
        state.coupon = None;
        self.inner.local.clear()?;
        self.inner.status.set_authority(StoreAuthority::Guest);
        self.inner.status.set_operation(OpStatus::Idle);
        Ok(())
    }

    // ========================================================================
    // Locked internals
    // ========================================================================

    async fn current_cart_locked(&self, state: &mut CartState) -> Result<Cart, CartError> {
        let Some(token) = state.access_token.clone() else {
            return Ok(self.inner.local.get());
        };
        if let Some(remote) = &state.remote {
            return Ok(remote.clone());
        }
        let cart = self.inner.gateway.fetch_cart(&token).await?;
        state.remote = Some(cart.clone());
        Ok(cart)
    }

    async fn add_item_locked(
        &self,
        state: &mut CartState,
        line: CartLine,
    ) -> Result<Cart, CartError> {
        if line.quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        let Some(token) = state.access_token.clone() else {
            return Ok(self.inner.local.add_item(line)?);
        };
        match self
            .inner
            .gateway
            .add_item(&token, &CartItemInput::from(&line))
            .await
        {
            Ok(cart) => {
                state.remote = Some(cart.clone());
                Ok(cart)
            }
            Err(error) => {
                // Server state is unknown; force a refetch on next read.
                state.remote = None;
                Err(error.into())
            }
        }
    }

    async fn update_quantity_locked(
        &self,
        state: &mut CartState,
        key: &LineKey,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        let Some(token) = state.access_token.clone() else {
            if !self.inner.local.get().contains(key) {
                return Err(CartError::LineNotFound(key.to_string()));
            }
            return Ok(self.inner.local.update_quantity(key, quantity)?);
        };
        match self.inner.gateway.update_item(&token, key, quantity).await {
            Ok(cart) => {
                state.remote = Some(cart.clone());
                Ok(cart)
            }
            Err(error) => {
                state.remote = None;
                Err(error.into())
            }
        }
    }

    async fn remove_item_locked(
        &self,
        state: &mut CartState,
        key: &LineKey,
    ) -> Result<Cart, CartError> {
        let Some(token) = state.access_token.clone() else {
            if !self.inner.local.get().contains(key) {
                return Err(CartError::LineNotFound(key.to_string()));
            }
            return Ok(self.inner.local.remove_item(key)?);
        };
        match self.inner.gateway.remove_item(&token, key).await {
            Ok(cart) => {
                state.remote = Some(cart.clone());
                Ok(cart)
            }
            Err(error) => {
                state.remote = None;
                Err(error.into())
            }
        }
    }

    async fn clear_locked(&self, state: &mut CartState) -> Result<Cart, CartError> {
        let Some(token) = state.access_token.clone() else {
            self.inner.local.clear()?;
            return Ok(Cart::new());
        };
        let snapshot = self.current_cart_locked(state).await?;
        let keys: Vec<LineKey> = snapshot.lines.iter().map(CartLine::key).collect();
        let mut cart = snapshot;
        for key in &keys {
            match self.inner.gateway.remove_item(&token, key).await {
                Ok(next) => cart = next,
                Err(error) => {
                    state.remote = None;
                    return Err(error.into());
                }
            }
        }
        state.remote = Some(cart.clone());
        Ok(cart)
    }

    async fn apply_coupon_locked(
        &self,
        state: &mut CartState,
        code: &str,
    ) -> Result<PricingSnapshot, CartError> {
        let Some(rate) = self.inner.coupons.resolve(code).await else {
            return Err(CartError::UnknownCoupon(code.to_owned()));
        };
        state.coupon = Some(AppliedCoupon {
            code: code.to_owned(),
            rate,
        });
        let cart = self.current_cart_locked(state).await?;
        Ok(pricing::compute_totals(&cart, rate, &self.inner.rules)?)
    }

    async fn merge_locked(&self, state: &mut CartState) -> Result<Cart, CartError> {
        self.inner.status.set_authority(StoreAuthority::Authenticating);
        self.inner.status.set_operation(OpStatus::Pending);
        let result = self.merge_inner(state).await;
        // A failed merge does not undo the sign-in itself.
        self.inner.status.set_authority(StoreAuthority::Authenticated);
        self.inner.finish(&result);
        result
    }

    async fn merge_inner(&self, state: &mut CartState) -> Result<Cart, CartError> {
        let token = state
            .access_token
            .clone()
            .ok_or(CartError::NotAuthenticated)?;
        let mut remote = self.inner.gateway.fetch_cart(&token).await?;

        let local = self.inner.local.get();
        let total = local.lines.len();
        let mut errors: Vec<(LineKey, ApiError)> = Vec::new();
        let mut unmerged: Vec<CartLine> = Vec::new();

        for line in local.lines {
            let key = line.key();
            if remote.contains(&key) {
                // Present on both sides: the server quantity wins.
                continue;
            }
            match self
                .inner
                .gateway
                .add_item(&token, &CartItemInput::from(&line))
                .await
            {
                Ok(cart) => remote = cart,
                Err(error) => {
                    tracing::warn!(line = %key, error = %error, "Failed to merge cart line");
                    errors.push((key, error));
                    unmerged.push(line);
                }
            }
        }

        state.remote = Some(remote.clone());
        if errors.is_empty() {
            self.inner.local.clear()?;
            Ok(remote)
        } else {
            // Keep exactly the lines that still need pushing.
            self.inner.local.set(&Cart { lines: unmerged })?;
            Err(CartError::MergeIncomplete {
                failed: errors.len(),
                total,
                errors,
            })
        }
    }
}

impl std::fmt::Debug for CartService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartService")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
