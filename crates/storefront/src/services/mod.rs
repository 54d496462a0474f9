//! Business logic services.
//!
//! Services own the guest/authenticated state machines and decide
//! which side (device storage or the commerce API) is authoritative
//! for each operation:
//!
//! - `auth` - Sign-in flows and session lifecycle
//! - `cart` - Cart mutations, login-time merge, applied coupon
//! - `wishlist` - Wishlist mutations, merge, move-to-cart

use std::sync::{PoisonError, RwLock};

use auric_core::OpStatus;

pub mod auth;
pub mod cart;
pub mod wishlist;

pub use auth::{AuthBridge, AuthError, AuthProvider, BotCheck, StubBotCheck};
pub use cart::{AppliedCoupon, CartError, CartService};
pub use wishlist::{WishlistError, WishlistService};

/// Which side currently answers operations for a customer-scoped
/// store (cart or wishlist).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreAuthority {
    /// Device storage; no customer signed in.
    #[default]
    Guest,
    /// A sign-in merge is in flight; new operations wait behind it.
    Authenticating,
    /// The commerce API, addressed by the customer's token.
    Authenticated,
}

/// Point-in-time view of a service, readable without queuing behind
/// in-flight operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStatus {
    /// Which side answers operations right now.
    pub authority: StoreAuthority,
    /// Lifecycle of the most recently started mutation.
    pub last_operation: OpStatus,
}

/// Shared mirror of a service's [`SyncStatus`], written at transition
/// points inside the operation lock.
#[derive(Debug, Default)]
pub(crate) struct StatusCell {
    status: RwLock<SyncStatus>,
}

impl StatusCell {
    pub(crate) fn get(&self) -> SyncStatus {
        *self.status.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_authority(&self, authority: StoreAuthority) {
        let mut status = self.status.write().unwrap_or_else(PoisonError::into_inner);
        status.authority = authority;
    }

    pub(crate) fn set_operation(&self, op: OpStatus) {
        let mut status = self.status.write().unwrap_or_else(PoisonError::into_inner);
        status.last_operation = op;
    }
}
