//! The assembled storefront.
//!
//! Ties the auth bridge and the cart and wishlist services together so
//! signing in and out ripples through every store. Operations that
//! establish or end a session go through here; everything else is
//! reached through the [`auth`](Shopfront::auth), [`cart`](Shopfront::cart),
//! and [`wishlist`](Shopfront::wishlist) accessors.

use std::sync::Arc;

use tracing::instrument;

use crate::api::CommerceClient;
use crate::config::StorefrontConfig;
use crate::error::StorefrontError;
use crate::models::{LineKey, Session, Wishlist};
use crate::pricing::{PricingRules, StaticCouponCodes};
use crate::services::{
    AuthBridge, AuthProvider, CartError, CartService, StubBotCheck, WishlistError,
    WishlistService,
};
use crate::storage::{FileStorage, Storage};
use crate::stores::{LocalCartStore, LocalWishlistStore, SessionStore};

/// The prebuilt services a [`Shopfront`] is assembled from.
///
/// Production code goes through [`Shopfront::from_config`]; this exists
/// so tests and embedders can swap in their own backends.
pub struct ShopfrontParts {
    /// Authentication service.
    pub auth: AuthBridge,
    /// Cart service.
    pub cart: CartService,
    /// Wishlist service.
    pub wishlist: WishlistService,
}

/// What happened when a sign-in rippled through the stores.
///
/// A merge failure does not undo the sign-in. The session is
/// established either way and the affected store keeps the unmerged
/// items locally, so the merge can be retried.
#[derive(Debug)]
pub struct LoginOutcome {
    /// The established session.
    pub session: Session,
    /// Why folding the guest cart into the account cart failed, if it did.
    pub cart_merge: Option<CartError>,
    /// Why folding the guest wishlist failed, if it did.
    pub wishlist_merge: Option<WishlistError>,
}

impl LoginOutcome {
    /// Whether every store merged cleanly.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.cart_merge.is_none() && self.wishlist_merge.is_none()
    }
}

/// Everything a storefront frontend talks to.
///
/// Cheaply cloneable; all clones share the same services.
#[derive(Clone)]
pub struct Shopfront {
    inner: Arc<ShopfrontInner>,
}

struct ShopfrontInner {
    auth: AuthBridge,
    cart: CartService,
    wishlist: WishlistService,
}

impl Shopfront {
    /// Assemble a storefront from prebuilt services.
    #[must_use]
    pub fn from_parts(parts: ShopfrontParts) -> Self {
        Self {
            inner: Arc::new(ShopfrontInner {
                auth: parts.auth,
                cart: parts.cart,
                wishlist: parts.wishlist,
            }),
        }
    }

    /// Build the production storefront from configuration.
    ///
    /// Persists under `store.json` in the configured storage directory
    /// and talks to the commerce API over HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage file cannot be opened or the
    /// HTTP client cannot be built.
    pub fn from_config(config: &StorefrontConfig) -> Result<Self, StorefrontError> {
        let backend = FileStorage::open(config.storage_dir.join("store.json"))?;
        let storage = Storage::new(Arc::new(backend));
        let client = CommerceClient::new(&config.api)?;

        let auth = AuthBridge::new(
            Arc::new(client.clone()),
            Arc::new(StubBotCheck),
            SessionStore::new(storage.clone()),
            config.email_link_url.clone(),
        );
        let cart = CartService::new(
            LocalCartStore::new(storage.clone()),
            Arc::new(client.clone()),
            Arc::new(StaticCouponCodes::new(
                config.coupon.code.clone(),
                config.coupon.rate,
            )),
            PricingRules {
                currency: config.currency,
                free_shipping_threshold: config.pricing.free_shipping_threshold,
                flat_shipping_fee: config.pricing.flat_shipping_fee,
            },
        );
        let wishlist = WishlistService::new(LocalWishlistStore::new(storage), Arc::new(client));

        Ok(Self::from_parts(ShopfrontParts {
            auth,
            cart,
            wishlist,
        }))
    }

    /// The authentication service.
    #[must_use]
    pub fn auth(&self) -> &AuthBridge {
        &self.inner.auth
    }

    /// The cart service.
    #[must_use]
    pub fn cart(&self) -> &CartService {
        &self.inner.cart
    }

    /// The wishlist service.
    #[must_use]
    pub fn wishlist(&self) -> &WishlistService {
        &self.inner.wishlist
    }

    // =========================================================================
    // Session Establishment
    // =========================================================================

    /// Restore a persisted session and bring the stores back online.
    ///
    /// Returns `None` when no usable session was persisted; the stores
    /// stay in guest mode.
    #[instrument(skip(self))]
    pub async fn restore_session(&self) -> Result<Option<LoginOutcome>, StorefrontError> {
        let Some(session) = self.inner.auth.restore().await? else {
            return Ok(None);
        };
        Ok(Some(self.after_sign_in(session).await))
    }

    /// Register a new account and sign in.
    #[instrument(skip(self, password, first_name, last_name))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Result<LoginOutcome, StorefrontError> {
        let session = self
            .inner
            .auth
            .register(email, password, first_name, last_name)
            .await?;
        Ok(self.after_sign_in(session).await)
    }

    /// Sign in with email and password.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, StorefrontError> {
        let session = self.inner.auth.login(email, password).await?;
        Ok(self.after_sign_in(session).await)
    }

    /// Exchange an identity provider token for a session.
    #[instrument(skip(self, id_token))]
    pub async fn login_with_provider(
        &self,
        provider: AuthProvider,
        id_token: &str,
    ) -> Result<LoginOutcome, StorefrontError> {
        let session = self
            .inner
            .auth
            .login_with_provider(provider, id_token)
            .await?;
        Ok(self.after_sign_in(session).await)
    }

    /// Exchange a Google identity token for a session.
    pub async fn login_with_google(&self, id_token: &str) -> Result<LoginOutcome, StorefrontError> {
        self.login_with_provider(AuthProvider::Google, id_token)
            .await
    }

    /// Redeem a phone code and sign in.
    #[instrument(skip(self, code))]
    pub async fn confirm_phone_code(
        &self,
        number: &str,
        code: &str,
    ) -> Result<LoginOutcome, StorefrontError> {
        let session = self.inner.auth.confirm_phone_code(number, code).await?;
        Ok(self.after_sign_in(session).await)
    }

    /// Redeem an email sign-in link and sign in.
    #[instrument(skip(self, link))]
    pub async fn confirm_email_link(
        &self,
        link: &str,
        address: Option<&str>,
    ) -> Result<LoginOutcome, StorefrontError> {
        let session = self.inner.auth.confirm_email_link(link, address).await?;
        Ok(self.after_sign_in(session).await)
    }

    /// Sign out and drop every store back to guest mode.
    ///
    /// The account cart and wishlist stay on the server untouched.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), StorefrontError> {
        self.inner.auth.logout().await?;
        let cart = self.inner.cart.on_logout().await;
        let wishlist = self.inner.wishlist.on_logout().await;
        cart?;
        wishlist?;
        Ok(())
    }

    // =========================================================================
    // Cross-Store Operations
    // =========================================================================

    /// Re-attempt any merges that did not complete at sign-in.
    #[instrument(skip(self))]
    pub async fn retry_merges(&self) -> Result<(), StorefrontError> {
        self.inner.cart.retry_merge().await?;
        self.inner.wishlist.retry_merge().await?;
        Ok(())
    }

    /// Move a saved item into the cart.
    pub async fn move_to_cart(
        &self,
        key: &LineKey,
        quantity: u32,
    ) -> Result<Wishlist, StorefrontError> {
        Ok(self
            .inner
            .wishlist
            .move_to_cart(key, quantity, &self.inner.cart)
            .await?)
    }

    async fn after_sign_in(&self, session: Session) -> LoginOutcome {
        let cart_merge = match self
            .inner
            .cart
            .on_login(session.access_token.clone())
            .await
        {
            Ok(_) => None,
            Err(error) => {
                tracing::warn!(error = %error, "Cart did not merge cleanly after sign-in");
                Some(error)
            }
        };
        let wishlist_merge = match self
            .inner
            .wishlist
            .on_login(session.access_token.clone())
            .await
        {
            Ok(_) => None,
            Err(error) => {
                tracing::warn!(error = %error, "Wishlist did not merge cleanly after sign-in");
                Some(error)
            }
        };
        LoginOutcome {
            session,
            cart_merge,
            wishlist_merge,
        }
    }
}

impl std::fmt::Debug for Shopfront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shopfront").finish_non_exhaustive()
    }
}
