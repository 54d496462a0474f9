//! Integration tests for the Auric storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p auric-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_reconciliation` - Guest/account cart routing, merges, queuing
//! - `wishlist_flows` - Wishlist parity and move-to-cart
//! - `auth_flows` - Sign-in methods rippling through every store
//!
//! The [`FakeCommerce`] backend here stands in for the commerce API, so
//! whole flows run without a server. It serves a single customer
//! account and records every server call in order, which is what the
//! queuing tests assert against.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use auric_core::{CurrencyCode, CustomerId, Email, Money, PhoneNumber, ProductId, VariantId};
use auric_storefront::Shopfront;
use auric_storefront::api::{
    ApiError, AuthBackend, CartGateway, CartItemInput, RegisterInput, TokenGrant, WishlistGateway,
    WishlistItemInput,
};
use auric_storefront::models::{
    Cart, CartLine, CustomerProfile, LineKey, ProfileUpdate, Wishlist, WishlistItem,
};
use auric_storefront::pricing::{PricingRules, StaticCouponCodes};
use auric_storefront::services::{AuthBridge, CartService, StubBotCheck, WishlistService};
use auric_storefront::shop::ShopfrontParts;
use auric_storefront::storage::Storage;
use auric_storefront::stores::{LocalCartStore, LocalWishlistStore, SessionStore};

/// The one registered account's email.
pub const EMAIL: &str = "shopper@example.com";
/// The one registered account's password.
pub const PASSWORD: &str = "correct-horse-battery";
/// The phone number codes get sent to.
pub const PHONE: &str = "+14155550123";
/// The code [`FakeCommerce`] accepts.
pub const PHONE_CODE: &str = "123456";
/// The sign-in link [`FakeCommerce`] accepts.
pub const EMAIL_LINK: &str = "https://shop.example/finish?code=ok";
/// The access token every grant carries.
pub const ACCESS_TOKEN: &str = "access-token";

/// Catalog price used for products without an explicit entry.
const DEFAULT_CATALOG_PRICE: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// In-memory stand-in for the commerce API.
///
/// Implements all three backend traits the way the production client
/// does. The account cart and wishlist live behind mutexes; tests can
/// seed them, inject failures, and inspect the calls made.
#[derive(Default)]
pub struct FakeCommerce {
    cart: Mutex<Cart>,
    wishlist: Mutex<Wishlist>,
    catalog: Mutex<HashMap<String, Decimal>>,
    calls: Mutex<Vec<String>>,
    fail_cart_adds: Mutex<HashSet<String>>,
    fail_wishlist_removes: AtomicBool,
    rate_limited: AtomicBool,
    fetch_delay: Mutex<Option<Duration>>,
}

impl FakeCommerce {
    /// Every server call made so far, in issuance order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.lock(&self.calls).clone()
    }

    /// The cart as the server currently holds it.
    #[must_use]
    pub fn server_cart(&self) -> Cart {
        self.lock(&self.cart).clone()
    }

    /// The wishlist as the server currently holds it.
    #[must_use]
    pub fn server_wishlist(&self) -> Wishlist {
        self.lock(&self.wishlist).clone()
    }

    /// Put a line in the account cart, priced from the catalog.
    pub fn seed_cart(&self, product: &str, quantity: u32) {
        let price = self.catalog_price(product);
        self.lock(&self.cart).lines.push(CartLine {
            product_id: ProductId::new(product),
            variant_id: None,
            name: product.to_owned(),
            unit_price: price,
            quantity,
            image: None,
        });
    }

    /// Put an item in the account wishlist, priced from the catalog.
    pub fn seed_wishlist(&self, product: &str) {
        let price = self.catalog_price(product);
        self.lock(&self.wishlist).items.push(WishlistItem {
            product_id: ProductId::new(product),
            variant_id: None,
            name: product.to_owned(),
            price,
            image: None,
            note: None,
        });
    }

    /// Set the server-side catalog price for a product.
    pub fn set_catalog_price(&self, product: &str, amount: Decimal) {
        self.lock(&self.catalog).insert(product.to_owned(), amount);
    }

    /// Make cart adds for this product fail with a validation error.
    pub fn fail_adds_for(&self, product: &str) {
        self.lock(&self.fail_cart_adds).insert(product.to_owned());
    }

    /// Let all cart adds succeed again.
    pub fn clear_add_failures(&self) {
        self.lock(&self.fail_cart_adds).clear();
    }

    /// Make wishlist removals fail with a server error.
    pub fn set_fail_wishlist_removes(&self, fail: bool) {
        self.fail_wishlist_removes.store(fail, Ordering::SeqCst);
    }

    /// Answer every cart mutation with 429, retry after 30 seconds.
    pub fn set_rate_limited(&self, limited: bool) {
        self.rate_limited.store(limited, Ordering::SeqCst);
    }

    /// Stall cart and wishlist fetches, so tests can observe what
    /// happens while a merge is in flight.
    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.lock(&self.fetch_delay) = Some(delay);
    }

    fn lock<'a, T>(&self, mutex: &'a Mutex<T>) -> std::sync::MutexGuard<'a, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: String) {
        self.lock(&self.calls).push(call);
    }

    fn catalog_price(&self, product: &str) -> Money {
        let amount = self
            .lock(&self.catalog)
            .get(product)
            .copied()
            .unwrap_or(DEFAULT_CATALOG_PRICE);
        Money::new(amount, CurrencyCode::USD)
    }

    async fn stall(&self) {
        let delay = *self.lock(&self.fetch_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_token(access_token: &str) -> Result<(), ApiError> {
        if access_token == ACCESS_TOKEN {
            Ok(())
        } else {
            Err(ApiError::AuthRequired("invalid access token".to_owned()))
        }
    }

    fn check_rate_limit(&self) -> Result<(), ApiError> {
        if self.rate_limited.load(Ordering::SeqCst) {
            Err(ApiError::RateLimited(30))
        } else {
            Ok(())
        }
    }

    fn grant() -> TokenGrant {
        TokenGrant {
            customer_id: CustomerId::new("cust_1"),
            access_token: ACCESS_TOKEN.to_owned(),
            refresh_token: Some("refresh-token".to_owned()),
            expires_in: Some(3600),
        }
    }

    fn profile() -> CustomerProfile {
        CustomerProfile {
            id: CustomerId::new("cust_1"),
            email: Email::parse(EMAIL).ok(),
            phone: None,
            first_name: Some("Ada".to_owned()),
            last_name: Some("Lovelace".to_owned()),
            accepts_marketing: false,
        }
    }
}

#[async_trait]
impl CartGateway for FakeCommerce {
    async fn fetch_cart(&self, access_token: &str) -> Result<Cart, ApiError> {
        Self::check_token(access_token)?;
        self.record("cart.fetch".to_owned());
        self.stall().await;
        Ok(self.server_cart())
    }

    async fn add_item(&self, access_token: &str, item: &CartItemInput) -> Result<Cart, ApiError> {
        Self::check_token(access_token)?;
        self.check_rate_limit()?;
        self.record(format!("cart.add {}", item.product_id));
        if self.lock(&self.fail_cart_adds).contains(item.product_id.as_str()) {
            return Err(ApiError::Validation(format!(
                "product {} cannot be added",
                item.product_id
            )));
        }
        let price = self.catalog_price(item.product_id.as_str());
        let key = LineKey::new(item.product_id.clone(), item.variant_id.clone());
        let mut cart = self.lock(&self.cart);
        match cart.find_mut(&key) {
            Some(line) => line.quantity += item.quantity,
            None => cart.lines.push(CartLine {
                product_id: item.product_id.clone(),
                variant_id: item.variant_id.clone(),
                name: item.product_id.as_str().to_owned(),
                unit_price: price,
                quantity: item.quantity,
                image: None,
            }),
        }
        Ok(cart.clone())
    }

    async fn update_item(
        &self,
        access_token: &str,
        key: &LineKey,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        Self::check_token(access_token)?;
        self.check_rate_limit()?;
        self.record(format!("cart.update {key}={quantity}"));
        let mut cart = self.lock(&self.cart);
        match cart.find_mut(key) {
            Some(line) => {
                line.quantity = quantity;
                Ok(cart.clone())
            }
            None => Err(ApiError::NotFound(format!("no cart line {key}"))),
        }
    }

    async fn remove_item(&self, access_token: &str, key: &LineKey) -> Result<Cart, ApiError> {
        Self::check_token(access_token)?;
        self.check_rate_limit()?;
        self.record(format!("cart.remove {key}"));
        let mut cart = self.lock(&self.cart);
        let before = cart.lines.len();
        cart.lines.retain(|line| line.key() != *key);
        if cart.lines.len() == before {
            return Err(ApiError::NotFound(format!("no cart line {key}")));
        }
        Ok(cart.clone())
    }
}

#[async_trait]
impl WishlistGateway for FakeCommerce {
    async fn fetch_wishlist(&self, access_token: &str) -> Result<Wishlist, ApiError> {
        Self::check_token(access_token)?;
        self.record("wishlist.fetch".to_owned());
        self.stall().await;
        Ok(self.server_wishlist())
    }

    async fn add_item(
        &self,
        access_token: &str,
        item: &WishlistItemInput,
    ) -> Result<Wishlist, ApiError> {
        Self::check_token(access_token)?;
        self.record(format!("wishlist.add {}", item.product_id));
        let price = self.catalog_price(item.product_id.as_str());
        let key = LineKey::new(item.product_id.clone(), item.variant_id.clone());
        let mut wishlist = self.lock(&self.wishlist);
        if !wishlist.contains(&key) {
            wishlist.items.push(WishlistItem {
                product_id: item.product_id.clone(),
                variant_id: item.variant_id.clone(),
                name: item.product_id.as_str().to_owned(),
                price,
                image: None,
                note: item.note.clone(),
            });
        }
        Ok(wishlist.clone())
    }

    async fn remove_item(&self, access_token: &str, key: &LineKey) -> Result<Wishlist, ApiError> {
        Self::check_token(access_token)?;
        self.record(format!("wishlist.remove {key}"));
        if self.fail_wishlist_removes.load(Ordering::SeqCst) {
            return Err(ApiError::Server {
                status: 500,
                message: "wishlist unavailable".to_owned(),
            });
        }
        let mut wishlist = self.lock(&self.wishlist);
        wishlist.items.retain(|item| item.key() != *key);
        Ok(wishlist.clone())
    }
}

#[async_trait]
impl AuthBackend for FakeCommerce {
    async fn register(&self, input: &RegisterInput) -> Result<TokenGrant, ApiError> {
        self.record("auth.register".to_owned());
        if input.email.as_str() == "taken@example.com" {
            return Err(ApiError::Conflict("email already registered".to_owned()));
        }
        Ok(Self::grant())
    }

    async fn login_password(&self, email: &Email, password: &str) -> Result<TokenGrant, ApiError> {
        self.record("auth.login".to_owned());
        if email.as_str() == EMAIL && password == PASSWORD {
            Ok(Self::grant())
        } else {
            Err(ApiError::AuthRequired("bad credentials".to_owned()))
        }
    }

    async fn verify_provider_token(
        &self,
        provider: &str,
        id_token: &str,
    ) -> Result<TokenGrant, ApiError> {
        self.record(format!("auth.provider {provider}"));
        if id_token == "good-token" {
            Ok(Self::grant())
        } else {
            Err(ApiError::AuthRequired("bad provider token".to_owned()))
        }
    }

    async fn send_phone_code(
        &self,
        phone: &PhoneNumber,
        _bot_check_token: &str,
    ) -> Result<(), ApiError> {
        self.record(format!("auth.send_phone_code {}", phone.as_str()));
        Ok(())
    }

    async fn verify_phone_code(
        &self,
        _phone: &PhoneNumber,
        code: &str,
    ) -> Result<TokenGrant, ApiError> {
        self.record("auth.verify_phone_code".to_owned());
        if code == PHONE_CODE {
            Ok(Self::grant())
        } else {
            Err(ApiError::Validation("wrong code".to_owned()))
        }
    }

    async fn send_email_link(&self, email: &Email, _continue_url: &str) -> Result<(), ApiError> {
        self.record(format!("auth.send_email_link {}", email.as_str()));
        Ok(())
    }

    async fn verify_email_link(&self, _email: &Email, link: &str) -> Result<TokenGrant, ApiError> {
        self.record("auth.verify_email_link".to_owned());
        if link == EMAIL_LINK {
            Ok(Self::grant())
        } else {
            Err(ApiError::Validation("bad link".to_owned()))
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, ApiError> {
        self.record("auth.refresh".to_owned());
        if refresh_token == "refresh-token" {
            Ok(Self::grant())
        } else {
            Err(ApiError::AuthRequired("bad refresh token".to_owned()))
        }
    }

    async fn revoke(&self, access_token: &str) -> Result<(), ApiError> {
        Self::check_token(access_token)?;
        self.record("auth.revoke".to_owned());
        Ok(())
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<CustomerProfile, ApiError> {
        Self::check_token(access_token)?;
        self.record("auth.fetch_profile".to_owned());
        Ok(Self::profile())
    }

    async fn update_profile(
        &self,
        access_token: &str,
        update: &ProfileUpdate,
    ) -> Result<CustomerProfile, ApiError> {
        Self::check_token(access_token)?;
        self.record("auth.update_profile".to_owned());
        let mut profile = Self::profile();
        if let Some(first_name) = &update.first_name {
            profile.first_name = Some(first_name.clone());
        }
        if let Some(last_name) = &update.last_name {
            profile.last_name = Some(last_name.clone());
        }
        Ok(profile)
    }

    async fn request_password_reset(&self, email: &Email) -> Result<(), ApiError> {
        self.record(format!("auth.request_password_reset {}", email.as_str()));
        Ok(())
    }

    async fn confirm_password_reset(
        &self,
        _code: &str,
        _new_password: &str,
    ) -> Result<(), ApiError> {
        self.record("auth.confirm_password_reset".to_owned());
        Ok(())
    }
}

/// A fully wired storefront over in-memory storage and [`FakeCommerce`].
pub struct TestShop {
    /// The assembled storefront under test.
    pub shop: Shopfront,
    /// The backend it talks to.
    pub commerce: Arc<FakeCommerce>,
    /// The storage it persists into.
    pub storage: Storage,
}

impl TestShop {
    /// A fresh storefront with empty storage and an empty account.
    #[must_use]
    pub fn new() -> Self {
        Self::over(Storage::in_memory(), Arc::new(FakeCommerce::default()))
    }

    /// Wire a storefront over existing storage and backend, the way an
    /// app relaunch would.
    #[must_use]
    pub fn over(storage: Storage, commerce: Arc<FakeCommerce>) -> Self {
        let auth = AuthBridge::new(
            commerce.clone(),
            Arc::new(StubBotCheck),
            SessionStore::new(storage.clone()),
            "https://shop.example/finish",
        );
        let cart = CartService::new(
            LocalCartStore::new(storage.clone()),
            commerce.clone(),
            Arc::new(StaticCouponCodes::default()),
            PricingRules::default(),
        );
        let wishlist =
            WishlistService::new(LocalWishlistStore::new(storage.clone()), commerce.clone());

        Self {
            shop: Shopfront::from_parts(ShopfrontParts {
                auth,
                cart,
                wishlist,
            }),
            commerce,
            storage,
        }
    }

    /// Relaunch: same storage and backend, fresh in-memory services.
    #[must_use]
    pub fn relaunch(&self) -> Self {
        Self::over(self.storage.clone(), self.commerce.clone())
    }
}

impl Default for TestShop {
    fn default() -> Self {
        Self::new()
    }
}

/// A guest cart line with a display-hint price of 100.
#[must_use]
pub fn line(product: &str, quantity: u32) -> CartLine {
    priced_line(product, quantity, DEFAULT_CATALOG_PRICE)
}

/// A guest cart line with an explicit display-hint price.
#[must_use]
pub fn priced_line(product: &str, quantity: u32, amount: Decimal) -> CartLine {
    CartLine {
        product_id: ProductId::new(product),
        variant_id: None,
        name: product.to_owned(),
        unit_price: Money::new(amount, CurrencyCode::USD),
        quantity,
        image: None,
    }
}

/// A guest wishlist item priced at 100.
#[must_use]
pub fn saved_item(product: &str) -> WishlistItem {
    WishlistItem {
        product_id: ProductId::new(product),
        variant_id: None,
        name: product.to_owned(),
        price: Money::new(DEFAULT_CATALOG_PRICE, CurrencyCode::USD),
        image: None,
        note: None,
    }
}

/// The key for a product without a variant.
#[must_use]
pub fn key(product: &str) -> LineKey {
    LineKey::new(product, None)
}

/// The key for a product variant.
#[must_use]
pub fn variant_key(product: &str, variant: &str) -> LineKey {
    LineKey::new(product, Some(VariantId::new(variant)))
}
