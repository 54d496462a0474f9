//! Integration tests for wishlist flows.
//!
//! Guest persistence, the sign-in merge, and the two-step move-to-cart
//! including its partial-failure contract.

#![allow(clippy::unwrap_used)]

use auric_core::ErrorKind;
use auric_integration_tests::{EMAIL, PASSWORD, TestShop, key, saved_item};
use auric_storefront::StorefrontError;
use auric_storefront::services::{StoreAuthority, WishlistError};

// =============================================================================
// Guest Routing
// =============================================================================

#[tokio::test]
async fn test_guest_wishlist_stays_local_and_persists() {
    let t = TestShop::new();
    t.shop.wishlist().add_item(saved_item("ring")).await.unwrap();
    t.shop.wishlist().add_item(saved_item("pendant")).await.unwrap();
    t.shop.wishlist().remove_item(&key("pendant")).await.unwrap();

    assert!(t.commerce.calls().is_empty());

    let relaunched = t.relaunch();
    let wishlist = relaunched.shop.wishlist().wishlist().await.unwrap();
    assert_eq!(wishlist.len(), 1);
    assert!(wishlist.contains(&key("ring")));
}

#[tokio::test]
async fn test_saving_an_item_twice_keeps_one_entry() {
    let t = TestShop::new();
    t.shop.wishlist().add_item(saved_item("ring")).await.unwrap();
    let wishlist = t.shop.wishlist().add_item(saved_item("ring")).await.unwrap();
    assert_eq!(wishlist.len(), 1);
}

// =============================================================================
// Sign-In Merge
// =============================================================================

#[tokio::test]
async fn test_sign_in_merges_guest_wishlist() {
    let t = TestShop::new();
    t.commerce.seed_wishlist("a");
    t.shop.wishlist().add_item(saved_item("a")).await.unwrap();
    t.shop.wishlist().add_item(saved_item("b")).await.unwrap();

    let outcome = t.shop.login(EMAIL, PASSWORD).await.unwrap();
    assert!(outcome.is_clean());
    assert_eq!(t.shop.wishlist().authority(), StoreAuthority::Authenticated);

    let wishlist = t.shop.wishlist().wishlist().await.unwrap();
    assert!(wishlist.contains(&key("a")));
    assert!(wishlist.contains(&key("b")));

    // Only the item the account had never seen was pushed.
    let wishlist_calls: Vec<_> = t
        .commerce
        .calls()
        .into_iter()
        .filter(|call| call.starts_with("wishlist."))
        .collect();
    assert_eq!(wishlist_calls, ["wishlist.fetch", "wishlist.add b"]);

    let relaunched = t.relaunch();
    assert!(relaunched.shop.wishlist().wishlist().await.unwrap().is_empty());
}

// =============================================================================
// Move To Cart
// =============================================================================

#[tokio::test]
async fn test_move_to_cart_for_guest_stays_local() {
    let t = TestShop::new();
    t.shop.wishlist().add_item(saved_item("ring")).await.unwrap();

    let wishlist = t.shop.move_to_cart(&key("ring"), 3).await.unwrap();

    assert!(wishlist.is_empty());
    let cart = t.shop.cart().cart().await.unwrap();
    assert_eq!(cart.find(&key("ring")).unwrap().quantity, 3);
    assert!(t.commerce.calls().is_empty());
}

#[tokio::test]
async fn test_move_to_cart_moves_item_for_customer() {
    let t = TestShop::new();
    t.shop.login(EMAIL, PASSWORD).await.unwrap();
    t.shop.wishlist().add_item(saved_item("ring")).await.unwrap();

    let wishlist = t.shop.move_to_cart(&key("ring"), 2).await.unwrap();

    assert!(!wishlist.contains(&key("ring")));
    assert!(!t.commerce.server_wishlist().contains(&key("ring")));
    let server_cart = t.commerce.server_cart();
    assert_eq!(server_cart.find(&key("ring")).unwrap().quantity, 2);
}

#[tokio::test]
async fn test_move_to_cart_failure_at_cart_step_leaves_wishlist_alone() {
    let t = TestShop::new();
    t.shop.login(EMAIL, PASSWORD).await.unwrap();
    t.shop.wishlist().add_item(saved_item("ring")).await.unwrap();
    t.commerce.fail_adds_for("ring");

    let error = t.shop.move_to_cart(&key("ring"), 1).await.unwrap_err();

    assert!(matches!(
        error,
        StorefrontError::Wishlist(WishlistError::CartAdd(_))
    ));
    assert_eq!(error.kind(), ErrorKind::Validation);
    // Nothing moved.
    assert!(t.commerce.server_wishlist().contains(&key("ring")));
    assert!(!t.commerce.server_cart().contains(&key("ring")));
}

#[tokio::test]
async fn test_move_to_cart_partial_failure_keeps_item_in_both_places() {
    let t = TestShop::new();
    t.shop.login(EMAIL, PASSWORD).await.unwrap();
    t.shop.wishlist().add_item(saved_item("ring")).await.unwrap();
    t.commerce.set_fail_wishlist_removes(true);

    let error = t.shop.move_to_cart(&key("ring"), 1).await.unwrap_err();

    // The add went through, the removal did not, and the caller is told.
    assert!(matches!(
        error,
        StorefrontError::Wishlist(WishlistError::PartialMove { .. })
    ));
    assert!(t.commerce.server_cart().contains(&key("ring")));
    assert!(t.commerce.server_wishlist().contains(&key("ring")));

    // Removing the leftover by hand succeeds once the backend recovers.
    t.commerce.set_fail_wishlist_removes(false);
    let wishlist = t.shop.wishlist().remove_item(&key("ring")).await.unwrap();
    assert!(wishlist.is_empty());
    assert!(!t.commerce.server_wishlist().contains(&key("ring")));
}
