//! Integration tests for cart reconciliation.
//!
//! These drive the assembled storefront against the in-memory commerce
//! backend: guest routing, the sign-in merge, operation queuing, and
//! sign-out.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use rust_decimal::Decimal;

use auric_core::{ErrorKind, OpStatus};
use auric_integration_tests::{EMAIL, PASSWORD, TestShop, key, line, priced_line};
use auric_storefront::services::{CartError, StoreAuthority};

// =============================================================================
// Guest Routing
// =============================================================================

#[tokio::test]
async fn test_guest_mutations_stay_local_and_persist() {
    let t = TestShop::new();
    t.shop.cart().add_item(line("ring", 2)).await.unwrap();
    t.shop.cart().update_quantity(&key("ring"), 3).await.unwrap();
    t.shop.cart().add_item(line("pendant", 1)).await.unwrap();
    t.shop.cart().remove_item(&key("pendant")).await.unwrap();

    // Nothing reached the server.
    assert!(t.commerce.calls().is_empty());

    // A relaunch reads the same guest cart back from storage.
    let relaunched = t.relaunch();
    let cart = relaunched.shop.cart().cart().await.unwrap();
    assert_eq!(cart.total_quantity(), 3);
    assert_eq!(relaunched.shop.cart().authority(), StoreAuthority::Guest);
}

#[tokio::test]
async fn test_update_quantity_is_idempotent() {
    let t = TestShop::new();
    t.shop.cart().add_item(line("ring", 1)).await.unwrap();

    let once = t.shop.cart().update_quantity(&key("ring"), 4).await.unwrap();
    let twice = t.shop.cart().update_quantity(&key("ring"), 4).await.unwrap();

    assert_eq!(once, twice);
    assert_eq!(twice.find(&key("ring")).unwrap().quantity, 4);
}

// =============================================================================
// Sign-In Merge
// =============================================================================

#[tokio::test]
async fn test_sign_in_merge_prefers_server_quantities() {
    let t = TestShop::new();
    t.commerce.seed_cart("a", 5);
    t.shop.cart().add_item(line("a", 2)).await.unwrap();
    t.shop.cart().add_item(line("b", 1)).await.unwrap();

    let outcome = t.shop.login(EMAIL, PASSWORD).await.unwrap();
    assert!(outcome.is_clean());

    // Server quantity wins for a; b arrives from the guest cart.
    let cart = t.shop.cart().cart().await.unwrap();
    assert_eq!(cart.find(&key("a")).unwrap().quantity, 5);
    assert_eq!(cart.find(&key("b")).unwrap().quantity, 1);

    // Only the missing line was pushed.
    let cart_calls: Vec<_> = t
        .commerce
        .calls()
        .into_iter()
        .filter(|call| call.starts_with("cart."))
        .collect();
    assert_eq!(cart_calls, ["cart.fetch", "cart.add b"]);

    // The guest copy is empty afterwards.
    let relaunched = t.relaunch();
    assert!(relaunched.shop.cart().cart().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_remote_catalog_price_replaces_guest_hint() {
    let t = TestShop::new();
    t.commerce.set_catalog_price("ring", Decimal::new(1299, 0));
    t.shop
        .cart()
        .add_item(priced_line("ring", 1, Decimal::new(999, 0)))
        .await
        .unwrap();

    t.shop.login(EMAIL, PASSWORD).await.unwrap();

    let cart = t.shop.cart().cart().await.unwrap();
    assert_eq!(
        cart.find(&key("ring")).unwrap().unit_price.amount,
        Decimal::new(1299, 0)
    );
}

#[tokio::test]
async fn test_partial_merge_keeps_failed_lines_for_retry() {
    let t = TestShop::new();
    t.shop.cart().add_item(line("a", 2)).await.unwrap();
    t.shop.cart().add_item(line("b", 1)).await.unwrap();
    t.commerce.fail_adds_for("b");

    // The sign-in itself succeeds; the incomplete merge is reported.
    let outcome = t.shop.login(EMAIL, PASSWORD).await.unwrap();
    let merge_error = outcome.cart_merge.unwrap();
    assert!(matches!(
        merge_error,
        CartError::MergeIncomplete { failed: 1, total: 2, .. }
    ));
    assert!(t.shop.auth().current_session().await.is_some());
    assert_eq!(t.shop.cart().authority(), StoreAuthority::Authenticated);

    // a reached the account; b stayed behind locally.
    assert!(t.commerce.server_cart().contains(&key("a")));
    assert!(!t.commerce.server_cart().contains(&key("b")));

    t.commerce.clear_add_failures();
    t.shop.retry_merges().await.unwrap();

    assert!(t.commerce.server_cart().contains(&key("b")));
    let relaunched = t.relaunch();
    assert!(relaunched.shop.cart().cart().await.unwrap().is_empty());
}

// =============================================================================
// Operation Queuing
// =============================================================================

#[tokio::test]
async fn test_back_to_back_updates_resolve_in_issuance_order() {
    let t = TestShop::new();
    t.shop.login(EMAIL, PASSWORD).await.unwrap();
    t.shop.cart().add_item(line("ring", 1)).await.unwrap();

    let (first, second) = tokio::join!(
        t.shop.cart().update_quantity(&key("ring"), 2),
        t.shop.cart().update_quantity(&key("ring"), 7),
    );
    first.unwrap();
    second.unwrap();

    // The server saw both, in order, and the second one sticks.
    let updates: Vec<_> = t
        .commerce
        .calls()
        .into_iter()
        .filter(|call| call.starts_with("cart.update"))
        .collect();
    assert_eq!(updates, ["cart.update ring=2", "cart.update ring=7"]);
    let cart = t.shop.cart().cart().await.unwrap();
    assert_eq!(cart.find(&key("ring")).unwrap().quantity, 7);
}

#[tokio::test(start_paused = true)]
async fn test_mutation_issued_during_merge_waits_behind_it() {
    let t = TestShop::new();
    t.shop.cart().add_item(line("ring", 1)).await.unwrap();
    t.commerce.set_fetch_delay(Duration::from_millis(500));

    let login_shop = t.shop.clone();
    let login = tokio::spawn(async move { login_shop.login(EMAIL, PASSWORD).await });
    tokio::task::yield_now().await;

    // The merge is mid-fetch and holds the cart.
    assert_eq!(t.shop.cart().authority(), StoreAuthority::Authenticating);
    assert_eq!(t.shop.cart().last_operation(), OpStatus::Pending);

    // This add was issued during the merge; it must land after it.
    let cart = t.shop.cart().add_item(line("pendant", 1)).await.unwrap();
    assert!(cart.contains(&key("pendant")));
    assert!(login.await.unwrap().unwrap().is_clean());

    let cart_calls: Vec<_> = t
        .commerce
        .calls()
        .into_iter()
        .filter(|call| call.starts_with("cart."))
        .collect();
    assert_eq!(cart_calls, ["cart.fetch", "cart.add ring", "cart.add pendant"]);
    assert_eq!(t.shop.cart().authority(), StoreAuthority::Authenticated);
}

#[tokio::test]
async fn test_abandoned_mutation_still_applies() {
    let t = TestShop::new();
    let cart_service = t.shop.cart().clone();

    // Fire the mutation and walk away from the handle, like a view
    // being torn down mid-request.
    drop(tokio::spawn(async move {
        cart_service.add_item(line("ring", 2)).await
    }));

    for _ in 0..100 {
        if !t.shop.cart().cart().await.unwrap().is_empty() {
            break;
        }
        tokio::task::yield_now().await;
    }

    let cart = t.shop.cart().cart().await.unwrap();
    assert_eq!(cart.find(&key("ring")).unwrap().quantity, 2);
}

// =============================================================================
// Failure Surfacing
// =============================================================================

#[tokio::test]
async fn test_rate_limited_mutation_reports_retry_after() {
    let t = TestShop::new();
    t.shop.login(EMAIL, PASSWORD).await.unwrap();
    t.commerce.set_rate_limited(true);

    let error = t.shop.cart().add_item(line("ring", 1)).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::RateLimited);
    assert!(error.to_string().contains("30"));
    assert_eq!(
        t.shop.cart().last_operation(),
        OpStatus::Failed(ErrorKind::RateLimited)
    );

    // Once the server relents, the same operation goes through.
    t.commerce.set_rate_limited(false);
    t.shop.cart().add_item(line("ring", 1)).await.unwrap();
    assert!(t.commerce.server_cart().contains(&key("ring")));
}

// =============================================================================
// Sign-Out
// =============================================================================

#[tokio::test]
async fn test_logout_drops_to_guest_and_keeps_server_cart() {
    let t = TestShop::new();
    t.shop.cart().add_item(line("ring", 1)).await.unwrap();
    t.shop.login(EMAIL, PASSWORD).await.unwrap();

    t.shop.logout().await.unwrap();

    assert_eq!(t.shop.cart().authority(), StoreAuthority::Guest);
    assert!(t.shop.cart().cart().await.unwrap().is_empty());
    assert!(t.shop.auth().current_session().await.is_none());

    // The account cart waits on the server for the next sign-in.
    assert!(t.commerce.server_cart().contains(&key("ring")));

    // Signing back in brings it down again.
    t.shop.login(EMAIL, PASSWORD).await.unwrap();
    let cart = t.shop.cart().cart().await.unwrap();
    assert_eq!(cart.find(&key("ring")).unwrap().quantity, 1);
}
