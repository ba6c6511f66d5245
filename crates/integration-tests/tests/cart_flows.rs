//! Guest carts, session persistence, debounced sync, and the sign-in
//! reconciliation flows.

use std::sync::Arc;

use truewave_client::backend::CartRepository;
use truewave_client::store::{Action, CartAction};
use truewave_core::{Email, UserId};

use truewave_integration_tests::{product, TestContext};

fn email(addr: &str) -> Email {
    Email::parse(addr).unwrap()
}

#[tokio::test]
async fn test_guest_cart_survives_a_reload() {
    let ctx = TestContext::new();
    ctx.app
        .store()
        .dispatch(Action::Cart(CartAction::Add(product("a", 2499))));
    ctx.app
        .store()
        .dispatch(Action::Cart(CartAction::Add(product("a", 2499))));

    // A new app over the same session slot is a page reload
    let reloaded = TestContext::with_slot(Arc::clone(&ctx.slot));
    let cart = reloaded.app.store().state().cart.cart;
    assert_eq!(cart.item_count(), 2);
    assert_eq!(cart.len(), 1);
}

#[tokio::test]
async fn test_signed_in_mutations_collapse_into_remote_mirror() {
    let ctx = TestContext::new();
    let user = ctx
        .app
        .auth()
        .register(&email("shopper@example.com"), "hunter22", None)
        .await
        .unwrap();
    ctx.wait_for(|state| state.auth.is_authenticated()).await;

    ctx.app
        .store()
        .dispatch(Action::Cart(CartAction::Add(product("a", 2499))));
    ctx.app
        .store()
        .dispatch(Action::Cart(CartAction::Add(product("a", 2499))));
    ctx.app
        .store()
        .dispatch(Action::Cart(CartAction::Add(product("b", 999))));
    ctx.settle().await;

    let remote = CartRepository::get(&ctx.backend, &user.id)
        .await
        .unwrap()
        .expect("mirror should exist after the debounce");
    assert_eq!(remote.item_count(), 3);
    assert_eq!(remote.len(), 2);
}

#[tokio::test]
async fn test_sign_in_merges_guest_cart_with_account_cart() {
    let ctx = TestContext::new();
    let account = email("shopper@example.com");

    // First session: build up the account cart a:1, b:3
    ctx.app
        .auth()
        .register(&account, "hunter22", None)
        .await
        .unwrap();
    ctx.wait_for(|state| state.auth.is_authenticated()).await;
    ctx.app
        .store()
        .dispatch(Action::Cart(CartAction::Add(product("a", 1000))));
    for _ in 0..3 {
        ctx.app
            .store()
            .dispatch(Action::Cart(CartAction::Add(product("b", 500))));
    }
    ctx.settle().await;

    ctx.app.auth().logout().await.unwrap();
    ctx.wait_for(|state| !state.auth.is_authenticated()).await;
    assert!(ctx.app.store().state().cart.cart.is_empty());

    // Guest adds a:2, then signs back in
    ctx.app
        .store()
        .dispatch(Action::Cart(CartAction::Add(product("a", 1000))));
    ctx.app
        .store()
        .dispatch(Action::Cart(CartAction::Add(product("a", 1000))));

    let user = ctx.app.auth().login(&account, "hunter22").await.unwrap();
    ctx.wait_for(|state| state.auth.is_authenticated() && state.cart.cart.len() == 2)
        .await;

    let lines: Vec<(String, u32)> = ctx
        .app
        .store()
        .state()
        .cart
        .cart
        .items()
        .iter()
        .map(|i| (i.product.id.to_string(), i.quantity))
        .collect();
    assert_eq!(lines, [("a".to_string(), 3), ("b".to_string(), 3)]);

    // The merged cart was written back
    let remote = CartRepository::get(&ctx.backend, &user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(remote.item_count(), 6);

    // The guest slot was consumed by the merge
    assert!(ctx.slot.raw().is_none());
}

#[tokio::test]
async fn test_sign_out_clears_locally_but_keeps_the_mirror() {
    let ctx = TestContext::new();
    let user = ctx
        .app
        .auth()
        .register(&email("shopper@example.com"), "hunter22", None)
        .await
        .unwrap();
    ctx.wait_for(|state| state.auth.is_authenticated()).await;

    ctx.app
        .store()
        .dispatch(Action::Cart(CartAction::Add(product("a", 1000))));
    ctx.settle().await;
    assert_eq!(ctx.backend.cart_document_count(), 1);

    ctx.app.auth().logout().await.unwrap();
    ctx.wait_for(|state| !state.auth.is_authenticated()).await;

    assert!(ctx.app.store().state().cart.cart.is_empty());
    assert!(CartRepository::get(&ctx.backend, &user.id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_explicit_clear_erases_the_mirror() {
    let ctx = TestContext::new();
    let user = ctx
        .app
        .auth()
        .register(&email("shopper@example.com"), "hunter22", None)
        .await
        .unwrap();
    ctx.wait_for(|state| state.auth.is_authenticated()).await;

    ctx.app
        .store()
        .dispatch(Action::Cart(CartAction::Add(product("a", 1000))));
    ctx.settle().await;
    assert_eq!(ctx.backend.cart_document_count(), 1);

    ctx.app.store().dispatch(Action::Cart(CartAction::Clear));
    ctx.settle().await;

    assert_eq!(ctx.backend.cart_document_count(), 0);
    assert!(CartRepository::get(&ctx.backend, &user.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_guest_carts_never_reach_the_backend() {
    let ctx = TestContext::new();

    ctx.app
        .store()
        .dispatch(Action::Cart(CartAction::Add(product("a", 1000))));
    ctx.settle().await;

    assert_eq!(ctx.backend.cart_document_count(), 0);
    assert!(CartRepository::get(&ctx.backend, &UserId::new("anyone"))
        .await
        .unwrap()
        .is_none());
}
