mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{ALICE, BOB, TestApp};
use ledgerline::config::AccessConfig;

#[tokio::test]
async fn requests_without_credentials_are_rejected() {
    let app = TestApp::spawn().await;
    for uri in [
        "/api/finance/accounts",
        "/api/finance/categories",
        "/api/finance/transactions",
        "/api/finance/budgets",
        "/api/finance/summary",
    ] {
        let (status, body) = app.send("GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    let (status, _) = app
        .send(
            "POST",
            "/api/finance/categories",
            None,
            Some(json!({"name": "Food"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.count_rows("categories").await, 0);

    let (status, _) = app.get("/api/finance/accounts", "not-a-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn lists_only_show_own_rows() {
    let app = TestApp::spawn().await;
    app.create("categories", ALICE, json!({"name": "Food"})).await;
    app.create("categories", BOB, json!({"name": "Food"})).await;
    app.create("categories", BOB, json!({"name": "Games"})).await;
    app.create("accounts", BOB, json!({"name": "Bob's bank"})).await;

    let (_, alice) = app.get("/api/finance/categories", ALICE).await;
    assert_eq!(alice.as_array().unwrap().len(), 1);
    let (_, bob) = app.get("/api/finance/categories", BOB).await;
    assert_eq!(bob.as_array().unwrap().len(), 2);
    let (_, accounts) = app.get("/api/finance/accounts", ALICE).await;
    assert_eq!(accounts, json!([]));
}

#[tokio::test]
async fn foreign_rows_look_missing() {
    let app = TestApp::spawn().await;
    let category = app.create("categories", ALICE, json!({"name": "Food"})).await;
    let account = app.create("accounts", ALICE, json!({"name": "Wallet"})).await;
    let tx = app
        .create(
            "transactions",
            ALICE,
            json!({"amount": "8.00", "occurred_at": "2025-08-01", "category": category}),
        )
        .await;
    let budget = app
        .create("budgets", ALICE, json!({"category": category, "limit": 10}))
        .await;

    for uri in [
        format!("/api/finance/categories/{category}"),
        format!("/api/finance/accounts/{account}"),
        format!("/api/finance/transactions/{tx}"),
        format!("/api/finance/budgets/{budget}"),
    ] {
        let (status, body) = app.get(&uri, BOB).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "GET {uri}");
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let (status, _) = app.patch(&uri, BOB, json!({"name": "Mine now"})).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "PATCH {uri}");

        let (status, _) = app.delete(&uri, BOB).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "DELETE {uri}");

        let (status, _) = app.get(&uri, ALICE).await;
        assert_eq!(status, StatusCode::OK, "owner GET {uri}");
    }

    let (_, body) = app
        .get(&format!("/api/finance/categories/{category}"), ALICE)
        .await;
    assert_eq!(body["name"], "Food");
}

#[tokio::test]
async fn missing_row_is_not_found_for_owner_too() {
    let app = TestApp::spawn().await;
    let (status, _) = app.get("/api/finance/transactions/4242", ALICE).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete("/api/finance/budgets/4242", ALICE).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn owner_in_body_is_ignored() {
    let app = TestApp::spawn().await;
    let bob_id = app
        .state
        .users
        .find_user("bob")
        .await
        .unwrap()
        .expect("bob is seeded")
        .id;

    let id = app
        .create(
            "categories",
            ALICE,
            json!({"name": "Food", "user": bob_id, "user_id": bob_id}),
        )
        .await;

    let (status, _) = app.get(&format!("/api/finance/categories/{id}"), BOB).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get(&format!("/api/finance/categories/{id}"), ALICE).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn cannot_reference_another_users_category_or_account() {
    let app = TestApp::spawn().await;
    let alice_food = app.create("categories", ALICE, json!({"name": "Food"})).await;
    let alice_wallet = app.create("accounts", ALICE, json!({"name": "Wallet"})).await;

    let (status, body) = app
        .post(
            "/api/finance/transactions",
            BOB,
            json!({"amount": "1", "occurred_at": "2025-08-01", "category": alice_food}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["fields"]["category"].is_array());

    let (status, body) = app
        .post(
            "/api/finance/transactions",
            BOB,
            json!({"amount": "1", "occurred_at": "2025-08-01", "account": alice_wallet}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["fields"]["account"].is_array());

    let (status, body) = app
        .post(
            "/api/finance/budgets",
            BOB,
            json!({"category": alice_food, "limit": 10}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["fields"]["category"].is_array());

    let bob_tx = app
        .create("transactions", BOB, json!({"amount": "1", "occurred_at": "2025-08-01"}))
        .await;
    let (status, _) = app
        .patch(
            &format!("/api/finance/transactions/{bob_tx}"),
            BOB,
            json!({"category": alice_food}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.count_rows("transactions").await, 1);
}

#[tokio::test]
async fn summary_only_counts_own_transactions() {
    let app = TestApp::spawn().await;
    app.create(
        "transactions",
        ALICE,
        json!({"amount": "40.00", "occurred_at": "2025-08-03"}),
    )
    .await;
    app.create(
        "transactions",
        BOB,
        json!({"amount": "2.00", "occurred_at": "2025-08-03"}),
    )
    .await;

    let (_, body) = app.get("/api/finance/summary?year=2025&month=8", BOB).await;
    assert_eq!(body["byCategory"], json!([{"categoryId": null, "categoryName": null, "total": 2.0}]));
    assert_eq!(body["byMonth"], json!([{"month": "2025-08", "total": 2.0}]));
}

#[tokio::test]
async fn removing_a_user_removes_everything_it_owns() {
    let app = TestApp::spawn().await;
    let food = app.create("categories", ALICE, json!({"name": "Food"})).await;
    let wallet = app.create("accounts", ALICE, json!({"name": "Wallet"})).await;
    app.create(
        "transactions",
        ALICE,
        json!({"amount": "1", "occurred_at": "2025-08-01", "category": food, "account": wallet}),
    )
    .await;
    app.create("budgets", ALICE, json!({"category": food, "limit": 10}))
        .await;
    app.create("categories", BOB, json!({"name": "Food"})).await;

    assert!(app.state.users.remove_user("alice").await.unwrap());
    assert!(!app.state.users.remove_user("alice").await.unwrap());

    assert_eq!(app.count_rows("accounts").await, 0);
    assert_eq!(app.count_rows("transactions").await, 0);
    assert_eq!(app.count_rows("budgets").await, 0);
    assert_eq!(app.count_rows("categories").await, 1);

    let (status, _) = app.get("/api/finance/categories", ALICE).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn anonymous_requests_map_to_configured_user_when_auth_is_optional() {
    let access = AccessConfig {
        require_auth: false,
        anonymous_user: Some("alice".to_string()),
        ..AccessConfig::default()
    };
    let app = TestApp::with_access(access).await;

    let (status, _) = app
        .send(
            "POST",
            "/api/finance/categories",
            None,
            Some(json!({"name": "Food"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app.get("/api/finance/categories", ALICE).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = app.get("/api/finance/categories", "bogus").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn reseeding_a_user_rotates_its_token() {
    let app = TestApp::spawn().await;
    app.state
        .users
        .ensure_user("alice", "alice-new-token")
        .await
        .unwrap();

    let (status, _) = app.get("/api/finance/accounts", ALICE).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.get("/api/finance/accounts", "alice-new-token").await;
    assert_eq!(status, StatusCode::OK);
}
