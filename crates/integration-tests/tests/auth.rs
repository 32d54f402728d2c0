//! Registration, login and role checks.

#![allow(clippy::unwrap_used)]

use bazaar_integration_tests::{PASSWORD, TestContext};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test(flavor = "multi_thread")]
async fn test_register_login_logout() {
    let ctx = TestContext::new().await;
    let client = ctx.client();

    let resp = client
        .post(ctx.url("/auth/register"))
        .json(&json!({
            "email": "Shopper@Example.com",
            "password": PASSWORD,
            "displayName": "Shopper"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let user: Value = resp.json().await.unwrap();
    assert_eq!(user["role"], "customer");
    assert_eq!(user["email"], "shopper@example.com");

    // Registration logs the account in
    let me: Value = client
        .get(ctx.url("/auth/me"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["id"], user["id"]);

    let resp = client.post(ctx.url("/auth/logout")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client.get(ctx.url("/auth/me")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let client = ctx.login("shopper@example.com").await;
    let resp = client.get(ctx.url("/auth/me")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_registration_errors() {
    let ctx = TestContext::new().await;
    let client = ctx.client();
    let register = |body: Value| {
        let client = client.clone();
        let url = ctx.url("/auth/register");
        async move { client.post(url).json(&body).send().await.unwrap().status() }
    };

    assert_eq!(
        register(json!({"email": "a@b.co", "password": PASSWORD, "displayName": "A"})).await,
        StatusCode::CREATED
    );
    assert_eq!(
        register(json!({"email": "A@B.co", "password": PASSWORD, "displayName": "A"})).await,
        StatusCode::CONFLICT
    );
    assert_eq!(
        register(json!({"email": "c@d.co", "password": "short", "displayName": "C"})).await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        register(json!({"email": "not-an-email", "password": PASSWORD, "displayName": "N"}))
            .await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        register(json!({
            "email": "root@b.co",
            "password": PASSWORD,
            "displayName": "Root",
            "role": "admin"
        }))
        .await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_wrong_password_rejected() {
    let ctx = TestContext::new().await;
    ctx.register("merchant@bazaar.test", "merchant").await;

    let resp = ctx
        .client()
        .post(ctx.url("/auth/login"))
        .json(&json!({"email": "merchant@bazaar.test", "password": "wrong-password"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_role_guards() {
    let ctx = TestContext::new().await;
    let anonymous = ctx.client();
    let customer = ctx.register("customer@bazaar.test", "customer").await;
    let merchant = ctx.register("merchant@bazaar.test", "merchant").await;

    let resp = anonymous
        .get(ctx.url("/api/merchant/store"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = customer
        .get(ctx.url("/api/merchant/store"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = merchant
        .get(ctx.url("/api/admin/applications"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Merchant without an approved application has no store yet
    let resp = merchant
        .get(ctx.url("/api/merchant/store"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
