//! Auth contract: signup, login, profile, password change, deactivation.
//!
//! Requires a running API server with a migrated database.

use serde_json::{Value, json};
use souq_integration_tests::TestContext;

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_signup_then_login() {
    let ctx = TestContext::new();
    let (email, _) = ctx.signup_customer().await;

    let resp = ctx
        .client
        .post(ctx.url("/auth/login"))
        .json(&json!({"email": email, "password": "correct-horse-battery"}))
        .send()
        .await
        .expect("login failed");
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.expect("JSON body");
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["email"], email);
    assert_eq!(body["user"]["role"], "customer");
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_login_wrong_password_is_401() {
    let ctx = TestContext::new();
    let (email, _) = ctx.signup_customer().await;

    let resp = ctx
        .client
        .post(ctx.url("/auth/login"))
        .json(&json!({"email": email, "password": "not-the-password"}))
        .send()
        .await
        .expect("login failed");
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_duplicate_signup_conflicts() {
    let ctx = TestContext::new();
    let (email, _) = ctx.signup_customer().await;

    let resp = ctx
        .client
        .post(ctx.url("/auth/signup"))
        .json(&json!({
            "name": "Impostor",
            "email": email,
            "password": "another-password-1",
        }))
        .send()
        .await
        .expect("signup failed");
    assert_eq!(resp.status(), 409);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_me_reflects_profile_updates() {
    let ctx = TestContext::new();
    let (email, token) = ctx.signup_customer().await;

    let me: Value = ctx
        .client
        .get(ctx.url("/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("me failed")
        .json()
        .await
        .expect("JSON body");
    assert_eq!(me["email"], email);

    let resp = ctx
        .client
        .put(ctx.url("/auth/me"))
        .bearer_auth(&token)
        .json(&json!({"name": "Renamed Shopper"}))
        .send()
        .await
        .expect("update failed");
    assert_eq!(resp.status(), 200);

    let me: Value = ctx
        .client
        .get(ctx.url("/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("me failed")
        .json()
        .await
        .expect("JSON body");
    assert_eq!(me["name"], "Renamed Shopper");
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_change_password_invalidates_old_token() {
    let ctx = TestContext::new();
    let (_, token) = ctx.signup_customer().await;

    let resp = ctx
        .client
        .put(ctx.url("/auth/change-password"))
        .bearer_auth(&token)
        .json(&json!({
            "current_password": "correct-horse-battery",
            "new_password": "fresh-horse-battery",
        }))
        .send()
        .await
        .expect("change failed");
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.expect("JSON body");
    let fresh = body["token"].as_str().expect("fresh token");

    // The old token predates password_changed_at and is rejected.
    let resp = ctx
        .client
        .get(ctx.url("/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("me failed");
    assert_eq!(resp.status(), 401);

    // The fresh one works.
    let resp = ctx
        .client
        .get(ctx.url("/auth/me"))
        .bearer_auth(fresh)
        .send()
        .await
        .expect("me failed");
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_deactivated_account_cannot_login() {
    let ctx = TestContext::new();
    let (email, token) = ctx.signup_customer().await;

    let resp = ctx
        .client
        .delete(ctx.url("/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("deactivate failed");
    assert_eq!(resp.status(), 204);

    let resp = ctx
        .client
        .post(ctx.url("/auth/login"))
        .json(&json!({"email": email, "password": "correct-horse-battery"}))
        .send()
        .await
        .expect("login failed");
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_forgot_password_never_leaks_accounts() {
    let ctx = TestContext::new();

    // Same acknowledgement whether or not the account exists.
    let resp = ctx
        .client
        .post(ctx.url("/auth/forgot-password"))
        .json(&json!({"email": "nobody@test.souq.example"}))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), 200);
}
