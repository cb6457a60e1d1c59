//! Catalog contract: listings, pagination envelope, staff CRUD, and
//! soft-delete visibility.
//!
//! Requires a running API server with a migrated, seeded database and staff
//! credentials in the environment (see crate docs).

use serde_json::{Value, json};
use souq_integration_tests::TestContext;
use uuid::Uuid;

// ============================================================================
// Public reads
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_category_listing_envelope() {
    let ctx = TestContext::new();
    let resp = ctx
        .client
        .get(ctx.url("/categories?limit=2"))
        .send()
        .await
        .expect("list request failed");
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.expect("JSON body");
    assert!(body["data"].is_array());
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 2);
    assert!(body["total"].as_i64().expect("total") >= 0);
    assert!(body["total_pages"].is_i64());
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_product_listing_filters_by_category() {
    let ctx = TestContext::new();

    // Seeded catalog has an electronics category with products.
    let categories: Value = ctx
        .client
        .get(ctx.url("/categories"))
        .send()
        .await
        .expect("list request failed")
        .json()
        .await
        .expect("JSON body");
    let slug = categories["data"][0]["slug"]
        .as_str()
        .expect("seeded category has a slug")
        .to_owned();

    let products: Value = ctx
        .client
        .get(ctx.url(&format!("/products?category={slug}")))
        .send()
        .await
        .expect("list request failed")
        .json()
        .await
        .expect("JSON body");

    for product in products["data"].as_array().expect("data array") {
        assert!(product["category_id"].is_i64());
    }
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_unknown_product_is_404() {
    let ctx = TestContext::new();
    let resp = ctx
        .client
        .get(ctx.url("/products/no-such-product-slug"))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), 404);

    let body: Value = resp.json().await.expect("JSON body");
    assert_eq!(body["error"]["code"], "not_found");
}

// ============================================================================
// Staff CRUD and soft-delete visibility
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and staff credentials"]
async fn test_category_create_requires_staff() {
    let ctx = TestContext::new();
    let resp = ctx
        .client
        .post(ctx.url("/categories"))
        .json(&json!({"name": "Unauthorized Category"}))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
#[ignore = "Requires running API server and staff credentials"]
async fn test_category_soft_delete_lifecycle() {
    let ctx = TestContext::new();
    let token = ctx.staff_token().await;
    let name = format!("Lifecycle {}", Uuid::new_v4().simple());

    // Create
    let created: Value = ctx
        .client
        .post(ctx.url("/categories"))
        .bearer_auth(&token)
        .json(&json!({"name": name}))
        .send()
        .await
        .expect("create failed")
        .json()
        .await
        .expect("JSON body");
    let id = created["id"].as_i64().expect("created id");
    let slug = created["slug"].as_str().expect("created slug").to_owned();

    // Publicly visible
    let resp = ctx
        .client
        .get(ctx.url(&format!("/categories/{slug}")))
        .send()
        .await
        .expect("detail failed");
    assert_eq!(resp.status(), 200);

    // Soft delete
    let resp = ctx
        .client
        .delete(ctx.url(&format!("/categories/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .expect("delete failed");
    assert_eq!(resp.status(), 204);

    // Hidden from the public
    let resp = ctx
        .client
        .get(ctx.url(&format!("/categories/{slug}")))
        .send()
        .await
        .expect("detail failed");
    assert_eq!(resp.status(), 404);

    // Still visible to staff with include_deleted
    let listed: Value = ctx
        .client
        .get(ctx.url("/categories?include_deleted=true&limit=100"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("list failed")
        .json()
        .await
        .expect("JSON body");
    let found = listed["data"]
        .as_array()
        .expect("data array")
        .iter()
        .any(|c| c["id"].as_i64() == Some(id));
    assert!(found, "deleted category missing from staff listing");

    // Restore brings it back
    let resp = ctx
        .client
        .put(ctx.url(&format!("/categories/{id}/restore")))
        .bearer_auth(&token)
        .send()
        .await
        .expect("restore failed");
    assert_eq!(resp.status(), 200);

    let resp = ctx
        .client
        .get(ctx.url(&format!("/categories/{slug}")))
        .send()
        .await
        .expect("detail failed");
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
#[ignore = "Requires running API server and staff credentials"]
async fn test_duplicate_category_slug_conflicts() {
    let ctx = TestContext::new();
    let token = ctx.staff_token().await;
    let name = format!("Duplicate {}", Uuid::new_v4().simple());

    let resp = ctx
        .client
        .post(ctx.url("/categories"))
        .bearer_auth(&token)
        .json(&json!({"name": name}))
        .send()
        .await
        .expect("create failed");
    assert_eq!(resp.status(), 201);

    let resp = ctx
        .client
        .post(ctx.url("/categories"))
        .bearer_auth(&token)
        .json(&json!({"name": name}))
        .send()
        .await
        .expect("create failed");
    assert_eq!(resp.status(), 409);

    let body: Value = resp.json().await.expect("JSON body");
    assert_eq!(body["error"]["code"], "conflict");
}

#[tokio::test]
#[ignore = "Requires running API server and staff credentials"]
async fn test_validation_errors_list_fields() {
    let ctx = TestContext::new();
    let token = ctx.staff_token().await;

    let resp = ctx
        .client
        .post(ctx.url("/categories"))
        .bearer_auth(&token)
        .json(&json!({"name": "x"}))
        .send()
        .await
        .expect("create failed");
    assert_eq!(resp.status(), 400);

    let body: Value = resp.json().await.expect("JSON body");
    assert_eq!(body["error"]["code"], "validation");
    let fields = body["error"]["fields"].as_array().expect("fields array");
    assert_eq!(fields[0]["field"], "name");
}
