//! Health endpoint contract.
//!
//! Requires a running API server (`cargo run -p souq-api`).

use souq_integration_tests::TestContext;

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_liveness() {
    let ctx = TestContext::new();
    let resp = ctx
        .client
        .get(format!("{}/health", ctx.base_url))
        .send()
        .await
        .expect("health request failed");

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.expect("body"), "ok");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_readiness_pings_database() {
    let ctx = TestContext::new();
    let resp = ctx
        .client
        .get(format!("{}/health/ready", ctx.base_url))
        .send()
        .await
        .expect("readiness request failed");

    assert_eq!(resp.status(), 200);
}
