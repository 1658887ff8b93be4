//! Level engine and accounts over HTTP.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use pressly_core::store::MemoryStore;
use pressly_integration_tests::TestContext;
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
async fn test_health_and_readiness() {
    let ctx = TestContext::new(MemoryStore::new()).await;

    let resp = ctx.client.get(ctx.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = ctx.client.get(ctx.url("/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let ctx = TestContext::new(MemoryStore::new()).await;

    let resp = ctx
        .client
        .get(ctx.url("/health"))
        .header("x-request-id", "upstream-123")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-request-id"], "upstream-123");

    let resp = ctx.client.get(ctx.url("/health")).send().await.unwrap();
    let generated = resp.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(generated.len(), 36);
}

#[tokio::test]
async fn test_level_lookup_clamps_and_tops_out() {
    let ctx = TestContext::new(MemoryStore::new()).await;

    let body: Value = ctx
        .client
        .get(ctx.url("/api/levels/-4"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["level"], 1);
    assert_eq!(body["name"], "Starter");
    assert_eq!(body["progress"]["current_orders"], 0);
    assert_eq!(body["features"]["create_basic_orders"], true);
    assert_eq!(body["features"]["bulk_ordering"], false);

    let body: Value = ctx
        .client
        .get(ctx.url("/api/levels/10"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["level"], 4);
    assert_eq!(body["producer_mode_eligible"], true);
    assert_eq!(body["progress"]["next_level"], Value::Null);
    assert_eq!(body["progress"]["percent"], 100.0);
}

#[tokio::test]
async fn test_account_journey_through_levels() {
    let ctx = TestContext::new(MemoryStore::new()).await;

    let resp = ctx
        .client
        .put(ctx.url("/api/accounts/42"))
        .json(&json!({"name": "Rosa", "role": "designer"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["interface"], "consumer_simplified");

    let mut level_ups = Vec::new();
    for _ in 0..10 {
        let body: Value = ctx
            .client
            .post(ctx.url("/api/accounts/42/orders"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if body["leveled_up"] == true {
            level_ups.push((
                body["account"]["order_count"].as_u64().unwrap(),
                body["change"]["current"].as_u64().unwrap(),
            ));
        }
    }
    assert_eq!(level_ups, vec![(3, 2), (5, 3), (10, 4)]);

    let body: Value = ctx
        .client
        .get(ctx.url("/api/accounts/42"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["order_count"], 10);
    assert_eq!(body["level"]["producer_mode_eligible"], true);
    assert_eq!(body["interface"], "professional_full");
    assert!(body["first_order_at"].is_string());
    assert!(body["last_order_at"].is_string());

    // Renaming keeps the order history
    let resp = ctx
        .client
        .put(ctx.url("/api/accounts/42"))
        .json(&json!({"name": "Rosa M."}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["order_count"], 10);
    assert_eq!(body["role"], "designer");
}

#[tokio::test]
async fn test_concurrent_orders_are_all_counted() {
    let ctx = TestContext::new(MemoryStore::new()).await;
    ctx.client
        .put(ctx.url("/api/accounts/5"))
        .json(&json!({"name": "Busy"}))
        .send()
        .await
        .unwrap();

    let requests = (0..8).map(|_| {
        ctx.client
            .post(ctx.url("/api/accounts/5/orders"))
            .send()
    });
    for resp in futures_join(requests).await {
        assert_eq!(resp.unwrap().status(), StatusCode::OK);
    }

    let body: Value = ctx
        .client
        .get(ctx.url("/api/accounts/5"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["order_count"], 8);
}

async fn futures_join<F, T>(futures: impl Iterator<Item = F>) -> Vec<T>
where
    F: std::future::Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let handles: Vec<_> = futures.map(tokio::spawn).collect();
    let mut out = Vec::with_capacity(handles.len());
    for handle in handles {
        out.push(handle.await.unwrap());
    }
    out
}

#[tokio::test]
async fn test_errors_are_json() {
    let ctx = TestContext::new(MemoryStore::new()).await;

    let resp = ctx
        .client
        .post(ctx.url("/api/accounts/404/orders"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Not found: account 404");

    let resp = ctx
        .client
        .put(ctx.url("/api/accounts/1"))
        .json(&json!({"name": ""}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
