//! Runs against a live server. Skipped unless `TEST_API_BASE_URL` is set,
//! e.g. `TEST_API_BASE_URL=http://localhost:8000 cargo test --test live_smoke`.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::time::{sleep, Duration};

struct TestClient {
    client: Client,
    base_url: String,
}

impl TestClient {
    fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    async fn post(&self, path: &str, json: Value) -> reqwest::Result<reqwest::Response> {
        self.client
            .post(&format!("{}{}", self.base_url, path))
            .json(&json)
            .send()
            .await
    }

    async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .get(&format!("{}{}", self.base_url, path))
            .send()
            .await
    }
}

#[tokio::test]
async fn live_server_round_trip() {
    let Ok(base_url) = std::env::var("TEST_API_BASE_URL") else {
        eprintln!("TEST_API_BASE_URL not set, skipping live smoke test");
        return;
    };
    let client = TestClient::new(base_url);

    let mut retries = 0;
    loop {
        match client.get("/healthcheck").await {
            Ok(resp) if resp.status().is_success() => break,
            _ if retries < 30 => {
                sleep(Duration::from_secs(1)).await;
                retries += 1;
            }
            _ => panic!("API server is not responding after {} attempts", retries),
        }
    }

    // Unique per run so the test can be repeated against the same database
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let kind = format!("smoke-{}", &suffix[..12]);

    let response = client
        .post("/thrash_type/create", json!({"thrash_type": kind}))
        .await
        .expect("create request failed");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .post("/thrash_type/create", json!({"thrash_type": kind}))
        .await
        .expect("duplicate request failed");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = client
        .get(&format!("/thrash_types?name={}", kind))
        .await
        .expect("list request failed");
    let listed: Value = response.json().await.expect("list body");
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let response = client
        .post("/thrash_type/delete", json!({"thrash_type": kind}))
        .await
        .expect("delete request failed");
    assert_eq!(response.status(), StatusCode::OK);
}
