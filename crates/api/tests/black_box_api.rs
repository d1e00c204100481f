use std::path::PathBuf;
use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::json;

use lessonhub_api::app::{AppOptions, AppServices, build_app};
use lessonhub_catalog::{Lesson, fixtures::demo_catalog};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(demo_catalog(), std::env::temp_dir().join("lessonhub-no-images")).await
    }

    async fn spawn_with(lessons: Vec<Lesson>, images_dir: PathBuf) -> Self {
        // Same router as prod, in-memory store, ephemeral port.
        let services = Arc::new(AppServices::in_memory(lessons));
        let app = build_app(
            services,
            AppOptions {
                images_dir,
                request_log: false,
            },
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn lesson_spaces(client: &reqwest::Client, srv: &TestServer, id: i64) -> i64 {
    let body: serde_json::Value = client
        .get(srv.url(&format!("/lessons/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["spaces"].as_i64().unwrap()
}

#[tokio::test]
async fn root_reports_liveness() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await.unwrap().contains("running"));

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn lessons_are_listed_in_id_order() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/lessons")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    let lessons = body.as_array().unwrap();
    assert_eq!(lessons.len(), 10);
    assert_eq!(lessons[0]["id"], 1);
    assert_eq!(lessons[0]["subject"], "Math");
    assert_eq!(lessons[0]["location"], "Hendon");
    assert_eq!(lessons[0]["spaces"], 5);
    assert_eq!(lessons[9]["id"], 10);
}

#[tokio::test]
async fn search_is_case_insensitive_over_subject_and_location() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(srv.url("/search"))
        .query(&[("q", "hEnDoN")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 5]);

    let res = client
        .get(srv.url("/search"))
        .query(&[("q", "math")])
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 1);

    let res = client
        .get(srv.url("/search"))
        .query(&[("q", "underwater basket weaving")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn search_without_a_term_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for path in ["/search", "/search?q=", "/search?q=%20%20"] {
        let res = client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "path: {path}");
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["field"], "q");
    }
}

#[tokio::test]
async fn order_lifecycle_place_then_sell_out() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/orders"))
        .json(&json!({
            "customerName": "Ada",
            "customerPhone": "0700000000",
            "items": [{ "lessonId": 1, "quantity": 3 }, { "lessonId": 2, "quantity": 1 }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["message"].as_str().is_some());
    let order_id = body["insertedId"].as_str().unwrap().to_string();

    assert_eq!(lesson_spaces(&client, &srv, 1).await, 2);
    assert_eq!(lesson_spaces(&client, &srv, 2).await, 4);

    let res = client
        .get(srv.url(&format!("/orders/{order_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let order: serde_json::Value = res.json().await.unwrap();
    assert_eq!(order["customerName"], "Ada");
    assert_eq!(order["items"].as_array().unwrap().len(), 2);

    // Two left on lesson 1; asking for three fails and touches nothing.
    let res = client
        .post(srv.url("/orders"))
        .json(&json!({
            "customerName": "Grace",
            "customerPhone": "0711111111",
            "items": [{ "lessonId": 2, "quantity": 1 }, { "lessonId": 1, "quantity": 3 }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_stock");
    assert_eq!(body["lessonId"], 1);
    assert_eq!(body["requested"], 3);
    assert_eq!(body["available"], 2);

    assert_eq!(lesson_spaces(&client, &srv, 1).await, 2);
    assert_eq!(lesson_spaces(&client, &srv, 2).await, 4);
}

#[tokio::test]
async fn invalid_orders_name_the_offending_field() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let cases = [
        (json!({ "customerPhone": "1", "items": [{ "lessonId": 1, "quantity": 1 }] }), "customerName"),
        (json!({ "customerName": "Ada", "items": [{ "lessonId": 1, "quantity": 1 }] }), "customerPhone"),
        (json!({ "customerName": "Ada", "customerPhone": "1", "items": [] }), "items"),
        (
            json!({ "customerName": "Ada", "customerPhone": "1", "items": [{ "lessonId": 1, "quantity": 0 }] }),
            "items[0].quantity",
        ),
        (
            json!({ "customerName": "Ada", "customerPhone": "1", "items": [{ "quantity": 1 }] }),
            "items[0].lessonId",
        ),
        (
            json!({ "customerName": "Ada", "customerPhone": "1", "items": [{ "lessonId": 1, "quantity": 1.5 }] }),
            "items[0].quantity",
        ),
        (
            json!({ "customerName": "Ada", "customerPhone": "1", "items": [{ "lessonId": 1, "quantity": "2" }] }),
            "items[0].quantity",
        ),
        (json!({ "customerName": 5, "customerPhone": "1", "items": [{ "lessonId": 1, "quantity": 1 }] }), "customerName"),
        (json!({ "customerName": "Ada", "customerPhone": 7, "items": [{ "lessonId": 1, "quantity": 1 }] }), "customerPhone"),
        (json!({ "customerName": "Ada", "customerPhone": "1", "items": "lesson 1" }), "items"),
    ];

    for (payload, field) in cases {
        let res = client
            .post(srv.url("/orders"))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "payload: {payload}");
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["field"], field);
    }

    assert_eq!(lesson_spaces(&client, &srv, 1).await, 5);
}

#[tokio::test]
async fn order_for_unknown_lesson_is_not_found() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/orders"))
        .json(&json!({
            "customerName": "Ada",
            "customerPhone": "1",
            "items": [{ "lessonId": 1, "quantity": 1 }, { "lessonId": 999, "quantity": 1 }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // The space taken for lesson 1 was handed back.
    assert_eq!(lesson_spaces(&client, &srv, 1).await, 5);
}

#[tokio::test]
async fn malformed_order_body_is_a_bad_request() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/orders"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_body");
}

#[tokio::test]
async fn repeated_idempotency_key_replays_the_first_order() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let payload = json!({
        "customerName": "Ada",
        "customerPhone": "1",
        "items": [{ "lessonId": 3, "quantity": 2 }]
    });

    let first = client
        .post(srv.url("/orders"))
        .header("Idempotency-Key", "checkout-42")
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);
    let first: serde_json::Value = first.json().await.unwrap();

    let second = client
        .post(srv.url("/orders"))
        .header("Idempotency-Key", "checkout-42")
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let second: serde_json::Value = second.json().await.unwrap();

    assert_eq!(first["insertedId"], second["insertedId"]);
    assert_eq!(lesson_spaces(&client, &srv, 3).await, 3);
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(srv.url("/orders/018f0000-0000-7000-8000-000000000000"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .get(srv.url("/orders/not-a-uuid"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn put_lesson_sets_spaces() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .put(srv.url("/lessons/4"))
        .json(&json!({ "spaces": 12 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["message"].as_str().is_some());
    assert_eq!(lesson_spaces(&client, &srv, 4).await, 12);

    let res = client
        .put(srv.url("/lessons/4"))
        .json(&json!({ "spaces": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(lesson_spaces(&client, &srv, 4).await, 0);
}

#[tokio::test]
async fn put_lesson_rejects_bad_input() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for payload in [json!({ "spaces": -1 }), json!({ "spaces": "ten" }), json!({})] {
        let res = client
            .put(srv.url("/lessons/4"))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "payload: {payload}");
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["field"], "spaces");
    }

    let res = client
        .put(srv.url("/lessons/abc"))
        .json(&json!({ "spaces": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .put(srv.url("/lessons/999"))
        .json(&json!({ "spaces": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    assert_eq!(lesson_spaces(&client, &srv, 4).await, 5);
}

#[tokio::test]
async fn images_are_served_from_the_static_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("math.png"), b"\x89PNG fake").unwrap();

    let srv = TestServer::spawn_with(demo_catalog(), dir.path().to_path_buf()).await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/images/math.png")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.bytes().await.unwrap().as_ref(), b"\x89PNG fake");

    let res = client
        .get(srv.url("/images/missing.png"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
