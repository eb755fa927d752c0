use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use ecogram::auth::{Argon2Hasher, TokenService};
use ecogram::{app_router, App, MemoryStore};
use serde_json::{json, Value};
use tower::ServiceExt;

const USER_PHONE: &str = "89001234567";
const COURIER_PHONE: &str = "89007654321";

fn router() -> Router {
    app_router(App::new(
        MemoryStore::new(),
        Arc::new(Argon2Hasher::with_cost(1024, 1).unwrap()),
        TokenService::new("router-test-secret", 5),
    ))
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn post(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

async fn seed_people(router: &Router) {
    let (status, _) = post(
        router,
        "/users/create",
        json!([
            {"phone_number": USER_PHONE, "password": "secret", "username": "kate", "name": "Kate"},
            {"phone_number": "89000000002", "password": "secret", "username": "oleg"},
            {"phone_number": "89000000003", "password": "secret", "username": "lena"}
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = post(
        router,
        "/courier/create",
        json!({"phone_number": COURIER_PHONE, "password": "secret", "name": "Ivan"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn healthcheck_responds() {
    let router = router();
    let (status, body) = get(&router, "/healthcheck").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn duplicate_role_is_a_conflict() {
    let router = router();
    let (status, body) = post(&router, "/role/create", json!({"name": "courier"})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["created"][0]["name"], "courier");

    let (status, body) = post(&router, "/role/create", json!({"name": "courier"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already exists"));

    let (status, body) = get(&router, "/roles?name=courier").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn register_login_and_me() {
    let router = router();
    let (status, body) = post(
        &router,
        "/register",
        json!({"phone_number": USER_PHONE, "password": "secret", "username": "kate"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.get("password").is_none());

    let (status, _) = get(&router, "/users/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let login = Request::builder()
        .method("POST")
        .uri("/auth/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={}&password=wrong", USER_PHONE)))
        .unwrap();
    let (status, _) = send(&router, login).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let login = Request::builder()
        .method("POST")
        .uri("/auth/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={}&password=secret", USER_PHONE)))
        .unwrap();
    let (status, body) = send(&router, login).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    let token = body["access_token"].as_str().unwrap().to_string();

    let me = Request::builder()
        .uri("/users/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&router, me).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phone_number"], USER_PHONE);
    assert_eq!(body["role"], "basic_user");
}

#[tokio::test]
async fn map_point_drops_unknown_trash_types() {
    let router = router();
    post(&router, "/thrash_type/create", json!({"thrash_type": "plastic"})).await;
    post(&router, "/map/create", json!({"city": "Kazan"})).await;

    let (status, body) = post(
        &router,
        "/map/point/create",
        json!({
            "title": "Green Yard",
            "address": "Baumana 5",
            "coordinates": [55.78, 49.12],
            "city": "Kazan",
            "accepted_thrash": ["plastic", "unknown_type"]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["created"][0]["accepted_thrash"], json!(["plastic"]));

    let (status, body) = post(&router, "/map/points", json!({"city_map_filter": "Kazan"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = post(&router, "/map/points/thrash", json!({"thrash_type_filter": "plastic"})).await;
    assert_eq!(body[0]["city"], "Kazan");
}

#[tokio::test]
async fn delivery_request_is_found_by_courier_phone() {
    let router = router();
    seed_people(&router).await;
    post(&router, "/thrash_type/create", json!({"thrash_type": "paper"})).await;

    let (status, body) = post(
        &router,
        "/delivery/requests/create",
        json!({
            "user_phone": USER_PHONE,
            "courier_phone": COURIER_PHONE,
            "address": "Arbat 24",
            "price": 300.0,
            "thrash_types": ["paper"]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["created"][0]["thrash_types"], json!(["paper"]));

    let (status, body) = post(
        &router,
        "/delivery/requests",
        json!({"courier_phone_number_filter": COURIER_PHONE}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["status"], "pending");
    assert_eq!(body[0]["user_username"], "kate");
}

#[tokio::test]
async fn batch_update_skips_unresolved_items() {
    let router = router();
    seed_people(&router).await;

    let (status, body) = post(
        &router,
        "/users/update",
        json!([
            {"username": "kate", "name": "Katya"},
            {"username": "nobody", "name": "Ghost"},
            {"username": "lena", "surname": "Ivanova"}
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let updated = body["updated"].as_array().unwrap();
    assert_eq!(updated.len(), 2);
    assert_eq!(updated[0]["name"], "Katya");
    assert_eq!(updated[1]["surname"], "Ivanova");
}

#[tokio::test]
async fn batch_delete_without_identity_deletes_nothing() {
    let router = router();
    seed_people(&router).await;

    let (status, _) = post(
        &router,
        "/users/delete",
        json!([{}, {"username": "oleg"}, {"phone": "89000000003"}]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get(&router, "/users").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn achievements_are_backfilled_and_synced() {
    let router = router();
    seed_people(&router).await;

    let (status, body) = post(
        &router,
        "/achievements/create",
        json!({"title": "First drop-off", "description": "Hand over recyclables"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let achievement_id = body["created"][0]["id"].as_i64().unwrap();

    let (_, users) = get(&router, "/users?username_filter=kate").await;
    let user_id = users[0]["id"].as_i64().unwrap();

    let (status, body) = get(&router, &format!("/user/achievements?user_id={}", user_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["unlocked"], false);

    let (status, body) = get(&router, &format!("/user/achievements/sync?user_id={}", user_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["linked"], json!([]));

    let (status, body) = post(
        &router,
        "/user/achievements/update",
        json!({"user_id": user_id, "achievement_id": achievement_id, "unlocked": true}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"][0]["unlocked"], true);
    assert!(body["updated"][0]["unlock_date"].is_string());
}
