use std::sync::Arc;

use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with, Backend, MOUNT, VALID_OTP};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(path: &str, token: Option<&str>) -> Request<String> {
    let mut builder = Request::builder().uri(format!("{MOUNT}{path}"));
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(String::new()).unwrap()
}

fn post(path: &str, body: &str, token: Option<&str>) -> Request<String> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("{MOUNT}{path}"))
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body.to_string()).unwrap()
}

/// App with one logged-in user; returns the router and that user's token.
fn app_with_session() -> (axum::Router, String) {
    let mut backend = Backend::seeded();
    let token = backend.issue_token("9876543210");
    (app_with(Arc::new(RwLock::new(backend))), token)
}

// --- locations ---

#[tokio::test]
async fn locations_are_public_and_paginated() {
    let resp = app()
        .oneshot(get("/locations/getAll?page=1&limit=2", None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["total"], 5);
    assert_eq!(body["data"]["totalPages"], 3);
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn locations_last_page_is_short() {
    let resp = app()
        .oneshot(get("/locations/getAll?page=3&limit=2", None))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn locations_page_past_the_end_is_empty() {
    let uri = format!("/locations/getAll?page={}&limit=1000", usize::MAX);
    let resp = app().oneshot(get(&uri, None)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["total"], 5);
    assert!(body["data"]["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn locations_search_filters_by_name() {
    let resp = app()
        .oneshot(get("/locations/getAll?search=gun", None))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["data"][0]["name"], "Guntur");
}

// --- auth ---

#[tokio::test]
async fn send_otp_rejects_short_mobile() {
    let resp = app()
        .oneshot(post("/auth/send-otp", r#"{"mobile":"123"}"#, None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body, json!({"success": false, "message": "Invalid mobile number"}));
}

#[tokio::test]
async fn verify_without_send_is_rejected() {
    let resp = app()
        .oneshot(post(
            "/auth/verify-otp-mobile",
            &format!(r#"{{"mobile":"9876543210","otp":"{VALID_OTP}"}}"#),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "OTP not requested");
}

// --- guarded routes ---

#[tokio::test]
async fn profile_without_token_is_401_envelope() {
    let resp = app().oneshot(get("/users/get", None)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body, json!({"success": false, "message": "Unauthorized"}));
}

#[tokio::test]
async fn profile_with_unknown_token_is_401() {
    let resp = app().oneshot(get("/users/get", Some("forged"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_with_token() {
    let (app, token) = app_with_session();
    let resp = app.oneshot(get("/users/get", Some(&token))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["mobile"], "9876543210");
}

#[tokio::test]
async fn cart_quantity_zero_removes_line() {
    use tower::Service;

    let (app, token) = app_with_session();
    let mut app = app.into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(post(
            "/carts/add-or-update",
            r#"{"productId":"sona-masoori-25kg","quantity":2}"#,
            Some(&token),
        ))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["data"]["items"][0]["quantity"], 2);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(post(
            "/carts/add-or-update",
            r#"{"productId":"sona-masoori-25kg","quantity":0}"#,
            Some(&token),
        ))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert!(body["data"]["items"].as_array().unwrap().is_empty());
}

// --- fallback ---

#[tokio::test]
async fn unknown_path_is_plain_text_invalid_api() {
    let resp = app()
        .oneshot(get("/undefined", None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(&body_bytes(resp).await[..], b"Invalid API");
}

// --- full login lifecycle ---

#[tokio::test]
async fn login_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // request OTP
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(post("/auth/send-otp", r#"{"mobile":"9000000001"}"#, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // wrong OTP keeps the request pending
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(post(
            "/auth/verify-otp-mobile",
            r#"{"mobile":"9000000001","otp":"000000"}"#,
            None,
        ))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["message"], "Invalid OTP");

    // right OTP issues a token
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(post(
            "/auth/verify-otp-mobile",
            &format!(r#"{{"mobile":"9000000001","otp":"{VALID_OTP}"}}"#),
            None,
        ))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    let token = body["data"]["token"].as_str().unwrap().to_string();

    // update then read profile
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(post("/users/update", r#"{"name":"Ravi"}"#, Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/users/get", Some(&token)))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["data"]["name"], "Ravi");
    assert_eq!(body["data"]["mobile"], "9000000001");
}
