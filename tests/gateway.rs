//! End-to-end request lifecycle tests against mock upstreams.

use axum::http::StatusCode;

mod common;

use common::{
    client, gateway_config, mint_token, route, start_gateway, start_mock_backend, MockResponse,
    SECRET,
};

#[tokio::test]
async fn test_liveness_bypasses_pipeline() {
    let backend = start_mock_backend(MockResponse::json(r#"{"ok":true}"#)).await;
    let (addr, shutdown) = start_gateway(gateway_config(vec![route(
        "root",
        "/",
        &backend.url(),
        true,
    )]))
    .await;

    let client = client();
    for method in [reqwest::Method::GET, reqwest::Method::POST, reqwest::Method::DELETE] {
        let res = client
            .request(method, format!("http://{}/healthz", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.text().await.unwrap(), "ok");
    }
    assert_eq!(backend.calls(), 0, "liveness must not reach an upstream");

    shutdown.trigger();
}

#[tokio::test]
async fn test_valid_token_forwards_with_stripped_prefix() {
    let backend = start_mock_backend(MockResponse::json(r#"{"ok":true}"#)).await;
    let (addr, shutdown) = start_gateway(gateway_config(vec![route(
        "a",
        "/api/a",
        &backend.url(),
        true,
    )]))
    .await;

    let res = client()
        .get(format!("http://{}/api/a/widgets", addr))
        .bearer_auth(mint_token(SECRET, 600))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), r#"{"ok":true}"#);

    let seen = backend.last_request().unwrap();
    assert_eq!(seen.method, "GET");
    assert_eq!(seen.target, "/widgets");
    assert_eq!(seen.headers["x-user-id"], "student-42");
    assert_eq!(seen.headers["x-user-role"], "STUDENT");
    assert!(seen.headers.contains_key("x-request-id"));
    assert_eq!(seen.headers["x-forwarded-for"], "127.0.0.1");

    shutdown.trigger();
}

#[tokio::test]
async fn test_prefix_equal_to_path_forwards_root() {
    let backend = start_mock_backend(MockResponse::json("[]")).await;
    let (addr, shutdown) = start_gateway(gateway_config(vec![route(
        "a",
        "/api/a",
        &backend.url(),
        true,
    )]))
    .await;

    let res = client()
        .get(format!("http://{}/api/a", addr))
        .bearer_auth(mint_token(SECRET, 600))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(backend.last_request().unwrap().target, "/");

    shutdown.trigger();
}

#[tokio::test]
async fn test_missing_header_rejected_without_upstream_call() {
    let backend = start_mock_backend(MockResponse::json(r#"{"ok":true}"#)).await;
    let (addr, shutdown) = start_gateway(gateway_config(vec![route(
        "a",
        "/api/a",
        &backend.url(),
        true,
    )]))
    .await;

    let client = client();
    let res = client
        .get(format!("http://{}/api/a/widgets", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.text().await.unwrap(), r#"{"error":"unauthorized"}"#);

    let res = client
        .get(format!("http://{}/api/a/widgets", addr))
        .header("authorization", "Token abc")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(backend.calls(), 0);
    shutdown.trigger();
}

#[tokio::test]
async fn test_expired_token_rejected_without_upstream_call() {
    let a = start_mock_backend(MockResponse::json(r#"{"ok":true}"#)).await;
    let b = start_mock_backend(MockResponse::json(r#"{"ok":true}"#)).await;
    let (addr, shutdown) = start_gateway(gateway_config(vec![
        route("a", "/api/a", &a.url(), true),
        route("b", "/api/b", &b.url(), true),
    ]))
    .await;

    let res = client()
        .get(format!("http://{}/api/b/x", addr))
        .bearer_auth(mint_token(SECRET, -1))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(b.calls(), 0);
    assert_eq!(a.calls(), 0);
    shutdown.trigger();
}

#[tokio::test]
async fn test_token_from_other_secret_rejected() {
    let backend = start_mock_backend(MockResponse::json(r#"{"ok":true}"#)).await;
    let (addr, shutdown) = start_gateway(gateway_config(vec![route(
        "a",
        "/api/a",
        &backend.url(),
        true,
    )]))
    .await;

    let res = client()
        .get(format!("http://{}/api/a/widgets", addr))
        .bearer_auth(mint_token("not-the-secret", 600))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(backend.calls(), 0);
    shutdown.trigger();
}

#[tokio::test]
async fn test_exempt_login_reaches_auth_service() {
    let auth = start_mock_backend(MockResponse::json(r#"{"access_token":"t"}"#)).await;
    let (addr, shutdown) = start_gateway(gateway_config(vec![route(
        "auth",
        "/auth",
        &auth.url(),
        true,
    )]))
    .await;

    let res = client()
        .post(format!("http://{}/auth/login", addr))
        .header("x-user-id", "admin")
        .json(&serde_json::json!({"email": "a@b.c", "password": "password"}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let seen = auth.last_request().unwrap();
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.target, "/login");
    assert!(!seen.headers.contains_key("x-user-id"), "caller identity header must be dropped");
    let body: serde_json::Value = serde_json::from_slice(&seen.body).unwrap();
    assert_eq!(body["email"], "a@b.c");

    shutdown.trigger();
}

#[tokio::test]
async fn test_non_exempt_auth_path_requires_token() {
    let auth = start_mock_backend(MockResponse::json("{}")).await;
    let (addr, shutdown) = start_gateway(gateway_config(vec![route(
        "auth",
        "/auth",
        &auth.url(),
        true,
    )]))
    .await;

    let res = client()
        .get(format!("http://{}/auth/users", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(auth.calls(), 0);
    shutdown.trigger();
}

#[tokio::test]
async fn test_query_string_preserved() {
    let backend = start_mock_backend(MockResponse::json("[]")).await;
    let (addr, shutdown) = start_gateway(gateway_config(vec![route(
        "b",
        "/api/b",
        &backend.url(),
        true,
    )]))
    .await;

    let res = client()
        .get(format!("http://{}/api/b/rooms?page=2&size=20", addr))
        .bearer_auth(mint_token(SECRET, 600))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(backend.last_request().unwrap().target, "/rooms?page=2&size=20");
    shutdown.trigger();
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let backend = start_mock_backend(MockResponse::json("{}")).await;
    let (addr, shutdown) = start_gateway(gateway_config(vec![route(
        "a",
        "/api/a",
        &backend.url(),
        true,
    )]))
    .await;

    let res = client()
        .get(format!("http://{}/nowhere", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().await.unwrap(), r#"{"error":"not found"}"#);
    assert_eq!(backend.calls(), 0);
    shutdown.trigger();
}
