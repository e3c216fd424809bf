#![allow(dead_code)]

use std::collections::HashMap;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response, header};
use serde_json::Value;
use tower::ServiceExt;

use jwt_gate::app::{build_router, build_state};
use jwt_gate::config::Config;
use jwt_gate::state::AppState;

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const MANAGER: (&str, &str) = ("boss", "boss-password");

pub fn config() -> Config {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("JWT_SECRET", SECRET),
        ("ACCESS_TOKEN_LEEWAY_SECONDS", "0"),
        ("BCRYPT_COST", "4"),
        ("BOOTSTRAP_MANAGER_USERNAME", MANAGER.0),
        ("BOOTSTRAP_MANAGER_PASSWORD", MANAGER.1),
    ]);
    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
}

pub async fn state() -> AppState {
    build_state(&config()).await.unwrap()
}

pub async fn app() -> Router {
    let config = config();
    let state = build_state(&config).await.unwrap();
    build_router(state, config.frame_options)
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = send(
        app,
        Method::POST,
        "/login",
        None,
        Some(serde_json::json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(response.status(), 200, "login failed for {username}");
    let body = json_body(response).await;
    body["access_token"].as_str().unwrap().to_string()
}
