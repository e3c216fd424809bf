//! A broken access policy file keeps the service from starting.

mod common;

use std::io::Write;

use axum::http::{Method, StatusCode};

use common::{config, send};
use jwt_gate::app::{build_router, build_state, load_policy};

#[tokio::test]
async fn missing_policy_file_refuses_to_start() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config();
    config.access_policy_file = Some(dir.path().join("policy.json"));

    assert!(load_policy(&config).is_err());
    let err = build_state(&config).await.unwrap_err();
    assert!(format!("{err:#}").contains("policy.json"), "{err:#}");
}

#[tokio::test]
async fn invalid_rule_refuses_to_start() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(br#"[{ "pattern": "/reports", "access": "sometimes" }]"#)
        .unwrap();

    let mut config = config();
    config.access_policy_file = Some(file.path().to_path_buf());

    let err = build_state(&config).await.unwrap_err();
    assert!(format!("{err:#}").contains("rule #0"), "{err:#}");
}

#[tokio::test]
async fn policy_file_replaces_the_built_in_table() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(
        br#"[
            { "pattern": "/users", "method": "GET", "access": "public" },
            { "pattern": "/managers", "access": "deny" }
        ]"#,
    )
    .unwrap();

    let mut config = config();
    config.access_policy_file = Some(file.path().to_path_buf());

    let state = build_state(&config).await.unwrap();
    let app = build_router(state, config.frame_options);

    let response = send(&app, Method::GET, "/users", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    // login is not listed, so the authenticated-only fallback applies
    let response = send(
        &app,
        Method::POST,
        "/login",
        None,
        Some(serde_json::json!({ "username": "boss", "password": "boss-password" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, Method::GET, "/managers", None, None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

