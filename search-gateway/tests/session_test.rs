mod common;

use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn create_session_uses_supplied_names() {
    let app = TestApp::spawn().await;

    let response = app
        .post_session(json!({"displayName": "Quarterly close", "userPseudoId": "user_42"}))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body["name"].as_str().unwrap().contains("/sessions/"));
    assert_eq!(body["displayName"], "Quarterly close");
    assert_eq!(body["userPseudoId"], "user_42");
    assert_eq!(body["turnCount"], 0);
    assert!(body["created"].is_string());
}

#[tokio::test]
async fn create_session_fills_defaults() {
    let app = TestApp::spawn().await;

    let body: Value = app.post_session(json!({})).await.json().await.unwrap();

    assert!(body["displayName"].as_str().unwrap().starts_with("Session "));
    assert!(body["userPseudoId"].as_str().unwrap().starts_with("user_"));
}

#[tokio::test]
async fn overlong_display_name_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .post_session(json!({"displayName": "x".repeat(200)}))
        .await;

    assert_eq!(response.status().as_u16(), 400);
    assert!(app.get("/sessions").await.json::<Value>().await.unwrap()["sessions"]
        .as_array()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn provider_failure_leaves_registry_empty() {
    let app = TestApp::spawn_with_mocks(true, false).await;

    let response = app.post_session(json!({"displayName": "A"})).await;

    assert_eq!(response.status().as_u16(), 503);
    let sessions: Value = app.get("/sessions").await.json().await.unwrap();
    assert_eq!(sessions, json!({"sessions": []}));
}

#[tokio::test]
async fn sessions_are_listed_in_creation_order() {
    let app = TestApp::spawn().await;

    for name in ["first", "second", "third"] {
        app.post_session(json!({"displayName": name})).await;
    }

    let body: Value = app.get("/sessions").await.json().await.unwrap();
    let names: Vec<&str> = body["sessions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["displayName"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn session_lookup_by_full_name_or_short_id() {
    let app = TestApp::spawn().await;
    let created: Value = app
        .post_session(json!({"displayName": "lookup"}))
        .await
        .json()
        .await
        .unwrap();
    let name = created["name"].as_str().unwrap();
    let short_id = name.rsplit('/').next().unwrap();

    let by_name: Value = app
        .get(&format!("/session/{}", name))
        .await
        .json()
        .await
        .unwrap();
    let by_short: Value = app
        .get(&format!("/session/{}", short_id))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(by_name["displayName"], "lookup");
    assert_eq!(by_short["name"], name);

    let missing = app.get("/session/does-not-exist").await;
    assert_eq!(missing.status().as_u16(), 404);
}
