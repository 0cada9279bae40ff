//! End-to-end tests for the HTTP surface, exercising the router with the
//! in-memory store and stubbed external services. Requests are driven
//! through `tower::ServiceExt::oneshot`, no sockets involved.

use std::sync::Arc;
use std::time::Duration;

use api_lib::adapters::{MemoryStore, TextExporter};
use api_lib::config::Config;
use api_lib::web::{build_router, state::AppState};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use studyhub_core::domain::{BookResult, DictionaryEntry, EncyclopediaPage};
use studyhub_core::ports::{
    BookSearchService, ChatService, DictionaryService, EncyclopediaService, PortResult,
};
use tower::ServiceExt;

//=========================================================================================
// Stub external services
//=========================================================================================

struct StubChat;

#[async_trait]
impl ChatService for StubChat {
    async fn reply(&self, _prompt: &str) -> PortResult<String> {
        Ok("Photosynthesis converts light into chemical energy.".to_string())
    }
}

struct StubDictionary;

#[async_trait]
impl DictionaryService for StubDictionary {
    async fn define(&self, word: &str) -> PortResult<DictionaryEntry> {
        Ok(DictionaryEntry {
            word: word.to_string(),
            phonetics: None,
            audio: None,
            definition: "a stubbed definition".to_string(),
        })
    }
}

struct StubEncyclopedia;

#[async_trait]
impl EncyclopediaService for StubEncyclopedia {
    async fn summarize(&self, query: &str) -> PortResult<EncyclopediaPage> {
        Ok(EncyclopediaPage {
            title: query.to_string(),
            url: String::new(),
            summary: "a stubbed summary".to_string(),
        })
    }
}

struct StubBooks;

#[async_trait]
impl BookSearchService for StubBooks {
    async fn search(&self, _query: &str) -> PortResult<Vec<BookResult>> {
        Ok(Vec::new())
    }
}

//=========================================================================================
// Harness
//=========================================================================================

fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://unused".to_string(),
        log_level: tracing::Level::INFO,
        gemini_api_key: None,
        chat_model: "stub".to_string(),
        external_timeout: Duration::from_secs(1),
    }
}

fn test_router() -> Router {
    let state = Arc::new(AppState {
        store: Arc::new(MemoryStore::new()),
        config: Arc::new(test_config()),
        chat: Arc::new(StubChat),
        dictionary: Arc::new(StubDictionary),
        encyclopedia: Arc::new(StubEncyclopedia),
        books: Arc::new(StubBooks),
        exporter: Arc::new(TextExporter),
    });
    build_router(state)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Signs up a fresh account and returns its session cookie.
async fn signup(router: &Router, username: &str) -> String {
    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            json!({ "username": username, "password": "correct horse" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("signup sets a session cookie")
        .to_str()
        .unwrap();
    set_cookie
        .split(';')
        .next()
        .expect("cookie has a value")
        .to_string()
}

//=========================================================================================
// Tests
//=========================================================================================

#[tokio::test]
async fn protected_routes_reject_anonymous_callers() {
    let router = test_router();
    for uri in ["/notes", "/homework", "/expense", "/progress", "/chatbot"] {
        let response = router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "uri: {uri}");
    }
}

#[tokio::test]
async fn health_is_public_and_reports_connected() {
    let router = test_router();
    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["database"], "connected");
}

#[tokio::test]
async fn signup_rejects_short_passwords_with_the_field_name() {
    let router = test_router();
    let response = router
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            json!({ "username": "alice", "password": "short" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["field"], "password");
}

#[tokio::test]
async fn login_with_a_wrong_password_is_unauthorized() {
    let router = test_router();
    signup(&router, "alice").await;

    let response = router
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({ "username": "alice", "password": "wrong password" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn notes_round_trip_through_the_api() {
    let router = test_router();
    let cookie = signup(&router, "alice").await;

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/notes")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "title": "Mitosis", "body": "cell division" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    let note_id = created["id"].as_str().unwrap().to_string();

    let response = router
        .clone()
        .oneshot(get_request("/notes", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed = json_body(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // The download endpoint serves the note as an attachment.
    let response = router
        .clone()
        .oneshot(get_request(&format!("/note/{note_id}/download"), &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("attachment"));

    // Another account cannot see the note.
    let other_cookie = signup(&router, "bob").await;
    let response = router
        .clone()
        .oneshot(get_request(&format!("/notes/{note_id}"), &other_cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sharing_grants_access_and_lists_both_sides() {
    let router = test_router();
    let alice = signup(&router, "alice").await;
    let bob = signup(&router, "bob").await;

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/notes")
                .header(header::COOKIE, &alice)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "title": "Shared", "body": "for bob" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    let note_id = json_body(response).await["id"].as_str().unwrap().to_string();

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(&format!("/share-note/{note_id}"))
                .header(header::COOKIE, &alice)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "username": "bob" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(get_request("/shared-notes", &bob))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["shared_with_me"].as_array().unwrap().len(), 1);
    assert_eq!(body["my_shared_notes"].as_array().unwrap().len(), 0);

    // A share request naming neither a username nor make_public is invalid.
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(&format!("/share-note/{note_id}"))
                .header(header::COOKIE, &alice)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["field"], "username");
}

#[tokio::test]
async fn the_expense_endpoint_returns_consistent_wallet_totals() {
    let router = test_router();
    let cookie = signup(&router, "alice").await;

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/expense")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "name": "Books", "amount": 100.0, "polarity": "Negative" })
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["profile"]["balance"], -100.0);

    let response = router
        .clone()
        .oneshot(get_request("/expense", &cookie))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["profile"]["expenses"], 100.0);
    assert_eq!(body["expenses"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn the_chatbot_replies_and_records_history() {
    let router = test_router();
    let cookie = signup(&router, "alice").await;

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/chatbot")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "message": "What is photosynthesis?" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["response"]
        .as_str()
        .unwrap()
        .contains("Photosynthesis"));

    let response = router
        .clone()
        .oneshot(get_request("/chatbot", &cookie))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["history"].as_array().unwrap().len(), 1);

    let response = router
        .clone()
        .oneshot(get_request("/chatbot/clear", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(get_request("/chatbot", &cookie))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert!(body["history"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn blank_chat_messages_are_rejected() {
    let router = test_router();
    let cookie = signup(&router, "alice").await;

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/chatbot")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "message": "   " }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["field"], "message");
}

#[tokio::test]
async fn the_versioned_prefix_mirrors_the_root_routes() {
    let router = test_router();
    let cookie = signup(&router, "alice").await;

    let response = router
        .clone()
        .oneshot(get_request("/api/v1/notes", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            json!({ "username": "alice", "password": "correct horse" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn the_progress_dashboard_reflects_completed_work() {
    let router = test_router();
    let cookie = signup(&router, "alice").await;

    // One finished homework out of two.
    for title in ["Essay", "Problem set"] {
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/homework")
                    .header(header::COOKIE, &cookie)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({
                            "subject": "History",
                            "title": title,
                            "description": "",
                            "due_at": "2026-09-01T00:00:00Z"
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
    let response = router
        .clone()
        .oneshot(get_request("/homework", &cookie))
        .await
        .unwrap();
    let listed = json_body(response).await;
    let first_id = listed[0]["id"].as_str().unwrap().to_string();

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(&format!("/homework/{first_id}/toggle"))
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(get_request("/progress", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["homework_completion_rate"], 50.0);
    assert_eq!(body["recent_homework"].as_array().unwrap().len(), 2);
}
