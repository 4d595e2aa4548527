use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use httpmock::Method::POST;
use httpmock::MockServer;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tempfile::tempdir;
use tower::ServiceExt;

use amoria::domains::character::CharacterRegistry;
use amoria::providers::remote::RemoteEngine;
use amoria::providers::sqlite::SqliteConversationStore;
use amoria::server::{build_router, AppState};
use amoria::services::chat::ConversationService;

const SECRET: &str = "server-test-secret";

fn mint_token(sub: &str) -> String {
    let claims = json!({
        "sub": sub,
        "exp": (chrono::Utc::now().timestamp() + 3600) as usize,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

async fn make_app(server: &MockServer, db_path: &str) -> axum::Router {
    let store = Arc::new(SqliteConversationStore::new(db_path, 4).await.unwrap());
    let registry = Arc::new(CharacterRegistry::load(None).unwrap());
    let safe = Arc::new(RemoteEngine::safe(
        "key".to_string(),
        server.base_url(),
        "safe-model".to_string(),
    ));
    let adult = Arc::new(RemoteEngine::adult(
        "key".to_string(),
        server.base_url(),
        "adult-model".to_string(),
    ));
    let service = Arc::new(ConversationService::new(store, registry, safe, adult));
    build_router(AppState {
        service,
        jwt_secret: SECRET.to_string(),
    })
}

async fn mock_completion(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({
                "id": "chatcmpl-test",
                "object": "chat.completion",
                "created": 1,
                "model": "safe-model",
                "choices": [{
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": json!({
                            "dialogue": "今天也辛苦了。",
                            "emotion_delta": {"affection_delta": 1}
                        }).to_string()
                    },
                    "finish_reason": "stop"
                }]
            }));
        })
        .await;
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_needs_no_auth() {
    let server = MockServer::start_async().await;
    let temp = tempdir().unwrap();
    let db_path = temp.path().join("srv.db").to_string_lossy().to_string();
    let app = make_app(&server, &db_path).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["status"], json!("healthy"));
    assert!(body["data"]["timestamp"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn missing_token_is_401_with_envelope() {
    let server = MockServer::start_async().await;
    let temp = tempdir().unwrap();
    let db_path = temp.path().join("srv.db").to_string_lossy().to_string();
    let app = make_app(&server, &db_path).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/chat/message")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"character_id": "c_gentle", "message": "嗨"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("AUTH_ERROR"));
}

#[tokio::test]
async fn over_long_message_is_400() {
    let server = MockServer::start_async().await;
    let temp = tempdir().unwrap();
    let db_path = temp.path().join("srv.db").to_string_lossy().to_string();
    let app = make_app(&server, &db_path).await;
    let token = mint_token("user-1");

    let long = "a".repeat(2001);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/chat/message")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::from(
                    json!({"character_id": "c_gentle", "message": long}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn full_turn_round_trip() {
    let server = MockServer::start_async().await;
    mock_completion(&server).await;
    let temp = tempdir().unwrap();
    let db_path = temp.path().join("srv.db").to_string_lossy().to_string();
    let app = make_app(&server, &db_path).await;
    let token = mint_token("user-1");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/chat/message")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::from(
                    json!({"character_id": "c_gentle", "message": "今天好累"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["dialogue"], json!("今天也辛苦了。"));
    assert_eq!(body["data"]["engine"], json!("safe"));
    let chat_id = body["data"]["chat_id"].as_str().unwrap().to_string();

    // the relationship view reflects the turn just taken
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/v1/relationships/chat/{chat_id}/status"))
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["affection"], json!(31));
    // Fresh relationships open at stranger; one turn advances one band.
    assert_eq!(body["data"]["stage"], json!("acquaintance"));
    assert_eq!(body["data"]["intimacy_level"], json!("distant"));
}

#[tokio::test]
async fn relationship_views_hide_other_users_chats() {
    let server = MockServer::start_async().await;
    mock_completion(&server).await;
    let temp = tempdir().unwrap();
    let db_path = temp.path().join("srv.db").to_string_lossy().to_string();
    let app = make_app(&server, &db_path).await;
    let owner = mint_token("user-1");
    let other = mint_token("user-2");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/chat/message")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {owner}"))
                .body(Body::from(
                    json!({"character_id": "c_gentle", "message": "嗨"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    let chat_id = body["data"]["chat_id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/v1/relationships/chat/{chat_id}/affection"))
                .header("authorization", format!("Bearer {other}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn relationship_history_returns_turn_entries() {
    let server = MockServer::start_async().await;
    mock_completion(&server).await;
    let temp = tempdir().unwrap();
    let db_path = temp.path().join("srv.db").to_string_lossy().to_string();
    let app = make_app(&server, &db_path).await;
    let token = mint_token("user-1");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/chat/message")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::from(
                    json!({"character_id": "c_gentle", "message": "嗨"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    let chat_id = body["data"]["chat_id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/v1/relationships/chat/{chat_id}/history"))
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let history = body["data"]["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["old_affection"], json!(30));
    assert_eq!(history[0]["new_affection"], json!(31));
}
