use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::domains::relationship::Relationship;
use crate::error::{CoreError, Result};
use crate::services::chat::ConversationService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ConversationService>,
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[allow(dead_code)]
    exp: usize,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

#[derive(Serialize)]
struct Envelope {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct SendMessageRequest {
    character_id: String,
    message: String,
}

#[derive(Deserialize)]
struct RegenerateRequest {
    message_id: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/chat/message", post(send_message))
        .route("/api/v1/chat/regenerate", post(regenerate))
        .route(
            "/api/v1/relationships/chat/{chat_id}/status",
            get(relationship_status),
        )
        .route(
            "/api/v1/relationships/chat/{chat_id}/affection",
            get(relationship_affection),
        )
        .route(
            "/api/v1/relationships/chat/{chat_id}/history",
            get(relationship_history),
        )
        .with_state(state)
}

async fn health() -> Response {
    ok_with_message(
        "ok",
        json!({"status": "healthy", "timestamp": crate::domains::chat::now_ms()}),
    )
}

async fn send_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SendMessageRequest>,
) -> Response {
    let user_id = match authorize(&headers, &state.jwt_secret) {
        Ok(user_id) => user_id,
        Err(err) => return error_response(&err),
    };
    match state
        .service
        .process_message(&user_id, &payload.character_id, &payload.message)
        .await
        .and_then(|outcome| serde_json::to_value(outcome).map_err(CoreError::from))
    {
        Ok(data) => ok(data),
        Err(err) => error_response(&err),
    }
}

async fn regenerate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RegenerateRequest>,
) -> Response {
    let user_id = match authorize(&headers, &state.jwt_secret) {
        Ok(user_id) => user_id,
        Err(err) => return error_response(&err),
    };
    match state
        .service
        .regenerate(&user_id, &payload.message_id)
        .await
        .and_then(|outcome| serde_json::to_value(outcome).map_err(CoreError::from))
    {
        Ok(data) => ok(data),
        Err(err) => error_response(&err),
    }
}

async fn relationship_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(chat_id): Path<String>,
) -> Response {
    let user_id = match authorize(&headers, &state.jwt_secret) {
        Ok(user_id) => user_id,
        Err(err) => return error_response(&err),
    };
    match state.service.relationship_for_chat(&user_id, &chat_id).await {
        Ok(rel) => ok(status_view(&rel)),
        Err(err) => error_response(&err),
    }
}

async fn relationship_affection(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(chat_id): Path<String>,
) -> Response {
    let user_id = match authorize(&headers, &state.jwt_secret) {
        Ok(user_id) => user_id,
        Err(err) => return error_response(&err),
    };
    match state.service.relationship_for_chat(&user_id, &chat_id).await {
        Ok(rel) => {
            let max_affection = state.service.character_max_affection(&rel.character_id);
            ok(json!({
                "affection": rel.affection,
                "max_affection": max_affection,
                "stage": rel.stage.as_str(),
                "next_stage": rel.stage.next().map(|s| json!({
                    "stage": s.as_str(),
                    "min_affection": s.min_affection(),
                })),
            }))
        }
        Err(err) => error_response(&err),
    }
}

async fn relationship_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(chat_id): Path<String>,
) -> Response {
    let user_id = match authorize(&headers, &state.jwt_secret) {
        Ok(user_id) => user_id,
        Err(err) => return error_response(&err),
    };
    match state.service.relationship_for_chat(&user_id, &chat_id).await {
        Ok(rel) => {
            // The ring is stored oldest first; the view reads newest first.
            let newest_first: Vec<_> = rel.emotion_data.history.iter().rev().collect();
            match serde_json::to_value(&newest_first) {
                Ok(history) => ok(json!({ "history": history })),
                Err(err) => error_response(&CoreError::from(err)),
            }
        }
        Err(err) => error_response(&err),
    }
}

fn status_view(rel: &Relationship) -> Value {
    json!({
        "chat_id": rel.chat_id,
        "character_id": rel.character_id,
        "stage": rel.stage.as_str(),
        "affection": rel.affection,
        "mood": rel.mood.as_str(),
        "intimacy_level": rel.intimacy.as_str(),
        "total_interactions": rel.total_interactions,
        "last_interaction": rel.last_interaction,
    })
}

/// Bearer JWT, HS256, `sub` is the user id. Anything off the happy path
/// is a plain 401; callers get no hint which part failed.
fn authorize(headers: &HeaderMap, secret: &str) -> Result<String> {
    let header = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let token = header.strip_prefix("Bearer ").unwrap_or("").trim();
    if token.is_empty() {
        return Err(CoreError::Unauthorized("missing bearer token".to_string()));
    }
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| CoreError::Unauthorized(format!("invalid token: {e}")))?;
    if data.claims.sub.trim().is_empty() {
        return Err(CoreError::Unauthorized("token has no subject".to_string()));
    }
    Ok(data.claims.sub)
}

fn ok(data: Value) -> Response {
    (
        StatusCode::OK,
        Json(Envelope {
            success: true,
            message: None,
            data: Some(data),
            error: None,
        }),
    )
        .into_response()
}

fn ok_with_message(message: &str, data: Value) -> Response {
    (
        StatusCode::OK,
        Json(Envelope {
            success: true,
            message: Some(message.to_string()),
            data: Some(data),
            error: None,
        }),
    )
        .into_response()
}

fn error_response(err: &CoreError) -> Response {
    let status = status_for(err);
    if status.is_server_error() {
        warn!(code = err.code(), %err, "request failed");
    }
    (
        status,
        Json(Envelope {
            success: false,
            message: None,
            data: None,
            error: Some(ErrorBody {
                code: err.code(),
                message: err.to_string(),
                details: None,
            }),
        }),
    )
        .into_response()
}

fn status_for(err: &CoreError) -> StatusCode {
    match err {
        CoreError::Validation(_) => StatusCode::BAD_REQUEST,
        CoreError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::Upstream { .. } => StatusCode::SERVICE_UNAVAILABLE,
        CoreError::UpstreamParse(_) => StatusCode::BAD_GATEWAY,
        CoreError::ContentBlocked(_) => StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS,
        CoreError::Deadline(_) => StatusCode::GATEWAY_TIMEOUT,
        CoreError::Config(_) | CoreError::Storage(_) | CoreError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub async fn run(state: AppState, host: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CoreError::Config(format!("bind {addr}: {e}")))?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CoreError::Internal(e.to_string()))?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "ctrl-c handler failed");
    }
    info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn mint(secret: &str, sub: &str) -> String {
        let claims = serde_json::json!({
            "sub": sub,
            "exp": (chrono::Utc::now().timestamp() + 3600) as usize,
        });
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", format!("Bearer {token}").parse().unwrap());
        headers
    }

    #[test]
    fn valid_token_yields_subject() {
        let token = mint("s3cret", "user-1");
        let user = authorize(&headers_with(&token), "s3cret").unwrap();
        assert_eq!(user, "user-1");
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let token = mint("other", "user-1");
        let err = authorize(&headers_with(&token), "s3cret").unwrap_err();
        assert_eq!(err.code(), "AUTH_ERROR");
    }

    #[test]
    fn missing_header_is_unauthorized() {
        let err = authorize(&HeaderMap::new(), "s3cret").unwrap_err();
        assert_eq!(err.code(), "AUTH_ERROR");
    }

    #[test]
    fn blocked_content_maps_to_451() {
        let err = CoreError::ContentBlocked("over cap".to_string());
        assert_eq!(status_for(&err), StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS);
    }
}
