/// Session handlers - HTTP endpoints for the watch-session lifecycle
use crate::error::{AppError, Result};
use crate::middleware::UserId;
use crate::services::WatchSessionService;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub viewer_id: Uuid,
    pub content_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSessionRequest {
    pub session_id: Uuid,
    pub watched_seconds: f64,
}

#[derive(Debug, Deserialize)]
pub struct EndSessionRequest {
    pub session_id: Uuid,
    pub watched_seconds: f64,
}

#[derive(Debug, Serialize)]
pub struct EndSessionResponse {
    pub session_id: Uuid,
    pub watched_seconds: f64,
}

/// Start a viewing session
pub async fn start_session(
    pool: web::Data<PgPool>,
    user_id: UserId,
    req: web::Json<StartSessionRequest>,
) -> Result<HttpResponse> {
    // The body carries viewer_id for wire compatibility with the player
    // client; it must match the authenticated caller.
    if req.viewer_id != user_id.0 {
        return Err(AppError::Forbidden(
            "viewer_id does not match the authenticated user".to_string(),
        ));
    }

    let service = WatchSessionService::new((**pool).clone());
    let session = service.start(req.viewer_id, req.content_id).await?;

    Ok(HttpResponse::Created().json(StartSessionResponse {
        session_id: session.id,
    }))
}

/// Heartbeat progress update for an active session
pub async fn update_session(
    pool: web::Data<PgPool>,
    user_id: UserId,
    req: web::Json<UpdateSessionRequest>,
) -> Result<HttpResponse> {
    let service = WatchSessionService::new((**pool).clone());
    service
        .update(req.session_id, user_id.0, req.watched_seconds)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

/// Finalize a session
pub async fn end_session(
    pool: web::Data<PgPool>,
    user_id: UserId,
    req: web::Json<EndSessionRequest>,
) -> Result<HttpResponse> {
    let service = WatchSessionService::new((**pool).clone());
    let session = service
        .end(req.session_id, user_id.0, req.watched_seconds)
        .await?;

    Ok(HttpResponse::Ok().json(EndSessionResponse {
        session_id: session.id,
        watched_seconds: session.watched_seconds,
    }))
}

/// Force-close every active session the caller holds
pub async fn cleanup_sessions(pool: web::Data<PgPool>, user_id: UserId) -> Result<HttpResponse> {
    let service = WatchSessionService::new((**pool).clone());
    let closed = service.cleanup_all(user_id.0).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "closed": closed })))
}
