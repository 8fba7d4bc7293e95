/// Event handlers - HTTP endpoint for discrete playback events
use crate::config::Config;
use crate::error::Result;
use crate::middleware::UserId;
use crate::services::EventRecorder;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RecordEventRequest {
    pub session_id: Uuid,
    pub event_type: String,
    pub video_timestamp_seconds: f64,
    pub metadata: Option<serde_json::Value>,
}

/// Record a playback event against a session the caller owns
pub async fn record_event(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    user_id: UserId,
    req: web::Json<RecordEventRequest>,
) -> Result<HttpResponse> {
    let recorder = EventRecorder::new((**pool).clone(), config.abuse.clone());
    let req = req.into_inner();

    recorder
        .record(
            req.session_id,
            user_id.0,
            &req.event_type,
            req.video_timestamp_seconds,
            req.metadata,
        )
        .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({ "success": true })))
}
