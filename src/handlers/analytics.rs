/// Analytics handlers - teacher-scoped watch summaries
use crate::error::Result;
use crate::middleware::UserId;
use crate::services::AnalyticsService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct WatchSummaryQuery {
    pub course_id: Option<Uuid>,
    pub content_id: Option<Uuid>,
}

/// Watch activity rollup for the caller's assigned courses
pub async fn watch_summary(
    pool: web::Data<PgPool>,
    user_id: UserId,
    query: web::Query<WatchSummaryQuery>,
) -> Result<HttpResponse> {
    let service = AnalyticsService::new((**pool).clone());
    let summary = service
        .summarize(user_id.0, query.course_id, query.content_id)
        .await?;

    Ok(HttpResponse::Ok().json(summary))
}
