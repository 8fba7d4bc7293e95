/// Analytics Aggregator - per-teacher rollups over session rows
///
/// Read-only. The listed sessions are capped at one page; the aggregate
/// figures are computed over the whole filtered set with SQL aggregates so
/// the cap never skews the statistics.
use crate::error::{AppError, Result};
use crate::models::{WatchSession, WatchStats};
use crate::services::AccessChecker;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Newest-first page size for the session listing.
const SESSION_PAGE_SIZE: i64 = 100;

#[derive(Debug, Serialize)]
pub struct WatchSummary {
    pub sessions: Vec<WatchSession>,
    pub stats: WatchStats,
}

pub struct AnalyticsService {
    pool: PgPool,
    access: AccessChecker,
}

impl AnalyticsService {
    pub fn new(pool: PgPool) -> Self {
        let access = AccessChecker::new(pool.clone());
        Self { pool, access }
    }

    /// Summarize watch activity for the courses assigned to a teacher.
    ///
    /// Teachers with no assignments see an empty result set with all-zero
    /// stats. A `course_id` filter outside the assignment list is rejected
    /// as `Forbidden`.
    pub async fn summarize(
        &self,
        teacher_id: Uuid,
        course_id: Option<Uuid>,
        content_id: Option<Uuid>,
    ) -> Result<WatchSummary> {
        let assigned = self.access.require_teacher(teacher_id).await?;

        if assigned.is_empty() {
            return Ok(WatchSummary {
                sessions: Vec::new(),
                stats: WatchStats::empty(),
            });
        }

        if let Some(course) = course_id {
            if !assigned.contains(&course) {
                return Err(AppError::Forbidden(
                    "Course is not assigned to this teacher".to_string(),
                ));
            }
        }

        let sessions = sqlx::query_as::<_, WatchSession>(
            r#"
            SELECT ws.id, ws.viewer_id, ws.content_id, ws.started_at, ws.ended_at,
                   ws.is_active, ws.watched_seconds, ws.completion_percent, ws.metadata
            FROM watch_sessions ws
            JOIN contents c ON c.id = ws.content_id
            WHERE c.course_id = ANY($1)
              AND ($2::uuid IS NULL OR c.course_id = $2)
              AND ($3::uuid IS NULL OR ws.content_id = $3)
            ORDER BY ws.started_at DESC
            LIMIT $4
            "#,
        )
        .bind(&assigned)
        .bind(course_id)
        .bind(content_id)
        .bind(SESSION_PAGE_SIZE)
        .fetch_all(&self.pool)
        .await?;

        // COALESCE keeps the empty set at zero rather than NULL/NaN.
        let stats = sqlx::query_as::<_, WatchStats>(
            r#"
            SELECT COUNT(*)                                             AS total_sessions,
                   COUNT(*) FILTER (WHERE ws.is_active)                 AS active_sessions,
                   COALESCE(SUM(ws.watched_seconds), 0)::float8         AS total_watched_seconds,
                   COALESCE(AVG(ws.completion_percent), 0)::float8      AS average_completion,
                   COUNT(DISTINCT ws.viewer_id)                         AS unique_viewers,
                   COUNT(*) FILTER (
                       WHERE (ws.metadata->>'suspicious')::boolean IS TRUE
                   )                                                    AS suspicious_sessions
            FROM watch_sessions ws
            JOIN contents c ON c.id = ws.content_id
            WHERE c.course_id = ANY($1)
              AND ($2::uuid IS NULL OR c.course_id = $2)
              AND ($3::uuid IS NULL OR ws.content_id = $3)
            "#,
        )
        .bind(&assigned)
        .bind(course_id)
        .bind(content_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(WatchSummary { sessions, stats })
    }
}
