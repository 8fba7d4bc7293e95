use crate::models::VideoEvent;
use sqlx::PgPool;
use uuid::Uuid;

/// Append a playback event to a session. Events are append-only; nothing in
/// this service updates or deletes them.
pub async fn insert_event(
    pool: &PgPool,
    session_id: Uuid,
    event_type: &str,
    video_timestamp_seconds: f64,
    metadata: &serde_json::Value,
) -> Result<VideoEvent, sqlx::Error> {
    sqlx::query_as::<_, VideoEvent>(
        r#"
        INSERT INTO video_events (session_id, event_type, video_timestamp_seconds, metadata)
        VALUES ($1, $2, $3, $4)
        RETURNING id, session_id, event_type, video_timestamp_seconds, metadata, recorded_at
        "#,
    )
    .bind(session_id)
    .bind(event_type)
    .bind(video_timestamp_seconds)
    .bind(metadata)
    .fetch_one(pool)
    .await
}

/// Events for a session in recording order.
pub async fn find_events_for_session(
    pool: &PgPool,
    session_id: Uuid,
) -> Result<Vec<VideoEvent>, sqlx::Error> {
    sqlx::query_as::<_, VideoEvent>(
        r#"
        SELECT id, session_id, event_type, video_timestamp_seconds, metadata, recorded_at
        FROM video_events
        WHERE session_id = $1
        ORDER BY recorded_at ASC
        "#,
    )
    .bind(session_id)
    .fetch_all(pool)
    .await
}
