use crate::models::WatchSession;
use sqlx::PgPool;
use uuid::Uuid;

const SESSION_COLUMNS: &str = "id, viewer_id, content_id, started_at, ended_at, is_active, \
                               watched_seconds, completion_percent, metadata";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Open a new session for (viewer, content), force-closing any session that
/// is still active for the same pair.
///
/// Close-then-insert runs in one transaction. Two concurrent callers can both
/// see no active row and race on the insert; the partial unique index rejects
/// the second commit with 23505, and that caller retries, closing the first
/// caller's freshly inserted row. The later writer always ends up owning the
/// single active session.
pub async fn start_session(
    pool: &PgPool,
    viewer_id: Uuid,
    content_id: Uuid,
) -> Result<WatchSession, sqlx::Error> {
    const MAX_ATTEMPTS: u32 = 3;

    let mut attempt = 0;
    loop {
        attempt += 1;
        match try_start_session(pool, viewer_id, content_id).await {
            Ok(session) => return Ok(session),
            Err(err) if is_unique_violation(&err) && attempt < MAX_ATTEMPTS => {
                tracing::debug!(
                    %viewer_id, %content_id, attempt,
                    "start raced with a concurrent start, retrying"
                );
            }
            Err(err) => return Err(err),
        }
    }
}

async fn try_start_session(
    pool: &PgPool,
    viewer_id: Uuid,
    content_id: Uuid,
) -> Result<WatchSession, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE watch_sessions
        SET is_active = FALSE, ended_at = NOW()
        WHERE viewer_id = $1 AND content_id = $2 AND is_active
        "#,
    )
    .bind(viewer_id)
    .bind(content_id)
    .execute(&mut *tx)
    .await?;

    let session = sqlx::query_as::<_, WatchSession>(&format!(
        r#"
        INSERT INTO watch_sessions (viewer_id, content_id)
        VALUES ($1, $2)
        RETURNING {SESSION_COLUMNS}
        "#
    ))
    .bind(viewer_id)
    .bind(content_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(session)
}

/// Find a session by id regardless of state.
pub async fn find_session_by_id(
    pool: &PgPool,
    session_id: Uuid,
) -> Result<Option<WatchSession>, sqlx::Error> {
    sqlx::query_as::<_, WatchSession>(&format!(
        r#"
        SELECT {SESSION_COLUMNS}
        FROM watch_sessions
        WHERE id = $1
        "#
    ))
    .bind(session_id)
    .fetch_optional(pool)
    .await
}

/// Update the watched progress of a session the caller owns.
///
/// The `is_active` predicate makes this a conditional write: a session closed
/// by a concurrent terminal event or `end` call matches zero rows and the
/// caller sees `None`.
pub async fn update_progress(
    pool: &PgPool,
    session_id: Uuid,
    viewer_id: Uuid,
    watched_seconds: f64,
    completion_percent: f64,
) -> Result<Option<WatchSession>, sqlx::Error> {
    sqlx::query_as::<_, WatchSession>(&format!(
        r#"
        UPDATE watch_sessions
        SET watched_seconds = $3, completion_percent = $4
        WHERE id = $1 AND viewer_id = $2 AND is_active
        RETURNING {SESSION_COLUMNS}
        "#
    ))
    .bind(session_id)
    .bind(viewer_id)
    .bind(watched_seconds)
    .bind(completion_percent)
    .fetch_optional(pool)
    .await
}

/// Close a session the caller owns, persisting its final progress. Returns
/// `None` if the session is unknown, not owned, or already closed.
pub async fn close_session(
    pool: &PgPool,
    session_id: Uuid,
    viewer_id: Uuid,
    watched_seconds: f64,
    completion_percent: f64,
) -> Result<Option<WatchSession>, sqlx::Error> {
    sqlx::query_as::<_, WatchSession>(&format!(
        r#"
        UPDATE watch_sessions
        SET is_active = FALSE,
            ended_at = NOW(),
            watched_seconds = $3,
            completion_percent = $4
        WHERE id = $1 AND viewer_id = $2 AND is_active
        RETURNING {SESSION_COLUMNS}
        "#
    ))
    .bind(session_id)
    .bind(viewer_id)
    .bind(watched_seconds)
    .bind(completion_percent)
    .fetch_optional(pool)
    .await
}

/// Force-close every active session owned by the viewer. Returns the number
/// of rows closed; zero is a successful no-op.
pub async fn close_all_for_viewer(pool: &PgPool, viewer_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE watch_sessions
        SET is_active = FALSE, ended_at = NOW()
        WHERE viewer_id = $1 AND is_active
        "#,
    )
    .bind(viewer_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Count active sessions a viewer currently holds across all contents.
pub async fn count_active_for_viewer(pool: &PgPool, viewer_id: Uuid) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM watch_sessions WHERE viewer_id = $1 AND is_active",
    )
    .bind(viewer_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Merge suspicion metadata into the session row. Reasons are unioned with
/// whatever is already recorded.
pub async fn mark_suspicious(
    pool: &PgPool,
    session_id: Uuid,
    reasons: &[&str],
) -> Result<(), sqlx::Error> {
    let reasons_json = serde_json::json!(reasons);

    sqlx::query(
        r#"
        UPDATE watch_sessions
        SET metadata = jsonb_set(
            jsonb_set(metadata, '{suspicious}', 'true'::jsonb),
            '{suspicion_reasons}',
            (
                SELECT COALESCE(jsonb_agg(DISTINCT reason), '[]'::jsonb)
                FROM jsonb_array_elements_text(
                    COALESCE(metadata->'suspicion_reasons', '[]'::jsonb) || $2::jsonb
                ) AS reason
            )
        )
        WHERE id = $1
        "#,
    )
    .bind(session_id)
    .bind(reasons_json)
    .execute(pool)
    .await?;

    Ok(())
}
