/// Watch-Session Manager - lifecycle of a viewing session
///
/// Owns the single-active-session invariant: at most one active session per
/// (viewer, content) pair. Every state transition is a conditional write in
/// the repository layer; this service adds entitlement checks and completion
/// recomputation.
use crate::db::{access_repo, session_repo};
use crate::error::{AppError, Result};
use crate::models::{completion_percent, WatchSession};
use crate::services::AccessChecker;
use sqlx::PgPool;
use uuid::Uuid;

pub struct WatchSessionService {
    pool: PgPool,
    access: AccessChecker,
}

impl WatchSessionService {
    pub fn new(pool: PgPool) -> Self {
        let access = AccessChecker::new(pool.clone());
        Self { pool, access }
    }

    /// Start a viewing session.
    ///
    /// Verifies the viewer and content exist and that the viewer is entitled
    /// to the owning course, then atomically replaces any still-active
    /// session for the same pair. Concurrent starts for one pair resolve to
    /// exactly one active row, owned by the later writer.
    pub async fn start(&self, viewer_id: Uuid, content_id: Uuid) -> Result<WatchSession> {
        let content = self.access.content(content_id).await?;

        if !self.access.can_view(viewer_id, &content).await? {
            return Err(AppError::Forbidden(
                "Not entitled to view this content".to_string(),
            ));
        }

        let session = session_repo::start_session(&self.pool, viewer_id, content_id).await?;

        tracing::info!(
            session_id = %session.id,
            %viewer_id,
            %content_id,
            "watch session started"
        );

        Ok(session)
    }

    /// Record a heartbeat progress update for an active session owned by the
    /// caller. Negative input is a validation error, not a silent clamp.
    pub async fn update(
        &self,
        session_id: Uuid,
        viewer_id: Uuid,
        watched_seconds: f64,
    ) -> Result<WatchSession> {
        if !watched_seconds.is_finite() || watched_seconds < 0.0 {
            return Err(AppError::Validation(
                "watched_seconds must be a non-negative number".to_string(),
            ));
        }

        let completion = self
            .completion_for_session(session_id, viewer_id, watched_seconds)
            .await?;

        session_repo::update_progress(&self.pool, session_id, viewer_id, watched_seconds, completion)
            .await?
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))
    }

    /// Finalize a session. Not idempotent: a second call (or a call after a
    /// terminal event already closed the session) fails with `NotFound`.
    pub async fn end(
        &self,
        session_id: Uuid,
        viewer_id: Uuid,
        watched_seconds: f64,
    ) -> Result<WatchSession> {
        if !watched_seconds.is_finite() || watched_seconds < 0.0 {
            return Err(AppError::Validation(
                "watched_seconds must be a non-negative number".to_string(),
            ));
        }

        let completion = self
            .completion_for_session(session_id, viewer_id, watched_seconds)
            .await?;

        let session = session_repo::close_session(
            &self.pool,
            session_id,
            viewer_id,
            watched_seconds,
            completion,
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found or already finalized".to_string()))?;

        tracing::info!(
            session_id = %session.id,
            watched_seconds,
            completion_percent = session.completion_percent,
            "watch session ended"
        );

        Ok(session)
    }

    /// Recovery escape hatch: force-close every active session the viewer
    /// holds. Idempotent; a viewer with nothing active is a no-op.
    pub async fn cleanup_all(&self, viewer_id: Uuid) -> Result<u64> {
        let closed = session_repo::close_all_for_viewer(&self.pool, viewer_id).await?;

        if closed > 0 {
            tracing::info!(%viewer_id, closed, "force-closed stale watch sessions");
        }

        Ok(closed)
    }

    /// Ownership pre-check plus completion recomputation. Re-reads the
    /// session and compares the viewer so that a foreign session id reports
    /// `NotFound` before any write is attempted.
    async fn completion_for_session(
        &self,
        session_id: Uuid,
        viewer_id: Uuid,
        watched_seconds: f64,
    ) -> Result<f64> {
        let session = session_repo::find_session_by_id(&self.pool, session_id)
            .await?
            .filter(|s| s.viewer_id == viewer_id)
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

        let duration = access_repo::find_content(&self.pool, session.content_id)
            .await?
            .and_then(|c| c.duration_seconds);

        Ok(completion_percent(watched_seconds, duration))
    }
}
