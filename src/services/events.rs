/// Event Recorder - append-only playback events and suspicion stamping
///
/// Records discrete playback events against a session the caller owns, and
/// is the single place where suspicious-pattern metadata gets stamped onto
/// the event and the session row. Terminal events (`close`, `ended`) also
/// close the session through the same conditional write `end()` uses, so the
/// two paths converge on identical invariants: whichever fires first wins,
/// the other sees an already-closed session.
use crate::config::AbuseConfig;
use crate::db::{access_repo, event_repo, session_repo};
use crate::error::{AppError, Result};
use crate::models::{completion_percent, is_terminal_event, VideoEvent, WatchSession};
use sqlx::PgPool;
use uuid::Uuid;

pub struct EventRecorder {
    pool: PgPool,
    abuse: AbuseConfig,
}

impl EventRecorder {
    pub fn new(pool: PgPool, abuse: AbuseConfig) -> Self {
        Self { pool, abuse }
    }

    /// Append a playback event. No ordering constraint is enforced on the
    /// video timestamp across events (seeks are legitimate), but the
    /// timestamp itself must be a non-negative number.
    pub async fn record(
        &self,
        session_id: Uuid,
        viewer_id: Uuid,
        event_type: &str,
        video_timestamp_seconds: f64,
        metadata: Option<serde_json::Value>,
    ) -> Result<VideoEvent> {
        validate_event_input(event_type, video_timestamp_seconds, metadata.as_ref())?;

        let session = session_repo::find_session_by_id(&self.pool, session_id)
            .await?
            .filter(|s| s.viewer_id == viewer_id)
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

        let duration = access_repo::find_content(&self.pool, session.content_id)
            .await?
            .and_then(|c| c.duration_seconds);

        let active_count = session_repo::count_active_for_viewer(&self.pool, viewer_id).await?;

        let reasons = detect_suspicion(
            &self.abuse,
            &session,
            video_timestamp_seconds,
            duration,
            active_count,
        );

        let mut event_metadata = metadata.unwrap_or_else(|| serde_json::json!({}));
        if !reasons.is_empty() {
            tracing::warn!(
                %session_id, %viewer_id, ?reasons,
                "suspicious playback pattern detected"
            );

            if let Some(map) = event_metadata.as_object_mut() {
                map.insert("suspicious".to_string(), serde_json::json!(true));
                map.insert("suspicion_reasons".to_string(), serde_json::json!(reasons));
            }

            session_repo::mark_suspicious(&self.pool, session_id, &reasons).await?;
        }

        let event = event_repo::insert_event(
            &self.pool,
            session_id,
            event_type,
            video_timestamp_seconds,
            &event_metadata,
        )
        .await?;

        if is_terminal_event(event_type) {
            let completion = completion_percent(video_timestamp_seconds, duration);

            // Conditional close: a no-op when end() or a concurrent terminal
            // event already finalized the session.
            let closed = session_repo::close_session(
                &self.pool,
                session_id,
                viewer_id,
                video_timestamp_seconds,
                completion,
            )
            .await?;

            if let Some(closed) = closed {
                tracing::info!(
                    session_id = %closed.id,
                    event_type,
                    watched_seconds = closed.watched_seconds,
                    completion_percent = closed.completion_percent,
                    "session closed by terminal event"
                );
            }
        }

        Ok(event)
    }
}

/// Input validation for an incoming event. Metadata, when present, must be
/// a JSON object: it is an open map the suspicion flags get stamped into,
/// and any other shape would silently swallow them.
fn validate_event_input(
    event_type: &str,
    video_timestamp_seconds: f64,
    metadata: Option<&serde_json::Value>,
) -> Result<()> {
    if event_type.trim().is_empty() {
        return Err(AppError::Validation("event_type is required".to_string()));
    }
    if !video_timestamp_seconds.is_finite() || video_timestamp_seconds < 0.0 {
        return Err(AppError::Validation(
            "video_timestamp_seconds must be a non-negative number".to_string(),
        ));
    }
    if let Some(value) = metadata {
        if !value.is_object() {
            return Err(AppError::Validation(
                "metadata must be a JSON object".to_string(),
            ));
        }
    }

    Ok(())
}

/// Pure suspicion policy over one incoming event. Thresholds come from
/// `AbuseConfig`; the heuristics are a product decision, not a contract.
pub fn detect_suspicion(
    abuse: &AbuseConfig,
    session: &WatchSession,
    video_timestamp_seconds: f64,
    duration_seconds: Option<f64>,
    active_session_count: i64,
) -> Vec<&'static str> {
    const DURATION_SLACK_SECONDS: f64 = 5.0;

    let mut reasons = Vec::new();

    if video_timestamp_seconds - session.watched_seconds > abuse.max_timestamp_jump_seconds {
        reasons.push("timestamp_jump");
    }

    if let Some(duration) = duration_seconds {
        if duration > 0.0 && video_timestamp_seconds > duration + DURATION_SLACK_SECONDS {
            reasons.push("beyond_duration");
        }
    }

    if active_session_count >= abuse.max_concurrent_sessions {
        reasons.push("concurrent_sessions");
    }

    reasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn session_with_progress(watched_seconds: f64) -> WatchSession {
        WatchSession {
            id: Uuid::new_v4(),
            viewer_id: Uuid::new_v4(),
            content_id: Uuid::new_v4(),
            started_at: Utc::now(),
            ended_at: None,
            is_active: true,
            watched_seconds,
            completion_percent: 0.0,
            metadata: serde_json::json!({}),
        }
    }

    fn default_abuse() -> AbuseConfig {
        AbuseConfig {
            max_timestamp_jump_seconds: 600.0,
            max_concurrent_sessions: 3,
        }
    }

    #[test]
    fn event_input_validation() {
        assert!(validate_event_input("play", 10.0, None).is_ok());
        assert!(validate_event_input("play", 10.0, Some(&serde_json::json!({"q": "720p"}))).is_ok());

        let err = validate_event_input("", 10.0, None).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = validate_event_input("play", -1.0, None).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = validate_event_input("play", f64::NAN, None).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn non_object_metadata_is_rejected() {
        for bad in [
            serde_json::json!("a string"),
            serde_json::json!([1, 2, 3]),
            serde_json::json!(42),
        ] {
            let err = validate_event_input("play", 10.0, Some(&bad)).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "accepted {bad}");
        }
    }

    #[test]
    fn normal_playback_is_clean() {
        let session = session_with_progress(100.0);
        let reasons = detect_suspicion(&default_abuse(), &session, 130.0, Some(3600.0), 1);
        assert!(reasons.is_empty());
    }

    #[test]
    fn impossible_jump_is_flagged() {
        let session = session_with_progress(10.0);
        let reasons = detect_suspicion(&default_abuse(), &session, 2000.0, None, 1);
        assert_eq!(reasons, vec!["timestamp_jump"]);
    }

    #[test]
    fn timestamp_beyond_duration_is_flagged() {
        let session = session_with_progress(90.0);
        let reasons = detect_suspicion(&default_abuse(), &session, 120.0, Some(100.0), 1);
        assert_eq!(reasons, vec!["beyond_duration"]);
    }

    #[test]
    fn duration_slack_tolerates_rounding() {
        let session = session_with_progress(98.0);
        let reasons = detect_suspicion(&default_abuse(), &session, 103.0, Some(100.0), 1);
        assert!(reasons.is_empty());
    }

    #[test]
    fn many_concurrent_sessions_are_flagged() {
        let session = session_with_progress(50.0);
        let reasons = detect_suspicion(&default_abuse(), &session, 60.0, Some(3600.0), 3);
        assert_eq!(reasons, vec!["concurrent_sessions"]);
    }

    #[test]
    fn reasons_accumulate() {
        let session = session_with_progress(0.0);
        let reasons = detect_suspicion(&default_abuse(), &session, 5000.0, Some(100.0), 5);
        assert_eq!(
            reasons,
            vec!["timestamp_jump", "beyond_duration", "concurrent_sessions"]
        );
    }

    #[test]
    fn seeking_backwards_is_legitimate() {
        let session = session_with_progress(500.0);
        let reasons = detect_suspicion(&default_abuse(), &session, 10.0, Some(3600.0), 1);
        assert!(reasons.is_empty());
    }
}
