/// Data models for watch-service
///
/// This module defines structures for:
/// - WatchSession: one row per viewing attempt
/// - VideoEvent: append-only playback events
/// - UserRole: role carried by the external users table
/// - WatchStats: per-teacher aggregate figures
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Viewer role as stored in the platform's users table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Teacher,
    Student,
}

impl UserRole {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "admin" => Some(UserRole::Admin),
            "teacher" => Some(UserRole::Teacher),
            "student" => Some(UserRole::Student),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Teacher => "teacher",
            UserRole::Student => "student",
        }
    }
}

/// One viewing attempt. At most one row per (viewer, content) pair has
/// `is_active = true` at any instant; closed rows are retained for analytics.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WatchSession {
    pub id: Uuid,
    pub viewer_id: Uuid,
    pub content_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub watched_seconds: f64,
    pub completion_percent: f64,
    pub metadata: serde_json::Value,
}

/// One discrete playback event (`play`, `pause`, `seek`, `close`, `ended`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VideoEvent {
    pub id: Uuid,
    pub session_id: Uuid,
    pub event_type: String,
    pub video_timestamp_seconds: f64,
    pub metadata: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

/// A content row as the service needs it: owning course plus duration.
#[derive(Debug, Clone, FromRow)]
pub struct ContentRef {
    pub id: Uuid,
    pub course_id: Uuid,
    pub duration_seconds: Option<f64>,
}

/// Aggregate figures over a filtered set of sessions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WatchStats {
    pub total_sessions: i64,
    pub active_sessions: i64,
    pub total_watched_seconds: f64,
    pub average_completion: f64,
    pub unique_viewers: i64,
    pub suspicious_sessions: i64,
}

impl WatchStats {
    pub fn empty() -> Self {
        Self {
            total_sessions: 0,
            active_sessions: 0,
            total_watched_seconds: 0.0,
            average_completion: 0.0,
            unique_viewers: 0,
            suspicious_sessions: 0,
        }
    }
}

/// Terminal playback events force session closure.
pub fn is_terminal_event(event_type: &str) -> bool {
    matches!(event_type, "close" | "ended")
}

/// Completion percentage clamped to [0, 100]; 0 when the duration is unknown
/// or not positive.
pub fn completion_percent(watched_seconds: f64, duration_seconds: Option<f64>) -> f64 {
    match duration_seconds {
        Some(duration) if duration > 0.0 => {
            (watched_seconds / duration * 100.0).clamp(0.0, 100.0)
        }
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_is_proportional() {
        assert_eq!(completion_percent(50.0, Some(100.0)), 50.0);
        assert_eq!(completion_percent(80.0, Some(100.0)), 80.0);
    }

    #[test]
    fn completion_clamps_to_one_hundred() {
        assert_eq!(completion_percent(250.0, Some(100.0)), 100.0);
    }

    #[test]
    fn completion_without_duration_is_zero() {
        assert_eq!(completion_percent(50.0, None), 0.0);
        assert_eq!(completion_percent(50.0, Some(0.0)), 0.0);
        assert_eq!(completion_percent(50.0, Some(-1.0)), 0.0);
    }

    #[test]
    fn terminal_events() {
        assert!(is_terminal_event("close"));
        assert!(is_terminal_event("ended"));
        assert!(!is_terminal_event("play"));
        assert!(!is_terminal_event("seek"));
    }

    #[test]
    fn role_parsing_round_trips() {
        for role in [UserRole::Admin, UserRole::Teacher, UserRole::Student] {
            assert_eq!(UserRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(UserRole::parse("superuser"), None);
    }
}
