/// Access Grant Checker - read-only entitlement checks
///
/// A single read interface with role-dependent filtering: admins see
/// everything, teachers see their assigned courses, students see the courses
/// they are enrolled in. Ownership of the underlying tables lives in the
/// wider platform.
use crate::db::access_repo;
use crate::error::{AppError, Result};
use crate::models::{ContentRef, UserRole};
use sqlx::PgPool;
use uuid::Uuid;

pub struct AccessChecker {
    pool: PgPool,
}

impl AccessChecker {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Role of a known user; `NotFound` when the user does not exist,
    /// `Internal` when the stored role string is not one this service knows.
    pub async fn user_role(&self, user_id: Uuid) -> Result<UserRole> {
        let raw = access_repo::find_user_role(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        UserRole::parse(&raw)
            .ok_or_else(|| AppError::Internal(format!("unknown role '{raw}' for user {user_id}")))
    }

    /// Resolve a content id; `NotFound` when it does not exist.
    pub async fn content(&self, content_id: Uuid) -> Result<ContentRef> {
        access_repo::find_content(&self.pool, content_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Content not found".to_string()))
    }

    /// Whether the viewer is entitled to watch the given content.
    pub async fn can_view(&self, viewer_id: Uuid, content: &ContentRef) -> Result<bool> {
        let role = self.user_role(viewer_id).await?;

        let entitled = match role {
            UserRole::Admin => true,
            UserRole::Teacher => {
                access_repo::is_assigned_teacher(&self.pool, viewer_id, content.course_id).await?
            }
            UserRole::Student => {
                access_repo::is_enrolled(&self.pool, viewer_id, content.course_id).await?
            }
        };

        Ok(entitled)
    }

    /// Assigned course list for a caller that must be a teacher. `Forbidden`
    /// for every other role; an empty assignment list is a valid answer, not
    /// an error.
    pub async fn require_teacher(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let role = self.user_role(user_id).await?;
        if role != UserRole::Teacher {
            return Err(AppError::Forbidden(
                "Analytics are available to teachers only".to_string(),
            ));
        }

        Ok(access_repo::assigned_course_ids(&self.pool, user_id).await?)
    }
}
