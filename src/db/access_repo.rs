use crate::models::ContentRef;
use sqlx::PgPool;
use uuid::Uuid;

/// Role string for a user, `None` when the user is unknown. Entitlement data
/// is owned by the wider platform; this service only reads it.
pub async fn find_user_role(pool: &PgPool, user_id: Uuid) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(String,)> = sqlx::query_as("SELECT role FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|(role,)| role))
}

/// Resolve a content id to its owning course and duration.
pub async fn find_content(
    pool: &PgPool,
    content_id: Uuid,
) -> Result<Option<ContentRef>, sqlx::Error> {
    sqlx::query_as::<_, ContentRef>(
        "SELECT id, course_id, duration_seconds FROM contents WHERE id = $1",
    )
    .bind(content_id)
    .fetch_optional(pool)
    .await
}

/// Whether the user is enrolled in the course as a learner.
pub async fn is_enrolled(pool: &PgPool, user_id: Uuid, course_id: Uuid) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM course_enrollments WHERE user_id = $1 AND course_id = $2
        )
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Whether the user is assigned to teach the course.
pub async fn is_assigned_teacher(
    pool: &PgPool,
    teacher_id: Uuid,
    course_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM course_teachers WHERE teacher_id = $1 AND course_id = $2
        )
        "#,
    )
    .bind(teacher_id)
    .bind(course_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// All course ids the teacher is assigned to.
pub async fn assigned_course_ids(
    pool: &PgPool,
    teacher_id: Uuid,
) -> Result<Vec<Uuid>, sqlx::Error> {
    let rows: Vec<(Uuid,)> =
        sqlx::query_as("SELECT course_id FROM course_teachers WHERE teacher_id = $1")
            .bind(teacher_id)
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}
