use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

pub const PROGRESS_MAX: i64 = 100;

/// Enrolment of a user in a course.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct CourseProgress {
    user_id: Uuid,
    course_id: Uuid,
    progress: i64,
    finished_at: Option<DateTime<Utc>>,
}

/// Enrolment joined with the course name, as listed to users.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct CourseProgressRow {
    pub course_id: Uuid,
    pub course_name: String,
    pub progress: i64,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ResourceTyped for CourseProgress {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::CourseProgress
    }
}

impl CourseProgress {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn progress(&self) -> i64 {
        self.progress
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn is_finished(&self) -> bool {
        self.progress >= PROGRESS_MAX
    }

    pub async fn enroll(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            "INSERT INTO course_progress (user_id, course_id, progress) VALUES (?, ?, 0) RETURNING *",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(created)
    }

    pub async fn find(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result =
            sqlx::query_as("SELECT * FROM course_progress WHERE user_id = ? AND course_id = ?")
                .bind(user_id)
                .bind(course_id)
                .fetch_optional(mm.executor())
                .await?;
        Ok(result)
    }

    /// Sets the progress; the first time it reaches the maximum the
    /// completion time is stamped.
    pub async fn set_progress(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        progress: i64,
    ) -> DatabaseResult<Self> {
        let finished_at = match (progress >= PROGRESS_MAX, self.finished_at) {
            (true, Some(at)) => Some(at),
            (true, None) => Some(Utc::now()),
            (false, _) => None,
        };

        sqlx::query(
            "UPDATE course_progress SET progress = ?, finished_at = ? WHERE user_id = ? AND course_id = ?",
        )
        .bind(progress)
        .bind(finished_at)
        .bind(self.user_id)
        .bind(self.course_id)
        .execute(mm.executor())
        .await?;

        self.progress = progress;
        self.finished_at = finished_at;
        Ok(self)
    }

    pub async fn all_by_user(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
    ) -> DatabaseResult<Vec<CourseProgressRow>> {
        let result = sqlx::query_as(
            r#"
            SELECT cp.course_id AS course_id, c.name AS course_name, cp.progress AS progress, cp.finished_at AS finished_at
            FROM course_progress cp
            JOIN courses c ON c.id = cp.course_id
            WHERE cp.user_id = ?
            ORDER BY c.name
            "#,
        )
        .bind(user_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }
}

#[async_trait]
impl HasOwner for CourseProgress {
    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Uuid> {
        Ok(self.user_id)
    }
}
