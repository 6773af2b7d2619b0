use crate::impl_paginatable_for;
use crate::model::entity::{LessonDraft, QuestionCreate};
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Course {
    id: Uuid,
    name: String,
    description: String,
    estimated_hours: i64,
    certificate_text: String,
    quiz_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseCreate {
    pub name: String,
    pub description: String,
    pub estimated_hours: i64,
    #[serde(default)]
    pub certificate_text: String,
    pub quiz_id: Option<Uuid>,
}

impl ResourceTyped for Course {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Course
    }
}

impl Course {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn estimated_hours(&self) -> i64 {
        self.estimated_hours
    }

    pub fn certificate_text(&self) -> &str {
        &self.certificate_text
    }

    pub fn quiz_id(&self) -> Option<Uuid> {
        self.quiz_id
    }
}

/// Folds text the same way for stored courses and search queries.
fn search_key(text: &str) -> String {
    text.to_lowercase()
}

#[async_trait]
impl CrudRepository<Course, CourseCreate, Uuid> for Course {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            "INSERT INTO courses (id, name, description, estimated_hours, certificate_text, quiz_id, name_key, description_key) VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.estimated_hours)
        .bind(&data.certificate_text)
        .bind(data.quiz_id)
        .bind(search_key(&data.name))
        .bind(search_key(&data.description))
        .fetch_one(mm.executor())
        .await?;

        Ok(created)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query(
            "UPDATE courses SET name = ?, description = ?, estimated_hours = ?, certificate_text = ?, quiz_id = ?, name_key = ?, description_key = ? WHERE id = ?",
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.estimated_hours)
        .bind(&data.certificate_text)
        .bind(data.quiz_id)
        .bind(search_key(&data.name))
        .bind(search_key(&data.description))
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.name = data.name;
        self.description = data.description;
        self.estimated_hours = data.estimated_hours;
        self.certificate_text = data.certificate_text;
        self.quiz_id = data.quiz_id;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM courses WHERE id = ?")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM courses WHERE id = ?")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM courses ORDER BY name LIMIT ? OFFSET ?")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Course, CourseCreate, Uuid);

impl Course {
    pub async fn find_by_name(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        name: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM courses WHERE name = ?")
            .bind(name)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    /// Case-insensitive substring search over name and description.
    pub async fn search(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        query: &str,
    ) -> DatabaseResult<Vec<Self>> {
        let escaped = query
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("%{}%", search_key(&escaped));

        let result = sqlx::query_as(
            r#"
            SELECT * FROM courses
            WHERE name_key LIKE ? ESCAPE '\'
               OR description_key LIKE ? ESCAPE '\'
            ORDER BY name
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    /// Inserts a course together with its lessons and questions atomically.
    pub async fn create_with_content(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course: CourseCreate,
        lessons: Vec<LessonDraft>,
        questions: Vec<QuestionCreate>,
    ) -> DatabaseResult<Self> {
        let mut tx = mm.executor().begin().await?;

        let created: Course = sqlx::query_as(
            "INSERT INTO courses (id, name, description, estimated_hours, certificate_text, quiz_id, name_key, description_key) VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&course.name)
        .bind(&course.description)
        .bind(course.estimated_hours)
        .bind(&course.certificate_text)
        .bind(course.quiz_id)
        .bind(search_key(&course.name))
        .bind(search_key(&course.description))
        .fetch_one(&mut *tx)
        .await?;

        for (idx, lesson) in lessons.into_iter().enumerate() {
            sqlx::query(
                "INSERT INTO lessons (id, course_id, title, description, video_url, order_index) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4())
            .bind(created.id)
            .bind(&lesson.title)
            .bind(&lesson.description)
            .bind(&lesson.video_url)
            .bind(lesson.order_index.unwrap_or(idx as i64))
            .execute(&mut *tx)
            .await?;
        }

        for question in questions {
            sqlx::query(
                r#"
                INSERT INTO questions (id, course_id, statement, option_a, option_b, option_c, option_d, option_e, correct_answer)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(created.id)
            .bind(&question.statement)
            .bind(&question.option_a)
            .bind(&question.option_b)
            .bind(&question.option_c)
            .bind(&question.option_d)
            .bind(&question.option_e)
            .bind(question.correct_answer.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(created)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn search_key_folds_accented_capitals() {
        assert_eq!(search_key("ÉTICA PROFISSIONAL"), "ética profissional");
        assert_eq!(search_key("Introdução À Computação"), "introdução à computação");
    }
}
