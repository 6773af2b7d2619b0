use crate::model::entity::Question;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Quiz {
    id: Uuid,
    min_score: i64,
    max_score: i64,
    max_minutes: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct QuizCreate {
    pub min_score: i64,
    pub max_score: i64,
    pub max_minutes: i64,
}

impl ResourceTyped for Quiz {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Quiz
    }
}

impl Quiz {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn min_score(&self) -> i64 {
        self.min_score
    }

    pub fn max_score(&self) -> i64 {
        self.max_score
    }

    pub fn max_minutes(&self) -> i64 {
        self.max_minutes
    }

    pub fn is_passing(&self, score: i64) -> bool {
        score >= self.min_score
    }
}

#[async_trait]
impl CrudRepository<Quiz, QuizCreate, Uuid> for Quiz {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuizCreate,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            "INSERT INTO quizzes (id, min_score, max_score, max_minutes) VALUES (?, ?, ?, ?) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.min_score)
        .bind(data.max_score)
        .bind(data.max_minutes)
        .fetch_one(mm.executor())
        .await?;

        Ok(created)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuizCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE quizzes SET min_score = ?, max_score = ?, max_minutes = ? WHERE id = ?")
            .bind(data.min_score)
            .bind(data.max_score)
            .bind(data.max_minutes)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.min_score = data.min_score;
        self.max_score = data.max_score;
        self.max_minutes = data.max_minutes;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM quizzes WHERE id = ?")
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
        let result = sqlx::query_as("SELECT * FROM quizzes WHERE id = ?")
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
        let result = sqlx::query_as("SELECT * FROM quizzes LIMIT ? OFFSET ?")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

/// A question attached to a quiz together with the points it is worth.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuestionBankEntry {
    quiz_id: Uuid,
    question_id: Uuid,
    points: i64,
}

impl ResourceTyped for QuestionBankEntry {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::QuestionBankEntry
    }
}

impl QuestionBankEntry {
    pub fn quiz_id(&self) -> Uuid {
        self.quiz_id
    }

    pub fn question_id(&self) -> Uuid {
        self.question_id
    }

    pub fn points(&self) -> i64 {
        self.points
    }

    pub async fn add(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        quiz_id: Uuid,
        question_id: Uuid,
        points: i64,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            "INSERT INTO question_bank (quiz_id, question_id, points) VALUES (?, ?, ?) RETURNING *",
        )
        .bind(quiz_id)
        .bind(question_id)
        .bind(points)
        .fetch_one(mm.executor())
        .await?;
        Ok(created)
    }

    pub async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM question_bank LIMIT ? OFFSET ?")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn all_by_quiz(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        quiz_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM question_bank WHERE quiz_id = ?")
            .bind(quiz_id)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }
}

impl Quiz {
    /// Questions of this quiz paired with their point values.
    pub async fn questions(
        &self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<(Question, i64)>> {
        let entries = QuestionBankEntry::all_by_quiz(mm, actor, self.id).await?;
        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            if let Some(question) = Question::find_by_id(mm, actor, entry.question_id).await? {
                out.push((question, entry.points));
            }
        }
        Ok(out)
    }
}
