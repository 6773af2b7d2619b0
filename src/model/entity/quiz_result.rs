use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuizResult {
    id: Uuid,
    user_id: Uuid,
    quiz_id: Uuid,
    score: i64,
    taken_at: DateTime<Utc>,
}

impl ResourceTyped for QuizResult {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::QuizResult
    }
}

impl QuizResult {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn quiz_id(&self) -> Uuid {
        self.quiz_id
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    pub async fn record(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        quiz_id: Uuid,
        score: i64,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            "INSERT INTO quiz_results (id, user_id, quiz_id, score, taken_at) VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(quiz_id)
        .bind(score)
        .bind(Utc::now())
        .fetch_one(mm.executor())
        .await?;
        Ok(created)
    }

    pub async fn best_score(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        quiz_id: Uuid,
    ) -> DatabaseResult<Option<i64>> {
        let result: Option<i64> =
            sqlx::query_scalar("SELECT MAX(score) FROM quiz_results WHERE user_id = ? AND quiz_id = ?")
                .bind(user_id)
                .bind(quiz_id)
                .fetch_one(mm.executor())
                .await?;
        Ok(result)
    }
}

#[async_trait]
impl HasOwner for QuizResult {
    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Uuid> {
        Ok(self.user_id)
    }
}
