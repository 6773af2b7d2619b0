use std::fmt;
use std::str::FromStr;

use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
pub enum AnswerLetter {
    A,
    B,
    C,
    D,
    E,
}

impl AnswerLetter {
    pub const ALL: [AnswerLetter; 5] = [Self::A, Self::B, Self::C, Self::D, Self::E];

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }
}

impl fmt::Display for AnswerLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
        };
        f.write_str(s)
    }
}

impl FromStr for AnswerLetter {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            "E" => Ok(Self::E),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Question {
    id: Uuid,
    course_id: Option<Uuid>,
    statement: String,
    option_a: String,
    option_b: String,
    option_c: String,
    option_d: String,
    option_e: Option<String>,
    correct_answer: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct QuestionCreate {
    pub course_id: Option<Uuid>,
    pub statement: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub option_e: Option<String>,
    pub correct_answer: AnswerLetter,
}

impl QuestionCreate {
    /// A question may only point at an option it actually has.
    pub fn is_consistent(&self) -> bool {
        !self.statement.trim().is_empty()
            && (self.correct_answer != AnswerLetter::E || self.option_e.is_some())
    }
}

impl ResourceTyped for Question {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Question
    }
}

impl Question {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn course_id(&self) -> Option<Uuid> {
        self.course_id
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    pub fn options(&self) -> Vec<(AnswerLetter, &str)> {
        let mut options = vec![
            (AnswerLetter::A, self.option_a.as_str()),
            (AnswerLetter::B, self.option_b.as_str()),
            (AnswerLetter::C, self.option_c.as_str()),
            (AnswerLetter::D, self.option_d.as_str()),
        ];
        if let Some(e) = &self.option_e {
            options.push((AnswerLetter::E, e.as_str()));
        }
        options
    }

    pub fn correct_answer(&self) -> Option<AnswerLetter> {
        self.correct_answer.parse().ok()
    }
}

#[async_trait]
impl CrudRepository<Question, QuestionCreate, Uuid> for Question {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuestionCreate,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO questions (id, course_id, statement, option_a, option_b, option_c, option_d, option_e, correct_answer)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.course_id)
        .bind(&data.statement)
        .bind(&data.option_a)
        .bind(&data.option_b)
        .bind(&data.option_c)
        .bind(&data.option_d)
        .bind(&data.option_e)
        .bind(data.correct_answer.to_string())
        .fetch_one(mm.executor())
        .await?;

        Ok(created)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuestionCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query(
            r#"
            UPDATE questions
            SET course_id = ?, statement = ?, option_a = ?, option_b = ?, option_c = ?, option_d = ?, option_e = ?, correct_answer = ?
            WHERE id = ?
            "#,
        )
        .bind(data.course_id)
        .bind(&data.statement)
        .bind(&data.option_a)
        .bind(&data.option_b)
        .bind(&data.option_c)
        .bind(&data.option_d)
        .bind(&data.option_e)
        .bind(data.correct_answer.to_string())
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.course_id = data.course_id;
        self.statement = data.statement;
        self.option_a = data.option_a;
        self.option_b = data.option_b;
        self.option_c = data.option_c;
        self.option_d = data.option_d;
        self.option_e = data.option_e;
        self.correct_answer = data.correct_answer.to_string();
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM questions WHERE id = ?")
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
        let result = sqlx::query_as("SELECT * FROM questions WHERE id = ?")
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
        let result = sqlx::query_as("SELECT * FROM questions LIMIT ? OFFSET ?")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl Question {
    pub async fn all_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM questions WHERE course_id = ?")
            .bind(course_id)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn letters_parse_case_insensitively() {
        assert_eq!("a".parse::<AnswerLetter>(), Ok(AnswerLetter::A));
        assert_eq!(" E ".parse::<AnswerLetter>(), Ok(AnswerLetter::E));
        assert!("F".parse::<AnswerLetter>().is_err());
        assert!("".parse::<AnswerLetter>().is_err());
    }

    #[test]
    fn answer_e_requires_option_e() {
        let mut q = QuestionCreate {
            course_id: None,
            statement: "2 + 2?".into(),
            option_a: "1".into(),
            option_b: "2".into(),
            option_c: "3".into(),
            option_d: "4".into(),
            option_e: None,
            correct_answer: AnswerLetter::E,
        };
        assert!(!q.is_consistent());
        q.option_e = Some("5".into());
        assert!(q.is_consistent());
    }
}
