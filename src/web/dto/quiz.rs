use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::{AnswerLetter, Question, QuestionCreate, Quiz};
use crate::quiz::GeneratedQuestion;
use crate::web::{WebError, WebResult};

/// Question as sent by admins; the answer letter is checked on conversion.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct QuestionBody {
    pub course_id: Option<Uuid>,
    pub statement: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub option_e: Option<String>,
    pub correct_answer: String,
}

impl QuestionBody {
    pub fn into_create(self, course_id: Option<Uuid>) -> WebResult<QuestionCreate> {
        let correct_answer: AnswerLetter = self
            .correct_answer
            .parse()
            .map_err(|_| WebError::invalid_field("correct_answer", "must be one of A, B, C, D, E"))?;

        let option_e = self.option_e.filter(|e| !e.trim().is_empty());
        let create = QuestionCreate {
            course_id: course_id.or(self.course_id),
            statement: self.statement,
            option_a: self.option_a,
            option_b: self.option_b,
            option_c: self.option_c,
            option_d: self.option_d,
            option_e,
            correct_answer,
        };
        if !create.is_consistent() {
            return Err(WebError::invalid_field(
                "correct_answer",
                "points to a missing option or the statement is empty",
            ));
        }
        Ok(create)
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct GenerateBody {
    pub transcript: Option<String>,
    /// Must be a positive integer
    #[schema(value_type = Option<u32>)]
    pub question_count: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct GeneratedQuestionsResponse {
    pub questions: Vec<GeneratedQuestion>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AttachQuestionBody {
    pub question_id: Uuid,
    pub points: i64,
}

/// Question as shown to clients; the answer is only filled in for admins.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct QuestionView {
    pub id: Uuid,
    pub statement: String,
    pub options: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<AnswerLetter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<i64>,
}

impl QuestionView {
    pub fn new(question: &Question, points: Option<i64>, reveal: bool) -> Self {
        Self {
            id: question.id(),
            statement: question.statement().to_string(),
            options: question
                .options()
                .into_iter()
                .map(|(letter, text)| (letter.to_string(), text.to_string()))
                .collect(),
            correct_answer: if reveal {
                question.correct_answer()
            } else {
                None
            },
            points,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct QuizView {
    pub quiz: Quiz,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SubmitBody {
    /// Question id to chosen letter
    pub answers: HashMap<Uuid, String>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SubmitResponse {
    pub result_id: Uuid,
    pub score: i64,
    pub max_score: i64,
    pub min_score: i64,
    pub passed: bool,
}

#[cfg(test)]
mod test {
    use super::*;

    fn body(answer: &str, option_e: Option<&str>) -> QuestionBody {
        QuestionBody {
            course_id: None,
            statement: "Qual?".into(),
            option_a: "a".into(),
            option_b: "b".into(),
            option_c: "c".into(),
            option_d: "d".into(),
            option_e: option_e.map(String::from),
            correct_answer: answer.into(),
        }
    }

    #[test]
    fn answer_letter_is_checked() {
        assert!(body("b", None).into_create(None).is_ok());
        assert!(body("F", None).into_create(None).is_err());
        assert!(body("E", None).into_create(None).is_err());
        assert!(body("E", Some("  ")).into_create(None).is_err());
        assert!(body("E", Some("e")).into_create(None).is_ok());
    }

    #[test]
    fn explicit_course_wins() {
        let course = Uuid::new_v4();
        let create = body("A", None).into_create(Some(course)).unwrap();
        assert_eq!(create.course_id, Some(course));
    }
}
