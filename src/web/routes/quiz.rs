use axum::{
    Json, Router,
    extract::{Path, State},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, ResourceTyped,
        entity::{AnswerLetter, Question, QuestionBankEntry, Quiz, QuizCreate, QuizResult},
    },
    web::{
        ApiResponse, AppState, RequestContext, WebError, WebResult,
        dto::quiz::{
            AttachQuestionBody, GenerateBody, GeneratedQuestionsResponse, QuestionBody,
            QuestionView, QuizView, SubmitBody, SubmitResponse,
        },
        error::ErrorResponse,
        middlewares, validation,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/quiz", post(create_quiz_handler))
        .route("/quiz/generate", post(generate_handler))
        .route("/quiz/forms", post(create_question_handler))
        .route("/quiz/{id}", get(get_quiz_handler))
        .route("/quiz/{id}/questions", post(attach_question_handler))
        .route("/quiz/{id}/submit", post(submit_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

/// Accepts a JSON number or a numeric string, as long as it is positive.
fn question_count(value: Option<&serde_json::Value>) -> WebResult<u32> {
    let invalid = || WebError::invalid_field("question_count", "must be a positive integer");
    let count = match value {
        Some(serde_json::Value::Number(n)) => n.as_u64().ok_or_else(invalid)?,
        Some(serde_json::Value::String(s)) => s.trim().parse::<u64>().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };
    match u32::try_from(count) {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(invalid()),
    }
}

#[utoipa::path(
    post,
    path = "/quiz/generate",
    request_body = GenerateBody,
    description = "Generates multiple-choice questions from a lesson transcript",
    responses(
        (status = 200, description = "Generated questions", body = ApiResponse<GeneratedQuestionsResponse>),
        (status = 400, description = "Missing transcript or bad question count", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 502, description = "Question generator failed", body = ErrorResponse),
    ),
    tag = "quiz",
    security(("cookie" = []))
)]
#[tracing::instrument(skip_all)]
async fn generate_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<GenerateBody>,
) -> WebResult<impl IntoResponse> {
    ctx.user()?;
    let transcript = validation::required("transcript", payload.transcript.as_deref())?;
    let count = question_count(payload.question_count.as_ref())?;

    let questions = state
        .services()
        .questions
        .generate(transcript, count)
        .await
        .map_err(WebError::upstream)?;

    tracing::debug!(count = questions.len(), "Questions generated.");
    Ok(ApiResponse::ok(
        "Questions generated.",
        GeneratedQuestionsResponse { questions },
    ))
}

#[utoipa::path(
    post,
    path = "/quiz/forms",
    request_body = QuestionBody,
    responses(
        (status = 201, description = "Question created", body = ApiResponse<Question>),
        (status = 400, description = "Invalid answer letter", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
    ),
    tag = "quiz",
    security(("cookie" = []))
)]
#[tracing::instrument(skip_all)]
async fn create_question_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<QuestionBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let create = payload.into_create(None)?;

    let question = Question::create(state.pool(), user, create)
        .await
        .map_err(WebError::from_db(Question::get_resource_type()))?;

    Ok(ApiResponse::created("Question created.", question))
}

#[utoipa::path(
    post,
    path = "/quiz",
    request_body = QuizCreate,
    responses(
        (status = 201, description = "Quiz created", body = ApiResponse<Quiz>),
        (status = 400, description = "Inconsistent scores or duration", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
    ),
    tag = "quiz",
    security(("cookie" = []))
)]
async fn create_quiz_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<QuizCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    if payload.min_score < 0 || payload.min_score > payload.max_score {
        return Err(WebError::invalid_field(
            "min_score",
            "must be between 0 and max_score",
        ));
    }
    if payload.max_minutes <= 0 {
        return Err(WebError::invalid_field("max_minutes", "must be positive"));
    }

    let quiz = Quiz::create(state.pool(), user, payload)
        .await
        .map_err(WebError::from_db(Quiz::get_resource_type()))?;

    Ok(ApiResponse::created("Quiz created.", quiz))
}

#[utoipa::path(
    post,
    path = "/quiz/{id}/questions",
    params(("id" = Uuid, Path, description = "Quiz id")),
    request_body = AttachQuestionBody,
    responses(
        (status = 201, description = "Question attached", body = ApiResponse<QuestionBankEntry>),
        (status = 400, description = "Negative points", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Quiz or question not found", body = ErrorResponse),
        (status = 409, description = "Question already attached", body = ErrorResponse),
    ),
    tag = "quiz",
    security(("cookie" = []))
)]
async fn attach_question_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AttachQuestionBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    if payload.points < 0 {
        return Err(WebError::invalid_field("points", "must not be negative"));
    }

    let quiz = Quiz::find_by_id(state.pool(), user, id)
        .await
        .map_err(WebError::from_db(Quiz::get_resource_type()))?
        .ok_or(WebError::resource_not_found(Quiz::get_resource_type()))?;
    let question = Question::find_by_id(state.pool(), user, payload.question_id)
        .await
        .map_err(WebError::from_db(Question::get_resource_type()))?
        .ok_or(WebError::resource_not_found(Question::get_resource_type()))?;

    let entry = QuestionBankEntry::add(state.pool(), user, quiz.id(), question.id(), payload.points)
        .await
        .map_err(WebError::from_db(QuestionBankEntry::get_resource_type()))?;

    Ok(ApiResponse::created("Question attached.", entry))
}

#[utoipa::path(
    get,
    path = "/quiz/{id}",
    params(("id" = Uuid, Path, description = "Quiz id")),
    responses(
        (status = 200, description = "Quiz with its questions", body = ApiResponse<QuizView>),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
    ),
    tag = "quiz",
    security(("cookie" = []))
)]
async fn get_quiz_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let quiz = Quiz::find_by_id(state.pool(), user, id)
        .await
        .map_err(WebError::from_db(Quiz::get_resource_type()))?
        .ok_or(WebError::resource_not_found(Quiz::get_resource_type()))?;

    let questions = quiz
        .questions(state.pool(), user)
        .await
        .map_err(WebError::from_db(Question::get_resource_type()))?
        .iter()
        .map(|(question, points)| QuestionView::new(question, Some(*points), user.is_admin()))
        .collect();

    Ok(ApiResponse::ok("Quiz.", QuizView { quiz, questions }))
}

#[utoipa::path(
    post,
    path = "/quiz/{id}/submit",
    params(("id" = Uuid, Path, description = "Quiz id")),
    request_body = SubmitBody,
    description = "Scores the answers against the question bank and stores the result",
    responses(
        (status = 201, description = "Result stored", body = ApiResponse<SubmitResponse>),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
    ),
    tag = "quiz",
    security(("cookie" = []))
)]
#[tracing::instrument(skip_all, fields(quiz_id = %id))]
async fn submit_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let quiz = Quiz::find_by_id(state.pool(), user, id)
        .await
        .map_err(WebError::from_db(Quiz::get_resource_type()))?
        .ok_or(WebError::resource_not_found(Quiz::get_resource_type()))?;

    let questions = quiz
        .questions(state.pool(), user)
        .await
        .map_err(WebError::from_db(Question::get_resource_type()))?;

    let score = questions
        .iter()
        .filter(|(question, _)| {
            let chosen = payload
                .answers
                .get(&question.id())
                .and_then(|answer| answer.parse::<AnswerLetter>().ok());
            chosen.is_some() && chosen == question.correct_answer()
        })
        .map(|(_, points)| points)
        .sum::<i64>();

    let result = QuizResult::record(state.pool(), user, user.user_id(), quiz.id(), score)
        .await
        .map_err(WebError::from_db(QuizResult::get_resource_type()))?;

    tracing::info!(user_id = %user.user_id(), score, "Quiz submitted.");
    Ok(ApiResponse::created(
        "Quiz submitted.",
        SubmitResponse {
            result_id: result.id(),
            score,
            max_score: quiz.max_score(),
            min_score: quiz.min_score(),
            passed: quiz.is_passing(score),
        },
    ))
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn question_count_must_be_positive() {
        assert_eq!(question_count(Some(&json!(5))).unwrap(), 5);
        assert_eq!(question_count(Some(&json!("3"))).unwrap(), 3);
        assert!(question_count(Some(&json!(0))).is_err());
        assert!(question_count(Some(&json!(-2))).is_err());
        assert!(question_count(Some(&json!(2.5))).is_err());
        assert!(question_count(Some(&json!("abc"))).is_err());
        assert!(question_count(None).is_err());
    }
}
