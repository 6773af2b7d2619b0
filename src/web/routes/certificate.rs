use axum::{
    Router,
    extract::{Query, State},
    http::header,
    middleware,
    response::IntoResponse,
    routing::get,
};

use crate::{
    certificate::render_certificate,
    model::{
        CrudRepository, ResourceTyped,
        entity::{Course, CourseProgress, Quiz, QuizResult, UserEntity},
    },
    web::{
        AppState, RequestContext, WebError, WebResult, dto::courses::CertificateQuery,
        error::ErrorResponse, middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/class/certificate", get(certificate_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/class/certificate",
    params(CertificateQuery),
    description = "Issues the completion certificate of a finished course as a PDF",
    responses(
        (status = 200, description = "Certificate PDF", content_type = "application/pdf", body = Vec<u8>),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 403, description = "Course unfinished or quiz not passed", body = ErrorResponse),
        (status = 404, description = "Course not found or not enrolled", body = ErrorResponse),
    ),
    tag = "certificate",
    security(("cookie" = []))
)]
#[tracing::instrument(skip_all, fields(course_id = %query.course_id))]
async fn certificate_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Query(query): Query<CertificateQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = Course::find_by_id(state.pool(), user, query.course_id)
        .await
        .map_err(WebError::from_db(Course::get_resource_type()))?
        .ok_or(WebError::resource_not_found(Course::get_resource_type()))?;

    let progress = CourseProgress::find(state.pool(), user, user.user_id(), course.id())
        .await
        .map_err(WebError::from_db(CourseProgress::get_resource_type()))?
        .ok_or(WebError::resource_not_found(
            CourseProgress::get_resource_type(),
        ))?;
    if !progress.is_finished() {
        return Err(WebError::resource_forbidden(
            crate::model::ResourceType::Certificate,
        ));
    }

    if let Some(quiz_id) = course.quiz_id() {
        let quiz = Quiz::find_by_id(state.pool(), user, quiz_id)
            .await
            .map_err(WebError::from_db(Quiz::get_resource_type()))?;
        if let Some(quiz) = quiz {
            let best = QuizResult::best_score(state.pool(), user, user.user_id(), quiz.id())
                .await
                .map_err(WebError::from_db(QuizResult::get_resource_type()))?;
            if !best.is_some_and(|score| quiz.is_passing(score)) {
                return Err(WebError::resource_forbidden(
                    crate::model::ResourceType::Certificate,
                ));
            }
        }
    }

    let owner = UserEntity::find_by_id(state.pool(), user, user.user_id())
        .await
        .map_err(WebError::from_db(UserEntity::get_resource_type()))?
        .ok_or(WebError::resource_not_found(UserEntity::get_resource_type()))?;

    let pdf = render_certificate(
        owner.full_name(),
        course.name(),
        course.estimated_hours(),
        course.certificate_text(),
    )
    .map_err(WebError::server_certificate_error)?;

    tracing::info!(user_id = %owner.id(), "Certificate issued.");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"certificado-{}.pdf\"", course.id()),
            ),
        ],
        pdf,
    ))
}
