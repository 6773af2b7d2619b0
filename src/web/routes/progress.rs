use axum::{
    Json, Router,
    extract::State,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, ResourceTyped, check_access,
        entity::{Course, CourseProgress, CourseProgressRow, PROGRESS_MAX, UserEntity},
    },
    web::{
        ApiResponse, AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::progress::{CurrentCourseBody, CurrentCourseResponse, EnrollBody, ProgressBody},
        error::ErrorResponse,
        middlewares::{self, current_course, set_current_course},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/courses/create-relation", post(enroll_handler))
        .route("/courses/update-progress", post(update_progress_handler))
        .route("/courses/in-progress", get(in_progress_handler))
        .route("/courses/set-current", post(set_current_handler))
        .route("/courses/get-current", get(get_current_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

/// Whose progress is being touched. Only admins may name another user.
async fn target_user(
    state: &AppState,
    user: &AuthenticatedUser,
    requested: Option<Uuid>,
) -> WebResult<Uuid> {
    match requested {
        None => Ok(user.user_id()),
        Some(id) if id == user.user_id() => Ok(id),
        Some(id) => {
            if !user.is_admin() {
                return Err(WebError::admin_required());
            }
            let found = UserEntity::find_by_id(state.pool(), user, id)
                .await
                .map_err(WebError::from_db(UserEntity::get_resource_type()))?
                .ok_or(WebError::resource_not_found(UserEntity::get_resource_type()))?;
            Ok(found.id())
        }
    }
}

#[utoipa::path(
    post,
    path = "/courses/create-relation",
    request_body = EnrollBody,
    description = "Enrols a user in a course with zero progress",
    responses(
        (status = 201, description = "Enrolled", body = ApiResponse<CourseProgress>),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 403, description = "Enrolling someone else needs an admin", body = ErrorResponse),
        (status = 404, description = "Course or user not found", body = ErrorResponse),
        (status = 409, description = "Already enrolled", body = ErrorResponse),
    ),
    tag = "progress",
    security(("cookie" = []))
)]
#[tracing::instrument(skip_all)]
async fn enroll_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<EnrollBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let user_id = target_user(&state, user, payload.user_id).await?;

    let course = Course::find_by_id(state.pool(), user, payload.course_id)
        .await
        .map_err(WebError::from_db(Course::get_resource_type()))?
        .ok_or(WebError::resource_not_found(Course::get_resource_type()))?;

    let existing = CourseProgress::find(state.pool(), user, user_id, course.id())
        .await
        .map_err(WebError::from_db(CourseProgress::get_resource_type()))?;
    if existing.is_some() {
        return Err(WebError::resource_conflict(
            CourseProgress::get_resource_type(),
        ));
    }

    let progress = CourseProgress::enroll(state.pool(), user, user_id, course.id())
        .await
        .map_err(WebError::from_db(CourseProgress::get_resource_type()))?;

    tracing::info!(%user_id, course_id = %course.id(), "User enrolled.");
    Ok(ApiResponse::created("Enrolled in course.", progress))
}

#[utoipa::path(
    post,
    path = "/courses/update-progress",
    request_body = ProgressBody,
    responses(
        (status = 200, description = "Progress stored", body = ApiResponse<CourseProgress>),
        (status = 400, description = "Progress outside 0..=100", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 403, description = "Updating someone else needs an admin", body = ErrorResponse),
        (status = 404, description = "Not enrolled", body = ErrorResponse),
    ),
    tag = "progress",
    security(("cookie" = []))
)]
async fn update_progress_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<ProgressBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if !(0..=PROGRESS_MAX).contains(&payload.progress) {
        return Err(WebError::invalid_field(
            "progress",
            format!("must be between 0 and {PROGRESS_MAX}"),
        ));
    }
    let user_id = target_user(&state, user, payload.user_id).await?;

    let progress = CourseProgress::find(state.pool(), user, user_id, payload.course_id)
        .await
        .map_err(WebError::from_db(CourseProgress::get_resource_type()))?
        .ok_or(WebError::resource_not_found(
            CourseProgress::get_resource_type(),
        ))?;
    check_access(state.pool(), user, &progress)
        .await
        .map_err(WebError::from_db(CourseProgress::get_resource_type()))?;

    let updated = progress
        .set_progress(state.pool(), user, payload.progress)
        .await
        .map_err(WebError::from_db(CourseProgress::get_resource_type()))?;

    Ok(ApiResponse::ok("Progress updated.", updated))
}

#[utoipa::path(
    get,
    path = "/courses/in-progress",
    responses(
        (status = 200, description = "Caller's enrolments", body = ApiResponse<Vec<CourseProgressRow>>),
        (status = 401, description = "Not logged in", body = ErrorResponse),
    ),
    tag = "progress",
    security(("cookie" = []))
)]
async fn in_progress_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let rows = CourseProgress::all_by_user(state.pool(), user, user.user_id())
        .await
        .map_err(WebError::from_db(CourseProgress::get_resource_type()))?;

    Ok(ApiResponse::ok("Courses in progress.", rows))
}

#[utoipa::path(
    post,
    path = "/courses/set-current",
    request_body = CurrentCourseBody,
    responses(
        (status = 200, description = "Current course stored", body = ApiResponse<CurrentCourseResponse>),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "progress",
    security(("cookie" = []))
)]
async fn set_current_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<CurrentCourseBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = Course::find_by_id(state.pool(), user, payload.course_id)
        .await
        .map_err(WebError::from_db(Course::get_resource_type()))?
        .ok_or(WebError::resource_not_found(Course::get_resource_type()))?;

    set_current_course(&cookies, course.id());

    Ok(ApiResponse::ok(
        "Current course set.",
        CurrentCourseResponse {
            course_id: course.id(),
        },
    ))
}

#[utoipa::path(
    get,
    path = "/courses/get-current",
    responses(
        (status = 200, description = "Current course", body = ApiResponse<CurrentCourseResponse>),
        (status = 400, description = "No current course", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
    ),
    tag = "progress",
    security(("cookie" = []))
)]
async fn get_current_handler(ctx: RequestContext, cookies: Cookies) -> WebResult<impl IntoResponse> {
    ctx.user()?;
    let course_id = current_course(&cookies).ok_or(WebError::resource_bad_request(
        Course::get_resource_type(),
        "no current course",
    ))?;

    Ok(ApiResponse::ok(
        "Current course.",
        CurrentCourseResponse { course_id },
    ))
}
