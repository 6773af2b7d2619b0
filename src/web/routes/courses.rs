use axum::{
    Json, Router,
    extract::{Path, Query, State},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, Page, PaginatableRepository, ResourceTyped,
        entity::{
            Course, CourseCreate, Lesson, LessonCreate, LessonDraft, Question, QuestionBankEntry,
            Quiz,
        },
    },
    web::{
        ApiResponse, AppState, AuthenticatedUser, MessageResponse, RequestContext, WebError,
        WebResult,
        dto::{
            courses::{CreateCourseBody, SearchQuery, VideoUrlBody, VideoUrlResponse},
            quiz::QuestionView,
        },
        error::ErrorResponse,
        middlewares,
        routes::PaginationQuery,
        validation,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/courses", get(course_list_handler))
        .route("/search", get(search_handler))
        .route("/classes/{course_id}", get(lessons_handler))
        .route("/questions/{course_id}", get(questions_handler))
        .route("/acervo-questoes", get(question_bank_handler))
        .route("/criar_curso", post(create_course_handler))
        .route(
            "/courses/{id}",
            put(update_course_handler).delete(delete_course_handler),
        )
        .route("/courses/{id}/lessons", post(create_lesson_handler))
        .route(
            "/lessons/{id}",
            put(update_lesson_handler).delete(delete_lesson_handler),
        )
        .route("/videos/get-url", post(video_url_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn check_course_fields(course: &CourseCreate) -> WebResult<()> {
    validation::required("name", Some(course.name.as_str()))?;
    if course.estimated_hours < 0 {
        return Err(WebError::invalid_field(
            "estimated_hours",
            "must not be negative",
        ));
    }
    Ok(())
}

async fn check_quiz_exists(
    state: &AppState,
    user: &AuthenticatedUser,
    quiz_id: Option<Uuid>,
) -> WebResult<()> {
    let Some(quiz_id) = quiz_id else {
        return Ok(());
    };
    Quiz::find_by_id(state.pool(), user, quiz_id)
        .await
        .map_err(WebError::from_db(Quiz::get_resource_type()))?
        .ok_or(WebError::resource_bad_request(
            Course::get_resource_type(),
            "quiz does not exist",
        ))?;
    Ok(())
}

async fn find_course(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> WebResult<Course> {
    Course::find_by_id(state.pool(), user, id)
        .await
        .map_err(WebError::from_db(Course::get_resource_type()))?
        .ok_or(WebError::resource_not_found(Course::get_resource_type()))
}

async fn find_lesson(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> WebResult<Lesson> {
    Lesson::find_by_id(state.pool(), user, id)
        .await
        .map_err(WebError::from_db(Lesson::get_resource_type()))?
        .ok_or(WebError::resource_not_found(Lesson::get_resource_type()))
}

#[utoipa::path(
    get,
    path = "/courses",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Returns requested page", body = ApiResponse<Page<Course>>),
    ),
    tag = "courses"
)]
async fn course_list_handler(
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let courses = Course::page(
        state.pool(),
        &AuthenticatedUser::admin(),
        page.limit(),
        page.offset(),
    )
    .await
    .map_err(WebError::from_db(Course::get_resource_type()))?;

    Ok(ApiResponse::ok("Courses page.", courses))
}

#[utoipa::path(
    get,
    path = "/search",
    params(SearchQuery),
    description = "Case-insensitive search over course names and descriptions",
    responses(
        (status = 200, description = "Matching courses", body = ApiResponse<Vec<Course>>),
    ),
    tag = "courses"
)]
async fn search_handler(
    Query(query): Query<SearchQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let q = query.q.as_deref().map(str::trim).unwrap_or_default();
    let courses = Course::search(state.pool(), &AuthenticatedUser::admin(), q)
        .await
        .map_err(WebError::from_db(Course::get_resource_type()))?;

    Ok(ApiResponse::ok("Search results.", courses))
}

#[utoipa::path(
    get,
    path = "/classes/{course_id}",
    params(("course_id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Lessons in order", body = ApiResponse<Vec<Lesson>>),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "courses"
)]
async fn lessons_handler(
    Path(course_id): Path<Uuid>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let system = AuthenticatedUser::admin();
    let course = find_course(&state, &system, course_id).await?;
    let lessons = Lesson::all_by_course(state.pool(), &system, course.id())
        .await
        .map_err(WebError::from_db(Lesson::get_resource_type()))?;

    Ok(ApiResponse::ok("Course lessons.", lessons))
}

#[utoipa::path(
    get,
    path = "/questions/{course_id}",
    params(("course_id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course questions, answers shown to admins only", body = ApiResponse<Vec<QuestionView>>),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "courses"
)]
async fn questions_handler(
    ctx: RequestContext,
    Path(course_id): Path<Uuid>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let reveal = ctx.maybe_user().is_some_and(AuthenticatedUser::is_admin);
    let system = AuthenticatedUser::admin();
    let course = find_course(&state, &system, course_id).await?;

    let questions: Vec<QuestionView> = Question::all_by_course(state.pool(), &system, course.id())
        .await
        .map_err(WebError::from_db(Question::get_resource_type()))?
        .iter()
        .map(|question| QuestionView::new(question, None, reveal))
        .collect();

    Ok(ApiResponse::ok("Course questions.", questions))
}

#[utoipa::path(
    get,
    path = "/acervo-questoes",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Question bank entries", body = ApiResponse<Vec<QuestionBankEntry>>),
    ),
    tag = "courses"
)]
async fn question_bank_handler(
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let entries = QuestionBankEntry::list(
        state.pool(),
        &AuthenticatedUser::admin(),
        page.limit(),
        page.offset(),
    )
    .await
    .map_err(WebError::from_db(QuestionBankEntry::get_resource_type()))?;

    Ok(ApiResponse::ok("Question bank.", entries))
}

#[utoipa::path(
    post,
    path = "/criar_curso",
    request_body = CreateCourseBody,
    description = "Creates a course with its lessons and questions in one transaction",
    responses(
        (status = 201, description = "Course created", body = ApiResponse<Course>),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 409, description = "Course name already taken", body = ErrorResponse),
    ),
    tag = "courses",
    security(("cookie" = []))
)]
#[tracing::instrument(skip_all)]
async fn create_course_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<CreateCourseBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let course = payload.course();
    check_course_fields(&course)?;
    check_quiz_exists(&state, user, course.quiz_id).await?;

    let taken = Course::find_by_name(state.pool(), user, &course.name)
        .await
        .map_err(WebError::from_db(Course::get_resource_type()))?;
    if taken.is_some() {
        return Err(WebError::resource_conflict(Course::get_resource_type()));
    }

    for lesson in &payload.lessons {
        validation::required("title", Some(lesson.title.as_str()))?;
    }
    let questions = payload
        .questions
        .into_iter()
        .map(|question| question.into_create(None))
        .collect::<WebResult<Vec<_>>>()?;

    let created = Course::create_with_content(state.pool(), user, course, payload.lessons, questions)
        .await
        .map_err(WebError::from_db(Course::get_resource_type()))?;

    tracing::info!(course_id = %created.id(), "Course created.");
    Ok(ApiResponse::created("Course created.", created))
}

#[utoipa::path(
    put,
    path = "/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    request_body = CourseCreate,
    responses(
        (status = 200, description = "Course updated", body = ApiResponse<Course>),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 409, description = "Course name already taken", body = ErrorResponse),
    ),
    tag = "courses",
    security(("cookie" = []))
)]
async fn update_course_handler(
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(mut payload): Json<CourseCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    payload.name = payload.name.trim().to_string();
    check_course_fields(&payload)?;
    check_quiz_exists(&state, user, payload.quiz_id).await?;

    let course = find_course(&state, user, id).await?;
    let taken = Course::find_by_name(state.pool(), user, &payload.name)
        .await
        .map_err(WebError::from_db(Course::get_resource_type()))?;
    if taken.is_some_and(|other| other.id() != course.id()) {
        return Err(WebError::resource_conflict(Course::get_resource_type()));
    }

    let updated = course
        .update(state.pool(), user, payload)
        .await
        .map_err(WebError::from_db(Course::get_resource_type()))?;

    Ok(ApiResponse::ok("Course updated.", updated))
}

#[utoipa::path(
    delete,
    path = "/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course deleted", body = MessageResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "courses",
    security(("cookie" = []))
)]
async fn delete_course_handler(
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let course = find_course(&state, user, id).await?;

    course
        .delete(state.pool(), user)
        .await
        .map_err(WebError::from_db(Course::get_resource_type()))?;

    Ok(MessageResponse::ok("Course deleted."))
}

#[utoipa::path(
    post,
    path = "/courses/{id}/lessons",
    params(("id" = Uuid, Path, description = "Course id")),
    request_body = LessonDraft,
    responses(
        (status = 201, description = "Lesson created", body = ApiResponse<Lesson>),
        (status = 400, description = "Missing title", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "courses",
    security(("cookie" = []))
)]
async fn create_lesson_handler(
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(payload): Json<LessonDraft>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    validation::required("title", Some(payload.title.as_str()))?;
    let course = find_course(&state, user, id).await?;

    let lesson = Lesson::create(
        state.pool(),
        user,
        LessonCreate::from_draft(course.id(), payload),
    )
    .await
    .map_err(WebError::from_db(Lesson::get_resource_type()))?;

    Ok(ApiResponse::created("Lesson created.", lesson))
}

#[utoipa::path(
    put,
    path = "/lessons/{id}",
    params(("id" = Uuid, Path, description = "Lesson id")),
    request_body = LessonDraft,
    responses(
        (status = 200, description = "Lesson updated", body = ApiResponse<Lesson>),
        (status = 400, description = "Missing title", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
    ),
    tag = "courses",
    security(("cookie" = []))
)]
async fn update_lesson_handler(
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(payload): Json<LessonDraft>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    validation::required("title", Some(payload.title.as_str()))?;
    let lesson = find_lesson(&state, user, id).await?;
    let course_id = lesson.course_id();

    let updated = lesson
        .update(
            state.pool(),
            user,
            LessonCreate::from_draft(course_id, payload),
        )
        .await
        .map_err(WebError::from_db(Lesson::get_resource_type()))?;

    Ok(ApiResponse::ok("Lesson updated.", updated))
}

#[utoipa::path(
    delete,
    path = "/lessons/{id}",
    params(("id" = Uuid, Path, description = "Lesson id")),
    responses(
        (status = 200, description = "Lesson deleted", body = MessageResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
    ),
    tag = "courses",
    security(("cookie" = []))
)]
async fn delete_lesson_handler(
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let lesson = find_lesson(&state, user, id).await?;

    lesson
        .delete(state.pool(), user)
        .await
        .map_err(WebError::from_db(Lesson::get_resource_type()))?;

    Ok(MessageResponse::ok("Lesson deleted."))
}

#[utoipa::path(
    post,
    path = "/videos/get-url",
    request_body = VideoUrlBody,
    responses(
        (status = 200, description = "Lesson video URL", body = ApiResponse<VideoUrlResponse>),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
    ),
    tag = "courses",
    security(("cookie" = []))
)]
async fn video_url_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<VideoUrlBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let lesson = find_lesson(&state, user, payload.class_id).await?;

    Ok(ApiResponse::ok(
        "Lesson video.",
        VideoUrlResponse {
            class_id: lesson.id(),
            video_url: lesson.video_url().to_string(),
        },
    ))
}
