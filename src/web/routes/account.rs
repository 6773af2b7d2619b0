use axum::{
    Json, Router,
    extract::{Query, State},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use tower_cookies::Cookies;

use crate::{
    auth::{hash_password, verify_password},
    model::{
        CrudRepository, PaginatableRepository, ResourceTyped, check_access,
        entity::{Subscription, UserEntity},
    },
    web::{
        ApiResponse, AppState, MessageResponse, RequestContext, WebError, WebResult,
        dto::account::{AccountUpdateBody, DeactivateBody, SubscriptionResponse},
        error::ErrorResponse,
        middlewares::{self, end_session, start_session},
        routes::PaginationQuery,
        validation,
    },
};

pub const DEACTIVATE_CONFIRMATION: &str = "DELETE";

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/account/info", get(info_handler).post(update_handler))
        .route("/account/deactivate", post(deactivate_handler))
        .route("/account/page", get(user_list_handler))
        .route("/subscription", get(subscription_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/account/info",
    responses(
        (status = 200, description = "Current profile", body = ApiResponse<UserEntity>),
        (status = 401, description = "Not logged in", body = ErrorResponse),
    ),
    tag = "account",
    security(("cookie" = []))
)]
async fn info_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = UserEntity::find_by_id(state.pool(), user, user.user_id())
        .await
        .map_err(WebError::from_db(UserEntity::get_resource_type()))?
        .ok_or(WebError::resource_not_found(UserEntity::get_resource_type()))?;

    Ok(ApiResponse::ok("Account information.", found))
}

#[utoipa::path(
    post,
    path = "/account/info",
    request_body = AccountUpdateBody,
    description = "Partially updates the caller's profile",
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserEntity>),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 401, description = "Not logged in or wrong old password", body = ErrorResponse),
        (status = 409, description = "E-mail or CPF already in use", body = ErrorResponse),
    ),
    tag = "account",
    security(("cookie" = []))
)]
#[tracing::instrument(skip_all)]
async fn update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<AccountUpdateBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = UserEntity::find_by_id(state.pool(), user, user.user_id())
        .await
        .map_err(WebError::from_db(UserEntity::get_resource_type()))?
        .ok_or(WebError::resource_not_found(UserEntity::get_resource_type()))?;
    check_access(state.pool(), user, &found)
        .await
        .map_err(WebError::from_db(UserEntity::get_resource_type()))?;

    let mut data = found.to_update();

    if let Some(full_name) = payload.full_name.as_deref() {
        data.full_name = validation::required("full_name", Some(full_name))?.to_string();
    }

    if let Some(email) = payload.email.as_deref() {
        let email = validation::email(email)?;
        if email != found.email() {
            let taken = UserEntity::find_by_email(state.pool(), user, &email)
                .await
                .map_err(WebError::from_db(UserEntity::get_resource_type()))?;
            if taken.is_some() {
                return Err(WebError::registration_email_conflict());
            }
        }
        data.email = email;
    }

    if let Some(cpf) = payload.cpf.as_deref() {
        let cpf = validation::cpf(cpf)?;
        if found.cpf() != Some(cpf.as_str()) {
            let taken = UserEntity::find_by_cpf(state.pool(), user, &cpf)
                .await
                .map_err(WebError::from_db(UserEntity::get_resource_type()))?;
            if taken.is_some() {
                return Err(WebError::registration_cpf_conflict());
            }
        }
        data.cpf = Some(cpf);
    }

    if let Some(birth_date) = payload.birth_date.as_deref() {
        data.birth_date = Some(validation::birth_date(birth_date)?);
    }

    if let Some(tina_client) = payload.tina_client {
        data.tina_client = tina_client;
    }

    if let Some(new_password) = payload.new_password.as_deref() {
        let old_password = payload.old_password.as_deref().unwrap_or_default();
        let old_ok = match found.hash() {
            Some(hash) => verify_password(hash, old_password).map_err(WebError::server_crypt_error)?,
            // Google-only accounts set their first password without one
            None => true,
        };
        if !old_ok {
            return Err(WebError::auth_invalid_credentials());
        }
        validation::passwords_match(
            new_password,
            payload.check_new_password.as_deref().unwrap_or_default(),
        )?;
        data.password_hash = Some(hash_password(new_password).map_err(WebError::server_crypt_error)?);
    }

    let updated = found
        .update(state.pool(), user, data)
        .await
        .map_err(WebError::from_db(UserEntity::get_resource_type()))?;

    start_session(
        &cookies,
        state.config().app().jwt(),
        updated.id(),
        payload.keep_logged_in,
    )?;

    Ok(ApiResponse::ok("Account updated successfully.", updated))
}

#[utoipa::path(
    post,
    path = "/account/deactivate",
    request_body = DeactivateBody,
    responses(
        (status = 200, description = "Account deactivated", body = MessageResponse),
        (status = 400, description = "Confirmation missing", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
    ),
    tag = "account",
    security(("cookie" = []))
)]
#[tracing::instrument(skip_all)]
async fn deactivate_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<DeactivateBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if payload.confirm.as_deref() != Some(DEACTIVATE_CONFIRMATION) {
        return Err(WebError::invalid_field(
            "confirm",
            format!("type {DEACTIVATE_CONFIRMATION} to confirm"),
        ));
    }

    let mut found = UserEntity::find_by_id(state.pool(), user, user.user_id())
        .await
        .map_err(WebError::from_db(UserEntity::get_resource_type()))?
        .ok_or(WebError::resource_not_found(UserEntity::get_resource_type()))?;
    found
        .set_active(state.pool(), false)
        .await
        .map_err(WebError::from_db(UserEntity::get_resource_type()))?;

    end_session(&cookies);
    tracing::info!(user_id = %found.id(), "Account deactivated.");

    Ok(MessageResponse::ok("Account deactivated."))
}

#[utoipa::path(
    get,
    path = "/account/page",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Returns requested page", body = ApiResponse<crate::model::Page<UserEntity>>),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
    ),
    tag = "account",
    security(("cookie" = []))
)]
async fn user_list_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;

    let users = UserEntity::page(state.pool(), user, page.limit(), page.offset())
        .await
        .map_err(WebError::from_db(UserEntity::get_resource_type()))?;

    Ok(ApiResponse::ok("Users page.", users))
}

#[utoipa::path(
    get,
    path = "/subscription",
    description = "Checks the caller's subscription and refreshes the subscriber flag",
    responses(
        (status = 200, description = "Subscription active", body = ApiResponse<SubscriptionResponse>),
        (status = 400, description = "Subscription expired", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 404, description = "No subscription", body = ErrorResponse),
    ),
    tag = "account",
    security(("cookie" = []))
)]
async fn subscription_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let mut found = UserEntity::find_by_id(state.pool(), user, user.user_id())
        .await
        .map_err(WebError::from_db(UserEntity::get_resource_type()))?
        .ok_or(WebError::resource_not_found(UserEntity::get_resource_type()))?;

    let subscription = Subscription::longest_for_user(state.pool(), user, user.user_id())
        .await
        .map_err(WebError::from_db(Subscription::get_resource_type()))?
        .ok_or(WebError::resource_not_found(Subscription::get_resource_type()))?;

    let active = !subscription.is_expired_at(Utc::now());
    if found.subscriber() != active {
        found
            .set_subscriber(state.pool(), active)
            .await
            .map_err(WebError::from_db(UserEntity::get_resource_type()))?;
    }

    if !active {
        return Err(WebError::resource_bad_request(
            Subscription::get_resource_type(),
            "subscription expired",
        ));
    }

    Ok(ApiResponse::ok(
        "Subscription is active.",
        SubscriptionResponse::from(&subscription),
    ))
}
