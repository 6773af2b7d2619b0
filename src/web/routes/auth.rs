use axum::{
    Json, Router,
    extract::{Query, State},
    middleware,
    response::{IntoResponse, Redirect},
    routing::{get, post},
};
use chrono::{Duration, Utc};
use tower_cookies::{Cookie, Cookies, cookie::SameSite};

use crate::{
    auth::{self, generate_state, generate_verification_code, hash_password, mask_email},
    model::{
        CrudRepository, ResourceTyped,
        entity::{UserEntity, UserEntityCreateUpdate},
    },
    utils::cpf,
    web::{
        ApiResponse, AppState, AuthenticatedUser, MessageResponse, RequestContext, UserRole,
        WebError, WebResult,
        dto::auth::{
            EmailCodeBody, LoginBody, MaskedEmailResponse, OAuthCallbackQuery, SendEmailBody,
            SignUpBody,
        },
        error::ErrorResponse,
        middlewares::{self, end_session, start_session},
        validation,
    },
};

pub const EMAIL_CODE_TTL_MINUTES: i64 = 15;
pub static OAUTH_STATE: &str = "oauth_state";

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/sign-up", post(sign_up_handler))
        .route("/login/authenticate", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/authenticate/send-email", post(send_email_handler))
        .route("/authenticate/email-auth-code", post(email_auth_code_handler))
        .route("/login/google", get(google_login_handler))
        .route("/authorize/google", get(google_authorize_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn role_for(state: &AppState, email: &str) -> UserRole {
    if email.eq_ignore_ascii_case(state.config().app().admin_email()) {
        UserRole::Admin
    } else {
        UserRole::User
    }
}

#[utoipa::path(
    post,
    path = "/sign-up",
    request_body = SignUpBody,
    description = "Registers a new account and logs it in",
    responses(
        (status = 200, description = "User created", body = ApiResponse<UserEntity>),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 401, description = "Already logged in", body = ErrorResponse),
        (status = 409, description = "E-mail or CPF already in use", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[tracing::instrument(skip_all)]
async fn sign_up_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<SignUpBody>,
) -> WebResult<impl IntoResponse> {
    ctx.require_anonymous()?;

    let email = validation::email(&payload.email)?;
    validation::passwords_match(&payload.password, &payload.password_check)?;
    let birth_date = validation::birth_date(&payload.birth_date)?;
    let cpf = validation::cpf(&payload.cpf)?;
    let full_name = validation::required("full_name", Some(payload.full_name.as_str()))?.to_string();

    let admin = AuthenticatedUser::admin();
    let by_email = UserEntity::find_by_email(state.pool(), &admin, &email)
        .await
        .map_err(WebError::from_db(UserEntity::get_resource_type()))?;
    let by_cpf = UserEntity::find_by_cpf(state.pool(), &admin, &cpf)
        .await
        .map_err(WebError::from_db(UserEntity::get_resource_type()))?;

    if by_email.as_ref().is_some_and(|u| u.is_active()) {
        return Err(WebError::registration_email_conflict());
    }
    if by_cpf.as_ref().is_some_and(|u| u.is_active()) {
        return Err(WebError::registration_cpf_conflict());
    }

    let hash = hash_password(&payload.password).map_err(WebError::server_crypt_error)?;
    let data = UserEntityCreateUpdate {
        email: email.clone(),
        cpf: Some(cpf),
        password_hash: Some(hash),
        full_name,
        birth_date: Some(birth_date),
        tina_client: payload.tina_client,
        google_linked: false,
        role: String::new(),
    }
    .with_role(role_for(&state, &email));

    // Inactive owners of the e-mail or CPF get overwritten; a second inactive
    // account holding the other identifier is freed first.
    let user = match (by_email, by_cpf) {
        (Some(old), other) => {
            if let Some(other) = other.filter(|o| o.id() != old.id()) {
                other
                    .delete(state.pool(), &admin)
                    .await
                    .map_err(WebError::from_db(UserEntity::get_resource_type()))?;
            }
            old.reactivate(state.pool(), &admin, data).await
        }
        (None, Some(old)) => old.reactivate(state.pool(), &admin, data).await,
        (None, None) => UserEntity::create(state.pool(), &admin, data).await,
    }
    .map_err(WebError::from_db(UserEntity::get_resource_type()))?;

    start_session(
        &cookies,
        state.config().app().jwt(),
        user.id(),
        payload.keep_logged_in,
    )?;
    tracing::info!(user_id = %user.id(), "User registered.");

    Ok(ApiResponse::ok("User created successfully.", user))
}

#[utoipa::path(
    post,
    path = "/login/authenticate",
    request_body = LoginBody,
    description = "Logs in with e-mail or CPF",
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<UserEntity>),
        (status = 401, description = "Wrong password or already logged in", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[tracing::instrument(skip_all)]
async fn login_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<LoginBody>,
) -> WebResult<impl IntoResponse> {
    ctx.require_anonymous()?;

    let admin = AuthenticatedUser::admin();
    let id_method = payload.id_method.trim();
    let found = if id_method.contains('@') {
        UserEntity::find_by_email(state.pool(), &admin, &id_method.to_lowercase()).await
    } else {
        UserEntity::find_by_cpf(state.pool(), &admin, &cpf::normalize(id_method)).await
    }
    .map_err(WebError::from_db(UserEntity::get_resource_type()))?;

    let Some(user) = found.filter(|u| u.is_active()) else {
        return Err(WebError::auth_user_not_found());
    };

    let Some(hash) = user.hash() else {
        return Err(WebError::auth_invalid_credentials());
    };
    let is_verified =
        auth::verify_password(hash, &payload.password).map_err(WebError::server_crypt_error)?;
    if !is_verified {
        return Err(WebError::auth_invalid_credentials());
    }

    start_session(
        &cookies,
        state.config().app().jwt(),
        user.id(),
        payload.keep_logged_in,
    )?;

    Ok(ApiResponse::ok("Logged in successfully.", user))
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
    ),
    tag = "auth",
    security(("cookie" = []))
)]
async fn logout_handler(ctx: RequestContext, cookies: Cookies) -> WebResult<impl IntoResponse> {
    ctx.user()?;
    end_session(&cookies);
    Ok(MessageResponse::ok("Logged out successfully."))
}

async fn current_user(state: &AppState, user: &AuthenticatedUser) -> WebResult<UserEntity> {
    UserEntity::find_by_id(state.pool(), user, user.user_id())
        .await
        .map_err(WebError::from_db(UserEntity::get_resource_type()))?
        .ok_or(WebError::resource_not_found(UserEntity::get_resource_type()))
}

#[utoipa::path(
    post,
    path = "/authenticate/send-email",
    request_body = SendEmailBody,
    description = "Mails a six-digit verification code to the caller",
    responses(
        (status = 200, description = "Code sent", body = ApiResponse<MaskedEmailResponse>),
        (status = 400, description = "Missing e-mail or unknown user", body = ErrorResponse),
        (status = 401, description = "E-mail already verified", body = ErrorResponse),
        (status = 403, description = "E-mail belongs to someone else", body = ErrorResponse),
        (status = 502, description = "Mail service failed", body = ErrorResponse),
    ),
    tag = "auth",
    security(("cookie" = []))
)]
#[tracing::instrument(skip_all)]
async fn send_email_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<SendEmailBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let email = validation::required("email", payload.email.as_deref())?.to_lowercase();

    let found = UserEntity::find_by_email(state.pool(), user, &email)
        .await
        .map_err(WebError::from_db(UserEntity::get_resource_type()))?;
    let Some(mut found) = found else {
        return Err(WebError::resource_bad_request(
            UserEntity::get_resource_type(),
            "no user with this e-mail",
        ));
    };
    if found.id() != user.user_id() {
        return Err(WebError::resource_forbidden(UserEntity::get_resource_type()));
    }
    if found.email_authenticated() {
        return Err(WebError::auth_email_already_verified());
    }

    let code = generate_verification_code();
    let expires_at = Utc::now() + Duration::minutes(EMAIL_CODE_TTL_MINUTES);
    found
        .set_email_auth_code(state.pool(), &code, expires_at)
        .await
        .map_err(WebError::from_db(UserEntity::get_resource_type()))?;

    let text = format!(
        "Olá, {}! Seu código de verificação da PlaTina é {code}. Ele expira em {EMAIL_CODE_TTL_MINUTES} minutos.",
        found.full_name()
    );
    state
        .services()
        .mailer
        .send(found.email(), "Código de verificação", &text)
        .await
        .map_err(WebError::upstream)?;

    Ok(ApiResponse::ok(
        "Verification code sent.",
        MaskedEmailResponse {
            email: mask_email(found.email()),
        },
    ))
}

#[utoipa::path(
    post,
    path = "/authenticate/email-auth-code",
    request_body = EmailCodeBody,
    responses(
        (status = 200, description = "E-mail verified", body = MessageResponse),
        (status = 400, description = "Missing, wrong or expired code", body = ErrorResponse),
        (status = 401, description = "E-mail already verified", body = ErrorResponse),
    ),
    tag = "auth",
    security(("cookie" = []))
)]
async fn email_auth_code_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<EmailCodeBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let mut found = current_user(&state, user).await?;
    if found.email_authenticated() {
        return Err(WebError::auth_email_already_verified());
    }

    let code = validation::required("auth_code", payload.auth_code.as_deref())?;
    let matches = found.email_auth_code() == Some(code);
    let fresh = found
        .email_auth_code_expires_at()
        .is_some_and(|at| at > Utc::now());
    if !matches {
        return Err(WebError::invalid_field("auth_code", "code is invalid"));
    }
    if !fresh {
        return Err(WebError::invalid_field("auth_code", "code has expired"));
    }

    found
        .mark_email_authenticated(state.pool())
        .await
        .map_err(WebError::from_db(UserEntity::get_resource_type()))?;

    Ok(MessageResponse::ok("E-mail verified successfully."))
}

#[utoipa::path(
    get,
    path = "/login/google",
    responses((status = 303, description = "Redirect to Google")),
    tag = "auth"
)]
async fn google_login_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    cookies: Cookies,
) -> WebResult<impl IntoResponse> {
    ctx.require_anonymous()?;

    let oauth_state = generate_state();
    let mut cookie = Cookie::new(OAUTH_STATE, oauth_state.clone());
    cookie.set_same_site(SameSite::Lax);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_max_age(tower_cookies::cookie::time::Duration::minutes(10));
    cookies.add(cookie);

    let url = state.services().identity.authorize_url(&oauth_state);
    Ok(Redirect::to(&url))
}

#[utoipa::path(
    get,
    path = "/authorize/google",
    params(OAuthCallbackQuery),
    responses(
        (status = 200, description = "Logged in with Google", body = ApiResponse<UserEntity>),
        (status = 400, description = "State mismatch or missing code", body = ErrorResponse),
        (status = 502, description = "Google rejected the code", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[tracing::instrument(skip_all)]
async fn google_authorize_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    cookies: Cookies,
    Query(query): Query<OAuthCallbackQuery>,
) -> WebResult<impl IntoResponse> {
    ctx.require_anonymous()?;

    let expected = cookies.get(OAUTH_STATE).map(|c| c.value().to_string());
    let mut removal = Cookie::new(OAUTH_STATE, "");
    removal.set_path("/");
    cookies.remove(removal);

    match (expected, query.state.as_deref()) {
        (Some(expected), Some(got)) if expected == got => {}
        _ => return Err(WebError::auth_state_mismatch()),
    }
    let code = validation::required("code", query.code.as_deref())?;

    let identity = state
        .services()
        .identity
        .exchange(code)
        .await
        .map_err(WebError::upstream)?;
    let email = validation::email(&identity.email)?;

    let admin = AuthenticatedUser::admin();
    let found = UserEntity::find_by_email(state.pool(), &admin, &email)
        .await
        .map_err(WebError::from_db(UserEntity::get_resource_type()))?;

    let user = match found {
        Some(user) if user.is_active() && user.google_linked() => user,
        Some(user) => {
            let mut data = user.to_update();
            data.google_linked = true;
            user.reactivate(state.pool(), &admin, data)
                .await
                .map_err(WebError::from_db(UserEntity::get_resource_type()))?
        }
        None => {
            let data = UserEntityCreateUpdate {
                email: email.clone(),
                cpf: None,
                password_hash: None,
                full_name: identity.name,
                birth_date: None,
                tina_client: false,
                google_linked: true,
                role: String::new(),
            }
            .with_role(role_for(&state, &email));
            UserEntity::create(state.pool(), &admin, data)
                .await
                .map_err(WebError::from_db(UserEntity::get_resource_type()))?
        }
    };

    start_session(&cookies, state.config().app().jwt(), user.id(), false)?;
    Ok(ApiResponse::ok("Logged in with Google.", user))
}
