use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower_cookies::{Cookie, Cookies, cookie::SameSite};
use uuid::Uuid;

use crate::{
    auth::{self, UserClaims},
    model::{CrudRepository, entity::UserEntity},
    web::{AppState, RequestContext, WebError, WebResult, context::AuthenticatedUser},
};

pub static AUTH_TOKEN: &str = "SID";

pub const SESSION_DAYS: i64 = 1;
pub const KEEP_LOGGED_IN_DAYS: i64 = 30;

fn session_days(keep_logged_in: bool) -> i64 {
    if keep_logged_in {
        KEEP_LOGGED_IN_DAYS
    } else {
        SESSION_DAYS
    }
}

fn base_cookie(name: &'static str, value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie
}

/// Issues the session cookie for `user_id`.
pub fn start_session(
    cookies: &Cookies,
    jwt_key: &str,
    user_id: Uuid,
    keep_logged_in: bool,
) -> WebResult<()> {
    let days = session_days(keep_logged_in);
    let claims = UserClaims::new(user_id, chrono::Duration::days(days));
    let token = auth::generate_token(claims, jwt_key).map_err(WebError::server_crypt_error)?;

    let mut cookie = base_cookie(AUTH_TOKEN, token);
    cookie.set_max_age(tower_cookies::cookie::time::Duration::days(days));
    cookies.add(cookie);
    Ok(())
}

pub fn end_session(cookies: &Cookies) {
    cookies.remove(base_cookie(AUTH_TOKEN, String::new()));
}

/// Resolves the session cookie into a [`RequestContext`].
///
/// Stale or forged tokens and tokens of deactivated users are dropped and the
/// request continues anonymously.
pub async fn extract_context_fn(
    State(state): State<AppState>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Result<Response, WebError> {
    let token = match cookies.get(AUTH_TOKEN) {
        Some(token) => token.value().to_string(),
        None => {
            req.extensions_mut().insert(RequestContext::new(None));
            return Ok(next.run(req).await);
        }
    };

    let id = auth::process_token(&token, state.config().app().jwt())
        .ok()
        .and_then(|data| data.claims.sub.parse::<Uuid>().ok());

    let Some(id) = id else {
        tracing::debug!("Dropping invalid session cookie.");
        end_session(&cookies);
        req.extensions_mut().insert(RequestContext::new(None));
        return Ok(next.run(req).await);
    };

    let user = UserEntity::find_by_id(state.pool(), &AuthenticatedUser::admin(), id)
        .await
        .map_err(WebError::from_db(crate::model::ResourceType::User))?;

    match user {
        Some(user) if user.is_active() => {
            req.extensions_mut().insert(RequestContext::new(Some(
                AuthenticatedUser::new(id, user.role()),
            )));
        }
        _ => {
            end_session(&cookies);
            req.extensions_mut().insert(RequestContext::new(None));
        }
    }

    Ok(next.run(req).await)
}

/// Cookie remembering which course the user is looking at.
pub static CURRENT_COURSE: &str = "current_course";

pub fn set_current_course(cookies: &Cookies, course_id: Uuid) {
    cookies.add(base_cookie(CURRENT_COURSE, course_id.to_string()));
}

pub fn current_course(cookies: &Cookies) -> Option<Uuid> {
    cookies
        .get(CURRENT_COURSE)
        .and_then(|c| c.value().parse().ok())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn keep_logged_in_extends_session() {
        assert_eq!(session_days(false), 1);
        assert_eq!(session_days(true), 30);
    }

    #[test]
    fn cookies_are_lax_http_only() {
        let cookie = base_cookie(AUTH_TOKEN, "x".into());
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}
