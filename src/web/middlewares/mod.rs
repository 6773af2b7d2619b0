mod auth;
pub use auth::{
    AUTH_TOKEN, CURRENT_COURSE, KEEP_LOGGED_IN_DAYS, SESSION_DAYS, current_course, end_session,
    extract_context_fn, set_current_course, start_session,
};
