use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::web::middlewares::AUTH_TOKEN;

pub struct CookieAuthModifier;

impl Modify for CookieAuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    AUTH_TOKEN,
                    "JWT session of the current user",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Tina", description = "Backend of the PlaTina course platform"),
    paths(
        crate::web::routes::auth::sign_up_handler,
        crate::web::routes::auth::login_handler,
        crate::web::routes::auth::logout_handler,
        crate::web::routes::auth::send_email_handler,
        crate::web::routes::auth::email_auth_code_handler,
        crate::web::routes::auth::google_login_handler,
        crate::web::routes::auth::google_authorize_handler,
        crate::web::routes::account::info_handler,
        crate::web::routes::account::update_handler,
        crate::web::routes::account::deactivate_handler,
        crate::web::routes::account::user_list_handler,
        crate::web::routes::account::subscription_handler,
        crate::web::routes::payment::checkout_handler,
        crate::web::routes::payment::payment_done_handler,
        crate::web::routes::payment::payment_denied_handler,
        crate::web::routes::quiz::generate_handler,
        crate::web::routes::quiz::create_question_handler,
        crate::web::routes::quiz::create_quiz_handler,
        crate::web::routes::quiz::attach_question_handler,
        crate::web::routes::quiz::get_quiz_handler,
        crate::web::routes::quiz::submit_handler,
        crate::web::routes::courses::course_list_handler,
        crate::web::routes::courses::search_handler,
        crate::web::routes::courses::lessons_handler,
        crate::web::routes::courses::questions_handler,
        crate::web::routes::courses::question_bank_handler,
        crate::web::routes::courses::create_course_handler,
        crate::web::routes::courses::update_course_handler,
        crate::web::routes::courses::delete_course_handler,
        crate::web::routes::courses::create_lesson_handler,
        crate::web::routes::courses::update_lesson_handler,
        crate::web::routes::courses::delete_lesson_handler,
        crate::web::routes::courses::video_url_handler,
        crate::web::routes::progress::enroll_handler,
        crate::web::routes::progress::update_progress_handler,
        crate::web::routes::progress::in_progress_handler,
        crate::web::routes::progress::set_current_handler,
        crate::web::routes::progress::get_current_handler,
        crate::web::routes::certificate::certificate_handler,
    ),
    modifiers(&CookieAuthModifier),
    tags(
        (name = "auth", description = "Sign-up, login and e-mail verification"),
        (name = "account", description = "Profile and subscription"),
        (name = "payment", description = "Plan checkout"),
        (name = "quiz", description = "Question bank, quizzes and generation"),
        (name = "courses", description = "Courses and lessons"),
        (name = "progress", description = "Enrolment and tracking"),
        (name = "certificate", description = "Completion certificates"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn openapi_lists_routes_and_cookie_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/sign-up"));
        assert!(doc.paths.paths.contains_key("/quiz/{id}/submit"));
        assert!(doc.paths.paths.contains_key("/class/certificate"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("cookie"));
    }
}
