mod common;
use axum::http::StatusCode;
use serde_json::json;
use tina::integrations::mock::MockServices;

use crate::common::{
    Action, Flow, create_course_action, logout_action, setup_server, setup_test_db,
    signup_action, signup_admin_action,
};

fn certificate(course_key: &'static str) -> Action {
    Action::new("certificate", "GET", "/class/certificate")
        .with_dyn_param("course_id", move |ctx| ctx.id(course_key))
}

fn progress(course_key: &'static str, value: i64) -> Action {
    Action::new("progress", "POST", "/courses/update-progress")
        .with_dyn_body(move |ctx| json!({"course_id": ctx.id(course_key), "progress": value}))
}

fn enroll(course_key: &'static str) -> Action {
    Action::new("enroll", "POST", "/courses/create-relation")
        .with_dyn_body(move |ctx| json!({"course_id": ctx.id(course_key)}))
        .with_expect(StatusCode::CREATED)
}

#[tokio::test]
async fn route_certificate_test() {
    let db = setup_test_db().await;
    let mocks = MockServices::new();
    let mut server = setup_server(&db, &mocks).await;

    Flow::new()
        .step(signup_admin_action())
        .step(create_course_action("Rust Básico").with_save_as("rust"))
        .step(logout_action())
        .step(certificate("rust").with_expect(StatusCode::UNAUTHORIZED))
        .step(signup_action("lia@example.com", "52998224725"))
        .step(
            Action::new("unknown_course", "GET", "/class/certificate")
                .with_param("course_id", &uuid::Uuid::new_v4().to_string())
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(certificate("rust").with_expect(StatusCode::NOT_FOUND))
        .step(enroll("rust"))
        .step(progress("rust", 50))
        .step(certificate("rust").with_expect(StatusCode::FORBIDDEN))
        .step(progress("rust", 100))
        .step(
            certificate("rust")
                .assert_header("content-type", |_, value| assert_eq!(value, "application/pdf"))
                .assert_header("content-disposition", |ctx, value| {
                    let expected = format!("attachment; filename=\"certificado-{}.pdf\"", ctx.id("rust"));
                    assert_eq!(value, expected);
                }),
        )
        .run(&mut server, db)
        .await;
}

#[tokio::test]
async fn route_certificate_with_quiz_test() {
    let db = setup_test_db().await;
    let mocks = MockServices::new();
    let mut server = setup_server(&db, &mocks).await;

    Flow::new()
        .step(signup_admin_action())
        .step(
            Action::new("quiz", "POST", "/quiz")
                .with_body(json!({"min_score": 5, "max_score": 10, "max_minutes": 30}))
                .with_expect(StatusCode::CREATED)
                .with_save_as("quiz"),
        )
        .step(
            Action::new("question", "POST", "/quiz/forms")
                .with_body(json!({
                    "statement": "Qual o tipo de 1u8?",
                    "option_a": "i32",
                    "option_b": "u8",
                    "option_c": "usize",
                    "option_d": "f64",
                    "correct_answer": "B",
                }))
                .with_expect(StatusCode::CREATED)
                .with_save_as("question"),
        )
        .step(
            Action::new("attach", "POST", "/quiz/{id}/questions")
                .with_dyn_path(|ctx| format!("/quiz/{}/questions", ctx.id("quiz")))
                .with_dyn_body(|ctx| json!({"question_id": ctx.id("question"), "points": 10}))
                .with_expect(StatusCode::CREATED),
        )
        .step(
            Action::new("course", "POST", "/criar_curso")
                .with_dyn_body(|ctx| {
                    json!({
                        "name": "Tipos em Rust",
                        "description": "Inteiros e afins",
                        "estimated_hours": 3,
                        "quiz_id": ctx.id("quiz"),
                    })
                })
                .with_expect(StatusCode::CREATED)
                .with_save_as("course"),
        )
        .step(logout_action())
        .step(signup_action("lia@example.com", "52998224725"))
        .step(enroll("course"))
        .step(progress("course", 100))
        // finished but never took the quiz
        .step(certificate("course").with_expect(StatusCode::FORBIDDEN))
        .step(
            Action::new("fail", "POST", "/quiz/{id}/submit")
                .with_dyn_path(|ctx| format!("/quiz/{}/submit", ctx.id("quiz")))
                .with_dyn_body(|ctx| json!({"answers": {ctx.id("question"): "D"}}))
                .with_expect(StatusCode::CREATED),
        )
        .step(certificate("course").with_expect(StatusCode::FORBIDDEN))
        .step(
            Action::new("pass", "POST", "/quiz/{id}/submit")
                .with_dyn_path(|ctx| format!("/quiz/{}/submit", ctx.id("quiz")))
                .with_dyn_body(|ctx| json!({"answers": {ctx.id("question"): "B"}}))
                .with_expect(StatusCode::CREATED),
        )
        .step(certificate("course"))
        .run(&mut server, db)
        .await;
}
