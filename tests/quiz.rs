mod common;
use axum::http::StatusCode;
use serde_json::{Value, json};
use tina::integrations::mock::MockServices;

use crate::common::{
    Action, Flow, FlowContext, data, logout_action, setup_server, setup_test_db, signup_action,
    signup_admin_action,
};

/// Question answered by `C`.
fn question_body() -> Value {
    json!({
        "statement": "Qual macro imprime na tela?",
        "option_a": "print",
        "option_b": "echo",
        "option_c": "println!",
        "option_d": "puts",
        "correct_answer": "c",
    })
}

fn quiz_path(ctx: &FlowContext) -> String {
    format!("/quiz/{}", ctx.id("quiz"))
}

#[tokio::test]
async fn route_generate_questions_test() {
    let db = setup_test_db().await;
    let mocks = MockServices::new();
    let mut server = setup_server(&db, &mocks).await;

    Flow::new()
        .step(
            Action::new("anonymous", "POST", "/quiz/generate")
                .with_body(json!({"transcript": "aula", "question_count": 2}))
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .step(signup_action("lia@example.com", "52998224725"))
        .step(
            Action::new("no_transcript", "POST", "/quiz/generate")
                .with_body(json!({"question_count": 2}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("zero_count", "POST", "/quiz/generate")
                .with_body(json!({"transcript": "aula", "question_count": 0}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("text_count", "POST", "/quiz/generate")
                .with_body(json!({"transcript": "aula", "question_count": "dois"}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("generate", "POST", "/quiz/generate")
                .with_body(json!({"transcript": "Hoje falamos de soma.", "question_count": "2"}))
                .assert_body(|body| {
                    let questions = &data(body)["questions"];
                    assert_eq!(questions.as_array().unwrap().len(), 2);
                    assert_eq!(questions[0]["statement"], "Quanto é 2+2?");
                    assert_eq!(questions[0]["correct_answer"], "4");
                    assert_eq!(questions[0]["options"].as_object().unwrap().len(), 4);
                }),
        )
        .run(&mut server, db)
        .await;

    assert_eq!(
        mocks.questions.calls(),
        vec![("Hoje falamos de soma.".to_string(), 2)]
    );
}

#[tokio::test]
async fn route_quiz_admin_test() {
    let db = setup_test_db().await;
    let mocks = MockServices::new();
    let mut server = setup_server(&db, &mocks).await;

    Flow::new()
        .step(signup_action("lia@example.com", "52998224725"))
        .step(
            Action::new("not_admin", "POST", "/quiz")
                .with_body(json!({"min_score": 5, "max_score": 10, "max_minutes": 30}))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("form_not_admin", "POST", "/quiz/forms")
                .with_body(question_body())
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(logout_action())
        .step(signup_admin_action())
        .step(
            Action::new("min_above_max", "POST", "/quiz")
                .with_body(json!({"min_score": 11, "max_score": 10, "max_minutes": 30}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("no_time", "POST", "/quiz")
                .with_body(json!({"min_score": 5, "max_score": 10, "max_minutes": 0}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("quiz", "POST", "/quiz")
                .with_body(json!({"min_score": 5, "max_score": 10, "max_minutes": 30}))
                .with_expect(StatusCode::CREATED)
                .with_save_as("quiz"),
        )
        .step(
            Action::new("bad_letter", "POST", "/quiz/forms")
                .with_body(json!({
                    "statement": "?",
                    "option_a": "a", "option_b": "b", "option_c": "c", "option_d": "d",
                    "correct_answer": "Z",
                }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("question", "POST", "/quiz/forms")
                .with_body(question_body())
                .with_expect(StatusCode::CREATED)
                .with_save_as("question"),
        )
        .step(
            Action::new("negative_points", "POST", "/quiz/{id}/questions")
                .with_dyn_path(|ctx| format!("{}/questions", quiz_path(ctx)))
                .with_dyn_body(|ctx| json!({"question_id": ctx.id("question"), "points": -1}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("unknown_question", "POST", "/quiz/{id}/questions")
                .with_dyn_path(|ctx| format!("{}/questions", quiz_path(ctx)))
                .with_body(json!({"question_id": uuid::Uuid::new_v4(), "points": 1}))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("unknown_quiz", "POST", "/quiz/{id}/questions")
                .with_dyn_path(|_| format!("/quiz/{}/questions", uuid::Uuid::new_v4()))
                .with_dyn_body(|ctx| json!({"question_id": ctx.id("question"), "points": 1}))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("attach", "POST", "/quiz/{id}/questions")
                .with_dyn_path(|ctx| format!("{}/questions", quiz_path(ctx)))
                .with_dyn_body(|ctx| json!({"question_id": ctx.id("question"), "points": 10}))
                .with_expect(StatusCode::CREATED)
                .assert_body(|body| assert_eq!(data(body)["points"], 10)),
        )
        .step(
            Action::new("attach_twice", "POST", "/quiz/{id}/questions")
                .with_dyn_path(|ctx| format!("{}/questions", quiz_path(ctx)))
                .with_dyn_body(|ctx| json!({"question_id": ctx.id("question"), "points": 10}))
                .with_expect(StatusCode::CONFLICT),
        )
        .step(
            Action::new("admin_view", "GET", "/quiz/{id}")
                .with_dyn_path(quiz_path)
                .assert_body(|body| {
                    let view = data(body);
                    assert_eq!(view["quiz"]["max_minutes"], 30);
                    assert_eq!(view["questions"][0]["correct_answer"], "C");
                    assert_eq!(view["questions"][0]["points"], 10);
                }),
        )
        .step(
            Action::new("bank", "GET", "/acervo-questoes")
                .assert_body(|body| assert_eq!(data(body).as_array().unwrap().len(), 1)),
        )
        .step(logout_action())
        .step(
            Action::new("anonymous_view", "GET", "/quiz/{id}")
                .with_dyn_path(quiz_path)
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .run(&mut server, db)
        .await;
}

#[tokio::test]
async fn route_quiz_submit_test() {
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
                .with_body(question_body())
                .with_expect(StatusCode::CREATED)
                .with_save_as("question"),
        )
        .step(
            Action::new("attach", "POST", "/quiz/{id}/questions")
                .with_dyn_path(|ctx| format!("{}/questions", quiz_path(ctx)))
                .with_dyn_body(|ctx| json!({"question_id": ctx.id("question"), "points": 10}))
                .with_expect(StatusCode::CREATED),
        )
        .step(logout_action())
        .step(signup_action("lia@example.com", "52998224725"))
        .step(
            Action::new("user_view", "GET", "/quiz/{id}")
                .with_dyn_path(quiz_path)
                .assert_body(|body| {
                    let question = &data(body)["questions"][0];
                    assert!(question.get("correct_answer").is_none());
                    assert_eq!(question["options"]["C"], "println!");
                }),
        )
        .step(
            Action::new("wrong", "POST", "/quiz/{id}/submit")
                .with_dyn_path(|ctx| format!("{}/submit", quiz_path(ctx)))
                .with_dyn_body(|ctx| json!({"answers": {ctx.id("question"): "A"}}))
                .with_expect(StatusCode::CREATED)
                .assert_body(|body| {
                    let result = data(body);
                    assert_eq!(result["score"], 0);
                    assert_eq!(result["passed"], false);
                }),
        )
        .step(
            Action::new("right", "POST", "/quiz/{id}/submit")
                .with_dyn_path(|ctx| format!("{}/submit", quiz_path(ctx)))
                .with_dyn_body(|ctx| json!({"answers": {ctx.id("question"): "c"}}))
                .with_expect(StatusCode::CREATED)
                .assert_body(|body| {
                    let result = data(body);
                    assert_eq!(result["score"], 10);
                    assert_eq!(result["max_score"], 10);
                    assert_eq!(result["passed"], true);
                }),
        )
        .step(
            Action::new("unknown_quiz", "POST", "/quiz/{id}/submit")
                .with_dyn_path(|_| format!("/quiz/{}/submit", uuid::Uuid::new_v4()))
                .with_body(json!({"answers": {}}))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, db)
        .await;
}
