mod common;
use axum::http::StatusCode;
use serde_json::json;
use tina::integrations::mock::MockServices;

use crate::common::{
    Action, Flow, PASSWORD, data, login_action, login_admin_action, logout_action, setup_server,
    setup_test_db, signup_action, signup_admin_action,
};

#[tokio::test]
async fn route_account_info_test() {
    let db = setup_test_db().await;
    let mocks = MockServices::new();
    let mut server = setup_server(&db, &mocks).await;

    Flow::new()
        .step(Action::new("anonymous", "GET", "/account/info").with_expect(StatusCode::UNAUTHORIZED))
        .step(signup_action("rui@example.com", "52998224725").with_save_cookies(false))
        .step(signup_action("sara@example.com", "52311687859"))
        .step(
            Action::new("info", "GET", "/account/info").assert_body(|body| {
                let user = data(body);
                assert_eq!(user["email"], "sara@example.com");
                assert_eq!(user["full_name"], "Maria Silva");
                assert_eq!(user["birth_date"], "1990-05-17");
            }),
        )
        .step(
            Action::new("rename", "POST", "/account/info")
                .with_body(json!({"full_name": "Sara Lima", "cpf": "539.529.150-41", "tina_client": true}))
                .assert_body(|body| {
                    let user = data(body);
                    assert_eq!(user["full_name"], "Sara Lima");
                    assert_eq!(user["cpf"], "53952915041");
                    assert_eq!(user["tina_client"], true);
                    assert_eq!(user["email"], "sara@example.com");
                }),
        )
        .step(
            Action::new("email_taken", "POST", "/account/info")
                .with_body(json!({"email": "rui@example.com"}))
                .with_expect(StatusCode::CONFLICT),
        )
        .step(
            Action::new("cpf_taken", "POST", "/account/info")
                .with_body(json!({"cpf": "52998224725"}))
                .with_expect(StatusCode::CONFLICT),
        )
        .step(
            Action::new("cpf_invalid", "POST", "/account/info")
                .with_body(json!({"cpf": "12345678900"}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("email_invalid", "POST", "/account/info")
                .with_body(json!({"email": "sem-arroba"}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("birth_future", "POST", "/account/info")
                .with_body(json!({"birth_date": "2999-12-31"}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        // same e-mail as before is not a conflict
        .step(
            Action::new("email_same", "POST", "/account/info")
                .with_body(json!({"email": "SARA@example.com"})),
        )
        .step(
            Action::new("new_email", "POST", "/account/info")
                .with_body(json!({"email": "sara.lima@example.com"}))
                .assert_body(|body| {
                    let user = data(body);
                    assert_eq!(user["email"], "sara.lima@example.com");
                    assert_eq!(user["email_authenticated"], false);
                }),
        )
        .run(&mut server, db)
        .await;
}

#[tokio::test]
async fn route_password_change_test() {
    let db = setup_test_db().await;
    let mocks = MockServices::new();
    let mut server = setup_server(&db, &mocks).await;

    Flow::new()
        .step(signup_action("tiago@example.com", "93541134780"))
        .step(
            Action::new("wrong_old", "POST", "/account/info")
                .with_body(json!({
                    "old_password": "nao-e-essa",
                    "new_password": "nova-senha",
                    "check_new_password": "nova-senha",
                }))
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .step(
            Action::new("mismatch", "POST", "/account/info")
                .with_body(json!({
                    "old_password": PASSWORD,
                    "new_password": "nova-senha",
                    "check_new_password": "outra-senha",
                }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(Action::new("change", "POST", "/account/info").with_body(json!({
            "old_password": PASSWORD,
            "new_password": "nova-senha",
            "check_new_password": "nova-senha",
        })))
        .step(logout_action())
        .step(login_action("tiago@example.com", PASSWORD).with_expect(StatusCode::UNAUTHORIZED))
        .step(login_action("tiago@example.com", "nova-senha"))
        .run(&mut server, db)
        .await;
}

#[tokio::test]
async fn route_deactivate_test() {
    let db = setup_test_db().await;
    let mocks = MockServices::new();
    let mut server = setup_server(&db, &mocks).await;

    Flow::new()
        .step(signup_action("ugo@example.com", "53952915041"))
        .step(
            Action::new("no_confirm", "POST", "/account/deactivate")
                .with_body(json!({}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("bad_confirm", "POST", "/account/deactivate")
                .with_body(json!({"confirm": "delete"}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(Action::new("deactivate", "POST", "/account/deactivate").with_body(json!({"confirm": "DELETE"})))
        .step(Action::new("gone", "GET", "/account/info").with_expect(StatusCode::UNAUTHORIZED))
        .step(login_action("ugo@example.com", PASSWORD).with_expect(StatusCode::NOT_FOUND))
        // signing up again brings the account back
        .step(
            signup_action("ugo@example.com", "53952915041")
                .assert_body(|body| assert_eq!(data(body)["is_active"], true)),
        )
        .step(logout_action())
        .step(login_action("53952915041", PASSWORD))
        .run(&mut server, db)
        .await;
}

#[tokio::test]
async fn route_user_page_test() {
    let db = setup_test_db().await;
    let mocks = MockServices::new();
    let mut server = setup_server(&db, &mocks).await;

    Flow::new()
        .step(signup_admin_action().with_save_cookies(false))
        .step(signup_action("vera@example.com", "52998224725"))
        .step(Action::new("not_admin", "GET", "/account/page").with_expect(StatusCode::FORBIDDEN))
        .step(logout_action())
        .step(login_admin_action())
        .step(
            Action::new("page", "GET", "/account/page")
                .with_param("limit", "1")
                .with_param("offset", "0")
                .assert_body(|body| {
                    let page = data(body);
                    assert_eq!(page["total"], 2);
                    assert_eq!(page["limit"], 1);
                    assert_eq!(page["items"].as_array().unwrap().len(), 1);
                }),
        )
        .run(&mut server, db)
        .await;
}
