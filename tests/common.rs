use std::collections::HashMap;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tempfile::TempDir;
use tina::{build_server_with_services, integrations::mock::MockServices, model::DbConnection};
use tower_cookies::Cookie;

pub const ADMIN_EMAIL: &str = "es.grupoalpha2024@gmail.com";
pub const ADMIN_CPF: &str = "11144477735";
pub const PASSWORD: &str = "s3nh4-forte";

/// `FlowDatabase` is a throwaway SQLite file; the directory is removed on `Drop`.
pub struct FlowDatabase {
    _dir: TempDir,
    conn: DbConnection,
}

pub async fn setup_test_db() -> FlowDatabase {
    let dir = tempfile::tempdir().expect("Unable to create temp dir");
    let uri = format!("sqlite://{}", dir.path().join("tina-test.db").display());
    let conn = DbConnection::connect(&uri).expect("Unable to open test database");
    FlowDatabase { _dir: dir, conn }
}

pub async fn setup_server(db: &FlowDatabase, mocks: &MockServices) -> TestServer {
    let (_, app) = build_server_with_services(db.conn.clone(), mocks.services())
        .await
        .expect("Unable to build server");
    TestServer::new(app).expect("Unable to start test server")
}

/// Data of a success envelope.
pub fn data(body: &str) -> Value {
    let value: Value = serde_json::from_str(body).expect("Invalid JSON body");
    value["data"].clone()
}

/// Pulls the six-digit code out of a verification e-mail.
pub fn verification_code(text: &str) -> String {
    text.split(|c: char| !c.is_ascii_digit())
        .find(|part| part.len() == 6)
        .expect("No code in e-mail")
        .to_string()
}

#[derive(Debug)]
pub struct FlowContext {
    pub store: HashMap<&'static str, Value>, // a way to pass data between steps
}

impl FlowContext {
    pub fn new() -> Self {
        Self {
            store: HashMap::new(),
        }
    }

    pub fn store(&mut self, key: &'static str, val: Value) {
        self.store.insert(key, val);
    }

    pub fn get(&self, key: &str) -> &Value {
        self.store.get(key).expect("missing store key")
    }

    #[allow(unused)]
    pub fn get_json<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned,
    {
        let obj = self.get(key);
        serde_json::from_value(obj.clone()).expect("Invalid json format")
    }

    /// `data.id` of a stored envelope.
    pub fn id(&self, key: &str) -> String {
        self.get(key)["data"]["id"]
            .as_str()
            .unwrap_or_else(|| panic!("no data.id under {key}"))
            .to_string()
    }
}

type DynPath = Box<dyn Fn(&FlowContext) -> String + Send + Sync>;
type DynBody = Box<dyn Fn(&FlowContext) -> Value + Send + Sync>;
type DynParam = (&'static str, Box<dyn Fn(&FlowContext) -> String + Send + Sync>);
type DynHeaderCheck = Box<dyn Fn(&FlowContext, &str) + Send + Sync>;

pub struct Action {
    pub name: &'static str,
    pub method: &'static str,
    pub path: String,
    pub dyn_path: Option<DynPath>,
    pub body: Option<Value>,
    pub dyn_body: Option<DynBody>,
    pub expect: StatusCode,
    pub clear_cookies: bool,
    pub save_cookies: bool,
    pub query_params: Vec<(String, String)>,
    pub dyn_params: Vec<DynParam>,
    pub cookie_asserts: Vec<(&'static str, Box<dyn Fn(&Cookie) + Send + Sync>)>,
    pub header_asserts: Vec<(&'static str, DynHeaderCheck)>,
    pub body_asserts: Vec<Box<dyn Fn(&str) + Send + Sync>>,
    pub save_as: Option<&'static str>,
    pub sql: Option<&'static str>,
}

#[allow(unused)]
impl Action {
    pub fn new(name: &'static str, method: &'static str, path: &'static str) -> Self {
        Self {
            name,
            method,
            path: path.to_string(),
            dyn_path: None,
            body: None,
            dyn_body: None,
            expect: StatusCode::OK,
            clear_cookies: false,
            save_cookies: true,
            query_params: vec![],
            dyn_params: vec![],
            cookie_asserts: vec![],
            header_asserts: vec![],
            body_asserts: vec![],
            save_as: None,
            sql: None,
        }
    }

    /// Runs `statement` straight on the database instead of sending a request.
    pub fn sql(name: &'static str, statement: &'static str) -> Self {
        Self {
            sql: Some(statement),
            ..Self::new(name, "SQL", "")
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_expect(mut self, expect: StatusCode) -> Self {
        self.expect = expect;
        self
    }

    pub fn with_save_cookies(mut self, save_cookies: bool) -> Self {
        self.save_cookies = save_cookies;
        self
    }

    pub fn with_clear_cookies(mut self, clear_cookies: bool) -> Self {
        self.clear_cookies = clear_cookies;
        self
    }

    pub fn with_param(mut self, key: &str, val: &str) -> Self {
        self.query_params
            .push((String::from(key), String::from(val)));
        self
    }

    pub fn with_dyn_param<F>(mut self, key: &'static str, f: F) -> Self
    where
        F: Fn(&FlowContext) -> String + Send + Sync + 'static,
    {
        self.dyn_params.push((key, Box::new(f)));
        self
    }

    pub fn with_dyn_path<F>(mut self, f: F) -> Self
    where
        F: Fn(&FlowContext) -> String + Send + Sync + 'static,
    {
        self.dyn_path = Some(Box::new(f));
        self
    }

    pub fn with_dyn_body<F>(mut self, f: F) -> Self
    where
        F: Fn(&FlowContext) -> Value + Send + Sync + 'static,
    {
        self.dyn_body = Some(Box::new(f));
        self
    }

    pub fn with_save_as(mut self, key: &'static str) -> Self {
        self.save_as = Some(key);
        self
    }

    pub fn assert_cookie<F>(mut self, name: &'static str, check: F) -> Self
    where
        F: Fn(&Cookie) + Send + Sync + 'static,
    {
        self.cookie_asserts.push((name, Box::new(check)));
        self
    }

    pub fn assert_header<F>(mut self, name: &'static str, check: F) -> Self
    where
        F: Fn(&FlowContext, &str) + Send + Sync + 'static,
    {
        self.header_asserts.push((name, Box::new(check)));
        self
    }

    pub fn assert_body<F>(mut self, check: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.body_asserts.push(Box::new(check));
        self
    }
}

pub struct Flow {
    actions: Vec<Action>,
}

impl Flow {
    pub fn new() -> Self {
        Self { actions: vec![] }
    }

    pub fn step(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub async fn run(self, server: &mut TestServer, db: FlowDatabase) {
        let mut ctx = FlowContext::new(); // create new context for this flow
        for action in self.actions {
            println!("==> Running test action `{}`", action.name);
            if let Some(statement) = action.sql {
                sqlx::query(statement)
                    .execute(db.conn.pool())
                    .await
                    .expect("SQL step failed");
                continue;
            }
            if action.clear_cookies {
                server.clear_cookies();
            }

            if action.save_cookies {
                server.save_cookies();
            } else {
                server.do_not_save_cookies();
            }

            let path = if let Some(dyn_path_fn) = action.dyn_path {
                dyn_path_fn(&ctx)
            } else {
                action.path.clone()
            };

            let mut req = match action.method {
                "GET" => server.get(&path),
                "POST" => server.post(&path),
                "PUT" => server.put(&path),
                "DELETE" => server.delete(&path),
                _ => panic!("unsupported method {}", action.method),
            };

            match (action.dyn_body, action.body) {
                (Some(f), _) => {
                    req = req.json(&f(&ctx));
                }
                (_, Some(json)) => req = req.json(&json),
                _ => {}
            }

            for (k, v) in action.query_params {
                req = req.add_query_param(&k, v);
            }
            for (k, f) in action.dyn_params {
                req = req.add_query_param(k, f(&ctx));
            }

            let resp = req.await;
            resp.assert_status(action.expect);
            let cookies = resp.cookies();

            for (cookie_name, check) in action.cookie_asserts {
                let cookie = cookies
                    .get(cookie_name)
                    .unwrap_or_else(|| panic!("Cookie {} is not set", cookie_name));
                check(cookie);
            }

            for (header_name, check) in action.header_asserts {
                let value = resp.header(header_name);
                check(&ctx, value.to_str().expect("Non-ASCII header"));
            }

            if !action.body_asserts.is_empty() {
                let body = resp.text();
                for check in action.body_asserts {
                    check(&body);
                }
            }

            if let Some(save_key) = action.save_as {
                let body = resp.json::<Value>();
                ctx.store(save_key, body);
            }
        }
    }
}

// Common actions builders

#[allow(unused)]
pub fn signup_action(email: &str, cpf: &str) -> Action {
    Action::new("signup", "POST", "/sign-up").with_body(json!({
        "email": email,
        "password": PASSWORD,
        "password_check": PASSWORD,
        "full_name": "Maria Silva",
        "birth_date": "1990-05-17",
        "cpf": cpf,
    }))
}

#[allow(unused)]
pub fn signup_admin_action() -> Action {
    signup_action(ADMIN_EMAIL, ADMIN_CPF)
}

#[allow(unused)]
pub fn login_action(id_method: &str, password: &str) -> Action {
    Action::new("login", "POST", "/login/authenticate").with_body(json!({
        "id_method": id_method,
        "password": password,
    }))
}

#[allow(unused)]
pub fn login_admin_action() -> Action {
    login_action(ADMIN_EMAIL, PASSWORD)
}

#[allow(unused)]
pub fn logout_action() -> Action {
    Action::new("logout", "POST", "/logout")
}

/// Admin-only course with two lessons and one question answered by `B`.
#[allow(unused)]
pub fn create_course_action(name: &str) -> Action {
    Action::new("create_course", "POST", "/criar_curso")
        .with_body(json!({
            "name": name,
            "description": "Aprenda o básico de Rust",
            "estimated_hours": 12,
            "certificate_text": "Conteúdo: ownership e borrowing.",
            "lessons": [
                {"title": "Ownership", "video_url": "https://videos.example/2", "order_index": 1},
                {"title": "Introdução", "video_url": "https://videos.example/1", "order_index": 0},
            ],
            "questions": [{
                "statement": "Quem libera a memória?",
                "option_a": "O GC",
                "option_b": "O dono",
                "option_c": "O SO",
                "option_d": "Ninguém",
                "correct_answer": "B",
            }],
        }))
        .with_expect(StatusCode::CREATED)
}
