//! Shared fixtures for the HTTP integration tests

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use backoffice_server::auth::JwtConfig;
use backoffice_server::auth::password::hash_password;
use backoffice_server::db::DbService;
use backoffice_server::db::repository::user::{self, NewUser};
use backoffice_server::db::repository::{permission, role};
use backoffice_server::{Config, ServerState, api};
use http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub const PASSWORD: &str = "correct-horse-battery";

pub struct TestApp {
    pub state: ServerState,
    pub app: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = DbService::in_memory().await.expect("in-memory database");
        let config = Config {
            work_dir: "./data".into(),
            database_path: ":memory:".into(),
            http_port: 0,
            jwt: JwtConfig::with_secret("integration-test-secret-0123456789abcdef"),
            environment: "test".into(),
            admin_username: "admin".into(),
            admin_password: None,
        };
        let state = ServerState::new(config, db.pool);
        let app = api::build_app(state.clone());
        Self { state, app }
    }

    /// Create a user holding the named role and return `(user id, bearer token)`
    pub async fn user_with_role(&self, username: &str, role_name: &str) -> (i64, String) {
        let role = role::find_by_name(&self.state.pool, role_name)
            .await
            .unwrap()
            .expect("seeded role");
        let password_hash = hash_password(PASSWORD).unwrap();
        let created = user::create(
            &self.state.pool,
            NewUser {
                username,
                password_hash: &password_hash,
                display_name: username,
            },
            &[role.id],
        )
        .await
        .unwrap();

        let token = self
            .state
            .jwt_service
            .generate_token(created.id, username, &[role.role_name])
            .unwrap();
        (created.id, token)
    }

    pub async fn admin_token(&self) -> String {
        self.user_with_role("it-admin", "admin").await.1
    }

    pub async fn employee_token(&self) -> String {
        self.user_with_role("it-employee", "employee").await.1
    }

    pub async fn permission_id(&self, name: &str) -> i64 {
        permission::find_by_name(&self.state.pool, name)
            .await
            .unwrap()
            .expect("seeded permission")
            .id
    }

    /// Send a request and decode the JSON envelope
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let builder = match token {
            Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
            None => builder,
        };
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.dispatch(request).await
    }

    /// Send a raw JSON body, for malformed payloads
    pub async fn send_raw(&self, method: Method, uri: &str, token: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}
