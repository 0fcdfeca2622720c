//! Common test utilities for integration tests
//!
//! Every test gets its own router over a fresh [`InMemoryStore`], with
//! light Argon2id parameters so registration stays fast.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::Config;
use taskboard_shared::auth::password::HashingParams;
use taskboard_shared::store::InMemoryStore;
use tower::ServiceExt;

/// A registered, logged-in user
pub struct TestUser {
    pub id: String,
    pub username: String,
    pub token: String,
}

impl TestUser {
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

pub struct TestContext {
    pub store: Arc<InMemoryStore>,
    pub app: Router,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(Config::for_tests())
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let state = AppState::with_hashing(store.clone(), config, HashingParams::light());

        Self {
            store,
            app: build_router(state),
        }
    }

    /// Sends a request and returns the status with the parsed JSON body
    ///
    /// Empty bodies come back as `Value::Null`.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = build_request(method, uri, token, body);
        let response = self.app.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("non-JSON body ({}): {}", status, String::from_utf8_lossy(&bytes))
            })
        };

        (status, json)
    }

    /// Sends a request and returns the raw response, for streaming bodies
    pub async fn send_raw(&self, method: &str, uri: &str, token: Option<&str>) -> axum::response::Response {
        self.app
            .clone()
            .oneshot(build_request(method, uri, token, None))
            .await
            .unwrap()
    }

    pub async fn register_and_login(&self, username: &str) -> TestUser {
        let (status, body) = self
            .send(
                "POST",
                "/v1/auth/register",
                None,
                Some(serde_json::json!({ "username": username, "password": "pw" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        let id = body["id"].as_str().unwrap().to_string();

        let (status, body) = self
            .send(
                "POST",
                "/v1/auth/login",
                None,
                Some(serde_json::json!({ "username": username, "password": "pw" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        TestUser {
            id,
            username: username.to_string(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a project owned by `user` and returns its id
    pub async fn create_project(&self, user: &TestUser, name: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/v1/projects",
                Some(&user.token),
                Some(serde_json::json!({ "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    /// Issues an invitation and returns the full response body
    pub async fn invite(&self, user: &TestUser, project_id: &str) -> Value {
        let (status, body) = self
            .send(
                "POST",
                &format!("/v1/projects/{}/invite", project_id),
                Some(&user.token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "invite failed: {}", body);
        body
    }

    pub async fn create_task(&self, user: &TestUser, project_id: &str, title: &str) -> Value {
        let (status, body) = self
            .send(
                "POST",
                &format!("/v1/projects/{}/tasks", project_id),
                Some(&user.token),
                Some(serde_json::json!({ "title": title })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create task failed: {}", body);
        body
    }
}

fn build_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
