#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use gepetinho_server::ai::{CompletionProvider, ContextMessage};
use gepetinho_server::config::{AppState, ServerConfig};
use gepetinho_server::store::{ConversationStore, MemoryStore};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

const BODY_LIMIT: usize = 1024 * 1024;

/// Provider that records contexts and can be switched into failure mode
#[derive(Default)]
pub struct FakeProvider {
    pub contexts: Mutex<Vec<Vec<ContextMessage>>>,
    pub failing: AtomicBool,
}

impl FakeProvider {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.contexts.lock().len()
    }
}

#[async_trait]
impl CompletionProvider for FakeProvider {
    async fn complete(&self, context: &[ContextMessage]) -> anyhow::Result<String> {
        self.contexts.lock().push(context.to_vec());
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("upstream 503");
        }
        Ok(format!("assistant turn {}", context.len()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub provider: Arc<FakeProvider>,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(FakeProvider::default());
        let state = AppState::new(
            &ServerConfig::for_tests(),
            store.clone() as Arc<dyn ConversationStore>,
            provider.clone(),
        );

        Self {
            router: gepetinho_server::router(state.clone()),
            store,
            provider,
            state,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router call")
    }

    pub async fn post_json(&self, uri: &str, body: Value, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let response = self
            .send(builder.body(Body::from(body.to_string())).expect("build request"))
            .await;
        let status = response.status();
        (status, json_body(response).await)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let response = self
            .send(builder.body(Body::empty()).expect("build request"))
            .await;
        let status = response.status();
        (status, json_body(response).await)
    }

    /// Sign up and return the issued token
    pub async fn signup(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .post_json(
                "/api/auth/signup",
                serde_json::json!({ "email": email, "password": password }),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);
        body["token"].as_str().expect("token").to_string()
    }
}

pub async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("parse json")
}
