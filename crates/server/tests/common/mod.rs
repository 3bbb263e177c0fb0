//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock object storage and pipeline services injected, so the full
//! HTTP stack can be exercised without a cloud project.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use napex_core::{
    testing::{MockObjectStore, MockPipelineService},
    ObjectStore, PipelineService, TriggerConfig, TriggerOrchestrator, TriggerSettings,
};
use napex_server::api::create_router;
use napex_server::state::AppState;

/// Re-export fixtures for test convenience
pub use napex_core::testing::fixtures;

pub const SESSION_HEADER: &str = "x-session-id";

const BOUNDARY: &str = "napex-test-boundary";

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_trigger() {
///     let fixture = TestFixture::new();
///
///     let form = MultipartForm::new().file("acme.csv", "date,value\n");
///     let response = fixture.post_form("/api/v1/triggers", &form, Some("s1")).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    pub router: Router,
    pub store: Arc<MockObjectStore>,
    pub pipelines: Arc<MockPipelineService>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub text: String,
}

impl TestResponse {
    pub fn session_id(&self) -> Option<&str> {
        self.headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
    }
}

impl TestFixture {
    /// Create a new test fixture with the default trigger settings.
    pub fn new() -> Self {
        Self::with_trigger_config(TriggerConfig::default())
    }

    pub fn with_trigger_config(trigger: TriggerConfig) -> Self {
        Self::with_config(fixtures::config(trigger))
    }

    pub fn with_config(config: napex_core::Config) -> Self {
        let store = Arc::new(MockObjectStore::new(fixtures::BUCKET));
        let pipelines = Arc::new(MockPipelineService::new());

        let orchestrator = Arc::new(TriggerOrchestrator::new(
            TriggerSettings::from(&config),
            Arc::clone(&store) as Arc<dyn ObjectStore>,
            Arc::clone(&pipelines) as Arc<dyn PipelineService>,
        ));

        let state = Arc::new(AppState::new(config, orchestrator));
        let router = create_router(state);

        Self {
            router,
            store,
            pipelines,
        }
    }

    /// Send a GET request, optionally within a session.
    pub async fn get(&self, path: &str, session: Option<&str>) -> TestResponse {
        self.send(Self::builder("GET", path, session), Body::empty())
            .await
    }

    /// Send a DELETE request, optionally within a session.
    pub async fn delete(&self, path: &str, session: Option<&str>) -> TestResponse {
        self.send(Self::builder("DELETE", path, session), Body::empty())
            .await
    }

    /// Send a multipart POST request, optionally within a session.
    pub async fn post_form(
        &self,
        path: &str,
        form: &MultipartForm,
        session: Option<&str>,
    ) -> TestResponse {
        self.send_request(Self::form_request(path, form, session))
            .await
    }

    /// Build a multipart POST request without sending it.
    pub fn form_request(path: &str, form: &MultipartForm, session: Option<&str>) -> Request<Body> {
        Self::builder("POST", path, session)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(form.encode()))
            .unwrap()
    }

    /// Send a POST request with raw body and content type.
    pub async fn post_raw(
        &self,
        path: &str,
        body: &str,
        content_type: &str,
        session: Option<&str>,
    ) -> TestResponse {
        let builder = Self::builder("POST", path, session).header("Content-Type", content_type);
        self.send(builder, Body::from(body.to_string())).await
    }

    fn builder(method: &str, path: &str, session: Option<&str>) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(path);
        match session {
            Some(id) => builder.header(SESSION_HEADER, id),
            None => builder,
        }
    }

    async fn send(&self, builder: axum::http::request::Builder, body: Body) -> TestResponse {
        self.send_request(builder.body(body).unwrap()).await
    }

    async fn send_request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
            text,
        }
    }
}

/// Builder for `multipart/form-data` request bodies.
#[derive(Debug, Default)]
pub struct MultipartForm {
    parts: Vec<(String, Option<String>, Vec<u8>)>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file under the `files` field.
    pub fn file(self, filename: &str, content: impl AsRef<[u8]>) -> Self {
        self.file_field("files", filename, content)
    }

    pub fn file_field(mut self, field: &str, filename: &str, content: impl AsRef<[u8]>) -> Self {
        self.parts.push((
            field.to_string(),
            Some(filename.to_string()),
            content.as_ref().to_vec(),
        ));
        self
    }

    /// Add a customer CSV generated by the core fixtures.
    pub fn customer(self, customer: &str) -> Self {
        let upload = fixtures::cashflow_csv(customer);
        self.file(&upload.filename, upload.content)
    }

    pub fn text(mut self, field: &str, value: &str) -> Self {
        self.parts
            .push((field.to_string(), None, value.as_bytes().to_vec()));
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for (field, filename, content) in &self.parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match filename {
                Some(filename) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                            field, filename
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(b"Content-Type: text/csv\r\n\r\n");
                }
                None => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", field)
                            .as_bytes(),
                    );
                }
            }
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}
