//! API tests with mocked object storage and pipeline services.
//!
//! These tests run the full router in-process: session middleware, multipart
//! parsing, the trigger orchestrator and the history endpoints.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use napex_core::{DuplicatePolicy, PipelineError, StorageError, TriggerConfig};
use serde_json::json;
use tower::ServiceExt;

use common::{fixtures, MultipartForm, TestFixture};

// =============================================================================
// Basic API Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/health", None).await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert!(response.session_id().is_some());
}

#[tokio::test]
async fn test_config_endpoint_hides_token() {
    let mut config = fixtures::config(TriggerConfig::default());
    config.gcp.access_token = Some("secret-token".to_string());
    let fixture = TestFixture::with_config(config);

    let response = fixture.get("/api/v1/config", None).await;

    assert_status!(response, StatusCode::OK);
    assert!(!response.text.contains("secret-token"));
    assert_eq!(response.body["gcp"]["project_id"], fixtures::PROJECT);
    assert_eq!(response.body["gcp"]["access_token_configured"], true);
    assert_eq!(response.body["trigger"]["duplicate_policy"], "skip");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    fixture
        .post_form("/api/v1/triggers", &MultipartForm::new().customer("acme"), Some("m1"))
        .await;

    let response = fixture.get("/metrics", None).await;

    assert_status!(response, StatusCode::OK);
    assert!(response.text.contains("napex_triggers_total"));
    assert!(response.text.contains("napex_http_requests_total"));
}

// =============================================================================
// Sessions
// =============================================================================

#[tokio::test]
async fn test_session_header_echoed() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/history", Some("analyst-7")).await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.session_id(), Some("analyst-7"));
}

#[tokio::test]
async fn test_malformed_session_header_rejected() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/history", Some("bad id!")).await;

    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_issued_session_id_reaches_history() {
    let fixture = TestFixture::new();

    let response = fixture
        .post_form("/api/v1/triggers", &MultipartForm::new().customer("acme"), None)
        .await;
    assert_status!(response, StatusCode::OK);
    let session = response
        .session_id()
        .expect("session id issued")
        .to_string();

    let history = fixture.get("/api/v1/history", Some(&session)).await;
    assert_eq!(history.body["count"], 1);
    assert_eq!(history.body["records"][0]["customer_name"], "acme");
}

#[tokio::test]
async fn test_sessions_do_not_share_history() {
    let fixture = TestFixture::new();
    let form = MultipartForm::new().customer("acme");

    fixture.post_form("/api/v1/triggers", &form, Some("s1")).await;
    let response = fixture.post_form("/api/v1/triggers", &form, Some("s2")).await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["triggered"], 1);
    assert_eq!(fixture.pipelines.submission_count().await, 2);

    let other = fixture.get("/api/v1/history", Some("s3")).await;
    assert_eq!(other.body["count"], 0);
}

// =============================================================================
// Triggers
// =============================================================================

#[tokio::test]
async fn test_trigger_single_file() {
    let fixture = TestFixture::new();
    let form = MultipartForm::new()
        .customer("acme")
        .text("training_budget_hours", "2.5");

    let response = fixture.post_form("/api/v1/triggers", &form, Some("s1")).await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["triggered"], 1);
    assert_eq!(response.body["skipped"], 0);

    let outcome = &response.body["outcomes"][0];
    assert_eq!(outcome["status"], "triggered");
    assert_eq!(outcome["filename"], "acme.csv");
    assert_eq!(outcome["customer_name"], "acme");
    assert_eq!(outcome["gcs_uri"], "gs://ncms-cashflow/uploads/acme.csv");
    assert_eq!(outcome["display_name"], "pipeline-automl-cashflow-acme");

    let link = outcome["link"].as_str().unwrap();
    assert!(link.starts_with(
        "https://console.cloud.google.com/vertex-ai/locations/us-central1/pipelines/runs/pipeline-automl-cashflow-acme-"
    ));
    assert!(link.ends_with("?project=ncms-forecasting"));

    assert_eq!(response.body["history"][0]["status"], "Triggered");
    assert_eq!(response.body["history"][0]["link"], outcome["link"]);

    let staged = fixture.store.object("uploads/acme.csv").await;
    assert_eq!(
        staged.as_deref(),
        Some(fixtures::cashflow_csv("acme").content.as_slice())
    );

    let submissions = fixture.pipelines.recorded_submissions().await;
    assert_eq!(submissions.len(), 1);
    let request = &submissions[0].request;
    assert_eq!(request.template_uri, fixtures::TEMPLATE);
    assert_eq!(
        request.parameter("training_budget_milli_node_hours"),
        Some(&json!(2500))
    );
    assert_eq!(request.parameter("customer_name"), Some(&json!("acme")));
}

#[tokio::test]
async fn test_trigger_multiple_files_in_order() {
    let fixture = TestFixture::new();
    let form = MultipartForm::new()
        .customer("acme")
        .customer("globex")
        .customer("initech");

    let response = fixture.post_form("/api/v1/triggers", &form, Some("s1")).await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["triggered"], 3);
    let customers: Vec<&str> = response.body["history"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["customer_name"].as_str().unwrap())
        .collect();
    assert_eq!(customers, vec!["acme", "globex", "initech"]);
}

#[tokio::test]
async fn test_single_file_field_name_accepted() {
    let fixture = TestFixture::new();
    let form = MultipartForm::new().file_field("file", "acme.csv", "date,value\n");

    let response = fixture.post_form("/api/v1/triggers", &form, Some("s1")).await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(fixture.store.upload_count().await, 1);
}

#[tokio::test]
async fn test_forecast_horizon_forwarded() {
    let fixture = TestFixture::new();
    let form = MultipartForm::new()
        .customer("acme")
        .text("forecast_horizon", "30");

    let response = fixture.post_form("/api/v1/triggers", &form, Some("s1")).await;

    assert_status!(response, StatusCode::OK);
    let submissions = fixture.pipelines.recorded_submissions().await;
    assert_eq!(
        submissions[0].request.parameter("forecast_horizon"),
        Some(&json!(30))
    );
}

#[tokio::test]
async fn test_blank_options_use_defaults() {
    let fixture = TestFixture::new();
    let form = MultipartForm::new()
        .customer("acme")
        .text("training_budget_hours", "")
        .text("forecast_horizon", " ");

    let response = fixture.post_form("/api/v1/triggers", &form, Some("s1")).await;

    assert_status!(response, StatusCode::OK);
    let submissions = fixture.pipelines.recorded_submissions().await;
    let request = &submissions[0].request;
    assert_eq!(
        request.parameter("training_budget_milli_node_hours"),
        Some(&json!(1000))
    );
    assert!(request.parameter("forecast_horizon").is_none());
}

#[tokio::test]
async fn test_duplicate_skipped_within_session() {
    let fixture = TestFixture::new();
    let form = MultipartForm::new().customer("acme");

    fixture.post_form("/api/v1/triggers", &form, Some("s1")).await;
    let response = fixture.post_form("/api/v1/triggers", &form, Some("s1")).await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["triggered"], 0);
    assert_eq!(response.body["skipped"], 1);
    assert_eq!(response.body["outcomes"][0]["status"], "skipped_duplicate");
    assert_eq!(response.body["history"].as_array().unwrap().len(), 1);
    assert_eq!(fixture.pipelines.submission_count().await, 1);
    assert_eq!(fixture.store.upload_count().await, 1);
}

#[tokio::test]
async fn test_resubmit_policy_submits_duplicates() {
    let fixture = TestFixture::with_trigger_config(TriggerConfig {
        duplicate_policy: DuplicatePolicy::Resubmit,
        ..Default::default()
    });
    let form = MultipartForm::new().customer("acme");

    fixture.post_form("/api/v1/triggers", &form, Some("s1")).await;
    let response = fixture.post_form("/api/v1/triggers", &form, Some("s1")).await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["triggered"], 1);
    assert_eq!(response.body["history"].as_array().unwrap().len(), 2);
    assert_eq!(fixture.pipelines.submission_count().await, 2);
}

// =============================================================================
// Input errors
// =============================================================================

#[tokio::test]
async fn test_no_files_rejected() {
    let fixture = TestFixture::new();
    let form = MultipartForm::new().text("training_budget_hours", "2");

    let response = fixture.post_form("/api/v1/triggers", &form, Some("s1")).await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].as_str().unwrap().contains("No files"));
}

#[tokio::test]
async fn test_out_of_range_budget_rejected() {
    let fixture = TestFixture::new();
    let form = MultipartForm::new()
        .customer("acme")
        .text("training_budget_hours", "250");

    let response = fixture.post_form("/api/v1/triggers", &form, Some("s1")).await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(fixture.store.upload_count().await, 0);
    assert_eq!(fixture.pipelines.submission_count().await, 0);
}

#[tokio::test]
async fn test_non_numeric_option_rejected() {
    let fixture = TestFixture::new();
    let form = MultipartForm::new()
        .customer("acme")
        .text("forecast_horizon", "next month");

    let response = fixture.post_form("/api/v1/triggers", &form, Some("s1")).await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("forecast_horizon"));
}

#[tokio::test]
async fn test_non_csv_rejected_before_any_upload() {
    let fixture = TestFixture::new();
    let form = MultipartForm::new()
        .customer("acme")
        .file("report.xlsx", "binary");

    let response = fixture.post_form("/api/v1/triggers", &form, Some("s1")).await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(fixture.store.upload_count().await, 0);

    let history = fixture.get("/api/v1/history", Some("s1")).await;
    assert_eq!(history.body["count"], 0);
}

#[tokio::test]
async fn test_non_multipart_body_rejected() {
    let fixture = TestFixture::new();
    let response = fixture
        .post_raw(
            "/api/v1/triggers",
            r#"{"files": []}"#,
            "application/json",
            Some("s1"),
        )
        .await;

    assert!(response.status.is_client_error());
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let mut config = fixtures::config(TriggerConfig::default());
    config.server.max_upload_bytes = 1024;
    let fixture = TestFixture::with_config(config);
    let form = MultipartForm::new().file("acme.csv", "x".repeat(8 * 1024));

    let response = fixture.post_form("/api/v1/triggers", &form, Some("s1")).await;

    assert!(response.status.is_client_error());
    assert_eq!(fixture.store.upload_count().await, 0);
}

// =============================================================================
// Cloud failures
// =============================================================================

#[tokio::test]
async fn test_storage_failure_keeps_earlier_records() {
    let fixture = TestFixture::new();
    fixture
        .store
        .fail_object("uploads/globex.csv", StorageError::Timeout)
        .await;
    let form = MultipartForm::new()
        .customer("acme")
        .customer("globex")
        .customer("initech");

    let response = fixture.post_form("/api/v1/triggers", &form, Some("s1")).await;

    assert_status!(response, StatusCode::BAD_GATEWAY);
    assert!(response.body["error"].as_str().unwrap().contains("globex.csv"));
    let history = response.body["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["customer_name"], "acme");
    assert_eq!(fixture.pipelines.submission_count().await, 1);

    let stored = fixture.get("/api/v1/history", Some("s1")).await;
    assert_eq!(stored.body["count"], 1);
}

#[tokio::test]
async fn test_pipeline_failure_returns_bad_gateway() {
    let fixture = TestFixture::new();
    fixture
        .pipelines
        .fail_customer(
            "acme",
            PipelineError::ApiError {
                status: 403,
                message: "permission denied".to_string(),
            },
        )
        .await;

    let response = fixture
        .post_form("/api/v1/triggers", &MultipartForm::new().customer("acme"), Some("s1"))
        .await;

    assert_status!(response, StatusCode::BAD_GATEWAY);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("permission denied"));
    assert_eq!(response.body["history"], json!([]));
}

#[tokio::test]
async fn test_retry_after_failure_triggers_remaining_files() {
    let fixture = TestFixture::new();
    fixture
        .store
        .fail_object("uploads/globex.csv", StorageError::Timeout)
        .await;
    let form = MultipartForm::new().customer("acme").customer("globex");

    fixture.post_form("/api/v1/triggers", &form, Some("s1")).await;
    let response = fixture.post_form("/api/v1/triggers", &form, Some("s1")).await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["outcomes"][0]["status"], "skipped_duplicate");
    assert_eq!(response.body["outcomes"][1]["status"], "triggered");
    assert_eq!(response.body["history"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_dropped_request_still_records_submitted_runs() {
    let fixture = TestFixture::new();
    fixture
        .pipelines
        .set_delay(Duration::from_millis(100))
        .await;
    let form = MultipartForm::new().customer("acme").customer("globex");

    let request = TestFixture::form_request("/api/v1/triggers", &form, Some("s1"));
    let in_flight = tokio::spawn(fixture.router.clone().oneshot(request));
    tokio::time::sleep(Duration::from_millis(50)).await;
    in_flight.abort();

    tokio::time::timeout(Duration::from_secs(5), async {
        while fixture.pipelines.submission_count().await < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("batch kept running after the request was dropped");

    let history = fixture.get("/api/v1/history", Some("s1")).await;
    assert_status!(history, StatusCode::OK);
    assert_eq!(history.body["count"], 2);
    assert_eq!(history.body["records"][0]["customer_name"], "acme");
    assert_eq!(history.body["records"][1]["customer_name"], "globex");

    let retry = MultipartForm::new().customer("acme");
    let response = fixture.post_form("/api/v1/triggers", &retry, Some("s1")).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["outcomes"][0]["status"], "skipped_duplicate");
    assert_eq!(fixture.pipelines.submission_count().await, 2);
}

// =============================================================================
// History
// =============================================================================

#[tokio::test]
async fn test_history_empty_for_new_session() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/history", Some("fresh")).await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["count"], 0);
    assert_eq!(response.body["records"], json!([]));
}

#[tokio::test]
async fn test_export_history_csv() {
    let fixture = TestFixture::new();
    let form = MultipartForm::new().customer("acme").customer("globex");
    fixture.post_form("/api/v1/triggers", &form, Some("s1")).await;

    let response = fixture.get("/api/v1/history/export", Some("s1")).await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(
        response.headers["content-type"],
        "text/csv; charset=utf-8"
    );
    assert_eq!(
        response.headers["content-disposition"],
        "attachment; filename=\"trigger_history.csv\""
    );

    let lines: Vec<&str> = response.text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "customer,status,link");
    assert!(lines[1].starts_with("acme,Triggered,https://console.cloud.google.com/"));
    assert!(lines[2].starts_with("globex,Triggered,"));
}

#[tokio::test]
async fn test_export_empty_history_has_header() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/history/export", Some("s1")).await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.text, "customer,status,link\n");
}

#[tokio::test]
async fn test_clear_history_allows_resubmission() {
    let fixture = TestFixture::new();
    let form = MultipartForm::new().customer("acme");
    fixture.post_form("/api/v1/triggers", &form, Some("s1")).await;

    let cleared = fixture.delete("/api/v1/history", Some("s1")).await;
    assert_status!(cleared, StatusCode::OK);
    assert_eq!(cleared.body["cleared"], 1);

    let history = fixture.get("/api/v1/history", Some("s1")).await;
    assert_eq!(history.body["count"], 0);

    let response = fixture.post_form("/api/v1/triggers", &form, Some("s1")).await;
    assert_eq!(response.body["triggered"], 1);
    assert_eq!(fixture.pipelines.submission_count().await, 2);
}

#[tokio::test]
async fn test_clear_unknown_session() {
    let fixture = TestFixture::new();
    let response = fixture.delete("/api/v1/history", Some("nobody")).await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["cleared"], 0);
}
