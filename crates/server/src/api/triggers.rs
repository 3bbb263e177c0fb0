//! Upload-and-trigger endpoint.

use std::sync::Arc;

use axum::{
    extract::{
        multipart::{Field, MultipartError},
        Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use napex_core::{TriggerOptions, TriggerOutcome, TriggerRecord, Upload};
use serde::Serialize;
use tracing::{debug, error, info};

use super::middleware::SessionId;
use super::ErrorResponse;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub outcomes: Vec<TriggerOutcome>,
    pub triggered: usize,
    pub skipped: usize,
    /// Session history after this request.
    pub history: Vec<TriggerRecord>,
}

#[derive(Debug, Serialize)]
pub struct TriggerFailureResponse {
    pub error: String,
    /// Session history, including files triggered before the failure.
    pub history: Vec<TriggerRecord>,
}

fn bad_request(error: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

/// Keeps the multipart status, so an oversized body maps to 413.
fn multipart_error(context: &str, e: MultipartError) -> Response {
    (
        e.status(),
        Json(ErrorResponse {
            error: format!("{}: {}", context, e.body_text()),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// Stage the uploaded files and launch one pipeline run per file.
///
/// Multipart fields:
/// - `files` (repeatable, `file` also accepted): CSV uploads
/// - `training_budget_hours`: optional, defaults to 1.0
/// - `forecast_horizon`: optional
pub async fn create_triggers(
    State(state): State<Arc<AppState>>,
    SessionId(session_id): SessionId,
    multipart: Multipart,
) -> Response {
    let (uploads, options) = match parse_trigger_form(multipart).await {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };

    debug!(
        "Session {} submitted {} file(s)",
        session_id,
        uploads.len()
    );

    let session = state.sessions().get_or_create(&session_id).await;
    let orchestrator = Arc::clone(state.orchestrator());

    // Runs detached: a dropped request still records every submitted run.
    let batch = tokio::spawn(async move {
        let mut history = session.lock().await;
        let (updated, result) = orchestrator
            .trigger(history.clone(), uploads, &options)
            .await;
        *history = updated;
        (history.records().to_vec(), result)
    });

    let (records, result) = match batch.await {
        Ok(finished) => finished,
        Err(e) => {
            error!("Trigger batch for session {} aborted: {}", session_id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Trigger batch aborted".to_string(),
                }),
            )
                .into_response();
        }
    };

    match result {
        Ok(outcomes) => {
            let triggered = outcomes.iter().filter(|o| o.is_triggered()).count();
            let skipped = outcomes.len() - triggered;
            info!(
                "Session {}: {} triggered, {} skipped",
                session_id, triggered, skipped
            );
            Json(TriggerResponse {
                outcomes,
                triggered,
                skipped,
                history: records,
            })
            .into_response()
        }
        Err(e) if e.is_input_error() => bad_request(e.to_string()),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(TriggerFailureResponse {
                error: e.to_string(),
                history: records,
            }),
        )
            .into_response(),
    }
}

async fn parse_trigger_form(
    mut multipart: Multipart,
) -> Result<(Vec<Upload>, TriggerOptions), Response> {
    let mut uploads = Vec::new();
    let mut options = TriggerOptions::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(multipart_error("Failed to read multipart body", e)),
        };

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "files" | "file" => {
                let filename = match field.file_name() {
                    Some(filename) => filename.to_string(),
                    None => return Err(bad_request("File part is missing a filename")),
                };
                match field.bytes().await {
                    Ok(bytes) => uploads.push(Upload::new(filename, bytes.to_vec())),
                    Err(e) => {
                        return Err(multipart_error(
                            &format!("Failed to read file {}", filename),
                            e,
                        ))
                    }
                }
            }
            "training_budget_hours" => {
                if let Some(text) = field_text(field).await? {
                    options.training_budget_hours = text.parse().map_err(|_| {
                        bad_request(format!("Invalid training_budget_hours: {:?}", text))
                    })?;
                }
            }
            "forecast_horizon" => {
                if let Some(text) = field_text(field).await? {
                    options.forecast_horizon = Some(text.parse().map_err(|_| {
                        bad_request(format!("Invalid forecast_horizon: {:?}", text))
                    })?);
                }
            }
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    Ok((uploads, options))
}

/// Trimmed text of a form field, `None` when blank.
async fn field_text(field: Field<'_>) -> Result<Option<String>, Response> {
    let text = field
        .text()
        .await
        .map_err(|e| multipart_error("Failed to read form field", e))?;
    let text = text.trim();
    Ok((!text.is_empty()).then(|| text.to_string()))
}
