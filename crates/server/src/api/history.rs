//! Session trigger history: view, CSV export, clear.

use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use napex_core::{TriggerHistory, TriggerRecord};
use serde::Serialize;
use tracing::info;

use super::middleware::SessionId;
use crate::state::AppState;

/// Filename offered for the exported history.
pub const EXPORT_FILENAME: &str = "trigger_history.csv";

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub records: Vec<TriggerRecord>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ClearHistoryResponse {
    pub cleared: usize,
}

/// Snapshot of the session history. Unknown sessions read as empty.
async fn snapshot(state: &AppState, session_id: &str) -> TriggerHistory {
    match state.sessions().get(session_id).await {
        Some(session) => session.lock().await.clone(),
        None => TriggerHistory::new(),
    }
}

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    SessionId(session_id): SessionId,
) -> Json<HistoryResponse> {
    let history = snapshot(&state, &session_id).await;
    Json(HistoryResponse {
        count: history.len(),
        records: history.records().to_vec(),
    })
}

/// History as a CSV attachment with a `customer,status,link` header.
pub async fn export_history(
    State(state): State<Arc<AppState>>,
    SessionId(session_id): SessionId,
) -> impl IntoResponse {
    let history = snapshot(&state, &session_id).await;
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILENAME),
            ),
        ],
        history.to_csv(),
    )
}

pub async fn clear_history(
    State(state): State<Arc<AppState>>,
    SessionId(session_id): SessionId,
) -> Json<ClearHistoryResponse> {
    let cleared = match state.sessions().get(&session_id).await {
        Some(session) => {
            let mut history = session.lock().await;
            let cleared = history.len();
            history.clear();
            cleared
        }
        None => 0,
    };

    info!("Session {}: cleared {} history record(s)", session_id, cleared);
    Json(ClearHistoryResponse { cleared })
}
