use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::inspect::schema::{ColumnSpec, DateFilter};
use crate::inspect::InspectError;
use crate::web::state::AppState;

// Column table types

#[derive(Debug, Deserialize)]
pub struct ReplaceColumnsRequest {
    pub columns: Vec<ColumnSpec>,
}

#[derive(Debug, Deserialize)]
pub struct PasteRequest {
    pub tsv: String,
}

#[derive(Debug, Serialize)]
pub struct ColumnsResponse {
    pub columns: Vec<ColumnSpec>,
}

// Query types

#[derive(Debug, Deserialize)]
pub struct GenerateQueryRequest {
    pub table_reference: String,
    #[serde(default)]
    pub use_date_filter: bool,
    pub term_column: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct GenerateQueryResponse {
    pub query: String,
    pub file_name: String,
}

// System status

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime_seconds: i64,
    pub session_count: usize,
}

fn error_response(err: InspectError) -> (StatusCode, String) {
    let status = match &err {
        InspectError::MissingTableReference => StatusCode::BAD_REQUEST,
        InspectError::InvalidPaste | InspectError::EmptyColumnSet => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        InspectError::Template(_) | InspectError::IoError(_) => {
            error!("Query generation failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

// Column table

pub async fn get_columns(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Json<ColumnsResponse> {
    // Unknown ids see the rows a new session would start with
    let columns = state
        .read_session(&session_id, |session| match session {
            Some(session) => session.columns.current().to_vec(),
            None => ColumnSpec::placeholder_rows(),
        })
        .await;
    Json(ColumnsResponse { columns })
}

pub async fn replace_columns(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(payload): Json<ReplaceColumnsRequest>,
) -> Json<ColumnsResponse> {
    // Grid rows get the same normalization as pasted rows
    let rows: Vec<ColumnSpec> = payload
        .columns
        .iter()
        .map(|row| ColumnSpec::new(&row.name, &row.declared_type))
        .collect();

    let columns = state
        .with_session(&session_id, |session| {
            session.columns.replace(rows);
            session.columns.current().to_vec()
        })
        .await;
    Json(ColumnsResponse { columns })
}

pub async fn paste_columns(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(payload): Json<PasteRequest>,
) -> Result<Json<ColumnsResponse>, (StatusCode, String)> {
    let result = state
        .with_session(&session_id, |session| {
            session
                .apply_paste(&payload.tsv)
                .map(|_| session.columns.current().to_vec())
        })
        .await;

    match result {
        Ok(columns) => {
            info!("Session '{}' pasted {} column rows", session_id, columns.len());
            Ok(Json(ColumnsResponse { columns }))
        }
        Err(e) => Err(error_response(e)),
    }
}

pub async fn term_columns(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Json<Vec<String>> {
    let names = state
        .read_session(&session_id, |session| {
            session
                .map(|session| session.columns.term_columns())
                .unwrap_or_default()
        })
        .await;
    Json(names)
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.remove_session(&session_id).await {
        info!("Session '{}' ended", session_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((
            StatusCode::NOT_FOUND,
            format!("Session '{}' not found", session_id),
        ))
    }
}

// Query generation

pub async fn generate_query(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(payload): Json<GenerateQueryRequest>,
) -> Result<Json<GenerateQueryResponse>, (StatusCode, String)> {
    if payload.table_reference.trim().is_empty() {
        return Err(error_response(InspectError::MissingTableReference));
    }

    let builder = &state.builder;
    let result = state
        .with_session(&session_id, |session| {
            let date_filter = payload.use_date_filter.then(|| {
                let remembered = &session.date_filter;
                let filter = DateFilter {
                    enabled: true,
                    column: payload
                        .term_column
                        .clone()
                        .unwrap_or_else(|| remembered.column.clone()),
                    start: payload.start_date.unwrap_or(remembered.start),
                    end: payload.end_date.unwrap_or(remembered.end),
                };
                if filter.is_inverted() {
                    warn!(
                        "Date filter start {} is after end {}; the query will match no rows",
                        filter.start, filter.end
                    );
                }
                filter
            });
            session.generate(builder, &payload.table_reference, date_filter)
        })
        .await;

    match result {
        Ok(query) => {
            info!("Session '{}' generated a query of {} bytes", session_id, query.len());
            Ok(Json(GenerateQueryResponse {
                query,
                file_name: state.config.generator.output_file.clone(),
            }))
        }
        Err(e) => {
            warn!("Session '{}' generation failed: {}", session_id, e);
            Err(error_response(e))
        }
    }
}

pub async fn download_query(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let query = state
        .sessions
        .read()
        .await
        .get(&session_id)
        .and_then(|session| session.last_query().map(str::to_string))
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                "No query has been generated for this session".to_string(),
            )
        })?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/sql; charset=utf-8"),
    );

    let disposition = format!(
        "attachment; filename=\"{}\"",
        state.config.generator.output_file
    );
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok((headers, query))
}

// System status
pub async fn system_status(State(state): State<Arc<AppState>>) -> Json<SystemStatus> {
    let now = chrono::Utc::now();
    let uptime = now.signed_duration_since(state.startup_time).num_seconds();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        session_count: state.sessions.read().await.len(),
    })
}
