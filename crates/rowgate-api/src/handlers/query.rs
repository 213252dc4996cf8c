//! Record query handler.
//!
//! Returns the entire table as a JSON array of objects keyed by column
//! name. The read is unbounded: there is no pagination, filter or row
//! limit, so response size grows with the table.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use rowgate_core::{Result, Storage};
use tracing::{error, info, instrument};

use crate::{error::ApiError, AppState};

/// Reads every row and serializes the set to a JSON array.
///
/// # Errors
///
/// Any database or serialization fault fails the whole call; no partial
/// body is produced.
pub async fn query(storage: &Storage) -> Result<Vec<u8>> {
    let records = storage.records.fetch_all().await?;
    info!(rows = records.len(), "Records loaded");

    records.to_json_bytes()
}

/// `GET /api/records`: the HTTP query binding.
///
/// Request headers and body are ignored.
#[instrument(name = "query_records", skip(state))]
pub async fn query_records(
    State(state): State<AppState>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let body = query(&state.storage).await.map_err(|e| {
        error!(error = %e, "Record query failed");
        ApiError::from(e)
    })?;

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "application/json")], body))
}
