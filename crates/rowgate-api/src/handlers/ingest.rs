//! Event ingestion handler.
//!
//! Accepts one event payload, logs it, maps it to the two column values and
//! persists exactly one row. There is no deduplication: every successful
//! call inserts a new row.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use bytes::Bytes;
use rowgate_core::{decode_payload, EventRow, Result, Storage};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::{error::ApiError, AppState};

/// Response from successful ingestion.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    /// Always `accepted`
    pub status: &'static str,
}

/// Ingests one event payload into the record table.
///
/// Decodes the payload as UTF-8, logs the text, maps it to an [`EventRow`]
/// and inserts it in its own committed transaction.
///
/// # Errors
///
/// Returns `RowgateError::InvalidPayload` before touching the database if
/// the payload cannot be decoded or mapped. Database faults propagate
/// unchanged.
pub async fn ingest(storage: &Storage, payload: &[u8]) -> Result<EventRow> {
    let text = decode_payload(payload)?;
    info!(payload = %text, "Processing event");

    let row = EventRow::parse(text)?;
    storage.records.insert(&row).await?;

    Ok(row)
}

/// `POST /api/events`: the event trigger binding.
///
/// # Errors
///
/// - 400: payload is not UTF-8 or does not map to a row
/// - 503: database unreachable
/// - 500: statement rejected
#[instrument(name = "ingest_event", skip(state, body), fields(payload_size = body.len()))]
pub async fn ingest_event(
    State(state): State<AppState>,
    body: Bytes,
) -> std::result::Result<impl IntoResponse, ApiError> {
    match ingest(&state.storage, &body).await {
        Ok(row) => {
            info!(column1 = %row.column1, column2 = row.column2, "Event ingested");
            Ok((StatusCode::ACCEPTED, Json(IngestResponse { status: "accepted" })))
        },
        Err(e) => {
            if e.is_client_fault() {
                warn!(error = %e, code = e.code(), "Event rejected");
            } else {
                error!(error = %e, code = e.code(), "Event ingestion failed");
            }
            Err(e.into())
        },
    }
}
