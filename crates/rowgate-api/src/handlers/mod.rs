//! HTTP request handlers for the rowgate API.
//!
//! Each trigger binding is a thin adapter over a transport-agnostic
//! operation (`ingest::ingest`, `query::query`) so the same contract can be
//! driven from tests or another trigger without an HTTP request.
//!
//! Handlers return `ApiError` on failure, which renders as
//! `{"error": {"code", "message"}}` with a status derived from the fault
//! class.

pub mod health;
pub mod ingest;
pub mod query;

pub use health::{health_check, liveness_check, readiness_check};
pub use ingest::ingest_event;
pub use query::query_records;
