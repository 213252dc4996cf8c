//! Rowgate HTTP API.
//!
//! Routes:
//! - `POST /api/events`: ingest one event payload as one table row
//! - `GET /api/records`: return the whole table as a JSON array
//! - `GET /health`, `/ready`, `/live`: probes

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod server;

pub use config::Config;
pub use error::ApiError;
pub use server::{create_router, start_server, AppState};
