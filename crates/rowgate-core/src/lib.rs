//! Core types for the rowgate ingestion and query service.
//!
//! Provides the payload-to-row mapping, the row-to-record mapping, the
//! connection settings used to reach the database, and the storage layer
//! that runs the two statements the service knows.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod database;
pub mod error;
pub mod models;
pub mod storage;

pub use database::{DatabaseSettings, Driver, PoolLimits};
pub use error::{Result, RowgateError};
pub use models::{decode_payload, EventRow, Record, RecordSet, TableName};
pub use storage::Storage;
