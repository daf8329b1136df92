//! Sparkify ETL Library
//!
//! Loads song metadata and user activity logs from JSON files into a SQLite
//! star schema. The library is what the `sparkify-etl` binary and the
//! end-to-end tests build on.

pub mod config;
pub mod etl;
pub mod sqlite_persistence;
pub mod warehouse;

// Re-export commonly used types for convenience
pub use etl::{run_etl, DataKind, EtlError, EtlSummary, ParseError};
pub use warehouse::{SqliteWarehouseStore, Storage, StorageError};
