//! Extraction of song and log documents into the warehouse.

mod driver;
mod error;
mod log_file;
mod song_file;

pub use driver::{discover_json_files, run_batch, BatchReport};
pub use error::{EtlError, ParseError};
pub use log_file::{
    extract_log_file, parse_log_document, LogFileStats, NextSongEvent, ParsedLog, NEXT_SONG_PAGE,
};
pub use song_file::{extract_song_file, parse_song_document};

use crate::config::AppConfig;
use crate::warehouse::{SqliteWarehouseStore, Storage, TableCounts};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Which kind of document a batch is made of.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataKind {
    Song,
    Log,
}

impl DataKind {
    /// Run the matching extractor on a single document.
    pub fn extract<S: Storage + ?Sized>(self, storage: &S, path: &Path) -> Result<(), EtlError> {
        match self {
            DataKind::Song => extract_song_file(storage, path),
            DataKind::Log => extract_log_file(storage, path).map(|_| ()),
        }
    }
}

/// Load every document of one kind found under `root`.
pub fn process_data<S: Storage + ?Sized>(
    storage: &S,
    root: &Path,
    kind: DataKind,
) -> Result<BatchReport, EtlError> {
    run_batch(storage, root, |storage, path| kind.extract(storage, path))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EtlSummary {
    pub songs: BatchReport,
    pub logs: BatchReport,
    pub counts: TableCounts,
}

/// Full run: song data first so that log plays can be resolved against it.
pub fn run_etl(config: &AppConfig) -> Result<EtlSummary> {
    info!("Opening warehouse database at {:?}...", config.database_path);
    let store = SqliteWarehouseStore::open(&config.database_path)?;

    if config.reset_schema {
        store.reset_schema()?;
    }

    let songs = process_data(&store, &config.song_data, DataKind::Song)
        .with_context(|| format!("Loading song data from {:?} failed", config.song_data))?;
    let logs = process_data(&store, &config.log_data, DataKind::Log)
        .with_context(|| format!("Loading log data from {:?} failed", config.log_data))?;

    let counts = store.table_counts()?;
    info!("Warehouse contains:");
    info!("  {} songs", counts.songs);
    info!("  {} artists", counts.artists);
    info!("  {} users", counts.users);
    info!("  {} time entries", counts.time);
    info!("  {} songplays", counts.songplays);

    Ok(EtlSummary {
        songs,
        logs,
        counts,
    })
}
