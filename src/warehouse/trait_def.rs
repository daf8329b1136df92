//! Storage trait definition.
//!
//! The extractors and the batch driver only talk to the warehouse through
//! this trait, so any relational backend can sit behind it.

use super::models::{Artist, Song, SongArtistIds, Songplay, TimeEntry, User};
use thiserror::Error;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage operation '{operation}' failed: {source}")]
    Sqlite {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },
}

impl StorageError {
    pub fn sqlite(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| StorageError::Sqlite { operation, source }
    }
}

/// Write and lookup capabilities the ETL core needs from the warehouse.
///
/// A single implementation is shared by every extractor call of a run and is
/// never used from more than one thread.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait Storage {
    // =========================================================================
    // Dimension upserts (overwrite every non-key field on conflict)
    // =========================================================================

    fn upsert_song(&self, song: &Song) -> Result<(), StorageError>;

    fn upsert_artist(&self, artist: &Artist) -> Result<(), StorageError>;

    /// Last write wins, so a user's most recently loaded level is kept.
    fn upsert_user(&self, user: &User) -> Result<(), StorageError>;

    // =========================================================================
    // Append-only inserts
    // =========================================================================

    fn insert_time(&self, entry: &TimeEntry) -> Result<(), StorageError>;

    fn insert_songplay(&self, songplay: &Songplay) -> Result<(), StorageError>;

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Returns every (song_id, artist_id) pair whose song title, artist name
    /// and song duration equal the given values exactly. An empty result is
    /// not an error.
    fn lookup_song_artist(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Vec<SongArtistIds>, StorageError>;

    // =========================================================================
    // Per-file transaction boundary
    // =========================================================================

    fn begin(&self) -> Result<(), StorageError>;

    fn commit(&self) -> Result<(), StorageError>;

    fn rollback(&self) -> Result<(), StorageError>;
}
