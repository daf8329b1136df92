//! Song metadata documents.
//!
//! Each file holds one song record (newline-delimited JSON, first record
//! wins) carrying both the song and its artist.

use super::error::{EtlError, ParseError};
use crate::warehouse::{Artist, Song, Storage};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SongDocument {
    song_id: String,
    title: String,
    artist_id: String,
    year: i32,
    duration: f64,
    artist_name: String,
    artist_location: Option<String>,
    artist_latitude: Option<f64>,
    artist_longitude: Option<f64>,
}

impl SongDocument {
    fn into_rows(self) -> (Song, Artist) {
        let song = Song {
            song_id: self.song_id,
            title: self.title,
            artist_id: self.artist_id.clone(),
            year: self.year,
            duration: self.duration,
        };
        let artist = Artist {
            artist_id: self.artist_id,
            name: self.artist_name,
            location: self.artist_location,
            latitude: self.artist_latitude,
            longitude: self.artist_longitude,
        };
        (song, artist)
    }
}

/// Parse the song and artist rows out of a song document's text.
pub fn parse_song_document(path: &Path, content: &str) -> Result<(Song, Artist), ParseError> {
    let (line_index, line) = content
        .lines()
        .enumerate()
        .find(|(_, line)| !line.trim().is_empty())
        .ok_or_else(|| ParseError::Empty {
            path: path.to_path_buf(),
        })?;

    let document: SongDocument =
        serde_json::from_str(line).map_err(|source| ParseError::Json {
            path: path.to_path_buf(),
            line: line_index + 1,
            source,
        })?;
    Ok(document.into_rows())
}

/// Load one song document into the warehouse.
///
/// The artist is written before the song so the song's foreign key resolves.
pub fn extract_song_file<S: Storage + ?Sized>(storage: &S, path: &Path) -> Result<(), EtlError> {
    let content = std::fs::read_to_string(path).map_err(|source| ParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let (song, artist) = parse_song_document(path, &content)?;

    storage.upsert_artist(&artist)?;
    storage.upsert_song(&song)?;
    debug!("Loaded song {} by {}", song.song_id, artist.artist_id);
    Ok(())
}
