//! User activity log documents.
//!
//! A log file is newline-delimited JSON, one event per line. Only `NextSong`
//! events describe actual plays; everything else (logins, page views, ...)
//! is skipped without validation.

use super::error::{EtlError, ParseError};
use crate::warehouse::{Level, Songplay, Storage, TimeEntry, User};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

pub const NEXT_SONG_PAGE: &str = "NextSong";

/// `userId` shows up both as a string and as a number depending on the producer.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawUserId {
    Text(String),
    Number(i64),
}

impl RawUserId {
    fn into_string(self) -> String {
        match self {
            RawUserId::Text(s) => s,
            RawUserId::Number(n) => n.to_string(),
        }
    }
}

/// Fields of a `NextSong` event. Other pages are never converted to this.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLogEvent {
    ts: Option<i64>,
    user_id: Option<RawUserId>,
    first_name: Option<String>,
    last_name: Option<String>,
    gender: Option<String>,
    level: Option<String>,
    song: Option<String>,
    artist: Option<String>,
    length: Option<f64>,
    item_in_session: Option<i64>,
    session_id: Option<i64>,
    location: Option<String>,
    user_agent: Option<String>,
}

/// A validated playback event.
#[derive(Clone, Debug, PartialEq)]
pub struct NextSongEvent {
    pub start_time: DateTime<Utc>,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub level: Level,
    pub song: String,
    pub artist: String,
    pub length: f64,
    pub item_in_session: i64,
    pub session_id: i64,
    pub location: String,
    pub user_agent: String,
}

impl NextSongEvent {
    pub fn time_entry(&self) -> TimeEntry {
        TimeEntry::from_datetime(self.start_time)
    }

    pub fn user(&self) -> User {
        User {
            user_id: self.user_id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            gender: self.gender.clone(),
            level: self.level,
        }
    }

    pub fn songplay(&self, song_id: Option<String>, artist_id: Option<String>) -> Songplay {
        Songplay {
            start_time: self.start_time,
            user_id: self.user_id.clone(),
            level: self.level,
            song_id,
            artist_id,
            session_id: self.session_id,
            item_in_session: self.item_in_session,
            location: self.location.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

/// Converts one raw event, yielding `None` for anything but a play.
struct EventValidator<'a> {
    path: &'a Path,
    line: usize,
}

impl EventValidator<'_> {
    fn missing(&self, field: &'static str) -> ParseError {
        ParseError::MissingField {
            path: self.path.to_path_buf(),
            line: self.line,
            field,
        }
    }

    fn required<T>(&self, value: Option<T>, field: &'static str) -> Result<T, ParseError> {
        value.ok_or_else(|| self.missing(field))
    }

    fn invalid(&self, field: &'static str, value: impl ToString) -> ParseError {
        ParseError::InvalidField {
            path: self.path.to_path_buf(),
            line: self.line,
            field,
            value: value.to_string(),
        }
    }

    fn json_error(&self, source: serde_json::Error) -> ParseError {
        ParseError::Json {
            path: self.path.to_path_buf(),
            line: self.line,
            source,
        }
    }

    /// Plays are recognized by `page` alone; any other event, including one
    /// without a `page`, is skipped whatever its remaining fields hold.
    fn validate(&self, value: Value) -> Result<Option<NextSongEvent>, ParseError> {
        if value.get("page").and_then(Value::as_str) != Some(NEXT_SONG_PAGE) {
            return Ok(None);
        }
        let raw: RawLogEvent = serde_json::from_value(value).map_err(|e| self.json_error(e))?;

        let ts = self.required(raw.ts, "ts")?;
        let start_time =
            DateTime::<Utc>::from_timestamp_millis(ts).ok_or_else(|| self.invalid("ts", ts))?;

        let user_id = self.required(raw.user_id, "userId")?.into_string();
        if user_id.trim().is_empty() {
            return Err(self.missing("userId"));
        }

        let level_str = self.required(raw.level, "level")?;
        let level = level_str
            .parse::<Level>()
            .map_err(|value| self.invalid("level", value))?;

        Ok(Some(NextSongEvent {
            start_time,
            user_id,
            first_name: self.required(raw.first_name, "firstName")?,
            last_name: self.required(raw.last_name, "lastName")?,
            gender: self.required(raw.gender, "gender")?,
            level,
            song: self.required(raw.song, "song")?,
            artist: self.required(raw.artist, "artist")?,
            length: self.required(raw.length, "length")?,
            item_in_session: self.required(raw.item_in_session, "itemInSession")?,
            session_id: self.required(raw.session_id, "sessionId")?,
            location: self.required(raw.location, "location")?,
            user_agent: self.required(raw.user_agent, "userAgent")?,
        }))
    }
}

/// Events of one log document.
#[derive(Debug)]
pub struct ParsedLog {
    /// Number of events in the file, plays or not.
    pub events: usize,
    /// Plays, in file order.
    pub next_songs: Vec<NextSongEvent>,
}

/// Parse a whole log document. Blank lines are ignored.
pub fn parse_log_document(path: &Path, content: &str) -> Result<ParsedLog, ParseError> {
    let mut parsed = ParsedLog {
        events: 0,
        next_songs: Vec::new(),
    };

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let validator = EventValidator {
            path,
            line: index + 1,
        };
        let value: Value = serde_json::from_str(line).map_err(|e| validator.json_error(e))?;
        parsed.events += 1;
        if let Some(event) = validator.validate(value)? {
            parsed.next_songs.push(event);
        }
    }
    Ok(parsed)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LogFileStats {
    pub events: usize,
    pub next_song_events: usize,
    /// Songplays whose song and artist were found in the catalog.
    pub matched_songplays: usize,
}

/// Load one log document into the warehouse.
///
/// The whole file is parsed before anything is written. Each play then
/// produces, in file order, a time row, a user upsert and a songplay whose
/// song/artist ids stay null when the catalog has no exact match.
pub fn extract_log_file<S: Storage + ?Sized>(
    storage: &S,
    path: &Path,
) -> Result<LogFileStats, EtlError> {
    let content = std::fs::read_to_string(path).map_err(|source| ParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed = parse_log_document(path, &content)?;

    let mut stats = LogFileStats {
        events: parsed.events,
        next_song_events: parsed.next_songs.len(),
        matched_songplays: 0,
    };

    for event in &parsed.next_songs {
        storage.insert_time(&event.time_entry())?;
        storage.upsert_user(&event.user())?;

        let songplay = match storage
            .lookup_song_artist(&event.song, &event.artist, event.length)?
            .into_iter()
            .next()
        {
            Some(ids) => {
                stats.matched_songplays += 1;
                event.songplay(Some(ids.song_id), Some(ids.artist_id))
            }
            None => event.songplay(None, None),
        };
        storage.insert_songplay(&songplay)?;
    }

    debug!(
        "{:?}: {} events, {} plays, {} matched in catalog",
        path, stats.events, stats.next_song_events, stats.matched_songplays
    );
    Ok(stats)
}
