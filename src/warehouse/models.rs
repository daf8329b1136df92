//! Typed rows of the star schema.

use chrono::{DateTime, Datelike, Timelike, Utc};
use std::fmt;
use std::str::FromStr;

/// Format used for every timestamp persisted in the warehouse (UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

#[derive(Clone, Debug, PartialEq)]
pub struct Song {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    /// 0 when the release year is unknown.
    pub year: i32,
    /// Seconds.
    pub duration: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Artist {
    pub artist_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Subscription tier of a user at the time of an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Free,
    Paid,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Free => "free",
            Level::Paid => "paid",
        }
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Level::Free),
            "paid" => Ok(Level::Paid),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub level: Level,
}

/// Calendar breakdown of a songplay's start time.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeEntry {
    pub start_time: DateTime<Utc>,
    pub hour: u32,
    pub day: u32,
    /// ISO 8601 week number.
    pub week: u32,
    pub month: u32,
    pub year: i32,
    /// English weekday name, e.g. "Monday".
    pub weekday: String,
}

impl TimeEntry {
    pub fn from_datetime(start_time: DateTime<Utc>) -> Self {
        TimeEntry {
            start_time,
            hour: start_time.hour(),
            day: start_time.day(),
            week: start_time.iso_week().week(),
            month: start_time.month(),
            year: start_time.year(),
            weekday: weekday_name(start_time.weekday()).to_string(),
        }
    }
}

fn weekday_name(weekday: chrono::Weekday) -> &'static str {
    match weekday {
        chrono::Weekday::Mon => "Monday",
        chrono::Weekday::Tue => "Tuesday",
        chrono::Weekday::Wed => "Wednesday",
        chrono::Weekday::Thu => "Thursday",
        chrono::Weekday::Fri => "Friday",
        chrono::Weekday::Sat => "Saturday",
        chrono::Weekday::Sun => "Sunday",
    }
}

/// A resolved (song_id, artist_id) pair from the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SongArtistIds {
    pub song_id: String,
    pub artist_id: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Songplay {
    pub start_time: DateTime<Utc>,
    pub user_id: String,
    pub level: Level,
    /// `None` when no catalog song matched title, artist and duration.
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: i64,
    pub item_in_session: i64,
    pub location: String,
    pub user_agent: String,
}

/// Row counts of every warehouse table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub songs: usize,
    pub artists: usize,
    pub users: usize,
    pub time: usize,
    pub songplays: usize,
}
