//! SQLite schema definitions for the Sparkify star schema.
//!
//! Dimension tables (`artists`, `songs`, `users`, `time`) surround the
//! `songplays` fact table. Text primary keys come straight from the source
//! documents; `songplays` uses an integer rowid since plays have no natural key.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};

const ARTIST_FK: ForeignKey = ForeignKey {
    foreign_table: "artists",
    foreign_column: "artist_id",
    on_delete: ForeignKeyOnChange::NoAction,
};

/// Artists table - one row per catalog artist
const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("artist_id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("location", &SqlType::Text),
        sqlite_column!("latitude", &SqlType::Real),
        sqlite_column!("longitude", &SqlType::Real),
    ],
    indices: &[("idx_artists_name", "name")],
};

/// Songs table - one row per catalog song
const SONGS_TABLE: Table = Table {
    name: "songs",
    columns: &[
        sqlite_column!("song_id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!(
            "artist_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ARTIST_FK)
        ),
        sqlite_column!("year", &SqlType::Integer, non_null = true), // 0 = unknown
        sqlite_column!("duration", &SqlType::Real, non_null = true), // seconds
    ],
    indices: &[("idx_songs_title", "title")],
};

/// Users table - latest known profile and level per user
const USERS_TABLE: Table = Table {
    name: "users",
    columns: &[
        sqlite_column!("user_id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("first_name", &SqlType::Text, non_null = true),
        sqlite_column!("last_name", &SqlType::Text, non_null = true),
        sqlite_column!("gender", &SqlType::Text, non_null = true),
        sqlite_column!("level", &SqlType::Text, non_null = true), // 'free', 'paid'
    ],
    indices: &[],
};

/// Time table - calendar breakdown of each songplay start time.
/// Not deduplicated: overlapping log files yield repeated rows.
const TIME_TABLE: Table = Table {
    name: "time",
    columns: &[
        sqlite_column!("start_time", &SqlType::Text, non_null = true),
        sqlite_column!("hour", &SqlType::Integer, non_null = true),
        sqlite_column!("day", &SqlType::Integer, non_null = true),
        sqlite_column!("week", &SqlType::Integer, non_null = true),
        sqlite_column!("month", &SqlType::Integer, non_null = true),
        sqlite_column!("year", &SqlType::Integer, non_null = true),
        sqlite_column!("weekday", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_time_start_time", "start_time")],
};

/// Songplays fact table - append-only playback events
const SONGPLAYS_TABLE: Table = Table {
    name: "songplays",
    columns: &[
        sqlite_column!("songplay_id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("start_time", &SqlType::Text, non_null = true),
        sqlite_column!(
            "user_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "users",
                foreign_column: "user_id",
                on_delete: ForeignKeyOnChange::NoAction,
            })
        ),
        sqlite_column!("level", &SqlType::Text, non_null = true),
        sqlite_column!(
            "song_id",
            &SqlType::Text,
            foreign_key = Some(&ForeignKey {
                foreign_table: "songs",
                foreign_column: "song_id",
                on_delete: ForeignKeyOnChange::SetNull,
            })
        ),
        sqlite_column!(
            "artist_id",
            &SqlType::Text,
            foreign_key = Some(&ForeignKey {
                foreign_table: "artists",
                foreign_column: "artist_id",
                on_delete: ForeignKeyOnChange::SetNull,
            })
        ),
        sqlite_column!("session_id", &SqlType::Integer, non_null = true),
        sqlite_column!("item_in_session", &SqlType::Integer, non_null = true),
        sqlite_column!("location", &SqlType::Text, non_null = true),
        sqlite_column!("user_agent", &SqlType::Text, non_null = true),
    ],
    indices: &[
        ("idx_songplays_user", "user_id"),
        ("idx_songplays_start_time", "start_time"),
    ],
};

pub const WAREHOUSE_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        ARTISTS_TABLE,
        SONGS_TABLE,
        USERS_TABLE,
        TIME_TABLE,
        SONGPLAYS_TABLE,
    ],
}];
