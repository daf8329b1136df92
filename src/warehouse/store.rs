//! SQLite-backed warehouse store.
//!
//! Holds the single connection of an ETL run. All writes go through the
//! [`Storage`] trait; callers wrap each source file in `begin`/`commit`.

use super::models::*;
use super::schema::WAREHOUSE_VERSIONED_SCHEMAS;
use super::trait_def::{Storage, StorageError};
use crate::sqlite_persistence::{VersionedSchema, BASE_DB_VERSION};
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::info;

pub struct SqliteWarehouseStore {
    conn: Connection,
}

fn latest_schema() -> &'static VersionedSchema {
    &WAREHOUSE_VERSIONED_SCHEMAS[WAREHOUSE_VERSIONED_SCHEMAS.len() - 1]
}

fn create_or_validate_schema(conn: &Connection) -> Result<()> {
    let schema = latest_schema();

    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |r| r.get(0),
    )?;

    if table_count == 0 {
        info!("Creating warehouse db schema at version {}", schema.version);
        return schema.create(conn);
    }

    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    let expected_version = (BASE_DB_VERSION + schema.version) as i64;
    if db_version != expected_version {
        bail!(
            "Warehouse db is at version {}, expected {}",
            db_version,
            expected_version
        );
    }
    schema
        .validate(conn)
        .context("Existing warehouse db does not match the expected schema")
}

impl SqliteWarehouseStore {
    /// Open (or create) the warehouse database at `db_path`.
    ///
    /// A brand new database gets the latest schema; an existing one must
    /// already match it.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref()).with_context(|| {
            format!(
                "Failed to open warehouse database at {:?}",
                db_path.as_ref()
            )
        })?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        create_or_validate_schema(&conn)?;
        Ok(SqliteWarehouseStore { conn })
    }

    /// Drop every warehouse table and create the schema from scratch.
    pub fn reset_schema(&self) -> Result<()> {
        let schema = latest_schema();
        self.conn.execute("BEGIN IMMEDIATE", [])?;

        let result = schema
            .drop_all(&self.conn)
            .and_then(|_| schema.create(&self.conn));

        match result {
            Ok(()) => {
                self.conn.execute("COMMIT", [])?;
                info!("Warehouse schema reset to version {}", schema.version);
                Ok(())
            }
            Err(e) => {
                let _ = self.conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }

    pub fn table_counts(&self) -> Result<TableCounts> {
        let count = |table: &str| -> Result<usize> {
            let n: i64 =
                self.conn
                    .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
            Ok(n as usize)
        };
        Ok(TableCounts {
            songs: count("songs")?,
            artists: count("artists")?,
            users: count("users")?,
            time: count("time")?,
            songplays: count("songplays")?,
        })
    }

    /// Direct access to the connection, for read-side queries.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Storage for SqliteWarehouseStore {
    fn upsert_song(&self, song: &Song) -> Result<(), StorageError> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "INSERT INTO songs (song_id, title, artist_id, year, duration)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(song_id) DO UPDATE SET
                    title = excluded.title,
                    artist_id = excluded.artist_id,
                    year = excluded.year,
                    duration = excluded.duration",
            )
            .map_err(StorageError::sqlite("upsert song"))?;
        stmt.execute(params![
            song.song_id,
            song.title,
            song.artist_id,
            song.year,
            song.duration
        ])
        .map_err(StorageError::sqlite("upsert song"))?;
        Ok(())
    }

    fn upsert_artist(&self, artist: &Artist) -> Result<(), StorageError> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "INSERT INTO artists (artist_id, name, location, latitude, longitude)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(artist_id) DO UPDATE SET
                    name = excluded.name,
                    location = excluded.location,
                    latitude = excluded.latitude,
                    longitude = excluded.longitude",
            )
            .map_err(StorageError::sqlite("upsert artist"))?;
        stmt.execute(params![
            artist.artist_id,
            artist.name,
            artist.location,
            artist.latitude,
            artist.longitude
        ])
        .map_err(StorageError::sqlite("upsert artist"))?;
        Ok(())
    }

    fn upsert_user(&self, user: &User) -> Result<(), StorageError> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "INSERT INTO users (user_id, first_name, last_name, gender, level)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(user_id) DO UPDATE SET
                    first_name = excluded.first_name,
                    last_name = excluded.last_name,
                    gender = excluded.gender,
                    level = excluded.level",
            )
            .map_err(StorageError::sqlite("upsert user"))?;
        stmt.execute(params![
            user.user_id,
            user.first_name,
            user.last_name,
            user.gender,
            user.level.as_str()
        ])
        .map_err(StorageError::sqlite("upsert user"))?;
        Ok(())
    }

    fn insert_time(&self, entry: &TimeEntry) -> Result<(), StorageError> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "INSERT INTO time (start_time, hour, day, week, month, year, weekday)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .map_err(StorageError::sqlite("insert time"))?;
        stmt.execute(params![
            format_timestamp(&entry.start_time),
            entry.hour,
            entry.day,
            entry.week,
            entry.month,
            entry.year,
            entry.weekday
        ])
        .map_err(StorageError::sqlite("insert time"))?;
        Ok(())
    }

    fn insert_songplay(&self, songplay: &Songplay) -> Result<(), StorageError> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "INSERT INTO songplays (start_time, user_id, level, song_id, artist_id,
                                        session_id, item_in_session, location, user_agent)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )
            .map_err(StorageError::sqlite("insert songplay"))?;
        stmt.execute(params![
            format_timestamp(&songplay.start_time),
            songplay.user_id,
            songplay.level.as_str(),
            songplay.song_id,
            songplay.artist_id,
            songplay.session_id,
            songplay.item_in_session,
            songplay.location,
            songplay.user_agent
        ])
        .map_err(StorageError::sqlite("insert songplay"))?;
        Ok(())
    }

    fn lookup_song_artist(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Vec<SongArtistIds>, StorageError> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT s.song_id, a.artist_id
                 FROM songs s
                 INNER JOIN artists a ON s.artist_id = a.artist_id
                 WHERE s.title = ?1 AND a.name = ?2 AND s.duration = ?3",
            )
            .map_err(StorageError::sqlite("lookup song and artist"))?;
        let ids = stmt
            .query_map(params![title, artist_name, duration], |row| {
                Ok(SongArtistIds {
                    song_id: row.get(0)?,
                    artist_id: row.get(1)?,
                })
            })
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .map_err(StorageError::sqlite("lookup song and artist"))?;
        Ok(ids)
    }

    fn begin(&self) -> Result<(), StorageError> {
        self.conn
            .execute("BEGIN IMMEDIATE", [])
            .map_err(StorageError::sqlite("begin"))?;
        Ok(())
    }

    fn commit(&self) -> Result<(), StorageError> {
        self.conn
            .execute("COMMIT", [])
            .map_err(StorageError::sqlite("commit"))?;
        Ok(())
    }

    fn rollback(&self) -> Result<(), StorageError> {
        self.conn
            .execute("ROLLBACK", [])
            .map_err(StorageError::sqlite("rollback"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn test_artist(id: &str, name: &str) -> Artist {
        Artist {
            artist_id: id.to_string(),
            name: name.to_string(),
            location: Some("Detroit, MI".to_string()),
            latitude: Some(42.33),
            longitude: None,
        }
    }

    fn test_song(id: &str, title: &str, artist_id: &str, duration: f64) -> Song {
        Song {
            song_id: id.to_string(),
            title: title.to_string(),
            artist_id: artist_id.to_string(),
            year: 0,
            duration,
        }
    }

    fn test_user(id: &str, level: Level) -> User {
        User {
            user_id: id.to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            gender: "F".to_string(),
            level,
        }
    }

    fn test_songplay(user_id: &str, ids: Option<SongArtistIds>) -> Songplay {
        let (song_id, artist_id) = match ids {
            Some(ids) => (Some(ids.song_id), Some(ids.artist_id)),
            None => (None, None),
        };
        Songplay {
            start_time: DateTime::<Utc>::from_timestamp_millis(1_541_903_636_796).unwrap(),
            user_id: user_id.to_string(),
            level: Level::Free,
            song_id,
            artist_id,
            session_id: 7,
            item_in_session: 3,
            location: "Berlin".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
        }
    }

    #[test]
    fn test_new_database_has_empty_tables() {
        let store = SqliteWarehouseStore::open_in_memory().unwrap();
        assert_eq!(store.table_counts().unwrap(), TableCounts::default());
    }

    #[test]
    fn test_reopen_existing_database_validates_schema() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("warehouse.db");

        {
            let store = SqliteWarehouseStore::open(&db_path).unwrap();
            store.upsert_artist(&test_artist("AR1", "Artist")).unwrap();
        }

        let store = SqliteWarehouseStore::open(&db_path).unwrap();
        assert_eq!(store.table_counts().unwrap().artists, 1);
    }

    #[test]
    fn test_open_rejects_foreign_database() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("other.db");
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute("CREATE TABLE unrelated (id INTEGER)", []).unwrap();
        }

        let result = SqliteWarehouseStore::open(&db_path);
        assert!(result.is_err());
    }

    #[test]
    fn test_upsert_song_and_artist_is_idempotent() {
        let store = SqliteWarehouseStore::open_in_memory().unwrap();
        let artist = test_artist("AR1", "Artist");
        let song = test_song("SO1", "Title", "AR1", 200.5);

        for _ in 0..2 {
            store.upsert_artist(&artist).unwrap();
            store.upsert_song(&song).unwrap();
        }

        let counts = store.table_counts().unwrap();
        assert_eq!(counts.artists, 1);
        assert_eq!(counts.songs, 1);
    }

    #[test]
    fn test_upsert_song_overwrites_non_key_fields() {
        let store = SqliteWarehouseStore::open_in_memory().unwrap();
        store.upsert_artist(&test_artist("AR1", "Artist")).unwrap();
        store
            .upsert_song(&test_song("SO1", "Old Title", "AR1", 100.0))
            .unwrap();
        store
            .upsert_song(&test_song("SO1", "New Title", "AR1", 150.0))
            .unwrap();

        let (title, duration): (String, f64) = store
            .connection()
            .query_row(
                "SELECT title, duration FROM songs WHERE song_id = 'SO1'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(title, "New Title");
        assert_eq!(duration, 150.0);
    }

    #[test]
    fn test_upsert_user_last_write_wins_on_level() {
        let store = SqliteWarehouseStore::open_in_memory().unwrap();
        store.upsert_user(&test_user("10", Level::Free)).unwrap();
        store.upsert_user(&test_user("10", Level::Paid)).unwrap();

        let level: String = store
            .connection()
            .query_row("SELECT level FROM users WHERE user_id = '10'", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(level, "paid");
        assert_eq!(store.table_counts().unwrap().users, 1);
    }

    #[test]
    fn test_artist_nullable_fields_round_trip_as_null() {
        let store = SqliteWarehouseStore::open_in_memory().unwrap();
        store.upsert_artist(&test_artist("AR1", "Artist")).unwrap();

        let longitude: Option<f64> = store
            .connection()
            .query_row(
                "SELECT longitude FROM artists WHERE artist_id = 'AR1'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(longitude, None);
    }

    #[test]
    fn test_lookup_requires_exact_duration() {
        let store = SqliteWarehouseStore::open_in_memory().unwrap();
        store
            .upsert_artist(&test_artist("AR1", "Test Artist"))
            .unwrap();
        store
            .upsert_song(&test_song("SO1", "Test Song", "AR1", 123.45))
            .unwrap();

        let hit = store
            .lookup_song_artist("Test Song", "Test Artist", 123.45)
            .unwrap();
        assert_eq!(
            hit,
            vec![SongArtistIds {
                song_id: "SO1".to_string(),
                artist_id: "AR1".to_string(),
            }]
        );

        let miss = store
            .lookup_song_artist("Test Song", "Test Artist", 123.46)
            .unwrap();
        assert!(miss.is_empty());

        let wrong_artist = store
            .lookup_song_artist("Test Song", "Other Artist", 123.45)
            .unwrap();
        assert!(wrong_artist.is_empty());
    }

    #[test]
    fn test_insert_time_and_songplay_are_append_only() {
        let store = SqliteWarehouseStore::open_in_memory().unwrap();
        store.upsert_user(&test_user("10", Level::Free)).unwrap();
        let ts = DateTime::<Utc>::from_timestamp_millis(1_541_903_636_796).unwrap();
        let entry = TimeEntry::from_datetime(ts);

        for _ in 0..2 {
            store.insert_time(&entry).unwrap();
            store.insert_songplay(&test_songplay("10", None)).unwrap();
        }

        let counts = store.table_counts().unwrap();
        assert_eq!(counts.time, 2);
        assert_eq!(counts.songplays, 2);

        let (start_time, weekday): (String, String) = store
            .connection()
            .query_row("SELECT start_time, weekday FROM time LIMIT 1", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(start_time, "2018-11-11 02:33:56.796");
        assert_eq!(weekday, "Sunday");
    }

    #[test]
    fn test_songplay_with_unknown_user_is_rejected() {
        let store = SqliteWarehouseStore::open_in_memory().unwrap();

        let result = store.insert_songplay(&test_songplay("missing-user", None));
        assert!(matches!(
            result,
            Err(StorageError::Sqlite {
                operation: "insert songplay",
                ..
            })
        ));
    }

    #[test]
    fn test_rollback_discards_uncommitted_writes() {
        let store = SqliteWarehouseStore::open_in_memory().unwrap();

        store.begin().unwrap();
        store.upsert_artist(&test_artist("AR1", "Artist")).unwrap();
        store.rollback().unwrap();
        assert_eq!(store.table_counts().unwrap().artists, 0);

        store.begin().unwrap();
        store.upsert_artist(&test_artist("AR1", "Artist")).unwrap();
        store.commit().unwrap();
        assert_eq!(store.table_counts().unwrap().artists, 1);
    }

    #[test]
    fn test_reset_schema_empties_tables() {
        let store = SqliteWarehouseStore::open_in_memory().unwrap();
        store.upsert_artist(&test_artist("AR1", "Artist")).unwrap();
        store.upsert_user(&test_user("10", Level::Paid)).unwrap();

        store.reset_schema().unwrap();

        assert_eq!(store.table_counts().unwrap(), TableCounts::default());
        latest_schema().validate(store.connection()).unwrap();
    }
}
