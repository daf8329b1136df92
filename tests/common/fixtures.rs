//! Test fixture creation for data trees

use anyhow::Result;
use sparkify_etl::config::{AppConfig, CliConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temp dir holding `song_data/`, `log_data/` and the warehouse file.
pub struct TestWorkspace {
    pub dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Result<Self> {
        let dir = TempDir::new()?;
        fs::create_dir_all(dir.path().join("song_data"))?;
        fs::create_dir_all(dir.path().join("log_data"))?;
        Ok(TestWorkspace { dir })
    }

    pub fn song_root(&self) -> PathBuf {
        self.dir.path().join("song_data")
    }

    pub fn log_root(&self) -> PathBuf {
        self.dir.path().join("log_data")
    }

    pub fn database_path(&self) -> PathBuf {
        self.dir.path().join("sparkify.db")
    }

    /// Write `content` under `root`, creating intermediate directories.
    pub fn write(&self, root: &Path, relative: &str, content: &str) -> Result<PathBuf> {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(path)
    }

    pub fn write_song(&self, relative: &str, content: &str) -> Result<PathBuf> {
        self.write(&self.song_root(), relative, content)
    }

    pub fn write_log(&self, relative: &str, lines: &[String]) -> Result<PathBuf> {
        self.write(&self.log_root(), relative, &lines.join("\n"))
    }

    pub fn config(&self) -> Result<AppConfig> {
        let cli = CliConfig {
            database_path: Some(self.database_path()),
            song_data: Some(self.song_root()),
            log_data: Some(self.log_root()),
            reset_schema: false,
        };
        AppConfig::resolve(&cli, None)
    }
}

pub fn song_document(
    song_id: &str,
    title: &str,
    artist_id: &str,
    artist_name: &str,
    duration: f64,
) -> String {
    serde_json::json!({
        "num_songs": 1,
        "artist_id": artist_id,
        "artist_latitude": 35.14968,
        "artist_longitude": -90.04892,
        "artist_location": "Memphis, TN",
        "artist_name": artist_name,
        "song_id": song_id,
        "title": title,
        "duration": duration,
        "year": 1997
    })
    .to_string()
}

pub fn log_line(
    user_id: &str,
    level: &str,
    song: &str,
    artist: &str,
    length: f64,
    ts: i64,
) -> String {
    serde_json::json!({
        "artist": artist,
        "auth": "Logged In",
        "firstName": "Lily",
        "gender": "F",
        "itemInSession": 1,
        "lastName": "Koch",
        "length": length,
        "level": level,
        "location": "Chicago-Naperville-Elgin, IL-IN-WI",
        "method": "PUT",
        "page": "NextSong",
        "sessionId": 818,
        "song": song,
        "status": 200,
        "ts": ts,
        "userAgent": "Mozilla/5.0",
        "userId": user_id
    })
    .to_string()
}

pub fn non_play_line(page: &str, ts: i64) -> String {
    serde_json::json!({
        "artist": null,
        "auth": "Logged Out",
        "firstName": null,
        "gender": null,
        "itemInSession": 0,
        "lastName": null,
        "length": null,
        "level": "free",
        "location": null,
        "method": "GET",
        "page": page,
        "sessionId": 52,
        "song": null,
        "status": 200,
        "ts": ts,
        "userAgent": null,
        "userId": ""
    })
    .to_string()
}
