mod file_config;

pub use file_config::FileConfig;

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

pub const DEFAULT_DATABASE_PATH: &str = "sparkify.db";
pub const DEFAULT_SONG_DATA: &str = "data/song_data";
pub const DEFAULT_LOG_DATA: &str = "data/log_data";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub database_path: Option<PathBuf>,
    pub song_data: Option<PathBuf>,
    pub log_data: Option<PathBuf>,
    pub reset_schema: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub song_data: PathBuf,
    pub log_data: PathBuf,
    pub reset_schema: bool,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let database_path = file
            .database_path
            .map(PathBuf::from)
            .or_else(|| cli.database_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));
        let song_data = file
            .song_data
            .map(PathBuf::from)
            .or_else(|| cli.song_data.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SONG_DATA));
        let log_data = file
            .log_data
            .map(PathBuf::from)
            .or_else(|| cli.log_data.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DATA));
        let reset_schema = file.reset_schema.unwrap_or(cli.reset_schema);

        validate_data_dir("song_data", &song_data)?;
        validate_data_dir("log_data", &log_data)?;

        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                bail!(
                    "Database directory does not exist: {:?}",
                    parent.to_path_buf()
                );
            }
        }

        Ok(Self {
            database_path,
            song_data,
            log_data,
            reset_schema,
        })
    }
}

fn validate_data_dir(name: &str, path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("{} directory does not exist: {:?}", name, path);
    }
    if !path.is_dir() {
        bail!("{} is not a directory: {:?}", name, path);
    }
    Ok(())
}
