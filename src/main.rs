use anyhow::{Context, Result};
use clap::Parser;
use sparkify_etl::config::{AppConfig, CliConfig, FileConfig};
use sparkify_etl::run_etl;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(name = "sparkify-etl")]
#[command(about = "Load song metadata and activity logs into the Sparkify warehouse")]
struct CliArgs {
    /// Path to a TOML config file. Its values override the CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite warehouse database file.
    #[clap(long, value_parser = parse_path)]
    pub database_path: Option<PathBuf>,

    /// Root directory of the song metadata documents.
    #[clap(long, value_parser = parse_path)]
    pub song_data: Option<PathBuf>,

    /// Root directory of the activity log documents.
    #[clap(long, value_parser = parse_path)]
    pub log_data: Option<PathBuf>,

    /// Drop and recreate every warehouse table before loading.
    #[clap(long, default_value_t = false)]
    pub reset_schema: bool,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            database_path: self.database_path.clone(),
            song_data: self.song_data.clone(),
            log_data: self.log_data.clone(),
            reset_schema: self.reset_schema,
        }
    }
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}...", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    let summary = run_etl(&config)?;
    info!(
        "Done: {} song files and {} log files loaded.",
        summary.songs.files_processed, summary.logs.files_processed
    );
    Ok(())
}
