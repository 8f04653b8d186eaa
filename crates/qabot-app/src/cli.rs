//! CLI argument definitions for the qabot binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::{Path, PathBuf};

/// qabot: question and answer bot for group chats.
///
/// Reads one JSON update per line on stdin and writes one JSON call per line
/// on stdout.
#[derive(Parser, Debug)]
#[command(name = "qabot", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Path to the SQLite database.
    #[arg(long = "db")]
    pub db: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > QABOT_CONFIG env var > ~/.qabot/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("QABOT_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the database path: --db flag, else `qabot.db` in the data dir.
    pub fn resolve_db_path(&self, data_dir: &str) -> PathBuf {
        match self.db {
            Some(ref p) => p.clone(),
            None => expand_home(data_dir).join("qabot.db"),
        }
    }

    /// Resolve the log level: --log-level flag, else the config value.
    pub fn resolve_log_level<'a>(&'a self, config_level: &'a str) -> &'a str {
        self.log_level.as_deref().unwrap_or(config_level)
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => home_dir().join(rest),
        None if path == "~" => home_dir(),
        None => PathBuf::from(path),
    }
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| Path::new(".").to_path_buf())
}

fn default_config_path() -> PathBuf {
    home_dir().join(".qabot").join("config.toml")
}
