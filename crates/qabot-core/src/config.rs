use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{QabotError, Result};
use crate::types::ChatId;

const MAX_SWEEP_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Top-level configuration for the bot.
///
/// Loaded from `~/.qabot/config.toml` by default. Every section falls back to
/// its defaults when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QabotConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub pending: PendingConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

impl QabotConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: QabotConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| QabotError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the SQLite database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.qabot/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Group and access settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Usernames allowed to close, open, or delete anything.
    pub admins: Vec<String>,
    /// Group chat that receives notifications addressed to everyone.
    pub all_members_chat_id: i64,
    /// Maximum number of articles returned per inline query page.
    pub inline_page_size: u32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            admins: Vec::new(),
            all_members_chat_id: 0,
            inline_page_size: 20,
        }
    }
}

impl BotConfig {
    pub fn all_members_chat(&self) -> ChatId {
        ChatId(self.all_members_chat_id)
    }
}

/// Pending action store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PendingConfig {
    /// Maximum age of a draft before the sweep may evict it.
    pub retention_secs: u64,
    /// Period between eviction sweeps.
    pub sweep_interval_secs: u64,
    /// Requests that may queue for the owner task before callers wait for room.
    pub mailbox_capacity: usize,
    /// Remove a draft on its first successful lookup.
    pub single_use: bool,
}

impl Default for PendingConfig {
    fn default() -> Self {
        Self {
            retention_secs: 600,
            sweep_interval_secs: 60,
            mailbox_capacity: 1024,
            single_use: true,
        }
    }
}

impl PendingConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    /// Sweep period, between one second and one day.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.clamp(1, MAX_SWEEP_INTERVAL_SECS))
    }
}

/// Delays before bot-related messages are deleted. `0` keeps the message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    pub errors_delete_after_secs: u64,
    pub commands_delete_after_secs: u64,
    pub inline_answers_delete_after_secs: u64,
    pub notifications_delete_after_secs: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            errors_delete_after_secs: 15,
            commands_delete_after_secs: 120,
            inline_answers_delete_after_secs: 300,
            notifications_delete_after_secs: 0,
        }
    }
}

impl CleanupConfig {
    pub fn errors(&self) -> Option<Duration> {
        delay(self.errors_delete_after_secs)
    }

    pub fn commands(&self) -> Option<Duration> {
        delay(self.commands_delete_after_secs)
    }

    pub fn inline_answers(&self) -> Option<Duration> {
        delay(self.inline_answers_delete_after_secs)
    }

    pub fn notifications(&self) -> Option<Duration> {
        delay(self.notifications_delete_after_secs)
    }
}

fn delay(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = QabotConfig::default();
        assert_eq!(config.general.data_dir, "~/.qabot/data");
        assert_eq!(config.general.log_level, "info");
        assert!(config.bot.admins.is_empty());
        assert_eq!(config.bot.inline_page_size, 20);
        assert_eq!(config.pending.retention_secs, 600);
        assert_eq!(config.pending.sweep_interval_secs, 60);
        assert!(config.pending.single_use);
        assert_eq!(config.cleanup.notifications_delete_after_secs, 0);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
data_dir = "/srv/qabot"
log_level = "debug"

[bot]
admins = ["moderator", "curator"]
all_members_chat_id = -1001234
inline_page_size = 10

[pending]
retention_secs = 120
sweep_interval_secs = 5
mailbox_capacity = 64
single_use = false

[cleanup]
errors_delete_after_secs = 5
commands_delete_after_secs = 30
inline_answers_delete_after_secs = 60
notifications_delete_after_secs = 3600
"#;
        let file = create_temp_config(content);
        let config = QabotConfig::load(file.path()).unwrap();
        assert_eq!(config.general.data_dir, "/srv/qabot");
        assert_eq!(config.bot.admins, vec!["moderator", "curator"]);
        assert_eq!(config.bot.all_members_chat(), ChatId(-1001234));
        assert_eq!(config.pending.retention(), Duration::from_secs(120));
        assert_eq!(config.pending.sweep_interval(), Duration::from_secs(5));
        assert_eq!(config.pending.mailbox_capacity, 64);
        assert!(!config.pending.single_use);
        assert_eq!(config.cleanup.errors(), Some(Duration::from_secs(5)));
        assert_eq!(
            config.cleanup.notifications(),
            Some(Duration::from_secs(3600))
        );
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[bot]
admins = ["moderator"]
"#;
        let file = create_temp_config(content);
        let config = QabotConfig::load(file.path()).unwrap();
        assert_eq!(config.bot.admins, vec!["moderator"]);
        assert_eq!(config.bot.inline_page_size, 20);
        assert_eq!(config.pending.retention_secs, 600);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = QabotConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.general.data_dir, "~/.qabot/data");
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        let result = QabotConfig::load(file.path());
        assert!(matches!(result, Err(QabotError::Config(_))));
    }

    #[test]
    fn test_save_creates_parent_dirs_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        let mut config = QabotConfig::default();
        config.bot.admins = vec!["moderator".to_string()];
        config.save(&path).unwrap();

        let reloaded = QabotConfig::load(&path).unwrap();
        assert_eq!(reloaded.bot.admins, vec!["moderator"]);
        assert_eq!(reloaded.pending.retention_secs, 600);
    }

    #[test]
    fn test_zero_delay_means_keep() {
        let cleanup = CleanupConfig {
            errors_delete_after_secs: 0,
            ..CleanupConfig::default()
        };
        assert_eq!(cleanup.errors(), None);
        assert_eq!(cleanup.commands(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_sweep_interval_floor() {
        let pending = PendingConfig {
            sweep_interval_secs: 0,
            ..PendingConfig::default()
        };
        assert_eq!(pending.sweep_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_sweep_interval_ceiling() {
        let pending = PendingConfig {
            sweep_interval_secs: u64::MAX,
            ..PendingConfig::default()
        };
        assert_eq!(pending.sweep_interval(), Duration::from_secs(86_400));
    }
}
