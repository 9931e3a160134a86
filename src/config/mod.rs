//! # Configuration Management Module
//!
//! Loads and validates the announcerd configuration: the static announcement
//! catalog, scheduling settings, and logging options. The file is TOML,
//! read once at startup.
//!
//! ## File Format
//!
//! ```toml
//! version = "1.0"
//!
//! [settings]
//! interval_seconds = 60
//! prefix = "[AA] "
//! use_prefix = true
//! sound = "note.bell"
//! enable_sound = true
//! random = false
//!
//! [storage]
//! data_dir = "./data"
//!
//! [logging]
//! level = "info"
//!
//! [[announcements]]
//! lines = ["Welcome to the server!", "Type /help to get started."]
//!
//! [[announcements]]
//! lines = ["Back up your builds."]
//! sound = "note.pling"
//! ```
//!
//! ## Version Migration
//!
//! The file carries a `version` string. When it does not match the current
//! [`CONFIG_VERSION`], or is missing entirely, the old file is renamed to
//! `<path>.old` and replaced
//! with the default template, which is then re-read. Static announcements
//! from the old file survive in the backup for manual merging.

use anyhow::{anyhow, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::fs;

/// Schema version written into new config files.
pub const CONFIG_VERSION: &str = "1.0";

/// A read-only announcement from the config file. Never mutated at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticAnnouncement {
    pub lines: Vec<String>,
    /// Per-entry sound override; falls back to `settings.sound` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Seconds between announcement ticks. Clamped to at least 1 on load.
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    /// Prefix prepended to the first line of each announcement.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_true")]
    pub use_prefix: bool,
    /// Global default sound cue; entries may override or disable it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    #[serde(default = "default_true")]
    pub enable_sound: bool,
    /// Pick announcements uniformly at random instead of rotating in order.
    #[serde(default)]
    pub random: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Absent in hand-written files from before versioning; the empty
    /// default never matches [`CONFIG_VERSION`], so such files migrate.
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub announcements: Vec<StaticAnnouncement>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_interval() -> u64 {
    60
}

fn default_prefix() -> String {
    "[AA] ".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
            prefix: default_prefix(),
            use_prefix: true,
            sound: None,
            enable_sound: true,
            random: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            version: CONFIG_VERSION.to_string(),
            announcements: vec![StaticAnnouncement {
                lines: vec![
                    "Welcome to the server!".to_string(),
                    "Edit config.toml to change these announcements.".to_string(),
                ],
                sound: None,
            }],
            settings: Settings::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file, migrating it when the schema version
    /// does not match.
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        if config.version != CONFIG_VERSION {
            if config.version.is_empty() {
                info!("Config file carries no version; updating to {}", CONFIG_VERSION);
            } else {
                info!(
                    "Updating configuration from version {} to {}",
                    config.version, CONFIG_VERSION
                );
            }
            return Self::migrate(path).await;
        }

        Ok(config.clamped())
    }

    /// Load a config file, writing the default template first when the file
    /// does not exist yet.
    pub async fn load_or_init(path: &str) -> Result<Self> {
        match fs::metadata(path).await {
            Ok(_) => Self::load(path).await,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No config at {}; writing default template", path);
                Self::create_default(path).await?;
                Self::load(path).await
            }
            Err(e) => Err(anyhow!("Failed to stat config file {}: {}", path, e)),
        }
    }

    /// Create a default configuration file.
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Back up the existing file to `<path>.old`, write the current default
    /// template, and re-read it.
    async fn migrate(path: &str) -> Result<Self> {
        let backup = format!("{}.old", path);
        fs::rename(path, &backup)
            .await
            .map_err(|e| anyhow!("Failed to back up old config to {}: {}", backup, e))?;
        info!("Old configuration preserved at {}", backup);
        Self::create_default(path).await?;

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to re-read migrated config {}: {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse migrated config {}: {}", path, e))?;
        Ok(config.clamped())
    }

    fn clamped(mut self) -> Self {
        if self.settings.interval_seconds == 0 {
            warn!("interval_seconds of 0 is not schedulable; clamping to 1");
            self.settings.interval_seconds = 1;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn default_template_round_trips() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.toml");
        let path = path.to_str().unwrap();

        Config::create_default(path).await.expect("create");
        let config = Config::load(path).await.expect("load");
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.settings.interval_seconds, 60);
        assert!(config.settings.use_prefix);
        assert!(!config.announcements.is_empty());
    }

    #[tokio::test]
    async fn version_mismatch_backs_up_and_rewrites() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.toml");
        let path_str = path.to_str().unwrap();

        tokio::fs::write(
            &path,
            "version = \"0.1\"\n\n[[announcements]]\nlines = [\"old\"]\n",
        )
        .await
        .unwrap();

        let config = Config::load(path_str).await.expect("migrated load");
        assert_eq!(config.version, CONFIG_VERSION);

        let backup = format!("{}.old", path_str);
        let old = tokio::fs::read_to_string(&backup).await.expect("backup");
        assert!(old.contains("\"old\""));
    }

    #[tokio::test]
    async fn missing_version_field_triggers_migration() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.toml");
        let path_str = path.to_str().unwrap();

        tokio::fs::write(&path, "[[announcements]]\nlines = [\"unversioned\"]\n")
            .await
            .unwrap();

        let config = Config::load(path_str).await.expect("migrated load");
        assert_eq!(config.version, CONFIG_VERSION);

        let backup = format!("{}.old", path_str);
        let old = tokio::fs::read_to_string(&backup).await.expect("backup");
        assert!(old.contains("unversioned"));
    }

    #[tokio::test]
    async fn zero_interval_is_clamped() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.toml");
        tokio::fs::write(
            &path,
            format!(
                "version = \"{}\"\n\n[settings]\ninterval_seconds = 0\n",
                CONFIG_VERSION
            ),
        )
        .await
        .unwrap();

        let config = Config::load(path.to_str().unwrap()).await.expect("load");
        assert_eq!(config.settings.interval_seconds, 1);
    }

    #[tokio::test]
    async fn load_or_init_creates_missing_file() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.toml");
        let config = Config::load_or_init(path.to_str().unwrap())
            .await
            .expect("init");
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(path.exists());
    }
}
