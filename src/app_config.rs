use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};

use crate::database::slot::{DEFAULT_SLOT_KEY, FileSlot};
use crate::paper::DEFAULT_PREFERRED_EXTRA_COPIES;
use crate::quick_add::{DEFAULT_GROUP, QuickAddDefaults};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Where the store is kept
    #[serde(default)]
    pub store: StoreConfig,

    /// Paper generation settings
    #[serde(default)]
    pub paper: PaperConfig,

    /// Playlist listing settings
    #[serde(default)]
    pub playlists: PlaylistConfig,

    /// Quick-add fallbacks
    #[serde(default)]
    pub quick_add: QuickAddConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Store location settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoreConfig {
    /// Directory holding the durable slot; the user data directory when unset
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Key of the slot that holds the serialized store
    #[serde(default = "default_slot_key")]
    pub slot_key: String,

    /// File name used when exporting the store
    #[serde(default = "default_export_filename")]
    pub export_filename: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            slot_key: default_slot_key(),
            export_filename: default_export_filename(),
        }
    }
}

impl StoreConfig {
    /// Directory holding the durable slot
    pub fn resolved_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => FileSlot::default_dir(),
        }
    }
}

/// Mock test paper settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PaperConfig {
    /// Number of questions drawn when no count is given
    #[serde(default = "default_paper_count")]
    pub default_count: usize,

    /// Extra pool references for each question with a preferred mark value
    #[serde(default = "default_preferred_extra_copies")]
    pub preferred_extra_copies: usize,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            default_count: default_paper_count(),
            preferred_extra_copies: default_preferred_extra_copies(),
        }
    }
}

/// Playlist listing settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaylistConfig {
    /// Playlists shown in the recent (featured) list
    #[serde(default = "default_featured_playlists")]
    pub featured: usize,
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            featured: default_featured_playlists(),
        }
    }
}

/// Quick-add fallback values
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QuickAddConfig {
    /// Marks used when a line gives none
    #[serde(default = "default_marks")]
    pub default_marks: i64,

    /// Subject and chapter used when a line gives none
    #[serde(default = "default_group")]
    pub default_group: String,
}

impl Default for QuickAddConfig {
    fn default() -> Self {
        Self {
            default_marks: default_marks(),
            default_group: default_group(),
        }
    }
}

impl QuickAddConfig {
    /// Parser defaults built from this config
    pub fn defaults(&self) -> QuickAddDefaults {
        QuickAddDefaults {
            marks: self.default_marks,
            group: self.default_group.clone(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_slot_key() -> String {
    DEFAULT_SLOT_KEY.to_string()
}

fn default_export_filename() -> String {
    "studyme-db.sqlite".to_string()
}

fn default_paper_count() -> usize {
    10
}

fn default_preferred_extra_copies() -> usize {
    DEFAULT_PREFERRED_EXTRA_COPIES
}

fn default_featured_playlists() -> usize {
    8
}

fn default_marks() -> i64 {
    3
}

fn default_group() -> String {
    DEFAULT_GROUP.to_string()
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load configuration, writing a default file first when none exists
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        warn!(
            "Config file not found at '{}', creating default config.",
            path.display()
        );

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(path, config_json).with_context(|| {
            format!("Failed to write default config to file: {}", path.display())
        })?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let key = &self.store.slot_key;
        if key.trim().is_empty() {
            return Err(anyhow!("Slot key must not be empty"));
        }
        if key.contains('/') || key.contains('\\') || key == "." || key == ".." {
            return Err(anyhow!("Slot key must be a plain name: {}", key));
        }

        if self.store.export_filename.trim().is_empty() {
            return Err(anyhow!("Export filename must not be empty"));
        }

        if self.playlists.featured == 0 {
            return Err(anyhow!("Featured playlist count must be at least 1"));
        }

        if self.quick_add.default_marks <= 0 {
            return Err(anyhow!(
                "Default marks must be positive, got {}",
                self.quick_add.default_marks
            ));
        }

        if self.quick_add.default_group.trim().is_empty() {
            return Err(anyhow!("Default subject/chapter name must not be empty"));
        }

        Ok(())
    }
}
