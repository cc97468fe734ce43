// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration file support for subgrep
//!
//! Loads configuration from .subgreprc.toml in current directory or ~/.config/subgrep/config.toml

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::engine::DEFAULT_DEDUP_GAP_SECONDS;

/// Output format for results (mirrored from cli for library use)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigOutputFormat {
    #[default]
    Text,
    Html,
    Json,
}

/// Configuration loaded from .subgreprc.toml or ~/.config/subgrep/config.toml
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Total context lines per result
    pub context_lines: Option<usize>,
    /// Seconds within which repeated matches collapse into one
    pub dedup_gap_seconds: Option<i64>,
    /// Default output format (text, html or json)
    pub default_format: Option<String>,
    /// Stemmer language of the full-text index (e.g. "russian", "english")
    pub stemmer_language: Option<String>,
    /// Root directory for downloaded channel subtitles
    pub subtitles_cache_directory: Option<String>,
    /// Path to the yt-dlp executable
    pub yt_dlp_path: Option<String>,
}

impl Config {
    /// Load configuration from files
    ///
    /// Precedence (highest to lowest):
    /// 1. .subgreprc.toml in current directory
    /// 2. ~/.config/subgrep/config.toml
    pub fn load() -> Self {
        // Try current directory first
        if let Some(config) = Self::load_from_path(&PathBuf::from(".subgreprc.toml")) {
            return config;
        }

        // Try home directory config
        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("subgrep").join("config.toml");
            if let Some(config) = Self::load_from_path(&config_path) {
                return config;
            }
        }

        Self::default()
    }

    fn load_from_path(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Get output format from config, parsing the string to ConfigOutputFormat
    pub fn output_format(&self) -> Option<ConfigOutputFormat> {
        self.default_format.as_ref().and_then(|s| match s.to_lowercase().as_str() {
            "json" => Some(ConfigOutputFormat::Json),
            "html" => Some(ConfigOutputFormat::Html),
            "text" => Some(ConfigOutputFormat::Text),
            _ => None,
        })
    }

    /// Merge CLI options with config (CLI wins)
    pub fn merge_context_lines(&self, cli_value: Option<usize>) -> usize {
        cli_value.or(self.context_lines).unwrap_or(1)
    }

    pub fn merge_dedup_gap(&self, cli_value: Option<i64>) -> i64 {
        cli_value
            .or(self.dedup_gap_seconds)
            .unwrap_or(DEFAULT_DEDUP_GAP_SECONDS)
    }

    pub fn merge_cache_directory(&self, cli_value: Option<&str>) -> PathBuf {
        cli_value
            .or(self.subtitles_cache_directory.as_deref())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("downloaded_subtitles"))
    }

    pub fn merge_yt_dlp_path(&self, cli_value: Option<&str>) -> String {
        cli_value
            .or(self.yt_dlp_path.as_deref())
            .unwrap_or("yt-dlp")
            .to_string()
    }

    pub fn stemmer_language(&self) -> &str {
        self.stemmer_language.as_deref().unwrap_or("russian")
    }
}
