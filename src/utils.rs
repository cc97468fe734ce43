// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared paths and small file helpers

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory (under a subtitles root) holding transcripts in text form.
pub const TEXT_FORM_DIR: &str = "subs_in_text_form";
/// Directory (under the text form root) holding the full-text index.
pub const INDEX_DIR: &str = "index";

const COOLDOWN_FILE: &str = "last_successful_download_timestamp";
const COOLDOWN_TIMESTAMP_FORMAT: &str = "%Y%m%d %H:%M:%S UTC";

pub fn text_form_root(subtitles_root: &Path) -> PathBuf {
    subtitles_root.join(TEXT_FORM_DIR)
}

pub fn index_dir(text_root: &Path) -> PathBuf {
    text_root.join(INDEX_DIR)
}

/// File content, or `None` if the file does not exist or cannot be read.
pub fn read_text_file_content(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok()
}

/// Write `content`, creating parent directories as needed.
pub fn save_text_file_content(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

/// Remembers the last successful download to avoid hammering YouTube.
#[derive(Debug, Clone)]
pub struct DownloadCooldown {
    timestamp_path: PathBuf,
}

impl DownloadCooldown {
    pub fn new(channel_root: &Path) -> Self {
        Self {
            timestamp_path: channel_root.join(COOLDOWN_FILE),
        }
    }

    pub fn is_active(&self, cooldown: TimeDelta) -> bool {
        self.is_active_at(cooldown, Utc::now())
    }

    fn is_active_at(&self, cooldown: TimeDelta, now: DateTime<Utc>) -> bool {
        match self.last_success() {
            Some(last) => now < last + cooldown,
            None => false,
        }
    }

    pub fn record_success(&self) -> Result<()> {
        self.record_success_at(Utc::now())
    }

    fn record_success_at(&self, at: DateTime<Utc>) -> Result<()> {
        let stamp = at.format(COOLDOWN_TIMESTAMP_FORMAT).to_string();
        save_text_file_content(&self.timestamp_path, &stamp)
    }

    fn last_success(&self) -> Option<DateTime<Utc>> {
        let raw = read_text_file_content(&self.timestamp_path)?;
        NaiveDateTime::parse_from_str(raw.trim(), COOLDOWN_TIMESTAMP_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(|e| {
                tracing::warn!(
                    "ignoring unreadable cooldown timestamp {}: {}",
                    self.timestamp_path.display(),
                    e
                )
            })
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn cooldown_is_inactive_without_previous_download() {
        let dir = TempDir::new().expect("tempdir");
        let cooldown = DownloadCooldown::new(dir.path());
        assert!(!cooldown.is_active(TimeDelta::hours(24)));
    }

    #[test]
    fn cooldown_expires_after_interval() {
        let dir = TempDir::new().expect("tempdir");
        let cooldown = DownloadCooldown::new(dir.path());
        let then = Utc::now() - TimeDelta::hours(2);
        cooldown.record_success_at(then).expect("record");

        assert!(cooldown.is_active_at(TimeDelta::hours(3), Utc::now()));
        assert!(!cooldown.is_active_at(TimeDelta::hours(1), Utc::now()));
        assert!(!cooldown.is_active_at(TimeDelta::zero(), Utc::now()));
    }

    #[test]
    fn timestamp_file_uses_readable_format() {
        let dir = TempDir::new().expect("tempdir");
        let cooldown = DownloadCooldown::new(dir.path());
        let at = NaiveDateTime::parse_from_str("20240305 07:08:09 UTC", COOLDOWN_TIMESTAMP_FORMAT)
            .unwrap()
            .and_utc();
        cooldown.record_success_at(at).unwrap();
        let saved = fs::read_to_string(dir.path().join(COOLDOWN_FILE)).unwrap();
        assert_eq!(saved, "20240305 07:08:09 UTC");
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("a/b/c.txt");
        save_text_file_content(&path, "x").unwrap();
        assert_eq!(read_text_file_content(&path).as_deref(), Some("x"));
    }
}
