// SPDX-License-Identifier: MIT OR Apache-2.0

//! Video metadata sidecars and per-video search results

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::engine::{ContextWindow, TimecodeRecord};

/// Format of `upload_date` in yt-dlp metadata.
pub const UPLOAD_DATE_FORMAT: &str = "%Y%m%d";

/// Fields kept from yt-dlp's `.info.json`; the rest of the file is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub upload_date: String,
}

impl VideoInfo {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read video info {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse video info {}", path.display()))
    }

    /// Copy only the fields subgrep uses; original info files are large.
    pub fn write_shallow_copy(source: &Path, target: &Path) -> Result<()> {
        let info = Self::load(source)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(&info)?;
        fs::write(target, content)
            .with_context(|| format!("failed to write video info {}", target.display()))
    }

    pub fn upload_date(&self) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(&self.upload_date, UPLOAD_DATE_FORMAT)
            .with_context(|| format!("invalid upload date '{}' of video {}", self.upload_date, self.id))
    }

    pub fn url(&self) -> String {
        format!("https://youtu.be/{}", self.id)
    }

    pub fn url_at(&self, seconds: u64) -> String {
        format!("{}?t={}", self.url(), seconds)
    }
}

/// One located timecode of a video, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimecodeHit {
    #[serde(rename = "timecode_seconds")]
    pub seconds: u64,
    pub url: String,
    pub context: Option<ContextWindow>,
}

/// All timecodes found in one video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoTimecodes {
    #[serde(rename = "video_upload_date")]
    pub upload_date: String,
    #[serde(rename = "video_title")]
    pub title: String,
    #[serde(rename = "video_id")]
    pub id: String,
    #[serde(rename = "timecode_info_list")]
    pub timecodes: Vec<TimecodeHit>,
}

impl VideoTimecodes {
    /// `None` when there is nothing to report for the video.
    pub fn from_records(video: VideoInfo, records: Vec<TimecodeRecord>) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        let timecodes = records
            .into_iter()
            .map(|record| TimecodeHit {
                seconds: record.seconds,
                url: video.url_at(record.seconds),
                context: record.context,
            })
            .collect();
        Some(Self {
            upload_date: video.upload_date,
            title: video.title,
            id: video.id,
            timecodes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn video() -> VideoInfo {
        VideoInfo {
            id: "abc123".to_string(),
            title: "Talk".to_string(),
            upload_date: "20240131".to_string(),
        }
    }

    #[test]
    fn urls_carry_timecode() {
        assert_eq!(video().url_at(75), "https://youtu.be/abc123?t=75");
    }

    #[test]
    fn upload_date_parses_compact_format() {
        let date = video().upload_date().expect("date");
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    }

    #[test]
    fn shallow_copy_keeps_only_known_fields() {
        let dir = TempDir::new().expect("tempdir");
        let source = dir.path().join("full.info.json");
        let target = dir.path().join("out/short.info.json");
        fs::write(
            &source,
            r#"{"id":"abc123","title":"Talk","upload_date":"20240131","formats":[1,2,3]}"#,
        )
        .unwrap();

        VideoInfo::write_shallow_copy(&source, &target).expect("copy");
        let copied: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(copied.as_object().unwrap().len(), 3);
        assert_eq!(VideoInfo::load(&target).unwrap(), video());
    }

    #[test]
    fn empty_records_produce_no_result() {
        assert!(VideoTimecodes::from_records(video(), vec![]).is_none());
    }

    #[test]
    fn json_shape_uses_report_field_names() {
        let records = vec![TimecodeRecord {
            seconds: 5,
            context: Some(vec!["hi".to_string()]),
        }];
        let result = VideoTimecodes::from_records(video(), records).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["video_upload_date"], "20240131");
        assert_eq!(json["timecode_info_list"][0]["timecode_seconds"], 5);
        assert_eq!(json["timecode_info_list"][0]["url"], "https://youtu.be/abc123?t=5");
    }
}
