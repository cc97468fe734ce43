// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of a downloaded subtitle tree into searchable text form

use anyhow::{Context, Result};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::indexer::scanner::list_subtitles;
use subgrep::engine::{info_path_for, TIMECODES_EXTENSION};
use subgrep::video::VideoInfo;
use subgrep::vtt;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    pub subtitles: usize,
    pub converted: usize,
    pub removed: usize,
}

/// Text form outputs of one subtitle file.
struct Conversion {
    converted: bool,
    /// Original files to delete once the whole tree is converted.
    originals: Option<(PathBuf, PathBuf)>,
}

/// Convert every `.vtt` below `subtitles_root` that has no text form yet.
///
/// Transcripts land in `text_root` under the same relative path, next to a
/// shallow copy of the video's `.info.json`.
pub fn convert_tree(
    subtitles_root: &Path,
    text_root: &Path,
    remove_originals: bool,
) -> Result<ConversionSummary> {
    let subtitles = list_subtitles(subtitles_root, text_root);
    if subtitles.is_empty() {
        return Ok(ConversionSummary::default());
    }

    let bar = ProgressBar::new(subtitles.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.set_message("Converting subtitles");

    let conversions = subtitles
        .par_iter()
        .progress_with(bar.clone())
        .map(|vtt_path| convert_one(subtitles_root, text_root, vtt_path, remove_originals))
        .collect::<Result<Vec<_>>>()?;
    bar.finish_and_clear();

    let mut summary = ConversionSummary {
        subtitles: subtitles.len(),
        ..ConversionSummary::default()
    };
    for conversion in conversions {
        if conversion.converted {
            summary.converted += 1;
        }
        if let Some((vtt_path, info_path)) = conversion.originals {
            remove_original(&vtt_path, &info_path)?;
            summary.removed += 1;
        }
    }
    tracing::info!(
        "converted {} of {} subtitle files ({} originals removed)",
        summary.converted,
        summary.subtitles,
        summary.removed
    );
    Ok(summary)
}

fn convert_one(
    subtitles_root: &Path,
    text_root: &Path,
    vtt_path: &Path,
    remove_originals: bool,
) -> Result<Conversion> {
    let relative = vtt_path
        .strip_prefix(subtitles_root)
        .with_context(|| format!("{} is outside {}", vtt_path.display(), subtitles_root.display()))?;
    let transcript_path = text_root.join(relative).with_extension("txt");
    let timecodes_path = transcript_path.with_extension(TIMECODES_EXTENSION);
    if let Some(parent) = transcript_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let converted = !transcript_path.exists() || !timecodes_path.exists();
    if converted {
        tracing::debug!("converting {}", vtt_path.display());
        vtt::convert_file(vtt_path, &transcript_path, &timecodes_path)?;
    }

    let source_info = info_path_for(vtt_path);
    let target_info = info_path_for(&transcript_path);
    let mut originals = None;
    if !target_info.exists() {
        VideoInfo::write_shallow_copy(&source_info, &target_info)?;
        if remove_originals {
            originals = Some((vtt_path.to_path_buf(), source_info));
        }
    }
    Ok(Conversion {
        converted,
        originals,
    })
}

fn remove_original(vtt_path: &Path, info_path: &Path) -> Result<()> {
    fs::remove_file(vtt_path).with_context(|| format!("Failed to remove {}", vtt_path.display()))?;
    // several subtitle languages share one info file
    if info_path.exists() {
        fs::remove_file(info_path)
            .with_context(|| format!("Failed to remove {}", info_path.display()))?;
    }
    if let Some(parent) = vtt_path.parent() {
        let is_empty = fs::read_dir(parent)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if is_empty {
            fs::remove_dir(parent)
                .with_context(|| format!("Failed to remove {}", parent.display()))?;
        }
    }
    Ok(())
}
