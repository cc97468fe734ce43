// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subtitle and transcript discovery using the ignore crate (same as ripgrep)

use anyhow::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use walkdir::WalkDir;

use subgrep::engine::TranscriptPair;
use subgrep::utils::INDEX_DIR;

/// Length of the `YYYYMMDD` prefix of per-video directory names.
const DATE_PREFIX_LEN: usize = 8;

/// Lists transcripts in text form under a root directory
pub struct TranscriptScanner {
    root: PathBuf,
}

impl TranscriptScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn make_builder(&self) -> WalkBuilder {
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(false)
            .git_ignore(false)
            .git_exclude(false)
            .git_global(false)
            .ignore(false);
        builder
    }

    /// Transcript files (`*.txt` but not `*.timecodes.txt`), newest video first.
    pub fn list_transcripts(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let (tx, rx) = mpsc::channel();

        let walker = self
            .make_builder()
            .filter_entry(|entry| {
                !(entry.depth() == 1
                    && entry.file_type().is_some_and(|t| t.is_dir())
                    && entry.file_name() == INDEX_DIR)
            })
            .build_parallel();

        walker.run(|| {
            let tx = tx.clone();
            Box::new(move |entry| {
                if let Ok(entry) = entry {
                    let path = entry.path();
                    if is_transcript(path) {
                        let _ = tx.send(path.to_path_buf());
                    }
                }
                ignore::WalkState::Continue
            })
        });

        drop(tx);
        let mut transcripts: Vec<PathBuf> = rx.into_iter().collect();
        sort_newest_first(&mut transcripts);
        Ok(transcripts)
    }
}

fn is_transcript(path: &Path) -> bool {
    path.is_file()
        && path.extension().is_some_and(|ext| ext == "txt")
        && !TranscriptPair::is_timecodes_file(path)
}

/// Sort by the upload date prefix of the parent directory, newest first.
///
/// Ties (and undated directories) keep a stable path order so results are
/// deterministic regardless of walk order.
pub fn sort_newest_first(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| {
        date_prefix(b)
            .cmp(&date_prefix(a))
            .then_with(|| a.cmp(b))
    });
}

fn date_prefix(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .and_then(|name| name.to_str())
        .map(|name| name.chars().take(DATE_PREFIX_LEN).collect())
        .unwrap_or_default()
}

/// All `.vtt` subtitle files below `root`, skipping the text form directory.
pub fn list_subtitles(root: &Path, skip: &Path) -> Vec<PathBuf> {
    let mut subtitles: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.path() != skip)
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "vtt"))
        .collect();
    subtitles.sort();
    subtitles
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x\n").unwrap();
    }

    #[test]
    fn lists_transcripts_newest_first_and_skips_sidecars() {
        let dir = TempDir::new().expect("tempdir");
        let root = dir.path();
        touch(&root.join("@chan/2023/20230105_old/old.txt"));
        touch(&root.join("@chan/2023/20230105_old/old.timecodes.txt"));
        touch(&root.join("@chan/2024/20240301_new/new.txt"));
        touch(&root.join("@chan/2024/20240301_new/new.timecodes.txt"));
        touch(&root.join("@chan/2024/20240301_new/new.info.json"));
        touch(&root.join("index/stray.txt"));

        let found = TranscriptScanner::new(root).list_transcripts().expect("scan");
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["new.txt", "old.txt"]);
    }

    #[test]
    fn missing_root_lists_nothing() {
        let dir = TempDir::new().expect("tempdir");
        let found = TranscriptScanner::new(dir.path().join("absent"))
            .list_transcripts()
            .expect("scan");
        assert!(found.is_empty());
    }

    #[test]
    fn subtitles_outside_text_form_dir() {
        let dir = TempDir::new().expect("tempdir");
        let root = dir.path();
        touch(&root.join("@chan/2024/20240301_a/a.ru.vtt"));
        touch(&root.join("subs_in_text_form/ignored.vtt"));
        let found = list_subtitles(root, &root.join("subs_in_text_form"));
        assert_eq!(found, vec![root.join("@chan/2024/20240301_a/a.ru.vtt")]);
    }
}
