// SPDX-License-Identifier: MIT OR Apache-2.0

//! Line-by-line search over transcript pairs (default and regex engines)

use anyhow::{Context, Result};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use regex::{Regex, RegexBuilder};
use std::path::Path;

use crate::indexer::scanner::TranscriptScanner;
use subgrep::engine::{ScanOptions, TranscriptPair};
use subgrep::video::{VideoInfo, VideoTimecodes};

/// Case-insensitive matcher; `literal` escapes the query first.
pub fn build_regex(query: &str, literal: bool) -> Result<Regex> {
    let pattern = if literal {
        regex::escape(query)
    } else {
        query.to_string()
    };
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .with_context(|| format!("Invalid regex pattern: {query}"))
}

fn search_pair(
    transcript: &Path,
    regex: &Regex,
    options: &ScanOptions,
) -> Result<Option<VideoTimecodes>> {
    let pair = TranscriptPair::for_transcript(transcript);
    let records = pair.scan(regex, options)?;
    if records.is_empty() {
        return Ok(None);
    }
    let video = VideoInfo::load(&pair.info_path())?;
    Ok(VideoTimecodes::from_records(video, records))
}

/// Scan every transcript under `text_root`, newest video first.
///
/// Pairs are scanned in parallel; results keep the listing order. Renderers
/// stop at the first failed pair.
pub fn search(
    text_root: &Path,
    regex: &Regex,
    options: &ScanOptions,
) -> Result<Vec<Result<VideoTimecodes>>> {
    let transcripts = TranscriptScanner::new(text_root).list_transcripts()?;
    tracing::debug!("scanning {} transcripts", transcripts.len());

    let bar = ProgressBar::new(transcripts.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.set_message("Searching");

    let results: Vec<Result<Option<VideoTimecodes>>> = transcripts
        .par_iter()
        .progress_with(bar.clone())
        .map(|transcript| search_pair(transcript, regex, options))
        .collect();
    bar.finish_and_clear();

    Ok(results.into_iter().filter_map(Result::transpose).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn add_video(root: &Path, dir: &str, id: &str, lines: &[&str]) {
        let video_dir = root.join(dir);
        fs::create_dir_all(&video_dir).unwrap();
        let transcript: String = lines.iter().map(|l| format!("{l}\n")).collect();
        let timecodes: String = (0..lines.len())
            .map(|i| format!("00:00:{:02} {}\n", i * 20, i * 20))
            .collect();
        fs::write(video_dir.join(format!("{id}.txt")), transcript).unwrap();
        fs::write(video_dir.join(format!("{id}.timecodes.txt")), timecodes).unwrap();
        fs::write(
            video_dir.join(format!("{id}.info.json")),
            format!(r#"{{"id": "{id}", "title": "T {id}", "upload_date": "{}"}}"#, &dir[..8]),
        )
        .unwrap();
    }

    #[test]
    fn default_engine_escapes_and_ignores_case() {
        let re = build_regex("a.b (c)", true).expect("regex");
        assert!(re.is_match("A.B (C)"));
        assert!(!re.is_match("axb (c)"));
    }

    #[test]
    fn invalid_regex_fails_early() {
        let err = build_regex("(unclosed", false).unwrap_err();
        assert!(err.to_string().contains("Invalid regex pattern"));
    }

    #[test]
    fn results_follow_upload_date_order() {
        let dir = TempDir::new().expect("tempdir");
        let root = dir.path();
        add_video(root, "20230101_old", "old", &["the needle is here"]);
        add_video(root, "20240101_new", "new", &["nothing", "Needle again"]);
        add_video(root, "20235555_none", "none", &["no match"]);

        let re = build_regex("needle", true).unwrap();
        let results: Vec<VideoTimecodes> = search(root, &re, &ScanOptions::default())
            .expect("search")
            .into_iter()
            .collect::<Result<_>>()
            .expect("results");

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "new");
        assert_eq!(results[0].timecodes[0].seconds, 20);
        assert_eq!(results[0].timecodes[0].url, "https://youtu.be/new?t=20");
        assert_eq!(results[1].id, "old");
    }

    #[test]
    fn misaligned_pair_surfaces_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let root = dir.path();
        add_video(root, "20240101_bad", "bad", &["needle"]);
        fs::write(root.join("20240101_bad/bad.timecodes.txt"), "00:00:00 0\n00:00:01 1\n").unwrap();

        let re = build_regex("needle", true).unwrap();
        let first = search(root, &re, &ScanOptions::default())
            .expect("search")
            .into_iter()
            .next()
            .expect("one result");
        let err = first.unwrap_err();
        assert!(format!("{err:#}").contains("bad.timecodes.txt"));
    }
}
