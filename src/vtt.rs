// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebVTT subtitles to plain text plus a line-aligned timecode index
//!
//! Every transcript line gets the start time of the cue it came from, so
//! `video.txt` and `video.timecodes.txt` always have the same line count.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

use crate::engine::TimecodeLine;
use crate::errors::VttError;

static TIMING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+):)?(\d{1,2}):(\d{2})[.,]\d{3}\s+-->\s+")
        .expect("cue timing regex is valid")
});

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag regex is valid"));

/// A subtitle cue: start time in whole seconds and its cleaned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub start_seconds: u64,
    pub text: String,
}

/// Plain text form of a subtitle file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TextForm {
    pub transcript: String,
    pub timecodes: String,
}

pub fn parse_vtt(content: &str) -> Result<Vec<Cue>, VttError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.lines().enumerate().peekable();

    match lines.next() {
        Some((_, header)) if header.starts_with("WEBVTT") => {}
        _ => return Err(VttError::MissingHeader),
    }

    let mut cues = Vec::new();
    while lines.peek().is_some() {
        let block: Vec<(usize, &str)> = lines
            .by_ref()
            .skip_while(|(_, line)| line.trim().is_empty())
            .take_while(|(_, line)| !line.trim().is_empty())
            .collect();
        let Some(timing_at) = block.iter().position(|(_, line)| line.contains("-->")) else {
            continue;
        };
        if block[0].1.starts_with("NOTE") || block[0].1.starts_with("STYLE") {
            continue;
        }

        let (number, timing) = block[timing_at];
        let start_seconds = parse_cue_start(timing).ok_or_else(|| VttError::InvalidTiming {
            line: number + 1,
            content: timing.to_string(),
        })?;
        let raw_text: Vec<&str> = block[timing_at + 1..].iter().map(|(_, line)| *line).collect();
        cues.push(Cue {
            start_seconds,
            text: clean_cue_text(&raw_text.join("\n")),
        });
    }
    Ok(cues)
}

fn parse_cue_start(timing: &str) -> Option<u64> {
    let caps = TIMING_RE.captures(timing.trim())?;
    let field = |i: usize| -> Option<u64> {
        caps.get(i).map_or(Some(0), |m| m.as_str().parse().ok())
    };
    Some(field(1)? * 3600 + field(2)? * 60 + field(3)?)
}

fn clean_cue_text(raw: &str) -> String {
    TAG_RE
        .replace_all(raw, "")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Flatten cues to lines, dropping lines that repeat the previous one.
///
/// Auto-generated captions repeat each line in the next cue while it scrolls.
pub fn to_text_form(cues: &[Cue]) -> TextForm {
    let mut form = TextForm::default();
    let mut previous: Option<&str> = None;

    for cue in cues {
        for line in cue.text.trim().lines() {
            if previous == Some(line) {
                continue;
            }
            form.transcript.push_str(line);
            form.transcript.push('\n');
            form.timecodes.push_str(&TimecodeLine::format(cue.start_seconds));
            form.timecodes.push('\n');
            previous = Some(line);
        }
    }
    form
}

/// Convert one `.vtt` file into its transcript and timecode files.
pub fn convert_file(vtt_path: &Path, transcript_path: &Path, timecodes_path: &Path) -> Result<()> {
    let content = fs::read_to_string(vtt_path)
        .with_context(|| format!("failed to read subtitles {}", vtt_path.display()))?;
    let cues = parse_vtt(&content)
        .with_context(|| format!("failed to parse subtitles {}", vtt_path.display()))?;
    let form = to_text_form(&cues);

    fs::write(transcript_path, form.transcript)
        .with_context(|| format!("failed to write {}", transcript_path.display()))?;
    fs::write(timecodes_path, form.timecodes)
        .with_context(|| format!("failed to write {}", timecodes_path.display()))?;
    Ok(())
}
