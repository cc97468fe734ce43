// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transcript and timecode file pairs on disk

use regex::Regex;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::fragments::{Fragment, FragmentWalker};
use super::line_scanner::{LineScanner, ScanOptions};
use super::timecode::TimecodeRecord;
use crate::errors::{CorrelateError, PairError};

/// Extension of the companion timecode file (`video.txt` → `video.timecodes.txt`).
pub const TIMECODES_EXTENSION: &str = "timecodes.txt";
/// Extension of the video metadata sidecar (`video.txt` → `video.info.json`).
pub const INFO_EXTENSION: &str = "info.json";

/// Sidecar of a subtitle-derived file: drop its own extension, then the
/// language suffix.
pub fn info_path_for(subtitles: &Path) -> PathBuf {
    subtitles.with_extension("").with_extension(INFO_EXTENSION)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptPair {
    pub transcript: PathBuf,
    pub timecodes: PathBuf,
}

impl TranscriptPair {
    pub fn for_transcript(transcript: impl AsRef<Path>) -> Self {
        let transcript = transcript.as_ref().to_path_buf();
        let timecodes = transcript.with_extension(TIMECODES_EXTENSION);
        Self {
            transcript,
            timecodes,
        }
    }

    /// True for `*.timecodes.txt` files, which are never transcripts.
    pub fn is_timecodes_file(path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(".timecodes.txt"))
    }

    /// Metadata sidecar shared by every subtitle language of the video
    /// (`talk.ru.txt` → `talk.info.json`).
    pub fn info_path(&self) -> PathBuf {
        info_path_for(&self.transcript)
    }

    fn error(&self, source: impl Into<CorrelateError>) -> PairError {
        PairError {
            transcript: self.transcript.clone(),
            timecodes: self.timecodes.clone(),
            source: source.into(),
        }
    }

    /// Open the timecode file, refusing a missing or empty one for a non-empty transcript.
    fn open_timecodes(&self, transcript_len: u64) -> Result<BufReader<File>, PairError> {
        let file = File::open(&self.timecodes).map_err(|e| self.error(e))?;
        let timecodes_len = file.metadata().map_err(|e| self.error(e))?.len();
        if timecodes_len == 0 && transcript_len > 0 {
            return Err(self.error(CorrelateError::EmptyTimecodes));
        }
        Ok(BufReader::new(file))
    }

    /// Run the regex path over this pair.
    pub fn scan(&self, regex: &Regex, options: &ScanOptions) -> Result<Vec<TimecodeRecord>, PairError> {
        let transcript = File::open(&self.transcript).map_err(|e| self.error(e))?;
        let transcript_len = transcript.metadata().map_err(|e| self.error(e))?.len();
        let timecodes = self.open_timecodes(transcript_len)?;

        LineScanner::new(BufReader::new(transcript), timecodes, regex, options)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.error(e))
    }

    /// Run the fragment path over `content`, the full text of this transcript.
    pub fn walk_fragments(
        &self,
        content: &str,
        fragments: &[Fragment],
        options: &ScanOptions,
    ) -> Result<Vec<TimecodeRecord>, PairError> {
        let timecodes = self.open_timecodes(content.len() as u64)?;
        FragmentWalker::new(content, fragments, timecodes, options)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.error(e))
    }
}
