// SPDX-License-Identifier: MIT OR Apache-2.0

//! Regex scan over a transcript read in lockstep with its timecode file

use regex::Regex;
use std::io::{BufRead, Lines};

use super::correlator::{TimecodeCorrelator, DEFAULT_DEDUP_GAP_SECONDS};
use super::timecode::TimecodeRecord;
use crate::errors::CorrelateError;

/// Knobs shared by the regex and fragment paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Total lines of context per record, matched line included.
    pub context_lines: usize,
    pub dedup_gap_seconds: i64,
    /// Also match text split across two adjacent lines.
    pub search_on_line_edges: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            context_lines: 1,
            dedup_gap_seconds: DEFAULT_DEDUP_GAP_SECONDS,
            search_on_line_edges: false,
        }
    }
}

impl ScanOptions {
    /// Edge matches are attributed one line early, so a single-line context
    /// grows by one to still show the line where the text ends.
    pub fn effective_context_lines(&self) -> usize {
        if self.search_on_line_edges && self.context_lines == 1 {
            2
        } else {
            self.context_lines
        }
    }
}

#[derive(Debug)]
struct UnmatchedLine {
    text: String,
    raw_timecode: String,
    position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Reading,
    Drained,
    Failed,
}

/// Lazy, forward-only stream of records for one transcript/timecode pair.
pub struct LineScanner<'r, T, C> {
    transcript: Lines<T>,
    timecodes: Lines<C>,
    regex: &'r Regex,
    edge_spanning: bool,
    correlator: TimecodeCorrelator,
    previous_unmatched: Option<UnmatchedLine>,
    position: usize,
    state: ScanState,
}

impl<'r, T: BufRead, C: BufRead> LineScanner<'r, T, C> {
    pub fn new(transcript: T, timecodes: C, regex: &'r Regex, options: &ScanOptions) -> Self {
        Self {
            transcript: transcript.lines(),
            timecodes: timecodes.lines(),
            regex,
            edge_spanning: options.search_on_line_edges,
            correlator: TimecodeCorrelator::new(
                options.effective_context_lines(),
                options.dedup_gap_seconds,
            ),
            previous_unmatched: None,
            position: 0,
            state: ScanState::Reading,
        }
    }

    fn step(&mut self) -> Result<(), CorrelateError> {
        let Some(line) = self.transcript.next().transpose()? else {
            self.state = ScanState::Drained;
            if self.timecodes.next().transpose()?.is_some() {
                return Err(CorrelateError::TrailingTimecodes {
                    transcript_lines: self.position,
                });
            }
            self.correlator.finish();
            return Ok(());
        };

        let position = self.position;
        self.position += 1;
        let raw_timecode = self
            .timecodes
            .next()
            .transpose()?
            .ok_or(CorrelateError::MissingTimecode { line: position + 1 })?;

        self.correlator.observe(&line);

        let mut matched = false;
        if self.regex.is_match(&line) {
            matched = true;
            self.correlator.correlate(&line, &raw_timecode, position)?;
        } else if let Some(previous) = self.previous_unmatched.as_ref() {
            let combined = format!("{} {}", previous.text, line.trim());
            if self.regex.is_match(&combined) {
                matched = true;
                // The match starts on the previous line, so it owns the record.
                self.correlator
                    .correlate(&previous.text, &previous.raw_timecode, previous.position)?;
            }
        }

        if self.edge_spanning {
            self.previous_unmatched = (!matched).then(|| UnmatchedLine {
                text: line.trim().to_string(),
                raw_timecode,
                position,
            });
        }
        Ok(())
    }
}

impl<T: BufRead, C: BufRead> Iterator for LineScanner<'_, T, C> {
    type Item = Result<TimecodeRecord, CorrelateError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.state == ScanState::Failed {
                return None;
            }
            if let Some(record) = self.correlator.pop_ready() {
                return Some(Ok(record));
            }
            if self.state == ScanState::Drained {
                return None;
            }
            if let Err(err) = self.step() {
                self.state = ScanState::Failed;
                return Some(Err(err));
            }
        }
    }
}
