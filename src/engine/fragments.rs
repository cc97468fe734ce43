// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps highlighted fragments of a full transcript back to timecoded lines

use serde::Serialize;
use std::io::{BufRead, Lines};
use std::str::SplitInclusive;

use super::correlator::TimecodeCorrelator;
use super::line_scanner::ScanOptions;
use super::timecode::TimecodeRecord;
use crate::errors::CorrelateError;

/// Highlighted span of a transcript; offsets are bytes into its UTF-8 content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Fragment {
    pub fn new(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Lazy stream of records for the lines hit by `fragments`.
///
/// `fragments` must be sorted by `start`. Only the first fragment hitting a
/// line counts, and the walk stops once every fragment is behind and no
/// context window waits for more lines.
pub struct FragmentWalker<'a, C> {
    lines: SplitInclusive<'a, char>,
    offset: usize,
    fragments: &'a [Fragment],
    timecodes: Lines<C>,
    correlator: TimecodeCorrelator,
    position: usize,
    done: bool,
    failed: bool,
}

impl<'a, C: BufRead> FragmentWalker<'a, C> {
    pub fn new(
        content: &'a str,
        fragments: &'a [Fragment],
        timecodes: C,
        options: &ScanOptions,
    ) -> Self {
        Self {
            lines: content.split_inclusive('\n'),
            offset: 0,
            fragments,
            timecodes: timecodes.lines(),
            correlator: TimecodeCorrelator::new(options.context_lines, options.dedup_gap_seconds),
            position: 0,
            done: fragments.is_empty(),
            failed: false,
        }
    }

    fn stop(&mut self) {
        self.done = true;
        self.correlator.finish();
    }

    fn step(&mut self) -> Result<(), CorrelateError> {
        let Some(raw) = self.lines.next() else {
            self.stop();
            if self.timecodes.next().transpose()?.is_some() {
                return Err(CorrelateError::TrailingTimecodes {
                    transcript_lines: self.position,
                });
            }
            return Ok(());
        };

        let line_start = self.offset;
        let line_end = line_start + raw.len();
        self.offset = line_end;
        let position = self.position;
        self.position += 1;

        let raw_timecode = self
            .timecodes
            .next()
            .transpose()?
            .ok_or(CorrelateError::MissingTimecode { line: position + 1 })?;

        let line = raw.trim_end_matches(['\n', '\r']);
        self.correlator.observe(line);

        let fragments = self.fragments;
        let (Some(first), Some(last)) = (fragments.first(), fragments.last()) else {
            self.stop();
            return Ok(());
        };
        if line_end <= first.start {
            return Ok(());
        }
        if line_start > last.end {
            if !self.correlator.has_pending() {
                self.stop();
            }
            return Ok(());
        }

        let next = fragments.partition_point(|f| f.start < line_start);
        if fragments.get(next).is_some_and(|f| f.start < line_end) {
            self.correlator.correlate(line, &raw_timecode, position)?;
        }
        Ok(())
    }
}

impl<C: BufRead> Iterator for FragmentWalker<'_, C> {
    type Item = Result<TimecodeRecord, CorrelateError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.failed {
                return None;
            }
            if let Some(record) = self.correlator.pop_ready() {
                return Some(Ok(record));
            }
            if self.done {
                return None;
            }
            if let Err(err) = self.step() {
                self.failed = true;
                return Some(Err(err));
            }
        }
    }
}
