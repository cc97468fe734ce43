// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timecode index lines and the records built from them

use serde::Serialize;

use super::context::ContextWindow;
use crate::errors::CorrelateError;

/// One line of a `.timecodes.txt` file: `HH:MM:SS <seconds>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimecodeLine {
    pub seconds: u64,
}

impl TimecodeLine {
    /// Parse a timecode line; `line` is the 1-based position used in errors.
    pub fn parse(raw: &str, line: usize) -> Result<Self, CorrelateError> {
        let malformed = || CorrelateError::MalformedTimecode {
            line,
            content: raw.trim_end().to_string(),
        };

        let mut parts = raw.split_whitespace();
        // the HH:MM:SS field is redundant with the seconds and not kept
        let (Some(_), Some(seconds), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(malformed());
        };
        let seconds = seconds.parse::<u64>().map_err(|_| malformed())?;

        Ok(Self { seconds })
    }

    /// Render a line in the index file format (without newline).
    pub fn format(seconds: u64) -> String {
        let (h, m, s) = split_hms(seconds);
        format!("{h:02}:{m:02}:{s:02} {seconds}")
    }
}

/// A located match: when it happened and what was said around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimecodeRecord {
    pub seconds: u64,
    /// `None` only when zero context lines were requested.
    pub context: Option<ContextWindow>,
}

/// `H:MM:SS` with unpadded hours, e.g. `0:17:16`.
pub fn pretty_timestamp(seconds: u64) -> String {
    let (h, m, s) = split_hms(seconds);
    format!("{h}:{m:02}:{s:02}")
}

fn split_hms(seconds: u64) -> (u64, u64, u64) {
    (seconds / 3600, (seconds % 3600) / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_seconds_field() {
        let tc = TimecodeLine::parse("00:17:16 1036\n", 4).expect("parse");
        assert_eq!(tc.seconds, 1036);
    }

    #[test]
    fn rejects_missing_or_extra_fields() {
        for raw in ["", "00:00:01", "00:00:01 x", "00:00:01 1 2", "00:00:01 -4"] {
            match TimecodeLine::parse(raw, 7) {
                Err(CorrelateError::MalformedTimecode { line, .. }) => assert_eq!(line, 7),
                other => panic!("expected malformed timecode for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn formats_round_trip_through_index_format() {
        let line = TimecodeLine::format(3725);
        assert_eq!(line, "01:02:05 3725");
        assert_eq!(TimecodeLine::parse(&line, 1).unwrap().seconds, 3725);
    }

    #[test]
    fn pretty_timestamp_does_not_pad_hours() {
        assert_eq!(pretty_timestamp(1036), "0:17:16");
        assert_eq!(pretty_timestamp(36_001), "10:00:01");
    }
}
