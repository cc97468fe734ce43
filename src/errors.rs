// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types with helpful suggestions
//!
//! Engine errors are typed so callers can tell a corrupted cache apart from
//! plain I/O trouble; user-facing errors carry actionable suggestions.

use std::fmt;
use std::path::PathBuf;

/// Failure while correlating a transcript with its timecode file.
///
/// Line positions are 1-based.
#[derive(Debug, thiserror::Error)]
pub enum CorrelateError {
    #[error("transcript line {line} has no matching timecode line")]
    MissingTimecode { line: usize },

    #[error("timecode file has more lines than the transcript ({transcript_lines} lines)")]
    TrailingTimecodes { transcript_lines: usize },

    #[error("malformed timecode at line {line}: {content:?} (expected 'HH:MM:SS <seconds>')")]
    MalformedTimecode { line: usize, content: String },

    #[error("timecode file is empty while the transcript is not")]
    EmptyTimecodes,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A [`CorrelateError`] bound to the transcript/timecode pair it came from.
#[derive(Debug, thiserror::Error)]
#[error("{source}\n  transcript: {}\n  timecodes:  {}", transcript.display(), timecodes.display())]
pub struct PairError {
    pub transcript: PathBuf,
    pub timecodes: PathBuf,
    #[source]
    pub source: CorrelateError,
}

impl PairError {
    /// True when the cached text form is corrupted rather than unreadable.
    pub fn is_misalignment(&self) -> bool {
        !matches!(self.source, CorrelateError::Io(_))
    }
}

/// Failure while reading a WebVTT subtitle file.
#[derive(Debug, thiserror::Error)]
pub enum VttError {
    #[error("missing WEBVTT header")]
    MissingHeader,

    #[error("invalid cue timing at line {line}: {content:?}")]
    InvalidTiming { line: usize, content: String },
}

/// Error indicating a stemmer language the full-text index cannot use
#[derive(Debug)]
pub struct UnsupportedLanguageError {
    pub language: String,
    pub supported: Vec<String>,
}

impl fmt::Display for UnsupportedLanguageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let supported_list = self.supported.join(", ");
        write!(
            f,
            "Unsupported stemmer language: '{}'\n\n\
             Supported languages: {}\n\n\
             Set it in .subgreprc.toml, e.g. stemmer_language = \"english\"",
            self.language, supported_list
        )
    }
}

impl std::error::Error for UnsupportedLanguageError {}

/// Error indicating invalid combination of command line options
///
/// The binary maps this to exit status 2.
#[derive(Debug)]
pub struct UsageError {
    pub message: String,
    pub suggestion: Option<String>,
}

impl UsageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n\nSuggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for UsageError {}

/// Error indicating a channel URL subgrep cannot derive a channel id from
#[derive(Debug)]
pub struct UnsupportedChannelUrlError {
    pub url: String,
}

impl fmt::Display for UnsupportedChannelUrlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "YouTube channel URL is not supported: '{}'\n\n\
             The channel name in the URL path should start with '@'.\n\
             Example: subgrep search \"query\" --youtube-channel-url https://www.youtube.com/@channel",
            self.url
        )
    }
}

impl std::error::Error for UnsupportedChannelUrlError {}

/// Helper functions for creating helpful error messages
pub mod suggestions {
    /// Get suggestion when no subtitle source was given
    pub fn no_source_suggestion() -> String {
        "Pass one of:\n  \
         --searching-directory <DIR>         search pre-downloaded subtitles\n  \
         --youtube-channel-url <URL>         search the cached subtitles of a channel\n  \
         --download-subtitles --youtube-channel-url <URL>   refresh the cache first"
            .to_string()
    }

    /// Get suggestion when the cache location conflicts with a searching directory
    pub fn cache_directory_suggestion() -> String {
        "Use --subtitles-cache-directory to change where channel subtitles are stored.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_error_names_both_files() {
        let err = PairError {
            transcript: PathBuf::from("a/video.txt"),
            timecodes: PathBuf::from("a/video.timecodes.txt"),
            source: CorrelateError::MissingTimecode { line: 3 },
        };
        let text = err.to_string();
        assert!(text.contains("line 3"));
        assert!(text.contains("video.txt"));
        assert!(text.contains("video.timecodes.txt"));
        assert!(err.is_misalignment());
    }

    #[test]
    fn usage_error_renders_suggestion() {
        let err = UsageError::new("bad options").with_suggestion("try again");
        assert_eq!(err.to_string(), "bad options\n\nSuggestion: try again");
    }
}
