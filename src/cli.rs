// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI argument parsing using clap

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use subgrep::config::ConfigOutputFormat;

/// subgrep - Find when something was said in YouTube videos
///
/// Searches channel subtitles with a plain string, a regular expression or a
/// full-text index and prints links to the matching moments.
#[derive(Parser, Debug)]
#[command(name = "subgrep")]
#[command(
    author,
    version,
    about,
    long_about = None,
    override_usage = "subgrep [OPTIONS] <COMMAND>",
    after_help = "Search quickstart:\n  subgrep s \"token\" --searching-directory subs/\n  subgrep s -e regex \"hello\\s+world\" --youtube-channel-url https://www.youtube.com/@channel\n  subgrep s -e index \"stemmed words\" --searching-directory subs/ --format html -o out.html"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Html,
    Json,
}

impl From<OutputFormat> for ConfigOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => ConfigOutputFormat::Text,
            OutputFormat::Html => ConfigOutputFormat::Html,
            OutputFormat::Json => ConfigOutputFormat::Json,
        }
    }
}

/// How the query is matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SearchEngine {
    /// Case-insensitive plain string comparison, line by line
    #[default]
    Default,
    /// Case-insensitive regular expression, line by line
    Regex,
    /// Full-text index with stemming and query syntax (AND, OR, "phrases")
    Index,
}

/// Ordering of videos in index search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortBy {
    /// Newest videos first
    #[default]
    UploadDate,
    /// Best matching videos first
    Relevance,
}

/// Where subtitles come from
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Directory with pre-downloaded subtitles (.vtt plus .info.json)
    #[arg(short = 'd', long, help_heading = "Source")]
    pub searching_directory: Option<PathBuf>,

    /// YouTube channel URL, e.g. https://www.youtube.com/@channel
    #[arg(short = 'c', long, help_heading = "Source")]
    pub youtube_channel_url: Option<String>,

    /// Download missing subtitles of the channel before searching
    #[arg(long, requires = "youtube_channel_url", help_heading = "Source")]
    pub download_subtitles: bool,

    /// Root directory of the channel subtitles cache (default: downloaded_subtitles)
    #[arg(long, help_heading = "Source")]
    pub subtitles_cache_directory: Option<PathBuf>,

    /// Subtitles language code (ISO 639)
    #[arg(long, default_value = "ru", help_heading = "Download")]
    pub subtitles_language: String,

    /// Delete downloaded .vtt and .info.json files once converted to text form
    #[arg(long, requires = "download_subtitles", help_heading = "Download")]
    pub delete_original_files: bool,

    /// Name downloaded files by video id instead of title (short paths)
    #[arg(long, help_heading = "Download")]
    pub minimize_path_length: bool,

    /// Path to yt-dlp (default: yt-dlp from PATH)
    #[arg(long, help_heading = "Download")]
    pub yt_dlp_path: Option<String>,

    /// Skip downloading for this many hours after the last successful download
    #[arg(long, default_value = "0", help_heading = "Download")]
    pub subtitles_downloading_cooldown_hours: u32,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search subtitles and print timecoded links
    #[command(
        visible_aliases = ["s", "find"],
        after_help = "Examples:\n  subgrep s \"exact phrase\" -d subs/\n  subgrep s -e regex \"colou?r\" -d subs/ -C 3\n  subgrep s -e regex \"split phrase\" -d subs/ --search-on-line-edges"
    )]
    Search {
        /// Search query
        query: String,

        /// Search engine used to match the query
        #[arg(short = 'e', long, value_enum, default_value_t, help_heading = "Core")]
        search_engine: SearchEngine,

        #[command(flatten)]
        source: SourceArgs,

        /// Output format (default: text)
        #[arg(short = 'f', long, value_enum, help_heading = "Output")]
        format: Option<OutputFormat>,

        /// Total number of lines around and including each matching line (default: 1)
        #[arg(short = 'C', long, help_heading = "Output")]
        context_lines: Option<usize>,

        /// Matches within this many seconds of the previous result are dropped (default: 10, negative disables)
        #[arg(long, allow_hyphen_values = true, help_heading = "Output")]
        dedup_gap: Option<i64>,

        /// Write results to a file instead of stdout
        #[arg(short = 'o', long, help_heading = "Output")]
        output: Option<PathBuf>,

        /// Ordering of videos (index engine)
        #[arg(long, value_enum, default_value_t, help_heading = "Index")]
        sort_by: SortBy,

        /// Maximum number of matches taken from each video (index engine)
        #[arg(long, help_heading = "Index")]
        results_limit: Option<usize>,

        /// Also find text split between two adjacent lines (default and regex engines)
        #[arg(long, help_heading = "Regex")]
        search_on_line_edges: bool,
    },

    /// Convert subtitles to text form and build or refresh the full-text index
    #[command(visible_aliases = ["i"])]
    Index {
        #[command(flatten)]
        source: SourceArgs,

        /// Rebuild the index from scratch
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn search_alias_and_short_flags_parse() {
        let cli = Cli::try_parse_from([
            "subgrep", "s", "hello world", "-e", "regex", "-d", "subs", "-C", "3", "-f", "json",
        ])
        .expect("parse search alias");

        match cli.command {
            Commands::Search {
                query,
                search_engine,
                source,
                context_lines,
                format,
                ..
            } => {
                assert_eq!(query, "hello world");
                assert_eq!(search_engine, SearchEngine::Regex);
                assert_eq!(source.searching_directory, Some(PathBuf::from("subs")));
                assert_eq!(context_lines, Some(3));
                assert_eq!(format, Some(OutputFormat::Json));
            }
            other => panic!("expected search command, got {other:?}"),
        }
    }

    #[test]
    fn search_defaults() {
        let cli = Cli::try_parse_from(["subgrep", "search", "needle"]).expect("parse");
        match cli.command {
            Commands::Search {
                search_engine,
                sort_by,
                search_on_line_edges,
                source,
                ..
            } => {
                assert_eq!(search_engine, SearchEngine::Default);
                assert_eq!(sort_by, SortBy::UploadDate);
                assert!(!search_on_line_edges);
                assert_eq!(source.subtitles_language, "ru");
                assert_eq!(source.subtitles_downloading_cooldown_hours, 0);
            }
            other => panic!("expected search command, got {other:?}"),
        }
    }

    #[test]
    fn negative_dedup_gap_parses() {
        let cli = Cli::try_parse_from(["subgrep", "s", "x", "--dedup-gap", "-1"]).expect("parse");
        match cli.command {
            Commands::Search { dedup_gap, .. } => assert_eq!(dedup_gap, Some(-1)),
            other => panic!("expected search command, got {other:?}"),
        }
    }

    #[test]
    fn download_requires_channel_url() {
        let err = Cli::try_parse_from(["subgrep", "s", "x", "--download-subtitles"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn index_command_parses_force() {
        let cli = Cli::try_parse_from(["subgrep", "i", "-d", "subs", "--force"]).expect("parse");
        match cli.command {
            Commands::Index { source, force } => {
                assert!(force);
                assert_eq!(source.searching_directory, Some(PathBuf::from("subs")));
            }
            other => panic!("expected index command, got {other:?}"),
        }
    }
}
