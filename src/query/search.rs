// SPDX-License-Identifier: MIT OR Apache-2.0

//! The search command: resolve subtitles, pick an engine, render results

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, IsTerminal};
use std::path::Path;

use crate::cli::{OutputFormat, SearchEngine, SortBy, SourceArgs};
use crate::indexer::IndexBuilder;
use crate::query::{index_search, regex_search, source};
use subgrep::config::{Config, ConfigOutputFormat};
use subgrep::engine::ScanOptions;
use subgrep::output::ResultWriter;
use subgrep::video::VideoTimecodes;

/// Run the search command
#[allow(clippy::too_many_arguments)]
pub fn run(
    query: &str,
    engine: SearchEngine,
    source_args: &SourceArgs,
    format: Option<OutputFormat>,
    context_lines: Option<usize>,
    dedup_gap: Option<i64>,
    output: Option<&Path>,
    sort_by: SortBy,
    results_limit: Option<usize>,
    search_on_line_edges: bool,
) -> Result<()> {
    if query.trim().is_empty() {
        bail!("Search query cannot be empty");
    }

    let config = Config::load();
    let format: ConfigOutputFormat = format
        .map(Into::into)
        .or_else(|| config.output_format())
        .unwrap_or_default();

    let mut options = ScanOptions {
        context_lines: config.merge_context_lines(context_lines),
        dedup_gap_seconds: config.merge_dedup_gap(dedup_gap),
        search_on_line_edges,
    };

    // validate the query before any download or conversion work
    let regex = match engine {
        SearchEngine::Default => Some(regex_search::build_regex(query, true)?),
        SearchEngine::Regex => Some(regex_search::build_regex(query, false)?),
        SearchEngine::Index => None,
    };

    let resolved = source::resolve(source_args, &config)?;
    let text_root = source::prepare(&resolved)?;

    let results: Vec<Result<VideoTimecodes>> = match regex {
        Some(regex) => regex_search::search(&text_root, &regex, &options)?,
        None => {
            // edge spanning only applies to line-by-line engines
            options.search_on_line_edges = false;
            let (index, _) =
                IndexBuilder::new(&text_root, config.stemmer_language())?.build(false)?;
            index_search::search(&index, query, sort_by, results_limit, &options)?
        }
    };

    let count = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            ResultWriter::new(BufWriter::new(file), format).write_all(query, results)?
        }
        None => {
            let stdout = io::stdout();
            let use_color = stdout.is_terminal() && format == ConfigOutputFormat::Text;
            ResultWriter::new(stdout.lock(), format)
                .with_color(use_color)
                .write_all(query, results)?
        }
    };
    tracing::info!("{} videos matched '{}'", count, query);
    Ok(())
}
