// SPDX-License-Identifier: MIT OR Apache-2.0

//! Indexer module - handles subtitle conversion, transcript scanning and the full-text index

pub mod convert;
pub mod index;
pub mod scanner;

pub use index::{IndexBuilder, TranscriptIndex};

use anyhow::Result;
use colored::Colorize;

use crate::cli::SourceArgs;
use crate::query::source;
use subgrep::config::Config;

/// Run the index command: refresh the text form tree and its full-text index
pub fn run(source_args: &SourceArgs, force: bool) -> Result<()> {
    let config = Config::load();
    let resolved = source::resolve(source_args, &config)?;
    let text_root = source::prepare(&resolved)?;

    let (_, stats) = IndexBuilder::new(&text_root, config.stemmer_language())?.build(force)?;
    println!(
        "{} {} added, {} updated, {} removed, {} unchanged{}",
        "Indexed:".green().bold(),
        stats.added,
        stats.updated,
        stats.deleted,
        stats.unchanged,
        if stats.rebuilt { " (rebuilt)" } else { "" }
    );
    Ok(())
}
