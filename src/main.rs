//! subgrep - Find when something was said in YouTube videos
//!
//! Searches channel subtitles line by line or through a tantivy full-text
//! index and maps every match to a timecoded video link.

mod cli;
mod download;
mod indexer;
mod query;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use colored::Colorize;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use subgrep::errors::{UnsupportedChannelUrlError, UsageError};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Search {
            query,
            search_engine,
            source,
            format,
            context_lines,
            dedup_gap,
            output,
            sort_by,
            results_limit,
            search_on_line_edges,
        } => {
            query::search::run(
                &query,
                search_engine,
                &source,
                format,
                context_lines,
                dedup_gap,
                output.as_deref(),
                sort_by,
                results_limit,
                search_on_line_edges,
            )?;
        }
        Commands::Index { source, force } => {
            indexer::run(&source, force)?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "subgrep", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            let is_usage = err.downcast_ref::<UsageError>().is_some()
                || err.downcast_ref::<UnsupportedChannelUrlError>().is_some();
            if is_usage {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
