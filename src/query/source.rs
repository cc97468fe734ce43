// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolution of where subtitles come from, plus download and conversion

use anyhow::Result;
use chrono::TimeDelta;
use std::path::PathBuf;

use crate::cli::SourceArgs;
use crate::download::{self, DownloadRequest};
use crate::indexer::convert::convert_tree;
use subgrep::config::Config;
use subgrep::errors::{suggestions, UsageError};
use subgrep::utils::{text_form_root, DownloadCooldown};

/// A subtitles root and what to do with it before searching.
#[derive(Debug)]
pub struct ResolvedSource {
    pub subtitles_root: PathBuf,
    pub download: Option<DownloadRequest>,
    pub cooldown_hours: u32,
    pub remove_originals: bool,
}

impl ResolvedSource {
    pub fn text_root(&self) -> PathBuf {
        text_form_root(&self.subtitles_root)
    }
}

fn searching_directory_conflict(reason: &str) -> UsageError {
    UsageError::new(format!(
        "Option --searching-directory should not be specified when {reason}."
    ))
    .with_suggestion(suggestions::cache_directory_suggestion())
}

/// Pick the subtitles root from the command line and configuration.
pub fn resolve(args: &SourceArgs, config: &Config) -> Result<ResolvedSource> {
    let cache_directory = config.merge_cache_directory(
        args.subtitles_cache_directory
            .as_deref()
            .and_then(|p| p.to_str()),
    );

    let (subtitles_root, download) = match (&args.youtube_channel_url, &args.searching_directory) {
        (Some(_), Some(_)) if args.download_subtitles => {
            return Err(searching_directory_conflict("subtitles downloading is requested").into());
        }
        (Some(_), Some(_)) => {
            return Err(searching_directory_conflict("a YouTube channel is specified").into());
        }
        (Some(url), None) => {
            let channel_id = download::channel_id(url)?;
            let channel_root = cache_directory.join(&channel_id);
            let download = args.download_subtitles.then(|| DownloadRequest {
                channel_id,
                channel_root: channel_root.clone(),
                yt_dlp_path: config.merge_yt_dlp_path(args.yt_dlp_path.as_deref()),
                language: Some(args.subtitles_language.clone()),
                minimize_path_length: args.minimize_path_length,
            });
            (channel_root, download)
        }
        (None, Some(directory)) => (directory.clone(), None),
        (None, None) => {
            return Err(UsageError::new(
                "One of the following options should be specified: \
                 --searching-directory, --youtube-channel-url",
            )
            .with_suggestion(suggestions::no_source_suggestion())
            .into());
        }
    };

    let remove_originals = download.is_some() && args.delete_original_files;
    Ok(ResolvedSource {
        subtitles_root,
        download,
        cooldown_hours: args.subtitles_downloading_cooldown_hours,
        remove_originals,
    })
}

/// Download (if asked and not cooling down) and convert subtitles.
///
/// Returns the root of the text form tree.
pub fn prepare(source: &ResolvedSource) -> Result<PathBuf> {
    if let Some(request) = &source.download {
        let cooldown = DownloadCooldown::new(&request.channel_root);
        if cooldown.is_active(TimeDelta::hours(i64::from(source.cooldown_hours))) {
            tracing::info!(
                "skipping download of {}: cooldown of {} hours is active",
                request.channel_id,
                source.cooldown_hours
            );
        } else {
            let downloaded = download::download_missing_subtitles(request)?;
            tracing::info!("downloaded subtitles of {} videos", downloaded);
            cooldown.record_success()?;
        }
    } else if !source.subtitles_root.is_dir() {
        tracing::warn!(
            "subtitles directory {} does not exist",
            source.subtitles_root.display()
        );
    }

    let text_root = source.text_root();
    convert_tree(&source.subtitles_root, &text_root, source.remove_originals)?;
    Ok(text_root)
}
