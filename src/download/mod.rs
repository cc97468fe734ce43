// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subtitle downloading through an external yt-dlp process

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;
use url::Url;

use subgrep::errors::UnsupportedChannelUrlError;

const MAX_SIMULTANEOUS_DOWNLOADS: usize = 2;
const POLL_INTERVAL: Duration = Duration::from_millis(100);
const ARCHIVE_FILE: &str = "ytdl-archive.txt";
const COOKIES_FILE: &str = "cookies.txt";

/// Video ids are 11 characters; titles can exceed path length limits.
const SHORT_OUTPUT_TEMPLATE: &str =
    "%(uploader_id)s/%(upload_date>%Y)s/%(upload_date)s_%(id)s/%(id)s.%(ext)s";
const OUTPUT_TEMPLATE: &str =
    "%(uploader_id)s/%(upload_date>%Y)s/%(upload_date)s_%(title)s/%(title)s.%(ext)s";

/// Channel id (`@name`) from a channel URL such as `https://www.youtube.com/@name/videos`.
pub fn channel_id(url: &str) -> Result<String, UnsupportedChannelUrlError> {
    let unsupported = || UnsupportedChannelUrlError {
        url: url.to_string(),
    };
    let parsed = Url::parse(url).map_err(|_| unsupported())?;
    let id = parsed
        .path()
        .trim_matches('/')
        .split('/')
        .next()
        .unwrap_or_default();
    if !id.starts_with('@') || id.len() == 1 {
        return Err(unsupported());
    }
    Ok(id.to_string())
}

/// One channel video as listed by `yt-dlp --dump-json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListedVideo {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub live_status: Option<String>,
}

impl ListedVideo {
    /// yt-dlp fails on subtitles of live and upcoming videos.
    pub fn is_downloadable(&self) -> bool {
        match self.live_status.as_deref() {
            None | Some("not_live") | Some("was_live") => true,
            Some(_) => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub channel_id: String,
    /// `<cache>/<channel_id>`; yt-dlp writes below `<cache>` itself.
    pub channel_root: PathBuf,
    pub yt_dlp_path: String,
    pub language: Option<String>,
    pub minimize_path_length: bool,
}

impl DownloadRequest {
    fn cache_root(&self) -> &Path {
        self.channel_root.parent().unwrap_or(Path::new("."))
    }

    fn archive_path(&self) -> PathBuf {
        self.channel_root.join(ARCHIVE_FILE)
    }

    fn cookies_path(&self) -> Option<PathBuf> {
        let path = self.cache_root().join(COOKIES_FILE);
        path.is_file().then_some(path)
    }

    fn common_args(&self, args: &mut Vec<OsString>) {
        if let Some(cookies) = self.cookies_path() {
            args.push("--cookies".into());
            args.push(cookies.into());
        }
        args.push("--download-archive".into());
        args.push(self.archive_path().into());
    }

    /// Arguments listing the channel videos not yet in the download archive.
    pub fn listing_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--newline".into(),
            "--ignore-errors".into(),
            // scheduled streams otherwise abort the listing
            "--ignore-no-formats-error".into(),
            "--dump-json".into(),
        ];
        self.common_args(&mut args);
        args.push(format!("https://www.youtube.com/{}", self.channel_id).into());
        args
    }

    /// Arguments fetching subtitles and metadata of one video, without the media.
    pub fn video_args(&self, video_id: &str) -> Vec<OsString> {
        let template = if self.minimize_path_length {
            SHORT_OUTPUT_TEMPLATE
        } else {
            OUTPUT_TEMPLATE
        };
        let mut args: Vec<OsString> = vec![
            "--no-mtime".into(),
            "--write-sub".into(),
            "--write-auto-sub".into(),
        ];
        if let Some(language) = self.language.as_deref().filter(|l| !l.is_empty()) {
            args.push("--sub-lang".into());
            args.push(language.into());
        }
        args.extend([
            "--write-info-json".into(),
            "--no-clean-infojson".into(),
            "--output".into(),
            template.into(),
            "--paths".into(),
        ]);
        let mut home = OsString::from("home:");
        home.push(self.cache_root());
        args.push(home);
        self.common_args(&mut args);
        args.extend([
            "--skip-download".into(),
            // --skip-download would otherwise keep the video out of the archive
            "--force-download-archive".into(),
            format!("https://www.youtube.com/watch?v={video_id}").into(),
        ]);
        args
    }
}

/// Resolve the yt-dlp executable through `PATH` (or use it as given).
pub fn resolve_yt_dlp(path: &str) -> Result<PathBuf> {
    which::which(path).with_context(|| {
        format!(
            "yt-dlp not found at '{path}'\n\n\
             Suggestion: install it from https://github.com/yt-dlp/yt-dlp/releases \
             or pass --yt-dlp-path"
        )
    })
}

struct RunningDownload {
    video_id: String,
    child: Child,
}

/// Bounded pool of yt-dlp processes.
struct DownloadQueue<'a> {
    executable: &'a Path,
    request: &'a DownloadRequest,
    waiting: VecDeque<String>,
    running: Vec<RunningDownload>,
    completed: usize,
}

impl<'a> DownloadQueue<'a> {
    fn new(executable: &'a Path, request: &'a DownloadRequest) -> Self {
        Self {
            executable,
            request,
            waiting: VecDeque::new(),
            running: Vec::new(),
            completed: 0,
        }
    }

    fn push(&mut self, video_id: String) {
        self.waiting.push_back(video_id);
    }

    /// Reap finished downloads and start the next one if a slot is free.
    fn poll(&mut self) -> Result<()> {
        let mut index = 0;
        while index < self.running.len() {
            let download = &mut self.running[index];
            match download.child.try_wait()? {
                None => index += 1,
                Some(status) if status.success() => {
                    tracing::info!("video {} downloading complete", download.video_id);
                    self.running.swap_remove(index);
                    self.completed += 1;
                }
                Some(status) => {
                    bail!(
                        "Downloading of video {} failed ({})",
                        download.video_id,
                        status
                    );
                }
            }
        }

        if self.running.len() < MAX_SIMULTANEOUS_DOWNLOADS {
            if let Some(video_id) = self.waiting.pop_front() {
                let child = Command::new(self.executable)
                    .args(self.request.video_args(&video_id))
                    .stdout(Stdio::from(std::io::stderr()))
                    .stderr(Stdio::inherit())
                    .spawn()
                    .with_context(|| format!("Failed to start {}", self.executable.display()))?;
                tracing::debug!("started download of video {}", video_id);
                self.running.push(RunningDownload { video_id, child });
            }
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<usize> {
        while !self.waiting.is_empty() || !self.running.is_empty() {
            self.poll()?;
            if self.running.len() == MAX_SIMULTANEOUS_DOWNLOADS || self.waiting.is_empty() {
                thread::sleep(POLL_INTERVAL);
            }
        }
        Ok(self.completed)
    }
}

impl Drop for DownloadQueue<'_> {
    fn drop(&mut self) {
        for download in &mut self.running {
            let _ = download.child.kill();
            let _ = download.child.wait();
        }
    }
}

/// Child process that is killed and reaped unless it was waited for.
struct ReapOnDrop(Option<Child>);

impl ReapOnDrop {
    fn wait(mut self) -> Result<ExitStatus> {
        match self.0.take() {
            Some(mut child) => Ok(child.wait()?),
            None => bail!("process was already reaped"),
        }
    }
}

impl Drop for ReapOnDrop {
    fn drop(&mut self) {
        if let Some(mut child) = self.0.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Download subtitles of every channel video missing from the archive.
///
/// Returns the number of videos downloaded.
pub fn download_missing_subtitles(request: &DownloadRequest) -> Result<usize> {
    std::fs::create_dir_all(&request.channel_root)
        .with_context(|| format!("Failed to create {}", request.channel_root.display()))?;
    let executable = resolve_yt_dlp(&request.yt_dlp_path)?;

    let mut lister = ReapOnDrop(Some(
        Command::new(&executable)
            .args(request.listing_args())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("Failed to start {}", executable.display()))?,
    ));
    let stdout = lister
        .0
        .as_mut()
        .and_then(|child| child.stdout.take())
        .context("yt-dlp listing output is not available")?;

    let mut queue = DownloadQueue::new(&executable, request);
    for line in BufReader::new(stdout).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let video: ListedVideo = serde_json::from_str(&line)
            .context("Failed to parse yt-dlp video listing")?;
        if video.is_downloadable() {
            tracing::info!("new video: {}, \"{}\"", video.id, video.title);
            queue.push(video.id);
        } else {
            tracing::warn!(
                "Skip live video {}. Status is {}",
                video.id,
                video.live_status.as_deref().unwrap_or("unknown")
            );
        }
        queue.poll()?;
    }

    let status = lister.wait()?;
    if !status.success() {
        bail!("{} failed to list channel videos ({})", executable.display(), status);
    }
    queue.drain()
}
