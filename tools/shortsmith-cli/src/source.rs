//! Resolving the `--media` argument to a local file.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use indicatif::{ProgressBar, ProgressStyle};
use url::Url;

use shortsmith_common::error::{ShortsmithError, ShortsmithResult};
use shortsmith_render_engine::tool_path;

const YT_DLP_FORMAT: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";

/// Where the source media comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaLocator {
    Local(PathBuf),
    /// A video-hosting page, fetched with yt-dlp.
    Hosted(Url),
    /// A plain file URL, streamed over HTTP.
    Direct(Url),
}

impl MediaLocator {
    pub fn parse(input: &str) -> Self {
        match Url::parse(input) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => {
                if is_video_host(&url) {
                    MediaLocator::Hosted(url)
                } else {
                    MediaLocator::Direct(url)
                }
            }
            _ => MediaLocator::Local(PathBuf::from(input)),
        }
    }
}

fn is_video_host(url: &Url) -> bool {
    let host = url.host_str().unwrap_or_default();
    host == "youtu.be" || host == "youtube.com" || host.ends_with(".youtube.com")
}

/// Produce a local path for `input`, downloading into `workdir` when needed.
pub fn acquire(input: &str, workdir: &Path) -> ShortsmithResult<PathBuf> {
    match MediaLocator::parse(input) {
        MediaLocator::Local(path) => {
            if path.is_file() {
                Ok(path)
            } else {
                Err(ShortsmithError::acquisition(format!(
                    "Local media file not found: {}",
                    path.display()
                )))
            }
        }
        MediaLocator::Hosted(url) => download_hosted(&url, workdir),
        MediaLocator::Direct(url) => download_direct(&url, workdir),
    }
}

fn download_hosted(url: &Url, workdir: &Path) -> ShortsmithResult<PathBuf> {
    let yt_dlp = tool_path("yt-dlp").ok_or_else(|| {
        ShortsmithError::dependency_missing("yt-dlp is required for video-hosting URLs")
    })?;

    println!("Downloading {url} with yt-dlp");
    let spinner = ProgressBar::new_spinner();
    spinner.set_message("yt-dlp");
    spinner.enable_steady_tick(std::time::Duration::from_millis(120));

    let template = workdir.join("%(id)s.%(ext)s");
    let output = Command::new(yt_dlp)
        .args(["--no-progress", "--no-playlist", "-f", YT_DLP_FORMAT, "-o"])
        .arg(&template)
        .args(["--print", "after_move:filepath"])
        .arg(url.as_str())
        .stdin(Stdio::null())
        .output()
        .map_err(|e| ShortsmithError::acquisition(format!("Failed to run yt-dlp: {e}")))?;
    spinner.finish_and_clear();

    if !output.status.success() {
        return Err(ShortsmithError::acquisition(format!(
            "yt-dlp failed (status {}): {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let path = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(PathBuf::from)
        .filter(|path| path.is_file())
        .ok_or_else(|| ShortsmithError::acquisition("yt-dlp did not report a downloaded file"))?;

    println!("[OK] Downloaded {}", path.display());
    Ok(path)
}

fn download_direct(url: &Url, workdir: &Path) -> ShortsmithResult<PathBuf> {
    println!("Downloading {url}");
    let response = reqwest::blocking::get(url.as_str())
        .and_then(|r| r.error_for_status())
        .map_err(|e| ShortsmithError::acquisition(format!("Failed to download {url}: {e}")))?;

    let ext = Path::new(url.path())
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("tmp");
    let path = workdir.join(format!("downloaded.{ext}"));
    let mut file = std::fs::File::create(&path)?;

    let bar = match response.content_length() {
        Some(len) => {
            let bar = ProgressBar::new(len);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{bar:40.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
            {
                bar.set_style(style);
            }
            bar
        }
        None => ProgressBar::new_spinner(),
    };

    std::io::copy(&mut bar.wrap_read(response), &mut file).map_err(|e| {
        ShortsmithError::acquisition(format!("Failed while downloading {url}: {e}"))
    })?;
    bar.finish_and_clear();

    println!("[OK] Downloaded {}", path.display());
    Ok(path)
}
