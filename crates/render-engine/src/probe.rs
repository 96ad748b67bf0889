//! Source media inspection via ffprobe.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;

use shortsmith_common::error::{ShortsmithError, ShortsmithResult};

/// What kind of picture, if any, a source carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video { width: u32, height: u32 },
    Audio,
}

/// The batch's single input, probed once before any clip is rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSource {
    pub path: PathBuf,
    pub kind: MediaKind,
    pub has_audio: bool,
}

impl MediaSource {
    pub fn is_audio_only(&self) -> bool {
        self.kind == MediaKind::Audio
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    codec_type: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    disposition: Option<ProbeDisposition>,
}

#[derive(Debug, Deserialize)]
struct ProbeDisposition {
    #[serde(default)]
    attached_pic: u8,
}

impl ProbeStream {
    fn is_cover_art(&self) -> bool {
        self.disposition
            .as_ref()
            .is_some_and(|d| d.attached_pic != 0)
    }
}

/// Run ffprobe on `path` and classify it.
pub fn probe_media(path: &Path) -> ShortsmithResult<MediaSource> {
    if !path.is_file() {
        return Err(ShortsmithError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "stream=index,codec_type,width,height:stream_disposition=attached_pic",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| ShortsmithError::dependency_missing(format!("Failed to run ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(ShortsmithError::probe(format!(
            "ffprobe could not read {} (status {}): {}",
            path.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    let source = parse_probe_output(path, &raw)?;
    tracing::info!(
        path = %path.display(),
        kind = ?source.kind,
        has_audio = source.has_audio,
        "Probed source media"
    );
    Ok(source)
}

/// Classify ffprobe's JSON stream listing.
///
/// The first video stream that is not embedded cover art decides the
/// geometry; a source with neither pictures nor sound is rejected.
pub fn parse_probe_output(path: &Path, json: &str) -> ShortsmithResult<MediaSource> {
    let probe: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| ShortsmithError::probe(format!("Unreadable ffprobe output: {e}")))?;

    let has_audio = probe
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    let video = probe.streams.iter().find(|s| {
        s.codec_type.as_deref() == Some("video")
            && !s.is_cover_art()
            && s.width.unwrap_or(0) > 0
            && s.height.unwrap_or(0) > 0
    });

    let kind = match video {
        Some(stream) => MediaKind::Video {
            width: stream.width.unwrap_or(0),
            height: stream.height.unwrap_or(0),
        },
        None if has_audio => MediaKind::Audio,
        None => {
            return Err(ShortsmithError::probe(format!(
                "{} has no playable video or audio stream",
                path.display()
            )))
        }
    };

    Ok(MediaSource {
        path: path.to_path_buf(),
        kind,
        has_audio,
    })
}
