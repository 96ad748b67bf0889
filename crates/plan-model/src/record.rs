//! Per-clip result records and the batch manifest.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use shortsmith_common::error::{ShortsmithError, ShortsmithResult};

use crate::naming::{ClipOutputNames, MANIFEST_FILE_NAME};
use crate::plan::{ClipSpec, Direction};

/// One successfully rendered clip. Field order is the manifest column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: String,
    pub title: String,
    pub start_sec: f64,
    pub end_sec: f64,
    pub duration_sec: f64,
    pub language: String,
    pub direction: Direction,
    pub category: String,
    /// Comma-joined keyword list.
    pub keywords: String,
    /// Video file name.
    pub video_path: String,
    /// Caption file name, empty when the clip had no captions.
    pub srt_path: String,
    /// Thumbnail file name.
    pub thumb_path: String,
}

impl ResultRecord {
    pub fn new(clip: &ClipSpec, names: &ClipOutputNames, has_captions: bool) -> Self {
        Self {
            id: clip.id.clone(),
            title: clip.title.clone(),
            start_sec: clip.start_sec,
            end_sec: clip.end_sec,
            duration_sec: clip.duration_secs(),
            language: clip.language.clone(),
            direction: clip.direction,
            category: clip.category.clone(),
            keywords: clip.keywords.join(","),
            video_path: names.video.clone(),
            srt_path: if has_captions {
                names.captions.clone()
            } else {
                String::new()
            },
            thumb_path: names.thumbnail.clone(),
        }
    }
}

/// Write the manifest for a finished batch.
///
/// Returns `Ok(None)` when no clip succeeded. A manifest left over from an
/// earlier run in the same directory is removed in that case, so its
/// presence always describes the latest batch.
pub fn write_manifest(dir: &Path, records: &[ResultRecord]) -> ShortsmithResult<Option<PathBuf>> {
    let path = dir.join(MANIFEST_FILE_NAME);
    if records.is_empty() {
        match std::fs::remove_file(&path) {
            Ok(()) => tracing::info!(path = %path.display(), "Removed stale manifest"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ShortsmithError::manifest(format!(
                    "Failed to remove stale {}: {e}",
                    path.display()
                )))
            }
        }
        return Ok(None);
    }

    let mut writer = csv::Writer::from_path(&path).map_err(|e| {
        ShortsmithError::manifest(format!("Failed to create {}: {e}", path.display()))
    })?;
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| ShortsmithError::manifest(format!("Failed to write row '{}': {e}", record.id)))?;
    }
    writer.flush()?;

    tracing::info!(path = %path.display(), rows = records.len(), "Wrote manifest");
    Ok(Some(path))
}

/// Read a manifest back (used by tooling and tests).
pub fn read_manifest(path: &Path) -> ShortsmithResult<Vec<ResultRecord>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        ShortsmithError::manifest(format!("Failed to open {}: {e}", path.display()))
    })?;
    reader
        .deserialize()
        .collect::<Result<Vec<ResultRecord>, _>>()
        .map_err(|e| ShortsmithError::manifest(format!("Malformed manifest row: {e}")))
}
