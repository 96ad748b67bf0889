//! Locating the LTR and RTL fonts for a batch.

use std::path::{Path, PathBuf};

use shortsmith_common::error::{ShortsmithError, ShortsmithResult};
use shortsmith_plan_model::plan::Direction;
use shortsmith_text_layout::font::FontSet;

const WINDOWS_LTR: &[&str] = &["calibri.ttf", "arial.ttf"];
const WINDOWS_RTL: &[&str] = &["tahoma.ttf", "arial.ttf"];

const UNIX_LTR: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
];

const UNIX_RTL: &[&str] = &[
    "/usr/share/fonts/truetype/noto/NotoNaskhArabic-Regular.ttf",
    "/usr/share/fonts/noto/NotoNaskhArabic-Regular.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Tahoma.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
];

fn windows_font_dir() -> Option<PathBuf> {
    if !cfg!(windows) {
        return None;
    }
    let root = std::env::var_os("WINDIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("C:/Windows"));
    Some(root.join("Fonts")).filter(|dir| dir.is_dir())
}

/// Candidate font files for a direction, most preferred first.
pub fn candidates(direction: Direction) -> Vec<PathBuf> {
    let (windows, unix) = match direction {
        Direction::Ltr => (WINDOWS_LTR, UNIX_LTR),
        Direction::Rtl => (WINDOWS_RTL, UNIX_RTL),
    };
    match windows_font_dir() {
        Some(dir) => windows.iter().map(|name| dir.join(name)).collect(),
        None => unix.iter().map(PathBuf::from).collect(),
    }
}

/// First installed candidate for a direction.
pub fn discover(direction: Direction) -> Option<PathBuf> {
    candidates(direction).into_iter().find(|path| path.is_file())
}

fn pick(explicit: Option<&Path>, direction: Direction) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let found = discover(direction);
            if let Some(path) = &found {
                println!("Using {} font: {}", direction, path.display());
            }
            found
        }
    }
}

/// Resolve and load the batch fonts.
///
/// Explicit paths that fail to load are always fatal. A font that cannot be
/// discovered is fatal only when `required`; otherwise the batch runs
/// without fonts.
pub fn resolve(
    ltr: Option<&Path>,
    rtl: Option<&Path>,
    required: bool,
) -> ShortsmithResult<Option<FontSet>> {
    let ltr_path = pick(ltr, Direction::Ltr);
    let rtl_path = pick(rtl, Direction::Rtl);

    match (ltr_path, rtl_path) {
        (Some(ltr_path), Some(rtl_path)) => FontSet::load(&ltr_path, &rtl_path).map(Some),
        (ltr_path, _) if required => {
            let (direction, flag) = if ltr_path.is_none() {
                (Direction::Ltr, "--font-ltr")
            } else {
                (Direction::Rtl, "--font-rtl")
            };
            Err(ShortsmithError::font(format!(
                "No {direction} font found; pass {flag}"
            )))
        }
        _ => {
            tracing::info!("Fonts not found; captions will be written without reflow");
            Ok(None)
        }
    }
}
