//! Deterministic output file names.
//!
//! Names depend only on the clip id and title, so re-running a plan
//! overwrites the previous outputs instead of accumulating copies.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::plan::ClipSpec;

/// Slugs are cut to this many characters.
const MAX_SLUG_CHARS: usize = 80;

/// File name of the batch manifest.
pub const MANIFEST_FILE_NAME: &str = "manifest.csv";

/// File names produced for one clip (relative to the output directory).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipOutputNames {
    /// `{id}__{slug}.mp4`
    pub video: String,
    /// `{id}__{slug}.srt`
    pub captions: String,
    /// `{id}__thumb.jpg`
    pub thumbnail: String,
}

/// Create a filesystem-safe slug from a title.
///
/// Punctuation is dropped, whitespace/underscore/hyphen runs collapse to a
/// single `-`, and the result is lower-cased. Letters from any script are
/// kept.
pub fn slugify(text: &str) -> String {
    static STRIP: OnceLock<Regex> = OnceLock::new();
    static COLLAPSE: OnceLock<Regex> = OnceLock::new();
    let strip = STRIP.get_or_init(|| Regex::new(r"[^\w\s-]").expect("valid slug regex"));
    let collapse = COLLAPSE.get_or_init(|| Regex::new(r"[\s_-]+").expect("valid slug regex"));

    let stripped = strip.replace_all(text, "");
    let lowered = stripped.trim().to_lowercase();
    collapse
        .replace_all(&lowered, "-")
        .chars()
        .take(MAX_SLUG_CHARS)
        .collect()
}

impl ClipOutputNames {
    pub fn for_clip(clip: &ClipSpec) -> Self {
        let slug = slugify(&clip.title);
        Self {
            video: format!("{}__{slug}.mp4", clip.id),
            captions: format!("{}__{slug}.srt", clip.id),
            thumbnail: format!("{}__thumb.jpg", clip.id),
        }
    }

    pub fn video_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.video)
    }

    pub fn captions_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.captions)
    }

    pub fn thumbnail_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.thumbnail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Plan;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Rust: Fast & Safe!  "), "rust-fast-safe");
        assert_eq!(slugify("snake_case -- and   spaces"), "snake-case-and-spaces");
    }

    #[test]
    fn test_slugify_keeps_non_latin_letters() {
        assert_eq!(slugify("سلام دنیا!"), "سلام-دنیا");
    }

    #[test]
    fn test_slugify_truncates() {
        let long = "word ".repeat(40);
        assert_eq!(slugify(&long).chars().count(), MAX_SLUG_CHARS);
    }

    #[test]
    fn test_output_names() {
        let plan = Plan::from_json_str(
            r#"{"shorts":[{"id":"s1","title":"Hello World","start_sec":10,"end_sec":16}]}"#,
        )
        .unwrap();
        let names = ClipOutputNames::for_clip(&plan.shorts[0]);
        assert_eq!(names.video, "s1__hello-world.mp4");
        assert_eq!(names.captions, "s1__hello-world.srt");
        assert_eq!(names.thumbnail, "s1__thumb.jpg");
        assert_eq!(
            names.video_path(Path::new("/out")),
            PathBuf::from("/out/s1__hello-world.mp4")
        );
    }
}
