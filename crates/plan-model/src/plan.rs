//! Clip plan types.
//!
//! A plan is a JSON document with a `shorts` array. Each entry describes one
//! short clip cut from the source media. Entries are independent: a bad
//! entry is skipped at render time without affecting its neighbours.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use shortsmith_common::error::{ShortsmithError, ShortsmithResult};

/// Shortest clip the pipeline will render (seconds).
pub const MIN_CLIP_SECS: f64 = 5.0;
/// Longest clip the pipeline will render (seconds).
pub const MAX_CLIP_SECS: f64 = 60.0;

/// Top-level plan document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    /// Clip descriptors in output order.
    #[serde(default)]
    pub shorts: Vec<ClipSpec>,
}

/// Text direction of a clip's language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

/// A single planned clip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipSpec {
    /// Unique identifier, used as the output file prefix.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    /// Display title.
    pub title: String,

    /// Clip start offset in the source (seconds).
    pub start_sec: f64,

    /// Clip end offset in the source (seconds).
    pub end_sec: f64,

    /// Language tag (e.g. "en", "ur").
    #[serde(default)]
    pub language: String,

    /// Script direction for captions and thumbnail text.
    #[serde(default)]
    pub direction: Direction,

    /// Free-form category.
    #[serde(default)]
    pub category: String,

    /// Search keywords.
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Optional SRT caption track, timed relative to the clip start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srt: Option<String>,

    /// Optional title override for generated thumbnails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_title: Option<String>,
}

/// A `[start, end]` window in source seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start_secs: f64,
    pub end_secs: f64,
}

impl TimeWindow {
    pub fn new(start_secs: f64, end_secs: f64) -> Self {
        Self {
            start_secs,
            end_secs,
        }
    }

    /// Window length in seconds (negative if the window is inverted).
    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }
}

impl Direction {
    /// Parse a direction tag. Anything other than `rtl` is left-to-right.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("rtl") {
            Direction::Rtl
        } else {
            Direction::Ltr
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Direction::parse(&raw))
    }
}

impl ClipSpec {
    /// The time window this clip covers.
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start_sec, self.end_sec)
    }

    /// Clip length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.window().duration_secs()
    }

    /// Title used on generated thumbnails.
    pub fn thumbnail_title(&self) -> &str {
        self.thumbnail_title
            .as_deref()
            .filter(|title| !title.trim().is_empty())
            .unwrap_or(&self.title)
    }

    /// Caption track, if one was planned and is not blank.
    pub fn captions(&self) -> Option<&str> {
        self.srt.as_deref().filter(|srt| !srt.trim().is_empty())
    }

    /// Reason this clip must be skipped, if its duration is out of range.
    pub fn duration_violation(&self) -> Option<String> {
        let duration = self.duration_secs();
        if (MIN_CLIP_SECS..=MAX_CLIP_SECS).contains(&duration) {
            None
        } else {
            Some(format!(
                "Duration ({duration:.2}s) outside {MIN_CLIP_SECS:.0}-{MAX_CLIP_SECS:.0}s range"
            ))
        }
    }
}

impl Plan {
    /// Load and validate a plan from a JSON file.
    pub fn load(path: &Path) -> ShortsmithResult<Self> {
        if !path.is_file() {
            return Err(ShortsmithError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parse and validate a plan from JSON text.
    pub fn from_json_str(content: &str) -> ShortsmithResult<Self> {
        let plan: Plan = serde_json::from_str(content)
            .map_err(|e| ShortsmithError::plan(format!("Failed to parse plan: {e}")))?;
        plan.validate()?;
        Ok(plan)
    }

    /// Structural checks that make the plan unusable as a whole.
    ///
    /// Out-of-range durations are not checked here; they are per-clip skips.
    pub fn validate(&self) -> ShortsmithResult<()> {
        let mut seen = HashSet::new();
        for clip in &self.shorts {
            if clip.id.trim().is_empty() {
                return Err(ShortsmithError::plan(format!(
                    "Clip '{}' has an empty id",
                    clip.title
                )));
            }
            // Ids become file name prefixes inside the output directory.
            if clip.id.contains(['/', '\\', '\0']) || clip.id.contains("..") {
                return Err(ShortsmithError::plan(format!(
                    "Clip id '{}' must not contain path separators or '..'",
                    clip.id
                )));
            }
            if !seen.insert(clip.id.as_str()) {
                return Err(ShortsmithError::plan(format!(
                    "Duplicate clip id '{}'",
                    clip.id
                )));
            }
            if !clip.start_sec.is_finite() || !clip.end_sec.is_finite() {
                return Err(ShortsmithError::plan(format!(
                    "Clip '{}' has non-finite time bounds",
                    clip.id
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.shorts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shorts.is_empty()
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Int(value) => value.to_string(),
        Raw::Float(value) => value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "shorts": [
            {
                "id": "s1",
                "title": "Hello World",
                "start_sec": 10,
                "end_sec": 16,
                "language": "en",
                "direction": "ltr",
                "category": "talk",
                "keywords": ["hello", "world"],
                "srt": "1\n00:00:00,000 --> 00:00:02,000\nHello\n"
            },
            {
                "id": 7,
                "title": "سلام دنیا",
                "start_sec": 30.5,
                "end_sec": 33.5,
                "direction": "RTL",
                "thumbnail_title": "سلام"
            }
        ]
    }"#;

    #[test]
    fn test_parse_plan() {
        let plan = Plan::from_json_str(SAMPLE).unwrap();
        assert_eq!(plan.len(), 2);

        let first = &plan.shorts[0];
        assert_eq!(first.id, "s1");
        assert_eq!(first.direction, Direction::Ltr);
        assert!((first.duration_secs() - 6.0).abs() < 1e-9);
        assert_eq!(first.keywords, vec!["hello", "world"]);
        assert!(first.captions().is_some());
        assert_eq!(first.thumbnail_title(), "Hello World");

        let second = &plan.shorts[1];
        assert_eq!(second.id, "7");
        assert_eq!(second.direction, Direction::Rtl);
        assert!(second.keywords.is_empty());
        assert_eq!(second.thumbnail_title(), "سلام");
    }

    #[test]
    fn test_duration_bounds_are_inclusive() {
        let mut clip = Plan::from_json_str(SAMPLE).unwrap().shorts.remove(0);
        clip.start_sec = 0.0;

        clip.end_sec = 5.0;
        assert!(clip.duration_violation().is_none());
        clip.end_sec = 60.0;
        assert!(clip.duration_violation().is_none());

        clip.end_sec = 4.99;
        assert!(clip.duration_violation().is_some());
        clip.end_sec = 60.01;
        assert!(clip.duration_violation().is_some());
    }

    #[test]
    fn test_inverted_window_is_a_violation() {
        let mut clip = Plan::from_json_str(SAMPLE).unwrap().shorts.remove(0);
        clip.start_sec = 20.0;
        clip.end_sec = 10.0;
        let reason = clip.duration_violation().unwrap();
        assert!(reason.contains("-10.00s"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"{"shorts":[
            {"id":"a","title":"x","start_sec":0,"end_sec":10},
            {"id":"a","title":"y","start_sec":10,"end_sec":20}
        ]}"#;
        let err = Plan::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("Duplicate clip id 'a'"));
    }

    #[test]
    fn test_path_like_ids_rejected() {
        for id in ["../x", "a/b", r"a\b", "x..y"] {
            let json = format!(
                r#"{{"shorts":[{{"id":{},"title":"t","start_sec":0,"end_sec":10}}]}}"#,
                serde_json::to_string(id).unwrap()
            );
            let err = Plan::from_json_str(&json).unwrap_err();
            assert!(matches!(err, ShortsmithError::Plan { .. }), "{id}");
        }
        assert!(Plan::from_json_str(
            r#"{"shorts":[{"id":"s1.v2","title":"t","start_sec":0,"end_sec":10}]}"#
        )
        .is_ok());
    }

    #[test]
    fn test_missing_shorts_array_is_empty_plan() {
        let plan = Plan::from_json_str("{}").unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_blank_caption_and_thumbnail_fall_back() {
        let json = r#"{"shorts":[
            {"id":"a","title":"Real","start_sec":0,"end_sec":10,"srt":"  ","thumbnail_title":""}
        ]}"#;
        let plan = Plan::from_json_str(json).unwrap();
        assert!(plan.shorts[0].captions().is_none());
        assert_eq!(plan.shorts[0].thumbnail_title(), "Real");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Plan::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ShortsmithError::FileNotFound { .. }));
    }
}
