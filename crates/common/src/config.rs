//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default output directory for rendered shorts.
pub const DEFAULT_OUTDIR: &str = "./shorts_output";
/// Default output geometry (portrait 9:16).
pub const DEFAULT_SIZE: &str = "1080x1920";
/// Default thumbnail background for audio-only sources.
pub const DEFAULT_THUMB_BG: &str = "#101114";
/// Default caption/thumbnail margin in pixels.
pub const DEFAULT_MARGIN: u32 = 40;
/// Default maximum number of thumbnail title lines.
pub const DEFAULT_MAX_LINES: usize = 2;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory where rendered clips and the manifest are written.
    pub output_dir: PathBuf,

    /// Default render parameters.
    pub render: RenderDefaults,

    /// Font resources for caption wrapping and thumbnails.
    pub fonts: FontPaths,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default render parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDefaults {
    /// Output geometry as `WIDTHxHEIGHT`.
    pub size: String,

    /// Caption and thumbnail margin (pixels).
    pub margin: u32,

    /// Maximum number of title lines on generated thumbnails.
    pub max_lines: usize,

    /// Thumbnail background color (`#RRGGBB`, `#RGB` or a basic name).
    pub thumb_bg: String,

    /// Whether captions are burned into the rendered video.
    pub burn_captions: bool,
}

/// Font resources, one per text direction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FontPaths {
    /// Font used for left-to-right scripts.
    pub ltr: Option<PathBuf>,

    /// Font used for right-to-left scripts.
    pub rtl: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "shortsmith=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTDIR),
            render: RenderDefaults::default(),
            fonts: FontPaths::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE.to_string(),
            margin: DEFAULT_MARGIN,
            max_lines: DEFAULT_MAX_LINES,
            thumb_bg: DEFAULT_THUMB_BG.to_string(),
            burn_captions: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("shortsmith").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("./shorts_output"));
        assert_eq!(config.render.size, "1080x1920");
        assert_eq!(config.render.margin, 40);
        assert_eq!(config.render.max_lines, 2);
        assert_eq!(config.render.thumb_bg, "#101114");
        assert!(config.render.burn_captions);
        assert!(config.fonts.ltr.is_none());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"render":{"margin":64},"fonts":{"rtl":"/fonts/naskh.ttf"}}"#)
                .unwrap();
        assert_eq!(config.render.margin, 64);
        assert_eq!(config.render.size, DEFAULT_SIZE);
        assert_eq!(config.fonts.rtl, Some(PathBuf::from("/fonts/naskh.ttf")));
        assert_eq!(config.logging.level, "info");
    }
}
