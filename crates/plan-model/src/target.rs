//! Output geometry and styling shared by every clip in a batch.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use shortsmith_common::config::RenderDefaults;
use shortsmith_common::error::{ShortsmithError, ShortsmithResult};

/// Captions never use more than this share of the frame width.
pub const MAX_CAPTION_WIDTH_RATIO: f64 = 0.9;

/// Output frame size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Fixed render target for a batch: geometry, margins and thumbnail style.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTarget {
    /// Output frame size.
    pub geometry: Geometry,

    /// Horizontal margin kept free of caption and title text (pixels).
    pub margin: u32,

    /// Maximum thumbnail title lines before the font is shrunk.
    pub max_lines: usize,

    /// Background of generated thumbnails.
    pub background: Color,
}

impl Geometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Parse `WIDTHxHEIGHT`, rejecting zero or odd dimensions (H.264 4:2:0
    /// needs even sizes).
    pub fn parse(value: &str) -> ShortsmithResult<Self> {
        let (w, h) = value
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| ShortsmithError::config(format!("Invalid size '{value}', expected WIDTHxHEIGHT")))?;
        let width = w
            .trim()
            .parse::<u32>()
            .map_err(|_| ShortsmithError::config(format!("Invalid width in size '{value}'")))?;
        let height = h
            .trim()
            .parse::<u32>()
            .map_err(|_| ShortsmithError::config(format!("Invalid height in size '{value}'")))?;

        if width == 0 || height == 0 {
            return Err(ShortsmithError::config(format!(
                "Size '{value}' must be non-zero"
            )));
        }
        if width % 2 != 0 || height % 2 != 0 {
            return Err(ShortsmithError::config(format!(
                "Size '{value}' must have even dimensions"
            )));
        }
        Ok(Self { width, height })
    }

    /// Height of the waveform band on audio-only renders.
    pub fn waveform_height(&self) -> u32 {
        (self.height as f64 * 0.2) as u32
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Geometry {
    type Err = ShortsmithError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB`, `#RGB` or one of a few basic color names.
    pub fn parse(value: &str) -> ShortsmithResult<Self> {
        let trimmed = value.trim();
        let invalid = || ShortsmithError::config(format!("Invalid color '{value}'"));

        if let Some(hex) = trimmed.strip_prefix('#') {
            if !hex.is_ascii() {
                return Err(invalid());
            }
            let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
            return match hex.len() {
                6 => Ok(Self::rgb(
                    channel(&hex[0..2])?,
                    channel(&hex[2..4])?,
                    channel(&hex[4..6])?,
                )),
                3 => {
                    let expand = |s: &str| channel(s).map(|v| v * 17);
                    Ok(Self::rgb(
                        expand(&hex[0..1])?,
                        expand(&hex[1..2])?,
                        expand(&hex[2..3])?,
                    ))
                }
                _ => Err(invalid()),
            };
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "black" => Ok(Self::BLACK),
            "white" => Ok(Self::WHITE),
            "red" => Ok(Self::rgb(255, 0, 0)),
            "green" => Ok(Self::rgb(0, 128, 0)),
            "blue" => Ok(Self::rgb(0, 0, 255)),
            "gray" | "grey" => Ok(Self::rgb(128, 128, 128)),
            "navy" => Ok(Self::rgb(0, 0, 128)),
            _ => Err(invalid()),
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl RenderTarget {
    /// Build and validate a render target from configured defaults.
    pub fn from_defaults(defaults: &RenderDefaults) -> ShortsmithResult<Self> {
        let target = Self {
            geometry: Geometry::parse(&defaults.size)?,
            margin: defaults.margin,
            max_lines: defaults.max_lines,
            background: Color::parse(&defaults.thumb_bg)?,
        };
        target.validate()?;
        Ok(target)
    }

    /// Check that margins and line limits leave room for text.
    pub fn validate(&self) -> ShortsmithResult<()> {
        if self.margin.saturating_mul(2) >= self.geometry.width {
            return Err(ShortsmithError::config(format!(
                "Margin {} leaves no room for text in a {}px wide frame",
                self.margin, self.geometry.width
            )));
        }
        if self.max_lines == 0 {
            return Err(ShortsmithError::config("max_lines must be at least 1"));
        }
        Ok(())
    }

    /// Width available to thumbnail title lines.
    pub fn text_width(&self) -> u32 {
        self.geometry.width - 2 * self.margin
    }

    /// Width available to caption lines.
    pub fn caption_width(&self) -> u32 {
        let ratio_cap = (self.geometry.width as f64 * MAX_CAPTION_WIDTH_RATIO) as u32;
        ratio_cap.min(self.text_width())
    }
}
