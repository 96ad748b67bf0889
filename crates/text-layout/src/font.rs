//! Font loading and text measurement.

use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};

use shortsmith_common::error::{ShortsmithError, ShortsmithResult};
use shortsmith_plan_model::plan::Direction;

/// Anything that can report the rendered width of a string.
///
/// `size` is the font size in pixels per em, the same unit title and caption
/// sizes are expressed in.
pub trait TextMeasure {
    fn measure_width(&self, text: &str, size: f32) -> f32;
}

/// A font file loaded into memory.
pub struct LoadedFont {
    path: PathBuf,
    family: String,
    font: FontVec,
}

/// The two fonts a batch needs, one per script direction.
///
/// Resolved once before the batch starts and shared read-only by every clip.
pub struct FontSet {
    ltr: LoadedFont,
    rtl: LoadedFont,
}

/// Fixed-advance metric: every char is `advance_em` ems wide.
///
/// Useful for dry runs and for exercising layout without font files.
#[derive(Debug, Clone, Copy)]
pub struct MonospaceMeasure {
    pub advance_em: f32,
}

impl LoadedFont {
    pub fn load(path: &Path) -> ShortsmithResult<Self> {
        if !path.is_file() {
            return Err(ShortsmithError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let data = std::fs::read(path)?;
        let font = FontVec::try_from_vec(data).map_err(|e| {
            ShortsmithError::font(format!("Failed to parse font {}: {e}", path.display()))
        })?;
        let family = family_name(font.as_slice()).unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        tracing::debug!(
            path = %path.display(),
            %family,
            glyphs = font.glyph_count(),
            "Loaded font"
        );
        // Absolute, since ffmpeg runs from the clip working directory.
        let path = std::fs::canonicalize(path)?;
        Ok(Self {
            path,
            family,
            font,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Family name from the font's `name` table, falling back to the file
    /// stem. This is what libass matches `FontName` against.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Directory holding the font file.
    pub fn directory(&self) -> Option<&Path> {
        self.path.parent().filter(|dir| !dir.as_os_str().is_empty())
    }

    pub fn font(&self) -> &FontVec {
        &self.font
    }

    /// Convert an em size in pixels into the glyph scale ab_glyph expects
    /// (which is measured from ascender to descender).
    pub fn scale_for(&self, size: f32) -> PxScale {
        let units_per_em = self.font.units_per_em().unwrap_or(1000.0);
        PxScale::from(size * self.font.height_unscaled() / units_per_em)
    }

    /// Distance between baselines of consecutive lines at `size`.
    pub fn line_height(&self, size: f32) -> f32 {
        let scaled = self.font.as_scaled(self.scale_for(size));
        scaled.ascent() - scaled.descent()
    }
}

impl TextMeasure for LoadedFont {
    fn measure_width(&self, text: &str, size: f32) -> f32 {
        let scaled = self.font.as_scaled(self.scale_for(size));
        let mut width = 0.0;
        let mut previous = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        width
    }
}

/// Typographic family if present, else the legacy family, preferring
/// Unicode-encoded records.
fn family_name(data: &[u8]) -> Option<String> {
    let face = ttf_parser::Face::parse(data, 0).ok()?;
    let lookup = |id: u16| {
        face.names()
            .into_iter()
            .filter(|name| name.name_id == id && name.is_unicode())
            .find_map(|name| name.to_string())
            .filter(|family| !family.trim().is_empty())
    };
    lookup(ttf_parser::name_id::TYPOGRAPHIC_FAMILY).or_else(|| lookup(ttf_parser::name_id::FAMILY))
}

impl std::fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedFont")
            .field("path", &self.path)
            .field("family", &self.family)
            .finish()
    }
}

impl FontSet {
    pub fn new(ltr: LoadedFont, rtl: LoadedFont) -> Self {
        Self { ltr, rtl }
    }

    /// Load both fonts; either failing is fatal for the batch.
    pub fn load(ltr: &Path, rtl: &Path) -> ShortsmithResult<Self> {
        Ok(Self {
            ltr: LoadedFont::load(ltr)?,
            rtl: LoadedFont::load(rtl)?,
        })
    }

    pub fn for_direction(&self, direction: Direction) -> &LoadedFont {
        match direction {
            Direction::Ltr => &self.ltr,
            Direction::Rtl => &self.rtl,
        }
    }
}

impl std::fmt::Debug for FontSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSet")
            .field("ltr", &self.ltr.path)
            .field("rtl", &self.rtl.path)
            .finish()
    }
}

impl TextMeasure for MonospaceMeasure {
    fn measure_width(&self, text: &str, size: f32) -> f32 {
        text.chars().count() as f32 * self.advance_em * size
    }
}

/// Well-known font locations used by tests that need a real font file.
#[cfg(test)]
pub(crate) fn system_test_font() -> Option<LoadedFont> {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/Library/Fonts/Arial.ttf",
        "C:/Windows/Fonts/arial.ttf",
    ]
    .iter()
    .map(Path::new)
    .find(|path| path.is_file())
    .and_then(|path| LoadedFont::load(path).ok())
}
