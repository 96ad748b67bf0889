//! Title-card thumbnails.
//!
//! A thumbnail is a solid background with the clip title centered on it.
//! Titles start large (`height / 12`) and shrink in fixed steps until they
//! fit in `max_lines` lines or the size floor is reached.

use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;

use shortsmith_common::error::{ShortsmithError, ShortsmithResult};
use shortsmith_plan_model::plan::Direction;
use shortsmith_plan_model::target::{Color, Geometry};

use crate::font::{LoadedFont, TextMeasure};
use crate::shaping::reshape_for_display;
use crate::wrap::wrap_text;

/// Smallest title font size; over-long titles overflow at this size.
pub const MIN_TITLE_FONT_SIZE: u32 = 10;
/// Amount the font size drops per fitting attempt.
pub const TITLE_FONT_SIZE_STEP: u32 = 2;
/// Title text color.
pub const TITLE_COLOR: Color = Color::WHITE;

/// Result of fitting a title into the thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleLayout {
    /// Chosen font size (pixels per em).
    pub font_size: u32,
    /// Wrapped lines in logical order.
    pub lines: Vec<String>,
}

impl TitleLayout {
    /// Whether shrinking stopped at the size floor.
    pub fn at_floor(&self) -> bool {
        self.font_size <= MIN_TITLE_FONT_SIZE
    }
}

/// Choose the largest font size (down to the floor) whose wrap fits in
/// `max_lines`.
pub fn fit_title(
    title: &str,
    direction: Direction,
    measure: &dyn TextMeasure,
    geometry: Geometry,
    margin: u32,
    max_lines: usize,
) -> TitleLayout {
    let max_width = geometry.width.saturating_sub(2 * margin) as f32;
    let mut font_size = geometry.height / 12;
    let mut lines = wrap_text(title, direction, measure, font_size as f32, max_width);

    while lines.len() > max_lines && font_size > MIN_TITLE_FONT_SIZE {
        font_size = font_size
            .saturating_sub(TITLE_FONT_SIZE_STEP)
            .max(MIN_TITLE_FONT_SIZE);
        lines = wrap_text(title, direction, measure, font_size as f32, max_width);
    }

    if lines.len() > max_lines {
        tracing::warn!(
            lines = lines.len(),
            max_lines,
            font_size,
            "Thumbnail title still overflows at minimum font size"
        );
    }

    TitleLayout { font_size, lines }
}

/// Render a title card: fitted title, each line centered, block centered.
pub fn render_thumbnail(
    title: &str,
    direction: Direction,
    background: Color,
    font: &LoadedFont,
    geometry: Geometry,
    margin: u32,
    max_lines: usize,
) -> (RgbImage, TitleLayout) {
    let layout = fit_title(title, direction, font, geometry, margin, max_lines);
    let size = layout.font_size as f32;
    let scale = font.scale_for(size);
    let line_height = font.line_height(size);

    let mut image = RgbImage::from_pixel(geometry.width, geometry.height, to_rgb(background));
    let block_height = line_height * layout.lines.len() as f32;
    let mut y = (geometry.height as f32 - block_height) / 2.0;

    for line in &layout.lines {
        let display = reshape_for_display(line, direction);
        let width = font.measure_width(&display, size);
        let x = (geometry.width as f32 - width) / 2.0;
        draw_text_mut(
            &mut image,
            to_rgb(TITLE_COLOR),
            x.round() as i32,
            y.round() as i32,
            scale,
            font.font(),
            &display,
        );
        y += line_height;
    }

    (image, layout)
}

/// Save a thumbnail as JPEG.
pub fn save_jpeg(image: &RgbImage, path: &Path) -> ShortsmithResult<()> {
    image
        .save_with_format(path, ImageFormat::Jpeg)
        .map_err(|e| ShortsmithError::render(format!("Failed to write {}: {e}", path.display())))
}

fn to_rgb(color: Color) -> Rgb<u8> {
    Rgb([color.r, color.g, color.b])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{system_test_font, MonospaceMeasure};
    use proptest::prelude::*;

    const HALF_EM: MonospaceMeasure = MonospaceMeasure { advance_em: 0.5 };
    const PORTRAIT: Geometry = Geometry {
        width: 1080,
        height: 1920,
    };

    #[test]
    fn test_short_title_keeps_starting_size() {
        let layout = fit_title("Hello World", Direction::Ltr, &HALF_EM, PORTRAIT, 40, 2);
        assert_eq!(layout.font_size, 160);
        assert_eq!(layout.lines, vec!["Hello World"]);
    }

    #[test]
    fn test_long_title_shrinks_to_fit() {
        // 12 chars per line at 160px; 39 chars needs a smaller size for 2 lines.
        let title = "one two three four five six seven eight";
        let layout = fit_title(title, Direction::Ltr, &HALF_EM, PORTRAIT, 40, 2);
        assert!(layout.font_size < 160);
        assert!(layout.lines.len() <= 2);
        assert!(!layout.at_floor());
        assert_eq!(layout.lines.join(" "), title);
    }

    #[test]
    fn test_pathological_title_stops_at_floor() {
        let title = "word ".repeat(2_000);
        let layout = fit_title(&title, Direction::Ltr, &HALF_EM, PORTRAIT, 40, 2);
        assert_eq!(layout.font_size, MIN_TITLE_FONT_SIZE);
        assert!(layout.at_floor());
        assert!(layout.lines.len() > 2);
    }

    #[test]
    fn test_odd_start_size_lands_on_floor() {
        // 138 / 12 = 11 -> one step lands on the floor instead of below it.
        let geometry = Geometry::new(100, 138);
        let layout = fit_title(&"x ".repeat(200), Direction::Ltr, &HALF_EM, geometry, 10, 1);
        assert_eq!(layout.font_size, MIN_TITLE_FONT_SIZE);
    }

    #[test]
    fn test_render_with_real_font() {
        let Some(font) = system_test_font() else {
            return;
        };
        let geometry = Geometry::new(360, 640);
        let background = Color::rgb(0x10, 0x11, 0x14);
        let (image, layout) = render_thumbnail(
            "A considerably long title that needs several lines to fit anywhere",
            Direction::Ltr,
            background,
            &font,
            geometry,
            20,
            2,
        );
        assert_eq!(image.dimensions(), (360, 640));
        assert!(layout.lines.len() <= 2 || layout.at_floor());
        assert_eq!(image.get_pixel(0, 0), &Rgb([0x10, 0x11, 0x14]));
        assert!(image.pixels().any(|p| p.0[0] > 200));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thumb.jpg");
        save_jpeg(&image, &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    proptest! {
        #[test]
        fn prop_line_limit_holds_above_floor(
            word_count in 0usize..120,
            word_len in 1usize..14,
            max_lines in 1usize..4,
        ) {
            let title = vec!["w".repeat(word_len); word_count].join(" ");
            let layout = fit_title(&title, Direction::Ltr, &HALF_EM, PORTRAIT, 40, max_lines);
            prop_assert!(layout.lines.len() <= max_lines || layout.at_floor());
            prop_assert!(layout.font_size >= MIN_TITLE_FONT_SIZE);
        }
    }
}
