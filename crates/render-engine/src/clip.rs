//! Rendering one planned clip into its video, caption and thumbnail files.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use shortsmith_captions::srt::reflow;
use shortsmith_common::error::{ShortsmithError, ShortsmithResult};
use shortsmith_plan_model::naming::ClipOutputNames;
use shortsmith_plan_model::plan::ClipSpec;
use shortsmith_plan_model::record::ResultRecord;
use shortsmith_plan_model::target::{Geometry, RenderTarget};
use shortsmith_text_layout::font::FontSet;
use shortsmith_text_layout::thumbnail::{render_thumbnail, save_jpeg};

use crate::ffmpeg::RenderBackend;
use crate::filters::{build_audio_path, build_video_path, CaptionBurn};
use crate::probe::{MediaKind, MediaSource};

/// Caption file name inside the clip working directory.
pub const CAPTION_FILE_NAME: &str = "captions.srt";
/// Audio-path still inside the clip working directory.
pub const STILL_FILE_NAME: &str = "still.jpg";

/// Caption text size as a fraction of frame height.
const CAPTION_FONT_DIVISOR: f32 = 24.0;

/// Caption size in output pixels for a frame geometry.
pub fn caption_font_size(geometry: Geometry) -> f32 {
    geometry.height as f32 / CAPTION_FONT_DIVISOR
}

/// Batch-wide inputs shared read-only by every clip.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub source: &'a MediaSource,
    pub target: &'a RenderTarget,
    /// Required for audio-only sources; without it captions are written
    /// as given instead of reflowed.
    pub fonts: Option<&'a FontSet>,
    /// Absolute output directory.
    pub output_dir: &'a Path,
    pub burn_captions: bool,
}

/// Where in the per-clip pipeline a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipStage {
    Preparing,
    Captions,
    Thumbnail,
    Rendering,
    FrameExtraction,
}

/// How one clip ended.
#[derive(Debug)]
pub enum ClipOutcome {
    Rendered(ResultRecord),
    Skipped { reason: String },
    Failed { stage: ClipStage, error: ShortsmithError },
}

/// Renders clips against a fixed context and backend.
pub struct ClipRenderer<'a, B: RenderBackend + ?Sized> {
    ctx: RenderContext<'a>,
    backend: &'a B,
}

/// Output files created so far, removed if the clip fails.
#[derive(Default)]
struct Produced(Vec<PathBuf>);

impl Produced {
    fn track(&mut self, path: &Path) {
        self.0.push(path.to_path_buf());
    }

    fn remove_all(&self) {
        for path in &self.0 {
            match std::fs::remove_file(path) {
                Ok(()) => tracing::debug!(path = %path.display(), "Removed partial output"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial output")
                }
            }
        }
    }
}

impl fmt::Display for ClipStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClipStage::Preparing => "preparing",
            ClipStage::Captions => "captions",
            ClipStage::Thumbnail => "thumbnail",
            ClipStage::Rendering => "rendering",
            ClipStage::FrameExtraction => "frame extraction",
        };
        f.write_str(name)
    }
}

impl ClipOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, ClipOutcome::Rendered(_))
    }
}

impl<'a, B: RenderBackend + ?Sized> ClipRenderer<'a, B> {
    pub fn new(ctx: RenderContext<'a>, backend: &'a B) -> Self {
        Self { ctx, backend }
    }

    pub fn context(&self) -> &RenderContext<'a> {
        &self.ctx
    }

    /// Render one clip. Never returns early with an error: every failure is
    /// reported in the outcome and leaves no partial outputs behind.
    pub fn render(&self, clip: &ClipSpec) -> ClipOutcome {
        if let Some(reason) = clip.duration_violation() {
            tracing::warn!(clip_id = %clip.id, %reason, "Skipping clip");
            return ClipOutcome::Skipped { reason };
        }

        let started = Instant::now();
        let names = ClipOutputNames::for_clip(clip);
        let mut produced = Produced::default();
        let mut stage = ClipStage::Preparing;

        match self.run(clip, &names, &mut stage, &mut produced) {
            Ok(record) => {
                tracing::info!(
                    clip_id = %clip.id,
                    video = %record.video_path,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Rendered clip"
                );
                ClipOutcome::Rendered(record)
            }
            Err(error) => {
                produced.remove_all();
                tracing::error!(clip_id = %clip.id, %stage, error = %error, "Clip failed");
                ClipOutcome::Failed { stage, error }
            }
        }
    }

    fn run(
        &self,
        clip: &ClipSpec,
        names: &ClipOutputNames,
        stage: &mut ClipStage,
        produced: &mut Produced,
    ) -> ShortsmithResult<ResultRecord> {
        let ctx = &self.ctx;
        let workdir = tempfile::Builder::new()
            .prefix("shortsmith-clip-")
            .tempdir()?;
        let working_copy = self.copy_source(workdir.path())?;
        let window = clip.window();
        let geometry = ctx.target.geometry;

        *stage = ClipStage::Captions;
        let captions = clip.captions().map(|srt| self.prepare_captions(clip, srt));
        if let Some(text) = &captions {
            let path = names.captions_path(ctx.output_dir);
            produced.track(&path);
            std::fs::write(&path, text)?;
            if ctx.burn_captions {
                std::fs::write(workdir.path().join(CAPTION_FILE_NAME), text)?;
            }
        }
        let burn = captions
            .as_ref()
            .filter(|_| ctx.burn_captions)
            .map(|_| {
                let font = ctx.fonts.map(|fonts| fonts.for_direction(clip.direction));
                CaptionBurn {
                    file_name: CAPTION_FILE_NAME.to_string(),
                    font_size_px: caption_font_size(geometry),
                    margin_px: ctx.target.margin,
                    font_name: font.map(|f| f.family().to_string()),
                    fonts_dir: font.and_then(|f| f.directory()).map(Path::to_path_buf),
                }
            });

        let video_path = names.video_path(ctx.output_dir);
        let thumb_path = names.thumbnail_path(ctx.output_dir);

        match ctx.source.kind {
            MediaKind::Video { .. } => {
                *stage = ClipStage::Rendering;
                let invocation = build_video_path(
                    &working_copy,
                    ctx.source,
                    window,
                    geometry,
                    burn.as_ref(),
                    &video_path,
                )?;
                produced.track(&video_path);
                self.backend.render(&invocation, workdir.path())?;

                *stage = ClipStage::FrameExtraction;
                produced.track(&thumb_path);
                self.backend.extract_frame(&video_path, 0.0, &thumb_path)?;
            }
            MediaKind::Audio => {
                *stage = ClipStage::Thumbnail;
                let still = workdir.path().join(STILL_FILE_NAME);
                self.draw_title_card(clip, &still)?;

                *stage = ClipStage::Rendering;
                let invocation = build_audio_path(
                    &still,
                    &working_copy,
                    window,
                    geometry,
                    burn.as_ref(),
                    &video_path,
                )?;
                produced.track(&video_path);
                self.backend.render(&invocation, workdir.path())?;

                produced.track(&thumb_path);
                std::fs::copy(&still, &thumb_path)?;
            }
        }

        Ok(ResultRecord::new(clip, names, captions.is_some()))
    }

    /// Copy the source into the clip's working directory.
    fn copy_source(&self, workdir: &Path) -> ShortsmithResult<PathBuf> {
        let source = &self.ctx.source.path;
        let name = match source.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("source.{ext}"),
            None => "source".to_string(),
        };
        let copy = workdir.join(name);
        std::fs::copy(source, &copy)?;
        Ok(copy)
    }

    fn prepare_captions(&self, clip: &ClipSpec, srt: &str) -> String {
        let Some(fonts) = self.ctx.fonts else {
            tracing::debug!(clip_id = %clip.id, "No fonts configured; writing captions unreflowed");
            return srt.to_string();
        };
        let geometry = self.ctx.target.geometry;
        reflow(
            srt,
            clip.direction,
            fonts.for_direction(clip.direction),
            caption_font_size(geometry),
            self.ctx.target.caption_width() as f32,
        )
    }

    fn draw_title_card(&self, clip: &ClipSpec, path: &Path) -> ShortsmithResult<()> {
        let fonts = self.ctx.fonts.ok_or_else(|| {
            ShortsmithError::font("Audio-only sources need a font for the title card")
        })?;
        let target = self.ctx.target;
        let (image, layout) = render_thumbnail(
            clip.thumbnail_title(),
            clip.direction,
            target.background,
            fonts.for_direction(clip.direction),
            target.geometry,
            target.margin,
            target.max_lines,
        );
        tracing::debug!(
            clip_id = %clip.id,
            font_size = layout.font_size,
            lines = layout.lines.len(),
            "Drew title card"
        );
        save_jpeg(&image, path)
    }
}
