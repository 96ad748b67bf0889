//! Filter graphs and ffmpeg invocations for the two render paths.
//!
//! Video sources are trimmed with an input-level seek and letterboxed into
//! the target geometry. Audio-only sources are rendered as the clip's
//! thumbnail looped under a live waveform.

use std::path::{Path, PathBuf};

use shortsmith_common::error::ShortsmithResult;
use shortsmith_plan_model::plan::TimeWindow;
use shortsmith_plan_model::target::Geometry;

use crate::graph::{Chain, Filter, FilterGraph, Pad};
use crate::probe::MediaSource;

/// Integrated loudness target (LUFS).
pub const LOUDNORM_I: f64 = -14.0;
/// Loudness range target (LU).
pub const LOUDNORM_LRA: f64 = 11.0;
/// True peak ceiling (dBTP).
pub const LOUDNORM_TP: f64 = -1.5;

/// Waveform stroke colors.
pub const WAVEFORM_COLORS: &str = "#FFFFFF|#CCCCCC";
/// Waveform frame rate.
pub const WAVEFORM_RATE: u32 = 25;
/// Vertical position of the waveform band as a fraction of frame height.
pub const WAVEFORM_Y_RATIO: f64 = 0.65;

/// Final graph labels mapped into the output file.
pub const VIDEO_OUT: &str = "v_final";
pub const AUDIO_OUT: &str = "a_final";

/// libass lays out SRT captions on a 288-line script canvas.
const ASS_PLAY_RES_Y: f32 = 288.0;

/// One `-i` input, optionally seeked.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSpec {
    pub path: PathBuf,
    pub seek: Option<TimeWindow>,
}

/// Captions burned into the picture.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionBurn {
    /// Caption file, relative to the render working directory.
    pub file_name: String,
    /// Caption size in output pixels.
    pub font_size_px: f32,
    /// Distance from the bottom edge in output pixels.
    pub margin_px: u32,
    /// Family libass should draw with; the one captions were measured in.
    pub font_name: Option<String>,
    /// Extra directory libass scans for `font_name`.
    pub fonts_dir: Option<PathBuf>,
}

/// A complete ffmpeg command line, minus the binary.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderInvocation {
    pub inputs: Vec<InputSpec>,
    pub graph: FilterGraph,
    /// Graph labels mapped to the output.
    pub maps: Vec<String>,
    pub duration_secs: f64,
    pub output: PathBuf,
}

impl InputSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seek: None,
        }
    }

    pub fn seeked(path: impl Into<PathBuf>, window: TimeWindow) -> Self {
        Self {
            path: path.into(),
            seek: Some(window),
        }
    }
}

impl CaptionBurn {
    /// `force_style` override scaled from output pixels to script units.
    pub fn force_style(&self, geometry: Geometry) -> String {
        let to_script = ASS_PLAY_RES_Y / geometry.height as f32;
        let mut style = String::new();
        if let Some(name) = &self.font_name {
            // Commas separate style fields.
            style.push_str(&format!("FontName={},", name.replace(',', " ")));
        }
        style.push_str(&format!(
            "FontSize={:.1},MarginV={},Alignment=2,BorderStyle=1,Outline=2",
            self.font_size_px * to_script,
            (self.margin_px as f32 * to_script).round() as u32,
        ));
        style
    }

    fn filter(&self, geometry: Geometry) -> Filter {
        let mut filter = Filter::new("subtitles").named("filename", &self.file_name);
        if let Some(dir) = &self.fonts_dir {
            filter = filter.named("fontsdir", dir.display().to_string());
        }
        filter.named("force_style", self.force_style(geometry))
    }
}

impl RenderInvocation {
    fn new(
        inputs: Vec<InputSpec>,
        graph: FilterGraph,
        duration_secs: f64,
        output: &Path,
    ) -> ShortsmithResult<Self> {
        graph.validate()?;
        let maps = [VIDEO_OUT, AUDIO_OUT]
            .into_iter()
            .filter(|label| graph.sink_labels().iter().any(|sink| sink == label))
            .map(str::to_string)
            .collect();
        Ok(Self {
            inputs,
            graph,
            maps,
            duration_secs,
            output: output.to_path_buf(),
        })
    }

    /// Arguments for `ffmpeg`, progress reporting on stdout included.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args: Vec<String> = [
            "-y",
            "-hide_banner",
            "-loglevel",
            "error",
            "-nostats",
            "-progress",
            "pipe:1",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        for input in &self.inputs {
            if let Some(window) = input.seek {
                args.push("-ss".to_string());
                args.push(format_secs(window.start_secs));
                args.push("-to".to_string());
                args.push(format_secs(window.end_secs));
            }
            args.push("-i".to_string());
            args.push(input.path.display().to_string());
        }

        args.push("-filter_complex".to_string());
        args.push(self.graph.to_filter_complex());
        for label in &self.maps {
            args.push("-map".to_string());
            args.push(format!("[{label}]"));
        }
        args.push("-t".to_string());
        args.push(format_secs(self.duration_secs));
        args.extend(codec_args());
        args.push(self.output.display().to_string());
        args
    }
}

/// H.264/AAC output settings shared by both paths.
pub fn codec_args() -> Vec<String> {
    [
        "-c:v",
        "libx264",
        "-preset",
        "fast",
        "-crf",
        "22",
        "-pix_fmt",
        "yuv420p",
        "-c:a",
        "aac",
        "-b:a",
        "128k",
        "-movflags",
        "+faststart",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn loudnorm() -> Filter {
    Filter::new("loudnorm")
        .named("I", LOUDNORM_I)
        .named("LRA", LOUDNORM_LRA)
        .named("TP", LOUDNORM_TP)
}

/// Seconds without float noise: `10`, `10.5`, `10.125`.
fn format_secs(secs: f64) -> String {
    let rounded = (secs * 1000.0).round() / 1000.0;
    rounded.to_string()
}

/// Trim, letterbox and normalize a clip of a source with a video stream.
pub fn build_video_path(
    input: &Path,
    source: &MediaSource,
    window: TimeWindow,
    geometry: Geometry,
    captions: Option<&CaptionBurn>,
    output: &Path,
) -> ShortsmithResult<RenderInvocation> {
    let (w, h) = (geometry.width, geometry.height);
    let mut video = Chain::new(vec![Pad::video(0)])
        .filter(
            Filter::new("scale")
                .arg(w)
                .arg(h)
                .named("force_original_aspect_ratio", "decrease"),
        )
        .filter(
            Filter::new("pad")
                .arg(w)
                .arg(h)
                .arg("(ow-iw)/2")
                .arg("(oh-ih)/2")
                .named("color", "black"),
        )
        .filter(Filter::new("setsar").arg(1));
    if let Some(burn) = captions {
        video = video.filter(burn.filter(geometry));
    }

    let mut graph = FilterGraph::new();
    graph.push(video.output(Pad::label(VIDEO_OUT)));
    if source.has_audio {
        graph.push(
            Chain::new(vec![Pad::audio(0)])
                .filter(loudnorm())
                .output(Pad::label(AUDIO_OUT)),
        );
    }

    RenderInvocation::new(
        vec![InputSpec::seeked(input, window)],
        graph,
        window.duration_secs(),
        output,
    )
}

/// Render an audio-only clip as a looped still with a waveform overlay.
///
/// Input 0 is the still, input 1 the full audio source; the audio is
/// trimmed inside the graph.
pub fn build_audio_path(
    still: &Path,
    input: &Path,
    window: TimeWindow,
    geometry: Geometry,
    captions: Option<&CaptionBurn>,
    output: &Path,
) -> ShortsmithResult<RenderInvocation> {
    let (w, h) = (geometry.width, geometry.height);
    let mut graph = FilterGraph::new();

    graph.push(
        Chain::new(vec![Pad::video(0)])
            .filter(Filter::new("scale").arg(w).arg(h))
            .filter(
                Filter::new("loop")
                    .named("loop", -1)
                    .named("size", 1)
                    .named("start", 0),
            )
            .output(Pad::label("bg")),
    );
    graph.push(
        Chain::new(vec![Pad::audio(1)])
            .filter(
                Filter::new("atrim")
                    .named("start", format_secs(window.start_secs))
                    .named("end", format_secs(window.end_secs)),
            )
            .filter(Filter::new("asetpts").arg("PTS-STARTPTS"))
            .output(Pad::label("a_trimmed")),
    );
    graph.push(
        Chain::new(vec![Pad::label("a_trimmed")])
            .filter(Filter::new("asplit").arg(2))
            .output(Pad::label("a"))
            .output(Pad::label("a_wave")),
    );
    graph.push(
        Chain::new(vec![Pad::label("a_wave")])
            .filter(
                Filter::new("showwaves")
                    .named("s", format!("{w}x{}", geometry.waveform_height()))
                    .named("mode", "line")
                    .named("colors", WAVEFORM_COLORS)
                    .named("rate", WAVEFORM_RATE),
            )
            .filter(Filter::new("format").arg("yuva420p"))
            .output(Pad::label("wave")),
    );

    let mut overlay = Chain::new(vec![Pad::label("bg"), Pad::label("wave")]).filter(
        Filter::new("overlay")
            .arg("(W-w)/2")
            .arg(format!("H*{WAVEFORM_Y_RATIO}")),
    );
    if let Some(burn) = captions {
        overlay = overlay.filter(burn.filter(geometry));
    }
    graph.push(overlay.output(Pad::label(VIDEO_OUT)));
    graph.push(
        Chain::new(vec![Pad::label("a")])
            .filter(loudnorm())
            .output(Pad::label(AUDIO_OUT)),
    );

    RenderInvocation::new(
        vec![InputSpec::new(still), InputSpec::new(input)],
        graph,
        window.duration_secs(),
        output,
    )
}
