//! Render every clip in a plan.

use std::path::PathBuf;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use shortsmith_common::config::{AppConfig, RenderDefaults};
use shortsmith_common::error::ShortsmithError;
use shortsmith_plan_model::plan::Plan;
use shortsmith_plan_model::target::RenderTarget;
use shortsmith_render_engine::{
    ensure_media_tools, prepare_output_dir, probe_media, BatchEvent, BatchOrchestrator,
    ClipOutcome, EncodeProgress, FfmpegBackend, MediaKind, RenderContext,
};

use crate::{fonts, source};

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Path to the plan JSON
    #[arg(long)]
    plan: PathBuf,

    /// Local path, direct URL or video-hosting URL of the source media
    #[arg(long)]
    media: String,

    /// Output directory
    #[arg(long)]
    outdir: Option<PathBuf>,

    /// Burn captions into the video
    #[arg(long, overrides_with = "no_burn_captions")]
    burn_captions: bool,

    /// Keep captions only as sidecar .srt files
    #[arg(long, overrides_with = "burn_captions")]
    no_burn_captions: bool,

    /// Font for left-to-right text
    #[arg(long)]
    font_ltr: Option<PathBuf>,

    /// Font for right-to-left text
    #[arg(long)]
    font_rtl: Option<PathBuf>,

    /// Thumbnail background color (#RRGGBB)
    #[arg(long)]
    thumb_bg: Option<String>,

    /// Output size as WIDTHxHEIGHT
    #[arg(long)]
    size: Option<String>,

    /// Thumbnail text margin in pixels
    #[arg(long)]
    margin: Option<u32>,

    /// Maximum thumbnail title lines
    #[arg(long)]
    max_lines: Option<usize>,
}

impl RenderArgs {
    fn render_defaults(&self, base: &RenderDefaults) -> RenderDefaults {
        let mut merged = base.clone();
        if let Some(size) = &self.size {
            merged.size = size.clone();
        }
        if let Some(bg) = &self.thumb_bg {
            merged.thumb_bg = bg.clone();
        }
        if let Some(margin) = self.margin {
            merged.margin = margin;
        }
        if let Some(max_lines) = self.max_lines {
            merged.max_lines = max_lines;
        }
        if self.burn_captions {
            merged.burn_captions = true;
        } else if self.no_burn_captions {
            merged.burn_captions = false;
        }
        merged
    }
}

pub fn run(args: RenderArgs, config: &AppConfig) -> anyhow::Result<()> {
    render_batch(args, config).inspect_err(|err| {
        if let Some(line) = fatal_diagnostic(err) {
            eprintln!("{line}");
        }
    })
}

/// Prefixed line for errors that abort the run as a whole.
fn fatal_diagnostic(err: &anyhow::Error) -> Option<String> {
    let err = err.downcast_ref::<ShortsmithError>()?;
    err.is_batch_fatal()
        .then(|| format!("[FATAL] {err}; aborting before any clip was rendered"))
}

fn render_batch(args: RenderArgs, config: &AppConfig) -> anyhow::Result<()> {
    let defaults = args.render_defaults(&config.render);
    let target = RenderTarget::from_defaults(&defaults)?;
    ensure_media_tools()?;

    let plan = Plan::load(&args.plan)?;
    println!("Loaded {} clip(s) from {}", plan.len(), args.plan.display());

    let batch_dir = tempfile::Builder::new().prefix("shortsmith-").tempdir()?;
    let media = source::acquire(&args.media, batch_dir.path())?;
    let media_source = probe_media(&media)?;
    match media_source.kind {
        MediaKind::Video { width, height } => {
            println!("Source: video {width}x{height} ({})", media.display())
        }
        MediaKind::Audio => println!("Source: audio only ({})", media.display()),
    }

    let needs_fonts = defaults.burn_captions || media_source.is_audio_only();
    let font_set = fonts::resolve(
        args.font_ltr.as_deref().or(config.fonts.ltr.as_deref()),
        args.font_rtl.as_deref().or(config.fonts.rtl.as_deref()),
        needs_fonts,
    )?;

    let output_dir = prepare_output_dir(args.outdir.as_ref().unwrap_or(&config.output_dir))?;
    println!("Output: {}", output_dir.display());
    println!("  Size: {}", target.geometry);
    println!("  Burn captions: {}", defaults.burn_captions);

    let ctx = RenderContext {
        source: &media_source,
        target: &target,
        fonts: font_set.as_ref(),
        output_dir: &output_dir,
        burn_captions: defaults.burn_captions,
    };

    let bar = ProgressBar::new(plan.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {prefix} {msg}")?
            .progress_chars("=> "),
    );

    let encode_bar = bar.clone();
    let backend = FfmpegBackend::with_progress(Box::new(move |p: EncodeProgress| {
        encode_bar.set_message(format!("{:.0}% (ETA {:.0}s)", p.progress * 100.0, p.eta_secs));
    }));

    let report = BatchOrchestrator::new(ctx, &backend).run(&plan, |event| match event {
        BatchEvent::ClipStarted { clip, .. } => {
            bar.set_prefix(clip.id.clone());
            bar.set_message("");
        }
        BatchEvent::ClipFinished { clip, outcome, .. } => {
            match outcome {
                ClipOutcome::Rendered(record) => {
                    bar.println(format!("[OK] {} -> {}", clip.id, record.video_path))
                }
                ClipOutcome::Skipped { reason } => {
                    bar.println(format!("[SKIP] {}: {reason}", clip.id))
                }
                ClipOutcome::Failed { stage, error } => {
                    bar.println(format!("[FAIL] {} ({stage}): {error}", clip.id))
                }
            }
            bar.inc(1);
        }
    })?;
    bar.finish_and_clear();

    println!();
    println!(
        "Done in {:.1}s: {} rendered, {} skipped, {} failed",
        report.elapsed_secs,
        report.records.len(),
        report.skipped.len(),
        report.failed.len()
    );
    match &report.manifest {
        Some(path) => println!("Manifest: {}", path.display()),
        None => println!("[WARN] No clip rendered; manifest not written"),
    }

    Ok(())
}
