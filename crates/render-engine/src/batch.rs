//! Sequential batch execution over a plan.

use std::path::{Path, PathBuf};
use std::time::Instant;

use shortsmith_common::error::ShortsmithResult;
use shortsmith_plan_model::plan::{ClipSpec, Plan};
use shortsmith_plan_model::record::{write_manifest, ResultRecord};

use crate::clip::{ClipOutcome, ClipRenderer, ClipStage, RenderContext};
use crate::ffmpeg::RenderBackend;

/// Progress notifications emitted while a batch runs.
#[derive(Debug)]
pub enum BatchEvent<'c> {
    ClipStarted {
        index: usize,
        total: usize,
        clip: &'c ClipSpec,
    },
    ClipFinished {
        index: usize,
        total: usize,
        clip: &'c ClipSpec,
        outcome: &'c ClipOutcome,
    },
}

/// A clip left out because it violated a plan constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedClip {
    pub id: String,
    pub reason: String,
}

/// A clip whose rendering failed.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedClip {
    pub id: String,
    pub stage: ClipStage,
    pub message: String,
}

/// Everything a finished batch produced.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Successful clips in plan order.
    pub records: Vec<ResultRecord>,
    pub skipped: Vec<SkippedClip>,
    pub failed: Vec<FailedClip>,
    /// Manifest path; `None` when no clip succeeded.
    pub manifest: Option<PathBuf>,
    pub elapsed_secs: f64,
}

impl BatchReport {
    pub fn attempted(&self) -> usize {
        self.records.len() + self.skipped.len() + self.failed.len()
    }
}

/// Create the output directory and return its absolute path.
///
/// ffmpeg runs inside each clip's working directory, so every output path
/// handed to it must be absolute.
pub fn prepare_output_dir(dir: &Path) -> ShortsmithResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    Ok(std::fs::canonicalize(dir)?)
}

/// Runs every clip of a plan in order and writes the manifest.
pub struct BatchOrchestrator<'a, B: RenderBackend + ?Sized> {
    renderer: ClipRenderer<'a, B>,
}

impl<'a, B: RenderBackend + ?Sized> BatchOrchestrator<'a, B> {
    pub fn new(ctx: RenderContext<'a>, backend: &'a B) -> Self {
        Self {
            renderer: ClipRenderer::new(ctx, backend),
        }
    }

    /// Render every clip. Per-clip problems are collected in the report;
    /// only failing to write the manifest aborts the batch.
    pub fn run<F>(&self, plan: &Plan, mut on_event: F) -> ShortsmithResult<BatchReport>
    where
        F: FnMut(&BatchEvent<'_>),
    {
        let output_dir = self.renderer.context().output_dir;
        std::fs::create_dir_all(output_dir)?;

        let started = Instant::now();
        let total = plan.len();
        let mut report = BatchReport::default();
        tracing::info!(
            clips = total,
            output_dir = %output_dir.display(),
            "Starting batch"
        );

        for (index, clip) in plan.shorts.iter().enumerate() {
            on_event(&BatchEvent::ClipStarted { index, total, clip });
            let outcome = self.renderer.render(clip);
            on_event(&BatchEvent::ClipFinished {
                index,
                total,
                clip,
                outcome: &outcome,
            });

            match outcome {
                ClipOutcome::Rendered(record) => report.records.push(record),
                ClipOutcome::Skipped { reason } => report.skipped.push(SkippedClip {
                    id: clip.id.clone(),
                    reason,
                }),
                ClipOutcome::Failed { stage, error } => report.failed.push(FailedClip {
                    id: clip.id.clone(),
                    stage,
                    message: error.to_string(),
                }),
            }
        }

        report.manifest = write_manifest(output_dir, &report.records)?;
        report.elapsed_secs = started.elapsed().as_secs_f64();

        tracing::info!(
            rendered = report.records.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            elapsed_secs = report.elapsed_secs,
            "Batch finished"
        );
        Ok(report)
    }
}
