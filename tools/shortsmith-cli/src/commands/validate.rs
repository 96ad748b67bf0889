//! Validate a plan without rendering.

use std::path::PathBuf;

use shortsmith_captions::srt::{format_srt_time, parse_track};
use shortsmith_plan_model::naming::ClipOutputNames;
use shortsmith_plan_model::plan::Plan;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating plan at: {}", path.display());

    let plan = Plan::load(&path)?;
    println!("  Clips: {}", plan.len());
    println!();

    let mut skipped = 0usize;
    let mut warnings = 0usize;
    for clip in &plan.shorts {
        let names = ClipOutputNames::for_clip(clip);
        if let Some(reason) = clip.duration_violation() {
            println!("[SKIP] {}: {reason}", clip.id);
            skipped += 1;
            continue;
        }

        println!(
            "[OK] {} ({:.1}s, {}) -> {}",
            clip.id,
            clip.duration_secs(),
            clip.direction,
            names.video
        );
        if let Some(srt) = clip.captions() {
            let track = parse_track(srt);
            match (track.cues.first(), track.cues.last()) {
                (Some(first), Some(last)) => println!(
                    "     Captions: {} cue(s), {} --> {}",
                    track.cues.len(),
                    format_srt_time(first.start_secs),
                    format_srt_time(last.end_secs)
                ),
                _ => println!("     Captions: no timed cues"),
            }
            if track.malformed_blocks > 0 {
                println!(
                    "[WARN] {}: {} caption block(s) without a valid time range will be kept verbatim",
                    clip.id, track.malformed_blocks
                );
                warnings += 1;
            }
        }
    }

    println!();
    println!(
        "{} clip(s) will render, {} will be skipped, {} warning(s).",
        plan.len() - skipped,
        skipped,
        warnings
    );

    Ok(())
}
