//! Show what a media file contains.

use std::path::PathBuf;

use shortsmith_render_engine::{probe_media, MediaKind};

pub fn run(media: PathBuf) -> anyhow::Result<()> {
    let source = probe_media(&media)?;

    println!("Media: {}", source.path.display());
    match source.kind {
        MediaKind::Video { width, height } => {
            println!("  Kind: video");
            println!("  Resolution: {width}x{height}");
        }
        MediaKind::Audio => println!("  Kind: audio only (clips render as title card + waveform)"),
    }
    println!("  Audio: {}", if source.has_audio { "yes" } else { "no" });

    Ok(())
}
