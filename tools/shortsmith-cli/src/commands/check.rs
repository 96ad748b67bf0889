//! Check external tools and fonts.

use shortsmith_common::config::{config_file_path, AppConfig};
use shortsmith_plan_model::plan::Direction;
use shortsmith_render_engine::tool_path;

use crate::fonts;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Shortsmith System Check");
    println!("{}", "=".repeat(50));

    let mut required_ok = true;
    for tool in ["ffmpeg", "ffprobe"] {
        match tool_path(tool) {
            Some(path) => println!("[OK] {tool}: {}", path.display()),
            None => {
                println!("[MISSING] {tool}: required for rendering");
                required_ok = false;
            }
        }
    }
    match tool_path("yt-dlp") {
        Some(path) => println!("[OK] yt-dlp: {}", path.display()),
        None => println!("[WARN] yt-dlp: not found (only needed for video-hosting URLs)"),
    }

    println!();
    for (direction, configured) in [
        (Direction::Ltr, config.fonts.ltr.as_ref()),
        (Direction::Rtl, config.fonts.rtl.as_ref()),
    ] {
        match configured {
            Some(path) if path.is_file() => {
                println!("[OK] {direction} font (configured): {}", path.display())
            }
            Some(path) => println!("[WARN] {direction} font (configured) missing: {}", path.display()),
            None => match fonts::discover(direction) {
                Some(path) => println!("[OK] {direction} font (discovered): {}", path.display()),
                None => println!(
                    "[WARN] {direction} font: none found; required for burned captions and audio sources"
                ),
            },
        }
    }

    println!();
    println!("Config file: {}", config_file_path().display());
    println!("Output directory: {}", config.output_dir.display());

    println!();
    if required_ok {
        println!("All required tools are available. Shortsmith is ready.");
    } else {
        println!("Some required tools are missing. Install ffmpeg and try again.");
    }

    Ok(())
}
