//! ffmpeg process execution.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use shortsmith_common::error::{ShortsmithError, ShortsmithResult};

use crate::filters::RenderInvocation;

/// Progress callback for a single encode.
pub type EncodeProgressCallback = Box<dyn Fn(EncodeProgress) + Send>;

/// Progress of the encode currently running.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Output timestamp reached so far.
    pub out_time_secs: f64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    /// ffmpeg reported `progress=end`.
    pub complete: bool,
}

/// Executes render invocations.
///
/// The batch only talks to ffmpeg through this trait, so tests can swap in
/// a backend that writes placeholder files.
pub trait RenderBackend {
    /// Run an invocation with `workdir` as the process working directory.
    fn render(&self, invocation: &RenderInvocation, workdir: &Path) -> ShortsmithResult<()>;

    /// Write one frame of `video` at `at_secs` to `output` as JPEG.
    fn extract_frame(&self, video: &Path, at_secs: f64, output: &Path) -> ShortsmithResult<()>;
}

/// The real backend: spawns the `ffmpeg` binary.
#[derive(Default)]
pub struct FfmpegBackend {
    progress: Option<EncodeProgressCallback>,
}

/// Encodes whose output clock stands still this long get a warning.
const STALL_WARNING: Duration = Duration::from_secs(10);

/// Resolve a tool on `PATH`.
pub fn tool_path(binary: &str) -> Option<PathBuf> {
    which::which(binary).ok()
}

/// Fail unless both ffmpeg and ffprobe are installed.
pub fn ensure_media_tools() -> ShortsmithResult<()> {
    let missing: Vec<&str> = ["ffmpeg", "ffprobe"]
        .into_iter()
        .filter(|tool| tool_path(tool).is_none())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ShortsmithError::dependency_missing(format!(
            "{} not found on PATH",
            missing.join(" and ")
        )))
    }
}

fn spawn_error(e: std::io::Error) -> ShortsmithError {
    if e.kind() == std::io::ErrorKind::NotFound {
        ShortsmithError::dependency_missing("ffmpeg not found on PATH")
    } else {
        ShortsmithError::render(format!("Failed to start ffmpeg: {e}"))
    }
}

/// Collect stderr on its own thread; ffmpeg stalls once the pipe is full.
fn collect_stderr(stderr: impl Read + Send + 'static) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut output = String::new();
        match BufReader::new(stderr).read_to_string(&mut output) {
            Ok(_) => output,
            Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
        }
    })
}

impl FfmpegBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(progress: EncodeProgressCallback) -> Self {
        Self {
            progress: Some(progress),
        }
    }

    fn run_ffmpeg(&self, invocation: &RenderInvocation, workdir: &Path) -> ShortsmithResult<()> {
        let args = invocation.to_ffmpeg_args();
        tracing::debug!(args = ?args, workdir = %workdir.display(), "Running ffmpeg");

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(ShortsmithError::render("Failed to capture ffmpeg output"));
        };
        let stderr_output = collect_stderr(stderr);

        let mut monitor = EncodeMonitor::new(invocation.duration_secs);
        for line in BufReader::new(stdout).lines() {
            let line = line.map_err(|e| {
                ShortsmithError::render(format!("Failed reading ffmpeg progress: {e}"))
            })?;
            if let (Some(report), Some(cb)) = (monitor.feed(&line), self.progress.as_ref()) {
                cb(report);
            }
        }

        let status = child
            .wait()
            .map_err(|e| ShortsmithError::render(format!("Failed to wait on ffmpeg: {e}")))?;
        let diagnostics = stderr_output
            .join()
            .unwrap_or_else(|_| "<ffmpeg stderr reader panicked>".to_string());

        if !status.success() {
            return Err(ShortsmithError::render(format!(
                "ffmpeg failed ({status}): {}",
                diagnostics.trim()
            )));
        }

        tracing::debug!(
            output = %invocation.output.display(),
            elapsed_ms = monitor.started.elapsed().as_millis() as u64,
            "ffmpeg finished"
        );
        Ok(())
    }
}

impl RenderBackend for FfmpegBackend {
    fn render(&self, invocation: &RenderInvocation, workdir: &Path) -> ShortsmithResult<()> {
        self.run_ffmpeg(invocation, workdir)
    }

    fn extract_frame(&self, video: &Path, at_secs: f64, output: &Path) -> ShortsmithResult<()> {
        let result = Command::new("ffmpeg")
            .args(["-y", "-hide_banner", "-loglevel", "error", "-ss"])
            .arg(at_secs.to_string())
            .arg("-i")
            .arg(video)
            .args(["-frames:v", "1", "-q:v", "2"])
            .arg(output)
            .stdin(Stdio::null())
            .output()
            .map_err(spawn_error)?;

        if !result.status.success() {
            return Err(ShortsmithError::render(format!(
                "Frame extraction from {} failed ({}): {}",
                video.display(),
                result.status,
                String::from_utf8_lossy(&result.stderr).trim()
            )));
        }
        Ok(())
    }
}

/// Follows one encode through ffmpeg's `-progress` key=value blocks.
struct EncodeMonitor {
    expected_secs: f64,
    started: Instant,
    out_time_secs: f64,
    complete: bool,
    last_advance: Instant,
}

impl EncodeMonitor {
    fn new(expected_secs: f64) -> Self {
        let now = Instant::now();
        Self {
            expected_secs,
            started: now,
            out_time_secs: 0.0,
            complete: false,
            last_advance: now,
        }
    }

    /// Consume one line. A report is produced when a block closes with its
    /// `progress=` line.
    fn feed(&mut self, line: &str) -> Option<EncodeProgress> {
        let (key, value) = line.trim().split_once('=')?;
        match key {
            // Both carry microseconds, whatever the suffix says.
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.advance_to(us / 1_000_000.0);
                }
                None
            }
            "progress" => {
                self.complete = value == "end";
                self.warn_if_stalled();
                Some(self.report(self.started.elapsed().as_secs_f64()))
            }
            _ => None,
        }
    }

    fn advance_to(&mut self, secs: f64) {
        if secs > self.out_time_secs + 0.001 {
            self.last_advance = Instant::now();
        }
        self.out_time_secs = secs;
    }

    fn warn_if_stalled(&mut self) {
        if self.complete || self.last_advance.elapsed() < STALL_WARNING {
            return;
        }
        tracing::warn!(
            out_time_secs = self.out_time_secs,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "ffmpeg output clock has not advanced for {}s",
            STALL_WARNING.as_secs()
        );
        self.last_advance = Instant::now();
    }

    fn report(&self, elapsed_secs: f64) -> EncodeProgress {
        if self.complete {
            return EncodeProgress {
                progress: 1.0,
                out_time_secs: self.out_time_secs,
                eta_secs: 0.0,
                complete: true,
            };
        }
        let progress = if self.expected_secs > 0.0 {
            (self.out_time_secs / self.expected_secs).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let eta_secs = if progress > 0.0 {
            (elapsed_secs * (1.0 - progress) / progress).max(0.0)
        } else {
            0.0
        };
        EncodeProgress {
            progress,
            out_time_secs: self.out_time_secs,
            eta_secs,
            complete: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_reports_once_per_block() {
        let mut monitor = EncodeMonitor::new(6.0);
        assert!(monitor.feed("frame=75").is_none());
        assert!(monitor.feed("out_time_us=3000000").is_none());
        let report = monitor.feed("progress=continue\n").unwrap();
        assert!((report.out_time_secs - 3.0).abs() < 1e-9);
        assert!((report.progress - 0.5).abs() < 1e-9);
        assert!(!report.complete);

        monitor.feed("out_time_ms=5900000");
        let done = monitor.feed("progress=end").unwrap();
        assert!(done.complete);
        assert_eq!(done.progress, 1.0);
        assert_eq!(done.eta_secs, 0.0);
    }

    #[test]
    fn test_monitor_ignores_noise() {
        let mut monitor = EncodeMonitor::new(6.0);
        assert!(monitor.feed("").is_none());
        assert!(monitor.feed("not a progress line").is_none());
        assert!(monitor.feed("out_time_us=N/A").is_none());
        assert_eq!(monitor.out_time_secs, 0.0);
    }

    #[test]
    fn test_eta_from_elapsed_time() {
        let mut monitor = EncodeMonitor::new(6.0);
        monitor.advance_to(3.0);
        let report = monitor.report(2.0);
        assert!((report.eta_secs - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_duration_reports_no_progress() {
        let monitor = EncodeMonitor::new(0.0);
        let report = monitor.report(1.0);
        assert_eq!(report.progress, 0.0);
        assert_eq!(report.eta_secs, 0.0);
    }
}
