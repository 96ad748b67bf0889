//! SRT parsing and width-aware reflow.

use std::sync::OnceLock;

use regex::Regex;

use shortsmith_plan_model::plan::Direction;
use shortsmith_text_layout::font::TextMeasure;
use shortsmith_text_layout::wrap::wrap_to_width;

/// A single timed caption.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    /// Sequence number from the index line, if it parsed.
    pub index: Option<u32>,
    pub start_secs: f64,
    pub end_secs: f64,
    /// Text lines joined with `\n`.
    pub text: String,
}

/// Result of reading a caption track.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTrack {
    /// Well-formed cues in file order.
    pub cues: Vec<Cue>,
    /// Number of non-empty blocks without a valid time range.
    pub malformed_blocks: usize,
}

/// A block of the track plus the blank-line run that followed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawBlock<'a> {
    body: &'a str,
    separator: &'a str,
}

fn separator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\r?\n\s*\r?\n").expect("valid separator regex"))
}

fn time_range_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*(\d+):(\d{2}):(\d{2})[,.](\d{1,3})\s*-->\s*(\d+):(\d{2}):(\d{2})[,.](\d{1,3})",
        )
        .expect("valid time range regex")
    })
}

/// Split a track into blocks, keeping every separator verbatim so the
/// blocks concatenate back to the original text.
fn split_blocks(track: &str) -> Vec<RawBlock<'_>> {
    let mut blocks = Vec::new();
    let mut cursor = 0;
    for sep in separator_regex().find_iter(track) {
        blocks.push(RawBlock {
            body: &track[cursor..sep.start()],
            separator: sep.as_str(),
        });
        cursor = sep.end();
    }
    blocks.push(RawBlock {
        body: &track[cursor..],
        separator: "",
    });
    blocks
}

/// Parse the time range line of a cue into `(start, end)` seconds.
pub fn parse_time_range(line: &str) -> Option<(f64, f64)> {
    let caps = time_range_regex().captures(line)?;
    let field = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or("0");
    let to_secs = |h: &str, m: &str, s: &str, frac: &str| -> Option<f64> {
        let hours: f64 = h.parse().ok()?;
        let minutes: f64 = m.parse().ok()?;
        let seconds: f64 = s.parse().ok()?;
        // "5" means 500 ms, "05" means 50 ms.
        let millis: f64 = format!("{frac:0<3}").parse().ok()?;
        Some(hours * 3600.0 + minutes * 60.0 + seconds + millis / 1000.0)
    };
    let start = to_secs(field(1), field(2), field(3), field(4))?;
    let end = to_secs(field(5), field(6), field(7), field(8))?;
    Some((start, end))
}

/// Format seconds as SRT timestamp: HH:MM:SS,mmm
pub fn format_srt_time(secs: f64) -> String {
    let total_ms = (secs * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Read the well-formed cues of a track.
pub fn parse_track(track: &str) -> ParsedTrack {
    let mut parsed = ParsedTrack::default();
    for block in split_blocks(track) {
        let body = block.body.trim();
        if body.is_empty() {
            continue;
        }
        let lines: Vec<&str> = body.split('\n').collect();
        let range = lines.get(1).and_then(|line| parse_time_range(line));
        match range {
            Some((start_secs, end_secs)) => parsed.cues.push(Cue {
                index: lines[0].trim().parse().ok(),
                start_secs,
                end_secs,
                text: lines[2..]
                    .iter()
                    .map(|line| line.trim())
                    .collect::<Vec<_>>()
                    .join("\n"),
            }),
            None => parsed.malformed_blocks += 1,
        }
    }
    parsed
}

/// Re-wrap every cue's text to fit `max_width` pixels at `size`.
///
/// Each cue's text lines are flattened into one word stream before wrapping,
/// so the original line breaks do not survive. Index and time range lines,
/// block separators and every block without a valid time range are copied
/// through unchanged.
pub fn reflow(
    track: &str,
    direction: Direction,
    measure: &dyn TextMeasure,
    size: f32,
    max_width: f32,
) -> String {
    let mut output = String::with_capacity(track.len());
    let mut rewrapped = 0usize;

    for block in split_blocks(track) {
        let lines: Vec<&str> = block.body.trim().split('\n').collect();
        let valid = lines.len() >= 2 && parse_time_range(lines[1]).is_some();
        if !valid {
            output.push_str(block.body);
            output.push_str(block.separator);
            continue;
        }

        let words = lines[2..]
            .iter()
            .flat_map(|line| line.split_whitespace());
        let wrapped = wrap_to_width(words, direction, measure, size, max_width);

        output.push_str(lines[0]);
        output.push('\n');
        output.push_str(lines[1]);
        output.push('\n');
        output.push_str(&wrapped.join("\n"));
        output.push_str(block.separator);
        rewrapped += 1;
    }

    tracing::debug!(cues = rewrapped, max_width, size, "Reflowed caption track");
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use shortsmith_text_layout::font::MonospaceMeasure;

    // One char = 10px at size 10.
    const MONO: MonospaceMeasure = MonospaceMeasure { advance_em: 1.0 };

    #[test]
    fn test_time_formatting() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
        assert_eq!(format_srt_time(3661.5), "01:01:01,500");
    }

    #[test]
    fn test_parse_time_range() {
        let (start, end) = parse_time_range("00:00:01,250 --> 00:01:02.5").unwrap();
        assert!((start - 1.25).abs() < 1e-9);
        assert!((end - 62.5).abs() < 1e-9);
        assert!(parse_time_range("00:00:01 --> 00:00:02").is_none());
        assert!(parse_time_range("not a time").is_none());
    }

    #[test]
    fn test_reflow_flattens_and_rewraps() {
        let track = "1\n00:00:00,000 --> 00:00:02,000\naa bb\ncc dd ee\n\n2\n00:00:02,000 --> 00:00:04,000\nff\n";
        let out = reflow(track, Direction::Ltr, &MONO, 10.0, 80.0);
        assert_eq!(
            out,
            "1\n00:00:00,000 --> 00:00:02,000\naa bb cc\ndd ee\n\n2\n00:00:02,000 --> 00:00:04,000\nff"
        );
    }

    #[test]
    fn test_reflow_preserves_timing() {
        let track = "1\n00:00:00,500 --> 00:00:02,250\na fairly long caption line that will not fit\n\n\
                     2\n00:00:03,000 --> 00:00:05,000\nshort\n";
        let cues = parse_track(track).cues;
        let reflowed = reflow(track, Direction::Ltr, &MONO, 10.0, 120.0);

        let parsed = parse_track(&reflowed);
        assert_eq!(parsed.malformed_blocks, 0);
        assert_eq!(parsed.cues.len(), 2);
        for (before, after) in cues.iter().zip(&parsed.cues) {
            assert_eq!(before.start_secs, after.start_secs);
            assert_eq!(before.end_secs, after.end_secs);
            assert_eq!(before.text.split_whitespace().collect::<Vec<_>>(),
                after.text.split_whitespace().collect::<Vec<_>>());
        }
        assert!(parsed.cues[0].text.lines().count() > 1);
    }

    #[test]
    fn test_malformed_block_passes_through_byte_for_byte() {
        let malformed = "  NOTE this is not a cue\r\nwith two lines  ";
        let track = format!("{malformed}\r\n\r\n1\n00:00:00,000 --> 00:00:01,000\nhello there world\n");
        let out = reflow(&track, Direction::Ltr, &MONO, 10.0, 50.0);
        assert!(out.starts_with(&format!("{malformed}\r\n\r\n")));
        assert!(out.ends_with("hello\nthere\nworld"));
    }

    #[test]
    fn test_header_without_arrow_passes_through() {
        let track = "1\n00:00:00,000 00:00:01,000\nsome  spaced   text\n";
        assert_eq!(reflow(track, Direction::Ltr, &MONO, 10.0, 30.0), track);
    }

    #[test]
    fn test_crlf_cue_is_rewrapped() {
        let track = "1\r\n00:00:00,000 --> 00:00:01,000\r\nab cd\r\nef\r\n";
        let out = reflow(track, Direction::Ltr, &MONO, 10.0, 100.0);
        assert_eq!(out, "1\r\n00:00:00,000 --> 00:00:01,000\r\nab cd ef");
    }

    #[test]
    fn test_parse_track_counts_malformed() {
        let track = "garbage\n\n1\n00:00:01,000 --> 00:00:02,000\nhi\n\n\n";
        let parsed = parse_track(track);
        assert_eq!(parsed.malformed_blocks, 1);
        assert_eq!(parsed.cues.len(), 1);
        assert_eq!(parsed.cues[0].index, Some(1));
        assert_eq!(parsed.cues[0].text, "hi");
    }
}
