//! Greedy word wrapping against a pixel budget.

use shortsmith_plan_model::plan::Direction;

use crate::font::TextMeasure;
use crate::shaping::reshape_for_display;

/// Greedily pack `words` into lines no wider than `max_width` pixels.
///
/// Each candidate line is reshaped for display before it is measured, but
/// the returned lines keep logical (unreshaped) order so callers can shape
/// them again with their own renderer. A word that is wider than
/// `max_width` on its own is kept alone on its line rather than split.
pub fn wrap_to_width<'a, I>(
    words: I,
    direction: Direction,
    measure: &dyn TextMeasure,
    size: f32,
    max_width: f32,
) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in words.into_iter().filter(|w| !w.is_empty()) {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate = format!("{current} {word}");
        let width = measure.measure_width(&reshape_for_display(&candidate, direction), size);
        if width <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Wrap free text, splitting on any whitespace first.
pub fn wrap_text(
    text: &str,
    direction: Direction,
    measure: &dyn TextMeasure,
    size: f32,
    max_width: f32,
) -> Vec<String> {
    wrap_to_width(text.split_whitespace(), direction, measure, size, max_width)
}
