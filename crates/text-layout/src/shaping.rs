//! Display shaping for right-to-left scripts.

use std::borrow::Cow;

use shortsmith_plan_model::plan::Direction;
use unicode_bidi::BidiInfo;

/// Convert logical-order text into the form a renderer without complex
/// shaping should draw.
///
/// RTL text gets Arabic contextual forms (initial/medial/final/isolated and
/// lam-alef ligatures) followed by bidi visual reordering. LTR text is
/// returned untouched.
pub fn reshape_for_display(text: &str, direction: Direction) -> Cow<'_, str> {
    match direction {
        Direction::Ltr => Cow::Borrowed(text),
        Direction::Rtl => Cow::Owned(reorder_visual(&ar_reshaper::reshape_line(text))),
    }
}

fn reorder_visual(text: &str) -> String {
    let bidi = BidiInfo::new(text, None);
    let mut visual = String::with_capacity(text.len());
    for paragraph in &bidi.paragraphs {
        let line = paragraph.range.clone();
        visual.push_str(&bidi.reorder_line(paragraph, line));
    }
    visual
}
