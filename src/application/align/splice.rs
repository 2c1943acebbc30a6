//! Turning accepted ranges into highlighted output.
//!
//! Ranges are applied from the highest start offset to the lowest, so every
//! insertion happens after all offsets that are still to be used.

use serde::{Deserialize, Serialize};

use crate::domain::segments::MatchRange;

pub const DEFAULT_MARKER_ELEMENT: &str = "span";
pub const DEFAULT_MARKER_CLASS: &str = "readalong-segment";
pub const DEFAULT_ACTIVE_CLASS: &str = "readalong-segment--active";

/// Marker element and classes used when splicing highlights into HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightClasses {
    pub element: String,
    pub base: String,
    pub active: String,
}

impl Default for HighlightClasses {
    fn default() -> Self {
        Self {
            element: DEFAULT_MARKER_ELEMENT.to_string(),
            base: DEFAULT_MARKER_CLASS.to_string(),
            active: DEFAULT_ACTIVE_CLASS.to_string(),
        }
    }
}

impl From<&crate::config::HighlightSettings> for HighlightClasses {
    fn from(settings: &crate::config::HighlightSettings) -> Self {
        Self {
            element: settings.element.clone(),
            base: settings.class.clone(),
            active: settings.active_class.clone(),
        }
    }
}

impl HighlightClasses {
    fn open_tag(&self, segment_id: i64, is_active: bool) -> String {
        let class = if is_active {
            format!("{} {}", self.base, self.active)
        } else {
            self.base.clone()
        };
        format!(
            "<{} data-segment-id=\"{segment_id}\" class=\"{}\">",
            self.element,
            escape_attribute(&class)
        )
    }

    fn close_tag(&self) -> String {
        format!("</{}>", self.element)
    }
}

/// One piece of inline text for the rendering surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    pub is_highlighted: bool,
    pub is_active: bool,
    pub segment_id: Option<i64>,
}

impl Fragment {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            is_highlighted: false,
            is_active: false,
            segment_id: None,
        }
    }

    fn marked(text: &str, segment_id: i64, is_active: bool) -> Self {
        Self {
            text: text.to_string(),
            is_highlighted: true,
            is_active,
            segment_id: Some(segment_id),
        }
    }
}

/// Wrap every range of `html` in a marker element carrying its segment id.
pub fn highlight_html(
    html: &str,
    ranges: impl IntoIterator<Item = MatchRange>,
    active_segment_id: Option<i64>,
    classes: &HighlightClasses,
) -> String {
    let mut output = html.to_string();
    for range in descending_ranges(html, ranges) {
        let is_active = active_segment_id == Some(range.segment_id);
        output.insert_str(range.end, &classes.close_tag());
        output.insert_str(range.start, &classes.open_tag(range.segment_id, is_active));
    }
    output
}

/// Split `text` into plain and highlighted fragments in display order.
pub fn highlight_fragments(
    text: &str,
    ranges: impl IntoIterator<Item = MatchRange>,
    active_segment_id: Option<i64>,
) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut cursor = text.len();

    for range in descending_ranges(text, ranges) {
        if range.end < cursor {
            fragments.push(Fragment::plain(&text[range.end..cursor]));
        }
        let is_active = active_segment_id == Some(range.segment_id);
        fragments.push(Fragment::marked(
            &text[range.as_range()],
            range.segment_id,
            is_active,
        ));
        cursor = range.start;
    }

    if cursor > 0 {
        fragments.push(Fragment::plain(&text[..cursor]));
    }

    fragments.reverse();
    fragments
}

/// Ranges sorted by descending start, restricted to ones that can be applied
/// to `content` without splitting a character or crossing a later range.
fn descending_ranges(
    content: &str,
    ranges: impl IntoIterator<Item = MatchRange>,
) -> Vec<MatchRange> {
    let mut ordered: Vec<MatchRange> = ranges
        .into_iter()
        .filter(|range| {
            !range.is_empty()
                && range.end <= content.len()
                && content.is_char_boundary(range.start)
                && content.is_char_boundary(range.end)
        })
        .collect();
    ordered.sort_by(|a, b| b.start.cmp(&a.start));

    let mut applicable = Vec::with_capacity(ordered.len());
    let mut floor = usize::MAX;
    for range in ordered {
        if range.end <= floor {
            floor = range.start;
            applicable.push(range);
        }
    }
    applicable
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
