use serde::{Deserialize, Serialize};

use crate::domain::segments::{MatchRange, MatchStrategy, SegmentSet};

/// Shape of the content being aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Rendered article body; offsets point into the markup-inclusive string.
    Html,
    /// Short plain text such as a title or an excerpt.
    Inline,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Html => "html",
            ContentKind::Inline => "inline",
        }
    }
}

/// Alignment input: one block of content and the segments narrated over it.
#[derive(Debug, Clone, Copy)]
pub struct AlignRequest<'a> {
    pub kind: ContentKind,
    pub content: &'a str,
    pub segments: &'a SegmentSet,
}

impl<'a> AlignRequest<'a> {
    pub fn html(content: &'a str, segments: &'a SegmentSet) -> Self {
        Self {
            kind: ContentKind::Html,
            content,
            segments,
        }
    }

    pub fn inline(content: &'a str, segments: &'a SegmentSet) -> Self {
        Self {
            kind: ContentKind::Inline,
            content,
            segments,
        }
    }
}

/// An accepted range together with the strategy that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignedRange {
    #[serde(flatten)]
    pub range: MatchRange,
    pub strategy: MatchStrategy,
}

/// Accepted, pairwise non-overlapping ranges for one content block.
///
/// Ranges are kept in acceptance order (descending segment id).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alignment {
    pub ranges: Vec<AlignedRange>,
    /// Segments that no strategy could place.
    pub unmatched: Vec<i64>,
    /// Segments whose match overlapped a range accepted earlier.
    pub conflicts: Vec<i64>,
}

impl Alignment {
    pub fn match_ranges(&self) -> impl Iterator<Item = MatchRange> + '_ {
        self.ranges.iter().map(|aligned| aligned.range)
    }

    pub fn range_for(&self, segment_id: i64) -> Option<MatchRange> {
        self.match_ranges()
            .find(|range| range.segment_id == segment_id)
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Tunable limits for the matching heuristics.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchThresholds {
    /// Inline exact matches must cover this share of the segment text.
    pub exact_segment_coverage: f64,
    /// Inline exact matches must cover this share of the whole content.
    pub exact_content_coverage: f64,
    /// Inline content shorter than this many chars uses the whole-title rule.
    pub short_content_chars: usize,
    /// Whole-title rule: segment length relative to content length.
    pub title_coverage: f64,
    /// Leading words used by the word-prefix fallback.
    pub prefix_words: usize,
    /// Extra words the word-prefix fallback may extend by.
    pub extension_words: usize,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            exact_segment_coverage: 0.9,
            exact_content_coverage: 0.5,
            short_content_chars: 50,
            title_coverage: 0.8,
            prefix_words: 5,
            extension_words: 10,
        }
    }
}

impl From<&crate::config::AlignSettings> for MatchThresholds {
    fn from(settings: &crate::config::AlignSettings) -> Self {
        Self {
            short_content_chars: settings.short_content_chars,
            prefix_words: settings.prefix_words.get(),
            extension_words: settings.extension_words,
            ..Self::default()
        }
    }
}

/// Pure, deterministic alignment of segments onto content. Unmatched segments
/// are not errors; they are simply absent from the result.
pub trait Aligner: Send + Sync {
    fn align(&self, request: &AlignRequest<'_>) -> Alignment;
}
