//! Heuristic segment matching and overlap resolution.
//!
//! Every segment is tried against the content with a fixed sequence of
//! strategies (exact, normalized, word prefix); the first one that produces a
//! translatable range wins. Short inline content (titles) is matched with a
//! stricter whole-content rule instead. Segments are visited in descending id
//! order and a candidate that overlaps an already accepted range is dropped, so
//! for contested spans the higher id wins.

use std::{borrow::Cow, ops::Range, time::Instant};

use metrics::{counter, histogram};
use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::domain::segments::{MatchRange, MatchStrategy, Segment};

use super::{
    markup::strip_markup,
    normalize::{NormalizedText, normalize, normalize_with_map},
    position_map::PositionMap,
    types::{AlignRequest, AlignedRange, Aligner, Alignment, ContentKind, MatchThresholds},
};

const METRIC_SEGMENTS_MATCHED: &str = "readalong_segments_matched_total";
const METRIC_SEGMENTS_UNMATCHED: &str = "readalong_segments_unmatched_total";
const METRIC_ALIGN_MS: &str = "readalong_align_ms";

const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?', '…', ';', ':'];

/// Default aligner implementing the exact → normalized → word-prefix cascade.
#[derive(Debug, Clone, Default)]
pub struct HeuristicAligner {
    thresholds: MatchThresholds,
}

impl HeuristicAligner {
    pub fn new(thresholds: MatchThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &MatchThresholds {
        &self.thresholds
    }

    fn match_segment(
        &self,
        content: &PreparedContent<'_>,
        text: &str,
    ) -> Option<(Range<usize>, MatchStrategy)> {
        if let Some(title) = content.title.as_ref() {
            return self
                .match_whole_title(title, text)
                .map(|range| (range, MatchStrategy::WholeTitle));
        }

        self.match_exact(content, text)
            .map(|range| (range, MatchStrategy::Exact))
            .or_else(|| {
                self.match_normalized(content, text)
                    .map(|range| (range, MatchStrategy::Normalized))
            })
            .or_else(|| {
                self.match_word_prefix(content, text)
                    .map(|range| (range, MatchStrategy::WordPrefix))
            })
    }

    /// First case-insensitive occurrence of the literal text in the plain text.
    fn match_exact(&self, content: &PreparedContent<'_>, text: &str) -> Option<Range<usize>> {
        let found = find_literal(&content.plain, text)?;

        if content.kind == ContentKind::Inline {
            let matched_chars = content.plain[found.clone()].chars().count() as f64;
            let segment_chars = text.chars().count() as f64;
            let content_chars = content.plain.chars().count() as f64;
            if matched_chars < segment_chars * self.thresholds.exact_segment_coverage
                || matched_chars < content_chars * self.thresholds.exact_content_coverage
            {
                return None;
            }
        }

        content.markup_map.to_original(found)
    }

    fn match_normalized(&self, content: &PreparedContent<'_>, text: &str) -> Option<Range<usize>> {
        let needle = normalize(text);
        if needle.is_empty() {
            return None;
        }

        let found = find_literal(&content.normalized.text, &needle)?;
        content
            .normalized
            .map
            .to_original_through(&content.markup_map, found)
    }

    /// Match the leading words with flexible whitespace, then extend the match
    /// word by word for as long as the content keeps agreeing.
    fn match_word_prefix(&self, content: &PreparedContent<'_>, text: &str) -> Option<Range<usize>> {
        let needle = normalize(text);
        let words: Vec<&str> = needle.split(' ').filter(|word| !word.is_empty()).collect();
        if words.is_empty() {
            return None;
        }

        let prefix_len = words.len().min(self.thresholds.prefix_words.max(1));
        let prefix_pattern = words[..prefix_len]
            .iter()
            .map(|word| regex::escape(word))
            .collect::<Vec<_>>()
            .join(r"\s+");
        let prefix = case_insensitive(&prefix_pattern)?;

        let haystack = content.normalized.text.as_str();
        let found = prefix.find(haystack)?;
        let mut end = found.end();

        for word in words[prefix_len..]
            .iter()
            .take(self.thresholds.extension_words)
        {
            let Some(next) = case_insensitive(&format!(r"^\s+{}", regex::escape(word))) else {
                break;
            };
            match next.find(&haystack[end..]) {
                Some(step) => end += step.end(),
                None => break,
            }
        }

        content
            .normalized
            .map
            .to_original_through(&content.markup_map, found.start()..end)
    }

    /// Titles are only highlighted as a whole. The segment must contain the
    /// title's words and the title must make up nearly all of the segment.
    fn match_whole_title(&self, title: &TitleContent, text: &str) -> Option<Range<usize>> {
        let segment = normalize(trim_sentence_end(text));
        if segment.is_empty() || !contains_words(&segment, &title.normalized) {
            return None;
        }

        let segment_chars = segment.chars().count() as f64;
        let title_chars = title.normalized.chars().count() as f64;
        if title_chars < segment_chars * self.thresholds.title_coverage {
            return None;
        }

        Some(title.range.clone())
    }
}

impl Aligner for HeuristicAligner {
    fn align(&self, request: &AlignRequest<'_>) -> Alignment {
        let started_at = Instant::now();
        let content = PreparedContent::new(request.kind, request.content, &self.thresholds);

        let mut ordered: Vec<&Segment> = request.segments.iter().collect();
        ordered.sort_by(|a, b| b.id.cmp(&a.id));

        let mut alignment = Alignment::default();
        for segment in ordered {
            let text = segment.text.trim();
            let candidate = if text.is_empty() {
                None
            } else {
                self.match_segment(&content, text)
            };

            let Some((range, strategy)) = candidate else {
                alignment.unmatched.push(segment.id);
                continue;
            };
            let Ok(range) = MatchRange::new(range, segment.id) else {
                alignment.unmatched.push(segment.id);
                continue;
            };

            if let Some(existing) = alignment
                .ranges
                .iter()
                .find(|accepted| accepted.range.overlaps(&range))
            {
                debug!(
                    op = "align::resolve_overlap",
                    segment_id = segment.id,
                    winner_id = existing.range.segment_id,
                    start = range.start,
                    end = range.end,
                    result = "rejected",
                    "Segment range overlaps an accepted range"
                );
                alignment.conflicts.push(segment.id);
                continue;
            }

            counter!(METRIC_SEGMENTS_MATCHED, "strategy" => strategy.as_str()).increment(1);
            alignment.ranges.push(AlignedRange { range, strategy });
        }

        let unmatched = (alignment.unmatched.len() + alignment.conflicts.len()) as u64;
        if unmatched > 0 {
            counter!(METRIC_SEGMENTS_UNMATCHED).increment(unmatched);
        }
        let elapsed = started_at.elapsed();
        histogram!(METRIC_ALIGN_MS, "kind" => request.kind.as_str())
            .record(elapsed.as_secs_f64() * 1000.0);

        debug!(
            op = "align::align",
            kind = request.kind.as_str(),
            content_bytes = request.content.len(),
            segments = request.segments.len(),
            matched = alignment.ranges.len(),
            unmatched = alignment.unmatched.len(),
            conflicts = alignment.conflicts.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Aligned narration segments"
        );

        alignment
    }
}

/// Content prepared once per alignment pass.
struct PreparedContent<'a> {
    kind: ContentKind,
    /// Text with markup removed (or the inline text itself).
    plain: Cow<'a, str>,
    /// Maps `plain` offsets to content offsets.
    markup_map: PositionMap,
    /// Normalized `plain` with a map back to `plain` offsets.
    normalized: NormalizedText,
    /// Set for inline content short enough to be treated as a title.
    title: Option<TitleContent>,
}

struct TitleContent {
    normalized: String,
    range: Range<usize>,
}

impl<'a> PreparedContent<'a> {
    fn new(kind: ContentKind, content: &'a str, thresholds: &MatchThresholds) -> Self {
        let (plain, markup_map) = match kind {
            ContentKind::Html => {
                let stripped = strip_markup(content);
                (Cow::Owned(stripped.text), stripped.map)
            }
            ContentKind::Inline => (Cow::Borrowed(content), PositionMap::identity(content.len())),
        };

        let title = (kind == ContentKind::Inline
            && content.trim().chars().count() < thresholds.short_content_chars)
            .then(|| TitleContent::new(content))
            .flatten();

        let normalized = normalize_with_map(&plain);

        Self {
            kind,
            plain,
            markup_map,
            normalized,
            title,
        }
    }
}

impl TitleContent {
    fn new(content: &str) -> Option<Self> {
        let normalized = normalize(trim_sentence_end(content));
        if normalized.is_empty() {
            return None;
        }

        let start = content.len() - content.trim_start().len();
        let end = content.trim_end().len();
        (start < end).then_some(Self {
            normalized,
            range: start..end,
        })
    }
}

fn trim_sentence_end(text: &str) -> &str {
    text.trim().trim_end_matches(SENTENCE_TERMINATORS).trim_end()
}

/// Whole-word containment on normalized text, where words are separated by
/// single spaces.
fn contains_words(haystack: &str, needle: &str) -> bool {
    format!(" {haystack} ").contains(&format!(" {needle} "))
}

fn case_insensitive(pattern: &str) -> Option<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .ok()
}

fn find_literal(haystack: &str, needle: &str) -> Option<Range<usize>> {
    case_insensitive(&regex::escape(needle))?
        .find(haystack)
        .map(|found| found.range())
        .filter(|range| !range.is_empty())
}
