use std::{num::NonZeroUsize, sync::Arc};

use crate::domain::segments::SegmentSet;

use super::{
    cache::AlignmentCache,
    matcher::HeuristicAligner,
    splice::{Fragment, HighlightClasses, highlight_fragments, highlight_html},
    types::{AlignRequest, Aligner, Alignment, ContentKind, MatchThresholds},
};

/// Everything needed to align and highlight content, passed explicitly to the
/// views that use it. The cache lives exactly as long as the context.
pub struct ReadAlongContext {
    aligner: Arc<dyn Aligner>,
    cache: AlignmentCache,
    classes: HighlightClasses,
}

impl ReadAlongContext {
    pub fn new(
        aligner: Arc<dyn Aligner>,
        cache_capacity: NonZeroUsize,
        classes: HighlightClasses,
    ) -> Self {
        Self {
            aligner,
            cache: AlignmentCache::new(cache_capacity),
            classes,
        }
    }

    pub fn with_thresholds(
        thresholds: MatchThresholds,
        cache_capacity: NonZeroUsize,
        classes: HighlightClasses,
    ) -> Self {
        Self::new(
            Arc::new(HeuristicAligner::new(thresholds)),
            cache_capacity,
            classes,
        )
    }

    pub fn classes(&self) -> &HighlightClasses {
        &self.classes
    }

    pub fn cache(&self) -> &AlignmentCache {
        &self.cache
    }

    /// Accepted ranges for `content`, memoized on content and segments.
    pub fn ranges(
        &self,
        kind: ContentKind,
        content: &str,
        segments: &SegmentSet,
    ) -> Arc<Alignment> {
        let request = AlignRequest {
            kind,
            content,
            segments,
        };
        self.cache.get_or_align(&request, self.aligner.as_ref())
    }

    /// Render HTML with each matched range wrapped in a marker element.
    pub fn render_html(
        &self,
        html: &str,
        segments: &SegmentSet,
        active_segment_id: Option<i64>,
    ) -> String {
        if segments.is_empty() {
            return html.to_string();
        }
        let alignment = self.ranges(ContentKind::Html, html, segments);
        highlight_html(
            html,
            alignment.match_ranges(),
            active_segment_id,
            &self.classes,
        )
    }

    /// Split inline text (title, excerpt) into display fragments.
    pub fn render_inline(
        &self,
        text: &str,
        segments: &SegmentSet,
        active_segment_id: Option<i64>,
    ) -> Vec<Fragment> {
        let alignment = self.ranges(ContentKind::Inline, text, segments);
        highlight_fragments(text, alignment.match_ranges(), active_segment_id)
    }
}

impl From<&crate::config::Settings> for ReadAlongContext {
    fn from(settings: &crate::config::Settings) -> Self {
        Self::with_thresholds(
            MatchThresholds::from(&settings.align),
            settings.align.cache_capacity,
            HighlightClasses::from(&settings.highlight),
        )
    }
}

impl Default for ReadAlongContext {
    fn default() -> Self {
        Self {
            aligner: Arc::new(HeuristicAligner::default()),
            cache: AlignmentCache::default(),
            classes: HighlightClasses::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::segments::Segment;

    fn segments() -> SegmentSet {
        SegmentSet::from_segments(vec![
            Segment::new(1, "First sentence.", 0.0, 2.0),
            Segment::new(2, "Second one.", 2.0, 4.0),
        ])
    }

    #[test]
    fn switching_active_segment_reuses_alignment() {
        let context = ReadAlongContext::default();
        let html = "<p>First sentence. Second one.</p>";
        let set = segments();

        let first = context.render_html(html, &set, Some(1));
        let second = context.render_html(html, &set, Some(2));

        assert_ne!(first, second);
        assert_eq!(context.cache().len(), 1);
        assert!(first.contains(
            "<span data-segment-id=\"1\" class=\"readalong-segment readalong-segment--active\">First sentence.</span>"
        ));
        assert!(second.contains(
            "<span data-segment-id=\"2\" class=\"readalong-segment readalong-segment--active\">Second one.</span>"
        ));
    }

    #[test]
    fn empty_segments_render_content_verbatim() {
        let context = ReadAlongContext::default();
        let html = "<p>Nothing narrated.</p>";
        assert_eq!(context.render_html(html, &SegmentSet::empty(), None), html);
        assert!(context.cache().is_empty());
    }

    #[test]
    fn inline_rendering_produces_fragments() {
        let context = ReadAlongContext::default();
        let set = SegmentSet::from_segments(vec![Segment::new(4, "A Day in Venice", 0.0, 1.5)]);

        let fragments = context.render_inline("A day in Venice", &set, Some(4));
        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].is_active);
        assert_eq!(fragments[0].segment_id, Some(4));
    }
}
