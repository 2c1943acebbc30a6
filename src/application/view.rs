//! Lifecycle of one mounted content view.
//!
//! A view starts without segments, loads them at most once, and renders its
//! content through a [`ReadAlongContext`]. Fetches are not cancelled; instead
//! every load carries a [`LoadTicket`] and a result whose ticket is no longer
//! current (the view was unmounted or reloaded meanwhile) is discarded.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tracing::debug;

use crate::application::{
    align::{ContentKind, Fragment, ReadAlongContext},
    segments::{SegmentSource, load_segments},
};
use crate::domain::segments::SegmentSet;

#[derive(Debug, Clone, Default)]
pub enum SegmentState {
    #[default]
    Empty,
    Loaded(SegmentSet),
}

/// Proof that a load was started for a particular mount of a view.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl LoadTicket {
    /// False once the issuing view has been unmounted or reloaded.
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.generation
    }
}

#[derive(Debug)]
pub struct ReadAlongView {
    resource_id: String,
    state: SegmentState,
    generation: Arc<AtomicU64>,
    mounted: bool,
}

impl ReadAlongView {
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            state: SegmentState::Empty,
            generation: Arc::new(AtomicU64::new(0)),
            mounted: true,
        }
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, SegmentState::Loaded(_))
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Loaded segments, or an empty set while nothing is loaded.
    pub fn segments(&self) -> SegmentSet {
        match &self.state {
            SegmentState::Loaded(segments) => segments.clone(),
            SegmentState::Empty => SegmentSet::empty(),
        }
    }

    pub fn begin_load(&self) -> LoadTicket {
        LoadTicket {
            generation: self.generation.load(Ordering::Acquire),
            current: Arc::clone(&self.generation),
        }
    }

    /// Store fetched segments if `ticket` still belongs to this mount and
    /// nothing was loaded yet. Returns whether the segments were applied.
    pub fn complete_load(&mut self, ticket: &LoadTicket, segments: SegmentSet) -> bool {
        let owned = Arc::ptr_eq(&ticket.current, &self.generation);
        if !self.mounted || !owned || !ticket.is_current() {
            debug!(
                op = "view::complete_load",
                resource_id = %self.resource_id,
                result = "discarded_stale",
                "Discarding segments for a view that is no longer current"
            );
            return false;
        }
        if self.is_loaded() {
            debug!(
                op = "view::complete_load",
                resource_id = %self.resource_id,
                result = "discarded_duplicate",
                "Segments already loaded for this view"
            );
            return false;
        }

        self.state = SegmentState::Loaded(segments);
        true
    }

    /// Fetch segments from `source` and apply them if the view is still current.
    pub async fn load_from(&mut self, source: &dyn SegmentSource, location: &str) -> bool {
        let ticket = self.begin_load();
        let segments = load_segments(source, location).await;
        self.complete_load(&ticket, segments)
    }

    /// Invalidate every outstanding ticket and drop the loaded segments.
    pub fn unmount(&mut self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.state = SegmentState::Empty;
        self.mounted = false;
    }

    pub fn render_html(
        &self,
        context: &ReadAlongContext,
        html: &str,
        active_segment_id: Option<i64>,
    ) -> String {
        context.render_html(html, &self.segments(), active_segment_id)
    }

    pub fn render_inline(
        &self,
        context: &ReadAlongContext,
        text: &str,
        active_segment_id: Option<i64>,
    ) -> Vec<Fragment> {
        context.render_inline(text, &self.segments(), active_segment_id)
    }

    /// Number of matched ranges for `content`; zero while nothing is loaded.
    pub fn matched_ranges(
        &self,
        context: &ReadAlongContext,
        kind: ContentKind,
        content: &str,
    ) -> usize {
        match &self.state {
            SegmentState::Loaded(segments) => {
                context.ranges(kind, content, segments).ranges.len()
            }
            SegmentState::Empty => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::application::segments::FetchError;
    use crate::domain::segments::Segment;

    fn loaded_set() -> SegmentSet {
        SegmentSet::from_segments(vec![Segment::new(1, "Hello world", 0.0, 2.0)])
    }

    struct FixedSource;

    #[async_trait]
    impl SegmentSource for FixedSource {
        async fn fetch(&self, _location: &str) -> Result<Vec<Segment>, FetchError> {
            Ok(vec![Segment::new(1, "Hello world", 0.0, 2.0)])
        }
    }

    #[test]
    fn segments_load_exactly_once() {
        let mut view = ReadAlongView::new("post-1");
        let ticket = view.begin_load();

        assert!(view.complete_load(&ticket, loaded_set()));
        assert!(view.is_loaded());
        assert!(!view.complete_load(&view.begin_load(), SegmentSet::empty()));
        assert_eq!(view.segments().len(), 1);
    }

    #[test]
    fn results_after_unmount_are_discarded() {
        let mut view = ReadAlongView::new("post-1");
        let ticket = view.begin_load();

        view.unmount();
        assert!(!ticket.is_current());
        assert!(!view.complete_load(&ticket, loaded_set()));
        assert!(!view.is_loaded());
    }

    #[test]
    fn tickets_from_another_view_are_rejected() {
        let other = ReadAlongView::new("post-2");
        let mut view = ReadAlongView::new("post-1");

        assert!(!view.complete_load(&other.begin_load(), loaded_set()));
    }

    #[tokio::test]
    async fn load_from_source_and_render() {
        let context = ReadAlongContext::default();
        let mut view = ReadAlongView::new("post-1");

        let html = "<p>Hello world</p>";
        assert_eq!(view.render_html(&context, html, Some(1)), html);

        assert!(view.load_from(&FixedSource, "memory://post-1").await);
        assert_eq!(view.matched_ranges(&context, ContentKind::Html, html), 1);
        assert!(
            view.render_html(&context, html, Some(1))
                .contains("data-segment-id=\"1\"")
        );
    }
}
