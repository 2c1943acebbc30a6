//! Offset translation between a derived string and the string it came from.

use std::ops::Range;

/// One contiguous correspondence between original and derived offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionSpan {
    pub original_start: usize,
    pub original_end: usize,
    pub derived_start: usize,
    pub derived_end: usize,
}

impl PositionSpan {
    fn derived_len(&self) -> usize {
        self.derived_end - self.derived_start
    }

    fn original_len(&self) -> usize {
        self.original_end - self.original_start
    }

    fn contains_start(&self, offset: usize) -> bool {
        self.derived_start <= offset && offset < self.derived_end
    }

    fn contains_end(&self, offset: usize) -> bool {
        self.derived_start < offset && offset <= self.derived_end
    }
}

/// How offsets that fall strictly inside a span are translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// Derived bytes are a verbatim copy of the original span, so inner
    /// offsets translate one-to-one. Spans whose two sides differ in length
    /// (a decoded entity, say) snap to their boundaries.
    Verbatim,
    /// Each span stands for one indivisible source character; inner offsets
    /// snap to the span boundaries.
    Atomic,
}

/// Ordered, monotonic list of spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionMap {
    spans: Vec<PositionSpan>,
    interpolation: Interpolation,
}

impl PositionMap {
    pub fn new(interpolation: Interpolation) -> Self {
        Self {
            spans: Vec::new(),
            interpolation,
        }
    }

    /// A map for a string that was not transformed at all.
    pub fn identity(len: usize) -> Self {
        let mut map = Self::new(Interpolation::Verbatim);
        if len > 0 {
            map.push(PositionSpan {
                original_start: 0,
                original_end: len,
                derived_start: 0,
                derived_end: len,
            });
        }
        map
    }

    pub(crate) fn push(&mut self, span: PositionSpan) {
        debug_assert!(
            self.spans.last().is_none_or(|last| {
                last.original_end <= span.original_start && last.derived_end <= span.derived_start
            }),
            "position map spans must be monotonic"
        );
        self.spans.push(span);
    }

    /// Cut derived offsets back to `len` after the derived string was truncated.
    pub(crate) fn clamp_derived(&mut self, len: usize) {
        for span in self.spans.iter_mut().rev() {
            if span.derived_start < len && span.derived_end <= len {
                break;
            }
            span.derived_start = span.derived_start.min(len);
            span.derived_end = span.derived_end.min(len);
        }
    }

    pub fn spans(&self) -> &[PositionSpan] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Translate a derived range into the original string.
    ///
    /// The start comes from the first span whose derived interval contains
    /// `derived.start`; the end from the first span at or after it whose
    /// derived interval reaches `derived.end`. Returns `None` when either end
    /// is not covered or the result would be empty.
    pub fn to_original(&self, derived: Range<usize>) -> Option<Range<usize>> {
        if derived.end <= derived.start {
            return None;
        }

        let start_index = self
            .spans
            .iter()
            .position(|span| span.contains_start(derived.start))?;
        let start_span = &self.spans[start_index];
        let original_start = match self.interpolation {
            Interpolation::Verbatim if start_span.original_len() == start_span.derived_len() => {
                start_span.original_start + (derived.start - start_span.derived_start)
            }
            _ => start_span.original_start,
        };

        let end_span = self.spans[start_index..]
            .iter()
            .find(|span| span.contains_end(derived.end))?;
        let original_end = match self.interpolation {
            Interpolation::Verbatim if end_span.original_len() == end_span.derived_len() => {
                end_span.original_start + (derived.end - end_span.derived_start)
            }
            _ => end_span.original_end,
        };

        (original_start < original_end).then_some(original_start..original_end)
    }

    /// Chain two maps: `self` maps derived→intermediate, `outer` maps
    /// intermediate→original.
    pub fn to_original_through(
        &self,
        outer: &PositionMap,
        derived: Range<usize>,
    ) -> Option<Range<usize>> {
        self.to_original(derived)
            .and_then(|intermediate| outer.to_original(intermediate))
    }
}
