//! Timed narration segments and the character ranges they are aligned to.
//!
//! Segments arrive from an external text-to-speech pipeline as a JSON array of
//! `{id, text, start, end}` objects. They are loaded once per content view and
//! never mutated afterwards, so the crate shares them behind an `Arc` together
//! with a content fingerprint that identifies the list in alignment caches.

use std::{ops::Range, sync::Arc};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use super::error::DomainError;

/// A timed transcript fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: i64,
    pub text: String,
    /// Start of the segment in seconds.
    pub start: f64,
    /// End of the segment in seconds, exclusive.
    pub end: f64,
}

impl Segment {
    pub fn new(id: i64, text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            id,
            text: text.into(),
            start,
            end,
        }
    }

    /// Returns true when `time` falls inside the half-open `[start, end)` interval.
    pub fn contains_time(&self, time: f64) -> bool {
        self.start <= time && time < self.end
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(DomainError::invalid_segment(
                self.id,
                "start and end must be finite",
            ));
        }
        if self.end <= self.start {
            return Err(DomainError::invalid_segment(
                self.id,
                format!("end ({}) must be after start ({})", self.end, self.start),
            ));
        }
        Ok(())
    }
}

/// Immutable list of segments for one content block.
///
/// Consumers must not assume any ordering; lookups go through `id`.
#[derive(Debug, Clone)]
pub struct SegmentSet {
    segments: Arc<[Segment]>,
    fingerprint: Arc<str>,
}

impl SegmentSet {
    /// Build a set from raw segments, dropping entries that break the
    /// `end > start` invariant.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        let valid: Vec<Segment> = segments
            .into_iter()
            .filter(|segment| match segment.validate() {
                Ok(()) => true,
                Err(err) => {
                    warn!(
                        op = "segments::from_segments",
                        segment_id = segment.id,
                        result = "dropped",
                        error = %err,
                        "Dropping invalid narration segment"
                    );
                    false
                }
            })
            .collect();

        let fingerprint = fingerprint(&valid);
        Self {
            segments: valid.into(),
            fingerprint: fingerprint.into(),
        }
    }

    pub fn empty() -> Self {
        Self::from_segments(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    pub fn as_slice(&self) -> &[Segment] {
        &self.segments
    }

    pub fn get(&self, id: i64) -> Option<&Segment> {
        self.segments.iter().find(|segment| segment.id == id)
    }

    /// Stable identity of the list contents, used as a cache key.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl Default for SegmentSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<Segment>> for SegmentSet {
    fn from(segments: Vec<Segment>) -> Self {
        Self::from_segments(segments)
    }
}

fn fingerprint(segments: &[Segment]) -> String {
    let mut hasher = Sha256::new();
    for segment in segments {
        hasher.update(segment.id.to_le_bytes());
        hasher.update(segment.start.to_le_bytes());
        hasher.update(segment.end.to_le_bytes());
        hasher.update((segment.text.len() as u64).to_le_bytes());
        hasher.update(segment.text.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Half-open byte interval into the original content string that is believed
/// to correspond to a segment's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchRange {
    pub start: usize,
    pub end: usize,
    pub segment_id: i64,
}

impl MatchRange {
    pub fn new(range: Range<usize>, segment_id: i64) -> Result<Self, DomainError> {
        if range.end <= range.start {
            return Err(DomainError::invariant(format!(
                "match range {}..{} for segment {segment_id} is empty or inverted",
                range.start, range.end
            )));
        }
        Ok(Self {
            start: range.start,
            end: range.end,
            segment_id,
        })
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn overlaps(&self, other: &MatchRange) -> bool {
        !(self.end <= other.start || self.start >= other.end)
    }
}

/// Which matching strategy accepted a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    Exact,
    Normalized,
    WordPrefix,
    WholeTitle,
}

impl MatchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::Exact => "exact",
            MatchStrategy::Normalized => "normalized",
            MatchStrategy::WordPrefix => "word_prefix",
            MatchStrategy::WholeTitle => "whole_title",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_json_shape_deserializes() {
        let raw = r#"[{"id":3,"text":"Hello","start":0.5,"end":1.25}]"#;
        let segments: Vec<Segment> = serde_json::from_str(raw).expect("valid segment json");
        assert_eq!(segments, vec![Segment::new(3, "Hello", 0.5, 1.25)]);
    }

    #[test]
    fn invalid_segments_are_dropped() {
        let set = SegmentSet::from_segments(vec![
            Segment::new(1, "ok", 0.0, 1.0),
            Segment::new(2, "inverted", 2.0, 1.0),
            Segment::new(3, "empty", 2.0, 2.0),
            Segment::new(4, "nan", f64::NAN, 1.0),
        ]);

        assert_eq!(set.len(), 1);
        assert!(set.get(1).is_some());
        assert!(set.get(2).is_none());
    }

    #[test]
    fn fingerprint_tracks_contents() {
        let a = SegmentSet::from_segments(vec![Segment::new(1, "one", 0.0, 1.0)]);
        let b = SegmentSet::from_segments(vec![Segment::new(1, "one", 0.0, 1.0)]);
        let c = SegmentSet::from_segments(vec![Segment::new(1, "uno", 0.0, 1.0)]);

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn overlap_predicate_treats_touching_ranges_as_disjoint() {
        let left = MatchRange::new(0..5, 1).expect("valid range");
        let touching = MatchRange::new(5..9, 2).expect("valid range");
        let crossing = MatchRange::new(4..9, 3).expect("valid range");

        assert!(!left.overlaps(&touching));
        assert!(left.overlaps(&crossing));
        assert!(crossing.overlaps(&left));
    }

    #[test]
    fn inverted_match_range_is_rejected() {
        assert!(MatchRange::new(4..4, 1).is_err());
        assert!(MatchRange::new(5..2, 1).is_err());
    }
}
