//! Text/audio alignment for read-along highlighting.
//!
//! Given a block of content (article HTML, or an inline title/excerpt) and the
//! timed segments narrated over it, the aligner decides which part of the
//! content each segment corresponds to. Computing ranges is pure and kept apart
//! from applying them: [`Aligner::align`] produces non-overlapping
//! [`MatchRange`](crate::domain::segments::MatchRange)s in original content
//! offsets, and the splice stage turns them into highlighted output in one
//! back-to-front pass.

mod cache;
mod context;
mod markup;
mod matcher;
mod normalize;
mod position_map;
mod splice;
mod types;

pub use cache::{AlignKey, AlignmentCache, DEFAULT_CACHE_CAPACITY};
pub use context::ReadAlongContext;
pub use markup::{StrippedText, strip_markup};
pub use matcher::HeuristicAligner;
pub use normalize::{NormalizedText, normalize, normalize_with_map};
pub use position_map::{Interpolation, PositionMap, PositionSpan};
pub use splice::{
    DEFAULT_ACTIVE_CLASS, DEFAULT_MARKER_CLASS, DEFAULT_MARKER_ELEMENT, Fragment,
    HighlightClasses, highlight_fragments, highlight_html,
};
pub use types::{AlignRequest, AlignedRange, Aligner, Alignment, ContentKind, MatchThresholds};
