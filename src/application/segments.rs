//! Segment loading: the source trait implemented by infra adapters and the
//! degrade-to-empty loader used by content views.

use async_trait::async_trait;
use metrics::counter;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::segments::{Segment, SegmentSet};

const METRIC_FETCH_FAILED: &str = "readalong_segment_fetch_failed_total";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected status {status} from `{location}`")]
    Status { location: String, status: u16 },
    #[error("malformed segment data: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid segment location `{0}`")]
    Location(String),
}

impl FetchError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Status { .. } => "status",
            FetchError::Decode(_) => "decode",
            FetchError::Io(_) => "io",
            FetchError::Location(_) => "location",
        }
    }
}

/// Where narration segments come from.
#[async_trait]
pub trait SegmentSource: Send + Sync {
    async fn fetch(&self, location: &str) -> Result<Vec<Segment>, FetchError>;
}

/// Fetch segments for `location`, degrading every failure to an empty set.
pub async fn load_segments(source: &dyn SegmentSource, location: &str) -> SegmentSet {
    match source.fetch(location).await {
        Ok(segments) => {
            let set = SegmentSet::from_segments(segments);
            info!(
                op = "segments::load",
                location,
                segments = set.len(),
                result = "loaded",
                "Narration segments loaded"
            );
            set
        }
        Err(err) => {
            counter!(METRIC_FETCH_FAILED, "kind" => err.kind()).increment(1);
            warn!(
                op = "segments::load",
                location,
                error = %err,
                result = "degraded",
                "Failed to load narration segments; highlighting disabled"
            );
            SegmentSet::empty()
        }
    }
}
