//! Memoized alignments.
//!
//! Matching is the expensive part of read-along rendering, while the active
//! segment changes many times per second. Entries are keyed on the content and
//! the segment list only, so switching the active segment never recomputes.

use std::{
    num::NonZeroUsize,
    sync::{Arc, Mutex},
};

use lru::LruCache;
use metrics::counter;
use sha2::{Digest, Sha256};

use crate::util::lock::mutex_lock;

use super::types::{AlignRequest, Aligner, Alignment, ContentKind};

const SOURCE: &str = "application::align::cache";
const METRIC_CACHE_HIT: &str = "readalong_align_cache_hit_total";
const METRIC_CACHE_MISS: &str = "readalong_align_cache_miss_total";
const METRIC_CACHE_EVICT: &str = "readalong_align_cache_evict_total";

pub const DEFAULT_CACHE_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlignKey {
    kind: ContentKind,
    content_digest: String,
    segments_fingerprint: String,
}

impl AlignKey {
    pub fn for_request(request: &AlignRequest<'_>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(request.content.as_bytes());
        Self {
            kind: request.kind,
            content_digest: hex::encode(hasher.finalize()),
            segments_fingerprint: request.segments.fingerprint().to_string(),
        }
    }
}

/// LRU of alignment results, owned by a [`super::ReadAlongContext`].
pub struct AlignmentCache {
    entries: Mutex<LruCache<AlignKey, Arc<Alignment>>>,
}

impl AlignmentCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, key: &AlignKey) -> Option<Arc<Alignment>> {
        mutex_lock(&self.entries, SOURCE, "get").get(key).cloned()
    }

    /// Return the cached alignment for `request`, computing it on a miss.
    ///
    /// The lock is not held while aligning.
    pub fn get_or_align(
        &self,
        request: &AlignRequest<'_>,
        aligner: &dyn Aligner,
    ) -> Arc<Alignment> {
        let key = AlignKey::for_request(request);
        if let Some(hit) = self.get(&key) {
            counter!(METRIC_CACHE_HIT).increment(1);
            return hit;
        }
        counter!(METRIC_CACHE_MISS).increment(1);

        let alignment = Arc::new(aligner.align(request));
        let evicted = mutex_lock(&self.entries, SOURCE, "get_or_align.put")
            .push(key.clone(), Arc::clone(&alignment));
        if evicted.is_some_and(|(evicted_key, _)| evicted_key != key) {
            counter!(METRIC_CACHE_EVICT).increment(1);
        }
        alignment
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        mutex_lock(&self.entries, SOURCE, "clear").clear();
    }
}

impl Default for AlignmentCache {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }
}
