use std::collections::HashSet;
use std::num::NonZeroUsize;

use metrics_util::debugging::DebuggingRecorder;
use readalong::application::align::{HighlightClasses, MatchThresholds, ReadAlongContext};
use readalong::application::segments::load_segments;
use readalong::domain::segments::{Segment, SegmentSet};
use readalong::infra::segments::FileSegmentSource;

#[tokio::test]
async fn alignment_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let context = ReadAlongContext::with_thresholds(
        MatchThresholds::default(),
        NonZeroUsize::new(1).expect("non-zero"),
        HighlightClasses::default(),
    );
    let segments = SegmentSet::from_segments(vec![
        Segment::new(1, "Hello world", 0.0, 1.0),
        Segment::new(2, "Never spoken here", 1.0, 2.0),
    ]);

    // miss, hit, then a miss that evicts the first entry
    context.render_html("<p>Hello world</p>", &segments, Some(1));
    context.render_html("<p>Hello world</p>", &segments, Some(2));
    context.render_html("<p>Hello world, again</p>", &segments, None);

    let dir = tempfile::tempdir().expect("temp dir");
    let source = FileSegmentSource::with_root(dir.path());
    assert!(load_segments(&source, "missing.json").await.is_empty());

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "readalong_segments_matched_total",
        "readalong_segments_unmatched_total",
        "readalong_align_ms",
        "readalong_align_cache_hit_total",
        "readalong_align_cache_miss_total",
        "readalong_align_cache_evict_total",
        "readalong_segment_fetch_failed_total",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
