use readalong::application::align::{
    AlignRequest, Aligner, Alignment, HeuristicAligner, ReadAlongContext,
};
use readalong::domain::segments::{MatchStrategy, Segment, SegmentSet};

fn segment_set(entries: &[(i64, &str)]) -> SegmentSet {
    SegmentSet::from_segments(
        entries
            .iter()
            .enumerate()
            .map(|(index, (id, text))| {
                let start = index as f64 * 2.0;
                Segment::new(*id, *text, start, start + 2.0)
            })
            .collect(),
    )
}

fn align_html(content: &str, segments: &SegmentSet) -> Alignment {
    HeuristicAligner::default().align(&AlignRequest::html(content, segments))
}

#[test]
fn exact_match_lands_inside_markup() {
    let content = "<p>Hello world</p>";
    let alignment = align_html(content, &segment_set(&[(1, "Hello world")]));

    let range = alignment.range_for(1).expect("segment 1 matched");
    assert_eq!((range.start, range.end), (3, 14));
    assert_eq!(&content[range.as_range()], "Hello world");
    assert_eq!(alignment.ranges[0].strategy, MatchStrategy::Exact);
}

#[test]
fn case_difference_still_covers_sentence_without_period() {
    let content = "Il gatto mangia.";
    let alignment = align_html(content, &segment_set(&[(1, "il GATTO mangia")]));

    let range = alignment.range_for(1).expect("segment 1 matched");
    assert_eq!(&content[range.as_range()], "Il gatto mangia");
}

#[test]
fn accent_difference_falls_back_to_normalized_match() {
    let content = "Il gàtto mangia.";
    let alignment = align_html(content, &segment_set(&[(1, "il GATTO mangia")]));

    let range = alignment.range_for(1).expect("segment 1 matched");
    assert_eq!(&content[range.as_range()], "Il gàtto mangia");
    assert_eq!(alignment.ranges[0].strategy, MatchStrategy::Normalized);
}

#[test]
fn higher_id_wins_a_one_character_overlap() {
    let content = "<p>alpha beta gamma</p>";
    let alignment = align_html(content, &segment_set(&[(1, "alpha beta"), (2, "a gamma")]));

    assert_eq!(alignment.ranges.len(), 1);
    let winner = alignment.range_for(2).expect("segment 2 matched");
    assert_eq!(&content[winner.as_range()], "a gamma");
    assert_eq!(alignment.conflicts, vec![1]);
    assert!(alignment.range_for(1).is_none());
}

#[test]
fn absent_text_produces_no_range() {
    let content = "<p>Hello world</p>";
    let alignment = align_html(content, &segment_set(&[(1, "Completely absent phrase")]));

    assert!(alignment.is_empty());
    assert_eq!(alignment.unmatched, vec![1]);
}

#[test]
fn encoded_entities_match_their_decoded_text() {
    let content = "<p>Tom&nbsp;and Jerry went home.</p><p>Salt &amp; pepper.</p>";
    let alignment = align_html(
        content,
        &segment_set(&[(1, "Tom and Jerry went home."), (2, "Salt & pepper.")]),
    );

    let first = alignment.range_for(1).expect("segment 1 matched");
    assert_eq!(&content[first.as_range()], "Tom&nbsp;and Jerry went home.");
    let second = alignment.range_for(2).expect("segment 2 matched");
    assert_eq!(&content[second.as_range()], "Salt &amp; pepper.");
    assert!(
        alignment
            .ranges
            .iter()
            .all(|aligned| aligned.strategy == MatchStrategy::Exact)
    );
}

#[test]
fn short_title_ignores_long_segment_containing_its_letters() {
    let segments = segment_set(&[(
        1,
        "Welcome to a long podcast episode about chromed promenades",
    )]);
    let alignment = HeuristicAligner::default().align(&AlignRequest::inline("Rome", &segments));

    assert!(alignment.is_empty());
    assert_eq!(alignment.unmatched, vec![1]);
}

#[test]
fn short_title_rejects_unrelated_segment() {
    let segments = segment_set(&[(1, "Artificial Intelligence Overview")]);
    let alignment = HeuristicAligner::default().align(&AlignRequest::inline("AI", &segments));

    assert!(alignment.is_empty());
    assert_eq!(alignment.unmatched, vec![1]);
}

#[test]
fn short_title_highlights_whole_title() {
    let segments = segment_set(&[(7, "A day in Venice.")]);
    let title = " A Day in Venice ";
    let alignment = HeuristicAligner::default().align(&AlignRequest::inline(title, &segments));

    let range = alignment.range_for(7).expect("title matched");
    assert_eq!(&title[range.as_range()], "A Day in Venice");
    assert_eq!(alignment.ranges[0].strategy, MatchStrategy::WholeTitle);
}

#[test]
fn rendered_article_marks_active_segment() {
    let context = ReadAlongContext::default();
    let html = "<h2>Morning</h2><p>The tide came in. Boats rocked.</p>";
    let segments = segment_set(&[(1, "Morning"), (2, "The tide came in."), (3, "Boats rocked.")]);

    let rendered = context.render_html(html, &segments, Some(2));
    insta::assert_snapshot!(
        rendered,
        @r#"<h2><span data-segment-id="1" class="readalong-segment">Morning</span></h2><p><span data-segment-id="2" class="readalong-segment readalong-segment--active">The tide came in.</span> <span data-segment-id="3" class="readalong-segment">Boats rocked.</span></p>"#
    );
}

#[test]
fn rendering_without_matches_leaves_content_untouched() {
    let context = ReadAlongContext::default();
    let html = "<p>Nothing here matches.</p>";
    let segments = segment_set(&[(1, "Entirely different words")]);

    assert_eq!(context.render_html(html, &segments, Some(1)), html);
}
