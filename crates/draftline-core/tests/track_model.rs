use draftline_core::{
    DocumentError, Segment, Timeline, Timerange, TrackKind, timeline::CreateTrackRequest,
};
use proptest::prelude::*;
use serde_json::json;

fn timeline_with_tracks() -> (Timeline, String, String) {
    let mut timeline = Timeline::new(30);
    let video = timeline
        .create_track(CreateTrackRequest::new("video", TrackKind::Video))
        .expect("video track should be created");
    let text = timeline
        .create_track(CreateTrackRequest::new("subtitle", TrackKind::Text).with_flag(3))
        .expect("text track should be created");
    (timeline, video.id, text.id)
}

#[test]
fn segments_get_track_specific_defaults() {
    let (mut timeline, video, text) = timeline_with_tracks();

    let clip = timeline
        .add_segment(&video, Segment::new("m1", Timerange::new(0, 1_000_000)))
        .expect("segment should be added");
    let caption = timeline
        .add_segment(&text, Segment::new("m2", Timerange::new(0, 1_000_000)))
        .expect("segment should be added");

    assert!(clip.extra.contains_key("clip"));
    assert_eq!(caption.extra.get("render_index"), Some(&json!(14_000)));
    assert_eq!(
        caption.extra.get("clip").and_then(|clip| clip.pointer("/transform/y")),
        Some(&json!(-0.73))
    );
}

#[test]
fn caller_fields_win_over_defaults() {
    let (mut timeline, video, _) = timeline_with_tracks();
    let mut segment = Segment::new("m1", Timerange::new(0, 1));
    segment.extra.insert("volume".to_string(), json!(0.25));

    let stored = timeline
        .add_segment(&video, segment)
        .expect("segment should be added");
    assert_eq!(stored.extra.get("volume"), Some(&json!(0.25)));
}

#[test]
fn duplicate_segment_ids_are_rejected() {
    let (mut timeline, video, _) = timeline_with_tracks();
    let mut first = Segment::new("m1", Timerange::new(0, 1));
    first.id = "seg-1".to_string();
    let mut second = first.clone();
    second.id = "SEG-1".to_string();

    timeline
        .add_segment(&video, first)
        .expect("first segment should be added");
    assert!(matches!(
        timeline.add_segment(&video, second),
        Err(DocumentError::DuplicateIdentifier { .. })
    ));
    assert_eq!(timeline.track(&video).map(|track| track.segments.len()), Some(1));
}

#[test]
fn unknown_tracks_report_not_found() {
    let (mut timeline, _, _) = timeline_with_tracks();
    assert!(matches!(
        timeline.add_segment("missing", Segment::new("m", Timerange::new(0, 1))),
        Err(DocumentError::TrackNotFound(_))
    ));
    assert_eq!(timeline.track_duration("missing"), 0);
    assert!(timeline.track_by_name("missing").is_err());
}

#[test]
fn update_and_remove_segment() {
    let (mut timeline, video, _) = timeline_with_tracks();
    let stored = timeline
        .add_segment(&video, Segment::new("m1", Timerange::new(0, 1_000_000)))
        .expect("segment should be added");

    let updated = timeline
        .update_segment(
            &video,
            &stored.id,
            json!({ "target_timerange": { "start": 500_000, "duration": 1_000_000 }, "id": "X" }),
        )
        .expect("update should succeed")
        .expect("segment should be found");
    assert_eq!(updated.id, stored.id);
    assert_eq!(timeline.track_duration(&video), 1_500_000);

    assert!(
        timeline
            .remove_segment(&video, &stored.id.to_lowercase())
            .expect("track exists")
    );
    assert_eq!(timeline.track_duration(&video), 0);
}

#[test]
fn last_segment_prefers_the_earliest_of_equal_starts() {
    let (mut timeline, video, _) = timeline_with_tracks();
    let mut first = Segment::new("first", Timerange::new(2_000_000, 100_000));
    first.source_timerange = Some(Timerange::new(0, 66_666));
    let second = Segment::new("second", Timerange::new(2_000_000, 100_000));
    let earlier = Segment::new("earlier", Timerange::new(0, 100_000));

    for segment in [first, second, earlier] {
        timeline
            .add_segment(&video, segment)
            .expect("segment should be added");
    }

    let last = timeline.last_segment(&video).expect("track has segments");
    assert_eq!(last.material_id, "first");
    assert_eq!(timeline.last_remaining_frames(&video), 2);
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn durations_are_monotone(ranges in prop::collection::vec((0u64..50_000_000u64, 0u64..10_000_000u64, any::<bool>()), 1..24)) {
        let (mut timeline, video, text) = timeline_with_tracks();
        let mut expected_video = 0;
        let mut expected_text = 0;

        for (start, duration, on_video) in ranges {
            let before_total = timeline.total_duration();
            let track = if on_video { &video } else { &text };
            timeline
                .add_segment(track, Segment::new("m", Timerange::new(start, duration)))
                .expect("segment should be added");

            if on_video {
                expected_video = expected_video.max(start + duration);
            } else {
                expected_text = expected_text.max(start + duration);
            }
            prop_assert!(timeline.total_duration() >= before_total);
            prop_assert_eq!(timeline.track_duration(&video), expected_video);
            prop_assert_eq!(timeline.track_duration(&text), expected_text);
            prop_assert_eq!(timeline.total_duration(), expected_video.max(expected_text));
        }
    }
}
