use draftline_core::{
    DocumentError, Segment, Timeline, Timerange, TrackKind,
    builder::compensated_target,
    time::{CYCLE_MICROSECONDS, frames_in, remaining_frames, timeline_duration},
    timeline::CreateTrackRequest,
};
use proptest::prelude::*;

#[test]
fn probed_video_of_six_and_a_half_seconds() {
    let metrics = timeline_duration(6.455_011, 30).expect("duration should be valid");
    assert_eq!(metrics.total_frames, 194);
    assert_eq!(metrics.total_frames / 3, 64);
    assert_eq!(metrics.remaining_frames, 2);
    assert_eq!(metrics.timeline_duration_us, 6_466_666);
}

#[test]
fn zero_and_negative_inputs() {
    let zero = timeline_duration(0.0, 30).expect("zero should be valid");
    assert_eq!(
        (zero.total_frames, zero.timeline_duration_us, zero.remaining_frames),
        (0, 0, 0)
    );

    let negative = timeline_duration(-3.0, 30);
    assert!(matches!(negative, Err(DocumentError::InvalidDuration(_))));
    assert_eq!(negative.unwrap_or_default().timeline_duration_us, 0);
}

/// Places three equal clips back to back the way the editor does, padding
/// each target at its boundary.
fn three_consecutive_targets(source_duration: u64) -> [Timerange; 3] {
    let mut timeline = Timeline::new(30);
    let track = timeline
        .create_track(CreateTrackRequest::new("video", TrackKind::Video))
        .expect("track should be created");

    let mut placed = [Timerange::default(); 3];
    for slot in &mut placed {
        let start = timeline.track_duration(&track.id);
        let target = compensated_target(Timerange::new(start, source_duration), source_duration, 30);
        let mut segment = Segment::new("M", target);
        segment.source_timerange = Some(Timerange::new(0, source_duration));
        *slot = timeline
            .add_segment(&track.id, segment)
            .expect("append should succeed")
            .target_timerange;
    }
    placed
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn remaining_frames_inverts_the_forward_computation(millis in 0u64..36_000_000u64) {
        let seconds = millis as f64 / 1_000.0;
        let metrics = timeline_duration(seconds, 30).expect("duration should be valid");
        prop_assert_eq!(remaining_frames(metrics.timeline_duration_us, 30), metrics.remaining_frames);
        prop_assert_eq!(frames_in(metrics.timeline_duration_us, 30), metrics.total_frames);
    }

    #[test]
    fn three_equal_clips_never_drift(millis in 0u64..600_000u64) {
        let seconds = millis as f64 / 1_000.0;
        let metrics = timeline_duration(seconds, 30).expect("duration should be valid");
        let placed = three_consecutive_targets(metrics.timeline_duration_us);

        let total: u64 = placed.iter().map(|range| range.duration).sum();
        prop_assert_eq!(total % CYCLE_MICROSECONDS, 0);
        prop_assert_eq!(placed[2].end(), total);
    }

    #[test]
    fn compensated_durations_never_shrink(seconds in 0.0f64..3_600.0f64) {
        let metrics = timeline_duration(seconds, 30).expect("duration should be valid");
        prop_assert!(metrics.timeline_duration_us as f64 + 1.0 >= seconds * 1_000_000.0);
    }
}
