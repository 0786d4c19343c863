use std::path::Path;

use draftline_core::{
    Collection, DocumentError, Editor, EditorOptions, ImageClipRequest, MediaKind, TextType,
    Timerange,
    fixtures::{
        DEMO_SUBTITLE_TRACK_ID, DEMO_VIDEO_TRACK_ID, DEMO_VOCAL_TRACK_ID, FixedProber,
        demo_document,
    },
    parse_srt,
};
use serde_json::json;

fn demo_editor(prober: FixedProber) -> Editor<FixedProber> {
    Editor::new(
        demo_document().expect("demo document should build"),
        prober,
        EditorOptions::default(),
    )
}

fn collection_of(editor: &Editor<FixedProber>, id: &str) -> Option<Collection> {
    Collection::ALL
        .into_iter()
        .find(|collection| editor.document().materials().has(*collection, id))
}

#[test]
fn video_clip_uses_the_compensated_duration() {
    let mut editor = demo_editor(FixedProber::default().with_video("clips/a.mp4", 6.455_011, 1280, 720));

    let segment = editor
        .insert_video_clip(
            Path::new("clips/a.mp4"),
            DEMO_VIDEO_TRACK_ID,
            Timerange::new(0, 6_466_666),
        )
        .expect("insert should succeed")
        .expect("track exists");

    assert_eq!(segment.target_timerange, Timerange::new(0, 6_466_666));
    assert_eq!(segment.source_timerange, Some(Timerange::new(0, 6_466_666)));

    let material = editor
        .document()
        .materials()
        .snapshot(Collection::Videos, &segment.material_id)
        .expect("video material should exist");
    assert_eq!(material.get("type"), Some(&json!("video")));
    assert_eq!(material.get("duration"), Some(&json!(6_466_666)));
    assert_eq!(material.get("width"), Some(&json!(1280)));
    assert_eq!(material.get("path"), Some(&json!("clips/a.mp4")));
}

#[test]
fn video_clip_refs_follow_the_host_order() {
    let mut editor = demo_editor(FixedProber::default().with_video("a.mp4", 2.0, 1920, 1080));
    let segment = editor
        .insert_video_clip(Path::new("a.mp4"), DEMO_VIDEO_TRACK_ID, Timerange::new(0, 2_000_000))
        .expect("insert should succeed")
        .expect("track exists");

    let collections: Vec<_> = segment
        .extra_material_refs
        .iter()
        .map(|id| collection_of(&editor, id))
        .collect();
    assert_eq!(
        collections,
        vec![
            Some(Collection::Speeds),
            Some(Collection::Canvases),
            Some(Collection::SoundChannelMappings),
            Some(Collection::VocalSeparations),
        ]
    );
    for collection in [
        Collection::Speeds,
        Collection::Canvases,
        Collection::SoundChannelMappings,
        Collection::VocalSeparations,
    ] {
        assert_eq!(editor.document().materials().len(collection), 1);
    }
    assert!(editor.document().dangling_references().is_empty());
}

#[test]
fn audio_clip_refs_include_a_beat_record() {
    let mut editor = demo_editor(FixedProber::default().with_audio("music.wav", 1.0));
    let segment = editor
        .insert_audio_clip(Path::new("music.wav"), DEMO_VOCAL_TRACK_ID, Timerange::new(3_000_000, 1_000_000))
        .expect("insert should succeed")
        .expect("track exists");

    let collections: Vec<_> = segment
        .extra_material_refs
        .iter()
        .map(|id| collection_of(&editor, id))
        .collect();
    assert_eq!(
        collections,
        vec![
            Some(Collection::Speeds),
            Some(Collection::Beats),
            Some(Collection::SoundChannelMappings),
            Some(Collection::VocalSeparations),
        ]
    );
    assert_eq!(editor.document().materials().len(Collection::Audios), 2);
}

#[test]
fn image_clip_covers_the_reference_segment() {
    let mut editor = demo_editor(FixedProber::default().with_image("cover.png", 800, 600));
    let segment = editor
        .insert_image_clip(ImageClipRequest {
            path: "cover.png".into(),
            track_id: DEMO_VIDEO_TRACK_ID.to_string(),
            reference_track_id: DEMO_VOCAL_TRACK_ID.to_string(),
            index: 0,
        })
        .expect("insert should succeed")
        .expect("track exists");

    assert_eq!(segment.target_timerange, Timerange::new(1_000_000, 2_000_000));
    assert_eq!(segment.source_timerange, Some(Timerange::new(0, 2_000_000)));

    let photo = editor
        .document()
        .materials()
        .snapshot(Collection::Videos, &segment.material_id)
        .expect("photo material should exist");
    assert_eq!(photo.get("type"), Some(&json!("photo")));
    assert_eq!(photo.get("width"), Some(&json!(800)));

    let first_ref = segment
        .extra_material_refs
        .first()
        .expect("image clip should carry refs");
    assert_eq!(collection_of(&editor, first_ref), Some(Collection::Canvases));
}

#[test]
fn image_clip_needs_the_reference_segment() {
    let mut editor = demo_editor(FixedProber::default().with_image("cover.png", 800, 600));
    let result = editor.insert_image_clip(ImageClipRequest {
        path: "cover.png".into(),
        track_id: DEMO_VIDEO_TRACK_ID.to_string(),
        reference_track_id: DEMO_VOCAL_TRACK_ID.to_string(),
        index: 4,
    });
    assert!(matches!(
        result,
        Err(DocumentError::ReferenceSegmentMissing { index: 4, .. })
    ));
}

#[test]
fn subtitles_are_offset_by_the_reference_start() {
    let mut editor = demo_editor(FixedProber::default());
    let cues = parse_srt(
        "1\n00:00:00,360 --> 00:00:02,120\n第一句\n\n2\n00:00:02,500 --> 00:00:03,000\nsecond line\n",
    )
    .expect("srt should parse");

    let inserted = editor
        .insert_subtitle_clips(
            &cues,
            DEMO_SUBTITLE_TRACK_ID,
            DEMO_VOCAL_TRACK_ID,
            0,
            TextType::Subtitle,
        )
        .expect("insert should succeed");

    assert_eq!(inserted.len(), 2);
    assert_eq!(inserted[0].target_timerange, Timerange::new(1_360_000, 1_760_000));
    assert_eq!(inserted[1].target_timerange, Timerange::new(3_500_000, 500_000));
    assert!(inserted.iter().all(|segment| segment.source_timerange.is_none()));

    let text = editor
        .document()
        .materials()
        .snapshot(Collection::Texts, &inserted[0].material_id)
        .expect("text material should exist");
    assert_eq!(text.get("type"), Some(&json!("subtitle")));
    let content: serde_json::Value = serde_json::from_str(
        text.get("content")
            .and_then(serde_json::Value::as_str)
            .expect("content should be a string"),
    )
    .expect("content should be json");
    assert_eq!(content["text"], json!("第一句"));
    assert_eq!(
        collection_of(&editor, &inserted[0].extra_material_refs[0]),
        Some(Collection::MaterialAnimations)
    );
}

#[test]
fn single_cue_lands_at_origin_plus_start() {
    let mut editor = demo_editor(FixedProber::default());
    let cues = parse_srt("1\n00:00:00,360 --> 00:00:02,120\nhello\n").expect("srt should parse");

    let segment = editor
        .insert_subtitle_clip(&cues[0], DEMO_SUBTITLE_TRACK_ID, 500_000, TextType::Text)
        .expect("insert should succeed")
        .expect("track exists");

    assert_eq!(segment.target_timerange.start, 860_000);
    assert_eq!(segment.target_timerange.end(), 2_620_000);
    let text = editor
        .document()
        .materials()
        .snapshot(Collection::Texts, &segment.material_id)
        .expect("text material should exist");
    assert_eq!(text.get("type"), Some(&json!("text")));
}

#[test]
fn unknown_track_is_skipped_without_side_effects() {
    let mut editor = demo_editor(FixedProber::default().with_video("a.mp4", 2.0, 1920, 1080));
    let before = editor.document().to_draft();

    let result = editor
        .insert_video_clip(Path::new("a.mp4"), "NOT-A-TRACK", Timerange::new(0, 2_000_000))
        .expect("unknown track should not be an error");

    assert!(result.is_none());
    assert_eq!(editor.document().to_draft(), before);
}

#[test]
fn empty_track_id_is_rejected() {
    let mut editor = demo_editor(FixedProber::default().with_video("a.mp4", 2.0, 1920, 1080));
    let result = editor.insert_video_clip(Path::new("a.mp4"), "  ", Timerange::new(0, 2_000_000));
    assert!(matches!(result, Err(DocumentError::InvalidRecord { .. })));
}

#[test]
fn probing_an_image_as_video_is_a_kind_error() {
    let mut editor = demo_editor(FixedProber::default().with_image("still.png", 10, 10));
    let result = editor.insert_video_clip(Path::new("still.png"), DEMO_VIDEO_TRACK_ID, Timerange::new(0, 1));
    assert!(matches!(result, Err(DocumentError::UnsupportedMediaKind { .. })));
}

#[test]
fn appended_clips_are_consecutive_and_cycle_aligned() {
    let prober = FixedProber::default()
        .with_video("one.mp4", 2.05, 1920, 1080)
        .with_video("two.mp4", 2.05, 1920, 1080)
        .with_video("three.mp4", 2.05, 1920, 1080);
    let mut editor = demo_editor(prober);

    let mut ends = Vec::new();
    for name in ["one.mp4", "two.mp4", "three.mp4"] {
        let segment = editor
            .append_media_clip(Path::new(name), DEMO_VIDEO_TRACK_ID)
            .expect("append should succeed")
            .expect("track exists");
        if let Some(previous) = ends.last() {
            assert_eq!(segment.target_timerange.start, *previous);
        }
        ends.push(segment.target_timerange.end());
    }

    // 62 frames each: 20 cycles plus two leftover frames.
    assert_eq!(ends[0], 2_066_666);
    assert_eq!(ends[1], 4_133_333);
    assert_eq!(ends[2], 6_200_000);
    assert_eq!(editor.sync_duration(), 6_200_000);
    assert_eq!(editor.document().duration(), 6_200_000);
}

#[test]
fn last_clip_in_track_is_a_copy() {
    let mut editor = demo_editor(FixedProber::default());
    let mut copy = editor
        .last_clip_in_track(DEMO_VOCAL_TRACK_ID)
        .expect("vocal track has a segment");
    copy.target_timerange.start = 42;

    let stored = editor
        .document()
        .timeline()
        .last_segment(DEMO_VOCAL_TRACK_ID)
        .expect("segment should remain");
    assert_eq!(stored.target_timerange.start, 1_000_000);
    assert!(editor.last_clip_in_track("missing").is_none());
}

#[test]
fn appended_media_must_match_the_track_kind() {
    let prober = FixedProber::default()
        .with_audio("voice.wav", 2.0)
        .with_video("clip.mp4", 2.0, 1920, 1080);
    let mut editor = demo_editor(prober);
    let before = editor.document().to_draft();

    let audio_on_video = editor.append_media_clip(Path::new("voice.wav"), DEMO_VIDEO_TRACK_ID);
    assert!(matches!(
        audio_on_video,
        Err(DocumentError::UnsupportedMediaKind {
            expected: MediaKind::Video,
            found: MediaKind::Audio,
            ..
        })
    ));
    let video_on_audio = editor.append_media_clip(Path::new("clip.mp4"), DEMO_VOCAL_TRACK_ID);
    assert!(matches!(
        video_on_audio,
        Err(DocumentError::UnsupportedMediaKind {
            expected: MediaKind::Audio,
            found: MediaKind::Video,
            ..
        })
    ));
    assert_eq!(editor.document().to_draft(), before);

    let placed = editor
        .append_media_clip(Path::new("voice.wav"), DEMO_VOCAL_TRACK_ID)
        .expect("audio on an audio track should succeed")
        .expect("track exists");
    assert_eq!(placed.target_timerange, Timerange::new(3_000_000, 2_000_000));
}
