use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde_json::json;

use crate::{
    document::Document,
    error::{DocumentError, DocumentResult},
    model::{DEFAULT_FPS, Draft, MaterialKind, Segment, Timerange, TrackKind},
    probe::{AudioMetadata, ImageMetadata, MediaProber, ProbedMedia, VideoMetadata},
    timeline::CreateTrackRequest,
};

pub const DEMO_DRAFT_ID: &str = "9ED0A3FA-4064-458F-B95F-1FDD0BC4F0BE";
pub const DEMO_VIDEO_TRACK_ID: &str = "A959FD97-0E35-445D-A7E8-FE6D81D49235";
pub const DEMO_VOCAL_TRACK_ID: &str = "11EB0CE5-CDB7-4F30-BC14-53A3A1E10DE3";
pub const DEMO_SUBTITLE_TRACK_ID: &str = "FBF41A8F-C5B4-464B-A9F3-6E62EEBF6EFB";
pub const DEMO_VOCAL_MATERIAL_ID: &str = "3B7F4C1D-2E6A-4F0B-9C8D-5A1E2F3B4C5D";
pub const DEMO_VOCAL_SEGMENT_ID: &str = "7D1E9A2B-4C3F-4E8A-B6D5-0F9E8D7C6B5A";

/// Small document with an empty video track, a vocal track holding one
/// segment at 1s..3s, and an empty subtitle track.
pub fn demo_document() -> DocumentResult<Document> {
    let mut draft = Draft::empty();
    draft.id = DEMO_DRAFT_ID.to_string();
    let mut document = Document::from_draft(draft, DEFAULT_FPS)?;

    document.materials_mut().create(
        MaterialKind::Audio,
        json!({
            "id": DEMO_VOCAL_MATERIAL_ID,
            "duration": 2_000_000,
            "name": "vocal.wav",
            "path": "media/vocal.wav",
        }),
    )?;

    let timeline = document.timeline_mut();
    timeline.create_track(CreateTrackRequest {
        id: Some(DEMO_VIDEO_TRACK_ID.to_string()),
        ..CreateTrackRequest::new("video", TrackKind::Video)
    })?;
    timeline.create_track(CreateTrackRequest {
        id: Some(DEMO_VOCAL_TRACK_ID.to_string()),
        ..CreateTrackRequest::new("vocal", TrackKind::Audio)
    })?;
    timeline.create_track(CreateTrackRequest {
        id: Some(DEMO_SUBTITLE_TRACK_ID.to_string()),
        ..CreateTrackRequest::new("subtitle", TrackKind::Text).with_flag(3)
    })?;

    let mut vocal = Segment::new(DEMO_VOCAL_MATERIAL_ID, Timerange::new(1_000_000, 2_000_000));
    vocal.id = DEMO_VOCAL_SEGMENT_ID.to_string();
    vocal.source_timerange = Some(Timerange::new(0, 2_000_000));
    timeline.add_segment(DEMO_VOCAL_TRACK_ID, vocal)?;

    document.sync_duration();
    Ok(document)
}

/// In-memory prober answering from a fixed table of paths.
#[derive(Debug, Clone, Default)]
pub struct FixedProber {
    media: BTreeMap<PathBuf, ProbedMedia>,
}

impl FixedProber {
    #[must_use]
    pub fn with(mut self, path: impl Into<PathBuf>, media: ProbedMedia) -> Self {
        self.media.insert(path.into(), media);
        self
    }

    #[must_use]
    pub fn with_video(self, path: impl Into<PathBuf>, duration: f64, width: u32, height: u32) -> Self {
        self.with(
            path,
            ProbedMedia::Video(VideoMetadata {
                duration,
                width,
                height,
                has_audio: true,
                codec_name: "h264".to_string(),
                bit_rate: None,
                frame_rate: Some(30.0),
                sample_rate: Some(48_000),
                channels: Some(2),
            }),
        )
    }

    #[must_use]
    pub fn with_audio(self, path: impl Into<PathBuf>, duration: f64) -> Self {
        self.with(
            path,
            ProbedMedia::Audio(AudioMetadata {
                duration,
                sample_rate: 44_100,
                channels: 2,
                codec_name: "pcm_s16le".to_string(),
                bit_rate: None,
            }),
        )
    }

    #[must_use]
    pub fn with_image(self, path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        self.with(
            path,
            ProbedMedia::Image(ImageMetadata {
                width,
                height,
                codec_name: "png".to_string(),
            }),
        )
    }
}

impl MediaProber for FixedProber {
    fn probe(&self, path: &Path) -> DocumentResult<ProbedMedia> {
        self.media
            .get(path)
            .cloned()
            .ok_or_else(|| DocumentError::probe_failure(path, "no fixture media for path"))
    }
}
