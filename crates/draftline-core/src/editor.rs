use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::{
    builder::{self, TextStyle, TextType},
    document::Document,
    error::{DocumentError, DocumentResult},
    model::{DEFAULT_FPS, Identified, MaterialKind, Segment, Timerange, Track, TrackKind, scale_dimensions},
    persistence,
    probe::{AudioMetadata, MediaKind, MediaProber, ProbedMedia, VideoMetadata},
    srt::SubtitleCue,
    time::{self, TimelineMetrics},
    timeline::{CreateTrackRequest, offset_range},
};

pub const SUBTITLE_TRACK_FLAG: i64 = 3;
pub const TITLE_TRACK_FLAG: i64 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackNames {
    pub video: String,
    pub audio: String,
    pub subtitle: String,
    pub title: String,
}

impl Default for TrackNames {
    fn default() -> Self {
        Self {
            video: "video".to_string(),
            audio: "audio".to_string(),
            subtitle: "subtitle".to_string(),
            title: "title".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditorOptions {
    pub fps: u32,
    pub text_style: TextStyle,
    pub track_names: TrackNames,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            text_style: TextStyle::default(),
            track_names: TrackNames::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageClipRequest {
    pub path: PathBuf,
    pub track_id: String,
    pub reference_track_id: String,
    pub index: usize,
}

/// Inserts clips into a document, creating the materials and effect records
/// each clip needs and keeping segment timing frame-aligned.
#[derive(Debug)]
pub struct Editor<P> {
    document: Document,
    prober: P,
    options: EditorOptions,
}

impl<P: MediaProber> Editor<P> {
    #[must_use]
    pub fn new(document: Document, prober: P, options: EditorOptions) -> Self {
        Self {
            document,
            prober,
            options,
        }
    }

    /// Editor over a fresh, empty document.
    #[must_use]
    pub fn blank(prober: P, options: EditorOptions) -> Self {
        let document = Document::new(options.fps);
        Self::new(document, prober, options)
    }

    #[instrument(skip(prober, options), fields(path = %path.display()))]
    pub fn open(path: &Path, prober: P, options: EditorOptions) -> DocumentResult<Self> {
        let draft = persistence::load_draft(path)?;
        let document = Document::from_draft(draft, options.fps)?;
        Ok(Self::new(document, prober, options))
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    #[must_use]
    pub fn into_document(self) -> Document {
        self.document
    }

    #[must_use]
    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    #[must_use]
    pub fn prober(&self) -> &P {
        &self.prober
    }

    pub fn add_track(&mut self, request: CreateTrackRequest) -> DocumentResult<Track> {
        self.document.timeline_mut().create_track(request)
    }

    pub fn add_video_track(&mut self) -> DocumentResult<Track> {
        let name = self.options.track_names.video.clone();
        self.add_track(CreateTrackRequest::new(name, TrackKind::Video))
    }

    pub fn add_audio_track(&mut self) -> DocumentResult<Track> {
        let name = self.options.track_names.audio.clone();
        self.add_track(CreateTrackRequest::new(name, TrackKind::Audio))
    }

    pub fn add_subtitle_track(&mut self) -> DocumentResult<Track> {
        let name = self.options.track_names.subtitle.clone();
        self.add_track(CreateTrackRequest::new(name, TrackKind::Text).with_flag(SUBTITLE_TRACK_FLAG))
    }

    pub fn add_title_track(&mut self) -> DocumentResult<Track> {
        let name = self.options.track_names.title.clone();
        self.add_track(CreateTrackRequest::new(name, TrackKind::Text).with_flag(TITLE_TRACK_FLAG))
    }

    /// Copy of the last segment in the track's list, if any.
    #[must_use]
    pub fn last_clip_in_track(&self, track_id: &str) -> Option<Segment> {
        self.document
            .timeline()
            .track(track_id)
            .and_then(|track| track.segments.last().cloned())
    }

    #[instrument(skip(self), fields(path = %path.display(), track_id = %track_id))]
    pub fn insert_video_clip(
        &mut self,
        path: &Path,
        track_id: &str,
        target: Timerange,
    ) -> DocumentResult<Option<Segment>> {
        if !self.track_is_available(track_id)? {
            return Ok(None);
        }
        let metadata = self.probe(path)?.into_video(path)?;
        self.place_video(path, &metadata, track_id, target)
    }

    #[instrument(skip(self), fields(path = %path.display(), track_id = %track_id))]
    pub fn insert_audio_clip(
        &mut self,
        path: &Path,
        track_id: &str,
        target: Timerange,
    ) -> DocumentResult<Option<Segment>> {
        if !self.track_is_available(track_id)? {
            return Ok(None);
        }
        let metadata = self.probe(path)?.into_audio(path)?;
        self.place_audio(path, &metadata, track_id, target)
    }

    /// Probes `path` once and places it at the current end of the track,
    /// lasting its full compensated duration. The probed kind must match the
    /// track: video files on video tracks, audio files on audio tracks.
    #[instrument(skip(self), fields(path = %path.display(), track_id = %track_id))]
    pub fn append_media_clip(
        &mut self,
        path: &Path,
        track_id: &str,
    ) -> DocumentResult<Option<Segment>> {
        if !self.track_is_available(track_id)? {
            return Ok(None);
        }
        let expected = self
            .document
            .timeline()
            .track(track_id)
            .map_or(MediaKind::Unsupported, |track| media_kind_for(track.kind));
        let media = self.probe(path)?;
        if media.kind() != expected {
            return Err(DocumentError::UnsupportedMediaKind {
                path: path.to_path_buf(),
                expected,
                found: media.kind(),
            });
        }

        let start = self.document.timeline().track_duration(track_id);
        match media {
            ProbedMedia::Video(metadata) => {
                let target = Timerange::new(start, self.metrics(metadata.duration)?.timeline_duration_us);
                self.place_video(path, &metadata, track_id, target)
            }
            ProbedMedia::Audio(metadata) => {
                let target = Timerange::new(start, self.metrics(metadata.duration)?.timeline_duration_us);
                self.place_audio(path, &metadata, track_id, target)
            }
            other => Err(DocumentError::UnsupportedMediaKind {
                path: path.to_path_buf(),
                expected,
                found: other.kind(),
            }),
        }
    }

    /// Places a still image over the span of segment `index` on the
    /// reference track.
    #[instrument(skip(self, request), fields(path = %request.path.display(), track_id = %request.track_id, reference_track_id = %request.reference_track_id, index = request.index))]
    pub fn insert_image_clip(&mut self, request: ImageClipRequest) -> DocumentResult<Option<Segment>> {
        let placement = self
            .document
            .timeline()
            .place_from_reference(&request.reference_track_id, request.index)?;
        if !self.track_is_available(&request.track_id)? {
            return Ok(None);
        }
        let metadata = self.probe(&request.path)?.into_image(&request.path)?;

        let material = self.document.materials_mut().create(
            MaterialKind::Photo,
            builder::photo_material(&request.path, &metadata),
        )?;
        let refs = self.auxiliary_refs(&[
            MaterialKind::Canvas,
            MaterialKind::SoundChannelMapping,
            MaterialKind::Speed,
            MaterialKind::VocalSeparation,
        ])?;

        let segment = builder::segment(
            material.id(),
            refs,
            Some(placement.source),
            placement.target,
        );
        self.append(&request.track_id, segment, "image clip inserted")
    }

    /// Times every cue against segment `index` of the reference track.
    #[instrument(skip(self, cues), fields(track_id = %track_id, reference_track_id = %reference_track_id, index, cues = cues.len()))]
    pub fn insert_subtitle_clips(
        &mut self,
        cues: &[SubtitleCue],
        track_id: &str,
        reference_track_id: &str,
        index: usize,
        text_type: TextType,
    ) -> DocumentResult<Vec<Segment>> {
        let origin = self
            .document
            .timeline()
            .reference_timerange(reference_track_id, index)?
            .start;

        let mut inserted = Vec::with_capacity(cues.len());
        for cue in cues {
            if let Some(segment) = self.insert_subtitle_clip(cue, track_id, origin, text_type)? {
                inserted.push(segment);
            }
        }
        info!(inserted = inserted.len(), "subtitles inserted");
        Ok(inserted)
    }

    /// Places one cue, offset by `origin` microseconds.
    #[instrument(skip(self, cue), fields(track_id = %track_id, cue = cue.index, origin))]
    pub fn insert_subtitle_clip(
        &mut self,
        cue: &SubtitleCue,
        track_id: &str,
        origin: u64,
        text_type: TextType,
    ) -> DocumentResult<Option<Segment>> {
        if !self.track_is_available(track_id)? {
            return Ok(None);
        }
        let target = offset_range(origin, cue.start_us, cue.end_us)?;
        self.place_text(&cue.text, track_id, target, text_type)
    }

    #[instrument(skip(self, text), fields(track_id = %track_id))]
    pub fn insert_title_clip(
        &mut self,
        text: &str,
        track_id: &str,
        target: Timerange,
    ) -> DocumentResult<Option<Segment>> {
        if !self.track_is_available(track_id)? {
            return Ok(None);
        }
        self.place_text(text, track_id, target, TextType::Text)
    }

    /// Sizes the canvas for a `width` x `height` source, upscaled the way the
    /// host expects.
    pub fn update_canvas_dimensions(&mut self, width: u32, height: u32) -> (u32, u32) {
        let (width, height) = scale_dimensions(width, height);
        self.document.set_canvas_dimensions(width, height);
        (width, height)
    }

    pub fn sync_duration(&mut self) -> u64 {
        self.document.sync_duration()
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn save(&mut self, path: &Path) -> DocumentResult<()> {
        self.sync_duration();
        persistence::save_draft(path, &self.document.to_draft())?;
        Ok(())
    }

    fn place_video(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
        track_id: &str,
        target: Timerange,
    ) -> DocumentResult<Option<Segment>> {
        let metrics = self.metrics(metadata.duration)?;
        let material = self.document.materials_mut().create(
            MaterialKind::Video,
            builder::video_material(path, metadata, metrics.timeline_duration_us),
        )?;
        let refs = self.auxiliary_refs(&[
            MaterialKind::Speed,
            MaterialKind::Canvas,
            MaterialKind::SoundChannelMapping,
            MaterialKind::VocalSeparation,
        ])?;

        let source = Timerange::new(0, metrics.timeline_duration_us);
        let target = builder::compensated_target(target, source.duration, self.options.fps);
        let segment = builder::segment(material.id(), refs, Some(source), target);
        self.append(track_id, segment, "video clip inserted")
    }

    fn place_audio(
        &mut self,
        path: &Path,
        metadata: &AudioMetadata,
        track_id: &str,
        target: Timerange,
    ) -> DocumentResult<Option<Segment>> {
        let metrics = self.metrics(metadata.duration)?;
        let material = self.document.materials_mut().create(
            MaterialKind::Audio,
            builder::audio_material(path, metrics.timeline_duration_us),
        )?;
        let refs = self.auxiliary_refs(&[
            MaterialKind::Speed,
            MaterialKind::Beat,
            MaterialKind::SoundChannelMapping,
            MaterialKind::VocalSeparation,
        ])?;

        let source = Timerange::new(0, metrics.timeline_duration_us);
        let target = builder::compensated_target(target, source.duration, self.options.fps);
        let segment = builder::segment(material.id(), refs, Some(source), target);
        self.append(track_id, segment, "audio clip inserted")
    }

    fn place_text(
        &mut self,
        text: &str,
        track_id: &str,
        target: Timerange,
        text_type: TextType,
    ) -> DocumentResult<Option<Segment>> {
        let material = self.document.materials_mut().create(
            text_type.material_kind(),
            builder::text_material(text, &self.options.text_style),
        )?;
        let refs = self.auxiliary_refs(&[MaterialKind::MaterialAnimation])?;
        let segment = builder::segment(material.id(), refs, None, target);
        self.append(track_id, segment, "text clip inserted")
    }

    fn probe(&self, path: &Path) -> DocumentResult<ProbedMedia> {
        let media = self.prober.probe(path)?;
        media.log(path);
        Ok(media)
    }

    fn metrics(&self, seconds: f64) -> DocumentResult<TimelineMetrics> {
        let metrics = time::timeline_duration(seconds, self.options.fps)?;
        debug!(
            total_frames = metrics.total_frames,
            duration_us = metrics.timeline_duration_us,
            remaining_frames = metrics.remaining_frames,
            "timeline metrics"
        );
        Ok(metrics)
    }

    /// Fresh effect records, one per kind, in the order given.
    fn auxiliary_refs(&mut self, kinds: &[MaterialKind]) -> DocumentResult<Vec<String>> {
        kinds
            .iter()
            .map(|kind| {
                let record = self
                    .document
                    .materials_mut()
                    .create(*kind, builder::auxiliary_record())?;
                Ok(record.id().to_string())
            })
            .collect()
    }

    /// An empty id is a caller error; an unknown one is logged and skipped.
    fn track_is_available(&self, track_id: &str) -> DocumentResult<bool> {
        if track_id.trim().is_empty() {
            return Err(DocumentError::invalid_record("a target track id is required"));
        }
        if self.document.timeline().has_track(track_id) {
            return Ok(true);
        }
        error!(%track_id, "clip not inserted, track not found");
        Ok(false)
    }

    fn append(
        &mut self,
        track_id: &str,
        segment: Segment,
        message: &'static str,
    ) -> DocumentResult<Option<Segment>> {
        match self.document.timeline_mut().add_segment(track_id, segment) {
            Ok(segment) => {
                info!(
                    segment_id = %segment.id,
                    start = segment.target_timerange.start,
                    duration = segment.target_timerange.duration,
                    "{message}"
                );
                Ok(Some(segment))
            }
            Err(DocumentError::TrackNotFound(missing)) => {
                error!(track_id = %missing, "clip not inserted, track not found");
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }
}

fn media_kind_for(kind: TrackKind) -> MediaKind {
    match kind {
        TrackKind::Video => MediaKind::Video,
        TrackKind::Audio => MediaKind::Audio,
        TrackKind::Text => MediaKind::Unsupported,
    }
}
