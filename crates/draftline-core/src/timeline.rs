use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::{
    error::{DocumentError, DocumentResult},
    model::{DEFAULT_FPS, Fields, Segment, Timerange, Track, TrackKind, generate_id, same_id},
    registry::Registry,
    templates::{SegmentStyle, segment_template},
    time,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTrackRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub kind: TrackKind,
    #[serde(default)]
    pub flag: i64,
}

impl CreateTrackRequest {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: None,
            name: name.into(),
            kind,
            flag: 0,
        }
    }

    #[must_use]
    pub fn with_flag(mut self, flag: i64) -> Self {
        self.flag = flag;
        self
    }
}

/// Placement derived from a segment on another track: the target range is
/// reused, the source range starts at zero with the same length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferencePlacement {
    pub target: Timerange,
    pub source: Timerange,
}

/// Tracks of a draft and the segments they own.
#[derive(Debug, Clone)]
pub struct Timeline {
    tracks: Registry<Track>,
    fps: u32,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(DEFAULT_FPS)
    }
}

impl Timeline {
    #[must_use]
    pub fn new(fps: u32) -> Self {
        Self::from_tracks_unchecked(Vec::new(), fps)
    }

    /// Adopts already-built tracks, refusing repeated track ids.
    pub fn from_tracks(tracks: Vec<Track>, fps: u32) -> DocumentResult<Self> {
        let mut timeline = Self::new(fps);
        for track in tracks {
            if timeline.tracks.has(&track.id) {
                return Err(DocumentError::DuplicateIdentifier {
                    collection: "tracks",
                    id: track.id,
                });
            }
            timeline.tracks.all_mut().push(track);
        }
        Ok(timeline)
    }

    fn from_tracks_unchecked(tracks: Vec<Track>, fps: u32) -> Self {
        Self {
            tracks: Registry::with_items("tracks", track_template(), tracks),
            fps,
        }
    }

    #[must_use]
    pub fn fps(&self) -> u32 {
        self.fps
    }

    #[must_use]
    pub fn tracks(&self) -> &[Track] {
        self.tracks.all()
    }

    #[must_use]
    pub fn track(&self, track_id: &str) -> Option<&Track> {
        self.tracks.peek(track_id)
    }

    #[must_use]
    pub fn snapshot(&self, track_id: &str) -> Option<Track> {
        self.tracks.snapshot(track_id)
    }

    #[must_use]
    pub fn has_track(&self, track_id: &str) -> bool {
        self.tracks.has(track_id)
    }

    #[instrument(skip(self), fields(track_name = %request.name, track_kind = %request.kind))]
    pub fn create_track(&mut self, request: CreateTrackRequest) -> DocumentResult<Track> {
        let id = request.id.unwrap_or_else(generate_id);
        let track = self
            .tracks
            .create(json!({
                "id": id,
                "name": request.name,
                "type": request.kind,
                "flag": request.flag,
            }))?
            .clone();
        info!(track_id = %track.id, "track created");
        Ok(track)
    }

    /// Appends `segment` to the track, filling in any field the segment lacks
    /// from the defaults for the track's kind. Returns a copy of what was
    /// stored. Segment ids are unique across every track.
    #[instrument(skip(self, segment), fields(track_id = %track_id, segment_id = %segment.id))]
    pub fn add_segment(&mut self, track_id: &str, mut segment: Segment) -> DocumentResult<Segment> {
        if !self.tracks.has(track_id) {
            return Err(DocumentError::TrackNotFound(track_id.to_string()));
        }
        segment.id = segment.id.to_uppercase();
        if self.find_segment(&segment.id).is_some() {
            return Err(DocumentError::DuplicateIdentifier {
                collection: "segments",
                id: segment.id,
            });
        }
        let track = self
            .tracks
            .peek_mut(track_id)
            .ok_or_else(|| DocumentError::TrackNotFound(track_id.to_string()))?;

        for (key, value) in segment_template(SegmentStyle::for_track(track.kind)) {
            segment.extra.entry(key).or_insert(value);
        }

        track.segments.push(segment.clone());
        debug!(
            start = segment.target_timerange.start,
            duration = segment.target_timerange.duration,
            "segment appended"
        );
        Ok(segment)
    }

    /// Shallow-merges `patch` into one segment; its id never changes.
    #[instrument(skip(self, patch), fields(track_id = %track_id, segment_id = %segment_id))]
    pub fn update_segment(
        &mut self,
        track_id: &str,
        segment_id: &str,
        patch: Value,
    ) -> DocumentResult<Option<Segment>> {
        let Value::Object(mut patch) = patch else {
            return Err(DocumentError::invalid_record(
                "segment update must be a JSON object",
            ));
        };
        let track = self
            .tracks
            .peek_mut(track_id)
            .ok_or_else(|| DocumentError::TrackNotFound(track_id.to_string()))?;
        let Some(segment) = track
            .segments
            .iter_mut()
            .find(|segment| same_id(&segment.id, segment_id))
        else {
            warn!("segment update ignored, segment not found");
            return Ok(None);
        };

        if patch.remove("id").is_some() {
            warn!("refusing to change segment id");
        }

        let mut merged = match serde_json::to_value(&*segment) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => Fields::new(),
            Err(error) => return Err(DocumentError::invalid_record(error.to_string())),
        };
        merged.extend(patch);
        let updated: Segment = serde_json::from_value(Value::Object(merged))
            .map_err(|error| DocumentError::invalid_record(format!("segment: {error}")))?;

        *segment = updated.clone();
        info!("segment updated");
        Ok(Some(updated))
    }

    #[instrument(skip(self), fields(track_id = %track_id, segment_id = %segment_id))]
    pub fn remove_segment(&mut self, track_id: &str, segment_id: &str) -> DocumentResult<bool> {
        let track = self
            .tracks
            .peek_mut(track_id)
            .ok_or_else(|| DocumentError::TrackNotFound(track_id.to_string()))?;
        let before = track.segments.len();
        track
            .segments
            .retain(|segment| !same_id(&segment.id, segment_id));
        let removed = track.segments.len() != before;
        if removed {
            info!("segment removed");
        } else {
            warn!("segment remove ignored, segment not found");
        }
        Ok(removed)
    }

    #[instrument(skip(self), fields(track_id = %track_id))]
    pub fn remove_track(&mut self, track_id: &str) -> bool {
        self.tracks.remove(track_id)
    }

    /// Track id and segment for a segment id, searching every track.
    #[must_use]
    pub fn find_segment(&self, segment_id: &str) -> Option<(&str, &Segment)> {
        self.tracks.all().iter().find_map(|track| {
            track
                .segments
                .iter()
                .find(|segment| same_id(&segment.id, segment_id))
                .map(|segment| (track.id.as_str(), segment))
        })
    }

    /// End of the furthest segment on the track; 0 for empty or unknown tracks.
    #[must_use]
    pub fn track_duration(&self, track_id: &str) -> u64 {
        self.tracks.peek(track_id).map_or(0, Track::duration)
    }

    #[must_use]
    pub fn total_duration(&self) -> u64 {
        self.tracks
            .all()
            .iter()
            .map(Track::duration)
            .max()
            .unwrap_or_default()
    }

    /// First track whose name matches exactly.
    pub fn track_by_name(&self, name: &str) -> DocumentResult<&Track> {
        self.tracks
            .all()
            .iter()
            .find(|track| track.name == name)
            .ok_or_else(|| DocumentError::TrackNotFound(name.to_string()))
    }

    /// Segment with the latest start; the earliest of equal starts wins.
    #[must_use]
    pub fn last_segment(&self, track_id: &str) -> Option<&Segment> {
        let track = self.tracks.peek(track_id)?;
        track.segments.iter().reduce(|latest, segment| {
            if segment.target_timerange.start > latest.target_timerange.start {
                segment
            } else {
                latest
            }
        })
    }

    /// Frames left over by the source of the track's last segment.
    #[must_use]
    pub fn last_remaining_frames(&self, track_id: &str) -> u64 {
        let Some(segment) = self.last_segment(track_id) else {
            return 0;
        };
        let source_duration = segment
            .source_timerange
            .map_or(segment.target_timerange.duration, |range| range.duration);
        time::remaining_frames(source_duration, self.fps)
    }

    pub fn reference_timerange(&self, track_id: &str, index: usize) -> DocumentResult<Timerange> {
        let track = self
            .tracks
            .peek(track_id)
            .ok_or_else(|| DocumentError::TrackNotFound(track_id.to_string()))?;
        track
            .segments
            .get(index)
            .map(|segment| segment.target_timerange)
            .ok_or_else(|| DocumentError::ReferenceSegmentMissing {
                track_id: track_id.to_string(),
                index,
            })
    }

    pub fn place_from_reference(
        &self,
        track_id: &str,
        index: usize,
    ) -> DocumentResult<ReferencePlacement> {
        let target = self.reference_timerange(track_id, index)?;
        Ok(ReferencePlacement {
            target,
            source: Timerange::new(0, target.duration),
        })
    }

    /// Places `start_us..end_us`, measured from the reference segment's
    /// start, on the timeline.
    pub fn offset_from_reference(
        &self,
        track_id: &str,
        index: usize,
        start_us: u64,
        end_us: u64,
    ) -> DocumentResult<Timerange> {
        let origin = self.reference_timerange(track_id, index)?.start;
        offset_range(origin, start_us, end_us)
    }

    #[must_use]
    pub fn into_tracks(self) -> Vec<Track> {
        self.tracks.into_items()
    }
}

/// `start_us..end_us` shifted by `origin`.
pub fn offset_range(origin: u64, start_us: u64, end_us: u64) -> DocumentResult<Timerange> {
    let duration = end_us.checked_sub(start_us).ok_or_else(|| {
        DocumentError::InvalidDuration(format!("range ends at {end_us} before it starts at {start_us}"))
    })?;
    let start = origin.checked_add(start_us).ok_or_else(|| {
        DocumentError::InvalidDuration(format!("offset {start_us} from {origin} overflows the timeline"))
    })?;
    start.checked_add(duration).ok_or_else(|| {
        DocumentError::InvalidDuration(format!("range starting at {start} overflows the timeline"))
    })?;
    Ok(Timerange::new(start, duration))
}

fn track_template() -> Fields {
    match json!({
        "attribute": 0,
        "flag": 0,
        "is_default_name": true,
        "segments": [],
    }) {
        Value::Object(fields) => fields,
        _ => Fields::new(),
    }
}
