//! Plan-driven batch assembly: declare tracks, then fill them from folders
//! of media and subtitle files.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use walkdir::WalkDir;

use crate::{
    builder::TextType,
    editor::{Editor, ImageClipRequest},
    error::{DocumentError, DocumentResult},
    model::{Collection, Segment, TrackKind},
    probe::{MediaKind, MediaProber, classify_extension},
    srt,
    timeline::CreateTrackRequest,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssemblyPlan {
    pub tracks: Vec<TrackPlan>,
    pub media: Vec<MediaBatch>,
    pub images: Vec<ImageBatch>,
    pub subtitles: Vec<SubtitleBatch>,
    /// Size the canvas after the first video clip placed.
    pub canvas_from_first_video: bool,
}

impl Default for AssemblyPlan {
    fn default() -> Self {
        Self {
            tracks: Vec::new(),
            media: Vec::new(),
            images: Vec::new(),
            subtitles: Vec::new(),
            canvas_from_first_video: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackPlan {
    pub name: String,
    pub kind: TrackKind,
    #[serde(default)]
    pub flag: i64,
}

/// Video or audio files appended one after another to a track. An empty
/// file list means every supported file in the directory, by path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaBatch {
    pub track: String,
    pub directory: PathBuf,
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

/// Image file `i` covers segment `i` of the reference track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageBatch {
    pub track: String,
    pub reference_track: String,
    pub directory: PathBuf,
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

/// SRT file `i` is timed against segment `i` of the reference track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubtitleBatch {
    pub track: String,
    pub reference_track: String,
    pub directory: PathBuf,
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub text_type: TextType,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct AssemblyReport {
    pub tracks_created: usize,
    pub clips_inserted: usize,
    pub clips_skipped: usize,
    pub images_inserted: usize,
    pub subtitles_inserted: usize,
    pub canvas: Option<(u32, u32)>,
    pub duration_us: u64,
}

pub fn load_plan(path: &Path) -> Result<AssemblyPlan> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read assembly plan {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("failed to parse assembly plan TOML from {}", path.display()))
}

/// Video and audio files directly inside `directory`, sorted by path.
#[instrument(fields(directory = %directory.display()))]
pub fn scan_media_files(directory: &Path) -> Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(anyhow::anyhow!(
            "media path is not a directory: {}",
            directory.display()
        ));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(directory).min_depth(1).max_depth(1).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                warn!(?error, "ignoring unreadable entry while scanning media");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if matches!(
            classify_extension(entry.path()),
            MediaKind::Video | MediaKind::Audio
        ) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    debug!(count = files.len(), "media scan complete");
    Ok(files)
}

/// Runs `plan` against the editor's document. Relative directories resolve
/// against `base_dir`.
#[instrument(skip(editor, plan), fields(base_dir = %base_dir.display()))]
pub fn assemble<P: MediaProber>(
    editor: &mut Editor<P>,
    plan: &AssemblyPlan,
    base_dir: &Path,
) -> DocumentResult<AssemblyReport> {
    let mut report = AssemblyReport::default();

    let mut tracks = plan.tracks.clone();
    tracks.sort_by_key(|track| track.kind.rank());
    for track in tracks {
        if editor.document().timeline().track_by_name(&track.name).is_ok() {
            debug!(name = %track.name, "track already present");
            continue;
        }
        editor.add_track(CreateTrackRequest::new(track.name, track.kind).with_flag(track.flag))?;
        report.tracks_created += 1;
    }

    for batch in &plan.media {
        let Some(track_id) = track_id_by_name(editor, &batch.track) else {
            continue;
        };
        let directory = base_dir.join(&batch.directory);
        let files = if batch.files.is_empty() {
            scan_media_files(&directory)?
        } else {
            batch.files.iter().map(|file| directory.join(file)).collect()
        };

        for path in files {
            match editor.append_media_clip(&path, &track_id) {
                Ok(Some(segment)) => {
                    report.clips_inserted += 1;
                    if plan.canvas_from_first_video && report.canvas.is_none() {
                        report.canvas = size_canvas_from(editor, &segment);
                    }
                }
                Ok(None) => report.clips_skipped += 1,
                Err(error @ DocumentError::UnsupportedMediaKind { .. }) => {
                    warn!(%error, track = %batch.track, "clip does not fit the track");
                    report.clips_skipped += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    for batch in &plan.images {
        let (Some(track_id), Some(reference_track_id)) = (
            track_id_by_name(editor, &batch.track),
            track_id_by_name(editor, &batch.reference_track),
        ) else {
            continue;
        };
        let directory = base_dir.join(&batch.directory);
        for (index, file) in batch.files.iter().enumerate() {
            let request = ImageClipRequest {
                path: directory.join(file),
                track_id: track_id.clone(),
                reference_track_id: reference_track_id.clone(),
                index,
            };
            if editor.insert_image_clip(request)?.is_some() {
                report.images_inserted += 1;
            }
        }
    }

    for batch in &plan.subtitles {
        let (Some(track_id), Some(reference_track_id)) = (
            track_id_by_name(editor, &batch.track),
            track_id_by_name(editor, &batch.reference_track),
        ) else {
            continue;
        };
        let directory = base_dir.join(&batch.directory);
        for (index, file) in batch.files.iter().enumerate() {
            let cues = srt::parse_srt_file(&directory.join(file))?;
            let inserted = editor.insert_subtitle_clips(
                &cues,
                &track_id,
                &reference_track_id,
                index,
                batch.text_type,
            )?;
            report.subtitles_inserted += inserted.len();
        }
    }

    report.duration_us = editor.sync_duration();
    info!(
        tracks_created = report.tracks_created,
        clips_inserted = report.clips_inserted,
        clips_skipped = report.clips_skipped,
        images_inserted = report.images_inserted,
        subtitles_inserted = report.subtitles_inserted,
        duration_us = report.duration_us,
        "assembly complete"
    );
    Ok(report)
}

fn track_id_by_name<P: MediaProber>(editor: &Editor<P>, name: &str) -> Option<String> {
    match editor.document().timeline().track_by_name(name) {
        Ok(track) => Some(track.id.clone()),
        Err(error) => {
            error!(%error, "skipping batch");
            None
        }
    }
}

/// Sizes the canvas from the video material behind `segment`, if it is one.
fn size_canvas_from<P: MediaProber>(editor: &mut Editor<P>, segment: &Segment) -> Option<(u32, u32)> {
    let material = editor
        .document()
        .materials()
        .peek(Collection::Videos, &segment.material_id)?;
    let dimension = |key: &str| {
        material
            .get(key)
            .and_then(serde_json::Value::as_u64)
            .and_then(|value| u32::try_from(value).ok())
    };
    let (width, height) = (dimension("width")?, dimension("height")?);
    Some(editor.update_canvas_dimensions(width, height))
}
