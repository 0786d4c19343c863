//! Computed fields for new records.
//!
//! Builders produce only what depends on the clip at hand (ids, paths,
//! dimensions, durations, text). Defaults come from [`crate::templates`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    model::{MaterialKind, Segment, Timerange, generate_id},
    probe::{ImageMetadata, VideoMetadata},
    time,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextType {
    /// Plain title text.
    Text,
    #[default]
    Subtitle,
}

impl TextType {
    #[must_use]
    pub const fn material_kind(self) -> MaterialKind {
        match self {
            Self::Text => MaterialKind::Title,
            Self::Subtitle => MaterialKind::Subtitle,
        }
    }
}

/// Look of inserted subtitle and title text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub font_path: String,
    pub font_title: String,
    pub font_size: f64,
    pub fill_color: [f64; 3],
    pub stroke_color: [f64; 3],
    pub stroke_width: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_path: String::new(),
            font_title: String::new(),
            font_size: 5.0,
            fill_color: [1.0, 0.870_588_243_007_66, 0.0],
            stroke_color: [0.0, 0.0, 0.0],
            stroke_width: 0.079_999_998_211_860_66,
        }
    }
}

/// Forward slashes only; the host reads paths that way on every platform.
#[must_use]
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[must_use]
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn video_material(path: &Path, metadata: &VideoMetadata, duration_us: u64) -> Value {
    json!({
        "id": generate_id(),
        "duration": duration_us,
        "width": metadata.width,
        "height": metadata.height,
        "local_material_id": generate_id(),
        "material_name": file_name(path),
        "path": normalize_path(path),
    })
}

pub fn photo_material(path: &Path, metadata: &ImageMetadata) -> Value {
    json!({
        "id": generate_id(),
        "width": metadata.width,
        "height": metadata.height,
        "local_material_id": generate_id(),
        "material_name": file_name(path),
        "path": normalize_path(path),
    })
}

pub fn audio_material(path: &Path, duration_us: u64) -> Value {
    json!({
        "id": generate_id(),
        "duration": duration_us,
        "local_material_id": generate_id(),
        "music_id": generate_id(),
        "name": file_name(path),
        "path": normalize_path(path),
    })
}

pub fn text_material(text: &str, style: &TextStyle) -> Value {
    let mut material = json!({
        "id": generate_id(),
        "content": text_content(text, style),
        "font_size": style.font_size,
        "border_width": style.stroke_width,
    });
    if !style.font_path.is_empty() {
        material["font_path"] = Value::String(style.font_path.clone());
    }
    if !style.font_title.is_empty() {
        material["font_title"] = Value::String(style.font_title.clone());
    }
    material
}

/// The host's rich-text document for `text`. The style range is counted in
/// UTF-16 code units.
#[must_use]
pub fn text_content(text: &str, style: &TextStyle) -> String {
    let length = text.encode_utf16().count();
    json!({
        "text": text,
        "styles": [{
            "fill": { "content": { "solid": { "color": style.fill_color } } },
            "font": { "path": style.font_path, "id": "" },
            "strokes": [{
                "content": { "solid": { "color": style.stroke_color } },
                "width": style.stroke_width,
            }],
            "size": style.font_size,
            "useLetterColor": true,
            "range": [0, length],
        }],
    })
    .to_string()
}

/// Fresh auxiliary record carrying only an id; the kind's template does the
/// rest.
#[must_use]
pub fn auxiliary_record() -> Value {
    json!({ "id": generate_id() })
}

#[must_use]
pub fn segment(
    material_id: &str,
    extra_material_refs: Vec<String>,
    source: Option<Timerange>,
    target: Timerange,
) -> Segment {
    let mut segment = Segment::new(material_id, target);
    segment.extra_material_refs = extra_material_refs;
    segment.source_timerange = source;
    segment
}

/// `target` with the boundary pad for a source of `source_duration`.
#[must_use]
pub fn compensated_target(target: Timerange, source_duration: u64, fps: u32) -> Timerange {
    let pad = time::boundary_pad(target.start, source_duration, fps);
    Timerange::new(target.start, target.duration + pad)
}
