use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::templates;

pub const DEFAULT_FPS: u32 = 30;
pub const DEFAULT_CANVAS_WIDTH: u32 = 1920;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 1080;

/// Loose JSON fields carried alongside typed ones.
pub type Fields = Map<String, Value>;

/// Fresh uppercase UUID-v4, the identifier format the host application writes.
#[must_use]
pub fn generate_id() -> String {
    Uuid::new_v4().to_string().to_uppercase()
}

pub(crate) fn same_id(left: &str, right: &str) -> bool {
    left.eq_ignore_ascii_case(right)
}

/// Records addressable by a string identifier.
pub trait Identified {
    fn id(&self) -> &str;
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Timerange {
    pub start: u64,
    pub duration: u64,
}

impl Timerange {
    #[must_use]
    pub const fn new(start: u64, duration: u64) -> Self {
        Self { start, duration }
    }

    #[must_use]
    pub const fn end(&self) -> u64 {
        self.start.saturating_add(self.duration)
    }
}

/// The full draft document as stored in `draft_content.json`.
///
/// Only the fields the editor reasons about are typed; everything else rides
/// along in `extra` so a load/save cycle does not drop host data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Draft {
    pub id: String,
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub color_space: i64,
    #[serde(default)]
    pub canvas_config: CanvasConfig,
    #[serde(default)]
    pub materials: Fields,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub config: Fields,
    #[serde(flatten)]
    pub extra: Fields,
}

impl Draft {
    #[must_use]
    pub fn empty() -> Self {
        let mut materials = Fields::new();
        let mut config = Fields::new();
        for collection in Collection::ALL {
            let target = if collection.lives_in_config() {
                &mut config
            } else {
                &mut materials
            };
            target.insert(collection.key().to_string(), Value::Array(Vec::new()));
        }

        Self {
            id: generate_id(),
            duration: 0,
            color_space: 0,
            canvas_config: CanvasConfig::default(),
            materials,
            tracks: Vec::new(),
            config,
            extra: Fields::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanvasConfig {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub ratio: String,
    #[serde(flatten)]
    pub extra: Fields,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            ratio: "original".to_string(),
            extra: Fields::new(),
        }
    }
}

/// Upscales `width` x `height` until both sides exceed 1000 px and at least
/// one side reaches 1920 px. Never shrinks; rounds up.
#[must_use]
pub fn scale_dimensions(width: u32, height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }

    let shortest = f64::from(width.min(height));
    let longest = f64::from(width.max(height));
    let scale = (1001.0 / shortest).max(1920.0 / longest).max(1.0);

    let scaled = |side: u32| (f64::from(side) * scale).ceil() as u32;
    (scaled(width), scaled(height))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Video,
    Audio,
    Text,
}

impl TrackKind {
    /// Ordering the host expects tracks to be declared in.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Video => 1,
            Self::Audio => 2,
            Self::Text => 3,
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Text => "text",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TrackKind,
    #[serde(default)]
    pub attribute: i64,
    #[serde(default)]
    pub flag: i64,
    #[serde(default = "default_true")]
    pub is_default_name: bool,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(flatten)]
    pub extra: Fields,
}

impl Track {
    /// End of the furthest segment, or 0 for an empty track.
    #[must_use]
    pub fn duration(&self) -> u64 {
        self.segments
            .iter()
            .map(|segment| segment.target_timerange.end())
            .max()
            .unwrap_or_default()
    }
}

impl Identified for Track {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    pub id: String,
    pub material_id: String,
    #[serde(default)]
    pub extra_material_refs: Vec<String>,
    #[serde(default)]
    pub source_timerange: Option<Timerange>,
    pub target_timerange: Timerange,
    #[serde(flatten)]
    pub extra: Fields,
}

impl Segment {
    #[must_use]
    pub fn new(material_id: impl Into<String>, target_timerange: Timerange) -> Self {
        Self {
            id: generate_id(),
            material_id: material_id.into(),
            extra_material_refs: Vec::new(),
            source_timerange: None,
            target_timerange,
            extra: Fields::new(),
        }
    }
}

impl Identified for Segment {
    fn id(&self) -> &str {
        &self.id
    }
}

/// An untyped material or auxiliary record, kept as the raw JSON object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Record(pub Fields);

impl Record {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.0
    }
}

impl Identified for Record {
    fn id(&self) -> &str {
        self.0.get("id").and_then(Value::as_str).unwrap_or_default()
    }
}

/// A JSON array holding records, either under `materials` or under `config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    Videos,
    Audios,
    Texts,
    Speeds,
    Canvases,
    SoundChannelMappings,
    VocalSeparations,
    Beats,
    MaterialAnimations,
    LyricsTaskInfo,
}

impl Collection {
    pub const COUNT: usize = 10;
    pub const ALL: [Self; Self::COUNT] = [
        Self::Videos,
        Self::Audios,
        Self::Texts,
        Self::Speeds,
        Self::Canvases,
        Self::SoundChannelMappings,
        Self::VocalSeparations,
        Self::Beats,
        Self::MaterialAnimations,
        Self::LyricsTaskInfo,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Videos => "videos",
            Self::Audios => "audios",
            Self::Texts => "texts",
            Self::Speeds => "speeds",
            Self::Canvases => "canvases",
            Self::SoundChannelMappings => "sound_channel_mappings",
            Self::VocalSeparations => "vocal_separations",
            Self::Beats => "beats",
            Self::MaterialAnimations => "material_animations",
            Self::LyricsTaskInfo => "lyrics_taskinfo",
        }
    }

    #[must_use]
    pub const fn lives_in_config(self) -> bool {
        matches!(self, Self::LyricsTaskInfo)
    }

    /// Kind whose template the collection's registry uses by default.
    #[must_use]
    pub const fn primary_kind(self) -> MaterialKind {
        match self {
            Self::Videos => MaterialKind::Video,
            Self::Audios => MaterialKind::Audio,
            Self::Texts => MaterialKind::Subtitle,
            Self::Speeds => MaterialKind::Speed,
            Self::Canvases => MaterialKind::Canvas,
            Self::SoundChannelMappings => MaterialKind::SoundChannelMapping,
            Self::VocalSeparations => MaterialKind::VocalSeparation,
            Self::Beats => MaterialKind::Beat,
            Self::MaterialAnimations => MaterialKind::MaterialAnimation,
            Self::LyricsTaskInfo => MaterialKind::LyricsTaskInfo,
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    Video,
    Photo,
    Audio,
    Subtitle,
    Title,
    Speed,
    Canvas,
    SoundChannelMapping,
    VocalSeparation,
    Beat,
    MaterialAnimation,
    LyricsTaskInfo,
}

impl MaterialKind {
    #[must_use]
    pub const fn collection(self) -> Collection {
        match self {
            Self::Video | Self::Photo => Collection::Videos,
            Self::Audio => Collection::Audios,
            Self::Subtitle | Self::Title => Collection::Texts,
            Self::Speed => Collection::Speeds,
            Self::Canvas => Collection::Canvases,
            Self::SoundChannelMapping => Collection::SoundChannelMappings,
            Self::VocalSeparation => Collection::VocalSeparations,
            Self::Beat => Collection::Beats,
            Self::MaterialAnimation => Collection::MaterialAnimations,
            Self::LyricsTaskInfo => Collection::LyricsTaskInfo,
        }
    }

    #[must_use]
    pub fn template(self) -> Fields {
        templates::material_template(self)
    }
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Video => "video",
            Self::Photo => "photo",
            Self::Audio => "audio",
            Self::Subtitle => "subtitle",
            Self::Title => "title",
            Self::Speed => "speed",
            Self::Canvas => "canvas",
            Self::SoundChannelMapping => "sound_channel_mapping",
            Self::VocalSeparation => "vocal_separation",
            Self::Beat => "beat",
            Self::MaterialAnimation => "material_animation",
            Self::LyricsTaskInfo => "lyrics_taskinfo",
        })
    }
}

const fn default_true() -> bool {
    true
}
