// The host's material tables are deep `json!` literals.
#![recursion_limit = "512"]

pub mod assembly;
pub mod bootstrap;
pub mod builder;
pub mod config;
pub mod diagnostics;
pub mod document;
pub mod editor;
pub mod error;
pub mod fixtures;
pub mod materials;
pub mod model;
pub mod persistence;
pub mod probe;
pub mod registry;
pub mod srt;
pub mod templates;
pub mod time;
pub mod timeline;

pub use assembly::{AssemblyPlan, AssemblyReport, assemble, load_plan, scan_media_files};
pub use bootstrap::{ProjectHandle, create_new_project, create_new_project_named};
pub use builder::{TextStyle, TextType};
pub use config::AppConfig;
pub use diagnostics::{DiagnosticsConfig, TelemetryGuard, init_tracing};
pub use document::{DanglingReference, Document};
pub use editor::{Editor, EditorOptions, ImageClipRequest, TrackNames};
pub use error::{DocumentError, DocumentResult};
pub use materials::MaterialStore;
pub use model::{
    CanvasConfig, Collection, DEFAULT_FPS, Draft, Fields, Identified, MaterialKind, Record,
    Segment, Timerange, Track, TrackKind, generate_id, scale_dimensions,
};
pub use persistence::{load_draft, save_draft};
pub use probe::{
    AudioMetadata, ImageMetadata, MediaKind, MediaProber, ProbedMedia, SystemProber,
    VideoMetadata,
};
pub use registry::Registry;
pub use srt::{SubtitleCue, parse_srt, parse_srt_file};
pub use time::{
    TimelineMetrics, boundary_pad, remaining_frames, timeline_duration, timeline_duration_default,
};
pub use timeline::{CreateTrackRequest, ReferencePlacement, Timeline};
