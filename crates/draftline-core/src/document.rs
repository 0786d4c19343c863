use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    error::{DocumentError, DocumentResult},
    materials::MaterialStore,
    model::{CanvasConfig, Collection, DEFAULT_FPS, Draft, Fields, Record},
    timeline::Timeline,
};

/// A segment reference that does not resolve to any material record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingReference {
    pub track_id: String,
    pub segment_id: String,
    pub reference: String,
}

/// Working form of a draft: registries for every material collection and the
/// timeline, plus whatever top-level host data came with the file.
#[derive(Debug, Clone)]
pub struct Document {
    id: String,
    duration: u64,
    color_space: i64,
    canvas: CanvasConfig,
    materials: MaterialStore,
    timeline: Timeline,
    other_materials: Fields,
    config: Fields,
    extra: Fields,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(DEFAULT_FPS)
    }
}

impl Document {
    #[must_use]
    pub fn new(fps: u32) -> Self {
        let draft = Draft::empty();
        Self {
            id: draft.id,
            duration: 0,
            color_space: draft.color_space,
            canvas: draft.canvas_config,
            materials: MaterialStore::new(),
            timeline: Timeline::new(fps),
            other_materials: Fields::new(),
            config: Fields::new(),
            extra: draft.extra,
        }
    }

    pub fn from_draft(draft: Draft, fps: u32) -> DocumentResult<Self> {
        let Draft {
            id,
            duration,
            color_space,
            canvas_config,
            mut materials,
            tracks,
            mut config,
            extra,
        } = draft;

        let mut collections = Vec::with_capacity(Collection::COUNT);
        for collection in Collection::ALL {
            let source = if collection.lives_in_config() {
                &mut config
            } else {
                &mut materials
            };
            let records = match source.remove(collection.key()) {
                Some(value) => decode_records(collection, value)?,
                None => Vec::new(),
            };
            collections.push((collection, records));
        }

        let document = Self {
            id,
            duration,
            color_space,
            canvas: canvas_config,
            materials: MaterialStore::from_collections(collections)?,
            timeline: Timeline::from_tracks(tracks, fps)?,
            other_materials: materials,
            config,
            extra,
        };
        debug!(
            document_id = %document.id,
            tracks = document.timeline.tracks().len(),
            materials = document.materials.total_len(),
            "document loaded"
        );
        Ok(document)
    }

    #[must_use]
    pub fn to_draft(&self) -> Draft {
        self.clone().into_draft()
    }

    #[must_use]
    pub fn into_draft(self) -> Draft {
        let mut materials = self.other_materials;
        let mut config = self.config;
        for (collection, records) in self.materials.into_collections() {
            let target = if collection.lives_in_config() {
                &mut config
            } else {
                &mut materials
            };
            let array = records.into_iter().map(|record| Value::Object(record.0)).collect();
            target.insert(collection.key().to_string(), Value::Array(array));
        }

        Draft {
            id: self.id,
            duration: self.duration,
            color_space: self.color_space,
            canvas_config: self.canvas,
            materials,
            tracks: self.timeline.into_tracks(),
            config,
            extra: self.extra,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Declared duration, as last synced.
    #[must_use]
    pub fn duration(&self) -> u64 {
        self.duration
    }

    #[must_use]
    pub fn canvas(&self) -> &CanvasConfig {
        &self.canvas
    }

    #[must_use]
    pub fn materials(&self) -> &MaterialStore {
        &self.materials
    }

    pub fn materials_mut(&mut self) -> &mut MaterialStore {
        &mut self.materials
    }

    #[must_use]
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }

    /// Writes the furthest segment end across all tracks into `duration`.
    pub fn sync_duration(&mut self) -> u64 {
        self.duration = self.timeline.total_duration();
        debug!(duration = self.duration, "document duration synced");
        self.duration
    }

    pub fn set_canvas_dimensions(&mut self, width: u32, height: u32) {
        self.canvas.width = width;
        self.canvas.height = height;
        info!(width, height, "canvas resized");
    }

    /// Segment material and auxiliary references that resolve nowhere.
    #[must_use]
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let mut dangling = Vec::new();
        for track in self.timeline.tracks() {
            for segment in &track.segments {
                let references = std::iter::once(&segment.material_id)
                    .chain(segment.extra_material_refs.iter());
                for reference in references {
                    if !self.materials.contains_anywhere(reference) {
                        dangling.push(DanglingReference {
                            track_id: track.id.clone(),
                            segment_id: segment.id.clone(),
                            reference: reference.clone(),
                        });
                    }
                }
            }
        }
        if !dangling.is_empty() {
            warn!(count = dangling.len(), "document has dangling references");
        }
        dangling
    }
}

fn decode_records(collection: Collection, value: Value) -> DocumentResult<Vec<Record>> {
    let Value::Array(items) = value else {
        return Err(DocumentError::invalid_record(format!(
            "{} must be an array",
            collection.key()
        )));
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(fields) => Ok(Record(fields)),
            _ => Err(DocumentError::invalid_record(format!(
                "{} entries must be objects",
                collection.key()
            ))),
        })
        .collect()
}
