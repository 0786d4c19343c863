//! Default field tables for every record kind the editor creates.
//!
//! These are plain data. Builders only supply computed fields (ids, paths,
//! durations, dimensions) and the registry merges them over these defaults.

use serde_json::{Value, json};

use crate::model::{Fields, MaterialKind, TrackKind};

/// Duration the host assigns to still images, in microseconds (3 hours).
pub const PHOTO_MATERIAL_DURATION_US: u64 = 10_800_000_000;

/// Render order the host gives subtitle segments so they sit above video.
pub const TEXT_RENDER_INDEX: u64 = 14_000;

/// Look of a segment, chosen from the kind of clip it places.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentStyle {
    Visual,
    Audio,
    Text,
}

impl SegmentStyle {
    #[must_use]
    pub const fn for_track(kind: TrackKind) -> Self {
        match kind {
            TrackKind::Video => Self::Visual,
            TrackKind::Audio => Self::Audio,
            TrackKind::Text => Self::Text,
        }
    }
}

#[must_use]
pub fn material_template(kind: MaterialKind) -> Fields {
    let value = match kind {
        MaterialKind::Video => visual_material("video", 0),
        MaterialKind::Photo => visual_material("photo", PHOTO_MATERIAL_DURATION_US),
        MaterialKind::Audio => audio_material(),
        MaterialKind::Subtitle => text_material("subtitle"),
        MaterialKind::Title => text_material("text"),
        MaterialKind::Speed => json!({
            "curve_speed": null,
            "mode": 0,
            "speed": 1,
            "type": "speed"
        }),
        MaterialKind::Canvas => json!({
            "album_image": "",
            "blur": 0,
            "color": "",
            "image": "",
            "image_id": "",
            "image_name": "",
            "source_platform": 0,
            "team_id": "",
            "type": "canvas_color"
        }),
        MaterialKind::SoundChannelMapping => json!({
            "audio_channel_mapping": 0,
            "is_config_open": false,
            "type": ""
        }),
        MaterialKind::VocalSeparation => json!({
            "choice": 0,
            "production_path": "",
            "time_range": null,
            "type": "vocal_separation"
        }),
        MaterialKind::Beat => json!({
            "ai_beats": {
                "beat_speed_infos": [],
                "beats_path": "",
                "beats_url": "",
                "melody_path": "",
                "melody_percents": [0],
                "melody_url": ""
            },
            "enable_ai_beats": false,
            "gear": 404,
            "gear_count": 0,
            "mode": 404,
            "type": "beats",
            "user_beats": [],
            "user_delete_ai_beats": null
        }),
        MaterialKind::MaterialAnimation => json!({
            "animations": [],
            "multi_language_current": "none",
            "type": "sticker_animation"
        }),
        MaterialKind::LyricsTaskInfo => json!({}),
    };
    into_fields(value)
}

/// Fields a segment on a track of this style carries besides its identity
/// and timing.
#[must_use]
pub fn segment_template(style: SegmentStyle) -> Fields {
    let mut fields = into_fields(json!({
        "caption_info": null,
        "cartoon": false,
        "common_keyframes": [],
        "enable_color_correct_adjust": false,
        "enable_color_curves": true,
        "enable_color_match_adjust": false,
        "enable_color_wheels": true,
        "enable_smart_color_adjust": false,
        "group_id": "",
        "intensifies_audio": false,
        "is_placeholder": false,
        "is_tone_modify": false,
        "keyframe_refs": [],
        "last_nonzero_volume": 1,
        "responsive_layout": {
            "enable": false,
            "horizontal_pos_layout": 0,
            "size_layout": 0,
            "target_follow": "",
            "vertical_pos_layout": 0
        },
        "reverse": false,
        "speed": 1,
        "template_id": "",
        "template_scene": "default",
        "track_attribute": 0,
        "visible": true,
        "volume": 1
    }));

    let style_fields = match style {
        SegmentStyle::Visual => json!({
            "clip": clip_transform(0.0),
            "enable_adjust": true,
            "enable_lut": true,
            "hdr_settings": { "intensity": 1, "mode": 1, "nits": 1000 },
            "render_index": 0,
            "track_render_index": 0,
            "uniform_scale": { "on": true, "value": 1 }
        }),
        SegmentStyle::Audio => json!({
            "clip": null,
            "enable_adjust": false,
            "enable_lut": false,
            "hdr_settings": null,
            "render_index": 0,
            "track_render_index": 0,
            "uniform_scale": null
        }),
        SegmentStyle::Text => json!({
            "clip": clip_transform(-0.73),
            "enable_adjust": false,
            "enable_lut": false,
            "hdr_settings": null,
            "render_index": TEXT_RENDER_INDEX,
            "track_render_index": 1,
            "uniform_scale": { "on": true, "value": 1 }
        }),
    };
    fields.extend(into_fields(style_fields));
    fields
}

fn clip_transform(vertical_offset: f64) -> Value {
    json!({
        "alpha": 1,
        "flip": { "horizontal": false, "vertical": false },
        "rotation": 0,
        "scale": { "x": 1, "y": 1 },
        "transform": { "x": 0, "y": vertical_offset }
    })
}

fn visual_material(kind: &str, duration: u64) -> Value {
    json!({
        "aigc_type": "none",
        "audio_fade": null,
        "cartoon_path": "",
        "category_id": "",
        "category_name": "local",
        "check_flag": 63487,
        "crop": {
            "lower_left_x": 0,
            "lower_left_y": 1,
            "lower_right_x": 1,
            "lower_right_y": 1,
            "upper_left_x": 0,
            "upper_left_y": 0,
            "upper_right_x": 1,
            "upper_right_y": 0
        },
        "crop_ratio": "free",
        "crop_scale": 1,
        "duration": duration,
        "extra_type_option": 0,
        "formula_id": "",
        "freeze": null,
        "has_audio": false,
        "height": 1080,
        "intensifies_audio_path": "",
        "intensifies_path": "",
        "is_ai_generate_content": false,
        "is_copyright": false,
        "is_text_edit_overdub": false,
        "is_unified_beauty_mode": false,
        "local_id": "",
        "local_material_id": "",
        "material_id": "",
        "material_name": "",
        "material_url": "",
        "matting": {
            "flag": 0,
            "has_use_quick_brush": false,
            "has_use_quick_eraser": false,
            "interactiveTime": [],
            "path": "",
            "strokes": []
        },
        "media_path": "",
        "object_locked": null,
        "origin_material_id": "",
        "path": "",
        "picture_from": "none",
        "picture_set_category_id": "",
        "picture_set_category_name": "",
        "request_id": "",
        "reverse_intensifies_path": "",
        "reverse_path": "",
        "smart_motion": null,
        "source": 0,
        "source_platform": 0,
        "stable": {
            "matrix_path": "",
            "stable_level": 0,
            "time_range": { "duration": 0, "start": 0 }
        },
        "team_id": "",
        "type": kind,
        "video_algorithm": {
            "algorithms": [],
            "complement_frame_config": null,
            "deflicker": null,
            "gameplay_configs": [],
            "motion_blur_config": null,
            "noise_reduction": null,
            "path": "",
            "quality_enhance": null,
            "time_range": null
        },
        "width": 1920
    })
}

fn audio_material() -> Value {
    json!({
        "app_id": 0,
        "category_id": "",
        "category_name": "local",
        "check_flag": 1,
        "copyright_limit_type": "none",
        "duration": 0,
        "effect_id": "",
        "formula_id": "",
        "intensifies_path": "",
        "is_ai_clone_tone": false,
        "is_text_edit_overdub": false,
        "is_ugc": false,
        "local_material_id": "",
        "music_id": "",
        "name": "",
        "path": "",
        "query": "",
        "request_id": "",
        "resource_id": "",
        "search_id": "",
        "source_from": "",
        "source_platform": 0,
        "team_id": "",
        "text_id": "",
        "tone_category_id": "",
        "tone_category_name": "",
        "tone_effect_id": "",
        "tone_effect_name": "",
        "tone_platform": "",
        "tone_second_category_id": "",
        "tone_second_category_name": "",
        "tone_speaker": "",
        "tone_type": "",
        "type": "extract_music",
        "video_id": "",
        "wave_points": []
    })
}

fn text_material(kind: &str) -> Value {
    json!({
        "add_type": 1,
        "alignment": 1,
        "background_alpha": 1,
        "background_color": "#000000",
        "background_height": 0.14,
        "background_horizontal_offset": 0,
        "background_round_radius": 0,
        "background_style": 0,
        "background_vertical_offset": 0,
        "background_width": 0.14,
        "base_content": "",
        "bold_width": 0,
        "border_alpha": 1,
        "border_color": "#000000",
        "border_width": 0.08,
        "caption_template_info": {
            "category_id": "",
            "category_name": "",
            "effect_id": "",
            "is_new": false,
            "path": "",
            "request_id": "",
            "resource_id": "",
            "resource_name": "",
            "source_platform": 0
        },
        "check_flag": 7,
        "combo_info": { "text_templates": [] },
        "content": "",
        "fixed_height": -1,
        "fixed_width": -1,
        "font_category_id": "",
        "font_category_name": "",
        "font_id": "",
        "font_name": "",
        "font_path": "",
        "font_resource_id": "",
        "font_size": 5,
        "font_source_platform": 0,
        "font_team_id": "",
        "font_title": "",
        "font_url": "",
        "fonts": [],
        "force_apply_line_max_width": false,
        "global_alpha": 1,
        "group_id": "",
        "has_shadow": false,
        "initial_scale": 1,
        "inner_padding": -1,
        "is_rich_text": false,
        "italic_degree": 0,
        "ktv_color": "",
        "language": "",
        "layer_weight": 1,
        "letter_spacing": 0,
        "line_feed": 1,
        "line_max_width": 0.82,
        "line_spacing": 0.02,
        "multi_language_current": "none",
        "name": "",
        "original_size": [],
        "preset_category": "",
        "preset_category_id": "",
        "preset_has_set_alignment": false,
        "preset_id": "",
        "preset_index": 0,
        "preset_name": "",
        "recognize_task_id": "",
        "recognize_type": 0,
        "relevance_segment": [],
        "shadow_alpha": 0.9,
        "shadow_angle": -45,
        "shadow_color": "",
        "shadow_distance": 5,
        "shadow_point": { "x": 0.636_396_103_067_892_8, "y": -0.636_396_103_067_892_8 },
        "shadow_smoothing": 0.45,
        "shape_clip_x": false,
        "shape_clip_y": false,
        "source_from": "",
        "style_name": "",
        "sub_type": 0,
        "subtitle_keywords": null,
        "subtitle_template_original_fontsize": 0,
        "text_alpha": 1,
        "text_color": "#ffde00",
        "text_curve": null,
        "text_preset_resource_id": "",
        "text_size": 30,
        "text_to_audio_ids": [],
        "tts_auto_update": false,
        "type": kind,
        "typesetting": 0,
        "underline": false,
        "underline_offset": 0.22,
        "underline_width": 0.05,
        "use_effect_default_color": true,
        "words": { "end_time": [], "start_time": [], "text": [] }
    })
}

fn into_fields(value: Value) -> Fields {
    match value {
        Value::Object(fields) => fields,
        _ => Fields::new(),
    }
}
