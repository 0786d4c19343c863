use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use crate::diagnostics::DiagnosticsConfig;

use crate::{
    builder::TextStyle,
    editor::{EditorOptions, TrackNames},
    model::DEFAULT_FPS,
    probe::SystemProber,
};

pub const CONFIG_FILE_NAME: &str = "draftline.config.toml";
pub const CONFIG_PATH_ENV: &str = "DRAFTLINE_CONFIG_PATH";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub project: ProjectConfig,
    pub timeline: TimelineConfig,
    pub probe: ProbeConfig,
    pub tracks: TrackNames,
    pub text_style: TextStyle,
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectConfig {
    /// Folder the host keeps its drafts in.
    pub draft_root: PathBuf,
    pub template_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimelineConfig {
    pub fps: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProbeConfig {
    pub ffprobe_binary: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            draft_root: PathBuf::from("drafts"),
            template_dir: PathBuf::from("template"),
        }
    }
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self { fps: DEFAULT_FPS }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ffprobe_binary: PathBuf::from("ffprobe"),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let config_path = discover_config_path().with_context(|| {
            format!("failed to locate {CONFIG_FILE_NAME}; looked in cwd and parent directory")
        })?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config TOML from {}", path.display()))?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Like [`AppConfig::load`], but a missing file means defaults. A file
    /// that exists and does not parse is still an error.
    pub fn load_or_default() -> Result<Self> {
        match discover_config_path() {
            Ok(path) => Self::load_from(&path),
            Err(_) => Ok(Self::default()),
        }
    }

    #[must_use]
    pub fn editor_options(&self) -> EditorOptions {
        EditorOptions {
            fps: self.timeline.fps,
            text_style: self.text_style.clone(),
            track_names: self.tracks.clone(),
        }
    }

    #[must_use]
    pub fn prober(&self) -> SystemProber {
        SystemProber::new(&self.probe.ffprobe_binary)
    }
}

fn discover_config_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Ok(path);
        }
    }

    let cwd = env::current_dir().context("failed to resolve current directory")?;
    let candidates = [
        cwd.join(CONFIG_FILE_NAME),
        cwd.join("..").join(CONFIG_FILE_NAME),
    ];

    candidates
        .into_iter()
        .find(|path| path.is_file())
        .ok_or_else(|| anyhow::anyhow!("{CONFIG_FILE_NAME} not found"))
}
