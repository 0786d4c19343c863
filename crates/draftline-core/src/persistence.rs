use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::model::Draft;

pub const DRAFT_CONTENT_FILE: &str = "draft_content.json";

/// Writes the draft as compact JSON, replacing `path` atomically.
#[instrument(skip(draft), fields(draft_id = %draft.id, path = %path.display()))]
pub fn save_draft(path: &Path, draft: &Draft) -> Result<()> {
    let json = serde_json::to_vec(draft).context("failed to serialize draft")?;
    write_atomically(path, &json)?;
    info!(bytes = json.len(), "draft saved");
    Ok(())
}

#[instrument(fields(path = %path.display()))]
pub fn load_draft(path: &Path) -> Result<Draft> {
    let content =
        fs::read(path).with_context(|| format!("failed to read draft: {}", path.display()))?;
    let draft: Draft = serde_json::from_slice(&content).context("invalid draft json")?;
    info!(draft_id = %draft.id, tracks = draft.tracks.len(), "draft loaded");
    Ok(draft)
}

/// Copies the current file aside as `<name>.<timestamp>.bak` before it is
/// overwritten. Returns `None` when there is nothing to back up.
#[instrument(fields(path = %path.display()))]
pub fn backup_draft(path: &Path) -> Result<Option<PathBuf>> {
    if !path.is_file() {
        return Ok(None);
    }
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| DRAFT_CONTENT_FILE.to_string());
    let backup = path.with_file_name(format!(
        "{file_name}.{}.bak",
        Utc::now().format("%Y%m%d%H%M%S")
    ));
    fs::copy(path, &backup)
        .with_context(|| format!("failed to back up draft: {}", path.display()))?;
    debug!(backup = %backup.display(), "draft backed up");
    Ok(Some(backup))
}

pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| Path::new(".").to_path_buf(), Path::to_path_buf);
    fs::create_dir_all(&parent)
        .with_context(|| format!("failed to create directory: {}", parent.display()))?;

    let mut temp_file =
        tempfile::NamedTempFile::new_in(&parent).context("failed to create temp draft file")?;
    temp_file
        .write_all(bytes)
        .context("failed to write temp draft file")?;
    temp_file
        .persist(path)
        .map_err(|error| anyhow::anyhow!(error.error))
        .with_context(|| format!("failed to persist draft: {}", path.display()))?;
    Ok(())
}
