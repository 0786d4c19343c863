use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use chrono::{Local, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::{
    builder::normalize_path,
    model::{Draft, generate_id},
    persistence::{DRAFT_CONTENT_FILE, write_atomically},
};

pub const DRAFT_META_FILE: &str = "draft_meta_info.json";
const SKIPPED_DIRECTORY: &str = ".backup";
const SKIPPED_EXTENSION: &str = "bak";

/// Where a freshly bootstrapped project lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectHandle {
    pub name: String,
    pub root_dir: PathBuf,
    pub draft_content_path: PathBuf,
    pub project_id: String,
    pub draft_id: String,
}

/// Project folder name for the current local time, `MMDD_HHMMSS`.
#[must_use]
pub fn project_name_now() -> String {
    Local::now().format("%m%d_%H%M%S").to_string()
}

pub fn create_new_project(draft_root: &Path, template_dir: &Path) -> Result<ProjectHandle> {
    create_new_project_named(draft_root, template_dir, &project_name_now())
}

/// Copies `template_dir` into `draft_root/name` and gives the copy fresh
/// identifiers and timestamps.
#[instrument(fields(draft_root = %draft_root.display(), template_dir = %template_dir.display(), name))]
pub fn create_new_project_named(
    draft_root: &Path,
    template_dir: &Path,
    name: &str,
) -> Result<ProjectHandle> {
    if !template_dir.is_dir() {
        bail!("template folder not found: {}", template_dir.display());
    }
    let root_dir = draft_root.join(name);
    if root_dir.exists() {
        bail!("project folder already exists: {}", root_dir.display());
    }

    let copied = copy_template(template_dir, &root_dir)?;
    debug!(copied, "template copied");

    let project_id = generate_id();
    let draft_id = generate_id();
    let draft_content_path = root_dir.join(DRAFT_CONTENT_FILE);
    rewrite_draft_content(&draft_content_path, &project_id)?;

    let meta_path = root_dir.join(DRAFT_META_FILE);
    let mut meta = read_json_object(&meta_path)?;
    let now_us = Utc::now().timestamp_micros();
    let root = normalize_path(draft_root);
    meta.insert("draft_fold_path".to_string(), json!(format!("{root}/{name}")));
    meta.insert("draft_name".to_string(), json!(name));
    meta.insert("draft_id".to_string(), json!(draft_id));
    meta.insert("draft_root_path".to_string(), json!(root));
    meta.insert("tm_draft_create".to_string(), json!(now_us));
    meta.insert("tm_draft_modified".to_string(), json!(now_us));
    write_json(&meta_path, &Value::Object(meta))?;

    info!(%project_id, root_dir = %root_dir.display(), "project created");
    Ok(ProjectHandle {
        name: name.to_string(),
        root_dir,
        draft_content_path,
        project_id,
        draft_id,
    })
}

fn copy_template(template_dir: &Path, destination: &Path) -> Result<usize> {
    fs::create_dir_all(destination)
        .with_context(|| format!("failed to create project folder: {}", destination.display()))?;

    let mut copied = 0;
    let entries = WalkDir::new(template_dir)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| {
            !(entry.file_type().is_dir() && entry.file_name() == SKIPPED_DIRECTORY)
        });
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                warn!(?error, "ignoring unreadable template entry");
                continue;
            }
        };
        let relative = entry
            .path()
            .strip_prefix(template_dir)
            .context("template entry outside template folder")?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("failed to create directory: {}", target.display()))?;
            continue;
        }
        let is_backup = entry
            .path()
            .extension()
            .is_some_and(|extension| extension == SKIPPED_EXTENSION);
        if is_backup {
            continue;
        }
        fs::copy(entry.path(), &target)
            .with_context(|| format!("failed to copy {}", entry.path().display()))?;
        copied += 1;
    }
    Ok(copied)
}

/// Sets the draft id, keeping everything else in the template's draft.
fn rewrite_draft_content(path: &Path, project_id: &str) -> Result<()> {
    let mut content = if path.is_file() {
        read_json_object(path)?
    } else {
        match serde_json::to_value(Draft::empty()).context("failed to build empty draft")? {
            Value::Object(fields) => fields,
            _ => bail!("empty draft did not serialize to an object"),
        }
    };
    content.insert("id".to_string(), json!(project_id));
    write_json(path, &Value::Object(content))
}

fn read_json_object(path: &Path) -> Result<serde_json::Map<String, Value>> {
    if !path.is_file() {
        return Ok(serde_json::Map::new());
    }
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    match serde_json::from_slice(&bytes)
        .with_context(|| format!("invalid json in {}", path.display()))?
    {
        Value::Object(fields) => Ok(fields),
        _ => bail!("expected a JSON object in {}", path.display()),
    }
}

fn write_json(path: &Path, value: &Value) -> Result<()> {
    let bytes = serde_json::to_vec(value).context("failed to serialize json")?;
    write_atomically(path, &bytes)
}
