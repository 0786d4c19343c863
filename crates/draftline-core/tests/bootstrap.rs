use std::fs;

use draftline_core::{
    bootstrap::{DRAFT_META_FILE, create_new_project_named},
    load_draft,
    persistence::backup_draft,
};
use serde_json::{Value, json};
use tempfile::tempdir;

fn read_json(path: &std::path::Path) -> Value {
    let bytes = fs::read(path).expect("json file should be readable");
    serde_json::from_slice(&bytes).expect("file should hold json")
}

fn write_template(dir: &std::path::Path) {
    fs::create_dir_all(dir.join("Resources/fonts")).expect("template dirs should be creatable");
    fs::create_dir_all(dir.join(".backup")).expect("backup dir should be creatable");
    fs::write(
        dir.join("draft_content.json"),
        json!({
            "id": "TEMPLATE-ID",
            "duration": 0,
            "fps": 30.0,
            "platform": { "os": "windows" },
        })
        .to_string(),
    )
    .expect("template draft should be writable");
    fs::write(
        dir.join(DRAFT_META_FILE),
        json!({ "draft_name": "template", "draft_cover": "cover.jpg" }).to_string(),
    )
    .expect("template meta should be writable");
    fs::write(dir.join("Resources/fonts/a.ttf"), b"font").expect("font should be writable");
    fs::write(dir.join("draft_content.json.bak"), b"old").expect("bak should be writable");
    fs::write(dir.join(".backup/old.json"), b"{}").expect("backup entry should be writable");
}

#[test]
fn new_project_copies_template_with_fresh_ids() {
    let temp = tempdir().expect("tempdir should be creatable");
    let template = temp.path().join("template");
    let drafts = temp.path().join("drafts");
    write_template(&template);

    let handle = create_new_project_named(&drafts, &template, "1018_093000")
        .expect("project should be created");

    assert_eq!(handle.root_dir, drafts.join("1018_093000"));
    assert!(handle.root_dir.join("Resources/fonts/a.ttf").is_file());
    assert!(!handle.root_dir.join("draft_content.json.bak").exists());
    assert!(!handle.root_dir.join(".backup").exists());

    let draft = load_draft(&handle.draft_content_path).expect("draft should load");
    assert_eq!(draft.id, handle.project_id);
    assert_ne!(draft.id, "TEMPLATE-ID");
    let raw = read_json(&handle.draft_content_path);
    assert_eq!(raw["platform"]["os"], json!("windows"));

    let meta = read_json(&handle.root_dir.join(DRAFT_META_FILE));
    assert_eq!(meta["draft_name"], json!("1018_093000"));
    assert_eq!(meta["draft_id"], json!(handle.draft_id));
    assert_eq!(meta["draft_cover"], json!("cover.jpg"));
    assert!(
        meta["draft_fold_path"]
            .as_str()
            .is_some_and(|path| path.ends_with("/1018_093000"))
    );
    assert!(meta["tm_draft_create"].as_i64().is_some_and(|micros| micros > 0));
    assert_eq!(meta["tm_draft_create"], meta["tm_draft_modified"]);
}

#[test]
fn existing_project_folder_is_refused() {
    let temp = tempdir().expect("tempdir should be creatable");
    let template = temp.path().join("template");
    let drafts = temp.path().join("drafts");
    write_template(&template);
    fs::create_dir_all(drafts.join("taken")).expect("existing folder should be creatable");

    let result = create_new_project_named(&drafts, &template, "taken");
    assert!(result.is_err());
}

#[test]
fn missing_template_is_refused() {
    let temp = tempdir().expect("tempdir should be creatable");
    let result = create_new_project_named(temp.path(), &temp.path().join("nope"), "x");
    assert!(result.is_err());
    assert!(!temp.path().join("x").exists());
}

#[test]
fn template_without_draft_gets_an_empty_one() {
    let temp = tempdir().expect("tempdir should be creatable");
    let template = temp.path().join("bare");
    fs::create_dir_all(&template).expect("template should be creatable");

    let handle = create_new_project_named(&temp.path().join("drafts"), &template, "p")
        .expect("project should be created");
    let draft = load_draft(&handle.draft_content_path).expect("draft should load");
    assert_eq!(draft.id, handle.project_id);
    assert!(draft.tracks.is_empty());
}

#[test]
fn backup_keeps_the_previous_bytes() {
    let temp = tempdir().expect("tempdir should be creatable");
    let path = temp.path().join("draft_content.json");
    assert!(backup_draft(&path).expect("missing file is fine").is_none());

    fs::write(&path, b"{\"id\":\"A\"}").expect("draft should be writable");
    let backup = backup_draft(&path)
        .expect("backup should succeed")
        .expect("backup should be written");
    assert!(
        backup
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("draft_content.json.") && name.ends_with(".bak"))
    );
    assert_eq!(fs::read(&backup).expect("backup readable"), b"{\"id\":\"A\"}");
}
