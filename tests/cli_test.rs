//! CLI integration tests for arcgis-hub
//!
//! These tests run the binary offline against temp config and JSON files.
//! Run with: cargo test --test cli_test

use std::path::Path;
use std::process::Command;

use serde_json::{Value, json};
use tempfile::TempDir;

/// Run arcgis-hub with given args and return (exit_code, stdout, stderr)
fn run_cmd(args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_arcgis-hub"))
        .args(args)
        .env_remove("ARCGIS_HUB_CONFIG")
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute command");

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    (exit_code, stdout, stderr)
}

/// Premium org config with a signed-in user who can create items.
fn premium_config(dir: &TempDir) -> String {
    write(
        dir.path(),
        "self.json",
        &json!({"id": "ORG1", "urlKey": "city", "portalProperties": {"hub": {"enabled": true}}}),
    );
    write(
        dir.path(),
        "user.json",
        &json!({"username": "casey", "orgId": "ORG1", "privileges": ["portal:user:createItem"]}),
    );
    let path = dir.path().join("hub.toml");
    std::fs::write(
        &path,
        "[portal]\ntoken = \"t\"\nportal_self = \"self.json\"\nuser = \"user.json\"\n",
    )
    .unwrap();
    path.to_string_lossy().to_string()
}

fn write(dir: &Path, name: &str, value: &Value) -> String {
    let path = dir.join(name);
    std::fs::write(&path, value.to_string()).unwrap();
    path.to_string_lossy().to_string()
}

// === Help and Version Tests ===

#[test]
fn test_help() {
    let (exit_code, stdout, _stderr) = run_cmd(&["--help"]);
    assert_eq!(exit_code, 0);
    assert!(stdout.contains("permission"));
    assert!(stdout.contains("search"));
    assert!(stdout.contains("content"));
}

#[test]
fn test_version() {
    let (exit_code, stdout, _stderr) = run_cmd(&["--version"]);
    assert_eq!(exit_code, 0);
    assert!(stdout.contains("arcgis-hub"));
}

// === Permission Tests ===

#[test]
fn test_permission_list() {
    let (exit_code, stdout, _stderr) = run_cmd(&["permission", "--list"]);
    assert_eq!(exit_code, 0);
    assert!(stdout.lines().any(|l| l == "hub:project:create"));
}

#[test]
fn test_permission_granted() {
    let dir = tempfile::tempdir().unwrap();
    let config = premium_config(&dir);
    let (exit_code, stdout, stderr) =
        run_cmd(&["--config", &config, "permission", "hub:project:create"]);
    assert_eq!(exit_code, 0, "stderr: {}", stderr);
    let response: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(response["access"], true);
    assert_eq!(response["response"], "granted");
}

#[test]
fn test_permission_denied_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let config = premium_config(&dir);
    let entity = write(dir.path(), "entity.json", &json!({"owner": "jordan", "canEdit": false}));
    let (exit_code, stdout, _stderr) = run_cmd(&[
        "--config",
        &config,
        "permission",
        "hub:project:delete",
        "--entity",
        &entity,
    ]);
    assert_eq!(exit_code, 1);
    let response: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(response["access"], false);
    assert_eq!(response["response"], "not-owner");
}

#[test]
fn test_missing_config_file() {
    let (exit_code, _stdout, stderr) =
        run_cmd(&["--config", "/nonexistent/hub.toml", "permission", "hub:project:view"]);
    assert_ne!(exit_code, 0);
    assert!(stderr.contains("/nonexistent/hub.toml"));
}

// === Content Tests ===

#[test]
fn test_content_prefers_slug() {
    let dir = tempfile::tempdir().unwrap();
    let item = write(
        dir.path(),
        "item.json",
        &json!({
            "id": "9f8e7d6c5b4a39281706f5e4d3c2b1a0",
            "owner": "casey",
            "title": "Street Trees",
            "type": "Feature Service",
            "typeKeywords": ["slug|city::street-trees"],
            "url": "https://services.arcgis.com/x/arcgis/rest/services/Trees/FeatureServer/0",
            "access": "public",
            "created": 1_700_000_000_000_i64,
            "modified": 1_700_000_000_000_i64
        }),
    );
    let site = write(
        dir.path(),
        "site.json",
        &json!({"domainInfo": {"orgKey": "city"}, "data": {"values": {}}}),
    );
    let (exit_code, stdout, stderr) = run_cmd(&["content", &item, "--site", &site]);
    assert_eq!(exit_code, 0, "stderr: {}", stderr);
    let output: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(output["identifier"], "street-trees");
    assert_eq!(output["content"]["family"], "map");
    assert_eq!(output["content"]["hubId"], "9f8e7d6c5b4a39281706f5e4d3c2b1a0_0");
}

#[test]
fn test_content_rejects_invalid_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("item.json");
    std::fs::write(&path, "not json").unwrap();
    let (exit_code, _stdout, stderr) = run_cmd(&["content", &path.to_string_lossy()]);
    assert_ne!(exit_code, 0);
    assert!(stderr.contains("Invalid JSON"));
}

// === Search Tests ===

#[test]
fn test_search_unknown_collection() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write(
        dir.path(),
        "catalog.json",
        &json!({"schemaVersion": 1, "title": "Empty", "scopes": {}, "collections": []}),
    );
    let (exit_code, _stdout, stderr) =
        run_cmd(&["search", "--catalog", &catalog, "--collection", "maps"]);
    assert_ne!(exit_code, 0);
    assert!(stderr.contains("Collection \"maps\" is not present in the Catalog"));
}
