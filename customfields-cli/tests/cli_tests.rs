//! Binary-level tests for the `customfields` command

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

struct Workspace {
    temp: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.temp.path()
    }

    fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// Command running inside the workspace with a clean environment.
    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("customfields").unwrap();
        cmd.current_dir(self.path())
            .env_remove("RUST_LOG")
            .env_remove("CUSTOMFIELDS_FIELDS_DIR")
            .env_remove("CUSTOMFIELDS_OUTPUT")
            .env_remove("CUSTOMFIELDS_LOG_FILTER");
        cmd
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.cmd().args(args).assert().success().get_output().stdout.clone();
        serde_json::from_slice(&output).unwrap()
    }

    fn create(&self, name: &str, definition: &str) -> String {
        let path = self.file(name, definition);
        let def = self.json(&["create", path.to_str().unwrap()]);
        def["id"].as_str().unwrap().to_string()
    }
}

const PASSPORT: &str = r#"{
    "module": "Student",
    "api_name": "passport_no",
    "label": "Passport number",
    "type": {"kind": "text"},
    "is_required": true,
    "validation": {"min_length": 6}
}"#;

const INTAKE: &str = r#"
module: Student
api_name: intake
label: Intake
type:
  kind: select
  options: [Fall, Spring]
display_order: 1
"#;

#[test]
fn modules_lists_the_compiled_in_set() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("modules")
        .assert()
        .success()
        .stdout(predicate::str::contains("Student"))
        .stdout(predicate::str::contains("Application"));
}

#[test]
fn create_then_list_in_display_order() {
    let ws = Workspace::new();
    let intake = ws.create("intake.yaml", INTAKE);
    let passport = ws.create("passport.json", PASSPORT);

    let listed = ws.json(&["list", "Student"]);
    let ids: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, [passport.as_str(), intake.as_str()]);
    assert!(ws
        .path()
        .join(".customfields/fields/definitions")
        .join(format!("{passport}.yaml"))
        .exists());
}

#[test]
fn duplicate_api_name_is_rejected() {
    let ws = Workspace::new();
    ws.create("passport.json", PASSPORT);
    let again = ws.file("again.json", PASSPORT);
    ws.cmd()
        .args(["create", again.to_str().unwrap()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("duplicate field"));
}

#[test]
fn unknown_module_is_rejected_on_create() {
    let ws = Workspace::new();
    let path = ws.file(
        "bad.json",
        r#"{"module":"Invoice","api_name":"x","label":"X","type":{"kind":"text"}}"#,
    );
    ws.cmd()
        .args(["create", path.to_str().unwrap()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown module"));
}

#[test]
fn validate_reports_errors_with_exit_code_two() {
    let ws = Workspace::new();
    ws.create("passport.json", PASSPORT);
    ws.create("intake.yaml", INTAKE);
    let form = ws.file(
        "form.json",
        r#"{"first_name":"Ana","passport_no":"X12","intake":"Winter"}"#,
    );

    let output = ws
        .cmd()
        .args(["validate", "Student", form.to_str().unwrap(), "--fixed", "first_name"])
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();
    let report: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["valid"], Value::Bool(false));
    assert_eq!(
        report["errors"]["passport_no"],
        "Passport number must be at least 6 characters"
    );
    assert_eq!(report["errors"]["intake"], "Intake must be one of: Fall, Spring");
    assert_eq!(report["fixed"]["first_name"], "Ana");
    assert!(report["metadata"].get("first_name").is_none());
}

#[test]
fn valid_submission_exits_zero() {
    let ws = Workspace::new();
    ws.create("intake.yaml", INTAKE);
    let form = ws.file("form.json", r#"{"intake":"Fall"}"#);
    let report = ws.json(&["validate", "Student", form.to_str().unwrap()]);
    assert_eq!(report["valid"], Value::Bool(true));
}

#[test]
fn update_reorder_and_delete() {
    let ws = Workspace::new();
    let passport = ws.create("passport.json", PASSPORT);
    let intake = ws.create("intake.yaml", INTAKE);

    let patch = ws.file("patch.json", r#"{"label":"Passport","placeholder":"AB123456"}"#);
    let updated = ws.json(&["update", &passport, patch.to_str().unwrap()]);
    assert_eq!(updated["label"], "Passport");
    assert_eq!(updated["placeholder"], "AB123456");

    let reordered = ws.json(&["reorder", "Student", &intake, &passport]);
    assert_eq!(reordered[0]["id"], intake.as_str());
    assert_eq!(reordered[0]["display_order"], 0);
    assert_eq!(reordered[1]["display_order"], 1);

    ws.json(&["delete", &passport]);
    ws.cmd()
        .args(["get", &passport])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn merge_flattens_an_entity_row() {
    let ws = Workspace::new();
    let row = ws.file(
        "row.json",
        r#"{"first_name":"Ana","metadata":{"intake":"Fall"}}"#,
    );
    let view = ws.json(&["merge", "Student", row.to_str().unwrap()]);
    assert_eq!(view["first_name"], "Ana");
    assert_eq!(view["intake"], "Fall");
    assert!(view.get("metadata").is_none());
}

#[test]
fn fields_dir_comes_from_config_file() {
    let ws = Workspace::new();
    ws.file("customfields.toml", "fields_dir = \"store\"\n");
    ws.create("passport.json", PASSPORT);
    assert!(ws.path().join("store/definitions").is_dir());
}

#[test]
fn yaml_output_is_selectable() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["modules", "--output", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("- Student"));
}
