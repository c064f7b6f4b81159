use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::Path;
use std::process::Command;

const SOURCE_V1: &str = r#"
actions {
    Custom String("Hello, adventurer!", Null, Null, Null);
}

actions {
    Custom String("Pick up the red key", Null, Null, Null);
}
"#;

const SOURCE_V2: &str = r#"
actions {
    Custom String("Hello, adventurer!", Null, Null, Null);
}

actions {
    Custom String("Pick up the blue key", Null, Null, Null);
    Custom String("Open the door", Null, Null, Null);
}
"#;

const TM_LINE: &str = r#"{"source_text":"Hello, adventurer!","target_text":"Salut, aventurier !","source_lang":"en","target_lang":"fr","created_by":"test","creation_date":"2024-01-01T00:00:00Z","modified_by":"test","last_modified_date":"2024-01-01T00:00:00Z","usage_count":1,"comment":""}"#;

fn bin_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("locsync").expect("binary built");
    // Keep config lookup and the rolling log directory inside the sandbox.
    cmd.current_dir(dir);
    cmd
}

fn run_ok(dir: &Path, args: &[&str]) -> String {
    let mut cmd = bin_cmd(dir);
    cmd.args(args);
    let assert = cmd.assert().success();
    String::from_utf8_lossy(assert.get_output().stdout.as_ref()).to_string()
}

fn make_project(dir: &Path) -> std::path::PathBuf {
    let src = dir.join("game.txt");
    std::fs::write(&src, SOURCE_V1).unwrap();
    let project = dir.join("game.lsproj.json");
    run_ok(
        dir,
        &[
            "extract",
            "--input",
            src.to_str().unwrap(),
            "--out-json",
            project.to_str().unwrap(),
        ],
    );
    project
}

/// Set one entry's translation by editing the project JSON directly.
fn translate_entry(project: &Path, source_text: &str, translation: &str) {
    let text = std::fs::read_to_string(project).unwrap();
    let mut doc: serde_json::Value = serde_json::from_str(&text).unwrap();
    let entries = doc["entries"].as_array_mut().unwrap();
    let entry = entries
        .iter_mut()
        .find(|e| e["source_text"] == source_text)
        .unwrap();
    entry["translated_text"] = translation.into();
    entry["status"] = "translated".into();
    std::fs::write(project, serde_json::to_string_pretty(&doc).unwrap()).unwrap();
}

#[test]
fn help_works() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = bin_cmd(dir.path());
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Localization entry management"));
}

#[test]
fn extract_writes_project_json() {
    let dir = tempfile::tempdir().unwrap();
    let project = make_project(dir.path());

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&project).unwrap()).unwrap();
    let entries = doc["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries
        .iter()
        .any(|e| e["source_text"] == "Hello, adventurer!"));
    assert!(entries.iter().all(|e| e["status"] == "untranslated"));
}

#[test]
fn extract_prints_csv_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("game.txt");
    std::fs::write(&src, SOURCE_V1).unwrap();

    let stdout = run_ok(dir.path(), &["extract", "--input", src.to_str().unwrap()]);
    assert!(stdout.contains("identity,kind,status,source,translation,comment,line"));
    assert!(stdout.contains("Pick up the red key"));
}

#[test]
fn update_carries_translations_and_reports_counts() {
    let dir = tempfile::tempdir().unwrap();
    let project = make_project(dir.path());
    translate_entry(&project, "Pick up the red key", "Prends la clé rouge");

    let src2 = dir.path().join("game2.txt");
    std::fs::write(&src2, SOURCE_V2).unwrap();
    let stdout = run_ok(
        dir.path(),
        &[
            "update",
            "--project",
            project.to_str().unwrap(),
            "--input",
            src2.to_str().unwrap(),
        ],
    );
    assert!(stdout.contains("1 exact, 1 fuzzy, 1 added, 0 removed"));

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&project).unwrap()).unwrap();
    let entries = doc["entries"].as_array().unwrap();
    let blue = entries
        .iter()
        .find(|e| e["source_text"] == "Pick up the blue key")
        .unwrap();
    assert_eq!(blue["translated_text"], "Prends la clé rouge");
    assert_eq!(blue["status"], "fuzzy");
}

#[test]
fn validate_reports_boundary_mismatch_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let project = make_project(dir.path());
    translate_entry(&project, "Hello, adventurer!", "Salut, aventurier");

    let stdout = run_ok(
        dir.path(),
        &[
            "validate",
            "--project",
            project.to_str().unwrap(),
            "--format",
            "json",
        ],
    );
    let findings: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let arr = findings.as_array().unwrap();
    assert!(arr.iter().any(|f| f["kind"] == "boundary-mismatch"));
}

#[test]
fn validate_clean_project_prints_ok() {
    let dir = tempfile::tempdir().unwrap();
    let project = make_project(dir.path());

    let mut cmd = bin_cmd(dir.path());
    cmd.args(["validate", "--project", project.to_str().unwrap()]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No findings"));
}

#[test]
fn apply_tm_fills_exact_hits() {
    let dir = tempfile::tempdir().unwrap();
    let project = make_project(dir.path());
    let tm = dir.path().join("memory.jsonl");
    std::fs::write(&tm, format!("{TM_LINE}\n")).unwrap();

    let stdout = run_ok(
        dir.path(),
        &[
            "apply-tm",
            "--project",
            project.to_str().unwrap(),
            "--tm",
            tm.to_str().unwrap(),
        ],
    );
    assert!(stdout.contains("Filled 1"));

    let stats = run_ok(
        dir.path(),
        &[
            "stats",
            "--project",
            project.to_str().unwrap(),
            "--format",
            "json",
        ],
    );
    let s: serde_json::Value = serde_json::from_str(&stats).unwrap();
    assert_eq!(s["translated"], 1);
    assert_eq!(s["untranslated"], 1);
}

#[test]
fn suggest_ranks_exact_hit_first() {
    let dir = tempfile::tempdir().unwrap();
    let project = make_project(dir.path());
    let tm = dir.path().join("memory.jsonl");
    std::fs::write(&tm, format!("{TM_LINE}\n")).unwrap();

    let stdout = run_ok(
        dir.path(),
        &[
            "suggest",
            "--project",
            project.to_str().unwrap(),
            "--tm",
            tm.to_str().unwrap(),
        ],
    );
    assert!(stdout.contains("Hello, adventurer!"));
    assert!(stdout.contains("= 100%  Salut, aventurier !"));
}

#[test]
fn export_po_writes_entries() {
    let dir = tempfile::tempdir().unwrap();
    let project = make_project(dir.path());
    translate_entry(&project, "Hello, adventurer!", "Salut, aventurier !");

    let out = dir.path().join("out.po");
    run_ok(
        dir.path(),
        &[
            "export-po",
            "--project",
            project.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
            "--lang",
            "fr",
        ],
    );
    let po = std::fs::read_to_string(&out).unwrap();
    assert!(po.contains(r#"msgid "Hello, adventurer!""#));
    assert!(po.contains(r#"msgstr "Salut, aventurier !""#));
    assert!(po.contains(r#"msgid "Pick up the red key""#));
}

#[test]
fn stats_text_shows_progress() {
    let dir = tempfile::tempdir().unwrap();
    let project = make_project(dir.path());
    translate_entry(&project, "Hello, adventurer!", "Salut !");

    let stdout = run_ok(dir.path(), &["stats", "--project", project.to_str().unwrap()]);
    assert!(stdout.contains("total         2"));
    assert!(stdout.contains("progress      50.0%"));
}
