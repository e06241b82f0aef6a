//! `fixgen` binary driven against a temporary project.

mod common;

use common::{mapping_keys, TestProject};
use scenario_fixtures::config::REBUILD_ENV_FLAGS;
use std::process::{Command, Output};

const CATALOG: &str = r#"{
    "schema_version": 1,
    "scenarios": [
        {
            "name": "staff",
            "sql": ["INSERT INTO employees (name, title) VALUES ('Ann', 'CTO'), ('Ann', 'CEO')"],
            "children": [
                {"name": "projects", "sql": ["INSERT INTO projects (title) VALUES ('Apollo')"]}
            ]
        },
        {
            "name": "audited",
            "sql": ["INSERT INTO audits (action) VALUES ('login')"]
        }
    ]
}"#;

fn fixgen(test: &TestProject, args: &[&str]) -> Output {
    let bin = env!("CARGO_BIN_EXE_fixgen");
    let mut command = Command::new(bin);
    command.args(args).arg("--root").arg(test.root());
    for flag in REBUILD_ENV_FLAGS {
        command.env_remove(flag);
    }
    command.output().expect("run fixgen")
}

fn build(test: &TestProject, extra: &[&str]) -> Output {
    let db = test.db_path();
    let db = db.to_str().expect("utf-8 db path");
    let mut args = vec!["build", "--database", db];
    args.extend_from_slice(extra);
    fixgen(test, &args)
}

#[test]
fn build_writes_catalog_scenarios() {
    let test = TestProject::new();
    test.write_catalog(CATALOG);

    let output = build(&test, &[]);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("=> Building scenario `staff'"), "{stdout}");
    assert!(
        stdout.contains("=> Built scenario `staff/projects' with projects.yml"),
        "{stdout}"
    );

    assert_eq!(
        mapping_keys(&test.read_fixture("staff", "employees")),
        vec!["ann", "ann_1"]
    );
    assert_eq!(test.fixture_files("staff/projects"), vec!["projects.yml"]);
    assert_eq!(
        mapping_keys(&test.read_fixture("audited", "audits")),
        vec!["audits_001"]
    );

    let output = build(&test, &[]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("Building scenario"), "{stdout}");
}

#[test]
fn build_selected_scenario_with_report() {
    let test = TestProject::new();
    test.write_catalog(CATALOG);
    let report = test.root().join("report.json");

    let output = build(
        &test,
        &["--scenario", "audited", "--report", report.to_str().expect("utf-8")],
    );
    assert!(output.status.success(), "{output:?}");
    assert!(!test.scenario_dir("staff").exists());

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).expect("read report"))
            .expect("parse report");
    assert_eq!(report[0]["scenario"], "audited");
    assert_eq!(report[0]["outcome"]["status"], "built");
    assert_eq!(report[0]["outcome"]["files"][0], "audits.yml");
}

#[test]
fn build_rejects_unknown_scenario() {
    let test = TestProject::new();
    test.write_catalog(CATALOG);

    let output = build(&test, &["--scenario", "nobody"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("nobody"), "{stderr}");
}

#[test]
fn failing_setup_exits_nonzero_without_output() {
    let test = TestProject::new();
    test.write_catalog(
        r#"{"schema_version": 1, "scenarios": [{"name": "broken", "sql": ["INSERT INTO nope VALUES (1)"]}]}"#,
    );

    let output = build(&test, &[]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("There was an error building scenario `broken'"),
        "{stdout}"
    );
    assert!(!test.scenario_dir("broken").exists());
}

#[test]
fn status_reports_missing_and_up_to_date() {
    let test = TestProject::new();
    test.write_catalog(CATALOG);

    let output = fixgen(&test, &["status", "--json"]);
    assert!(output.status.success(), "{output:?}");
    let statuses: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("status json");
    let statuses = statuses.as_array().expect("array");
    assert_eq!(statuses.len(), 3);
    assert!(statuses.iter().all(|status| status["exists"] == false));

    assert!(build(&test, &[]).status.success());
    let output = fixgen(&test, &["status"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("staff: up to date"), "{stdout}");
    assert!(stdout.contains("staff/projects: up to date"), "{stdout}");
}

#[test]
fn list_prints_nested_paths() {
    let test = TestProject::new();
    test.write_catalog(CATALOG);

    let output = fixgen(&test, &["list"]);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["staff", "  staff/projects", "audited"]);
}

#[test]
fn missing_parent_warns_but_still_builds() {
    let test = TestProject::new();
    test.write_catalog(
        r#"{
            "schema_version": 1,
            "scenarios": [
                {"name": "archived", "parent": "nobody", "sql": ["INSERT INTO audits (action) VALUES ('x')"]}
            ]
        }"#,
    );

    let output = build(&test, &[]);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("=> WARNING: Parent scenario `nobody' doesn't exist.  Typo?"),
        "{stdout}"
    );
    assert!(stdout.contains("=> Built scenario `nobody/archived'"), "{stdout}");
    assert_eq!(test.fixture_files("nobody/archived"), vec!["audits.yml"]);
}

#[test]
fn existing_parent_builds_without_warning() {
    let test = TestProject::new();
    test.write_catalog(
        r#"{
            "schema_version": 1,
            "scenarios": [
                {"name": "staff", "sql": ["INSERT INTO employees (name) VALUES ('Ann')"]},
                {"name": "archived", "parent": "staff", "sql": ["INSERT INTO audits (action) VALUES ('x')"]}
            ]
        }"#,
    );

    let output = build(&test, &[]);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("WARNING"), "{stdout}");
    assert_eq!(test.fixture_files("staff/archived"), vec!["audits.yml"]);
}
