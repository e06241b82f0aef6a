//! Shared test infrastructure for integration tests.
#![allow(dead_code)]

use scenario_fixtures::{Database, FixtureProject, RebuildPolicy, SqliteDatabase};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::TempDir;

pub const SCHEMA_SQL: &str = "
    CREATE TABLE employees (id INTEGER PRIMARY KEY, name TEXT, title TEXT);
    CREATE TABLE projects (id INTEGER PRIMARY KEY, title TEXT, employee_id INTEGER);
    CREATE TABLE audits (id INTEGER PRIMARY KEY, action TEXT);
    CREATE TABLE schema_migrations (version TEXT);
    INSERT INTO schema_migrations (version) VALUES ('20240101000000');
";

/// Temporary project root with a `test/` directory and a SQLite database.
pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp project");
        std::fs::create_dir_all(dir.path().join("test")).expect("create test dir");
        let project = Self { dir };
        let mut db = project.open_db();
        db.execute_batch(SCHEMA_SQL).expect("create schema");
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn fixtures_dir(&self) -> PathBuf {
        self.root().join("test/fixtures")
    }

    pub fn scenario_dir(&self, scenario: &str) -> PathBuf {
        self.fixtures_dir().join(scenario)
    }

    pub fn db_path(&self) -> PathBuf {
        self.root().join("test.sqlite3")
    }

    pub fn open_db(&self) -> SqliteDatabase {
        SqliteDatabase::open(&self.db_path()).expect("open test database")
    }

    /// Project with an explicit rebuild policy so the host environment can't leak in.
    pub fn project(&self, forced: bool) -> FixtureProject {
        FixtureProject::discover(self.root().to_path_buf())
            .expect("discover project")
            .with_policy(RebuildPolicy { forced })
    }

    pub fn write_catalog(&self, json: &str) -> PathBuf {
        let path = self.fixtures_dir().join("scenarios.json");
        std::fs::create_dir_all(self.fixtures_dir()).expect("create fixtures dir");
        std::fs::write(&path, json).expect("write catalog");
        path
    }

    pub fn read_fixture(&self, scenario: &str, table: &str) -> serde_yaml::Mapping {
        let path = self.scenario_dir(scenario).join(format!("{table}.yml"));
        let text = std::fs::read_to_string(&path)
            .unwrap_or_else(|err| panic!("read {}: {err}", path.display()));
        serde_yaml::from_str(&text).expect("parse fixture YAML")
    }

    pub fn fixture_files(&self, scenario: &str) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.scenario_dir(scenario))
            .expect("read scenario dir")
            .map(|entry| entry.expect("dir entry").file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

pub fn mapping_keys(mapping: &serde_yaml::Mapping) -> Vec<String> {
    mapping
        .keys()
        .map(|key| key.as_str().expect("string key").to_string())
        .collect()
}

pub fn set_mtime(path: &Path, time: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .or_else(|_| File::open(path))
        .expect("open for mtime")
        .set_modified(time)
        .expect("set mtime");
}
