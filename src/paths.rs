//! Typed paths into a project's fixture layout.
//!
//! Centralizing path construction keeps the builder, catalog, and CLI agreeing
//! on where `<spec|test>/fixtures/<scenario>/<table>.yml` lives.
use std::path::{Path, PathBuf};

/// File name of the declarative scenario catalog under the fixtures root.
pub const SCENARIOS_CATALOG_FILE: &str = "scenarios.json";

/// Whether `scenario` is a relative path whose every `/`-separated segment is
/// a plain name (not empty, `.` or `..`), so it stays under the fixtures root.
pub fn is_valid_scenario_path(scenario: &str) -> bool {
    scenario
        .split('/')
        .all(|segment| !segment.trim().is_empty() && segment != "." && segment != "..")
}

/// Convenience wrapper for locating fixture artifacts under a project root.
#[derive(Debug, Clone)]
pub struct FixturePaths {
    root: PathBuf,
}

impl FixturePaths {
    /// Create a new path helper rooted at the project root.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Return the project root used for path derivation.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return `spec` when `<root>/spec` exists, otherwise `test`.
    pub fn spec_or_test_dir(&self) -> &'static str {
        if self.root.join("spec").exists() {
            "spec"
        } else {
            "test"
        }
    }

    /// Return the `<spec|test>/fixtures` directory path.
    pub fn fixtures_root(&self) -> PathBuf {
        self.root.join(self.spec_or_test_dir()).join("fixtures")
    }

    /// Return the output directory for a scenario path such as `parent/child`.
    pub fn scenario_dir(&self, scenario: &str) -> PathBuf {
        let mut dir = self.fixtures_root();
        for segment in scenario.split('/').filter(|segment| !segment.is_empty()) {
            dir.push(segment);
        }
        dir
    }

    /// Return the fixture file for one table of a scenario.
    pub fn fixture_file(&self, scenario: &str, table: &str, extension: &str) -> PathBuf {
        self.scenario_dir(scenario).join(format!("{table}.{extension}"))
    }

    /// Return the `scenarios.json` catalog path.
    pub fn catalog_path(&self) -> PathBuf {
        self.fixtures_root().join(SCENARIOS_CATALOG_FILE)
    }

    /// Return the migrations directory, resolved against the project root.
    pub fn migrations_dir(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Whether the output directory for `scenario` already exists.
    pub fn scenario_dir_exists(&self, scenario: &str) -> bool {
        self.scenario_dir(scenario).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_spec_dir_when_present() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = FixturePaths::new(dir.path().to_path_buf());
        assert_eq!(paths.spec_or_test_dir(), "test");
        std::fs::create_dir_all(dir.path().join("spec")).expect("create spec");
        assert_eq!(paths.spec_or_test_dir(), "spec");
        assert_eq!(
            paths.fixture_file("staff/managers", "employees", "yml"),
            dir.path().join("spec/fixtures/staff/managers/employees.yml")
        );
    }

    #[test]
    fn scenario_paths_must_stay_under_fixtures_root() {
        assert!(is_valid_scenario_path("staff"));
        assert!(is_valid_scenario_path("staff/managers"));
        for bad in ["", " ", ".", "..", "../staff", "staff/..", "staff//x", "/etc", "staff/"] {
            assert!(!is_valid_scenario_path(bad), "{bad:?}");
        }
    }
}
