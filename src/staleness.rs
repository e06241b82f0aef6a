//! Decide whether a scenario's cached fixtures must be regenerated.
//!
//! The comparison is purely mtime based: a setup source or migration
//! directory newer than the scenario output directory marks it stale.
//! Missing paths never trigger a rebuild.
use crate::config::{FixtureSettings, RebuildPolicy};
use crate::paths::FixturePaths;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Why a scenario needs rebuilding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RebuildTrigger {
    /// A force flag was set.
    Forced,
    /// The setup source is newer than the output directory.
    SetupSourceChanged { path: PathBuf },
    /// The migrations directory is newer than the output directory.
    MigrationsChanged { path: PathBuf },
}

/// Rebuild decision for a single scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Staleness {
    pub trigger: Option<RebuildTrigger>,
}

impl Staleness {
    pub fn rebuild(&self) -> bool {
        self.trigger.is_some()
    }
}

/// Inputs that may make a scenario's output stale.
#[derive(Debug, Clone)]
pub struct StalenessSources {
    pub setup_source: Option<PathBuf>,
    pub migrations_dir: PathBuf,
}

impl StalenessSources {
    /// Default sources: the catalog file and the configured migrations dir.
    pub fn for_project(paths: &FixturePaths, settings: &FixtureSettings) -> Self {
        Self {
            setup_source: Some(paths.catalog_path()),
            migrations_dir: paths.migrations_dir(&settings.migrations_dir),
        }
    }
}

/// Evaluate the rebuild policy and mtime triggers for `scenario_dir`.
pub fn check(policy: RebuildPolicy, sources: &StalenessSources, scenario_dir: &Path) -> Staleness {
    if policy.forced {
        return Staleness {
            trigger: Some(RebuildTrigger::Forced),
        };
    }
    if let Some(source) = sources.setup_source.as_deref() {
        if newer_than(source, scenario_dir) {
            return Staleness {
                trigger: Some(RebuildTrigger::SetupSourceChanged {
                    path: source.to_path_buf(),
                }),
            };
        }
    }
    if newer_than(&sources.migrations_dir, scenario_dir) {
        return Staleness {
            trigger: Some(RebuildTrigger::MigrationsChanged {
                path: sources.migrations_dir.clone(),
            }),
        };
    }
    Staleness { trigger: None }
}

/// True only when both paths exist and `path` was modified strictly after `reference`.
pub fn newer_than(path: &Path, reference: &Path) -> bool {
    match (modified(path), modified(reference)) {
        (Some(path_mtime), Some(reference_mtime)) => path_mtime > reference_mtime,
        _ => false,
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;

    fn set_mtime(path: &Path, time: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .or_else(|_| File::open(path))
            .expect("open for mtime")
            .set_modified(time)
            .expect("set mtime");
    }

    #[test]
    fn newer_source_triggers_rebuild() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("out");
        fs::create_dir_all(&output).expect("create out");
        let source = dir.path().join("scenarios.json");
        fs::write(&source, "{}").expect("write source");

        let base = SystemTime::now() - Duration::from_secs(3600);
        set_mtime(&output, base);
        set_mtime(&source, base + Duration::from_secs(60));

        let sources = StalenessSources {
            setup_source: Some(source.clone()),
            migrations_dir: dir.path().join("db/migrate"),
        };
        let staleness = check(RebuildPolicy::default(), &sources, &output);
        assert_eq!(
            staleness.trigger,
            Some(RebuildTrigger::SetupSourceChanged { path: source.clone() })
        );

        set_mtime(&source, base - Duration::from_secs(60));
        assert!(!check(RebuildPolicy::default(), &sources, &output).rebuild());
    }

    #[test]
    fn missing_paths_never_trigger() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sources = StalenessSources {
            setup_source: Some(dir.path().join("missing.json")),
            migrations_dir: dir.path().join("missing"),
        };
        assert!(!check(RebuildPolicy::default(), &sources, dir.path()).rebuild());
        assert!(!newer_than(dir.path(), &dir.path().join("nope")));
        assert_eq!(
            check(RebuildPolicy::forced(), &sources, dir.path()).trigger,
            Some(RebuildTrigger::Forced)
        );
    }
}
