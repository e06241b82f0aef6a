//! Project-wide context shared by every scenario build in a run.
use crate::catalog::{load_catalog_if_exists, ScenarioCatalogFile};
use crate::config::{FixtureSettings, RebuildPolicy};
use crate::database::Database;
use crate::error::ScenarioResult;
use crate::paths::FixturePaths;
use crate::staleness::{self, Staleness, StalenessSources};
use anyhow::Result;
use std::cell::OnceCell;
use std::path::PathBuf;

/// Paths, settings, and rebuild policy for one project root.
///
/// The scenario catalog is read lazily and at most once per project.
#[derive(Debug)]
pub struct FixtureProject {
    paths: FixturePaths,
    settings: FixtureSettings,
    policy: RebuildPolicy,
    catalog: OnceCell<ScenarioCatalogFile>,
}

impl FixtureProject {
    /// Project with default settings and the force flags read from the environment.
    pub fn new(root: PathBuf) -> Self {
        Self {
            paths: FixturePaths::new(root),
            settings: FixtureSettings::default(),
            policy: RebuildPolicy::from_env(),
            catalog: OnceCell::new(),
        }
    }

    /// Like [`FixtureProject::new`], but applies `settings` from `scenarios.json` when present.
    pub fn discover(root: PathBuf) -> ScenarioResult<Self> {
        let mut project = Self::new(root);
        if let Some(settings) = project.catalog()?.settings.clone() {
            project.settings = settings;
        }
        Ok(project)
    }

    pub fn with_settings(mut self, settings: FixtureSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_policy(mut self, policy: RebuildPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn paths(&self) -> &FixturePaths {
        &self.paths
    }

    pub fn settings(&self) -> &FixtureSettings {
        &self.settings
    }

    pub fn policy(&self) -> RebuildPolicy {
        self.policy
    }

    /// Load `scenarios.json` on first use; a missing file is an empty catalog.
    pub fn catalog(&self) -> ScenarioResult<&ScenarioCatalogFile> {
        if let Some(catalog) = self.catalog.get() {
            return Ok(catalog);
        }
        let loaded = load_catalog_if_exists(&self.paths.catalog_path())?;
        tracing::debug!(
            path = %self.paths.catalog_path().display(),
            scenarios = loaded.scenarios.len(),
            "loaded scenario catalog"
        );
        Ok(self.catalog.get_or_init(|| loaded))
    }

    pub fn staleness_sources(&self) -> StalenessSources {
        StalenessSources::for_project(&self.paths, &self.settings)
    }

    /// Rebuild decision for a scenario path.
    pub fn staleness(&self, scenario: &str) -> Staleness {
        staleness::check(
            self.policy,
            &self.staleness_sources(),
            &self.paths.scenario_dir(scenario),
        )
    }

    /// Tables to clear and dump: everything except the skip-list.
    pub fn fixture_tables(&self, db: &mut dyn Database) -> Result<Vec<String>> {
        Ok(db
            .table_names()?
            .into_iter()
            .filter(|table| !self.settings.is_skipped(table))
            .collect())
    }
}
