//! Declarative scenario catalog (`<fixtures>/scenarios.json`).
//!
//! The catalog lets a project declare scenarios as SQL plus explicit record
//! names instead of Rust closures, so the `fixgen` binary and the test hook can
//! build them without recompiling anything. Its mtime doubles as the setup
//! source for staleness checks.
use crate::builder::{ScenarioBuilder, ScenarioContext, ScenarioSpec};
use crate::config::FixtureSettings;
use crate::database::RecordRef;
use crate::error::{ScenarioError, ScenarioResult};
use crate::paths::is_valid_scenario_path;
use crate::project::FixtureProject;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

pub const CATALOG_SCHEMA_VERSION: u32 = 1;

/// Parsed `scenarios.json`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScenarioCatalogFile {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<FixtureSettings>,
    #[serde(default)]
    pub scenarios: Vec<ScenarioDefinition>,
}

impl ScenarioCatalogFile {
    pub fn empty() -> Self {
        Self {
            schema_version: CATALOG_SCHEMA_VERSION,
            settings: None,
            scenarios: Vec::new(),
        }
    }

    /// Find a top-level scenario by name or by its full path.
    pub fn find(&self, name: &str) -> Option<&ScenarioDefinition> {
        self.scenarios
            .iter()
            .find(|scenario| scenario.name == name || scenario.path() == name)
    }

    /// Every declared scenario path, parents before children.
    pub fn paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        for scenario in &self.scenarios {
            scenario.collect_paths(&scenario.path(), &mut paths);
        }
        paths
    }
}

/// One declared scenario.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScenarioDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sql: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<NameAssignment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ScenarioDefinition>,
}

/// Explicit fixture name for a row inserted by the scenario SQL.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NameAssignment {
    pub label: String,
    pub table: String,
    pub id: i64,
}

impl ScenarioDefinition {
    pub fn spec(&self) -> ScenarioResult<ScenarioSpec> {
        match self.parent.as_deref() {
            Some(parent) => ScenarioSpec::nested(self.name.as_str(), parent),
            None => ScenarioSpec::named(self.name.as_str()),
        }
    }

    /// Output path relative to the fixtures root.
    pub fn path(&self) -> String {
        match self.parent.as_deref() {
            Some(parent) => format!("{parent}/{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Builder whose setup runs this definition's SQL, names, and children.
    pub fn builder(&self, project: &FixtureProject) -> ScenarioResult<ScenarioBuilder<'_>> {
        let spec = self.spec()?;
        Ok(ScenarioBuilder::new(project, spec, move |ctx| self.apply(ctx)))
    }

    fn apply<'s>(&'s self, ctx: &mut ScenarioContext<'_, 's>) -> Result<()> {
        for (idx, statement) in self.sql.iter().enumerate() {
            ctx.execute(statement).with_context(|| {
                format!("scenario `{}' sql statement #{}", self.path(), idx + 1)
            })?;
        }
        ctx.name_all(
            self.names
                .iter()
                .map(|entry| (entry.label.clone(), RecordRef::new(entry.table.clone(), entry.id))),
        );
        for child in &self.children {
            ctx.build_scenario(&child.name, move |child_ctx| child.apply(child_ctx))?;
        }
        Ok(())
    }

    fn collect_paths(&self, path: &str, out: &mut Vec<String>) {
        out.push(path.to_string());
        for child in &self.children {
            child.collect_paths(&format!("{path}/{}", child.name), out);
        }
    }
}

/// Read and validate a catalog file.
pub fn load_catalog(path: &Path) -> ScenarioResult<ScenarioCatalogFile> {
    let catalog_error = |error: anyhow::Error| ScenarioError::Catalog {
        path: path.to_path_buf(),
        error,
    };
    let bytes = fs::read(path)
        .with_context(|| format!("read scenario catalog {}", path.display()))
        .map_err(catalog_error)?;
    let catalog: ScenarioCatalogFile = serde_json::from_slice(&bytes)
        .context("parse scenario catalog JSON")
        .map_err(catalog_error)?;
    validate_catalog(&catalog).map_err(catalog_error)?;
    Ok(catalog)
}

/// Like [`load_catalog`], but a missing file yields an empty catalog.
pub fn load_catalog_if_exists(path: &Path) -> ScenarioResult<ScenarioCatalogFile> {
    if !path.is_file() {
        return Ok(ScenarioCatalogFile::empty());
    }
    load_catalog(path)
}

/// Validate schema version and naming constraints.
pub fn validate_catalog(catalog: &ScenarioCatalogFile) -> Result<()> {
    if catalog.schema_version != CATALOG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported scenario catalog schema_version {}",
            catalog.schema_version
        ));
    }
    let mut seen = BTreeSet::new();
    for scenario in &catalog.scenarios {
        if let Some(parent) = scenario.parent.as_deref() {
            if !is_valid_scenario_path(parent) {
                return Err(anyhow!(
                    "scenario `{}' has an invalid parent `{parent}'",
                    scenario.name
                ));
            }
        }
        validate_definition(scenario)?;
        if !seen.insert(scenario.path()) {
            return Err(anyhow!("duplicate scenario `{}'", scenario.path()));
        }
    }
    Ok(())
}

fn validate_definition(scenario: &ScenarioDefinition) -> Result<()> {
    let name = scenario.name.trim();
    if name.is_empty() {
        return Err(anyhow!("scenario names must not be empty"));
    }
    if name.contains('/') {
        return Err(anyhow!(
            "scenario `{name}' must not contain `/' (use parent or children for nesting)"
        ));
    }
    if !is_valid_scenario_path(&scenario.name) {
        return Err(anyhow!("scenario `{name}' is not a valid directory name"));
    }
    for entry in &scenario.names {
        if entry.label.trim().is_empty() {
            return Err(anyhow!("scenario `{name}' has a name entry with an empty label"));
        }
        if entry.table.trim().is_empty() {
            return Err(anyhow!("scenario `{name}' has a name entry with an empty table"));
        }
    }
    let mut children = BTreeSet::new();
    for child in &scenario.children {
        if child.parent.is_some() {
            return Err(anyhow!(
                "child scenario `{}' of `{name}' must not set parent",
                child.name
            ));
        }
        validate_definition(child)?;
        if !children.insert(child.name.as_str()) {
            return Err(anyhow!(
                "duplicate child scenario `{}' under `{name}'",
                child.name
            ));
        }
    }
    Ok(())
}
