//! Scenario builds: clear the database, run setup, dump every table to YAML.
//!
//! A build is all-or-nothing with respect to the output directory: setup runs
//! before anything on disk is touched, so a failing setup leaves the previous
//! fixtures exactly as they were.
use crate::database::{ColumnValue, Database, FixtureRecord, RecordRef};
use crate::error::{ScenarioError, ScenarioResult};
use crate::fixture::{to_sentence, write_fixture_file, FixtureDocument};
use crate::naming::{CustomNames, RecordNamer};
use crate::paths::is_valid_scenario_path;
use crate::project::FixtureProject;
use crate::staleness::RebuildTrigger;
use crate::util::say;
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Setup procedure run against the live database for one scenario.
pub type SetupFn<'s> = Box<dyn FnOnce(&mut ScenarioContext<'_, 's>) -> Result<()> + 's>;

/// How a scenario is identified: bare, or nested under a parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioSpec {
    Named(String),
    Nested { name: String, parent: String },
}

impl ScenarioSpec {
    /// Bare identifier; every path segment must be a plain name (no `.` or `..`).
    pub fn named(name: impl Into<String>) -> ScenarioResult<Self> {
        let name = name.into();
        if !is_valid_scenario_path(&name) {
            return Err(ScenarioError::InvalidSpec(name));
        }
        Ok(Self::Named(name))
    }

    pub fn nested(name: impl Into<String>, parent: impl Into<String>) -> ScenarioResult<Self> {
        let name = name.into();
        let parent = parent.into();
        if !is_valid_scenario_path(&name) || !is_valid_scenario_path(&parent) {
            return Err(ScenarioError::InvalidSpec(format!("{{{name:?} => {parent:?}}}")));
        }
        Ok(Self::Nested { name, parent })
    }

    /// Interpret a dynamic value: a string, or a single-entry `{name: parent}` object.
    pub fn from_value(value: &serde_json::Value) -> ScenarioResult<Self> {
        match value {
            serde_json::Value::String(name) => Self::named(name.clone()),
            serde_json::Value::Object(map) if map.len() == 1 => {
                let (name, parent) = map
                    .iter()
                    .next()
                    .ok_or_else(|| ScenarioError::InvalidSpec(value.to_string()))?;
                match parent {
                    serde_json::Value::String(parent) => Self::nested(name.clone(), parent.clone()),
                    _ => Err(ScenarioError::InvalidSpec(value.to_string())),
                }
            }
            _ => Err(ScenarioError::InvalidSpec(value.to_string())),
        }
    }

    /// Output path relative to the fixtures root.
    pub fn path(&self) -> String {
        match self {
            Self::Named(name) => name.clone(),
            Self::Nested { name, parent } => format!("{parent}/{name}"),
        }
    }
}

impl TryFrom<&str> for ScenarioSpec {
    type Error = ScenarioError;

    fn try_from(value: &str) -> ScenarioResult<Self> {
        Self::named(value)
    }
}

impl TryFrom<String> for ScenarioSpec {
    type Error = ScenarioError;

    fn try_from(value: String) -> ScenarioResult<Self> {
        Self::named(value)
    }
}

impl TryFrom<(&str, &str)> for ScenarioSpec {
    type Error = ScenarioError;

    fn try_from((name, parent): (&str, &str)) -> ScenarioResult<Self> {
        Self::nested(name, parent)
    }
}

impl TryFrom<BTreeMap<String, String>> for ScenarioSpec {
    type Error = ScenarioError;

    fn try_from(map: BTreeMap<String, String>) -> ScenarioResult<Self> {
        if map.len() != 1 {
            return Err(ScenarioError::InvalidSpec(format!("{map:?}")));
        }
        match map.into_iter().next() {
            Some((name, parent)) => Self::nested(name, parent),
            None => Err(ScenarioError::InvalidSpec("{}".to_string())),
        }
    }
}

/// What a build did for one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildOutcome {
    /// Output existed and nothing forced a rebuild.
    Cached,
    /// Setup ran and these fixture files were written.
    Built {
        trigger: Option<RebuildTrigger>,
        files: Vec<String>,
    },
}

/// Build result for a scenario and the children it declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub scenario: String,
    pub outcome: BuildOutcome,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BuildReport>,
}

impl BuildReport {
    pub fn files(&self) -> &[String] {
        match &self.outcome {
            BuildOutcome::Cached => &[],
            BuildOutcome::Built { files, .. } => files,
        }
    }

    pub fn was_built(&self) -> bool {
        matches!(self.outcome, BuildOutcome::Built { .. })
    }
}

/// Handle passed to setup procedures.
///
/// Exposes the database plus the naming and nesting helpers a setup block
/// needs; names and children are collected here and consumed by the build.
pub struct ScenarioContext<'a, 's> {
    scenario: &'a str,
    db: &'a mut dyn Database,
    custom_names: CustomNames,
    children: Vec<ScenarioBuilder<'s>>,
}

impl<'s> ScenarioContext<'_, 's> {
    /// Path of the scenario being built.
    pub fn scenario(&self) -> &str {
        self.scenario
    }

    pub fn db(&mut self) -> &mut dyn Database {
        &mut *self.db
    }

    pub fn execute(&mut self, sql: &str) -> Result<()> {
        self.db.execute_batch(sql)
    }

    pub fn insert(&mut self, table: &str, values: &[(&str, ColumnValue)]) -> Result<RecordRef> {
        self.db.insert(table, values)
    }

    /// Register `label` as the fixture name of `record`; returns the record.
    pub fn name<R: FixtureRecord>(&mut self, label: impl Into<String>, record: R) -> R {
        self.custom_names.register(label, &record);
        record
    }

    /// Register several `(label, record)` pairs at once.
    pub fn name_all<I, L, R>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (L, R)>,
        L: Into<String>,
        R: FixtureRecord,
    {
        for (label, record) in pairs {
            self.custom_names.register(label, &record);
        }
    }

    /// Declare a child scenario built after this one, nested under it.
    pub fn build_scenario<F>(&mut self, name: &str, setup: F) -> ScenarioResult<()>
    where
        F: FnOnce(&mut ScenarioContext<'_, 's>) -> Result<()> + 's,
    {
        let spec = ScenarioSpec::nested(name, self.scenario)?;
        self.children.push(ScenarioBuilder {
            scenario: spec.path(),
            setup: Box::new(setup),
        });
        Ok(())
    }
}

/// Builds one scenario's fixtures, then its declared children.
pub struct ScenarioBuilder<'s> {
    scenario: String,
    setup: SetupFn<'s>,
}

impl<'s> ScenarioBuilder<'s> {
    /// Create a builder; warns when a nested spec names a parent with no output yet.
    pub fn new<F>(project: &FixtureProject, spec: ScenarioSpec, setup: F) -> Self
    where
        F: FnOnce(&mut ScenarioContext<'_, 's>) -> Result<()> + 's,
    {
        if let ScenarioSpec::Nested { parent, .. } = &spec {
            if !project.paths().scenario_dir_exists(parent) {
                say(&format!(
                    "WARNING: Parent scenario `{parent}' doesn't exist.  Typo?"
                ));
                tracing::warn!(parent = %parent, "parent scenario has no fixture directory");
            }
        }
        Self {
            scenario: spec.path(),
            setup: Box::new(setup),
        }
    }

    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    /// Run the build; see the module docs for ordering guarantees.
    pub fn build(
        self,
        db: &mut dyn Database,
        project: &FixtureProject,
    ) -> ScenarioResult<BuildReport> {
        let Self { scenario, setup } = self;
        let scenario_dir = project.paths().scenario_dir(&scenario);
        let staleness = project.staleness(&scenario);
        let rebuild = staleness.rebuild();
        if !rebuild && scenario_dir.exists() {
            tracing::debug!(scenario = %scenario, "fixtures up to date");
            return Ok(BuildReport {
                scenario,
                outcome: BuildOutcome::Cached,
                children: Vec::new(),
            });
        }

        say(&format!("Building scenario `{scenario}'"));
        tracing::info!(scenario = %scenario, trigger = ?staleness.trigger, "building scenario");

        delete_tables(db, project).map_err(|err| ScenarioError::storage(&scenario, err))?;
        let (custom_names, children) = run_setup(&scenario, db, setup)?;

        if rebuild && scenario_dir.exists() {
            fs::remove_dir_all(&scenario_dir)
                .with_context(|| format!("remove {}", scenario_dir.display()))
                .map_err(|err| ScenarioError::storage(&scenario, err))?;
        }
        fs::create_dir_all(&scenario_dir)
            .with_context(|| format!("create {}", scenario_dir.display()))
            .map_err(|err| ScenarioError::storage(&scenario, err))?;

        let files = dump_tables(&scenario, db, project, &custom_names, rebuild)
            .map_err(|err| ScenarioError::storage(&scenario, err))?;
        if files.is_empty() {
            say(&format!("Built scenario `{scenario}' with no tables"));
        } else {
            say(&format!(
                "Built scenario `{scenario}' with {}",
                to_sentence(&files)
            ));
        }

        let mut child_reports = Vec::with_capacity(children.len());
        for child in children {
            child_reports.push(child.build(db, project)?);
        }

        Ok(BuildReport {
            scenario,
            outcome: BuildOutcome::Built {
                trigger: staleness.trigger,
                files,
            },
            children: child_reports,
        })
    }
}

fn delete_tables(db: &mut dyn Database, project: &FixtureProject) -> Result<()> {
    for table in project.fixture_tables(db)? {
        db.delete_all(&table)?;
    }
    Ok(())
}

fn run_setup<'s>(
    scenario: &str,
    db: &mut dyn Database,
    setup: SetupFn<'s>,
) -> ScenarioResult<(CustomNames, Vec<ScenarioBuilder<'s>>)> {
    let mut ctx = ScenarioContext {
        scenario,
        db,
        custom_names: CustomNames::default(),
        children: Vec::new(),
    };
    let outcome = catch_unwind(AssertUnwindSafe(|| setup(&mut ctx)));
    let error = match outcome {
        Ok(Ok(())) => {
            tracing::debug!(
                scenario,
                named = ctx.custom_names.len(),
                children = ctx.children.len(),
                "setup complete"
            );
            return Ok((ctx.custom_names, ctx.children));
        }
        Ok(Err(err)) => err,
        Err(payload) => anyhow!("setup panicked: {}", panic_message(payload.as_ref())),
    };
    let message = format!("{error:#}");
    tracing::error!(scenario, error = %message, "scenario setup failed");
    Err(ScenarioError::Setup {
        scenario: scenario.to_string(),
        error,
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn dump_tables(
    scenario: &str,
    db: &mut dyn Database,
    project: &FixtureProject,
    custom_names: &CustomNames,
    rebuild: bool,
) -> Result<Vec<String>> {
    let settings = project.settings();
    let mut files = Vec::new();
    for table in project.fixture_tables(db)? {
        let path = project
            .paths()
            .fixture_file(scenario, &table, &settings.extension);
        if !rebuild && path.exists() {
            tracing::debug!(scenario, table = %table, "fixture file exists, skipping");
            continue;
        }
        let rows = db.select_all(&table)?;
        if rows.is_empty() {
            continue;
        }

        let mut namer = RecordNamer::new(&table, &settings.name_columns, custom_names);
        let mut document = FixtureDocument::default();
        for row in rows {
            let name = namer.name_row(&row);
            document.push(name, row);
        }
        write_fixture_file(&path, &document)?;
        tracing::debug!(scenario, table = %table, rows = document.len(), "dumped table");
        files.push(format!("{table}.{}", settings.extension));
    }
    Ok(files)
}
