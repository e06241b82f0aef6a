//! Entry points for test suites.
//!
//! `scenario` builds an ad-hoc scenario from a closure; `with_scenario` builds
//! a catalog scenario and then runs the wrapped test body. Both treat a failing
//! setup as fatal for the whole process: partially generated fixtures are worse
//! than no run at all.
use crate::builder::{BuildReport, ScenarioBuilder, ScenarioContext, ScenarioSpec};
use crate::database::Database;
use crate::error::{ScenarioError, ScenarioResult};
use crate::project::FixtureProject;
use crate::util::say;
use anyhow::Result;
use std::backtrace::{Backtrace, BacktraceStatus};

/// Build a scenario defined by `setup`, exiting the process on failure.
pub fn scenario<'s, S, F>(
    project: &FixtureProject,
    db: &mut dyn Database,
    spec: S,
    setup: F,
) -> BuildReport
where
    S: TryInto<ScenarioSpec, Error = ScenarioError>,
    F: FnOnce(&mut ScenarioContext<'_, 's>) -> Result<()> + 's,
{
    let spec = match spec.try_into() {
        Ok(spec) => spec,
        Err(err) => exit_with_diagnostics(None, &err),
    };
    let builder = ScenarioBuilder::new(project, spec, setup);
    build_or_exit(builder, db, project)
}

/// Run `builder`, printing diagnostics and exiting with status 1 on failure.
pub fn build_or_exit(
    builder: ScenarioBuilder<'_>,
    db: &mut dyn Database,
    project: &FixtureProject,
) -> BuildReport {
    let name = builder.scenario().to_string();
    match builder.build(db, project) {
        Ok(report) => report,
        Err(err) => exit_with_diagnostics(Some(&name), &err),
    }
}

/// Build the catalog scenario `name` (if declared), then run `test`.
///
/// Scenarios missing from the catalog are assumed to be hand-maintained
/// fixtures and are passed straight through to `test`.
pub fn run_with_scenario<T>(
    project: &FixtureProject,
    db: &mut dyn Database,
    name: &str,
    test: impl FnOnce() -> T,
) -> ScenarioResult<T> {
    let catalog = project.catalog()?;
    match catalog.find(name) {
        Some(definition) => {
            definition.builder(project)?.build(db, project)?;
        }
        None => {
            tracing::debug!(scenario = name, "scenario not declared in catalog");
        }
    }
    Ok(test())
}

/// [`run_with_scenario`] that exits the process when the build fails.
pub fn with_scenario<T>(
    project: &FixtureProject,
    db: &mut dyn Database,
    name: &str,
    test: impl FnOnce() -> T,
) -> T {
    match run_with_scenario(project, db, name, test) {
        Ok(value) => value,
        Err(err) => exit_with_diagnostics(Some(name), &err),
    }
}

/// Lines describing a failed build, as printed before exiting.
pub fn diagnostic_lines(scenario: Option<&str>, err: &ScenarioError) -> Vec<String> {
    let scenario = match err {
        ScenarioError::Setup { scenario, .. } | ScenarioError::Storage { scenario, .. } => {
            Some(scenario.as_str())
        }
        _ => scenario,
    };
    let mut lines = Vec::new();
    match scenario {
        Some(scenario) => lines.push(format!("There was an error building scenario `{scenario}'")),
        None => lines.push("There was an error building a scenario".to_string()),
    }
    lines.push(describe(err));
    lines
}

fn describe(err: &ScenarioError) -> String {
    match err {
        ScenarioError::Setup { error, .. } | ScenarioError::Storage { error, .. } => {
            format!("{error:?}")
        }
        other => other.to_string(),
    }
}

fn exit_with_diagnostics(scenario: Option<&str>, err: &ScenarioError) -> ! {
    tracing::error!(error = %err, "scenario build aborted");
    println!();
    for line in diagnostic_lines(scenario, err) {
        say(&line);
    }
    println!();
    let has_error_backtrace = matches!(
        err,
        ScenarioError::Setup { error, .. } | ScenarioError::Storage { error, .. }
            if error.backtrace().status() == BacktraceStatus::Captured
    );
    if !has_error_backtrace {
        println!("{}", Backtrace::force_capture());
        println!();
    }
    std::process::exit(1);
}
