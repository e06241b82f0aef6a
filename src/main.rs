use anyhow::{Context, Result};
use clap::Parser;
use scenario_fixtures::staleness::RebuildTrigger;
use scenario_fixtures::util::display_path;
use scenario_fixtures::{hook, FixtureProject, ScenarioDefinition, ScenarioError, SqliteDatabase};
use serde::Serialize;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
use cli::{BuildArgs, Command, ListArgs, RootArgs, StatusArgs};

fn main() -> Result<()> {
    init_tracing();
    let args = RootArgs::parse();

    match args.command {
        Command::Build(args) => cmd_build(args),
        Command::Status(args) => cmd_status(args),
        Command::List(args) => cmd_list(args),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn cmd_build(args: BuildArgs) -> Result<()> {
    let project = FixtureProject::discover(args.root.clone())?;
    let policy = project.policy().or_forced(args.force);
    let project = project.with_policy(policy);
    let catalog = project.catalog()?;
    if catalog.scenarios.is_empty() {
        println!(
            "No scenarios declared in {}",
            display_path(&project.paths().catalog_path(), Some(&args.root))
        );
        return Ok(());
    }

    let selected: Vec<&ScenarioDefinition> = if args.scenario.is_empty() {
        catalog.scenarios.iter().collect()
    } else {
        args.scenario
            .iter()
            .map(|name| {
                catalog
                    .find(name)
                    .ok_or_else(|| ScenarioError::UnknownScenario(name.clone()))
            })
            .collect::<Result<_, _>>()?
    };

    let mut db = SqliteDatabase::open(&args.database)?;
    let mut reports = Vec::with_capacity(selected.len());
    for definition in selected {
        let builder = definition.builder(&project)?;
        reports.push(hook::build_or_exit(builder, &mut db, &project));
    }

    if let Some(report_path) = &args.report {
        write_json(report_path, &reports)?;
        println!("Wrote build report to {}", report_path.display());
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct ScenarioStatus {
    scenario: String,
    exists: bool,
    stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    trigger: Option<RebuildTrigger>,
}

fn cmd_status(args: StatusArgs) -> Result<()> {
    let project = FixtureProject::discover(args.root.clone())?;
    let statuses: Vec<ScenarioStatus> = project
        .catalog()?
        .paths()
        .into_iter()
        .map(|scenario| {
            let exists = project.paths().scenario_dir_exists(&scenario);
            let staleness = project.staleness(&scenario);
            ScenarioStatus {
                stale: exists && staleness.rebuild(),
                trigger: staleness.trigger,
                exists,
                scenario,
            }
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }
    for status in &statuses {
        let state = if !status.exists {
            "missing".to_string()
        } else if let Some(trigger) = &status.trigger {
            format!("stale ({})", describe_trigger(trigger, &args.root))
        } else {
            "up to date".to_string()
        };
        println!("{}: {state}", status.scenario);
    }
    Ok(())
}

fn describe_trigger(trigger: &RebuildTrigger, root: &Path) -> String {
    match trigger {
        RebuildTrigger::Forced => "rebuild forced".to_string(),
        RebuildTrigger::SetupSourceChanged { path } => {
            format!("{} changed", display_path(path, Some(root)))
        }
        RebuildTrigger::MigrationsChanged { path } => {
            format!("{} changed", display_path(path, Some(root)))
        }
    }
}

fn cmd_list(args: ListArgs) -> Result<()> {
    let project = FixtureProject::discover(args.root.clone())?;
    for path in project.catalog()?.paths() {
        let depth = path.matches('/').count();
        println!("{}{path}", "  ".repeat(depth));
    }
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize build report")?;
    std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
