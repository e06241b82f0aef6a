//! CLI argument parsing for `fixgen`.
//!
//! The CLI only drives catalog scenarios; closure-defined scenarios are built
//! from test code through the library.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "fixgen",
    version,
    about = "Build YAML test fixtures from database scenarios",
    after_help = "Examples:\n  fixgen build --root . --database db/test.sqlite3\n  fixgen build --root . --database db/test.sqlite3 --scenario staff --force\n  fixgen status --root . --json\n  fixgen list --root .",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Build(BuildArgs),
    Status(StatusArgs),
    List(ListArgs),
}

/// Build command inputs.
#[derive(Parser, Debug)]
#[command(about = "Build catalog scenarios whose fixtures are missing or stale")]
pub struct BuildArgs {
    /// Project root containing spec/ or test/
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// SQLite database the scenarios run against
    #[arg(long, value_name = "PATH")]
    pub database: PathBuf,

    /// Only build these top-level scenarios (repeatable)
    #[arg(long, value_name = "NAME")]
    pub scenario: Vec<String>,

    /// Rebuild even when fixtures look up to date
    #[arg(long)]
    pub force: bool,

    /// Write a machine-readable build report to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}

/// Status command inputs.
#[derive(Parser, Debug)]
#[command(about = "Report which catalog scenarios are missing or stale")]
pub struct StatusArgs {
    /// Project root containing spec/ or test/
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

/// List command inputs.
#[derive(Parser, Debug)]
#[command(about = "List scenarios declared in the catalog")]
pub struct ListArgs {
    /// Project root containing spec/ or test/
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,
}
