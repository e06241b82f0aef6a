//! # scenario-fixtures
//!
//! Scenario-driven fixture generation for database-backed test suites.
//!
//! A *scenario* is a named set of seeded rows. Building one clears the
//! database, runs a setup procedure, and dumps every non-empty table to
//! `<spec|test>/fixtures/<scenario>/<table>.yml`, naming each row so tests can
//! refer to it. Output is cached: a scenario is rebuilt only when forced
//! (`REBUILD_FIXTURES`, `BUILD_FIXTURES`, `NEW_FIXTURES`, `NF`) or when the
//! scenario catalog or the migrations directory is newer than its output.
//!
//! ```rust,ignore
//! use scenario_fixtures::{hook, FixtureProject, SqliteDatabase};
//!
//! let project = FixtureProject::discover(".".into())?;
//! let mut db = SqliteDatabase::open("db/test.sqlite3".as_ref())?;
//! hook::scenario(&project, &mut db, "staff", |ctx| {
//!     let ann = ctx.insert("employees", &[("name", "Ann".into())])?;
//!     ctx.name("boss", ann);
//!     ctx.build_scenario("with_projects", |ctx| {
//!         ctx.execute("INSERT INTO projects (title) VALUES ('Apollo')")
//!     })?;
//!     Ok(())
//! });
//! ```

pub mod builder;
pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod fixture;
pub mod hook;
pub mod naming;
pub mod paths;
pub mod project;
pub mod staleness;
pub mod util;

pub use builder::{BuildOutcome, BuildReport, ScenarioBuilder, ScenarioContext, ScenarioSpec};
pub use catalog::{ScenarioCatalogFile, ScenarioDefinition};
pub use config::{FixtureSettings, RebuildPolicy};
pub use database::{ColumnValue, Database, FixtureRecord, RecordRef, Row, SqliteDatabase};
pub use error::{ScenarioError, ScenarioResult};
pub use paths::FixturePaths;
pub use project::FixtureProject;
pub use staleness::{RebuildTrigger, Staleness};
