//! Fixture settings and the environment-driven rebuild policy.
use serde::{Deserialize, Serialize};

/// Environment variables whose presence forces every scenario to rebuild.
pub const REBUILD_ENV_FLAGS: [&str; 4] =
    ["REBUILD_FIXTURES", "BUILD_FIXTURES", "NEW_FIXTURES", "NF"];

fn default_skip_tables() -> Vec<String> {
    [
        "schema_info",
        "schema_migrations",
        "__diesel_schema_migrations",
        "_sqlx_migrations",
    ]
    .iter()
    .map(|table| table.to_string())
    .collect()
}

fn default_name_columns() -> Vec<String> {
    ["name", "title", "username", "login"]
        .iter()
        .map(|column| column.to_string())
        .collect()
}

fn default_migrations_dir() -> String {
    "db/migrate".to_string()
}

fn default_extension() -> String {
    "yml".to_string()
}

/// Knobs shared by every builder in a run (`settings` in `scenarios.json`).
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FixtureSettings {
    /// Schema/metadata tables never cleared nor dumped.
    #[serde(default = "default_skip_tables")]
    pub skip_tables: Vec<String>,
    /// Columns probed, in order, when inferring a record name.
    #[serde(default = "default_name_columns")]
    pub name_columns: Vec<String>,
    /// Migration directory relative to the project root.
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: String,
    /// Fixture file extension.
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for FixtureSettings {
    fn default() -> Self {
        Self {
            skip_tables: default_skip_tables(),
            name_columns: default_name_columns(),
            migrations_dir: default_migrations_dir(),
            extension: default_extension(),
        }
    }
}

impl FixtureSettings {
    pub fn is_skipped(&self, table: &str) -> bool {
        self.skip_tables.iter().any(|skip| skip == table)
    }
}

/// Whether the caller asked for every scenario to be rebuilt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildPolicy {
    pub forced: bool,
}

impl RebuildPolicy {
    /// Read the force flags from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars_os().map(|(key, _)| key.to_string_lossy().into_owned()))
    }

    /// Derive the policy from a list of environment variable names.
    pub fn from_vars<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let forced = keys
            .into_iter()
            .any(|key| REBUILD_ENV_FLAGS.contains(&key.as_ref()));
        Self { forced }
    }

    pub fn forced() -> Self {
        Self { forced: true }
    }

    /// Combine with an explicit override such as `--force`.
    pub fn or_forced(self, force: bool) -> Self {
        Self {
            forced: self.forced || force,
        }
    }
}
