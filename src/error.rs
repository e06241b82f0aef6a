//! Error taxonomy for scenario builds.
//!
//! Collaborators (database backends, filesystem helpers) speak `anyhow`; the
//! builder folds those into [`ScenarioError`] so callers can tell a bad spec
//! from a broken setup block from a storage failure.
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by scenario construction and builds.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The scenario identifier could not be interpreted.
    #[error("I don't know how to build `{0}'")]
    InvalidSpec(String),

    /// The setup procedure returned an error or panicked.
    #[error("error building scenario `{scenario}': {error:#}")]
    Setup {
        /// Scenario path being built.
        scenario: String,
        /// Error raised by the setup procedure.
        error: anyhow::Error,
    },

    /// Filesystem or database failure while building.
    #[error("storage failure building scenario `{scenario}': {error:#}")]
    Storage {
        /// Scenario path being built.
        scenario: String,
        /// Underlying failure.
        error: anyhow::Error,
    },

    /// The scenario catalog could not be read or failed validation.
    #[error("invalid scenario catalog {}: {error:#}", path.display())]
    Catalog {
        /// Catalog file path.
        path: PathBuf,
        /// Parse or validation failure.
        error: anyhow::Error,
    },

    /// A named scenario was requested but never declared.
    #[error("no scenario named `{0}' is declared")]
    UnknownScenario(String),
}

impl ScenarioError {
    pub(crate) fn storage(scenario: &str, error: anyhow::Error) -> Self {
        Self::Storage {
            scenario: scenario.to_string(),
            error,
        }
    }

    /// Whether this error came out of a user setup procedure.
    pub fn is_setup_failure(&self) -> bool {
        matches!(self, Self::Setup { .. })
    }
}

/// Result alias for library entry points.
pub type ScenarioResult<T> = Result<T, ScenarioError>;
