//! YAML fixture files: one per non-empty table per scenario.
use crate::database::Row;
use anyhow::{Context, Result};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Named rows of a single table, in row iteration order.
#[derive(Debug, Default)]
pub struct FixtureDocument {
    entries: Vec<(String, Row)>,
}

impl FixtureDocument {
    pub fn push(&mut self, name: String, row: Row) {
        self.entries.push((name, row));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("serialize fixture YAML")
    }
}

impl Serialize for FixtureDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, row) in &self.entries {
            map.serialize_entry(name, row)?;
        }
        map.end()
    }
}

/// Write a fixture document to `path`, creating parent directories.
pub fn write_fixture_file(path: &Path, document: &FixtureDocument) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let text = document.to_yaml()?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Join file names the way a person would list them: `a, b and c`.
pub fn to_sentence(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [head @ .., last] => format!("{} and {last}", head.join(", ")),
    }
}
