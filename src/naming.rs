//! Display names for dumped rows.
//!
//! Explicit names registered during setup win; otherwise the first non-empty
//! candidate column is normalized into a name, and rows with nothing usable
//! fall back to `<table>_<NNN>`. Names are unique within one table dump.
use crate::database::{FixtureRecord, Row};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// Explicit names registered during setup, keyed by `(table, id)`.
#[derive(Debug, Default, Clone)]
pub struct CustomNames {
    names: HashMap<(String, i64), String>,
}

impl CustomNames {
    pub fn register<R: FixtureRecord>(&mut self, label: impl Into<String>, record: &R) {
        self.names.insert(
            (record.table_name().to_string(), record.record_id()),
            label.into(),
        );
    }

    pub fn lookup(&self, table: &str, id: i64) -> Option<&str> {
        self.names.get(&(table.to_string(), id)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Assigns unique names to the rows of a single table dump.
pub struct RecordNamer<'a> {
    table: &'a str,
    name_columns: &'a [String],
    custom: &'a CustomNames,
    used: HashSet<String>,
    base_counts: HashMap<String, usize>,
    row_index: u32,
}

impl<'a> RecordNamer<'a> {
    pub fn new(table: &'a str, name_columns: &'a [String], custom: &'a CustomNames) -> Self {
        Self {
            table,
            name_columns,
            custom,
            used: HashSet::new(),
            base_counts: HashMap::new(),
            row_index: 0,
        }
    }

    /// Name the next row in iteration order.
    pub fn name_row(&mut self, row: &Row) -> String {
        let explicit = row
            .id()
            .and_then(|id| self.custom.lookup(self.table, id))
            .map(str::to_string);
        let name = match explicit {
            Some(label) => self.claim_explicit(label),
            None => match self.inferred_base(row) {
                Some(base) => self.claim_inferred(base),
                None => self.claim_fallback(),
            },
        };
        self.used.insert(name.clone());
        name
    }

    fn inferred_base(&self, row: &Row) -> Option<String> {
        self.name_columns.iter().find_map(|column| {
            let raw = row.get(column)?.as_name_source()?;
            let normalized = normalize_name(&raw);
            normalized
                .chars()
                .any(|ch| ch != '_')
                .then_some(normalized)
        })
    }

    fn claim_explicit(&mut self, label: String) -> String {
        if !self.used.contains(&label) {
            return label;
        }
        let (name, _) = self.next_free_suffix(&label, 1);
        tracing::warn!(
            table = self.table,
            label = %label,
            renamed = %name,
            "explicit record name already used in this table"
        );
        name
    }

    fn claim_inferred(&mut self, base: String) -> String {
        let count = self.base_counts.get(&base).copied().unwrap_or(0);
        if count == 0 && !self.used.contains(&base) {
            self.base_counts.insert(base.clone(), 1);
            return base;
        }
        let (name, suffix) = self.next_free_suffix(&base, count.max(1));
        self.base_counts.insert(base, suffix + 1);
        name
    }

    fn claim_fallback(&mut self) -> String {
        loop {
            self.row_index += 1;
            let name = format!("{}_{:03}", self.table, self.row_index);
            if !self.used.contains(&name) {
                return name;
            }
        }
    }

    fn next_free_suffix(&self, base: &str, start: usize) -> (String, usize) {
        let mut suffix = start;
        loop {
            let candidate = format!("{base}_{suffix}");
            if !self.used.contains(&candidate) {
                return (candidate, suffix);
            }
            suffix += 1;
        }
    }
}

/// Normalize a column value into a fixture-friendly name.
///
/// Camel case is split (`JohnSmith` -> `john_smith`), everything is lowercased,
/// and each run of non-word characters becomes a single underscore. Existing
/// underscores are left alone and nothing is trimmed (`The End!` -> `the_end_`).
pub fn normalize_name(raw: &str) -> String {
    static ACRONYM: OnceLock<Regex> = OnceLock::new();
    static CAMEL: OnceLock<Regex> = OnceLock::new();
    static NON_WORD: OnceLock<Regex> = OnceLock::new();

    let acronym =
        ACRONYM.get_or_init(|| Regex::new(r"([A-Z\d]+)([A-Z][a-z])").expect("acronym regex"));
    let camel = CAMEL.get_or_init(|| Regex::new(r"([a-z\d])([A-Z])").expect("camel case regex"));
    let non_word = NON_WORD.get_or_init(|| Regex::new(r"\W+").expect("non-word regex"));

    let split = acronym.replace_all(raw, "${1}_${2}");
    let split = camel.replace_all(&split, "${1}_${2}");
    let lowered = split.to_lowercase();
    non_word.replace_all(&lowered, "_").into_owned()
}
