//! SQLite backend for the [`Database`] collaborator.
use super::{ColumnValue, Database, RecordRef, Row};
use anyhow::{anyhow, Context, Result};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;

/// [`Database`] over a `rusqlite` connection.
pub struct SqliteDatabase {
    conn: Connection,
}

impl SqliteDatabase {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("open sqlite database {}", path.display()))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite database")?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn has_rowid(&self, table: &str) -> bool {
        self.conn
            .prepare(&format!("SELECT rowid FROM {} LIMIT 0", quote_ident(table)))
            .is_ok()
    }
}

impl Database for SqliteDatabase {
    fn table_names(&mut self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type='table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("list sqlite tables")?;
        Ok(names)
    }

    fn delete_all(&mut self, table: &str) -> Result<()> {
        self.conn
            .execute(&format!("DELETE FROM {}", quote_ident(table)), [])
            .with_context(|| format!("delete rows from {table}"))?;
        Ok(())
    }

    fn select_all(&mut self, table: &str) -> Result<Vec<Row>> {
        let order = if self.has_rowid(table) {
            " ORDER BY rowid"
        } else {
            ""
        };
        let sql = format!("SELECT * FROM {}{order}", quote_ident(table));
        let mut stmt = self
            .conn
            .prepare(&sql)
            .with_context(|| format!("prepare select from {table}"))?;
        let names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();
        let rows = stmt
            .query_map([], |row| {
                let mut columns = Vec::with_capacity(names.len());
                for (idx, name) in names.iter().enumerate() {
                    let value: Value = row.get(idx)?;
                    columns.push((name.clone(), column_value(value)));
                }
                Ok(Row::new(columns))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("select rows from {table}"))?;
        Ok(rows)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql).context("execute sql batch")?;
        Ok(())
    }

    fn insert(&mut self, table: &str, values: &[(&str, ColumnValue)]) -> Result<RecordRef> {
        let changed = if values.is_empty() {
            self.conn
                .execute(&format!("INSERT INTO {} DEFAULT VALUES", quote_ident(table)), [])
                .with_context(|| format!("insert into {table}"))?
        } else {
            let columns = values
                .iter()
                .map(|(name, _)| quote_ident(name))
                .collect::<Vec<_>>()
                .join(", ");
            let placeholders = vec!["?"; values.len()].join(", ");
            let sql = format!(
                "INSERT INTO {} ({columns}) VALUES ({placeholders})",
                quote_ident(table)
            );
            let params = values.iter().map(|(_, value)| sql_value(value));
            self.conn
                .execute(&sql, params_from_iter(params))
                .with_context(|| format!("insert into {table}"))?
        };
        if changed == 0 {
            return Err(anyhow!("insert into {table} did not add a row"));
        }

        let explicit_id = values
            .iter()
            .find(|(name, _)| *name == "id")
            .and_then(|(_, value)| value.as_id());
        let id = match explicit_id {
            Some(id) => id,
            None if self.has_rowid(table) => self.conn.last_insert_rowid(),
            None => {
                return Err(anyhow!(
                    "insert into {table} needs an explicit id (table has no rowid)"
                ))
            }
        };
        Ok(RecordRef::new(table, id))
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn column_value(value: Value) -> ColumnValue {
    match value {
        Value::Null => ColumnValue::Null,
        Value::Integer(value) => ColumnValue::Integer(value),
        Value::Real(value) => ColumnValue::Real(value),
        Value::Text(text) => ColumnValue::Text(text),
        Value::Blob(bytes) => ColumnValue::Blob(bytes),
    }
}

fn sql_value(value: &ColumnValue) -> Value {
    match value {
        ColumnValue::Null => Value::Null,
        ColumnValue::Integer(value) => Value::Integer(*value),
        ColumnValue::Real(value) => Value::Real(*value),
        ColumnValue::Text(text) => Value::Text(text.clone()),
        ColumnValue::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> SqliteDatabase {
        let mut db = SqliteDatabase::open_in_memory().expect("open db");
        db.execute_batch(
            "CREATE TABLE employees (id INTEGER PRIMARY KEY, name TEXT, salary REAL);
             CREATE TABLE schema_migrations (version TEXT);",
        )
        .expect("create tables");
        db
    }

    #[test]
    fn lists_tables_sorted() {
        let mut db = seeded();
        assert_eq!(
            db.table_names().expect("tables"),
            vec!["employees".to_string(), "schema_migrations".to_string()]
        );
    }

    #[test]
    fn insert_select_and_delete() {
        let mut db = seeded();
        let ann = db
            .insert("employees", &[("name", "Ann".into()), ("salary", 10.5_f64.into())])
            .expect("insert ann");
        assert_eq!(ann, RecordRef::new("employees", 1));
        let bob = db
            .insert("employees", &[("id", 9_i64.into()), ("name", "Bob".into())])
            .expect("insert bob");
        assert_eq!(bob.id, 9);

        let rows = db.select_all("employees").expect("select");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("name"), Some(&ColumnValue::Text("Ann".into())));
        assert_eq!(rows[1].get("salary"), Some(&ColumnValue::Null));
        assert_eq!(rows[1].id(), Some(9));

        db.delete_all("employees").expect("delete");
        assert!(db.select_all("employees").expect("select").is_empty());
    }

    #[test]
    fn explicit_zero_id_is_a_valid_row_id() {
        let mut db = seeded();
        let zero = db
            .insert("employees", &[("id", 0_i64.into()), ("name", "Zed".into())])
            .expect("insert id 0");
        assert_eq!(zero, RecordRef::new("employees", 0));
    }

    #[test]
    fn without_rowid_tables_need_an_explicit_id() {
        let mut db = seeded();
        db.execute_batch("CREATE TABLE tags (label TEXT PRIMARY KEY, id INTEGER) WITHOUT ROWID;")
            .expect("create tags");
        // leaves a non-zero last_insert_rowid behind
        db.insert("employees", &[("name", "Ann".into())]).expect("insert employee");

        let tag = db
            .insert("tags", &[("id", 5_i64.into()), ("label", "red".into())])
            .expect("insert tag");
        assert_eq!(tag, RecordRef::new("tags", 5));
        let err = db
            .insert("tags", &[("label", "blue".into())])
            .expect_err("no rowid to fall back on");
        assert!(err.to_string().contains("explicit id"), "{err:#}");
    }
}
