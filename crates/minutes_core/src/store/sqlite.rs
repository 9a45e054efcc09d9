//! SQLite-backed tabular store.
//!
//! # Responsibility
//! - Persist sheets durably on the local machine.
//! - Mirror the remote store contract: whole-table read, whole-table replace.
//!
//! # Invariants
//! - Headers keep their stored order via `sheet_columns.position`.
//! - Rows keep their stored order via `sheet_rows.row_index`.
//! - `write` is atomic: readers never observe a half-replaced sheet.

use super::{Sheet, SheetRow, StoreError, StoreResult, TabularStore};
use log::debug;
use rusqlite::{params, Connection};

/// Tabular store over a migrated archive connection (see `db::open_db`).
pub struct SqliteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Lists table names that currently hold headers or rows.
    pub fn table_names(&self) -> StoreResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT sheet FROM sheet_columns
             UNION
             SELECT sheet FROM sheet_rows
             ORDER BY sheet ASC;",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

impl TabularStore for SqliteStore<'_> {
    fn read(&self, table: &str) -> StoreResult<Sheet> {
        let mut column_stmt = self.conn.prepare(
            "SELECT name FROM sheet_columns
             WHERE sheet = ?1
             ORDER BY position ASC;",
        )?;
        let columns = column_stmt
            .query_map([table], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut row_stmt = self.conn.prepare(
            "SELECT row_index, payload FROM sheet_rows
             WHERE sheet = ?1
             ORDER BY row_index ASC;",
        )?;
        let mut rows = row_stmt.query([table])?;
        let mut parsed = Vec::new();
        while let Some(row) = rows.next()? {
            let row_index: i64 = row.get(0)?;
            let payload: String = row.get(1)?;
            let cells = serde_json::from_str::<SheetRow>(&payload).map_err(|err| {
                StoreError::InvalidData(format!(
                    "row {row_index} of sheet `{table}` is not a JSON object: {err}"
                ))
            })?;
            parsed.push(cells);
        }

        debug!(
            "event=sheet_read module=store status=ok backend=sqlite columns={} rows={}",
            columns.len(),
            parsed.len()
        );
        Ok(Sheet {
            columns,
            rows: parsed,
        })
    }

    fn write(&self, table: &str, sheet: &Sheet) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM sheet_columns WHERE sheet = ?1;", [table])?;
        tx.execute("DELETE FROM sheet_rows WHERE sheet = ?1;", [table])?;

        for (position, name) in sheet.columns.iter().enumerate() {
            tx.execute(
                "INSERT INTO sheet_columns (sheet, position, name) VALUES (?1, ?2, ?3);",
                params![table, position as i64, name],
            )?;
        }
        for (row_index, row) in sheet.rows.iter().enumerate() {
            let payload = serde_json::to_string(row).map_err(|err| {
                StoreError::InvalidData(format!("row {row_index} cannot be encoded: {err}"))
            })?;
            tx.execute(
                "INSERT INTO sheet_rows (sheet, row_index, payload) VALUES (?1, ?2, ?3);",
                params![table, row_index as i64, payload],
            )?;
        }
        tx.commit()?;

        debug!(
            "event=sheet_write module=store status=ok backend=sqlite columns={} rows={}",
            sheet.columns.len(),
            sheet.rows.len()
        );
        Ok(())
    }
}
