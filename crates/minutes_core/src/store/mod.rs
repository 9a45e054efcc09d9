//! Tabular store contract shared by every persistence backend.
//!
//! # Responsibility
//! - Define the sheet-shaped data exchanged with the remote store.
//! - Classify store failures into transient (quota) and fatal errors.
//!
//! # Invariants
//! - `write` replaces a table wholesale; there is no partial update primitive.
//! - Reading a table that was never written yields an empty `Sheet`.
//! - Quota failures are recognized by message signal, not only by variant,
//!   because remote backends report them as opaque text.

use crate::db::DbError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod quota;
pub mod sqlite;

pub use memory::MemoryStore;
pub use quota::QuotaLimitedStore;
pub use sqlite::SqliteStore;

static QUOTA_SIGNAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b429\b|quota exceeded|rate[ _-]?limit|resource[ _]exhausted")
        .expect("valid quota signal regex")
});

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure taxonomy for tabular store access.
#[derive(Debug)]
pub enum StoreError {
    /// Request rejected by the backend quota; retryable.
    Quota(String),
    /// Transport or authentication failure; fatal.
    Connection(String),
    /// Table layout does not match what the caller needs; fatal.
    Schema(String),
    /// Persisted or submitted data cannot be interpreted.
    InvalidData(String),
    /// Local SQLite backend failure.
    Db(DbError),
    /// Transient failures persisted through every retry attempt.
    Overloaded { attempts: u32, last_error: String },
}

impl StoreError {
    /// Returns whether the failure signals temporary rate limiting.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Quota(_) => true,
            Self::Overloaded { .. } => false,
            other => QUOTA_SIGNAL_RE.is_match(&other.to_string()),
        }
    }

    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Quota(_) => "quota_exceeded",
            Self::Connection(_) => "connection_failed",
            Self::Schema(_) => "schema_mismatch",
            Self::InvalidData(_) => "invalid_data",
            Self::Db(_) => "db_error",
            Self::Overloaded { .. } => "service_overloaded",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Quota(message) => write!(f, "quota exceeded: {message}"),
            Self::Connection(message) => write!(f, "connection failed: {message}"),
            Self::Schema(message) => write!(f, "schema mismatch: {message}"),
            Self::InvalidData(message) => write!(f, "invalid data: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Overloaded {
                attempts,
                last_error,
            } => write!(
                f,
                "service overloaded after {attempts} attempts; last error: {last_error}"
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One spreadsheet cell as observed through the store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl CellValue {
    /// Coerces the cell to its display string. Empty cells become `""`.
    pub fn as_text(&self) -> String {
        match self {
            Self::Number(value) => value.to_string(),
            Self::Text(value) => value.clone(),
            Self::Empty => String::new(),
        }
    }

    /// Reads the cell as a number, accepting numeric text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(value) => value.trim().parse::<f64>().ok(),
            Self::Empty => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Self::Number(value) => value.is_nan(),
            Self::Text(value) => value.trim().is_empty(),
            Self::Empty => true,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

/// One row keyed by column header.
pub type SheetRow = BTreeMap<String, CellValue>;

/// Whole-table snapshot exchanged with a `TabularStore`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    /// Ordered headers. Row keys are expected to be a subset.
    pub columns: Vec<String>,
    pub rows: Vec<SheetRow>,
}

impl Sheet {
    pub fn new<I, C>(columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row given as `(header, value)` pairs; unknown headers become columns.
    pub fn with_row<I, K, V>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<CellValue>,
    {
        let mut row = SheetRow::new();
        for (header, value) in cells {
            let header: String = header.into();
            let header = self.ensure_column(&header);
            row.insert(header, value.into());
        }
        self.rows.push(row);
        self
    }

    /// Returns true when the table has neither headers nor rows.
    pub fn is_blank(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    /// Finds the stored header matching `name` after folding case and accents.
    pub fn find_column(&self, name: &str) -> Option<&str> {
        let wanted = fold_header(name);
        self.columns
            .iter()
            .find(|column| fold_header(column) == wanted)
            .map(String::as_str)
    }

    /// Returns the stored header for `name`, appending it when absent.
    pub fn ensure_column(&mut self, name: &str) -> String {
        if let Some(existing) = self.find_column(name) {
            return existing.to_string();
        }
        self.columns.push(name.to_string());
        name.to_string()
    }

    /// Iterates the values of one column; missing cells read as `Empty`.
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a CellValue> + 'a {
        static EMPTY: CellValue = CellValue::Empty;
        self.rows
            .iter()
            .map(move |row| row.get(column).unwrap_or(&EMPTY))
    }
}

/// Folds a header for tolerant comparison.
///
/// Lowercases, strips Portuguese diacritics and drops separators, so
/// `"Número"`, `"numero"` and `"NUMERO "` compare equal.
pub fn fold_header(value: &str) -> String {
    value
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|ch| !ch.is_whitespace() && !matches!(ch, '_' | '-' | '.'))
        .map(|ch| match ch {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Whole-table read/write access to a remote or local tabular backend.
pub trait TabularStore {
    /// Reads the full contents of `table`.
    fn read(&self, table: &str) -> StoreResult<Sheet>;
    /// Replaces the full contents of `table`.
    fn write(&self, table: &str, sheet: &Sheet) -> StoreResult<()>;
}

impl<T: TabularStore + ?Sized> TabularStore for &T {
    fn read(&self, table: &str) -> StoreResult<Sheet> {
        (**self).read(table)
    }

    fn write(&self, table: &str, sheet: &Sheet) -> StoreResult<()> {
        (**self).write(table, sheet)
    }
}
