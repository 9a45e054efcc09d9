//! Sheet names and headers used by the archive.
//!
//! Defaults match the chapter workbook: `Config`, `Membros`, `Anos` and
//! `Historico` tabs with Portuguese headers.

/// Default identifier header aliases, tried in order.
pub const DEFAULT_IDENTIFIER_ALIASES: &[&str] = &["numero", "num", "nº", "n°"];

/// Header written when the history table has no columns yet.
pub const DEFAULT_IDENTIFIER_HEADER: &str = "Numero";

/// List-style tables managed by `RosterStore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RosterKind {
    /// Chapter members (`Membros`/`Nome`).
    Members,
    /// Thematic years (`Anos`/`Ano`).
    Years,
}

impl RosterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Members => "members",
            Self::Years => "years",
        }
    }
}

/// Table and header names for every sheet the archive touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    pub config_table: String,
    pub config_key_column: String,
    pub config_value_column: String,
    pub members_table: String,
    pub members_column: String,
    pub years_table: String,
    pub years_column: String,
    pub history_table: String,
    /// Ordered aliases accepted for the history identifier header.
    pub identifier_aliases: Vec<String>,
    pub identifier_header: String,
    pub balance_column: String,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            config_table: "Config".to_string(),
            config_key_column: "Chave".to_string(),
            config_value_column: "Valor".to_string(),
            members_table: "Membros".to_string(),
            members_column: "Nome".to_string(),
            years_table: "Anos".to_string(),
            years_column: "Ano".to_string(),
            history_table: "Historico".to_string(),
            identifier_aliases: DEFAULT_IDENTIFIER_ALIASES
                .iter()
                .map(|alias| alias.to_string())
                .collect(),
            identifier_header: DEFAULT_IDENTIFIER_HEADER.to_string(),
            balance_column: "Saldo".to_string(),
        }
    }
}

impl SheetLayout {
    /// Returns `(table, column)` for one roster list.
    pub fn roster(&self, kind: RosterKind) -> (&str, &str) {
        match kind {
            RosterKind::Members => (&self.members_table, &self.members_column),
            RosterKind::Years => (&self.years_table, &self.years_column),
        }
    }
}
