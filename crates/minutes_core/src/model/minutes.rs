//! Minutes record and its projections.
//!
//! # Responsibility
//! - Hold the fields collected by the minutes form.
//! - Project the record onto history columns and onto the flat field map
//!   consumed by document templating.
//!
//! # Invariants
//! - History column names are fixed; reconciliation matches them tolerantly.
//! - The weekly tithe is a document field only and is not archived.

use crate::config::{
    ConfigSnapshot, AGGREGATION_DATE_KEY, CENTRAL_COUNCIL_KEY, CONFERENCE_NAME_KEY,
    FOUNDATION_DATE_KEY, PARTICULAR_COUNCIL_KEY,
};
use crate::model::format::{format_brl, format_date_br, reformat_date_text_br};
use crate::reconcile::{normalize_identifier, RecordDraft};
use crate::store::CellValue;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const COLUMN_DATE: &str = "Data";
pub const COLUMN_PRESIDENT: &str = "Presidente";
pub const COLUMN_SECRETARY: &str = "Secretario";
pub const COLUMN_READING: &str = "Leitura";
pub const COLUMN_PRESENT: &str = "Presentes";
pub const COLUMN_ABSENCES: &str = "Ausencias";
pub const COLUMN_VISITORS: &str = "Visitantes";
pub const COLUMN_INCOME: &str = "Receita";
pub const COLUMN_EXPENSE: &str = "Despesa";
pub const COLUMN_BALANCE: &str = "Saldo";
pub const COLUMN_SOCIOECONOMIC: &str = "Socioeconomico";
pub const COLUMN_NEWS: &str = "Noticias";
pub const COLUMN_FREE_WORD: &str = "Palavra_Franca";

/// Data collected for one meeting's minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinutesRecord {
    /// Minutes number as entered; normalized when matched.
    pub number: String,
    pub meeting_date: NaiveDate,
    pub president: String,
    pub secretary: String,
    pub reading_source: String,
    /// Present members in roll-call order.
    pub present: Vec<String>,
    /// Composed absence text (see `compose_absences`).
    pub absences: String,
    /// Comma-joined visitor names; empty when there were none.
    pub visitors: String,
    pub income: f64,
    pub expense: f64,
    pub weekly_tithe: f64,
    pub balance: f64,
    pub socioeconomic: String,
    pub news: String,
    pub free_word: String,
}

impl MinutesRecord {
    /// Minutes number as an integer, when it is one.
    pub fn numeric_number(&self) -> Option<i64> {
        normalize_identifier(&self.number).parse::<i64>().ok()
    }

    /// Projects the record onto history columns.
    pub fn to_draft(&self, identifier_header: &str) -> RecordDraft {
        RecordDraft::new(self.number.clone(), identifier_header)
            .field(COLUMN_DATE, format_date_br(self.meeting_date))
            .field(COLUMN_PRESIDENT, self.president.as_str())
            .field(COLUMN_SECRETARY, self.secretary.as_str())
            .field(COLUMN_READING, self.reading_source.as_str())
            .field(COLUMN_PRESENT, self.present.join(", "))
            .field(COLUMN_ABSENCES, self.absences.as_str())
            .field(COLUMN_VISITORS, self.visitors.as_str())
            .field(COLUMN_INCOME, CellValue::Number(self.income))
            .field(COLUMN_EXPENSE, CellValue::Number(self.expense))
            .field(COLUMN_BALANCE, CellValue::Number(self.balance))
            .field(COLUMN_SOCIOECONOMIC, self.socioeconomic.as_str())
            .field(COLUMN_NEWS, self.news.as_str())
            .field(COLUMN_FREE_WORD, self.free_word.as_str())
    }

    /// Flat field map for document templates, merged with chapter settings.
    pub fn document_fields(&self, config: &ConfigSnapshot) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();
        let mut put = |name: &str, value: String| {
            fields.insert(name.to_string(), value);
        };

        put("num_ata", normalize_identifier(&self.number));
        put("conf_nome", config.get(CONFERENCE_NAME_KEY, "").to_string());
        put(
            "cons_particular",
            config.get(PARTICULAR_COUNCIL_KEY, "").to_string(),
        );
        put("cons_central", config.get(CENTRAL_COUNCIL_KEY, "").to_string());
        put(
            "data_fundacao",
            reformat_date_text_br(config.get(FOUNDATION_DATE_KEY, "")),
        );
        put(
            "data_agregacao",
            reformat_date_text_br(config.get(AGGREGATION_DATE_KEY, "")),
        );
        put("data_reuniao", format_date_br(self.meeting_date));
        put("pres_nome", self.president.clone());
        put("secretario_nome", self.secretary.clone());
        put("leitura_fonte", self.reading_source.clone());
        put("lista_presentes_txt", self.present.join(", "));
        put("ausencias", self.absences.clone());
        put("lista_visitantes_txt", self.visitors.clone());
        put("receita", format_brl(self.income));
        put("despesa", format_brl(self.expense));
        put("decima", format_brl(self.weekly_tithe));
        put("saldo", format_brl(self.balance));
        put("socioeconomico", self.socioeconomic.clone());
        put("noticias_trabalhos", self.news.clone());
        put("palavra_franca", self.free_word.clone());
        fields
    }

    /// Short plain-text summary for sharing in chat apps.
    pub fn share_summary(&self) -> String {
        format!(
            "*Ata nº {} - SSVP*\n{}\nColeta: {}\nAusências: {}",
            normalize_identifier(&self.number),
            format_date_br(self.meeting_date),
            format_brl(self.income),
            self.absences
        )
    }
}
