//! Roll-call text composition.
//!
//! # Invariants
//! - Absent members are listed in roster order.
//! - A justified absence without a reason renders as `(Justificado)`.

use std::collections::BTreeMap;

/// Text used when every member is present.
pub const NO_ABSENCES_TEXT: &str = "Não houve.";

/// Members of `roster` missing from `present`, in roster order.
pub fn absent_members<'r>(roster: &'r [String], present: &[String]) -> Vec<&'r str> {
    roster
        .iter()
        .filter(|member| !present.contains(member))
        .map(String::as_str)
        .collect()
}

/// Builds the absence sentence fragment.
///
/// `justifications` maps a member to the reason typed for them; an entry
/// with an empty reason still counts as justified.
pub fn compose_absences(
    roster: &[String],
    present: &[String],
    justifications: &BTreeMap<String, String>,
) -> String {
    let absent = absent_members(roster, present);
    if absent.is_empty() {
        return NO_ABSENCES_TEXT.to_string();
    }

    absent
        .into_iter()
        .map(|member| match justifications.get(member) {
            Some(reason) if !reason.trim().is_empty() => format!("{member} ({})", reason.trim()),
            Some(_) => format!("{member} (Justificado)"),
            None => member.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Joins one-visitor-per-line input into a comma list.
pub fn join_visitor_lines(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
