//! Form defaults derived from Config settings.

use crate::config::{
    ConfigSnapshot, MEETING_CITY_KEY, MEETING_PLACE_KEY, MEETING_TIME_KEY, MEETING_WEEKDAY_KEY,
};
use chrono::{Datelike, Days, NaiveDate, NaiveTime};

pub const DEFAULT_MEETING_TIME: &str = "20:00";
pub const DEFAULT_MEETING_PLACE: &str = "Sede da Conferência";
pub const DEFAULT_MEETING_CITY: &str = "Belo Horizonte - MG";

/// Pre-filled values for a new minutes form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingDefaults {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub place: String,
    pub city: String,
}

impl MeetingDefaults {
    /// Reads meeting settings, falling back to fixed defaults when absent or invalid.
    pub fn from_config(config: &ConfigSnapshot, today: NaiveDate) -> Self {
        let weekday = config
            .get(MEETING_WEEKDAY_KEY, "")
            .trim()
            .parse::<u32>()
            .ok();
        let start_time = NaiveTime::parse_from_str(
            config.get(MEETING_TIME_KEY, DEFAULT_MEETING_TIME).trim(),
            "%H:%M",
        )
        .unwrap_or_else(|_| NaiveTime::from_hms_opt(20, 0, 0).unwrap_or_default());

        Self {
            date: next_meeting_date(today, weekday),
            start_time,
            place: config
                .get(MEETING_PLACE_KEY, DEFAULT_MEETING_PLACE)
                .to_string(),
            city: config.get(MEETING_CITY_KEY, DEFAULT_MEETING_CITY).to_string(),
        }
    }
}

/// Next date falling on `weekday` (0 = Monday), today included.
///
/// Missing or out-of-range weekdays fall back to `today`.
pub fn next_meeting_date(today: NaiveDate, weekday: Option<u32>) -> NaiveDate {
    let Some(target) = weekday.filter(|day| *day < 7) else {
        return today;
    };
    let current = today.weekday().num_days_from_monday();
    let ahead = (target + 7 - current) % 7;
    today
        .checked_add_days(Days::new(u64::from(ahead)))
        .unwrap_or(today)
}
