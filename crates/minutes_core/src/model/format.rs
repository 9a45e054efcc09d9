//! Brazilian display formats for dates and money.

use chrono::NaiveDate;

/// Formats a date as `dd/mm/YYYY`.
pub fn format_date_br(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Reformats ISO `YYYY-MM-DD` text as `dd/mm/YYYY`; other text is returned trimmed.
pub fn reformat_date_text_br(raw: &str) -> String {
    let trimmed = raw.trim();
    match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        Ok(date) => format_date_br(date),
        Err(_) => trimmed.to_string(),
    }
}

/// Formats an amount as `R$ 1.234,56`. Non-finite input renders as zero.
pub fn format_brl(amount: f64) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("R$ {sign}{grouped},{fraction:02}")
}

#[cfg(test)]
mod tests {
    use super::{format_brl, format_date_br, reformat_date_text_br};
    use chrono::NaiveDate;

    #[test]
    fn brl_groups_thousands_and_uses_decimal_comma() {
        assert_eq!(format_brl(0.0), "R$ 0,00");
        assert_eq!(format_brl(12.5), "R$ 12,50");
        assert_eq!(format_brl(1234.567), "R$ 1.234,57");
        assert_eq!(format_brl(1_000_000.0), "R$ 1.000.000,00");
        assert_eq!(format_brl(-42.1), "R$ -42,10");
        assert_eq!(format_brl(f64::NAN), "R$ 0,00");
    }

    #[test]
    fn dates_render_day_first() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(format_date_br(date), "07/03/2024");
        assert_eq!(reformat_date_text_br("2019-12-01"), "01/12/2019");
        assert_eq!(reformat_date_text_br(" março de 1990 "), "março de 1990");
    }
}
