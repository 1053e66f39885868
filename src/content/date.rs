//! Long-form localized dates for post bylines.

use chrono::{DateTime, Datelike, NaiveDate};

const MONTHS_PT: [&str; 12] = [
    "janeiro", "fevereiro", "março", "abril", "maio", "junho", "julho", "agosto", "setembro",
    "outubro", "novembro", "dezembro",
];
const MONTHS_EN: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];
const MONTHS_ES: [&str; 12] = [
    "enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto", "septiembre",
    "octubre", "noviembre", "diciembre",
];

/// Parse `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// `2024-03-15` → `15 de março de 2024` / `March 15, 2024` / `15 de marzo de 2024`.
///
/// Unknown locales get the ISO date; unparseable input comes back as given.
pub fn format_date(raw: &str, locale: &str) -> String {
    let Some(date) = parse_date(raw) else {
        return raw.to_string();
    };
    let month = date.month0() as usize;
    let (day, year) = (date.day(), date.year());
    match locale {
        "pt" => format!("{day} de {} de {year}", MONTHS_PT[month]),
        "es" => format!("{day} de {} de {year}", MONTHS_ES[month]),
        "en" => format!("{} {day}, {year}", MONTHS_EN[month]),
        _ => date.format("%Y-%m-%d").to_string(),
    }
}
