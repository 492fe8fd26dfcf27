use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

// ============================================================================
// SEASON DERIVATION
// ============================================================================
//
// The registry groups a fall tournament with the following spring's season
// (the college series runs fall through spring). August-December events
// therefore belong to calendar year + 1.

fn year_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(20\d{2})\b").unwrap())
}

/// Infers the 4-digit season year for a tournament.
///
/// Precedence: a "20xx" token embedded in the name, then the start date's
/// month rule (Jan-Jul -> same year, Aug-Dec -> next year), then today's date
/// under the same rule. Always returns a year; bad input degrades to the
/// current season rather than failing.
pub fn derive_season(name: &str, start_date: Option<&str>) -> i32 {
    if let Some(year) = year_from_name(name) {
        return year;
    }

    if let Some(date) = start_date.and_then(parse_date) {
        return season_for_date(date);
    }

    season_for_date(Local::now().date_naive())
}

fn year_from_name(name: &str) -> Option<i32> {
    year_token_re()
        .captures(name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn season_for_date(date: NaiveDate) -> i32 {
    if date.month() <= 7 {
        date.year()
    } else {
        date.year() + 1
    }
}

/// Accepts the date shapes the registry renders: ISO and US slash format,
/// with or without a time suffix.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.split_whitespace().next().unwrap_or(raw);

    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%m/%d/%Y"))
        .ok()
}

// ============================================================================
// TESTS
// ============================================================================
