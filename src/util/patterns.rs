use std::sync::LazyLock;

use regex::Regex;

/// Jira ticket key: `ABC-123`.
pub static TICKET_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]{3,10}-\d+)").expect("valid regex"));

/// Unit4 work order (ArbAuft): `1234-56789-001`.
pub static COST_CENTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4}-\d{5}-\d{3})").expect("valid regex"));

/// Day label in the time details grid, German or English: `Mo 3/02`, `Fri 14.11`.
pub static DAY_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(Mo|Di|Mi|Do|Fr|Sa|So|Mon|Tue|Wed|Thu|Fri|Sat|Sun)\s+(\d+)[/.](\d+)")
        .expect("valid regex")
});

/// Hours cell: `0.00`, `8:00`, `7,5`.
pub static NUMERIC_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d:,.]+$").expect("valid regex"));

/// First Jira ticket key found in `text`.
pub fn find_ticket(text: &str) -> Option<&str> {
    TICKET_KEY.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// First cost center code found in `text`.
pub fn find_cost_center(text: &str) -> Option<&str> {
    COST_CENTER.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Day of week index (Monday = 0) for a German or English abbreviation.
pub fn weekday_index(abbrev: &str) -> Option<u32> {
    match abbrev {
        "Mo" | "Mon" => Some(0),
        "Di" | "Tue" => Some(1),
        "Mi" | "Wed" => Some(2),
        "Do" | "Thu" => Some(3),
        "Fr" | "Fri" => Some(4),
        "Sa" | "Sat" => Some(5),
        "So" | "Sun" => Some(6),
        _ => None,
    }
}

/// Parse an hours cell. `8:30` is hours and minutes, `7,5` uses a decimal comma.
pub fn parse_hours(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() || !NUMERIC_CELL.is_match(cell) {
        return None;
    }
    if let Some((h, m)) = cell.split_once(':') {
        let hours: u32 = h.parse().ok()?;
        let minutes: u32 = m.parse().ok()?;
        if minutes >= 60 {
            return None;
        }
        return Some(f64::from(hours) + f64::from(minutes) / 60.0);
    }
    cell.replace(',', ".").parse().ok()
}
