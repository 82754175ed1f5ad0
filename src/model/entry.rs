use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::mapping::CostCenterCode;

/// Every entry this tool writes to Unit4 starts with `[WL:<worklog id>]`.
pub const MARKER_PREFIX: &str = "[WL:";

pub fn marker(worklog_id: u64) -> String {
    format!("{MARKER_PREFIX}{worklog_id}]")
}

/// Worklog id of a text that begins with a marker. Markers elsewhere in the
/// text do not count: only entries that start with one are owned by the sync.
pub fn parse_marker(text: &str) -> Option<u64> {
    let rest = text.strip_prefix(MARKER_PREFIX)?;
    let (digits, _) = rest.split_once(']')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Entry text for a worklog: the marker, then the description cut to `limit` chars.
pub fn entry_text(worklog_id: u64, description: &str, limit: usize) -> String {
    let description: String = description.trim().chars().take(limit).collect();
    let description = description.trim_end();
    if description.is_empty() {
        marker(worklog_id)
    } else {
        format!("{} {description}", marker(worklog_id))
    }
}

/// A row in the Unit4 timesheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationEntry {
    pub date: NaiveDate,
    pub cost_center: CostCenterCode,
    /// Jira ticket the time is booked for (Unit4 "Ticketno").
    pub ticket: String,
    pub text: String,
    pub hours: f64,
}

impl DestinationEntry {
    pub fn worklog_id(&self) -> Option<u64> {
        parse_marker(&self.text)
    }

    /// Whether this entry was written by the sync and may be replaced by it.
    pub fn is_synced(&self) -> bool {
        self.worklog_id().is_some()
    }

    /// Identity used to compare entry sets. Hours are compared to the minute.
    pub fn identity(&self) -> (NaiveDate, &str, &str, &str, i64) {
        (
            self.date,
            self.cost_center.as_str(),
            self.ticket.as_str(),
            self.text.as_str(),
            (self.hours * 60.0).round() as i64,
        )
    }
}
