use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A time entry logged in Tempo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worklog {
    pub id: u64,
    pub date: NaiveDate,
    pub hours: f64,
    /// Issue reference as reported by Tempo: a Jira key, or a numeric issue id.
    pub issue_key: String,
    #[serde(default)]
    pub description: String,
}

/// A Tempo account (billing grouping) attached to a Jira issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub key: String,
    #[serde(default)]
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<Account>,
}
