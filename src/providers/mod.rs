pub mod error;
pub mod jira;
pub mod tempo;
pub mod unit4;

use anyhow::Result;
use async_trait::async_trait;

use crate::model::entry::DestinationEntry;
use crate::model::week::DateRange;
use crate::model::worklog::{Issue, Worklog};

/// Where worklogs come from.
#[async_trait]
pub trait WorklogSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_worklogs(&self, range: &DateRange) -> Result<Vec<Worklog>>;
}

/// Issue lookup by key or numeric id. `Ok(None)` when the issue does not exist.
#[async_trait]
pub trait IssueDirectory: Send + Sync {
    async fn issue(&self, key: &str) -> Result<Option<Issue>>;
}

/// The Unit4 timesheet, or anything that behaves like it.
///
/// Entries are addressed by their worklog marker, so `delete_entry` only
/// accepts entries that carry one.
#[async_trait]
pub trait TimesheetDestination: Send {
    async fn login(&mut self) -> Result<()>;
    async fn list_entries(&mut self, range: &DateRange) -> Result<Vec<DestinationEntry>>;
    async fn delete_entry(&mut self, entry: &DestinationEntry) -> Result<()>;
    async fn create_entry(&mut self, entry: &DestinationEntry) -> Result<()>;
    /// Persist pending changes. Nothing is committed in Unit4 before this.
    async fn save(&mut self) -> Result<()> {
        Ok(())
    }
}
