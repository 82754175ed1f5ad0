use std::fmt;

use crate::model::entry::DestinationEntry;
use crate::model::week::{DateRange, IsoWeek};
use crate::model::worklog::{Account, Worklog};

/// Why a worklog could not be turned into an entry.
#[derive(Debug, Clone, PartialEq)]
pub enum UnresolvedReason {
    IssueNotFound,
    /// Jira refused this one issue, e.g. with a 403.
    IssueUnreadable(String),
    NoAccount,
    Unmapped(Account),
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::IssueNotFound => f.write_str("issue not found in Jira"),
            UnresolvedReason::IssueUnreadable(error) => write!(f, "issue not readable ({error})"),
            UnresolvedReason::NoAccount => f.write_str("issue has no Tempo account"),
            UnresolvedReason::Unmapped(account) => {
                write!(f, "no mapping for account {} ({})", account.id, account.name)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedWorklog {
    pub worklog: Worklog,
    /// Jira key when the issue was found, else the raw Tempo reference.
    pub ticket: String,
    pub reason: UnresolvedReason,
}

/// What a sync run would change in one week.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncPlan {
    pub week: IsoWeek,
    pub range: DateRange,
    pub fetched: usize,
    /// Synced entries currently in the range; all of them are replaced.
    pub deletions: Vec<DestinationEntry>,
    pub insertions: Vec<DestinationEntry>,
    pub unresolved: Vec<UnresolvedWorklog>,
}

impl SyncPlan {
    pub fn total_hours(&self) -> f64 {
        self.insertions.iter().map(|e| e.hours).sum()
    }

    /// True when applying the plan would leave the timesheet as it is.
    pub fn is_noop(&self) -> bool {
        let mut before: Vec<_> = self.deletions.iter().map(DestinationEntry::identity).collect();
        let mut after: Vec<_> = self.insertions.iter().map(DestinationEntry::identity).collect();
        before.sort();
        after.sort();
        before == after
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryAction {
    Delete,
    Create,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryFailure {
    pub action: EntryAction,
    pub entry: DestinationEntry,
    pub error: String,
}

/// Outcome of applying a plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Execution {
    pub deleted: usize,
    pub created: usize,
    pub failures: Vec<EntryFailure>,
    pub save_error: Option<String>,
}

impl Execution {
    pub fn failed(&self, action: EntryAction) -> usize {
        self.failures.iter().filter(|f| f.action == action).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub plan: SyncPlan,
    /// `None` for a dry run.
    pub execution: Option<Execution>,
}

impl SyncReport {
    pub fn is_dry_run(&self) -> bool {
        self.execution.is_none()
    }

    pub fn has_failures(&self) -> bool {
        self.execution
            .as_ref()
            .is_some_and(|e| !e.failures.is_empty() || e.save_error.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::tests::{date, entry};

    fn plan(deletions: Vec<DestinationEntry>, insertions: Vec<DestinationEntry>) -> SyncPlan {
        let week: IsoWeek = "202606".parse().unwrap();
        SyncPlan {
            week,
            range: week.range(),
            fetched: insertions.len(),
            deletions,
            insertions,
            unresolved: vec![],
        }
    }

    #[test]
    fn same_entries_in_any_order_is_noop() {
        let a = entry(date(2026, 2, 2), "1234-56789-001", "ACME-1", "[WL:1] a", 1.0);
        let b = entry(date(2026, 2, 3), "1234-56789-001", "ACME-2", "[WL:2] b", 2.5);
        let p = plan(vec![a.clone(), b.clone()], vec![b, a]);
        assert!(p.is_noop());
        assert_eq!(p.total_hours(), 3.5);
    }

    #[test]
    fn changed_hours_is_not_noop() {
        let a = entry(date(2026, 2, 2), "1234-56789-001", "ACME-1", "[WL:1] a", 1.0);
        let mut changed = a.clone();
        changed.hours = 1.5;
        assert!(!plan(vec![a], vec![changed]).is_noop());
    }

    #[test]
    fn failures_only_count_when_executed() {
        let p = plan(vec![], vec![]);
        let dry = SyncReport {
            plan: p.clone(),
            execution: None,
        };
        assert!(dry.is_dry_run());
        assert!(!dry.has_failures());

        let failed = SyncReport {
            plan: p,
            execution: Some(Execution {
                save_error: Some("Save button not found".into()),
                ..Default::default()
            }),
        };
        assert!(failed.has_failures());
    }

    #[test]
    fn unresolved_reason_names_the_account() {
        let reason = UnresolvedReason::Unmapped(Account {
            id: "42".into(),
            name: "ACME - DevOps".into(),
        });
        assert_eq!(reason.to_string(), "no mapping for account 42 (ACME - DevOps)");
    }
}
