use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

use super::report::{EntryAction, EntryFailure, Execution, SyncPlan, SyncReport, UnresolvedReason, UnresolvedWorklog};
use super::resolver::{AccountResolver, ResolutionRequest};
use crate::mapping::store::MappingStore;
use crate::model::entry::{entry_text, DestinationEntry};
use crate::model::week::{DateRange, IsoWeek};
use crate::model::worklog::{Issue, Worklog};
use crate::providers::error::is_per_item;
use crate::providers::{IssueDirectory, TimesheetDestination, WorklogSource};

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub execute: bool,
    pub cutover: Option<NaiveDate>,
    pub description_limit: usize,
    /// Re-scans after deleting, each one deleting whatever survived.
    pub delete_passes: u32,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            execute: false,
            cutover: None,
            description_limit: 60,
            delete_passes: 3,
        }
    }
}

enum Resolution {
    Entry(DestinationEntry),
    Unresolved(UnresolvedWorklog),
}

#[derive(Clone)]
enum Lookup {
    Found(Issue),
    Missing,
    Unreadable(String),
}

/// Replaces the synced entries of a week with entries built from the source.
pub struct Reconciler<'a> {
    source: &'a dyn WorklogSource,
    issues: &'a dyn IssueDirectory,
    destination: &'a mut dyn TimesheetDestination,
    store: &'a mut MappingStore,
    resolver: &'a mut dyn AccountResolver,
    issue_cache: HashMap<String, Lookup>,
    declined: HashSet<String>,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        source: &'a dyn WorklogSource,
        issues: &'a dyn IssueDirectory,
        destination: &'a mut dyn TimesheetDestination,
        store: &'a mut MappingStore,
        resolver: &'a mut dyn AccountResolver,
    ) -> Self {
        Self {
            source,
            issues,
            destination,
            store,
            resolver,
            issue_cache: HashMap::new(),
            declined: HashSet::new(),
        }
    }

    pub async fn sync(&mut self, week: IsoWeek, options: &SyncOptions) -> Result<SyncReport> {
        let plan = self.plan(week, options).await?;
        if !options.execute {
            return Ok(SyncReport {
                plan,
                execution: None,
            });
        }
        let execution = self.apply(&plan, options).await;
        Ok(SyncReport {
            plan,
            execution: Some(execution),
        })
    }

    /// Everything up to the first mutation. Any error here aborts the run.
    pub async fn plan(&mut self, week: IsoWeek, options: &SyncOptions) -> Result<SyncPlan> {
        let range = match options.cutover {
            Some(cutover) => week.range().starting_at(cutover, week)?,
            None => week.range(),
        };

        let mut worklogs: Vec<Worklog> = self
            .source
            .fetch_worklogs(&range)
            .await
            .with_context(|| format!("Fetching {} worklogs for {range} failed", self.source.name()))?
            .into_iter()
            .filter(|w| range.contains(w.date))
            .collect();
        worklogs.sort_by_key(|w| (w.date, w.id));
        tracing::info!(%week, count = worklogs.len(), "fetched worklogs");

        let mut insertions = Vec::new();
        let mut unresolved = Vec::new();
        for worklog in &worklogs {
            match self.resolve(worklog, options.description_limit).await? {
                Resolution::Entry(entry) => insertions.push(entry),
                Resolution::Unresolved(miss) => {
                    tracing::info!(worklog = miss.worklog.id, reason = %miss.reason, "worklog unresolved");
                    unresolved.push(miss);
                }
            }
        }

        self.destination.login().await.context("Unit4 login failed")?;
        let deletions = self.synced_entries(&range).await?;

        Ok(SyncPlan {
            week,
            range,
            fetched: worklogs.len(),
            deletions,
            insertions,
            unresolved,
        })
    }

    async fn issue(&mut self, key: &str) -> Result<Lookup> {
        if let Some(hit) = self.issue_cache.get(key) {
            return Ok(hit.clone());
        }
        let lookup = match self.issues.issue(key).await {
            Ok(Some(issue)) => Lookup::Found(issue),
            Ok(None) => Lookup::Missing,
            Err(e) if is_per_item(&e) => {
                tracing::warn!(key, error = %e, "issue not readable");
                Lookup::Unreadable(e.to_string())
            }
            Err(e) => return Err(e.context(format!("Looking up issue {key} failed"))),
        };
        self.issue_cache.insert(key.to_string(), lookup.clone());
        Ok(lookup)
    }

    async fn resolve(&mut self, worklog: &Worklog, description_limit: usize) -> Result<Resolution> {
        let unresolved = |ticket: &str, reason| {
            Resolution::Unresolved(UnresolvedWorklog {
                worklog: worklog.clone(),
                ticket: ticket.to_string(),
                reason,
            })
        };

        let lookup = match worklog.issue_key.as_str() {
            "" => Lookup::Missing,
            key => self.issue(key).await?,
        };
        let issue = match lookup {
            Lookup::Found(issue) => issue,
            Lookup::Missing => return Ok(unresolved(&worklog.issue_key, UnresolvedReason::IssueNotFound)),
            Lookup::Unreadable(error) => {
                return Ok(unresolved(&worklog.issue_key, UnresolvedReason::IssueUnreadable(error)));
            }
        };
        let Some(account) = issue.account.clone() else {
            return Ok(unresolved(&issue.key, UnresolvedReason::NoAccount));
        };

        let code = match self.store.lookup(&account.id) {
            Some(code) => Some(code.clone()),
            None if self.declined.contains(&account.id) => None,
            None => {
                let answer = self
                    .resolver
                    .resolve(&ResolutionRequest {
                        account: &account,
                        issue: &issue,
                        worklog,
                    })
                    .await?;
                match &answer {
                    Some(code) => {
                        self.store
                            .upsert(&account.id, code.clone(), &account.name, Some(issue.key.as_str()));
                        self.store.save().context("Saving the mapping file failed")?;
                        tracing::info!(account = %account.id, %code, "added mapping");
                    }
                    None => {
                        self.declined.insert(account.id.clone());
                    }
                }
                answer
            }
        };

        Ok(match code {
            Some(cost_center) => Resolution::Entry(DestinationEntry {
                date: worklog.date,
                cost_center,
                ticket: issue.key.clone(),
                text: entry_text(worklog.id, &worklog.description, description_limit),
                hours: worklog.hours,
            }),
            None => unresolved(&issue.key, UnresolvedReason::Unmapped(account)),
        })
    }

    /// Entries in `range` that carry a worklog marker. Nothing else is ever touched.
    async fn synced_entries(&mut self, range: &DateRange) -> Result<Vec<DestinationEntry>> {
        let entries = self
            .destination
            .list_entries(range)
            .await
            .with_context(|| format!("Reading Unit4 entries for {range} failed"))?;
        let total = entries.len();
        let synced: Vec<DestinationEntry> = entries
            .into_iter()
            .filter(|e| e.is_synced() && range.contains(e.date))
            .collect();
        tracing::info!(total, synced = synced.len(), "scanned Unit4 entries");
        Ok(synced)
    }

    /// Delete, verify, create, save. Failures are recorded, never raised.
    async fn apply(&mut self, plan: &SyncPlan, options: &SyncOptions) -> Execution {
        let mut execution = Execution::default();
        let mut last_error: HashMap<Option<u64>, String> = HashMap::new();
        let mut remaining = plan.deletions.clone();

        for pass in 0..=options.delete_passes {
            if remaining.is_empty() {
                break;
            }
            if pass > 0 {
                tracing::info!(pass, remaining = remaining.len(), "deleting surviving entries");
            }
            let mut failed = Vec::new();
            for entry in &remaining {
                match self.destination.delete_entry(entry).await {
                    Ok(()) => {
                        tracing::info!(worklog = ?entry.worklog_id(), date = %entry.date, "deleted entry");
                        last_error.remove(&entry.worklog_id());
                    }
                    Err(e) => {
                        tracing::warn!(worklog = ?entry.worklog_id(), error = %e, "delete failed");
                        last_error.insert(entry.worklog_id(), format!("{e:#}"));
                        failed.push(entry.clone());
                    }
                }
            }
            match self.synced_entries(&plan.range).await {
                Ok(entries) => remaining = entries,
                Err(e) => {
                    tracing::warn!(error = %e, "could not verify deletions");
                    remaining = failed;
                    break;
                }
            }
        }

        execution.deleted = plan.deletions.len().saturating_sub(remaining.len());
        for entry in remaining {
            let error = last_error
                .get(&entry.worklog_id())
                .cloned()
                .unwrap_or_else(|| format!("still present after {} delete passes", options.delete_passes + 1));
            execution.failures.push(EntryFailure {
                action: EntryAction::Delete,
                entry,
                error,
            });
        }

        for entry in &plan.insertions {
            match self.destination.create_entry(entry).await {
                Ok(()) => {
                    tracing::info!(worklog = ?entry.worklog_id(), date = %entry.date, hours = entry.hours, "created entry");
                    execution.created += 1;
                }
                Err(e) => {
                    tracing::warn!(worklog = ?entry.worklog_id(), error = %e, "create failed");
                    execution.failures.push(EntryFailure {
                        action: EntryAction::Create,
                        entry: entry.clone(),
                        error: format!("{e:#}"),
                    });
                }
            }
        }

        if let Err(e) = self.destination.save().await {
            tracing::warn!(error = %e, "saving the timesheet failed");
            execution.save_error = Some(format!("{e:#}"));
        }
        execution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entry::parse_marker;
    use crate::providers::tests::{code, date, entry, issue, worklog, FakeIssues, FakeSource, FakeTimesheet};
    use crate::sync::resolver::{DeferringResolver, PromptResolver};
    use std::io::Cursor;

    fn week() -> IsoWeek {
        "202606".parse().unwrap()
    }

    fn store(dir: &tempfile::TempDir) -> MappingStore {
        let mut store = MappingStore::load(dir.path().join("mapping.json")).unwrap();
        store.upsert("42", code("1234-56789-001"), "ACME - Konzept", Some("ACME-1234"));
        store
    }

    fn execute() -> SyncOptions {
        SyncOptions {
            execute: true,
            ..Default::default()
        }
    }

    fn acme_issues() -> FakeIssues {
        FakeIssues::new(vec![
            issue("ACME-1234", Some(("42", "ACME - Konzept"))),
            issue("ACME-77", Some(("42", "ACME - Konzept"))),
            issue("OPS-5", Some(("77", "Operations"))),
            issue("MISC-1", None),
        ])
    }

    fn manual() -> DestinationEntry {
        entry(date(2026, 2, 3), "9999-00000-001", "ACME-77", "Meeting with customer", 1.0)
    }

    async fn run(
        source: &FakeSource,
        issues: &FakeIssues,
        sheet: &mut FakeTimesheet,
        store: &mut MappingStore,
        options: &SyncOptions,
    ) -> Result<SyncReport> {
        let mut resolver = DeferringResolver;
        Reconciler::new(source, issues, sheet, store, &mut resolver)
            .sync(week(), options)
            .await
    }

    #[tokio::test]
    async fn builds_marked_entry_from_worklog() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);
        let source = FakeSource::new(vec![worklog(1764, date(2026, 2, 2), 3.5, "ACME-1234", "working on concept")]);
        let issues = acme_issues();
        let mut sheet = FakeTimesheet::default();

        let report = run(&source, &issues, &mut sheet, &mut store, &execute()).await.unwrap();

        assert_eq!(
            report.plan.insertions,
            vec![entry(date(2026, 2, 2), "1234-56789-001", "ACME-1234", "[WL:1764] working on concept", 3.5)]
        );
        assert_eq!(sheet.entries, report.plan.insertions);
        assert_eq!(report.execution.unwrap().created, 1);
        assert_eq!(sheet.saves, 1);
    }

    #[tokio::test]
    async fn second_run_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);
        let source = FakeSource::new(vec![
            worklog(1764, date(2026, 2, 2), 3.5, "ACME-1234", "working on concept"),
            worklog(1765, date(2026, 2, 4), 1.25, "ACME-77", ""),
        ]);
        let issues = acme_issues();
        let mut sheet = FakeTimesheet::new(vec![manual()]);

        run(&source, &issues, &mut sheet, &mut store, &execute()).await.unwrap();
        let after_first = sheet.snapshot();
        let second = run(&source, &issues, &mut sheet, &mut store, &execute()).await.unwrap();

        assert!(second.plan.is_noop());
        assert_eq!(sheet.snapshot(), after_first);
        assert_eq!(after_first.len(), 3);
    }

    #[tokio::test]
    async fn entries_without_marker_prefix_are_never_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);
        let embedded = entry(date(2026, 2, 4), "1234-56789-001", "ACME-1", "see [WL:1764] for details", 2.0);
        let stale = entry(date(2026, 2, 5), "1234-56789-001", "ACME-1", "[WL:5] removed in Tempo", 2.0);
        let mut sheet = FakeTimesheet::new(vec![manual(), embedded.clone(), stale]);

        let report = run(&FakeSource::default(), &acme_issues(), &mut sheet, &mut store, &execute())
            .await
            .unwrap();

        assert_eq!(report.plan.deletions.len(), 1);
        assert!(report.plan.deletions.iter().all(|e| parse_marker(&e.text).is_some()));
        assert_eq!(sheet.entries, vec![manual(), embedded]);
    }

    #[tokio::test]
    async fn dry_run_leaves_timesheet_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);
        let source = FakeSource::new(vec![worklog(1764, date(2026, 2, 2), 3.5, "ACME-1234", "new text")]);
        let old = entry(date(2026, 2, 2), "1234-56789-001", "ACME-1234", "[WL:1764] old text", 3.5);
        let mut sheet = FakeTimesheet::new(vec![manual(), old]);
        let before = sheet.snapshot();

        let report = run(&source, &acme_issues(), &mut sheet, &mut store, &SyncOptions::default())
            .await
            .unwrap();

        assert!(report.is_dry_run());
        assert_eq!(report.plan.deletions.len(), 1);
        assert_eq!(report.plan.insertions.len(), 1);
        assert_eq!(sheet.snapshot(), before);
        assert_eq!(sheet.mutations(), 0);
        assert_eq!(sheet.saves, 0);
    }

    #[tokio::test]
    async fn unresolved_worklogs_are_reported_with_reason() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);
        let source = FakeSource::new(vec![
            worklog(1, date(2026, 2, 2), 1.0, "OPS-5", ""),
            worklog(2, date(2026, 2, 2), 1.0, "MISC-1", ""),
            worklog(3, date(2026, 2, 2), 1.0, "GONE-9", ""),
            worklog(4, date(2026, 2, 3), 1.0, "OPS-5", ""),
        ]);
        let mut sheet = FakeTimesheet::default();

        let plan = run(&source, &acme_issues(), &mut sheet, &mut store, &SyncOptions::default())
            .await
            .unwrap()
            .plan;

        let reasons: Vec<(u64, UnresolvedReason)> =
            plan.unresolved.iter().map(|u| (u.worklog.id, u.reason.clone())).collect();
        assert!(plan.insertions.is_empty());
        assert!(matches!(reasons[0], (1, UnresolvedReason::Unmapped(ref a)) if a.id == "77"));
        assert_eq!(reasons[1], (2, UnresolvedReason::NoAccount));
        assert_eq!(reasons[2], (3, UnresolvedReason::IssueNotFound));
        assert_eq!(reasons[3].0, 4);
        assert_eq!(store.lookup("77"), None);
    }

    #[tokio::test]
    async fn prompted_code_is_saved_and_asked_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);
        let source = FakeSource::new(vec![
            worklog(1, date(2026, 2, 2), 1.0, "OPS-5", "a"),
            worklog(2, date(2026, 2, 3), 2.0, "OPS-5", "b"),
        ]);
        let issues = acme_issues();
        let mut sheet = FakeTimesheet::default();
        let mut output = Vec::new();
        let mut resolver = PromptResolver::new(Cursor::new(b"5555-12345-002\n".as_slice()), &mut output);

        let plan = Reconciler::new(&source, &issues, &mut sheet, &mut store, &mut resolver)
            .plan(week(), &SyncOptions::default())
            .await
            .unwrap();

        assert_eq!(plan.insertions.len(), 2);
        assert!(plan.insertions.iter().all(|e| e.cost_center == code("5555-12345-002")));
        assert_eq!(issues.lookups(), 1);

        let reloaded = MappingStore::load(dir.path().join("mapping.json")).unwrap();
        let saved = reloaded.get("77").unwrap();
        assert_eq!(saved.cost_center, code("5555-12345-002"));
        assert_eq!(saved.display_name, "Operations");
        assert_eq!(saved.sample_reference.as_deref(), Some("OPS-5"));
    }

    #[tokio::test]
    async fn skipped_account_is_not_asked_again() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);
        let source = FakeSource::new(vec![
            worklog(1, date(2026, 2, 2), 1.0, "OPS-5", ""),
            worklog(2, date(2026, 2, 3), 1.0, "OPS-5", ""),
        ]);
        let issues = acme_issues();
        let mut sheet = FakeTimesheet::default();
        let mut output = Vec::new();
        let mut resolver = PromptResolver::new(Cursor::new(b"SKIP\n".as_slice()), &mut output);

        let plan = Reconciler::new(&source, &issues, &mut sheet, &mut store, &mut resolver)
            .plan(week(), &SyncOptions::default())
            .await
            .unwrap();

        assert_eq!(plan.unresolved.len(), 2);
        let prompts = String::from_utf8(output).unwrap().matches("Unknown account").count();
        assert_eq!(prompts, 1);
    }

    #[tokio::test]
    async fn partial_failures_are_recorded_and_do_not_abort() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);
        let source = FakeSource::new(vec![
            worklog(1, date(2026, 2, 2), 1.0, "ACME-1234", "one"),
            worklog(2, date(2026, 2, 3), 2.0, "ACME-1234", "two"),
            worklog(3, date(2026, 2, 4), 3.0, "ACME-1234", "three"),
        ]);
        let mut sheet = FakeTimesheet::new(vec![
            entry(date(2026, 2, 2), "1234-56789-001", "ACME-1234", "[WL:8] old", 1.0),
            entry(date(2026, 2, 3), "1234-56789-001", "ACME-1234", "[WL:9] old", 1.0),
        ]);
        sheet.fail_delete.insert(9);
        sheet.fail_create.insert(2);

        let report = run(&source, &acme_issues(), &mut sheet, &mut store, &execute()).await.unwrap();
        let execution = report.execution.clone().unwrap();

        assert!(report.has_failures());
        assert_eq!(execution.deleted, 1);
        assert_eq!(execution.created, 2);
        assert_eq!(execution.failed(EntryAction::Delete), 1);
        assert_eq!(execution.failed(EntryAction::Create), 1);
        assert_eq!(execution.failures[0].entry.worklog_id(), Some(9));
        assert!(execution.failures[0].error.contains("not found"));
        assert_eq!(sheet.saves, 1);
    }

    #[tokio::test]
    async fn survivors_are_deleted_again_until_passes_run_out() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);
        let mut sheet = FakeTimesheet::new(vec![
            entry(date(2026, 2, 2), "1234-56789-001", "ACME-1234", "[WL:8] old", 1.0),
        ]);
        sheet.sticky.insert(8);
        let options = SyncOptions {
            delete_passes: 2,
            ..execute()
        };

        let report = run(&FakeSource::default(), &acme_issues(), &mut sheet, &mut store, &options)
            .await
            .unwrap();
        let execution = report.execution.unwrap();

        assert_eq!(sheet.deletes, 3);
        assert_eq!(execution.deleted, 0);
        assert_eq!(execution.failures.len(), 1);
        assert!(execution.failures[0].error.contains("still present after 3 delete passes"));
    }

    #[tokio::test]
    async fn cutover_limits_worklogs_and_deletions() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);
        let source = FakeSource::new(vec![
            worklog(1, date(2026, 2, 2), 1.0, "ACME-1234", "before"),
            worklog(2, date(2026, 2, 4), 2.0, "ACME-1234", "after"),
        ]);
        let early = entry(date(2026, 2, 2), "1234-56789-001", "ACME-1234", "[WL:1] migrated by hand", 1.0);
        let mut sheet = FakeTimesheet::new(vec![early.clone()]);
        let options = SyncOptions {
            cutover: Some(date(2026, 2, 4)),
            ..execute()
        };

        let report = run(&source, &acme_issues(), &mut sheet, &mut store, &options).await.unwrap();

        assert_eq!(report.plan.range.start, date(2026, 2, 4));
        assert!(report.plan.deletions.is_empty());
        assert_eq!(report.plan.insertions.len(), 1);
        assert!(sheet.entries.contains(&early));
        assert_eq!(sheet.entries.len(), 2);
    }

    #[tokio::test]
    async fn cutover_outside_week_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);
        let mut sheet = FakeTimesheet::default();
        let options = SyncOptions {
            cutover: Some(date(2026, 3, 1)),
            ..execute()
        };
        let err = run(&FakeSource::default(), &acme_issues(), &mut sheet, &mut store, &options)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("outside week 202606"));
        assert_eq!(sheet.logins, 0);
    }

    #[tokio::test]
    async fn forbidden_issue_is_skipped_and_the_rest_syncs() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);
        let source = FakeSource::new(vec![
            worklog(1764, date(2026, 2, 2), 3.5, "ACME-1234", "working on concept"),
            worklog(1766, date(2026, 2, 3), 2.0, "SECRET-9", "hidden project"),
            worklog(1767, date(2026, 2, 4), 1.0, "SECRET-9", "more"),
        ]);
        let mut issues = acme_issues();
        issues.forbidden.insert("SECRET-9".into());
        let mut sheet = FakeTimesheet::default();

        let report = run(&source, &issues, &mut sheet, &mut store, &execute()).await.unwrap();

        assert_eq!(report.plan.insertions.len(), 1);
        assert_eq!(report.plan.unresolved.len(), 2);
        let miss = &report.plan.unresolved[0];
        assert_eq!(miss.ticket, "SECRET-9");
        assert!(matches!(miss.reason, UnresolvedReason::IssueUnreadable(_)));
        assert!(miss.reason.to_string().contains("Access denied"));
        assert_eq!(issues.lookups(), 2);
        assert_eq!(report.execution.unwrap().created, 1);
    }

    #[tokio::test]
    async fn connectivity_failures_abort_before_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);
        let existing = || vec![entry(date(2026, 2, 2), "1234-56789-001", "ACME-1234", "[WL:8] old", 1.0)];
        let source = FakeSource::new(vec![worklog(1, date(2026, 2, 2), 1.0, "ACME-1234", "")]);

        let mut sheet = FakeTimesheet::new(existing());
        assert!(run(&FakeSource::failing(), &acme_issues(), &mut sheet, &mut store, &execute()).await.is_err());
        assert_eq!(sheet.logins, 0);

        let mut broken_jira = acme_issues();
        broken_jira.fail = true;
        assert!(run(&source, &broken_jira, &mut sheet, &mut store, &execute()).await.is_err());

        sheet.fail_login = true;
        assert!(run(&source, &acme_issues(), &mut sheet, &mut store, &execute()).await.is_err());

        sheet.fail_login = false;
        sheet.fail_list = true;
        assert!(run(&source, &acme_issues(), &mut sheet, &mut store, &execute()).await.is_err());

        assert_eq!(sheet.mutations(), 0);
        assert_eq!(sheet.entries, existing());
    }

    #[tokio::test]
    async fn save_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);
        let source = FakeSource::new(vec![worklog(1, date(2026, 2, 2), 1.0, "ACME-1234", "")]);
        let mut sheet = FakeTimesheet::default();
        sheet.fail_save = true;

        let report = run(&source, &acme_issues(), &mut sheet, &mut store, &execute()).await.unwrap();

        assert!(report.has_failures());
        assert!(report.execution.unwrap().save_error.unwrap().contains("Save"));
    }
}
