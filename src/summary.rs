//! Human-readable reports printed to stdout.

use std::fmt::Write;

use crate::check::{ConnectivityReport, ProbeStatus};
use crate::mapping::learner::LearnReport;
use crate::model::entry::DestinationEntry;
use crate::sync::report::{EntryAction, SyncReport, UnresolvedReason};

const RULE: &str = "======================================================================";

fn entry_line(entry: &DestinationEntry) -> String {
    format!(
        "{} | {:5.2}h | {:<15} | {} | {}",
        entry.date, entry.hours, entry.ticket, entry.cost_center, entry.text
    )
}

pub fn render_sync(report: &SyncReport) -> String {
    let plan = &report.plan;
    let mut out = String::new();
    let mode = if report.is_dry_run() { "DRY-RUN" } else { "EXECUTE" };
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "SYNC TEMPO -> UNIT4 | Week {} | Mode: {mode}", plan.week);
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Range: {}", plan.range);
    let _ = writeln!(out, "Worklogs fetched: {}", plan.fetched);
    let _ = writeln!(out);

    let verb = if report.is_dry_run() { "Would delete" } else { "Delete" };
    let _ = writeln!(out, "{verb} {} synced entries:", plan.deletions.len());
    for entry in &plan.deletions {
        let _ = writeln!(out, "  - {}", entry_line(entry));
    }
    let verb = if report.is_dry_run() { "Would create" } else { "Create" };
    let _ = writeln!(out, "{verb} {} entries:", plan.insertions.len());
    for entry in &plan.insertions {
        let _ = writeln!(out, "  + {}", entry_line(entry));
    }
    let _ = writeln!(
        out,
        "  Total: {:.2}h across {} entries",
        plan.total_hours(),
        plan.insertions.len()
    );
    if plan.is_noop() {
        let _ = writeln!(out, "  (timesheet already up to date)");
    }

    if !plan.unresolved.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Skipped {} worklogs:", plan.unresolved.len());
        for miss in &plan.unresolved {
            let _ = writeln!(
                out,
                "  ! {} | {:5.2}h | {:<15} | [WL:{}] {}",
                miss.worklog.date, miss.worklog.hours, miss.ticket, miss.worklog.id, miss.reason
            );
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "SUMMARY");
    match &report.execution {
        None => {
            let _ = writeln!(out, "  Mode:         DRY-RUN (no changes made)");
            let _ = writeln!(out, "  Would delete: {} entries", plan.deletions.len());
            let _ = writeln!(out, "  Would create: {} entries", plan.insertions.len());
        }
        Some(execution) => {
            let _ = writeln!(out, "  Deleted:  {} entries", execution.deleted);
            let _ = writeln!(out, "  Created:  {} entries", execution.created);
            if !execution.failures.is_empty() {
                let _ = writeln!(
                    out,
                    "  Failed:   {} deletions, {} creations",
                    execution.failed(EntryAction::Delete),
                    execution.failed(EntryAction::Create)
                );
                for failure in &execution.failures {
                    let action = match failure.action {
                        EntryAction::Delete => "delete",
                        EntryAction::Create => "create",
                    };
                    let _ = writeln!(out, "    {action} {}: {}", entry_line(&failure.entry), failure.error);
                }
            }
            if let Some(error) = &execution.save_error {
                let _ = writeln!(out, "  Save failed: {error}");
                let _ = writeln!(out, "  Save the timesheet manually in the browser.");
            }
        }
    }
    let _ = writeln!(out, "  Skipped:  {} worklogs", plan.unresolved.len());

    if plan
        .unresolved
        .iter()
        .any(|u| matches!(u.reason, UnresolvedReason::Unmapped(_)))
    {
        let _ = writeln!(out);
        let _ = writeln!(out, "[!] Some worklogs have Tempo accounts without a Unit4 work order. To sync them:");
        let _ = writeln!(out, "    1. Run `sync --execute` in a terminal and enter the work order when prompted");
        let _ = writeln!(out, "    2. Learn mappings from your Unit4 history: `build-mapping`");
        let _ = writeln!(out, "    3. Edit account_to_arbauft_mapping.json by hand");
    }
    if report.is_dry_run() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Run with --execute to apply changes.");
    }
    out
}

pub fn render_learn(report: &LearnReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "BUILD MAPPING FROM UNIT4 HISTORY");
    let _ = writeln!(out, "{RULE}");
    if let (Some(first), Some(last)) = (report.weeks.first(), report.weeks.last()) {
        let _ = writeln!(out, "Scanned {} weeks ({first} to {last}), {} entries", report.weeks.len(), report.entries_scanned);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Added {} mappings:", report.added.len());
    for added in &report.added {
        let _ = writeln!(
            out,
            "  + {:<15} {:<16} {} (seen on {})",
            added.account.id, added.cost_center, added.account.name, added.sample_ticket
        );
    }
    if !report.unchanged.is_empty() {
        let _ = writeln!(out, "Already mapped: {}", report.unchanged.join(", "));
    }
    if !report.conflicts.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "CONFLICTS ({} accounts, left unchanged):", report.conflicts.len());
        for conflict in &report.conflicts {
            let existing = conflict
                .existing
                .as_ref()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unmapped".into());
            let observed: Vec<String> = conflict.observed.iter().map(ToString::to_string).collect();
            let _ = writeln!(
                out,
                "  ! {} ({}): mapping {existing}, seen {}",
                conflict.account.id,
                conflict.account.name,
                observed.join(", ")
            );
        }
        let _ = writeln!(out, "  Review these in account_to_arbauft_mapping.json.");
    }
    if !report.unattributed.is_empty() {
        let _ = writeln!(out, "No Tempo account for: {}", report.unattributed.join(", "));
    }
    let (added, conflicting) = report.counts();
    let _ = writeln!(out);
    let _ = writeln!(out, "{added} added, {conflicting} conflicting");
    out
}

pub fn render_check(report: &ConnectivityReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Connectivity check");
    for (name, status) in [("Jira", &report.jira), ("Tempo", &report.tempo), ("Unit4", &report.unit4)] {
        match status {
            ProbeStatus::Ok(detail) => {
                let _ = writeln!(out, "  [OK]   {name:<6} {detail}");
            }
            ProbeStatus::Failed(error) => {
                let _ = writeln!(out, "  [FAIL] {name:<6} {error}");
            }
        }
    }
    let _ = writeln!(out, "  Mapping: {} accounts", report.mappings);
    if report.mappings == 0 {
        let _ = writeln!(out, "  [!] Mapping is empty. Run `build-mapping` or enter work orders during sync.");
    }
    out
}
