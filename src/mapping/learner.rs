use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::store::MappingStore;
use crate::model::mapping::CostCenterCode;
use crate::model::week::IsoWeek;
use crate::model::worklog::Account;
use crate::providers::error::is_per_item;
use crate::providers::{IssueDirectory, TimesheetDestination};

#[derive(Debug, Clone, PartialEq)]
pub struct LearnedMapping {
    pub account: Account,
    pub cost_center: CostCenterCode,
    pub sample_ticket: String,
}

/// An account whose observed work orders disagree with the mapping or with
/// each other. Reported only; the mapping is left as it is.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingConflict {
    pub account: Account,
    pub existing: Option<CostCenterCode>,
    pub observed: Vec<CostCenterCode>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LearnReport {
    pub weeks: Vec<IsoWeek>,
    pub entries_scanned: usize,
    pub added: Vec<LearnedMapping>,
    pub conflicts: Vec<MappingConflict>,
    /// Account ids already mapped to the observed work order.
    pub unchanged: Vec<String>,
    /// Tickets with no issue, no readable issue or no account in Jira.
    pub unattributed: Vec<String>,
}

impl LearnReport {
    pub fn counts(&self) -> (usize, usize) {
        (self.added.len(), self.conflicts.len())
    }
}

#[derive(Default)]
struct Observation {
    name: String,
    codes: BTreeSet<CostCenterCode>,
    sample_ticket: String,
}

/// Builds account mappings from work orders already booked in Unit4.
pub struct MappingLearner<'a> {
    destination: &'a mut dyn TimesheetDestination,
    issues: &'a dyn IssueDirectory,
    store: &'a mut MappingStore,
}

impl<'a> MappingLearner<'a> {
    pub fn new(
        destination: &'a mut dyn TimesheetDestination,
        issues: &'a dyn IssueDirectory,
        store: &'a mut MappingStore,
    ) -> Self {
        Self {
            destination,
            issues,
            store,
        }
    }

    pub async fn learn(&mut self, weeks: &[IsoWeek]) -> Result<LearnReport> {
        let mut report = LearnReport {
            weeks: weeks.to_vec(),
            ..Default::default()
        };

        self.destination.login().await.context("Unit4 login failed")?;
        let mut pairs: BTreeSet<(String, CostCenterCode)> = BTreeSet::new();
        for week in weeks {
            let entries = self
                .destination
                .list_entries(&week.range())
                .await
                .with_context(|| format!("Reading Unit4 week {week} failed"))?;
            tracing::info!(%week, entries = entries.len(), "scanned week");
            report.entries_scanned += entries.len();
            pairs.extend(
                entries
                    .into_iter()
                    .filter(|e| !e.ticket.is_empty())
                    .map(|e| (e.ticket, e.cost_center)),
            );
        }

        let mut accounts: HashMap<String, Option<Account>> = HashMap::new();
        let mut observed: BTreeMap<String, Observation> = BTreeMap::new();
        for (ticket, code) in pairs {
            if !accounts.contains_key(&ticket) {
                let account = match self.issues.issue(&ticket).await {
                    Ok(issue) => issue.and_then(|issue| issue.account),
                    Err(e) if is_per_item(&e) => {
                        tracing::warn!(%ticket, error = %e, "issue not readable");
                        None
                    }
                    Err(e) => return Err(e.context(format!("Looking up issue {ticket} failed"))),
                };
                if account.is_none() {
                    tracing::debug!(%ticket, "no account for ticket");
                    report.unattributed.push(ticket.clone());
                }
                accounts.insert(ticket.clone(), account);
            }
            let Some(Some(account)) = accounts.get(&ticket) else {
                continue;
            };
            let seen = observed.entry(account.id.clone()).or_default();
            seen.name.clone_from(&account.name);
            if seen.sample_ticket.is_empty() {
                seen.sample_ticket = ticket.clone();
            }
            seen.codes.insert(code);
        }

        for (id, seen) in observed {
            let account = Account {
                id: id.clone(),
                name: seen.name,
            };
            let codes: Vec<CostCenterCode> = seen.codes.into_iter().collect();
            match (self.store.lookup(&id), codes.as_slice()) {
                (Some(existing), [code]) if existing == code => report.unchanged.push(id),
                (None, [code]) => {
                    self.store
                        .upsert(&id, code.clone(), &account.name, Some(seen.sample_ticket.as_str()));
                    tracing::info!(account = %id, %code, "learned mapping");
                    report.added.push(LearnedMapping {
                        account,
                        cost_center: code.clone(),
                        sample_ticket: seen.sample_ticket,
                    });
                }
                (existing, _) => {
                    tracing::warn!(account = %id, observed = codes.len(), "mapping conflict");
                    report.conflicts.push(MappingConflict {
                        account,
                        existing: existing.cloned(),
                        observed: codes.clone(),
                    });
                }
            }
        }

        if !report.added.is_empty() {
            self.store.save().context("Saving the mapping file failed")?;
        }
        Ok(report)
    }
}
