use chrono::NaiveDate;
use std::time::Duration;

use crate::mapping::store::MappingStore;
use crate::providers::error::ApiError;
use crate::providers::jira::JiraClient;
use crate::providers::tempo::TempoClient;

const UNIT4: &str = "Unit4";

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeStatus {
    Ok(String),
    Failed(String),
}

impl ProbeStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, ProbeStatus::Ok(_))
    }
}

/// Result of the pre-flight checks. Each probe runs regardless of the others.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectivityReport {
    pub jira: ProbeStatus,
    pub tempo: ProbeStatus,
    pub unit4: ProbeStatus,
    pub mappings: usize,
}

impl ConnectivityReport {
    pub fn all_ok(&self) -> bool {
        self.jira.is_ok() && self.tempo.is_ok() && self.unit4.is_ok()
    }
}

pub async fn probe_jira(jira: &JiraClient) -> ProbeStatus {
    match jira.myself().await {
        Ok(account_id) => ProbeStatus::Ok(format!("authenticated (account {account_id})")),
        Err(e) => ProbeStatus::Failed(e.to_string()),
    }
}

pub async fn probe_tempo(tempo: &TempoClient, day: NaiveDate) -> ProbeStatus {
    match tempo.ping(day).await {
        Ok(()) => ProbeStatus::Ok("authenticated".into()),
        Err(e) => ProbeStatus::Failed(e.to_string()),
    }
}

/// The login page answers with a redirect or an auth challenge; any of
/// those proves the server is reachable.
pub async fn probe_unit4(url: &str, timeout: Duration) -> ProbeStatus {
    let client = match reqwest::Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::none())
        .build()
    {
        Ok(client) => client,
        Err(e) => return ProbeStatus::Failed(e.to_string()),
    };
    match client.head(url).send().await {
        Ok(resp) => {
            let status = resp.status();
            let code = status.as_u16();
            if status.is_success() || status.is_redirection() || code == 401 || code == 403 {
                ProbeStatus::Ok(format!("reachable (HTTP {code})"))
            } else {
                ProbeStatus::Failed(
                    ApiError::status(UNIT4, code, status.canonical_reason().unwrap_or("")).to_string(),
                )
            }
        }
        Err(e) => ProbeStatus::Failed(ApiError::from_reqwest(UNIT4, url, e).to_string()),
    }
}

pub async fn check(
    jira: &JiraClient,
    tempo: &TempoClient,
    unit4_url: &str,
    timeout: Duration,
    store: &MappingStore,
) -> ConnectivityReport {
    let today = chrono::Local::now().date_naive();
    let report = ConnectivityReport {
        jira: probe_jira(jira).await,
        tempo: probe_tempo(tempo, today).await,
        unit4: probe_unit4(unit4_url, timeout).await,
        mappings: store.len(),
    };
    tracing::info!(ok = report.all_ok(), mappings = report.mappings, "connectivity check done");
    report
}
