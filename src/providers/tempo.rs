use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

use super::error::{check_status, ApiError};
use super::WorklogSource;
use crate::config::TempoConfig;
use crate::model::week::DateRange;
use crate::model::worklog::Worklog;

const SERVICE: &str = "Tempo";
const PAGE_LIMIT: u32 = 1000;

pub struct TempoClient {
    base_url: String,
    auth_header: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct WorklogPage {
    #[serde(default)]
    results: Vec<TempoWorklog>,
    #[serde(default)]
    metadata: Option<PageMetadata>,
}

#[derive(Deserialize)]
struct PageMetadata {
    next: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TempoWorklog {
    tempo_worklog_id: u64,
    issue: Option<IssueRef>,
    start_date: NaiveDate,
    time_spent_seconds: u64,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
struct IssueRef {
    id: Option<u64>,
    key: Option<String>,
}

impl From<TempoWorklog> for Worklog {
    fn from(wl: TempoWorklog) -> Self {
        let issue_key = wl
            .issue
            .and_then(|i| i.key.or_else(|| i.id.map(|id| id.to_string())))
            .unwrap_or_default();
        Worklog {
            id: wl.tempo_worklog_id,
            date: wl.start_date,
            hours: wl.time_spent_seconds as f64 / 3600.0,
            issue_key,
            description: wl.description.unwrap_or_default(),
        }
    }
}

impl TempoClient {
    pub fn new(config: &TempoConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: config.base_url.clone(),
            auth_header: format!("Bearer {}", config.api_token),
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    async fn get_page(&self, url: &str) -> Result<WorklogPage, ApiError> {
        let resp = self
            .client
            .get(url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(SERVICE, &self.base_url, e))?;
        check_status(SERVICE, resp)?
            .json()
            .await
            .map_err(|e| ApiError::from_reqwest(SERVICE, url, e))
    }

    /// All worklogs of `account_id` in `range`, following pagination.
    pub async fn fetch_worklogs(&self, account_id: &str, range: &DateRange) -> Result<Vec<Worklog>, ApiError> {
        let mut worklogs = Vec::new();
        let mut next = Some(format!(
            "{}/4/worklogs/user/{}?from={}&to={}&limit={PAGE_LIMIT}",
            self.base_url,
            urlencoding::encode(account_id),
            range.start,
            range.end
        ));

        while let Some(url) = next {
            let page = self.get_page(&url).await?;
            tracing::debug!(count = page.results.len(), "fetched Tempo worklog page");
            worklogs.extend(page.results.into_iter().map(Worklog::from));
            next = page.metadata.and_then(|m| m.next).filter(|n| !n.is_empty());
        }

        Ok(worklogs)
    }

    /// Cheapest authenticated call: at most one worklog of `day`.
    pub async fn ping(&self, day: NaiveDate) -> Result<(), ApiError> {
        let url = format!("{}/4/worklogs?from={day}&to={day}&limit=1", self.base_url);
        self.get_page(&url).await.map(|_| ())
    }
}

/// Tempo worklogs of one user.
pub struct TempoWorklogs {
    client: TempoClient,
    account_id: String,
}

impl TempoWorklogs {
    pub fn new(client: TempoClient, account_id: String) -> Self {
        Self { client, account_id }
    }
}

#[async_trait]
impl WorklogSource for TempoWorklogs {
    fn name(&self) -> &str {
        "Tempo"
    }

    async fn fetch_worklogs(&self, range: &DateRange) -> Result<Vec<Worklog>> {
        Ok(self.client.fetch_worklogs(&self.account_id, range).await?)
    }
}
