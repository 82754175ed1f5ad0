use anyhow::Result;
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use super::error::{check_status, ApiError};
use super::IssueDirectory;
use crate::config::JiraConfig;
use crate::model::worklog::{Account, Issue};

const SERVICE: &str = "Jira";

pub struct JiraClient {
    base_url: String,
    auth_header: String,
    account_field: String,
    client: reqwest::Client,
}

impl JiraClient {
    pub fn new(config: &JiraConfig, timeout: Duration) -> Result<Self> {
        let creds = format!("{}:{}", config.user_email, config.api_token);
        let encoded = base64::engine::general_purpose::STANDARD.encode(creds);
        Ok(Self {
            base_url: config.base_url.clone(),
            auth_header: format!("Basic {encoded}"),
            account_field: config.account_field.clone(),
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, ApiError> {
        self.client
            .get(url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(SERVICE, &self.base_url, e))
    }

    /// Account id of the user the API token belongs to.
    pub async fn myself(&self) -> Result<String, ApiError> {
        let url = format!("{}/rest/api/3/myself", self.base_url);
        let resp = check_status(SERVICE, self.get(&url).await?)?;
        let me: Myself = resp
            .json()
            .await
            .map_err(|e| ApiError::from_reqwest(SERVICE, &url, e))?;
        Ok(me.account_id)
    }
}

#[derive(Deserialize)]
struct Myself {
    #[serde(rename = "accountId")]
    account_id: String,
}

#[derive(Deserialize)]
struct JiraIssue {
    key: String,
    #[serde(default)]
    fields: serde_json::Map<String, Value>,
}

/// Tempo account custom field: `{"id": 42, "key": "ACME", "value": "ACME - DevOps"}`.
/// Older instances use `name` instead of `value`.
fn parse_account(field: Option<&Value>) -> Option<Account> {
    let obj = field?.as_object()?;
    let id = ["key", "id"]
        .iter()
        .filter_map(|k| obj.get(*k))
        .find_map(scalar_to_string)?;
    let name = ["name", "value"]
        .iter()
        .filter_map(|k| obj.get(*k))
        .find_map(scalar_to_string)
        .unwrap_or_default();
    Some(Account { id, name })
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl IssueDirectory for JiraClient {
    async fn issue(&self, key: &str) -> Result<Option<Issue>> {
        let url = format!(
            "{}/rest/api/3/issue/{}?fields={}",
            self.base_url,
            urlencoding::encode(key),
            urlencoding::encode(&format!("key,summary,{}", self.account_field))
        );
        let resp = self.get(&url).await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(key, "issue not found");
            return Ok(None);
        }
        let resp = check_status(SERVICE, resp)?;
        let issue: JiraIssue = resp
            .json()
            .await
            .map_err(|e| ApiError::from_reqwest(SERVICE, &url, e))?;

        let summary = issue
            .fields
            .get("summary")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .chars()
            .take(100)
            .collect();

        Ok(Some(Issue {
            key: issue.key,
            summary,
            account: parse_account(issue.fields.get(&self.account_field)),
        }))
    }
}
