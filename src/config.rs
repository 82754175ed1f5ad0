use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub jira: JiraConfig,
    pub tempo: TempoConfig,
    pub unit4: Unit4Config,
    #[serde(default)]
    pub sync: SyncSettings,
}

#[derive(Debug, Deserialize)]
pub struct JiraConfig {
    pub base_url: String,
    pub user_email: String,
    pub api_token: String,
    /// Custom field holding the Tempo account on an issue.
    #[serde(default = "default_account_field")]
    pub account_field: String,
}

#[derive(Debug, Deserialize)]
pub struct TempoConfig {
    pub api_token: String,
    #[serde(default = "default_tempo_url")]
    pub base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct Unit4Config {
    pub url: String,
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default)]
    pub headless: bool,
    #[serde(default)]
    pub locale: UiLocale,
    /// Activity code filled into every new entry.
    #[serde(default = "default_activity")]
    pub activity: String,
}

/// Language of the Unit4 user interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiLocale {
    De,
    #[default]
    En,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Longest worklog description copied into an entry text.
    pub description_limit: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_retries: 3,
            retry_delay_ms: 1_000,
            description_limit: 60,
        }
    }
}

fn default_account_field() -> String {
    "customfield_10048".into()
}

fn default_tempo_url() -> String {
    "https://api.tempo.io".into()
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".into()
}

fn default_activity() -> String {
    "TEMPO".into()
}

pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tempo-unit4")
}

/// Where the config, mapping and browser session live.
#[derive(Debug, Clone)]
pub struct Paths {
    pub config: PathBuf,
    pub mapping: PathBuf,
    pub session: PathBuf,
}

impl Paths {
    pub fn new(data_dir: Option<PathBuf>, config: Option<PathBuf>) -> Self {
        let dir = data_dir.unwrap_or_else(self::data_dir);
        Self {
            config: config.unwrap_or_else(|| dir.join("config.toml")),
            mapping: dir.join("account_to_arbauft_mapping.json"),
            session: dir.join("session.json"),
        }
    }
}

pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        bail!(
            "Config file not found: {}\n\nCreate it with your credentials:\n\n{}",
            path.display(),
            EXAMPLE_CONFIG
        );
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let mut config: AppConfig = toml::from_str(contents)?;
    config.jira.base_url = config.jira.base_url.trim_end_matches('/').to_string();
    config.tempo.base_url = config.tempo.base_url.trim_end_matches('/').to_string();
    if config.unit4.url.trim().is_empty() {
        bail!("unit4.url is empty");
    }
    Ok(config)
}

const EXAMPLE_CONFIG: &str = r#"[jira]
base_url = "https://your-company.atlassian.net"
user_email = "you@company.com"
api_token = "..."

[tempo]
api_token = "..."

[unit4]
url = "https://unit4.your-company.com/"
"#;
