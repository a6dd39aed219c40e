use anyhow::{Context, Result};
use coordination::escalation::EscalationConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Notice board polled when nothing else is configured.
pub const DEFAULT_SOURCE_URL: &str = "https://www.dhakacollege.edu.bd/en/notice";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Optional settings read from a TOML file. Every key may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub source_url: Option<String>,
    pub user_agent: Option<String>,
    pub fetch_timeout_secs: Option<u64>,
    pub notify_timeout_secs: Option<u64>,
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub telegram_api_base: Option<String>,
    pub cache_path: Option<PathBuf>,
    pub error_state_path: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
    pub step_summary_path: Option<PathBuf>,
    pub alert_threshold: Option<u32>,
}

impl FileConfig {
    /// Load settings from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).context(format!("Failed to parse config TOML {}", path.display()))
    }
}

/// Everything one invocation needs, built once and handed to the orchestrator.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Notice board page to poll
    pub source_url: String,
    pub user_agent: String,
    /// Deadline for the page fetch; exceeding it is a `timeout` failure
    pub fetch_timeout: Duration,
    /// Deadline for each Telegram POST
    pub notify_timeout: Duration,
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub telegram_api_base: String,
    /// Notice store snapshot (dedup baseline)
    pub cache_path: PathBuf,
    /// Error ledger snapshot
    pub error_state_path: PathBuf,
    /// Append-only run log, one line per invocation
    pub log_path: Option<PathBuf>,
    /// CI step summary file (e.g. `GITHUB_STEP_SUMMARY`)
    pub step_summary_path: Option<PathBuf>,
    /// Consecutive failures before an alert goes out
    pub alert_threshold: u32,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.into(),
            user_agent: DEFAULT_USER_AGENT.into(),
            fetch_timeout: Duration::from_secs(10),
            notify_timeout: Duration::from_secs(30),
            telegram_token: None,
            telegram_chat_id: None,
            telegram_api_base: "https://api.telegram.org".into(),
            cache_path: PathBuf::from("notice_cache.json"),
            error_state_path: PathBuf::from("error_state.json"),
            log_path: Some(PathBuf::from("log.txt")),
            step_summary_path: None,
            alert_threshold: EscalationConfig::default().alert_threshold,
        }
    }
}

impl WatchConfig {
    /// Defaults, then the optional TOML file, then the process environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = file {
            config.apply_file(FileConfig::from_file(path)?);
        }
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_file(&mut self, file: FileConfig) {
        if let Some(v) = file.source_url {
            self.source_url = v;
        }
        if let Some(v) = file.user_agent {
            self.user_agent = v;
        }
        if let Some(v) = file.fetch_timeout_secs {
            self.fetch_timeout = Duration::from_secs(v);
        }
        if let Some(v) = file.notify_timeout_secs {
            self.notify_timeout = Duration::from_secs(v);
        }
        if file.telegram_token.is_some() {
            self.telegram_token = file.telegram_token;
        }
        if file.telegram_chat_id.is_some() {
            self.telegram_chat_id = file.telegram_chat_id;
        }
        if let Some(v) = file.telegram_api_base {
            self.telegram_api_base = v;
        }
        if let Some(v) = file.cache_path {
            self.cache_path = v;
        }
        if let Some(v) = file.error_state_path {
            self.error_state_path = v;
        }
        if file.log_path.is_some() {
            self.log_path = file.log_path;
        }
        if file.step_summary_path.is_some() {
            self.step_summary_path = file.step_summary_path;
        }
        if let Some(v) = file.alert_threshold {
            self.alert_threshold = v;
        }
    }

    /// Overlay environment variables resolved through `lookup`; blank values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("NOTICE_URL") {
            self.source_url = v;
        }
        if let Some(v) = var("TELEGRAM_TOKEN") {
            self.telegram_token = Some(v);
        }
        if let Some(v) = var("TELEGRAM_CHAT_ID") {
            self.telegram_chat_id = Some(v);
        }
        if let Some(v) = var("NOTICE_CACHE_FILE") {
            self.cache_path = v.into();
        }
        if let Some(v) = var("NOTICE_ERROR_FILE") {
            self.error_state_path = v.into();
        }
        if let Some(v) = var("NOTICE_LOG_FILE") {
            self.log_path = Some(v.into());
        }
        if let Some(v) = var("GITHUB_STEP_SUMMARY") {
            self.step_summary_path = Some(v.into());
        }
    }

    /// Reject configurations that cannot complete a cycle.
    pub fn validate(&self) -> Result<()> {
        if self.telegram_token.is_none() || self.telegram_chat_id.is_none() {
            anyhow::bail!("TELEGRAM_TOKEN and TELEGRAM_CHAT_ID must be set");
        }
        if self.alert_threshold == 0 {
            anyhow::bail!("alert_threshold must be at least 1");
        }
        if !self.source_url.starts_with("http://") && !self.source_url.starts_with("https://") {
            anyhow::bail!("source_url must be an http(s) URL, got {}", self.source_url);
        }
        Ok(())
    }

    pub fn escalation_config(&self) -> EscalationConfig {
        EscalationConfig {
            alert_threshold: self.alert_threshold,
        }
    }
}
