use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// One configured news site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub url: String,
    pub selector: String,
    /// Overrides the URL that relative hrefs are resolved against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Source {
    pub fn new(name: impl Into<String>, url: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            selector: selector.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn resolve_base(&self) -> &str {
        self.base_url.as_deref().unwrap_or(&self.url)
    }
}

/// A headline extracted from a source page. The title is the storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
}

impl NewsItem {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// What one source contributed to a cycle.
#[derive(Debug, Clone, Serialize)]
pub struct SourceOutcome {
    pub source: String,
    pub items: Vec<NewsItem>,
    pub error: Option<String>,
}

impl SourceOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Leave the stored row untouched.
    #[default]
    Skip,
    /// Replace the stored url when it differs.
    Update,
    /// Treat an existing title as an error.
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Inserted,
    Updated,
    Skipped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl SaveReport {
    pub fn record(&mut self, outcome: StoreOutcome) {
        match outcome {
            StoreOutcome::Inserted => self.inserted += 1,
            StoreOutcome::Updated => self.updated += 1,
            StoreOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.skipped + self.failed
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sources_ok: usize,
    pub sources_failed: usize,
    pub items_found: usize,
    pub save: SaveReport,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub max_body_bytes: usize,
}

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(10),
            max_body_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub interval: Duration,
    pub run_on_startup: bool,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30 * 60),
            run_on_startup: false,
            duplicate_policy: DuplicatePolicy::Skip,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Response from {url} exceeds {limit} bytes")]
    BodyTooLarge { url: String, limit: usize },

    #[error("Invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Headline already stored: {title}")]
    DuplicateTitle { title: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("A cycle is already in progress")]
    CycleInProgress,
}

pub type Result<T> = std::result::Result<T, AggregatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_defaults_to_source_url() {
        let source = Source::new("x", "http://x.test/news", "a");
        assert_eq!(source.resolve_base(), "http://x.test/news");

        let source = source.with_base_url("http://x.test");
        assert_eq!(source.resolve_base(), "http://x.test");
    }

    #[test]
    fn save_report_counts_outcomes() {
        let mut report = SaveReport::default();
        report.record(StoreOutcome::Inserted);
        report.record(StoreOutcome::Inserted);
        report.record(StoreOutcome::Skipped);
        report.failed += 1;

        assert_eq!(report.inserted, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.total(), 4);
    }

    #[test]
    fn duplicate_policy_deserializes_lowercase() {
        let policy: DuplicatePolicy = serde_json::from_str("\"update\"").unwrap();
        assert_eq!(policy, DuplicatePolicy::Update);
    }
}
