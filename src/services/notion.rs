use std::collections::HashMap;
use std::time::Duration;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const DEFAULT_API_BASE: &str = "https://api.notion.com/v1";
const DEFAULT_NOTION_VERSION: &str = "2022-06-28";
const DEFAULT_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone)]
pub struct NotionConfig {
    pub api_key: Option<String>,
    pub database_id: Option<String>,
    pub api_base: String,
    pub notion_version: String,
    pub page_size: u32,
    pub timeout: Duration,
}

impl NotionConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: env_string("NOTION_API_KEY"),
            database_id: env_string("NOTION_DATABASE_ID"),
            api_base: env_string("NOTION_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            notion_version: env_string("NOTION_VERSION")
                .unwrap_or_else(|| DEFAULT_NOTION_VERSION.to_string()),
            page_size: env_u64("NOTION_PAGE_SIZE")
                .map(|v| v.clamp(1, 100) as u32)
                .unwrap_or(DEFAULT_PAGE_SIZE),
            timeout: Duration::from_millis(env_u64("NOTION_TIMEOUT_MS").unwrap_or(DEFAULT_TIMEOUT_MS)),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.database_id.is_some()
    }
}

#[derive(Debug, Error)]
pub enum NotionError {
    #[error("notion not configured: {0}")]
    NotConfigured(&'static str),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// One page of a database query. Property values stay as raw JSON so that a row with an
/// unexpected shape still decodes and only the affected field falls back.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<NotionPage>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl QueryResponse {
    pub fn continuation(&self) -> Option<&str> {
        if !self.has_more {
            return None;
        }
        self.next_cursor.as_deref().filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotionPage {
    #[serde(default)]
    pub properties: HashMap<String, Value>,
}

impl NotionPage {
    /// First fragment of a `title` property.
    pub fn title_text(&self, name: &str) -> Option<String> {
        first_fragment(self.properties.get(name)?.get("title")?)
    }

    /// First fragment of a `rich_text` property.
    pub fn rich_text(&self, name: &str) -> Option<String> {
        first_fragment(self.properties.get(name)?.get("rich_text")?)
    }

    /// Option name of a `select` property.
    pub fn select_name(&self, name: &str) -> Option<String> {
        self.properties
            .get(name)?
            .get("select")?
            .get("name")?
            .as_str()
            .map(str::to_string)
    }
}

fn first_fragment(fragments: &Value) -> Option<String> {
    let first = fragments.as_array()?.first()?;
    first
        .get("text")
        .and_then(|t| t.get("content"))
        .or_else(|| first.get("plain_text"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_cursor: Option<&'a str>,
}

/// Anything that can hand out database query pages.
pub trait PageSource: Send + Sync {
    fn query_page<'a>(
        &'a self,
        cursor: Option<&'a str>,
    ) -> BoxFuture<'a, Result<QueryResponse, NotionError>>;
}

#[derive(Clone)]
pub struct NotionClient {
    config: NotionConfig,
    client: reqwest::Client,
}

impl NotionClient {
    /// Returns `None` when either credential is missing.
    pub fn from_config(config: NotionConfig) -> Option<Self> {
        if !config.is_configured() {
            return None;
        }

        let client = match reqwest::Client::builder().timeout(config.timeout).build() {
            Ok(client) => client,
            Err(err) => {
                tracing::warn!(error = %err, "failed to build notion http client");
                return None;
            }
        };

        Some(Self { config, client })
    }

    pub async fn query_database(
        &self,
        cursor: Option<&str>,
    ) -> Result<QueryResponse, NotionError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(NotionError::NotConfigured("NOTION_API_KEY"))?;
        let database_id = self
            .config
            .database_id
            .as_deref()
            .ok_or(NotionError::NotConfigured("NOTION_DATABASE_ID"))?;

        let url = format!(
            "{}/databases/{}/query",
            self.config.api_base.trim_end_matches('/'),
            database_id
        );
        let body = QueryRequest {
            page_size: self.config.page_size,
            start_cursor: cursor,
        };

        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .header("Notion-Version", &self.config.notion_version)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotionError::HttpStatus { status, body });
        }

        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl PageSource for NotionClient {
    fn query_page<'a>(
        &'a self,
        cursor: Option<&'a str>,
    ) -> BoxFuture<'a, Result<QueryResponse, NotionError>> {
        Box::pin(self.query_database(cursor))
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    env_string(key)?.parse().ok()
}
