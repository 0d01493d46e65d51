use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::notion::{NotionError, NotionPage, PageSource};

pub const DEFAULT_LEVEL: &str = "N5";
const DEFAULT_MAX_PAGES: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabEntry {
    pub headword: String,
    pub reading: String,
    pub translation: String,
    pub level: String,
}

impl VocabEntry {
    pub fn new(headword: &str, reading: &str, translation: &str, level: &str) -> Self {
        Self {
            headword: headword.to_string(),
            reading: reading.to_string(),
            translation: translation.to_string(),
            level: level.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabPayload {
    pub vocab_list: Vec<VocabEntry>,
    pub levels: Vec<String>,
}

impl VocabPayload {
    /// Served whenever the upstream database is unavailable.
    pub fn fallback() -> Self {
        Self {
            vocab_list: vec![
                VocabEntry::new("家族", "かぞく", "家人", "N5"),
                VocabEntry::new("両親", "りょうしん", "父母", "N5"),
                VocabEntry::new("先生", "せんせい", "老師", "N5"),
            ],
            levels: vec!["N5".to_string(), "N4".to_string()],
        }
    }

    pub fn from_entries(vocab_list: Vec<VocabEntry>) -> Self {
        let levels = distinct_levels(&vocab_list);
        Self { vocab_list, levels }
    }
}

/// Sorted, de-duplicated level values.
pub fn distinct_levels(entries: &[VocabEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| e.level.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Database property names for each record field.
#[derive(Debug, Clone)]
pub struct FieldMapping {
    pub headword: String,
    pub reading: String,
    pub translation: String,
    pub level: String,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            headword: "日文".to_string(),
            reading: "讀音".to_string(),
            translation: "中文".to_string(),
            level: "等級".to_string(),
        }
    }
}

impl FieldMapping {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            headword: env_or("NOTION_FIELD_HEADWORD", defaults.headword),
            reading: env_or("NOTION_FIELD_READING", defaults.reading),
            translation: env_or("NOTION_FIELD_TRANSLATION", defaults.translation),
            level: env_or("NOTION_FIELD_LEVEL", defaults.level),
        }
    }

    pub fn map_page(&self, page: &NotionPage) -> VocabEntry {
        let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).unwrap_or_default();

        let level = clean(page.select_name(&self.level));
        VocabEntry {
            headword: clean(page.title_text(&self.headword)),
            reading: clean(page.rich_text(&self.reading)),
            translation: clean(page.rich_text(&self.translation)),
            level: if level.is_empty() {
                DEFAULT_LEVEL.to_string()
            } else {
                level
            },
        }
    }
}

pub struct VocabFetcher {
    source: Option<Arc<dyn PageSource>>,
    mapping: FieldMapping,
    max_pages: usize,
}

impl VocabFetcher {
    pub fn new(source: Option<Arc<dyn PageSource>>, mapping: FieldMapping) -> Self {
        Self {
            source,
            mapping,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn from_env(source: Option<Arc<dyn PageSource>>) -> Self {
        let max_pages = std::env::var("NOTION_MAX_PAGES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_MAX_PAGES);
        Self::new(source, FieldMapping::from_env()).with_max_pages(max_pages)
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn is_configured(&self) -> bool {
        self.source.is_some()
    }

    /// Never fails: any upstream problem yields [`VocabPayload::fallback`].
    pub async fn fetch(&self) -> VocabPayload {
        let Some(source) = self.source.as_deref() else {
            tracing::info!("notion credentials missing, serving fallback vocabulary");
            return VocabPayload::fallback();
        };

        match self.fetch_all(source).await {
            Ok(pages) => {
                let entries: Vec<VocabEntry> = pages
                    .iter()
                    .map(|page| self.mapping.map_page(page))
                    .filter(|entry| !entry.headword.is_empty())
                    .collect();
                tracing::debug!(rows = pages.len(), kept = entries.len(), "vocabulary fetched");
                VocabPayload::from_entries(entries)
            }
            Err(err) => {
                tracing::error!(error = %err, "notion query failed, serving fallback vocabulary");
                VocabPayload::fallback()
            }
        }
    }

    async fn fetch_all(&self, source: &dyn PageSource) -> Result<Vec<NotionPage>, NotionError> {
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;

        for page_no in 0..self.max_pages {
            let response = source.query_page(cursor.as_deref()).await?;
            let next = response.continuation().map(str::to_string);
            pages.extend(response.results);

            match next {
                Some(next) => cursor = Some(next),
                None => return Ok(pages),
            }

            if page_no + 1 == self.max_pages {
                tracing::warn!(
                    max_pages = self.max_pages,
                    rows = pages.len(),
                    "notion pagination ceiling reached, using rows fetched so far"
                );
            }
        }

        Ok(pages)
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}
