#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use futures::future::BoxFuture;
use serde_json::{json, Value};

use tango_backend::config::Config;
use tango_backend::services::notion::{NotionError, PageSource, QueryResponse};
use tango_backend::services::vocab::{FieldMapping, VocabFetcher};
use tango_backend::state::AppState;
use tango_backend::store::MemoryStore;

/// Serves one fixed page of database rows.
pub struct FixedSource {
    page: Value,
}

impl FixedSource {
    pub fn new(rows: &[(&str, &str, &str, &str)]) -> Self {
        let results: Vec<Value> = rows
            .iter()
            .map(|(headword, reading, translation, level)| {
                json!({
                    "properties": {
                        "日文": { "title": [{ "text": { "content": headword } }] },
                        "讀音": { "rich_text": [{ "plain_text": reading }] },
                        "中文": { "rich_text": [{ "text": { "content": translation } }] },
                        "等級": { "select": { "name": level } }
                    }
                })
            })
            .collect();
        Self {
            page: json!({ "results": results, "has_more": false, "next_cursor": null }),
        }
    }
}

impl PageSource for FixedSource {
    fn query_page<'a>(
        &'a self,
        _cursor: Option<&'a str>,
    ) -> BoxFuture<'a, Result<QueryResponse, NotionError>> {
        let page = self.page.clone();
        Box::pin(async move { Ok(serde_json::from_value(page)?) })
    }
}

pub fn six_words() -> FixedSource {
    FixedSource::new(&[
        ("家族", "かぞく", "家人", "N5"),
        ("両親", "りょうしん", "父母", "N5"),
        ("先生", "せんせい", "老師", "N5"),
        ("学生", "がくせい", "學生", "N5"),
        ("経験", "けいけん", "經驗", "N4"),
        ("約束", "やくそく", "約定", "N4"),
    ])
}

fn test_config() -> Config {
    Config {
        auto_advance: Duration::ZERO,
        ..Config::default()
    }
}

/// App serving the fallback vocabulary.
pub fn create_test_app() -> Router {
    build(None)
}

pub fn create_test_app_with(source: FixedSource) -> Router {
    build(Some(Arc::new(source)))
}

fn build(source: Option<Arc<dyn PageSource>>) -> Router {
    let fetcher = VocabFetcher::new(source, FieldMapping::default());
    let state = AppState::new(test_config(), fetcher, Arc::new(MemoryStore::new()));
    tango_backend::create_app(state)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
