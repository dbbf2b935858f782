//! Web search adapter over third-party search APIs.
//!
//! The pipeline treats search as best effort. Provider failures are logged
//! and swallowed; callers always get a (possibly empty) result list and
//! never an error.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sourcing_core::config::SearchConfig;
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .context("failed to build HTTP client")
}

pub struct TavilySearch {
    http: reqwest::Client,
    api_key: SecretString,
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

impl TavilySearch {
    pub fn new(api_key: SecretString, timeout_secs: u64) -> Result<Self> {
        Ok(Self { http: http_client(timeout_secs)?, api_key })
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    fn name(&self) -> &'static str {
        "tavily"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let request = TavilyRequest {
            api_key: self.api_key.expose_secret(),
            query,
            max_results,
        };
        let response = self
            .http
            .post("https://api.tavily.com/search")
            .json(&request)
            .send()
            .await
            .context("Tavily request failed")?
            .error_for_status()
            .context("Tavily returned an error status")?;

        let body: TavilyResponse =
            response.json().await.context("failed to decode Tavily response")?;
        Ok(body
            .results
            .into_iter()
            .take(max_results)
            .map(|result| SearchHit {
                title: result.title,
                url: result.url,
                snippet: result.content,
            })
            .collect())
    }
}

pub struct SerperSearch {
    http: reqwest::Client,
    api_key: SecretString,
}

#[derive(Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperResult>,
}

#[derive(Deserialize)]
struct SerperResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

impl SerperSearch {
    pub fn new(api_key: SecretString, timeout_secs: u64) -> Result<Self> {
        Ok(Self { http: http_client(timeout_secs)?, api_key })
    }
}

#[async_trait]
impl SearchProvider for SerperSearch {
    fn name(&self) -> &'static str {
        "serper"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let request = SerperRequest { q: query, num: max_results };
        let response = self
            .http
            .post("https://google.serper.dev/search")
            .header("X-API-KEY", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .context("Serper request failed")?
            .error_for_status()
            .context("Serper returned an error status")?;

        let body: SerperResponse =
            response.json().await.context("failed to decode Serper response")?;
        Ok(body
            .organic
            .into_iter()
            .take(max_results)
            .map(|result| SearchHit {
                title: result.title,
                url: result.link,
                snippet: result.snippet,
            })
            .collect())
    }
}

/// Best-effort facade over whichever provider has a configured credential,
/// Tavily first.
pub struct WebSearch {
    provider: Option<Box<dyn SearchProvider>>,
}

impl WebSearch {
    pub fn from_config(config: &SearchConfig) -> Self {
        let provider: Option<Box<dyn SearchProvider>> =
            if let Some(api_key) = &config.tavily_api_key {
                TavilySearch::new(api_key.clone(), config.timeout_secs)
                    .map(|p| Box::new(p) as Box<dyn SearchProvider>)
                    .ok()
            } else if let Some(api_key) = &config.serper_api_key {
                SerperSearch::new(api_key.clone(), config.timeout_secs)
                    .map(|p| Box::new(p) as Box<dyn SearchProvider>)
                    .ok()
            } else {
                None
            };
        Self { provider }
    }

    pub fn with_provider(provider: Box<dyn SearchProvider>) -> Self {
        Self { provider: Some(provider) }
    }

    pub fn disabled() -> Self {
        Self { provider: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Run one query against the configured provider. Failures and missing
    /// credentials both degrade to an empty list.
    pub async fn search(&self, query: &str, max_results: usize) -> Vec<SearchHit> {
        let Some(provider) = &self.provider else {
            warn!(query, "no search credential configured, returning no results");
            return Vec::new();
        };

        match provider.search(query, max_results).await {
            Ok(hits) => hits,
            Err(error) => {
                warn!(provider = provider.name(), query, %error, "search failed");
                Vec::new()
            }
        }
    }

    /// Issue the four fixed supplier-discovery query variants sequentially,
    /// returning one formatted text blob per variant. Blobs are neither
    /// merged nor deduplicated; a failing variant yields an empty blob.
    pub async fn search_suppliers(&self, product_category: &str, location: &str) -> Vec<String> {
        let queries = supplier_queries(product_category, location);
        let mut blobs = Vec::with_capacity(queries.len());
        for query in &queries {
            let hits = self.search(query, 5).await;
            blobs.push(render_hits(&hits));
        }
        blobs
    }
}

fn supplier_queries(product_category: &str, location: &str) -> [String; 4] {
    let location_filter =
        if location.is_empty() { String::new() } else { format!(" in {location}") };
    [
        format!("{product_category} suppliers{location_filter}"),
        format!("{product_category} manufacturers{location_filter}"),
        format!("{product_category} distributors{location_filter}"),
        format!("wholesale {product_category}{location_filter}"),
    ]
}

/// Numbered title/URL/snippet blocks, the shape prompts embed verbatim.
pub fn render_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(index, hit)| {
            format!(
                "{}. {}\n   URL: {}\n   Snippet: {}",
                index + 1,
                hit.title,
                hit.url,
                hit.snippet
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    use super::{render_hits, supplier_queries, SearchHit, SearchProvider, WebSearch};

    struct FixedProvider(Vec<SearchHit>);

    #[async_trait]
    impl SearchProvider for FixedProvider {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn search(&self, _query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
            Ok(self.0.iter().take(max_results).cloned().collect())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl SearchProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchHit>> {
            Err(anyhow!("provider unavailable"))
        }
    }

    fn hit(title: &str) -> SearchHit {
        SearchHit {
            title: title.to_string(),
            url: format!("https://example.com/{title}"),
            snippet: format!("{title} snippet"),
        }
    }

    #[test]
    fn supplier_queries_cover_four_variants_with_location() {
        let queries = supplier_queries("industrial sensors", "Asia");
        assert_eq!(
            queries,
            [
                "industrial sensors suppliers in Asia".to_string(),
                "industrial sensors manufacturers in Asia".to_string(),
                "industrial sensors distributors in Asia".to_string(),
                "wholesale industrial sensors in Asia".to_string(),
            ]
        );
    }

    #[test]
    fn supplier_queries_omit_location_filter_when_empty() {
        let queries = supplier_queries("bearings", "");
        assert_eq!(queries[0], "bearings suppliers");
        assert_eq!(queries[3], "wholesale bearings");
    }

    #[test]
    fn hits_render_as_numbered_blocks() {
        let rendered = render_hits(&[hit("Acme"), hit("Globex")]);
        assert!(rendered.starts_with("1. Acme\n"));
        assert!(rendered.contains("2. Globex"));
        assert!(rendered.contains("URL: https://example.com/Acme"));
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_empty_results() {
        let search = WebSearch::with_provider(Box::new(FailingProvider));
        let hits = search.search("electronic components suppliers", 5).await;
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn missing_credential_degrades_to_empty_results() {
        let search = WebSearch::disabled();
        assert!(!search.is_enabled());
        let hits = search.search("anything", 5).await;
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn search_suppliers_returns_one_blob_per_variant() {
        let search = WebSearch::with_provider(Box::new(FixedProvider(vec![hit("Acme")])));
        let blobs = search.search_suppliers("electronic components", "Europe").await;
        assert_eq!(blobs.len(), 4);
        for blob in &blobs {
            assert!(blob.contains("1. Acme"));
        }
    }
}
