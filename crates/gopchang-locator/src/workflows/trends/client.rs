use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::config::NaverCredentials;

pub const NAVER_SEARCH_BASE: &str = "https://openapi.naver.com/v1/search";
/// Pause after every request to stay inside the API rate limit.
pub const REQUEST_PAUSE: Duration = Duration::from_millis(200);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_DISPLAY: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchEndpoint {
    News,
    Blog,
    Cafe,
}

impl SearchEndpoint {
    pub const fn ordered() -> [Self; 3] {
        [Self::News, Self::Blog, Self::Cafe]
    }

    pub const fn path(self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Blog => "blog",
            Self::Cafe => "cafearticle",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Blog => "blog",
            Self::Cafe => "cafe",
        }
    }
}

impl fmt::Display for SearchEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub endpoint: SearchEndpoint,
    pub query: String,
    pub display: u32,
    pub pages: u32,
}

impl SearchQuery {
    pub fn new(endpoint: SearchEndpoint, query: impl Into<String>) -> Self {
        Self {
            endpoint,
            query: query.into(),
            display: DEFAULT_DISPLAY,
            pages: 1,
        }
    }

    pub fn with_display(mut self, display: u32) -> Self {
        self.display = display.max(1);
        self
    }

    /// 1-based `start` offset of a zero-based page.
    pub fn start(&self, page: u32) -> u32 {
        page * self.display + 1
    }
}

/// One search hit. Titles and descriptions still carry the API's `<b>` markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "pubDate", default, skip_serializing_if = "Option::is_none")]
    pub pub_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

/// Network, auth or payload failure from a search collaborator. Callers skip
/// the offending query and keep going.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamServiceError {
    #[error("search request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{endpoint} search returned HTTP {status}")]
    Status {
        endpoint: SearchEndpoint,
        status: u16,
    },
    #[error("search service unavailable: {0}")]
    Unavailable(String),
}

pub trait SearchGateway: Send + Sync {
    fn search(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<Vec<SearchItem>, UpstreamServiceError>> + Send;
}

/// Naver open search API over `reqwest`.
pub struct NaverSearchClient {
    http: reqwest::Client,
    base_url: String,
    credentials: NaverCredentials,
    pause: Duration,
}

impl NaverSearchClient {
    pub fn new(credentials: NaverCredentials) -> Result<Self, UpstreamServiceError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: NAVER_SEARCH_BASE.to_string(),
            credentials,
            pause: REQUEST_PAUSE,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    async fn page(
        &self,
        query: &SearchQuery,
        page: u32,
    ) -> Result<Vec<SearchItem>, UpstreamServiceError> {
        let url = format!(
            "{}/{}.json",
            self.base_url.trim_end_matches('/'),
            query.endpoint.path()
        );
        let response = self
            .http
            .get(&url)
            .header("X-Naver-Client-Id", &self.credentials.client_id)
            .header("X-Naver-Client-Secret", &self.credentials.client_secret)
            .query(&[
                ("query", query.query.clone()),
                ("display", query.display.to_string()),
                ("start", query.start(page).to_string()),
                ("sort", "date".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamServiceError::Status {
                endpoint: query.endpoint,
                status: status.as_u16(),
            });
        }
        let body: SearchResponse = response.json().await?;
        tokio::time::sleep(self.pause).await;
        Ok(body.items)
    }
}

impl fmt::Debug for NaverSearchClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NaverSearchClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SearchGateway for NaverSearchClient {
    /// Pages until a short page signals the end of results.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchItem>, UpstreamServiceError> {
        let mut items = Vec::new();
        for page in 0..query.pages.max(1) {
            let batch = self.page(query, page).await?;
            let short = (batch.len() as u32) < query.display;
            items.extend(batch);
            if short {
                break;
            }
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_offsets_follow_display() {
        let query = SearchQuery::new(SearchEndpoint::Blog, "곱창").with_display(50);
        assert_eq!(query.start(0), 1);
        assert_eq!(query.start(2), 101);
        assert_eq!(SearchEndpoint::Cafe.path(), "cafearticle");
    }

    #[test]
    fn parses_search_payload() {
        let raw = r#"{"lastBuildDate":"x","items":[
            {"title":"<b>곱창</b> 맛집","link":"https://a","description":"쫄깃","pubDate":"Mon, 06 Oct 2025 10:00:00 +0900"},
            {"title":"blog","link":"https://b","description":"","postdate":"20251006"}
        ]}"#;
        let parsed: SearchResponse = serde_json::from_str(raw).expect("payload");
        assert_eq!(parsed.items.len(), 2);
        assert_eq!(
            parsed.items[0].pub_date.as_deref(),
            Some("Mon, 06 Oct 2025 10:00:00 +0900")
        );
        assert_eq!(parsed.items[1].pub_date, None);
    }

    #[test]
    fn debug_output_hides_credentials() {
        let client = NaverSearchClient::new(NaverCredentials {
            client_id: "id-value".to_string(),
            client_secret: "secret-value".to_string(),
        })
        .expect("client");
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("secret-value"));
    }
}
