//! Online trend signals for the menu: search hits, sentiment, district
//! mentions and quoted prices.

pub mod analysis;
pub mod client;

pub use analysis::{Sentiment, TextSignals};
pub use client::{
    NaverSearchClient, SearchEndpoint, SearchGateway, SearchItem, SearchQuery,
    UpstreamServiceError,
};

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

use analysis::{mentioned_districts, DISTRICT_KEYWORDS, MENU_KEYWORDS};

/// Menu keywords searched on every endpoint.
pub const HEADLINE_KEYWORDS: usize = 3;
/// Districts and keywords combined into blog queries.
pub const DISTRICT_QUERY_DISTRICTS: usize = 5;
pub const DISTRICT_QUERY_KEYWORDS: usize = 2;
pub const DISTRICT_QUERY_DISPLAY: u32 = 50;
pub const DEFAULT_WINDOW_DAYS: i64 = 30;
const MAX_WINDOW_DAYS: i64 = 36_500;

#[derive(Debug, thiserror::Error)]
pub enum TrendError {
    #[error("invalid text pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error(transparent)]
    Upstream(#[from] UpstreamServiceError),
}

/// One preprocessed search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendRecord {
    pub source: SearchEndpoint,
    pub query: String,
    pub title: String,
    pub description: String,
    pub link: String,
    pub published: Option<DateTime<FixedOffset>>,
    pub sentiment: Sentiment,
    pub districts: Vec<&'static str>,
    pub prices: Vec<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceStats {
    pub count: usize,
    pub min: u64,
    pub max: u64,
    pub median: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub total: usize,
    pub failed_queries: usize,
    pub by_source: BTreeMap<SearchEndpoint, usize>,
    pub by_sentiment: BTreeMap<Sentiment, usize>,
    /// Mention counts, most mentioned first, ties by name.
    pub district_mentions: Vec<(String, usize)>,
    pub prices: Option<PriceStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub records: Vec<TrendRecord>,
    pub summary: TrendSummary,
}

pub struct TrendAnalyzer<G> {
    gateway: G,
    signals: TextSignals,
}

impl<G: SearchGateway> TrendAnalyzer<G> {
    pub fn new(gateway: G) -> Result<Self, TrendError> {
        Ok(Self {
            gateway,
            signals: TextSignals::new()?,
        })
    }

    /// Headline keywords on every endpoint, then district-qualified blog
    /// searches.
    pub fn queries() -> Vec<SearchQuery> {
        let mut queries = Vec::new();
        for keyword in &MENU_KEYWORDS[..HEADLINE_KEYWORDS] {
            for endpoint in SearchEndpoint::ordered() {
                queries.push(SearchQuery::new(endpoint, *keyword));
            }
        }
        for district in &DISTRICT_KEYWORDS[..DISTRICT_QUERY_DISTRICTS] {
            for keyword in &MENU_KEYWORDS[..DISTRICT_QUERY_KEYWORDS] {
                queries.push(
                    SearchQuery::new(SearchEndpoint::Blog, format!("{district} {keyword}"))
                        .with_display(DISTRICT_QUERY_DISPLAY),
                );
            }
        }
        queries
    }

    /// Runs every query, skipping the ones that fail. Hits published before
    /// `now - days` are dropped; hits without a parseable date are kept.
    pub async fn collect(&self, days: i64, now: DateTime<Utc>) -> TrendReport {
        let cutoff = now - Duration::days(days.clamp(0, MAX_WINDOW_DAYS));
        let mut records = Vec::new();
        let mut failed = 0usize;

        for query in Self::queries() {
            match self.gateway.search(&query).await {
                Ok(items) => {
                    let before = records.len();
                    records.extend(
                        items
                            .into_iter()
                            .map(|item| self.preprocess(&query, item))
                            .filter(|record| is_recent(record, cutoff)),
                    );
                    info!(
                        source = %query.endpoint,
                        query = %query.query,
                        kept = records.len() - before,
                        "collected search hits"
                    );
                }
                Err(err) => {
                    failed += 1;
                    warn!(source = %query.endpoint, query = %query.query, error = %err, "search failed; skipping");
                }
            }
        }

        let summary = summarize(&records, failed);
        TrendReport { records, summary }
    }

    pub fn preprocess(&self, query: &SearchQuery, item: SearchItem) -> TrendRecord {
        let raw = format!("{} {}", item.title, item.description);
        TrendRecord {
            source: query.endpoint,
            query: query.query.clone(),
            sentiment: self.signals.sentiment(&raw),
            districts: mentioned_districts(&raw),
            prices: self.signals.prices(&raw),
            published: item
                .pub_date
                .as_deref()
                .and_then(|date| DateTime::parse_from_rfc2822(date).ok()),
            title: self.signals.strip_tags(&item.title),
            description: self.signals.strip_tags(&item.description),
            link: item.link,
        }
    }
}

fn is_recent(record: &TrendRecord, cutoff: DateTime<Utc>) -> bool {
    record
        .published
        .map(|published| published >= cutoff)
        .unwrap_or(true)
}

pub fn summarize(records: &[TrendRecord], failed_queries: usize) -> TrendSummary {
    let mut by_source = BTreeMap::new();
    let mut by_sentiment = BTreeMap::new();
    let mut mentions: BTreeMap<&str, usize> = BTreeMap::new();
    let mut prices = Vec::new();

    for record in records {
        *by_source.entry(record.source).or_insert(0) += 1;
        *by_sentiment.entry(record.sentiment).or_insert(0) += 1;
        for district in &record.districts {
            *mentions.entry(*district).or_insert(0) += 1;
        }
        prices.extend_from_slice(&record.prices);
    }

    let mut district_mentions: Vec<(String, usize)> = mentions
        .into_iter()
        .map(|(district, count)| (district.to_string(), count))
        .collect();
    district_mentions.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    TrendSummary {
        total: records.len(),
        failed_queries,
        by_source,
        by_sentiment,
        district_mentions,
        prices: price_stats(prices),
    }
}

fn price_stats(mut prices: Vec<u64>) -> Option<PriceStats> {
    prices.sort_unstable();
    let (first, last) = (*prices.first()?, *prices.last()?);
    let mid = prices.len() / 2;
    let median = if prices.len() % 2 == 0 {
        (prices[mid - 1] as f64 + prices[mid] as f64) / 2.0
    } else {
        prices[mid] as f64
    };
    Some(PriceStats {
        count: prices.len(),
        min: first,
        max: last,
        median,
    })
}
