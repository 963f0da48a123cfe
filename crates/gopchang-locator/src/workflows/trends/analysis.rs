use regex::Regex;
use serde::Serialize;

/// Menu keywords searched for trend signals, most important first.
pub const MENU_KEYWORDS: [&str; 6] = ["곱창", "막창", "대창", "양곱창", "곱창전골", "곱창구이"];

/// District names counted when they appear in a hit.
pub const DISTRICT_KEYWORDS: [&str; 10] = [
    "강남역", "종로", "명동", "신촌", "홍대", "노량진", "노원", "잠실", "여의도", "연남동",
];

pub const POSITIVE_WORDS: [&str; 8] = ["맛있", "좋", "추천", "대박", "부드러", "쫄깃", "고소", "감동"];
pub const NEGATIVE_WORDS: [&str; 7] = ["맛없", "별로", "실망", "최악", "비싸", "불친절", "더러"];

const TAG_PATTERN: &str = r"<[^>]+>";
const PRICE_PATTERN: &str = r"(\d{1,3}(?:,\d{3})*)(?:\s?원|₩)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Compiled text patterns shared across one collection run.
#[derive(Debug, Clone)]
pub struct TextSignals {
    tags: Regex,
    prices: Regex,
}

impl TextSignals {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            tags: Regex::new(TAG_PATTERN)?,
            prices: Regex::new(PRICE_PATTERN)?,
        })
    }

    /// Drops markup and decodes the few entities the search API emits.
    pub fn strip_tags(&self, text: &str) -> String {
        self.tags
            .replace_all(text, "")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&amp;", "&")
    }

    /// Counts distinct positive and negative words in the tag-free text; the
    /// larger side wins and a tie is neutral.
    pub fn sentiment(&self, text: &str) -> Sentiment {
        let clean = self.strip_tags(text);
        let positive = POSITIVE_WORDS.iter().filter(|w| clean.contains(*w)).count();
        let negative = NEGATIVE_WORDS.iter().filter(|w| clean.contains(*w)).count();
        match positive.cmp(&negative) {
            std::cmp::Ordering::Greater => Sentiment::Positive,
            std::cmp::Ordering::Less => Sentiment::Negative,
            std::cmp::Ordering::Equal => Sentiment::Neutral,
        }
    }

    /// Won amounts such as `15,000원` or `9000 원`.
    pub fn prices(&self, text: &str) -> Vec<u64> {
        self.prices
            .captures_iter(text)
            .filter_map(|caps| caps.get(1)?.as_str().replace(',', "").parse().ok())
            .collect()
    }
}

pub fn mentioned_districts(text: &str) -> Vec<&'static str> {
    DISTRICT_KEYWORDS
        .iter()
        .copied()
        .filter(|district| text.contains(district))
        .collect()
}
