//! Known column spellings across the Seoul commercial-district exports.
//!
//! Source files arrive with Korean headers, the English codes used by the
//! boundary shapefile export, or the English names produced by the
//! `rename-columns` utility. Lookups try each alias in order.

pub const DISTRICT_KEY: &str = "상권_코드";
pub const DISTRICT_NAME: &str = "상권_코드_명";

pub const DISTRICT_KEY_ALIASES: &[&str] = &[DISTRICT_KEY, "TRDAR_CD", "market_code"];
pub const DISTRICT_NAME_ALIASES: &[&str] = &[DISTRICT_NAME, "TRDAR_CD_N", "market_name"];
pub const PERIOD_ALIASES: &[&str] = &["기준_년분기_코드", "STDR_YYQU_CD", "period_quarter"];

pub const X_COORD_ALIASES: &[&str] = &["엑스좌표_값", "XCNTS_VALUE", "x_coord"];
pub const Y_COORD_ALIASES: &[&str] = &["와이좌표_값", "YDNTS_VALUE", "y_coord"];

pub const NIGHT_FLOW_ALIASES: &[&str] = &[
    "T1_야간유동인구",
    "야간_유동인구_수",
    "night_flow_population",
];
pub const FLOW_ALIASES: &[&str] = &["유동인구_수", "총_유동인구_수", "flow_population"];
pub const FACILITY_ALIASES: &[&str] = &["집객시설_수", "facility_count"];
pub const COMPETITOR_ALIASES: &[&str] = &["곱창_점포_수", "competitor_count"];
pub const RESIDENT_TOTAL_ALIASES: &[&str] = &["총_상주인구_수", "resident_total"];
pub const RESIDENT_MALE_ALIASES: &[&str] = &["남성_상주인구_수", "resident_male"];
pub const RESIDENT_FEMALE_ALIASES: &[&str] = &["여성_상주인구_수", "resident_female"];
pub const INCOME_ALIASES: &[&str] = &["총_가구당_소득_평균", "avg_income_per_household"];
pub const KOREAN_SALES_ALIASES: &[&str] = &["한식_월매출", "한식_매출_금액", "korean_food_sales"];

/// Fixed Korean→English rename table applied by the `rename-columns` utility.
pub const COLUMN_MAP: &[(&str, &str)] = &[
    ("상권_코드", "market_code"),
    ("상권_코드_명", "market_name"),
    ("기준_년분기_코드", "period_quarter"),
    ("총_상주인구_수", "resident_total"),
    ("남성_상주인구_수", "resident_male"),
    ("여성_상주인구_수", "resident_female"),
    ("집객시설_수", "facility_count"),
    ("관공서_수", "public_office_count"),
    ("총_가구당_소득_평균", "avg_income_per_household"),
    ("유동인구_수", "flow_population"),
    ("야간_유동인구_수", "night_flow_population"),
    ("한식_매출_금액", "korean_food_sales"),
    ("곱창_점포_수", "competitor_count"),
];

pub fn english_name(column: &str) -> Option<&'static str> {
    COLUMN_MAP
        .iter()
        .find(|(korean, _)| *korean == column)
        .map(|(_, english)| *english)
}

/// Strips byte-order marks and zero-width characters that survive encoding
/// conversion and collapses inner whitespace.
pub fn normalize_header(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First alias present in `columns`, returning its index.
pub fn find_column(columns: &[String], aliases: &[&str]) -> Option<usize> {
    aliases
        .iter()
        .find_map(|alias| columns.iter().position(|column| column == alias))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_normalization_drops_bom() {
        assert_eq!(normalize_header("\u{feff}상권_코드 "), "상권_코드");
        assert_eq!(normalize_header("유동인구\u{200b}_수"), "유동인구_수");
    }

    #[test]
    fn alias_order_prefers_korean_key() {
        let columns = vec!["market_code".to_string(), "상권_코드".to_string()];
        assert_eq!(find_column(&columns, DISTRICT_KEY_ALIASES), Some(1));
        let columns = vec!["TRDAR_CD".to_string()];
        assert_eq!(find_column(&columns, DISTRICT_KEY_ALIASES), Some(0));
    }

    #[test]
    fn every_renamed_metric_is_still_resolvable() {
        for (korean, english) in COLUMN_MAP {
            assert_eq!(english_name(korean), Some(*english));
        }
        let renamed = vec!["flow_population".to_string()];
        assert_eq!(find_column(&renamed, FLOW_ALIASES), Some(0));
    }
}
