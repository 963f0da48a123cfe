//! Name- and sales-based labels used for grouping and filtering only.

use super::domain::{Archetype, InvestmentTier};

/// Keyword sets in priority order. The first set with any keyword contained
/// in the district name decides the archetype.
pub const ARCHETYPE_KEYWORDS: [(Archetype, &[&str]); 5] = [
    (Archetype::PremiumBusiness, &["강남", "역삼", "선릉", "신논현"]),
    (Archetype::YouthCulture, &["홍대", "연남", "망리단"]),
    (Archetype::UniversityArea, &["신촌", "대학로", "신림", "건대"]),
    (Archetype::TouristTraditional, &["명동", "종로", "북창동", "관광특구"]),
    (
        Archetype::RegionalHub,
        &["노원", "수유", "불광", "영등포", "노량진"],
    ),
];

/// Monthly Korean-restaurant sales (KRW) at or above which a district is high tier.
pub const HIGH_TIER_MIN_SALES: f64 = 50_000_000_000.0;
/// Monthly Korean-restaurant sales (KRW) at or above which a district is mid tier.
pub const MID_TIER_MIN_SALES: f64 = 20_000_000_000.0;

/// First-match-wins over [`ARCHETYPE_KEYWORDS`]; unmatched names are `Mixed`.
pub fn classify_archetype(name: &str) -> Archetype {
    ARCHETYPE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| name.contains(keyword)))
        .map(|(archetype, _)| *archetype)
        .unwrap_or(Archetype::Mixed)
}

/// Lower bounds are inclusive. Missing or non-finite sales fall to `Low`.
pub fn classify_tier(monthly_sales: Option<f64>) -> InvestmentTier {
    match monthly_sales.filter(|sales| sales.is_finite()) {
        Some(sales) if sales >= HIGH_TIER_MIN_SALES => InvestmentTier::High,
        Some(sales) if sales >= MID_TIER_MIN_SALES => InvestmentTier::Mid,
        _ => InvestmentTier::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_districts_receive_expected_archetypes() {
        assert_eq!(classify_archetype("강남역"), Archetype::PremiumBusiness);
        assert_eq!(classify_archetype("홍대입구역"), Archetype::YouthCulture);
        assert_eq!(classify_archetype("신촌역"), Archetype::UniversityArea);
        assert_eq!(classify_archetype("명동"), Archetype::TouristTraditional);
        assert_eq!(classify_archetype("종로3가역"), Archetype::TouristTraditional);
        assert_eq!(classify_archetype("노량진역"), Archetype::RegionalHub);
        assert_eq!(classify_archetype("잠실새내역"), Archetype::Mixed);
        assert_eq!(classify_archetype(""), Archetype::Mixed);
    }

    #[test]
    fn higher_priority_set_wins_on_overlap() {
        assert_eq!(
            classify_archetype("강남 명동 관광특구"),
            Archetype::PremiumBusiness
        );
        assert_eq!(classify_archetype("종로 신촌"), Archetype::UniversityArea);
        assert_eq!(classify_archetype("영등포 홍대"), Archetype::YouthCulture);
    }

    #[test]
    fn tier_cutoffs_are_inclusive_on_the_lower_bound() {
        assert_eq!(classify_tier(Some(50_000_000_000.0)), InvestmentTier::High);
        assert_eq!(classify_tier(Some(49_999_999_999.0)), InvestmentTier::Mid);
        assert_eq!(classify_tier(Some(20_000_000_000.0)), InvestmentTier::Mid);
        assert_eq!(classify_tier(Some(19_999_999_999.0)), InvestmentTier::Low);
        assert_eq!(classify_tier(None), InvestmentTier::Low);
        assert_eq!(classify_tier(Some(f64::NAN)), InvestmentTier::Low);
    }
}
