use gopchang_locator::workflows::district::classify::{classify_archetype, classify_tier};
use gopchang_locator::workflows::district::sample::{sample_rows, sample_table};
use gopchang_locator::workflows::district::{
    Archetype, DistrictId, DistrictMetrics, DistrictTable, FilterOutcome, FilterSpec,
    InvestmentTier, ScoreRange, ScoredDistrict, Selector, SubScores,
};
use proptest::prelude::*;

const ARCHETYPES: [Archetype; 6] = [
    Archetype::PremiumBusiness,
    Archetype::YouthCulture,
    Archetype::UniversityArea,
    Archetype::TouristTraditional,
    Archetype::RegionalHub,
    Archetype::Mixed,
];
const TIERS: [InvestmentTier; 3] = [InvestmentTier::High, InvestmentTier::Mid, InvestmentTier::Low];

fn names(table: &DistrictTable) -> Vec<&str> {
    table
        .rows()
        .iter()
        .map(|row| row.district_name.as_str())
        .collect()
}

#[test]
fn sample_ranks_by_composite_descending() {
    let table = DistrictTable::new(sample_rows()).expect("unique ids");
    assert_eq!(
        names(&table),
        vec!["강남역", "명동", "신촌역", "종로3가역", "홍대입구역"]
    );
    let scores: Vec<f64> = table.rows().iter().map(|row| row.composite).collect();
    assert_eq!(scores, vec![46.8, 38.8, 38.1, 36.6, 35.5]);
}

#[test]
fn score_range_is_inclusive_and_summarised() {
    let table = sample_table();
    let spec = FilterSpec {
        score_range: ScoreRange::new(38.0, 40.0),
        ..FilterSpec::default()
    };
    let outcome = FilterOutcome::evaluate(&table, spec);

    assert_eq!(names(&outcome.rows), vec!["명동", "신촌역"]);
    assert_eq!(outcome.summary.count, 2);
    assert!((outcome.summary.mean_composite - 38.45).abs() < 1e-9);

    let edge = FilterOutcome::evaluate(
        &table,
        FilterSpec {
            score_range: ScoreRange::new(38.1, 38.8),
            ..FilterSpec::default()
        },
    );
    assert_eq!(edge.summary.count, 2);
}

#[test]
fn business_keyword_outranks_generic_keywords() {
    assert_eq!(classify_archetype("강남역"), Archetype::PremiumBusiness);
    assert_eq!(classify_archetype("강남역 관광특구"), Archetype::PremiumBusiness);
    assert_eq!(Archetype::PremiumBusiness.label(), "프리미엄 비즈니스");
}

#[test]
fn high_tier_cutoff_is_inclusive() {
    assert_eq!(classify_tier(Some(50_000_000_000.0)), InvestmentTier::High);
    assert_eq!(classify_tier(Some(49_999_999_999.0)), InvestmentTier::Mid);
    assert_eq!(classify_tier(Some(20_000_000_000.0)), InvestmentTier::Mid);
    assert_eq!(classify_tier(None), InvestmentTier::Low);
}

#[test]
fn empty_subset_has_neutral_aggregates() {
    let spec = FilterSpec {
        tier: Selector::Only(InvestmentTier::Low),
        ..FilterSpec::default()
    };
    let outcome = FilterOutcome::evaluate(&sample_table(), spec);
    assert!(outcome.is_empty());
    assert_eq!(outcome.summary.count, 0);
    assert_eq!(outcome.summary.mean_composite, 0.0);
    assert_eq!(outcome.summary.mean_night_population, 0.0);
    assert_eq!(outcome.summary.mean_monthly_sales, 0.0);
    assert!(outcome.summary.radar.is_none());
    assert!(outcome.summary.tiers.is_empty());
}

#[test]
fn unusable_ranges_select_everything() {
    let table = sample_table();
    for range in [
        ScoreRange::new(40.0, 38.0),
        ScoreRange::new(f64::NAN, 40.0),
        ScoreRange::from_bounds(None, None),
    ] {
        let spec = FilterSpec {
            score_range: range,
            ..FilterSpec::default()
        };
        assert_eq!(spec.apply(&table), table);
    }
}

fn district(idx: usize, composite: f64, archetype: usize, tier: usize) -> ScoredDistrict {
    ScoredDistrict {
        district_id: DistrictId(format!("{:07}", 3_110_000 + idx)),
        district_name: format!("district-{idx}"),
        metrics: DistrictMetrics::default(),
        coordinates: None,
        sub_scores: SubScores::default(),
        composite,
        archetype: ARCHETYPES[archetype],
        tier: TIERS[tier],
    }
}

fn arb_table() -> impl Strategy<Value = DistrictTable> {
    prop::collection::vec((0.0f64..100.0, 0usize..ARCHETYPES.len(), 0usize..TIERS.len()), 0..24)
        .prop_map(|rows| {
            let rows = rows
                .into_iter()
                .enumerate()
                .map(|(idx, (composite, archetype, tier))| district(idx, composite, archetype, tier))
                .collect();
            DistrictTable::new(rows).expect("generated ids are unique")
        })
}

fn arb_spec() -> impl Strategy<Value = FilterSpec> {
    (
        prop::option::of(0usize..ARCHETYPES.len()),
        prop::option::of(0usize..TIERS.len()),
        prop::option::of(0.0f64..100.0),
        prop::option::of(0.0f64..100.0),
    )
        .prop_map(|(archetype, tier, min, max)| FilterSpec {
            archetype: archetype.map_or(Selector::All, |idx| Selector::Only(ARCHETYPES[idx])),
            tier: tier.map_or(Selector::All, |idx| Selector::Only(TIERS[idx])),
            score_range: ScoreRange::from_bounds(min, max),
        })
}

proptest! {
    #[test]
    fn filtering_is_idempotent(table in arb_table(), spec in arb_spec()) {
        let once = spec.apply(&table);
        let twice = spec.apply(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn predicates_commute(table in arb_table(), spec in arb_spec()) {
        let only_archetype = FilterSpec { archetype: spec.archetype, ..FilterSpec::default() };
        let only_tier = FilterSpec { tier: spec.tier, ..FilterSpec::default() };
        let only_range = FilterSpec { score_range: spec.score_range, ..FilterSpec::default() };

        let combined = spec.apply(&table);
        let forward = only_range.apply(&only_tier.apply(&only_archetype.apply(&table)));
        let backward = only_archetype.apply(&only_tier.apply(&only_range.apply(&table)));
        prop_assert_eq!(&combined, &forward);
        prop_assert_eq!(&combined, &backward);
    }

    #[test]
    fn filtered_rows_keep_rank_order_and_finite_means(table in arb_table(), spec in arb_spec()) {
        let outcome = FilterOutcome::evaluate(&table, spec);
        prop_assert!(outcome.rows.len() <= table.len());
        prop_assert!(outcome
            .rows
            .rows()
            .windows(2)
            .all(|pair| pair[0].composite >= pair[1].composite));
        prop_assert!(outcome.summary.mean_composite.is_finite());
        prop_assert!((0.0..=100.0).contains(&outcome.summary.mean_composite));
        let tier_total: usize = outcome.summary.tiers.iter().map(|group| group.count).sum();
        prop_assert_eq!(tier_total, outcome.summary.count);
    }
}
