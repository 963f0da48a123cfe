//! Built-in five-district table served when neither raw data nor a scored
//! table is available.

use super::classify::{classify_archetype, classify_tier};
use super::domain::{DistrictId, DistrictMetrics, ScoredDistrict, SubScores};
use super::table::DistrictTable;

struct SampleRow {
    name: &'static str,
    composite: f64,
    night_population: f64,
    monthly_sales: f64,
    sub_scores: [f64; 5],
}

const SAMPLE_ROWS: [SampleRow; 5] = [
    SampleRow {
        name: "강남역",
        composite: 46.8,
        night_population: 2_521_295.0,
        monthly_sales: 56_439_136_006.0,
        sub_scores: [100.0, 8.0, 27.0, 40.0, 34.0],
    },
    SampleRow {
        name: "홍대입구역",
        composite: 35.5,
        night_population: 1_624_245.0,
        monthly_sales: 27_852_500_000.0,
        sub_scores: [64.0, 6.0, 27.0, 14.0, 74.0],
    },
    SampleRow {
        name: "명동",
        composite: 38.8,
        night_population: 1_657_878.0,
        monthly_sales: 105_631_000_000.0,
        sub_scores: [65.0, 23.0, 27.0, 43.0, 18.0],
    },
    SampleRow {
        name: "신촌역",
        composite: 38.1,
        night_population: 2_150_525.0,
        monthly_sales: 20_004_622_800.0,
        sub_scores: [85.0, 3.0, 27.0, 9.0, 51.0],
    },
    SampleRow {
        name: "종로3가역",
        composite: 36.6,
        night_population: 1_775_563.0,
        monthly_sales: 35_012_517_932.0,
        sub_scores: [70.0, 7.0, 27.0, 31.0, 39.0],
    },
];

/// Sample rows keyed by name, with the stored composites taken as given.
pub fn sample_rows() -> Vec<ScoredDistrict> {
    SAMPLE_ROWS
        .iter()
        .map(|row| {
            let [night_traffic, sales_density, competition, vibrancy, alcohol_affinity] =
                row.sub_scores;
            ScoredDistrict {
                district_id: DistrictId(row.name.to_string()),
                district_name: row.name.to_string(),
                metrics: DistrictMetrics {
                    night_population: Some(row.night_population),
                    korean_food_sales: Some(row.monthly_sales),
                    ..Default::default()
                },
                coordinates: None,
                sub_scores: SubScores {
                    night_traffic,
                    sales_density,
                    competition,
                    vibrancy,
                    alcohol_affinity,
                },
                composite: row.composite,
                archetype: classify_archetype(row.name),
                tier: classify_tier(Some(row.monthly_sales)),
            }
        })
        .collect()
}

pub fn sample_table() -> DistrictTable {
    let mut rows = sample_rows();
    super::scoring::rank(&mut rows);
    DistrictTable::from_ranked(rows)
}
