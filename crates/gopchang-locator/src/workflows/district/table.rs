use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

use super::domain::{Coordinates, DistrictId, DistrictMetrics, DistrictRecord, ScoredDistrict};
use super::scoring::{rank, ScoringEngine};
use crate::workflows::ingest::aliases::{
    COMPETITOR_ALIASES, DISTRICT_KEY_ALIASES, DISTRICT_NAME_ALIASES, FACILITY_ALIASES,
    FLOW_ALIASES, INCOME_ALIASES, KOREAN_SALES_ALIASES, NIGHT_FLOW_ALIASES,
    RESIDENT_FEMALE_ALIASES, RESIDENT_MALE_ALIASES, RESIDENT_TOTAL_ALIASES, X_COORD_ALIASES,
    Y_COORD_ALIASES,
};
use crate::workflows::ingest::{
    value_text, Crs, Feature, FeatureCollection, IngestError, Reprojection, SchemaError,
    JOINED_SOURCES, MASTER_LAYER,
};

/// The scored, labelled districts in rank order. Built once per refresh and
/// never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistrictTable {
    rows: Vec<ScoredDistrict>,
}

impl DistrictTable {
    /// Ranks `rows` and rejects duplicate district ids.
    pub fn new(mut rows: Vec<ScoredDistrict>) -> Result<Self, IngestError> {
        let mut seen = HashSet::with_capacity(rows.len());
        for row in &rows {
            if !seen.insert(&row.district_id) {
                return Err(IngestError::DuplicateDistrict {
                    source_name: "district table".to_string(),
                    key: row.district_id.to_string(),
                });
            }
        }
        rank(&mut rows);
        Ok(Self { rows })
    }

    /// Rows already known to be unique and ranked, e.g. a filtered subset.
    pub(crate) fn from_ranked(rows: Vec<ScoredDistrict>) -> Self {
        Self { rows }
    }

    pub fn from_master(
        master: &FeatureCollection,
        crs: Crs,
        engine: &ScoringEngine,
    ) -> Result<Self, IngestError> {
        let records = records_from_master(master, crs)?;
        Self::new(engine.score(records))
    }

    pub fn rows(&self) -> &[ScoredDistrict] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn top(&self, n: usize) -> &[ScoredDistrict] {
        &self.rows[..n.min(self.rows.len())]
    }

    pub fn get(&self, id: &DistrictId) -> Option<&ScoredDistrict> {
        self.rows.iter().find(|row| &row.district_id == id)
    }
}

/// Reads district metrics out of the joined master layer. Coordinates come
/// from the resident x/y columns when joined, else from the boundary centroid.
pub fn records_from_master(
    master: &FeatureCollection,
    crs: Crs,
) -> Result<Vec<DistrictRecord>, IngestError> {
    let to_wgs84 = crs.reprojection(Crs::Wgs84)?;
    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(master.features.len());
    for feature in &master.features {
        let id = find_text(feature, DISTRICT_KEY_ALIASES).ok_or_else(|| SchemaError {
            source_name: MASTER_LAYER.to_string(),
            expected: DISTRICT_KEY_ALIASES.iter().map(|a| a.to_string()).collect(),
            columns: feature.properties.keys().cloned().collect(),
        })?;
        if !seen.insert(id.clone()) {
            return Err(IngestError::DuplicateDistrict {
                source_name: MASTER_LAYER.to_string(),
                key: id,
            });
        }
        let name = find_text(feature, DISTRICT_NAME_ALIASES).unwrap_or_else(|| id.clone());

        records.push(DistrictRecord {
            metrics: metrics_of(feature),
            coordinates: coordinates_of(feature, &to_wgs84),
            district_id: DistrictId(id),
            district_name: name,
        });
    }
    if records.is_empty() {
        warn!("master layer contains no districts");
    }
    Ok(records)
}

fn metrics_of(feature: &Feature) -> DistrictMetrics {
    let number = |aliases: &[&str]| find_number(feature, aliases);
    DistrictMetrics {
        night_population: number(NIGHT_FLOW_ALIASES),
        flow_population: number(FLOW_ALIASES),
        facility_count: number(FACILITY_ALIASES),
        competitor_count: number(COMPETITOR_ALIASES),
        resident_total: number(RESIDENT_TOTAL_ALIASES),
        resident_male: number(RESIDENT_MALE_ALIASES),
        resident_female: number(RESIDENT_FEMALE_ALIASES),
        avg_household_income: number(INCOME_ALIASES),
        korean_food_sales: number(KOREAN_SALES_ALIASES),
    }
}

fn coordinates_of(feature: &Feature, to_wgs84: &Reprojection) -> Option<Coordinates> {
    let (x, y) = find_number(feature, X_COORD_ALIASES)
        .zip(find_number(feature, Y_COORD_ALIASES))
        .or_else(|| feature.centroid())?;
    let (lon, lat) = to_wgs84.apply(x, y).ok()?;
    Some(Coordinates { x, y, lon, lat })
}

/// Values under an exact alias first, then under an alias carrying a join
/// suffix such as `_income`.
fn alias_values<'a>(feature: &'a Feature, aliases: &'a [&'a str]) -> impl Iterator<Item = &'a Value> {
    let exact = aliases
        .iter()
        .filter_map(move |alias| feature.properties.get(*alias));
    let suffixed = aliases.iter().flat_map(move |alias| {
        JOINED_SOURCES
            .iter()
            .filter_map(move |source| feature.properties.get(&format!("{alias}_{source}")))
    });
    exact.chain(suffixed)
}

fn find_text(feature: &Feature, aliases: &[&str]) -> Option<String> {
    alias_values(feature, aliases).find_map(value_text)
}

fn find_number(feature: &Feature, aliases: &[&str]) -> Option<f64> {
    alias_values(feature, aliases).find_map(|value| match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    })
    .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::ingest::Geometry;
    use geo::polygon;
    use serde_json::{json, Map};

    fn feature(properties: Value, geometry: Option<Geometry<f64>>) -> Feature {
        let properties: Map<String, Value> = serde_json::from_value(properties).expect("map");
        Feature::new(geometry, properties)
    }

    #[test]
    fn extracts_metrics_through_aliases_and_join_suffixes() {
        let master = FeatureCollection::new(
            MASTER_LAYER,
            Crs::KoreaCentralBelt2010,
            vec![feature(
                json!({
                    "상권_코드": "3110001",
                    "상권_코드_명": "강남역",
                    "flow_population": "12,000",
                    "야간_유동인구_수": 4000,
                    "한식_매출_금액_income": 51000000000.0,
                    "엑스좌표_값": 202000.0,
                    "와이좌표_값": 544000.0,
                }),
                None,
            )],
        );
        let records = records_from_master(&master, Crs::KoreaCentralBelt2010).expect("records");
        let record = &records[0];
        assert_eq!(record.district_id.as_str(), "3110001");
        assert_eq!(record.metrics.flow_population, Some(12_000.0));
        assert_eq!(record.metrics.night_population, Some(4_000.0));
        assert_eq!(record.metrics.korean_food_sales, Some(51_000_000_000.0));
        assert_eq!(record.metrics.facility_count, None);
        let coords = record.coordinates.expect("coordinates");
        assert!((coords.lon - 127.02).abs() < 0.1, "lon {}", coords.lon);
        assert!((coords.lat - 37.5).abs() < 0.1, "lat {}", coords.lat);
    }

    #[test]
    fn centroid_is_used_without_point_columns_and_name_defaults_to_id() {
        let square = Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 0.0),
            (x: 2.0, y: 2.0),
            (x: 0.0, y: 2.0),
        ]);
        let master = FeatureCollection::new(
            MASTER_LAYER,
            Crs::Wgs84,
            vec![feature(json!({ "TRDAR_CD": 77 }), Some(square))],
        );
        let records = records_from_master(&master, Crs::Wgs84).expect("records");
        assert_eq!(records[0].district_name, "77");
        let coords = records[0].coordinates.expect("centroid");
        assert!((coords.x - 1.0).abs() < 1e-9 && (coords.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn missing_key_and_duplicates_are_rejected() {
        let master = FeatureCollection::new(
            MASTER_LAYER,
            Crs::Wgs84,
            vec![feature(json!({ "name": "x" }), None)],
        );
        assert!(matches!(
            records_from_master(&master, Crs::Wgs84),
            Err(IngestError::Schema(_))
        ));

        let master = FeatureCollection::new(
            MASTER_LAYER,
            Crs::Wgs84,
            vec![
                feature(json!({ "상권_코드": "1" }), None),
                feature(json!({ "상권_코드": "1" }), None),
            ],
        );
        assert!(matches!(
            records_from_master(&master, Crs::Wgs84),
            Err(IngestError::DuplicateDistrict { .. })
        ));
    }
}
