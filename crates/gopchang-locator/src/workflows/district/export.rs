//! Ranked output tables written under the docs directory and read back by
//! the dashboard.

use serde::{Deserialize, Deserializer, Serialize};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use super::classify::{classify_archetype, classify_tier};
use super::domain::{DistrictId, DistrictMetrics, ScoredDistrict, SubScores};
use super::table::DistrictTable;
use crate::workflows::ingest::IngestError;

pub const TOP_LOCATIONS_FILE: &str = "gopchang_top30_locations_v2.csv";
pub const COORDINATES_FILE: &str = "gopchang_top30_coordinates.csv";
pub const INVESTMENT_PLAN_FILE: &str = "gopchang_investment_plan.csv";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Table(IngestError),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io(err) => write!(f, "failed to access output table: {}", err),
            ExportError::Csv(err) => write!(f, "invalid output table data: {}", err),
            ExportError::Table(err) => write!(f, "output table is inconsistent: {}", err),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Io(err) => Some(err),
            ExportError::Csv(err) => Some(err),
            ExportError::Table(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<IngestError> for ExportError {
    fn from(err: IngestError) -> Self {
        Self::Table(err)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TopLocationRow {
    #[serde(rename = "상권_코드", default, deserialize_with = "empty_string_as_none")]
    district_id: Option<String>,
    #[serde(rename = "상권_코드_명")]
    district_name: String,
    #[serde(rename = "곱창집_적합도_v2")]
    composite: f64,
    #[serde(rename = "T1_야간유동인구", default, deserialize_with = "lenient_number")]
    night_population: Option<f64>,
    #[serde(rename = "한식_월매출", default, deserialize_with = "lenient_number")]
    monthly_sales: Option<f64>,
    #[serde(rename = "T1_점수_v2", default, deserialize_with = "lenient_number")]
    night_traffic: Option<f64>,
    #[serde(rename = "T2_점수_v2", default, deserialize_with = "lenient_number")]
    sales_density: Option<f64>,
    #[serde(rename = "C1_점수_v2", default, deserialize_with = "lenient_number")]
    competition: Option<f64>,
    #[serde(rename = "C2_점수_v2", default, deserialize_with = "lenient_number")]
    vibrancy: Option<f64>,
    #[serde(rename = "E1_점수_v2", default, deserialize_with = "lenient_number")]
    alcohol_affinity: Option<f64>,
}

impl TopLocationRow {
    fn from_district(row: &ScoredDistrict) -> Self {
        let scores = &row.sub_scores;
        Self {
            district_id: Some(row.district_id.to_string()),
            district_name: row.district_name.clone(),
            composite: row.composite,
            night_population: row.metrics.night_population,
            monthly_sales: row.metrics.korean_food_sales,
            night_traffic: Some(scores.night_traffic),
            sales_density: Some(scores.sales_density),
            competition: Some(scores.competition),
            vibrancy: Some(scores.vibrancy),
            alcohol_affinity: Some(scores.alcohol_affinity),
        }
    }

    /// Scores are written at full precision, so the stored composite still
    /// equals the weighted sum of the stored sub-scores. Labels are derived
    /// again.
    fn into_district(self) -> ScoredDistrict {
        let id = self
            .district_id
            .unwrap_or_else(|| self.district_name.clone());
        let score = |value: Option<f64>| value.unwrap_or(0.0).clamp(0.0, 100.0);
        ScoredDistrict {
            archetype: classify_archetype(&self.district_name),
            tier: classify_tier(self.monthly_sales),
            district_id: DistrictId(id),
            district_name: self.district_name,
            metrics: DistrictMetrics {
                night_population: self.night_population,
                korean_food_sales: self.monthly_sales,
                ..Default::default()
            },
            coordinates: None,
            sub_scores: SubScores {
                night_traffic: score(self.night_traffic),
                sales_density: score(self.sales_density),
                competition: score(self.competition),
                vibrancy: score(self.vibrancy),
                alcohol_affinity: score(self.alcohol_affinity),
            },
            composite: self.composite,
        }
    }
}

#[derive(Debug, Serialize)]
struct CoordinateRow<'a> {
    #[serde(rename = "순위")]
    rank: usize,
    #[serde(rename = "상권_코드")]
    district_id: &'a str,
    #[serde(rename = "상권_코드_명")]
    district_name: &'a str,
    #[serde(rename = "곱창집_적합도_v2")]
    composite: f64,
    #[serde(rename = "엑스좌표_값")]
    x: Option<f64>,
    #[serde(rename = "와이좌표_값")]
    y: Option<f64>,
    #[serde(rename = "경도")]
    lon: Option<f64>,
    #[serde(rename = "위도")]
    lat: Option<f64>,
}

#[derive(Debug, Serialize)]
struct InvestmentPlanRow<'a> {
    #[serde(rename = "순위")]
    rank: usize,
    #[serde(rename = "상권_코드")]
    district_id: &'a str,
    #[serde(rename = "상권_코드_명")]
    district_name: &'a str,
    #[serde(rename = "상권유형")]
    archetype: &'static str,
    #[serde(rename = "투자규모")]
    tier: &'static str,
    #[serde(rename = "곱창집_적합도_v2")]
    composite: f64,
    #[serde(rename = "한식_월매출")]
    monthly_sales: Option<f64>,
    #[serde(rename = "한식매출_억")]
    monthly_sales_eok: Option<f64>,
}

/// Writes the three output tables for the top `top_n` districts.
pub fn write_outputs(
    table: &DistrictTable,
    docs_dir: &Path,
    top_n: usize,
) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(docs_dir)?;
    let top = table.top(top_n);

    let top_path = docs_dir.join(TOP_LOCATIONS_FILE);
    write_rows(&top_path, top.iter().map(TopLocationRow::from_district))?;

    let coordinates_path = docs_dir.join(COORDINATES_FILE);
    write_rows(
        &coordinates_path,
        top.iter().enumerate().map(|(idx, row)| CoordinateRow {
            rank: idx + 1,
            district_id: row.district_id.as_str(),
            district_name: &row.district_name,
            composite: round1(row.composite),
            x: row.coordinates.map(|c| c.x),
            y: row.coordinates.map(|c| c.y),
            lon: row.coordinates.map(|c| c.lon),
            lat: row.coordinates.map(|c| c.lat),
        }),
    )?;

    let plan_path = docs_dir.join(INVESTMENT_PLAN_FILE);
    write_rows(
        &plan_path,
        top.iter().enumerate().map(|(idx, row)| InvestmentPlanRow {
            rank: idx + 1,
            district_id: row.district_id.as_str(),
            district_name: &row.district_name,
            archetype: row.archetype.label(),
            tier: row.tier.label(),
            composite: round1(row.composite),
            monthly_sales: row.metrics.korean_food_sales,
            monthly_sales_eok: row
                .metrics
                .korean_food_sales
                .map(|sales| round1(sales / 100_000_000.0)),
        }),
    )?;

    info!(docs = %docs_dir.display(), rows = top.len(), "wrote ranked output tables");
    Ok(vec![top_path, coordinates_path, plan_path])
}

fn write_rows<T: Serialize>(path: &Path, rows: impl Iterator<Item = T>) -> Result<(), ExportError> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(UTF8_BOM)?;
    let mut writer = csv::Writer::from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Loads `gopchang_top30_locations_v2.csv` from `docs_dir`.
pub fn read_top_locations(docs_dir: &Path) -> Result<DistrictTable, ExportError> {
    let file = std::fs::File::open(docs_dir.join(TOP_LOCATIONS_FILE))?;
    read_top_locations_from(file)
}

pub fn read_top_locations_from<R: Read>(reader: R) -> Result<DistrictTable, ExportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(BomStripped::new(reader));
    let mut rows = Vec::new();
    for record in csv_reader.deserialize::<TopLocationRow>() {
        rows.push(record?.into_district());
    }
    Ok(DistrictTable::new(rows)?)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|raw| {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }))
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .and_then(|raw| raw.trim().replace(',', "").parse::<f64>().ok())
        .filter(|number| number.is_finite()))
}

/// Skips a leading UTF-8 byte-order mark so the first header matches.
struct BomStripped<R> {
    inner: R,
    checked: bool,
    pending: Vec<u8>,
}

impl<R: Read> BomStripped<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            checked: false,
            pending: Vec::new(),
        }
    }
}

impl<R: Read> Read for BomStripped<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if !self.checked {
            self.checked = true;
            let mut head = [0u8; 3];
            let mut filled = 0;
            while filled < head.len() {
                let n = self.inner.read(&mut head[filled..])?;
                if n == 0 {
                    break;
                }
                filled += n;
            }
            if &head[..filled] != UTF8_BOM {
                self.pending.extend_from_slice(&head[..filled]);
            }
        }
        if !self.pending.is_empty() {
            let n = self.pending.len().min(buf.len());
            buf[..n].copy_from_slice(&self.pending[..n]);
            self.pending.drain(..n);
            return Ok(n);
        }
        self.inner.read(buf)
    }
}
