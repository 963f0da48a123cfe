use geo::Point;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::aliases::{
    find_column, DISTRICT_KEY, DISTRICT_KEY_ALIASES, DISTRICT_NAME, DISTRICT_NAME_ALIASES,
    X_COORD_ALIASES, Y_COORD_ALIASES,
};
use super::crs::Crs;
use super::frame::Frame;
use super::geometry::{Feature, FeatureCollection};
use super::{GeometryError, IngestError, SchemaError};

pub const BOUNDARY_LAYER: &str = "boundary";
pub const POINT_LAYER: &str = "resident";
pub const MASTER_LAYER: &str = "master";

const TABULAR_SOURCES: [&str; 3] = ["facility", "flow", "income"];
/// Every table joined onto the boundary, in join order. Colliding columns
/// carry one of these names as a `_<source>` suffix.
pub const JOINED_SOURCES: [&str; 4] = [POINT_LAYER, "facility", "flow", "income"];

/// Directory layout of the raw datasets, rooted at `data/` by default.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn boundary_dir(&self) -> PathBuf {
        self.root.join("boundary")
    }

    pub fn raw_csv(&self, source: &str) -> PathBuf {
        self.root
            .join("raw")
            .join(source)
            .join(format!("{source}_all.csv"))
    }

    pub fn resident_csv(&self) -> PathBuf {
        self.raw_csv(POINT_LAYER)
    }

    pub fn tabular_sources(&self) -> Vec<(&'static str, PathBuf)> {
        TABULAR_SOURCES
            .iter()
            .map(|source| (*source, self.raw_csv(source)))
            .collect()
    }

    /// All raw CSV files touched by the column rename utility.
    pub fn raw_sources(&self) -> Vec<(&'static str, PathBuf)> {
        let mut sources = vec![(POINT_LAYER, self.resident_csv())];
        sources.extend(self.tabular_sources());
        sources
    }

    pub fn has_raw_sources(&self) -> bool {
        self.boundary_dir().is_dir() && self.raw_sources().iter().all(|(_, path)| path.is_file())
    }

    fn boundary_file(&self) -> Result<PathBuf, GeometryError> {
        let dir = self.boundary_dir();
        let missing = || GeometryError::MissingFile { dir: dir.clone() };
        let entries = std::fs::read_dir(&dir).map_err(|_| missing())?;
        let mut candidates: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("geojson") || ext.eq_ignore_ascii_case("json"))
                    .unwrap_or(false)
            })
            .collect();
        candidates.sort();
        candidates.into_iter().next().ok_or_else(missing)
    }
}

/// Joined boundary, point and master layers, all in one target CRS.
#[derive(Debug, Clone)]
pub struct MasterDataset {
    pub crs: Crs,
    pub boundary: FeatureCollection,
    pub points: FeatureCollection,
    pub master: FeatureCollection,
}

impl MasterDataset {
    /// Writes each layer as `<out_dir>/<layer>.geojson`.
    pub fn persist(&self, out_dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
        std::fs::create_dir_all(out_dir)?;
        let mut written = Vec::new();
        for (layer, collection) in [
            (BOUNDARY_LAYER, &self.boundary),
            (POINT_LAYER, &self.points),
            (MASTER_LAYER, &self.master),
        ] {
            let path = out_dir.join(format!("{layer}.geojson"));
            written.push(collection.persist(&path)?);
        }
        info!(out = %out_dir.display(), crs = %self.crs, "persisted master layers");
        Ok(written)
    }

    /// Reads the master layer written by [`MasterDataset::persist`].
    pub fn load_master(dir: &Path) -> Result<FeatureCollection, IngestError> {
        let path = dir.join(format!("{MASTER_LAYER}.geojson"));
        if !path.is_file() {
            return Err(IngestError::MissingSource {
                path: path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "master layer missing"),
            });
        }
        FeatureCollection::from_path(&path)
    }
}

pub struct MasterBuilder;

impl MasterBuilder {
    pub fn build(layout: &DataLayout, target: Crs) -> Result<MasterDataset, IngestError> {
        let boundary_path = layout.boundary_file()?;
        let boundary = load_boundary(&boundary_path, target)?;
        info!(
            path = %boundary_path.display(),
            districts = boundary.features.len(),
            crs = %target,
            "loaded boundary layer"
        );

        let mut resident = Frame::from_path(&layout.resident_csv(), POINT_LAYER)?;
        resident.canonicalize(DISTRICT_KEY_ALIASES, DISTRICT_KEY)?;
        let points = point_layer(&resident, target)?;

        let mut tables = vec![resident];
        for (source, path) in layout.tabular_sources() {
            let mut frame = Frame::from_path(&path, source)?;
            frame.canonicalize(DISTRICT_KEY_ALIASES, DISTRICT_KEY)?;
            tables.push(frame);
        }

        let master = left_join(&boundary, &tables, target)?;
        Ok(MasterDataset {
            crs: target,
            boundary,
            points,
            master,
        })
    }
}

fn load_boundary(path: &Path, target: Crs) -> Result<FeatureCollection, IngestError> {
    let mut collection = FeatureCollection::from_path(path)?;

    let mut columns: Vec<String> = Vec::new();
    for feature in &collection.features {
        for key in feature.properties.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    let key_alias = find_column(&columns, DISTRICT_KEY_ALIASES)
        .map(|idx| columns[idx].clone())
        .ok_or_else(|| SchemaError {
            source_name: BOUNDARY_LAYER.to_string(),
            expected: DISTRICT_KEY_ALIASES.iter().map(|a| a.to_string()).collect(),
            columns: columns.clone(),
        })?;
    let name_alias = find_column(&columns, DISTRICT_NAME_ALIASES).map(|idx| columns[idx].clone());

    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(collection.features.len());
    let mut skipped = 0usize;
    for mut feature in collection.features.drain(..) {
        let Some(key) = feature.property_text(&key_alias) else {
            skipped += 1;
            continue;
        };
        if !seen.insert(key.clone()) {
            return Err(IngestError::DuplicateDistrict {
                source_name: BOUNDARY_LAYER.to_string(),
                key,
            });
        }
        feature.properties.remove(&key_alias);
        let name = name_alias
            .as_ref()
            .and_then(|alias| feature.properties.remove(alias));

        let mut properties = Map::new();
        properties.insert(DISTRICT_KEY.to_string(), Value::String(key));
        if let Some(name) = name {
            properties.insert(DISTRICT_NAME.to_string(), name);
        }
        properties.extend(feature.properties);
        kept.push(Feature::new(feature.geometry, properties));
    }
    if skipped > 0 {
        warn!(skipped, "boundary features without a district key were dropped");
    }

    collection.features = kept;
    collection.name = Some(BOUNDARY_LAYER.to_string());
    Ok(collection.to_crs(target)?)
}

/// Point features from the resident coordinates. The export carries no CRS,
/// so the caller's target system is assigned rather than reprojected.
fn point_layer(frame: &Frame, target: Crs) -> Result<FeatureCollection, IngestError> {
    let x_idx = frame.require(X_COORD_ALIASES)?;
    let y_idx = frame.require(Y_COORD_ALIASES)?;

    let mut unplaced = 0usize;
    let features = frame
        .rows
        .iter()
        .map(|row| {
            let x = parse_number(row[x_idx].as_deref());
            let y = parse_number(row[y_idx].as_deref());
            let geometry = match (x, y) {
                (Some(x), Some(y)) => Some(Point::new(x, y).into()),
                _ => {
                    unplaced += 1;
                    None
                }
            };
            Feature::new(geometry, row_properties(frame, row))
        })
        .collect();

    if unplaced > 0 {
        warn!(unplaced, "resident rows without usable coordinates");
    }

    Ok(FeatureCollection::new(POINT_LAYER, target, features))
}

fn left_join(
    boundary: &FeatureCollection,
    tables: &[Frame],
    target: Crs,
) -> Result<FeatureCollection, IngestError> {
    let indexes = tables
        .iter()
        .map(Frame::index_by_key)
        .collect::<Result<Vec<_>, _>>()?;

    let mut unmatched = vec![0usize; tables.len()];
    let features = boundary
        .features
        .iter()
        .map(|feature| {
            let mut properties = feature.properties.clone();
            let key = feature.property_text(DISTRICT_KEY).unwrap_or_default();

            for (table_idx, (table, index)) in tables.iter().zip(&indexes).enumerate() {
                let row = index.get(&key).map(|row_idx| &table.rows[*row_idx]);
                if row.is_none() {
                    unmatched[table_idx] += 1;
                }
                for (col_idx, column) in table.columns.iter().enumerate() {
                    if column == DISTRICT_KEY {
                        continue;
                    }
                    let value = row
                        .and_then(|cells| cells[col_idx].as_deref())
                        .map(cell_value)
                        .unwrap_or(Value::Null);
                    let name = if properties.contains_key(column) {
                        format!("{column}_{}", table.source)
                    } else {
                        column.clone()
                    };
                    properties.insert(name, value);
                }
            }

            Feature::new(feature.geometry.clone(), properties)
        })
        .collect::<Vec<_>>();

    for (table, missing) in tables.iter().zip(unmatched) {
        if missing > 0 {
            warn!(source = %table.source, missing, "districts without a matching row; values left null");
        }
    }
    info!(districts = features.len(), sources = tables.len(), "joined master layer");

    Ok(FeatureCollection::new(MASTER_LAYER, target, features))
}

fn row_properties(frame: &Frame, row: &[Option<String>]) -> Map<String, Value> {
    frame
        .columns
        .iter()
        .zip(row)
        .map(|(column, cell)| {
            let value = match cell.as_deref() {
                None => Value::Null,
                Some(text) if column == DISTRICT_KEY => Value::String(text.to_string()),
                Some(text) => cell_value(text),
            };
            (column.clone(), value)
        })
        .collect()
}

fn cell_value(text: &str) -> Value {
    if let Ok(int) = text.parse::<i64>() {
        return Value::from(int);
    }
    match text.replace(',', "").parse::<f64>() {
        Ok(float) if float.is_finite() && text.chars().any(|c| c.is_ascii_digit()) => {
            Value::from(float)
        }
        _ => Value::String(text.to_string()),
    }
}

fn parse_number(text: Option<&str>) -> Option<f64> {
    text.and_then(|value| value.replace(',', "").parse::<f64>().ok())
        .filter(|value| value.is_finite())
}
