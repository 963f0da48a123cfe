//! Dataset loading: alias reconciliation, CRS handling and left joins that
//! produce the master district layer.

pub mod aliases;
mod crs;
pub mod encoding;
mod frame;
mod geometry;
mod loader;
pub mod rename;

pub use crs::{Crs, Reprojection};
pub use frame::Frame;
pub use geo::Geometry;
pub use geometry::{Feature, FeatureCollection};
pub(crate) use geometry::value_text;
pub use loader::{
    DataLayout, MasterBuilder, MasterDataset, BOUNDARY_LAYER, JOINED_SOURCES, MASTER_LAYER,
    POINT_LAYER,
};

use std::path::PathBuf;

/// An expected key or coordinate column is absent from a source table.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{source_name}: none of the expected columns {expected:?} found (columns: {columns:?})")]
pub struct SchemaError {
    pub source_name: String,
    pub expected: Vec<String>,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("no geometry file (*.geojson) found in {}", .dir.display())]
    MissingFile { dir: PathBuf },
    #[error("unsupported or unspecified coordinate reference system '{0}'")]
    UnsupportedCrs(String),
    #[error("geometry layer {} is malformed: {detail}", .path.display())]
    Malformed { path: PathBuf, detail: String },
    #[error("coordinate {0:?} cannot be reprojected")]
    InvalidPosition(Vec<f64>),
}

/// Structural failures that abort a master build before any scoring runs.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("required source {} could not be opened: {source}", .path.display())]
    MissingSource {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("district key '{key}' appears more than once in {source_name}")]
    DuplicateDistrict { source_name: String, key: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid JSON data: {0}")]
    Json(#[source] serde_json::Error),
}
