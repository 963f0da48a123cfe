//! District scoring, classification and dashboard aggregation.

pub mod classify;
pub mod domain;
pub mod export;
pub mod filter;
pub mod sample;
pub mod scoring;
pub mod store;
pub mod table;
pub mod views;

pub use domain::{
    Archetype, Coordinates, Dimension, DistrictId, DistrictMetrics, DistrictRecord,
    InvestmentTier, ScoredDistrict, SubScores,
};
pub use export::ExportError;
pub use filter::{FilterOutcome, FilterSpec, FilterSummary, ScoreRange, Selector};
pub use scoring::{ScoringConfig, ScoringConfigError, ScoringEngine};
pub use store::{DistrictStore, LoadedTable};
pub use table::DistrictTable;
pub use views::DashboardView;

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::DataConfig;
use crate::workflows::ingest::{Crs, DataLayout, IngestError, MasterBuilder, MasterDataset};

/// Where the current table was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableSource {
    RawData,
    ScoredTable,
    Sample,
}

#[derive(Debug)]
pub enum PipelineError {
    Ingest(IngestError),
    Export(ExportError),
    ScoringConfig(ScoringConfigError),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Ingest(err) => write!(f, "failed to load district data: {}", err),
            PipelineError::Export(err) => write!(f, "failed to handle scored tables: {}", err),
            PipelineError::ScoringConfig(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Ingest(err) => Some(err),
            PipelineError::Export(err) => Some(err),
            PipelineError::ScoringConfig(err) => Some(err),
        }
    }
}

impl From<IngestError> for PipelineError {
    fn from(err: IngestError) -> Self {
        Self::Ingest(err)
    }
}

impl From<ExportError> for PipelineError {
    fn from(err: ExportError) -> Self {
        Self::Export(err)
    }
}

impl From<ScoringConfigError> for PipelineError {
    fn from(err: ScoringConfigError) -> Self {
        Self::ScoringConfig(err)
    }
}

/// Batch side of the system: load, score and classify into a fresh
/// [`DistrictTable`]. Each call builds a new table; nothing is cached here.
#[derive(Debug, Clone)]
pub struct DistrictPipeline {
    layout: DataLayout,
    docs_dir: PathBuf,
    crs: Crs,
    top_n: usize,
    engine: ScoringEngine,
}

impl DistrictPipeline {
    pub fn new(
        data_root: impl Into<PathBuf>,
        docs_dir: impl Into<PathBuf>,
        crs: Crs,
        top_n: usize,
        engine: ScoringEngine,
    ) -> Self {
        Self {
            layout: DataLayout::new(data_root),
            docs_dir: docs_dir.into(),
            crs,
            top_n,
            engine,
        }
    }

    pub fn from_config(config: &DataConfig) -> Result<Self, PipelineError> {
        let scoring = match &config.scoring_config {
            Some(path) => ScoringConfig::from_path(path)?,
            None => ScoringConfig::default(),
        };
        Ok(Self::new(
            config.data_root.clone(),
            config.docs_dir.clone(),
            config.target_crs,
            config.top_n,
            ScoringEngine::new(scoring),
        ))
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    pub fn docs_dir(&self) -> &Path {
        &self.docs_dir
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    /// Joins the raw sources into master layers. Structural failures stop
    /// here, before anything is scored.
    pub fn build_master(&self) -> Result<MasterDataset, IngestError> {
        MasterBuilder::build(&self.layout, self.crs)
    }

    pub fn score_master_dir(&self, master_dir: &Path) -> Result<DistrictTable, IngestError> {
        let master = MasterDataset::load_master(master_dir)?;
        DistrictTable::from_master(&master, master.crs, &self.engine)
    }

    pub fn build_from_raw(&self) -> Result<DistrictTable, IngestError> {
        let dataset = self.build_master()?;
        DistrictTable::from_master(&dataset.master, dataset.crs, &self.engine)
    }

    pub fn write_outputs(&self, table: &DistrictTable) -> Result<Vec<PathBuf>, ExportError> {
        export::write_outputs(table, &self.docs_dir, self.top_n)
    }

    /// Builds the table from the best available source: the raw data tree,
    /// then the scored table in the docs directory, then the built-in sample.
    pub fn load(&self) -> Result<(DistrictTable, TableSource), PipelineError> {
        if self.layout.has_raw_sources() {
            let table = self.build_from_raw()?;
            info!(districts = table.len(), "built district table from raw data");
            return Ok((table, TableSource::RawData));
        }

        let scored = self.docs_dir.join(export::TOP_LOCATIONS_FILE);
        if scored.is_file() {
            let table = export::read_top_locations(&self.docs_dir)?;
            info!(districts = table.len(), path = %scored.display(), "loaded scored district table");
            return Ok((table, TableSource::ScoredTable));
        }

        warn!(
            data_root = %self.layout.root().display(),
            docs = %self.docs_dir.display(),
            "no district data found; serving the built-in sample table"
        );
        Ok((sample::sample_table(), TableSource::Sample))
    }
}
