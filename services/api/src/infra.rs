use gopchang_locator::workflows::district::{
    DistrictPipeline, DistrictStore, DistrictTable, TableSource,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Deserializer};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) districts: DistrictState,
}

/// Current district table plus what it takes to rebuild it.
#[derive(Clone)]
pub(crate) struct DistrictState {
    pub(crate) store: Arc<DistrictStore>,
    pub(crate) pipeline: Arc<DistrictPipeline>,
    refreshing: Arc<tokio::sync::Mutex<()>>,
}

impl DistrictState {
    pub(crate) fn new(table: DistrictTable, source: TableSource, pipeline: DistrictPipeline) -> Self {
        Self {
            store: Arc::new(DistrictStore::new(table, source)),
            pipeline: Arc::new(pipeline),
            refreshing: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Serialises refreshes so two rebuilds never race to install a table.
    pub(crate) async fn refresh_guard(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.refreshing.lock().await
    }
}

/// Lenient number for query strings: anything unparseable becomes `None`
/// so a bad bound widens the filter instead of rejecting the request.
pub(crate) fn deserialize_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|raw| raw.trim().parse::<f64>().ok()))
}
