use crate::cli::ServeArgs;
use crate::infra::{AppState, DistrictState};
use crate::routes::router;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use gopchang_locator::config::AppConfig;
use gopchang_locator::error::AppError;
use gopchang_locator::telemetry;
use gopchang_locator::workflows::district::DistrictPipeline;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let pipeline = DistrictPipeline::from_config(&config.data)?;
    let (table, source) = pipeline.load()?;
    info!(districts = table.len(), ?source, "district table ready");

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        districts: DistrictState::new(table, source, pipeline),
    };

    let app = router()
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "gopchang locator dashboard ready");

    axum::serve(listener, app).await?;
    Ok(())
}
