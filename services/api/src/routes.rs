use crate::infra::{deserialize_lenient_f64, AppState};
use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use gopchang_locator::error::AppError;
use gopchang_locator::workflows::district::views::TableRow;
use gopchang_locator::workflows::district::{
    DashboardView, FilterOutcome, FilterSpec, ScoreRange, Selector, TableSource,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DashboardQuery {
    #[serde(default)]
    pub(crate) archetype: Option<String>,
    #[serde(default)]
    pub(crate) tier: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub(crate) min_score: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub(crate) max_score: Option<f64>,
}

impl DashboardQuery {
    pub(crate) fn filter_spec(&self) -> FilterSpec {
        FilterSpec {
            archetype: Selector::archetype(self.archetype.as_deref()),
            tier: Selector::tier(self.tier.as_deref()),
            score_range: ScoreRange::from_bounds(self.min_score, self.max_score),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DistrictListResponse {
    pub(crate) source: TableSource,
    pub(crate) count: usize,
    pub(crate) districts: Vec<TableRow>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DashboardResponse {
    pub(crate) source: TableSource,
    pub(crate) filter: FilterSpec,
    #[serde(flatten)]
    pub(crate) view: DashboardView,
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshResponse {
    pub(crate) source: TableSource,
    pub(crate) districts: usize,
    pub(crate) previous_districts: usize,
}

pub(crate) fn router() -> axum::Router {
    axum::Router::new()
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route("/api/v1/districts", axum::routing::get(districts_endpoint))
        .route(
            "/api/v1/districts/dashboard",
            axum::routing::get(dashboard_endpoint),
        )
        .route(
            "/api/v1/districts/refresh",
            axum::routing::post(refresh_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready", "districts": state.districts.store.snapshot().table.len() })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn districts_endpoint(
    Extension(state): Extension<AppState>,
) -> Json<DistrictListResponse> {
    let current = state.districts.store.snapshot();
    let outcome = FilterOutcome::evaluate(&current.table, FilterSpec::default());
    let view = DashboardView::render(&outcome, &current.table);
    Json(DistrictListResponse {
        source: current.source,
        count: view.table.len(),
        districts: view.table,
    })
}

/// Invalid filter values never fail the request; they select everything.
pub(crate) async fn dashboard_endpoint(
    Extension(state): Extension<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Json<DashboardResponse> {
    let current = state.districts.store.snapshot();
    let spec = query.filter_spec();
    let outcome = FilterOutcome::evaluate(&current.table, spec);
    Json(DashboardResponse {
        source: current.source,
        filter: spec,
        view: DashboardView::render(&outcome, &current.table),
    })
}

/// Rebuilds the table on the blocking pool and swaps it in together with its
/// source. On failure the current table stays.
pub(crate) async fn refresh_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<RefreshResponse>, AppError> {
    let _guard = state.districts.refresh_guard().await;
    let pipeline = Arc::clone(&state.districts.pipeline);
    let (table, source) = tokio::task::spawn_blocking(move || pipeline.load())
        .await
        .map_err(std::io::Error::from)??;
    let districts = table.len();
    let previous = state.districts.store.replace(table, source);
    info!(
        districts,
        previous = previous.table.len(),
        ?source,
        "district table refreshed"
    );

    Ok(Json(RefreshResponse {
        source,
        districts,
        previous_districts: previous.table.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::DistrictState;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use gopchang_locator::workflows::district::export;
    use gopchang_locator::workflows::district::sample::sample_table;
    use gopchang_locator::workflows::district::{DistrictPipeline, ScoringEngine};
    use gopchang_locator::workflows::ingest::Crs;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn test_state(root: &std::path::Path) -> AppState {
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let pipeline = DistrictPipeline::new(
            root.join("data"),
            root.join("docs"),
            Crs::KoreaCentralBelt2010,
            30,
            ScoringEngine::default(),
        );
        AppState {
            readiness: Arc::new(AtomicBool::new(true)),
            metrics: Arc::new(handle),
            districts: DistrictState::new(sample_table(), TableSource::Sample, pipeline),
        }
    }

    async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[tokio::test]
    async fn dashboard_filters_by_inclusive_score_range() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = router().layer(Extension(test_state(dir.path())));
        let (status, body) =
            get_json(app, "/api/v1/districts/dashboard?min_score=38&max_score=40").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kpis"]["district_count"], 2);
        let names: Vec<&str> = body["table"]
            .as_array()
            .expect("table rows")
            .iter()
            .map(|row| row["district_name"].as_str().expect("name"))
            .collect();
        assert_eq!(names, vec!["명동", "신촌역"]);
    }

    #[tokio::test]
    async fn invalid_filters_select_everything() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = router().layer(Extension(test_state(dir.path())));
        let (status, body) = get_json(
            app,
            "/api/v1/districts/dashboard?archetype=unknown&tier=huge&min_score=abc",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kpis"]["district_count"], 5);
        assert_eq!(body["filter"]["archetype"]["kind"], "all");
    }

    #[tokio::test]
    async fn empty_result_is_not_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = router().layer(Extension(test_state(dir.path())));
        let (status, body) =
            get_json(app, "/api/v1/districts/dashboard?archetype=regional_hub").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kpis"]["monthly_sales"], "0억원");
        assert_eq!(body["radar"]["message"], "데이터 없음");
    }

    #[tokio::test]
    async fn districts_endpoint_lists_ranked_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = router().layer(Extension(test_state(dir.path())));
        let (status, body) = get_json(app, "/api/v1/districts").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "sample");
        assert_eq!(body["count"], 5);
        assert_eq!(body["districts"][0]["district_name"], "강남역");
        assert_eq!(body["districts"][0]["rank"], 1);
    }

    #[tokio::test]
    async fn refresh_swaps_in_the_scored_table() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = test_state(dir.path());
        export::write_outputs(&sample_table(), &dir.path().join("docs"), 3)
            .expect("write scored table");

        let app = router().layer(Extension(state.clone()));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/districts/refresh")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let current = state.districts.store.snapshot();
        assert_eq!(current.table.len(), 3);
        assert_eq!(current.source, TableSource::ScoredTable);

        let (_, body) = get_json(
            router().layer(Extension(state.clone())),
            "/api/v1/districts/dashboard",
        )
        .await;
        assert_eq!(body["source"], "scored_table");
        assert_eq!(body["kpis"]["district_count"], 3);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_the_current_table_and_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = test_state(dir.path());
        let docs = dir.path().join("docs");
        std::fs::create_dir_all(&docs).expect("docs dir");
        std::fs::write(
            docs.join(export::TOP_LOCATIONS_FILE),
            "상권_코드,상권_코드_명,곱창집_적합도_v2\n1,a,1\n1,b,2\n",
        )
        .expect("write duplicate rows");

        let app = router().layer(Extension(state.clone()));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/districts/refresh")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let current = state.districts.store.snapshot();
        assert_eq!(current.table.len(), 5);
        assert_eq!(current.source, TableSource::Sample);
    }
}
