use chrono::Utc;
use clap::Args;
use gopchang_locator::config::AppConfig;
use gopchang_locator::error::AppError;
use gopchang_locator::telemetry;
use gopchang_locator::workflows::district::export;
use gopchang_locator::workflows::district::{
    DashboardView, DistrictPipeline, FilterOutcome, FilterSpec, ScoreRange, Selector, TableSource,
};
use gopchang_locator::workflows::ingest::encoding::{convert_patterns, ConversionStatus};
use gopchang_locator::workflows::ingest::rename::rename_raw_sources;
use gopchang_locator::workflows::ingest::{Crs, DataLayout, MasterBuilder};
use gopchang_locator::workflows::trends::{
    NaverSearchClient, TrendAnalyzer, TrendReport, DEFAULT_WINDOW_DAYS,
};
use std::path::PathBuf;

const MENTION_LINES: usize = 5;

#[derive(Args, Debug)]
pub(crate) struct BuildArgs {
    /// Directory the boundary, point and master layers are written to
    #[arg(long)]
    pub(crate) out: PathBuf,
    /// Target coordinate reference system (EPSG code, e.g. 5186)
    #[arg(long, value_parser = parse_crs)]
    pub(crate) crs: Crs,
    /// Override the configured raw data root
    #[arg(long)]
    pub(crate) data_root: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Directory holding a persisted master layer
    #[arg(long)]
    pub(crate) master: PathBuf,
    /// Override the configured output directory for the ranked tables
    #[arg(long)]
    pub(crate) docs: Option<PathBuf>,
    /// Number of districts kept in the ranked tables
    #[arg(long)]
    pub(crate) top: Option<usize>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ReportArgs {
    /// Archetype key, e.g. premium_business (default: all)
    #[arg(long)]
    pub(crate) archetype: Option<String>,
    /// Investment tier key: high, mid or low (default: all)
    #[arg(long)]
    pub(crate) tier: Option<String>,
    /// Lowest composite score to include
    #[arg(long)]
    pub(crate) min_score: Option<f64>,
    /// Highest composite score to include
    #[arg(long)]
    pub(crate) max_score: Option<f64>,
}

#[derive(Args, Debug)]
pub(crate) struct ConvertEncodingArgs {
    /// Glob patterns of files to re-encode, e.g. 'data/raw/**/*.csv'
    #[arg(required = true)]
    pub(crate) patterns: Vec<String>,
}

#[derive(Args, Debug)]
pub(crate) struct TrendsArgs {
    /// Only keep hits published within this many days
    #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS)]
    pub(crate) days: i64,
}

/// Batch commands log through the same subscriber as the service.
fn load_config() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(config)
}

fn parse_crs(raw: &str) -> Result<Crs, String> {
    Crs::parse(raw).map_err(|err| err.to_string())
}

pub(crate) fn run_build(args: BuildArgs) -> Result<(), AppError> {
    let config = load_config()?;
    let data_root = args.data_root.unwrap_or(config.data.data_root);
    let layout = DataLayout::new(data_root);

    let dataset = MasterBuilder::build(&layout, args.crs)?;
    let written = dataset.persist(&args.out)?;

    println!("Master build ({})", dataset.crs);
    println!(
        "- {} boundary polygons | {} points | {} master rows",
        dataset.boundary.features.len(),
        dataset.points.features.len(),
        dataset.master.features.len()
    );
    for path in written {
        println!("  - wrote {}", path.display());
    }
    Ok(())
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let config = load_config()?;
    let pipeline = DistrictPipeline::from_config(&config.data)?;
    let docs = args.docs.unwrap_or_else(|| pipeline.docs_dir().to_path_buf());
    let top = args.top.unwrap_or(pipeline.top_n());

    let table = pipeline.score_master_dir(&args.master)?;
    let written = export::write_outputs(&table, &docs, top)?;

    println!("Scored {} districts", table.len());
    for (idx, row) in table.top(top.min(MENTION_LINES)).iter().enumerate() {
        println!(
            "  {}. {} ({}) {:.1} | {} | {}",
            idx + 1,
            row.district_name,
            row.district_id,
            row.composite,
            row.archetype.label(),
            row.tier.label()
        );
    }
    for path in written {
        println!("  - wrote {}", path.display());
    }
    Ok(())
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let config = load_config()?;
    let pipeline = DistrictPipeline::from_config(&config.data)?;
    let (table, source) = pipeline.load()?;

    let spec = FilterSpec {
        archetype: Selector::archetype(args.archetype.as_deref()),
        tier: Selector::tier(args.tier.as_deref()),
        score_range: ScoreRange::from_bounds(args.min_score, args.max_score),
    };
    let outcome = FilterOutcome::evaluate(&table, spec);
    let view = DashboardView::render(&outcome, &table);

    println!("District report ({})", source_label(source));
    render_dashboard(&view);
    Ok(())
}

fn source_label(source: TableSource) -> &'static str {
    match source {
        TableSource::RawData => "built from raw data",
        TableSource::ScoredTable => "loaded from scored table",
        TableSource::Sample => "built-in sample",
    }
}

fn render_dashboard(view: &DashboardView) {
    let kpis = &view.kpis;
    println!(
        "- {} districts | average {} | night population {} | monthly sales {}",
        kpis.district_count, kpis.average_score, kpis.night_population, kpis.monthly_sales
    );

    if view.table.is_empty() {
        println!("No districts match the current filters.");
        return;
    }

    println!("Ranking:");
    for row in &view.table {
        let sales = row
            .monthly_sales_eok
            .map(|eok| format!("{eok:.1}억원"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:>2}. {} {:.1} | {} | {} | {}",
            row.rank, row.district_name, row.composite, row.archetype, row.tier, sales
        );
    }

    match view.radar.message {
        Some(message) => println!("Radar: {message}"),
        None => {
            let axes: Vec<String> = view
                .radar
                .axes
                .iter()
                .map(|axis| format!("{} {:.1}", axis.label, axis.value))
                .collect();
            println!("Radar (top districts): {}", axes.join(" | "));
        }
    }

    println!("Investment tiers:");
    for group in &view.investment {
        println!(
            "  - {}: {} districts | mean score {:.1}",
            group.tier, group.count, group.mean_composite
        );
    }
}

pub(crate) fn run_convert_encoding(args: ConvertEncodingArgs) -> Result<(), AppError> {
    load_config()?;
    let outcomes = convert_patterns(&args.patterns)?;
    let mut converted = 0usize;
    let mut failed = 0usize;

    for outcome in &outcomes {
        match &outcome.status {
            ConversionStatus::Converted { detected } => {
                converted += 1;
                println!("  - {} converted from {}", outcome.path.display(), detected);
            }
            ConversionStatus::AlreadyUtf8 => {
                println!("  - {} already UTF-8", outcome.path.display());
            }
            ConversionStatus::Failed { reason } => {
                failed += 1;
                println!("  - {} failed: {}", outcome.path.display(), reason);
            }
        }
    }

    println!(
        "Encoding pass: {} files | {} converted | {} failed",
        outcomes.len(),
        converted,
        failed
    );
    Ok(())
}

pub(crate) fn run_rename_columns() -> Result<(), AppError> {
    let config = load_config()?;
    let layout = DataLayout::new(config.data.data_root);
    let outcomes = rename_raw_sources(&layout)?;

    println!("Column rename");
    for outcome in outcomes {
        println!(
            "  - {}: {} columns renamed",
            outcome.path.display(),
            outcome.renamed
        );
    }
    Ok(())
}

pub(crate) async fn run_trends(args: TrendsArgs) -> Result<(), AppError> {
    let config = load_config()?;
    let credentials = config
        .naver
        .ok_or(AppError::MissingCredentials("NAVER_CLIENT_ID and NAVER_CLIENT_SECRET"))?;

    let client = NaverSearchClient::new(credentials)?;
    let analyzer = TrendAnalyzer::new(client)?;
    let report = analyzer.collect(args.days, Utc::now()).await;

    render_trends(&report, args.days);
    Ok(())
}

fn render_trends(report: &TrendReport, days: i64) {
    let summary = &report.summary;
    println!("Search trends (last {days} days)");
    println!(
        "- {} hits | {} failed queries",
        summary.total, summary.failed_queries
    );
    for (source, count) in &summary.by_source {
        println!("  - {}: {}", source.label(), count);
    }
    for (sentiment, count) in &summary.by_sentiment {
        println!("  - {:?}: {}", sentiment, count);
    }

    if !summary.district_mentions.is_empty() {
        println!("Most mentioned districts:");
        for (district, count) in summary.district_mentions.iter().take(MENTION_LINES) {
            println!("  - {district}: {count}");
        }
    }

    if let Some(prices) = summary.prices {
        println!(
            "Quoted prices: {} mentions | {}원 to {}원 | median {:.0}원",
            prices.count, prices.min, prices.max, prices.median
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_crs_codes_and_urns() {
        assert_eq!(parse_crs("5186"), Ok(Crs::KoreaCentralBelt2010));
        assert_eq!(parse_crs("EPSG:4326"), Ok(Crs::Wgs84));
        assert!(parse_crs("EPSG:9999").is_err());
    }

    #[test]
    fn labels_every_table_source() {
        assert_eq!(source_label(TableSource::Sample), "built-in sample");
        assert_eq!(source_label(TableSource::RawData), "built from raw data");
    }
}
