use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryActivityRepository, LoggingScoreSink};
use crate::routes::with_scoring_routes;
use activity_points::config::AppConfig;
use activity_points::error::AppError;
use activity_points::scoring::{ScoringEngine, ScoringService};
use activity_points::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
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

    let rules = config.scoring.load_rules()?;
    info!(
        rules_version = rules.version(),
        categories = rules.categories().len(),
        max_total = rules.max_total(),
        level_mismatch = ?config.scoring.level_mismatch,
        "rule table loaded"
    );

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryActivityRepository::default());
    let sink = Arc::new(LoggingScoreSink::default());
    let engine = ScoringEngine::new(Arc::new(rules), config.scoring.level_mismatch);
    let scoring_service = Arc::new(ScoringService::new(repository, sink, engine));

    let app = with_scoring_routes(scoring_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "activity points service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
