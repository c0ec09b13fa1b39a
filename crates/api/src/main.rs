use api::{
    config::{ApiConfig, SERVICE_NAME},
    corrections::CorrectionStore,
    logging::setup_logging,
    metrics::ApiMetrics,
    pool::WorkerPool,
    server::run_server,
    state::AppState,
};
use common::TelemetryGuard;
use detector::{Detector, backend::ort::OrtBackend};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env()?;

    let _telemetry = config
        .otel_endpoint
        .as_deref()
        .map(|endpoint| TelemetryGuard::init(SERVICE_NAME, endpoint))
        .transpose()?;
    setup_logging(&config);

    tracing::info!(
        environment = config.environment.as_str(),
        bind_addr = %config.bind_addr,
        workers = config.workers,
        model_path = %config.detector.model_path,
        execution_provider = ?config.detector.execution_provider,
        "Starting vehicle detection API"
    );

    let detectors = (0..config.workers)
        .map(|worker| {
            tracing::info!(worker, "Loading model");
            Detector::<OrtBackend>::load(&config.detector)
        })
        .collect::<anyhow::Result<Vec<_>>>()
        .inspect_err(|e| tracing::error!(error = %e, "Failed to load model"))?;
    tracing::info!("Model loaded successfully");

    let corrections = CorrectionStore::open(&config.corrections_dir, config.retrain_threshold)
        .inspect_err(|e| {
            tracing::error!(
                error = %e,
                dir = %config.corrections_dir.display(),
                "Failed to prepare corrections directory"
            )
        })?;

    let pool = WorkerPool::spawn(detectors)?;
    let state = AppState::new(
        pool,
        ApiMetrics::new(SERVICE_NAME),
        corrections,
        config.detector.model_path.clone(),
    );

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .inspect_err(|e| tracing::error!(error = %e, addr = %config.bind_addr, "Failed to bind"))?;
    tracing::info!("HTTP server listening on {}", config.bind_addr);

    run_server(listener, state).await
}
