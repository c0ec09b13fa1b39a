use crate::{
    corrections::CorrectionCounts,
    error::{ApiError, MAX_BATCH_SIZE},
    pool::ImagePayload,
    response::{
        BatchItem, BatchResponse, CorrectionResponse, EndpointInfo, HealthResponse,
        PredictionResponse, ServiceInfo, StatsResponse, utc_timestamp,
    },
    state::AppState,
};
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    routing::{get, post},
};
use detector::{Label, Prediction, decode_image};
use serde::Deserialize;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

const IMAGE_FIELD: &str = "image";
const BATCH_FIELD: &str = "images";
const CORRECTION_FILE_FIELD: &str = "file";
const PREDICTED_CLASS_FIELD: &str = "predicted_class";
const CORRECT_CLASS_FIELD: &str = "correct_class";

const ENDPOINTS: [EndpointInfo; 7] = [
    EndpointInfo {
        method: "GET",
        path: "/",
        description: "Service information",
    },
    EndpointInfo {
        method: "GET",
        path: "/health",
        description: "Health check",
    },
    EndpointInfo {
        method: "POST",
        path: "/predict",
        description: "Detect vehicles in a multipart `image` upload",
    },
    EndpointInfo {
        method: "POST",
        path: "/predict/base64",
        description: "Detect vehicles in a JSON body `{\"image\": <base64>}`",
    },
    EndpointInfo {
        method: "POST",
        path: "/predict/batch",
        description: "Detect vehicles in up to 10 multipart `images` uploads",
    },
    EndpointInfo {
        method: "POST",
        path: "/correct",
        description: "Submit a mislabelled image with `file`, `predicted_class` and `correct_class`",
    },
    EndpointInfo {
        method: "GET",
        path: "/stats",
        description: "Correction counts and retraining progress",
    },
];

#[derive(Debug, Deserialize)]
pub struct Base64Request {
    pub image: Option<String>,
}

/// All routes. Upload size is left to the reverse proxy, so axum's default
/// body limit is disabled.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/predict/base64", post(predict_base64))
        .route("/predict/batch", post(predict_batch))
        .route("/correct", post(correct))
        .route("/stats", get(stats))
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn service_info(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "Vehicle Detection API",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
        model_loaded: state.model_loaded(),
        endpoints: ENDPOINTS.to_vec(),
    })
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        model_loaded: state.model_loaded(),
        timestamp: utc_timestamp(),
    })
}

#[tracing::instrument(skip_all)]
async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let start = Instant::now();

    let result = async {
        let mut multipart = multipart.map_err(|e| ApiError::Multipart(e.body_text()))?;
        let bytes = read_image_field(&mut multipart).await?;
        state.pool.detect(ImagePayload::Bytes(bytes)).await
    }
    .await;

    respond(&state, "/predict", start, result)
}

#[tracing::instrument(skip_all)]
async fn predict_base64(
    State(state): State<AppState>,
    body: Result<Json<Base64Request>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let start = Instant::now();

    let result = async {
        let Json(request) = body.map_err(|e| ApiError::InvalidJson(e.body_text()))?;
        let image = request.image.ok_or(ApiError::MissingImageData)?;
        state.pool.detect(ImagePayload::Base64(image)).await
    }
    .await;

    respond(&state, "/predict/base64", start, result)
}

#[tracing::instrument(skip_all)]
async fn predict_batch(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<BatchResponse>, ApiError> {
    let start = Instant::now();

    let mut multipart = multipart.map_err(|e| ApiError::Multipart(e.body_text()))?;
    let files = read_batch_fields(&mut multipart).await?;

    let mut results = Vec::with_capacity(files.len());
    for (filename, bytes) in files {
        let item = match state.pool.detect(ImagePayload::Bytes(bytes)).await {
            Ok(predictions) => BatchItem::success(filename, predictions),
            Err(e) => BatchItem::failure(filename, e.to_string()),
        };
        results.push(item);
    }

    let succeeded = results.iter().filter(|item| item.is_success()).count();
    let detections = results.iter().map(BatchItem::count).sum();
    let outcome = if succeeded == results.len() {
        "success"
    } else {
        "partial"
    };
    let elapsed = start.elapsed().as_secs_f64();
    state
        .metrics
        .record("/predict/batch", outcome, elapsed, detections);

    tracing::info!(
        total = results.len(),
        succeeded,
        elapsed_ms = elapsed * 1000.0,
        "Batch served"
    );

    Ok(Json(BatchResponse::new(results)))
}

#[tracing::instrument(skip_all)]
async fn correct(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<CorrectionResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::Multipart(e.body_text()))?;
    let form = read_correction_form(&mut multipart).await?;
    let label = Label::from_name(form.correct_class.trim()).ok_or(ApiError::InvalidClass)?;

    let store = Arc::clone(&state.corrections);
    let counts = tokio::task::spawn_blocking(move || -> Result<CorrectionCounts, ApiError> {
        let image = decode_image(&form.data)?;
        let path = store
            .save(label, &form.filename, &image)
            .map_err(correction_error)?;

        tracing::info!(
            path = %path.display(),
            predicted = %form.predicted_class,
            corrected = %label,
            "Correction saved"
        );

        store.counts().map_err(correction_error)
    })
    .await
    .map_err(correction_error)??;

    let threshold = state.corrections.retrain_threshold();
    if counts.total() >= threshold {
        tracing::info!(
            corrections = counts.total(),
            threshold,
            "Retraining threshold reached"
        );
    }

    Ok(Json(CorrectionResponse::new(counts, threshold)))
}

async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let store = Arc::clone(&state.corrections);
    let counts = tokio::task::spawn_blocking(move || store.counts())
        .await
        .map_err(correction_error)?
        .map_err(correction_error)?;

    Ok(Json(StatsResponse::new(
        counts,
        state.corrections.retrain_threshold(),
        state.model_loaded(),
        state.model_path.clone(),
    )))
}

fn correction_error(e: impl Display) -> ApiError {
    ApiError::Correction(e.to_string())
}

fn respond(
    state: &AppState,
    route: &'static str,
    start: Instant,
    result: Result<Vec<Prediction>, ApiError>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let elapsed = start.elapsed().as_secs_f64();

    match result {
        Ok(predictions) => {
            state
                .metrics
                .record(route, "success", elapsed, predictions.len());
            tracing::info!(
                route,
                count = predictions.len(),
                elapsed_ms = elapsed * 1000.0,
                "Prediction served"
            );
            Ok(Json(PredictionResponse::new(predictions)))
        }
        Err(e) => {
            state.metrics.record(route, e.kind(), elapsed, 0);
            Err(e)
        }
    }
}

fn multipart_error(e: MultipartError) -> ApiError {
    ApiError::Multipart(e.body_text())
}

/// First file in the `image` field. Plain form values under that name are ignored.
async fn read_image_field(multipart: &mut Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        match field.file_name() {
            None => continue,
            Some("") => return Err(ApiError::EmptyFilename),
            Some(_) => {}
        }
        let data = field.bytes().await.map_err(multipart_error)?;
        return Ok(data.to_vec());
    }

    Err(ApiError::MissingFile)
}

async fn read_batch_fields(
    multipart: &mut Multipart,
) -> Result<Vec<(Option<String>, Vec<u8>)>, ApiError> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(BATCH_FIELD) {
            continue;
        }
        if files.len() == MAX_BATCH_SIZE {
            return Err(ApiError::BatchTooLarge);
        }
        let filename = field.file_name().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_error)?;
        files.push((filename, data.to_vec()));
    }

    if files.is_empty() {
        return Err(ApiError::EmptyBatch);
    }

    Ok(files)
}

struct CorrectionForm {
    filename: String,
    data: Vec<u8>,
    predicted_class: String,
    correct_class: String,
}

async fn read_correction_form(multipart: &mut Multipart) -> Result<CorrectionForm, ApiError> {
    let mut file = None;
    let mut predicted_class = None;
    let mut correct_class = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(CORRECTION_FILE_FIELD) => {
                let Some(filename) = field.file_name().map(str::to_string) else {
                    continue;
                };
                if filename.is_empty() {
                    return Err(ApiError::EmptyFilename);
                }
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some((filename, data.to_vec()));
            }
            Some(PREDICTED_CLASS_FIELD) => {
                predicted_class = Some(field.text().await.map_err(multipart_error)?);
            }
            Some(CORRECT_CLASS_FIELD) => {
                correct_class = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let correct_class = correct_class.ok_or(ApiError::MissingField(CORRECT_CLASS_FIELD))?;
    let predicted_class = predicted_class.ok_or(ApiError::MissingField(PREDICTED_CLASS_FIELD))?;
    let (filename, data) = file.ok_or(ApiError::MissingFile)?;

    Ok(CorrectionForm {
        filename,
        data,
        predicted_class,
        correct_class,
    })
}
