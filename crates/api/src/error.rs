use crate::response::ErrorResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use detector::DecodeError;
use thiserror::Error;

pub const MAX_BATCH_SIZE: usize = 10;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No image file provided")]
    MissingFile,

    #[error("Empty filename")]
    EmptyFilename,

    #[error("No image data provided")]
    MissingImageData,

    #[error("No images provided")]
    EmptyBatch,

    #[error("Maximum {} images allowed per batch", MAX_BATCH_SIZE)]
    BatchTooLarge,

    #[error("Missing form field: {0}")]
    MissingField(&'static str),

    #[error("Invalid class. Must be one of: front, rear")]
    InvalidClass,

    #[error("Invalid multipart request: {0}")]
    Multipart(String),

    #[error("Invalid JSON body: {0}")]
    InvalidJson(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("{0}")]
    Inference(String),

    #[error("Inference worker unavailable")]
    WorkerUnavailable,

    #[error("{0}")]
    Correction(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingFile
            | ApiError::EmptyFilename
            | ApiError::MissingImageData
            | ApiError::EmptyBatch
            | ApiError::BatchTooLarge
            | ApiError::MissingField(_)
            | ApiError::InvalidClass
            | ApiError::Multipart(_)
            | ApiError::InvalidJson(_)
            | ApiError::Decode(_) => StatusCode::BAD_REQUEST,
            ApiError::Inference(_) | ApiError::WorkerUnavailable | ApiError::Correction(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short machine-friendly tag used as a metric attribute.
    pub fn kind(&self) -> &'static str {
        match self.status_code() {
            StatusCode::BAD_REQUEST => "client_error",
            _ => "server_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Rejected request");
        }

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_formatting() {
        assert_eq!(ApiError::MissingFile.to_string(), "No image file provided");
        assert_eq!(ApiError::EmptyFilename.to_string(), "Empty filename");
        assert_eq!(
            ApiError::MissingImageData.to_string(),
            "No image data provided"
        );
        assert_eq!(
            ApiError::BatchTooLarge.to_string(),
            "Maximum 10 images allowed per batch"
        );
        assert_eq!(
            ApiError::Inference("model exploded".to_string()).to_string(),
            "model exploded",
            "Inference errors keep the raw message"
        );
        assert_eq!(
            ApiError::Decode(DecodeError::Empty).to_string(),
            "Empty image data"
        );
        assert_eq!(
            ApiError::MissingField("correct_class").to_string(),
            "Missing form field: correct_class"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::MissingFile.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Decode(DecodeError::Empty).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Inference(String::new()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::WorkerUnavailable.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::InvalidClass.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Correction("disk full".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::WorkerUnavailable.kind(), "server_error");
        assert_eq!(ApiError::EmptyBatch.kind(), "client_error");
    }

    #[test]
    fn test_decode_error_conversion() {
        fn decode() -> Result<(), ApiError> {
            detector::decode_image(&[])?;
            Ok(())
        }

        assert!(matches!(decode(), Err(ApiError::Decode(DecodeError::Empty))));
    }
}
