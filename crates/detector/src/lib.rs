pub mod backend;
pub mod config;
pub mod decode;
pub mod detector;
pub mod labels;
pub mod prediction;
pub mod processing;

// Re-export commonly used types for convenience
pub use backend::{InferenceBackend, InferenceOutput};
pub use config::DetectorConfig;
pub use decode::{DecodeError, decode_base64, decode_image};
pub use detector::Detector;
pub use labels::Label;
pub use prediction::{BoundingBox, Prediction};
