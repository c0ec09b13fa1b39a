use detector::DetectorConfig;
use std::env;
use std::path::PathBuf;

pub use common::Environment;

pub const SERVICE_NAME: &str = "vehicle-api";

const DEFAULT_CORRECTIONS_DIR: &str = "corrections";
const DEFAULT_RETRAIN_THRESHOLD: usize = 50;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub environment: Environment,
    pub bind_addr: String,
    pub workers: usize,
    pub otel_endpoint: Option<String>,
    /// Root of the `<class>/` folders that user corrections are written to.
    pub corrections_dir: PathBuf,
    pub retrain_threshold: usize,
    pub detector: DetectorConfig,
}

impl ApiConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Environment::parse(&lookup("ENVIRONMENT").unwrap_or_default());

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:5000".to_string());

        let workers = lookup("WORKERS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(2usize)
            .max(1);

        let otel_endpoint = lookup("OTEL_ENDPOINT").filter(|s| !s.trim().is_empty());

        let corrections_dir = PathBuf::from(
            lookup("CORRECTIONS_DIR").unwrap_or_else(|| DEFAULT_CORRECTIONS_DIR.to_string()),
        );

        let retrain_threshold = lookup("RETRAIN_THRESHOLD")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RETRAIN_THRESHOLD)
            .max(1);

        let detector = DetectorConfig::from_lookup(&lookup)?;

        Ok(Self {
            environment,
            bind_addr,
            workers,
            otel_endpoint,
            corrections_dir,
            retrain_threshold,
            detector,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.bind_addr, "0.0.0.0:5000");
        assert_eq!(config.workers, 2);
        assert!(config.otel_endpoint.is_none());
        assert_eq!(config.detector.confidence_threshold, 0.25);
        assert_eq!(config.corrections_dir, PathBuf::from("corrections"));
        assert_eq!(config.retrain_threshold, 50);
    }

    #[test]
    fn test_retrain_threshold_is_at_least_one() {
        let config = ApiConfig::from_lookup(|key| {
            (key == "RETRAIN_THRESHOLD").then(|| "0".to_string())
        })
        .unwrap();
        assert_eq!(config.retrain_threshold, 1);
    }

    #[test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        // SAFETY: serialized with the other env-mutating tests.
        unsafe {
            env::set_var("ENVIRONMENT", "prod");
            env::set_var("WORKERS", "4");
            env::set_var("CORRECTIONS_DIR", "/var/lib/vehicle-api/corrections");
        }

        let config = ApiConfig::from_env().unwrap();

        unsafe {
            env::remove_var("ENVIRONMENT");
            env::remove_var("WORKERS");
            env::remove_var("CORRECTIONS_DIR");
        }

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.workers, 4);
        assert_eq!(
            config.corrections_dir,
            PathBuf::from("/var/lib/vehicle-api/corrections")
        );
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(|key| match key {
            "ENVIRONMENT" => Some("production".to_string()),
            "BIND_ADDR" => Some("127.0.0.1:8000".to_string()),
            "WORKERS" => Some("0".to_string()),
            "OTEL_ENDPOINT" => Some("http://collector:4317".to_string()),
            "MODEL_PATH" => Some("/opt/best.onnx".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.bind_addr, "127.0.0.1:8000");
        assert_eq!(config.workers, 1, "Zero workers is clamped to 1");
        assert_eq!(config.otel_endpoint.as_deref(), Some("http://collector:4317"));
        assert_eq!(config.detector.model_path, "/opt/best.onnx");
    }

    #[test]
    fn test_blank_otel_endpoint_is_ignored() {
        let config = ApiConfig::from_lookup(|key| {
            (key == "OTEL_ENDPOINT").then(|| "  ".to_string())
        })
        .unwrap();
        assert!(config.otel_endpoint.is_none());
    }

    #[test]
    fn test_invalid_detector_config_is_an_error() {
        let result = ApiConfig::from_lookup(|key| {
            (key == "IOU_THRESHOLD").then(|| "-0.1".to_string())
        });
        assert!(result.is_err());
    }
}
