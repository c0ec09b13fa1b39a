use std::str::FromStr;

pub const DEFAULT_INPUT_SIZE: u32 = 640;
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.7;
pub const DEFAULT_MAX_DETECTIONS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionProvider {
    Cpu,
    Cuda,
}

impl FromStr for ExecutionProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" => Ok(Self::Cuda),
            other => anyhow::bail!(
                "{} is not a supported execution provider. Use either `cpu` or `cuda`.",
                other
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub model_path: String,
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
    pub intra_threads: usize,
    pub execution_provider: ExecutionProvider,
}

impl DetectorConfig {
    /// Build from `lookup` (normally the process environment), falling back to
    /// defaults for unset or unparseable values.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let model_path = lookup("MODEL_PATH").unwrap_or_else(|| "models/best.onnx".to_string());

        let input_size = lookup("INPUT_SIZE")
            .and_then(|s| s.parse().ok())
            .filter(|&size: &u32| size > 0)
            .unwrap_or(DEFAULT_INPUT_SIZE);

        let confidence_threshold = lookup("CONFIDENCE_THRESHOLD")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD);

        let iou_threshold = lookup("IOU_THRESHOLD")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_IOU_THRESHOLD);

        let max_detections = lookup("MAX_DETECTIONS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_DETECTIONS);

        let intra_threads = lookup("INTRA_THREADS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1usize)
            .max(1);

        let execution_provider = match lookup("EXECUTION_PROVIDER") {
            Some(value) => value.parse()?,
            None => ExecutionProvider::Cpu,
        };

        for (name, value) in [
            ("CONFIDENCE_THRESHOLD", confidence_threshold),
            ("IOU_THRESHOLD", iou_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("{} must be within [0, 1], got {}", name, value);
            }
        }

        Ok(Self {
            model_path,
            input_size,
            confidence_threshold,
            iou_threshold,
            max_detections,
            intra_threads,
            execution_provider,
        })
    }

    /// Create default configuration for testing
    pub fn test_default() -> Self {
        Self {
            model_path: "/models/model.onnx".to_string(),
            input_size: DEFAULT_INPUT_SIZE,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            max_detections: DEFAULT_MAX_DETECTIONS,
            intra_threads: 1,
            execution_provider: ExecutionProvider::Cpu,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = DetectorConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.model_path, "models/best.onnx");
        assert_eq!(config.input_size, 640);
        assert_eq!(config.confidence_threshold, 0.25);
        assert_eq!(config.iou_threshold, 0.7);
        assert_eq!(config.max_detections, 300);
        assert_eq!(config.intra_threads, 1);
        assert_eq!(config.execution_provider, ExecutionProvider::Cpu);
    }

    #[test]
    fn test_overrides_and_unparseable_fallbacks() {
        let config = DetectorConfig::from_lookup(lookup_from(&[
            ("MODEL_PATH", "/srv/model.onnx"),
            ("INPUT_SIZE", "not-a-number"),
            ("CONFIDENCE_THRESHOLD", "0.4"),
            ("INTRA_THREADS", "0"),
            ("EXECUTION_PROVIDER", "CUDA"),
        ]))
        .unwrap();

        assert_eq!(config.model_path, "/srv/model.onnx");
        assert_eq!(config.input_size, 640, "Unparseable size falls back");
        assert_eq!(config.confidence_threshold, 0.4);
        assert_eq!(config.intra_threads, 1, "Zero threads is clamped to 1");
        assert_eq!(config.execution_provider, ExecutionProvider::Cuda);
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let result = DetectorConfig::from_lookup(lookup_from(&[("CONFIDENCE_THRESHOLD", "1.5")]));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("CONFIDENCE_THRESHOLD"), "got: {}", err);
    }

    #[test]
    fn test_rejects_unknown_execution_provider() {
        let result = DetectorConfig::from_lookup(lookup_from(&[("EXECUTION_PROVIDER", "tpu")]));
        assert!(result.is_err());
    }
}
