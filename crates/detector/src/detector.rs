use crate::{
    backend::{InferenceBackend, InferenceOutput},
    config::DetectorConfig,
    prediction::Prediction,
    processing::{post::PostProcessor, pre::PreProcessor},
};
use common::span;
use image::RgbImage;

/// Runs one decoded image through preprocessing, the model and postprocessing.
///
/// Predictions keep the order the postprocessor emits them in.
pub struct Detector<B: InferenceBackend> {
    backend: B,
    preprocessor: PreProcessor,
    postprocessor: PostProcessor,
}

impl<B: InferenceBackend> Detector<B> {
    /// Load the model named by `config`. Errors here are fatal at startup.
    pub fn load(config: &DetectorConfig) -> anyhow::Result<Self> {
        let backend = B::load_model(config)?;
        Ok(Self::new(backend, config))
    }

    pub fn new(backend: B, config: &DetectorConfig) -> Self {
        Self {
            backend,
            preprocessor: PreProcessor::new(config.input_size),
            postprocessor: PostProcessor::new(
                config.confidence_threshold,
                config.iou_threshold,
                config.max_detections,
            ),
        }
    }

    pub fn detect(&mut self, image: &RgbImage) -> anyhow::Result<Vec<Prediction>> {
        let (input, letterbox) = self.preprocessor.preprocess(image)?;

        let InferenceOutput { predictions } = {
            let _s = span!("model_inference");
            self.backend.infer(&input)?
        };

        let detections = self
            .postprocessor
            .parse_detections(&predictions.view(), &letterbox)?;

        tracing::debug!(
            width = image.width(),
            height = image.height(),
            detections = detections.len(),
            "Image processed"
        );

        Ok(detections.iter().map(Prediction::from).collect())
    }
}
