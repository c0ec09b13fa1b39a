use crate::config::DetectorConfig;
use ndarray::{Array, ArrayD, IxDyn};

#[cfg(feature = "ort-backend")]
pub mod ort;

/// A loaded detection model. Each worker owns one instance and drives it
/// from a single thread, so `infer` takes `&mut self` and no locking is needed.
pub trait InferenceBackend {
    fn load_model(config: &DetectorConfig) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Run inference on a `[1, 3, H, W]` input tensor
    fn infer(&mut self, images: &Array<f32, IxDyn>) -> anyhow::Result<InferenceOutput>;
}

pub struct InferenceOutput {
    pub predictions: ArrayD<f32>, // [1, 4 + num_classes, num_anchors] cxcywh in input pixels, then class scores
}
