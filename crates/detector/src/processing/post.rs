use super::pre::Letterbox;
use std::cmp::Ordering;

/// One raw detection in original-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: f32,
    pub class_id: u32,
}

impl Detection {
    fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    fn iou(&self, other: &Detection) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let intersection = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area() + other.area() - intersection;

        if union <= 0.0 { 0.0 } else { intersection / union }
    }
}

pub struct PostProcessor {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl PostProcessor {
    pub fn new(confidence_threshold: f32, iou_threshold: f32, max_detections: usize) -> Self {
        Self {
            confidence_threshold,
            iou_threshold,
            max_detections,
        }
    }

    /// Decode a YOLOv8 detection head into detections on the original image.
    ///
    /// Output is ordered by descending confidence after class-aware NMS.
    #[tracing::instrument(skip(self, predictions, letterbox))]
    pub fn parse_detections(
        &self,
        predictions: &ndarray::ArrayViewD<f32>, // [1, 4 + num_classes, num_anchors]
        letterbox: &Letterbox,
    ) -> anyhow::Result<Vec<Detection>> {
        let shape = predictions.shape();
        if shape.len() != 3 || shape[0] != 1 || shape[1] < 5 {
            anyhow::bail!(
                "Unexpected model output shape {:?}, expected [1, 4 + num_classes, num_anchors]",
                shape
            );
        }

        let num_classes = shape[1] - 4;
        let num_anchors = shape[2];

        let mut candidates = Vec::new();

        for i in 0..num_anchors {
            let mut confidence = f32::NEG_INFINITY;
            let mut class_id = 0usize;
            for c in 0..num_classes {
                let score = predictions[[0, 4 + c, i]];
                if score > confidence {
                    confidence = score;
                    class_id = c;
                }
            }

            if confidence <= self.confidence_threshold {
                continue;
            }

            let (x1, y1, x2, y2) = cxcywh_to_xyxy(
                predictions[[0, 0, i]],
                predictions[[0, 1, i]],
                predictions[[0, 2, i]],
                predictions[[0, 3, i]],
            );

            candidates.push(Detection {
                x1,
                y1,
                x2,
                y2,
                confidence,
                class_id: class_id as u32,
            });
        }

        let candidate_count = candidates.len();
        let kept = non_max_suppression(candidates, self.iou_threshold, self.max_detections);

        tracing::trace!(
            num_anchors,
            candidate_count,
            kept = kept.len(),
            "Decoded detections"
        );

        Ok(kept
            .into_iter()
            .map(|det| to_original_coordinates(det, letterbox))
            .collect())
    }
}

/// Greedy class-aware NMS. Returns survivors by descending confidence.
fn non_max_suppression(
    mut candidates: Vec<Detection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Detection> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::new();
    for candidate in candidates {
        if kept.len() >= max_detections {
            break;
        }
        let suppressed = kept
            .iter()
            .any(|k| k.class_id == candidate.class_id && k.iou(&candidate) > iou_threshold);
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

/// Undo the letterbox and clip to the original image bounds.
fn to_original_coordinates(det: Detection, letterbox: &Letterbox) -> Detection {
    let w = letterbox.orig_width as f32;
    let h = letterbox.orig_height as f32;

    Detection {
        x1: ((det.x1 - letterbox.offset_x) / letterbox.scale).clamp(0.0, w),
        y1: ((det.y1 - letterbox.offset_y) / letterbox.scale).clamp(0.0, h),
        x2: ((det.x2 - letterbox.offset_x) / letterbox.scale).clamp(0.0, w),
        y2: ((det.y2 - letterbox.offset_y) / letterbox.scale).clamp(0.0, h),
        ..det
    }
}

/// Convert bounding box from center-width-height format to corner format
#[inline]
fn cxcywh_to_xyxy(cx: f32, cy: f32, w: f32, h: f32) -> (f32, f32, f32, f32) {
    (cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
}
