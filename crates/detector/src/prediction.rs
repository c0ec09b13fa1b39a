use crate::labels::Label;
use crate::processing::post::Detection;
use serde::Serialize;

pub const CONFIDENCE_DECIMALS: i32 = 4;
pub const BBOX_DECIMALS: i32 = 2;

/// A detection as returned to clients: labelled, rounded, ready to serialize.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub class: Label,
    pub confidence: f64,
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl From<&Detection> for Prediction {
    fn from(det: &Detection) -> Self {
        let coord = |v: f32| round_to(v as f64, BBOX_DECIMALS);
        Self {
            class: Label::from_class_id(det.class_id),
            confidence: round_to(det.confidence as f64, CONFIDENCE_DECIMALS),
            bbox: BoundingBox {
                x1: coord(det.x1),
                y1: coord(det.y1),
                x2: coord(det.x2),
                y2: coord(det.y2),
            },
        }
    }
}

/// Round to `decimals` places, exact ties going to the even digit.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.876543, 4), 0.8765);
        assert_eq!(round_to(123.456, 2), 123.46);
        assert_eq!(round_to(-1.005, 0), -1.0);
        assert_eq!(round_to(0.0, 4), 0.0);
    }

    #[test]
    fn test_exact_ties_round_to_even() {
        assert_eq!(round_to(1919.125, BBOX_DECIMALS), 1919.12);
        assert_eq!(round_to(10.375, BBOX_DECIMALS), 10.38);
        assert_eq!(round_to(0.5, 0), 0.0);
        assert_eq!(round_to(2.5, 0), 2.0);
        assert_eq!(round_to(0.90625, CONFIDENCE_DECIMALS), 0.9062);
    }

    #[test]
    fn test_tied_detection_values() {
        let det = Detection {
            x1: 1919.125,
            y1: 0.0,
            x2: 10.375,
            y2: 12.625,
            confidence: 0.90625,
            class_id: 0,
        };

        let prediction = Prediction::from(&det);

        assert_eq!(prediction.bbox.x1, 1919.12);
        assert_eq!(prediction.bbox.x2, 10.38);
        assert_eq!(prediction.bbox.y2, 12.62);
        assert_eq!(prediction.confidence, 0.9062);
    }

    #[test]
    fn test_rounding_is_idempotent() {
        let samples = [
            0.0, 0.1, 0.25, 0.33333, 0.87654, 0.99995, 1.0, 12.345, 639.999, 1919.12, 4096.7777,
        ];
        for value in samples {
            for decimals in [CONFIDENCE_DECIMALS, BBOX_DECIMALS] {
                let once = round_to(value, decimals);
                assert_eq!(
                    round_to(once, decimals),
                    once,
                    "re-rounding {} at {} decimals changed it",
                    value,
                    decimals
                );
            }
        }
    }

    #[test]
    fn test_from_detection_rounds_and_labels() {
        let det = Detection {
            x1: 10.123,
            y1: 20.456,
            x2: 30.999,
            y2: 40.0,
            confidence: 0.876_54,
            class_id: 1,
        };

        let prediction = Prediction::from(&det);

        assert_eq!(prediction.class, Label::Rear);
        assert_eq!(prediction.confidence, 0.8765);
        assert_eq!(prediction.bbox.x1, 10.12);
        assert_eq!(prediction.bbox.y1, 20.46);
        assert_eq!(prediction.bbox.x2, 31.0);
        assert_eq!(prediction.bbox.y2, 40.0);
    }

    #[test]
    fn test_serialized_shape() {
        let prediction = Prediction {
            class: Label::Unknown(5),
            confidence: 0.5,
            bbox: BoundingBox {
                x1: 1.0,
                y1: 2.0,
                x2: 3.0,
                y2: 4.0,
            },
        };

        let json = serde_json::to_value(&prediction).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "class": "class_5",
                "confidence": 0.5,
                "bbox": {"x1": 1.0, "y1": 2.0, "x2": 3.0, "y2": 4.0}
            })
        );
    }
}
