use serde::{Serialize, Serializer};
use std::fmt;

/// Vehicle view predicted by the detector.
///
/// Class ids outside the trained set map to [`Label::Unknown`], rendered as
/// `class_<id>`, so an unexpected model never fails a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Front,
    Rear,
    Unknown(u32),
}

impl Label {
    pub fn from_class_id(class_id: u32) -> Self {
        match class_id {
            0 => Label::Front,
            1 => Label::Rear,
            other => Label::Unknown(other),
        }
    }

    /// Trained class names only; synthetic `class_<id>` labels are rejected.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "front" => Some(Label::Front),
            "rear" => Some(Label::Rear),
            _ => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Front => f.write_str("front"),
            Label::Rear => f.write_str("rear"),
            Label::Unknown(id) => write!(f, "class_{}", id),
        }
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_classes() {
        assert_eq!(Label::from_class_id(0), Label::Front);
        assert_eq!(Label::from_class_id(1), Label::Rear);
        assert_eq!(Label::Front.to_string(), "front");
        assert_eq!(Label::Rear.to_string(), "rear");
    }

    #[test]
    fn test_unknown_class_gets_synthetic_label() {
        let label = Label::from_class_id(7);
        assert_eq!(label, Label::Unknown(7));
        assert_eq!(label.to_string(), "class_7");
    }

    #[test]
    fn test_from_name_accepts_trained_classes_only() {
        assert_eq!(Label::from_name("front"), Some(Label::Front));
        assert_eq!(Label::from_name("rear"), Some(Label::Rear));
        assert_eq!(Label::from_name("class_7"), None);
        assert_eq!(Label::from_name("Front"), None);
        assert_eq!(Label::from_name(""), None);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let json = serde_json::to_string(&[Label::Front, Label::Unknown(2)]).unwrap();
        assert_eq!(json, r#"["front","class_2"]"#);
    }
}
