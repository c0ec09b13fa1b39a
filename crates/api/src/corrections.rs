use chrono::{DateTime, Local};
use detector::Label;
use image::RgbImage;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const CORRECTED_CLASSES: [Label; 2] = [Label::Front, Label::Rear];

/// Extensions kept as-is when saving; anything else is stored as PNG.
const SAVED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CorrectionCounts {
    pub front: usize,
    pub rear: usize,
}

impl CorrectionCounts {
    pub fn total(&self) -> usize {
        self.front + self.rear
    }
}

/// Images users flagged as mislabelled, filed under `<root>/<class>/` for the
/// next retraining run.
#[derive(Debug)]
pub struct CorrectionStore {
    root: PathBuf,
    retrain_threshold: usize,
}

impl CorrectionStore {
    /// Creates the per-class folders if they are missing.
    pub fn open(root: impl Into<PathBuf>, retrain_threshold: usize) -> io::Result<Self> {
        let root = root.into();
        for label in CORRECTED_CLASSES {
            fs::create_dir_all(root.join(label.to_string()))?;
        }

        Ok(Self {
            root,
            retrain_threshold: retrain_threshold.max(1),
        })
    }

    pub fn retrain_threshold(&self) -> usize {
        self.retrain_threshold
    }

    pub fn save(&self, label: Label, filename: &str, image: &RgbImage) -> anyhow::Result<PathBuf> {
        let dir = self.root.join(label.to_string());
        fs::create_dir_all(&dir)?;

        let path = dir.join(stored_name(filename, Local::now()));
        image.save(&path)?;

        Ok(path)
    }

    pub fn counts(&self) -> io::Result<CorrectionCounts> {
        Ok(CorrectionCounts {
            front: count_files(&self.root.join(Label::Front.to_string()))?,
            rear: count_files(&self.root.join(Label::Rear.to_string()))?,
        })
    }
}

fn count_files(dir: &Path) -> io::Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut count = 0;
    for entry in entries {
        if entry?.file_type()?.is_file() {
            count += 1;
        }
    }
    Ok(count)
}

/// `<local timestamp>_<upload name>`, with any directory part of the upload
/// name dropped.
fn stored_name(filename: &str, now: DateTime<Local>) -> String {
    let base = Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload");

    let keeps_extension = Path::new(base)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SAVED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));

    let stamp = now.format("%Y%m%d_%H%M%S");
    if keeps_extension {
        format!("{}_{}", stamp, base)
    } else {
        format!("{}_{}.png", stamp, base)
    }
}
