//! Identity catalog and the offline dataset loader.
//!
//! The dataset root holds one subdirectory per identity, each containing
//! that person's images. Subdirectories are scanned in sorted order so
//! label assignment is stable across runs.

use std::path::Path;

use color_eyre::Result;
use image::GrayImage;
use tracing::{info, warn};

/// Immutable label → name mapping, built once before the pipeline starts.
#[derive(Debug, Clone, Default)]
pub struct IdentityCatalog {
    names: Vec<String>,
}

impl IdentityCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Catalog with explicit names; label N maps to `names[N]`.
    pub fn from_names(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn resolve(&self, label: u32) -> Option<&str> {
        self.names.get(label as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Labeled grayscale images for recognizer training.
#[derive(Default)]
pub struct TrainingSet {
    pub images: Vec<(u32, GrayImage)>,
}

impl TrainingSet {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Scan the dataset root into a catalog and training set.
///
/// An absent root yields an empty catalog: the pipeline still runs and
/// every detection resolves to "Unknown". Unreadable images are skipped.
pub fn load_dataset(root: Option<&Path>) -> Result<(IdentityCatalog, TrainingSet)> {
    let Some(root) = root else {
        return Ok((IdentityCatalog::empty(), TrainingSet::default()));
    };
    if !root.is_dir() {
        warn!(root = %root.display(), "dataset directory not found, recognition disabled");
        return Ok((IdentityCatalog::empty(), TrainingSet::default()));
    }

    let mut person_dirs: Vec<_> = std::fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    person_dirs.sort();

    let mut names = Vec::new();
    let mut images = Vec::new();

    for dir in person_dirs {
        let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let label = names.len() as u32;

        let mut image_paths: Vec<_> = std::fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        image_paths.sort();

        for path in image_paths {
            match image::open(&path) {
                Ok(img) => images.push((label, img.into_luma8())),
                Err(e) => warn!(path = %path.display(), "skipping unreadable image: {e}"),
            }
        }

        names.push(name.to_string());
    }

    info!(
        identities = names.len(),
        images = images.len(),
        "dataset loaded"
    );
    Ok((IdentityCatalog { names }, TrainingSet { images }))
}
