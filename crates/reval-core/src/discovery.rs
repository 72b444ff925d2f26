//! Directory discovery (spec §6). Grounded on the teacher's
//! `discover_images`/`discover_images_in_directory`, generalized from a
//! recursive deduplication scan to a flat reference/candidate pool listing:
//! a reference or extracted directory is "a directory containing image
//! files", identified by basename without extension.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "tif", "tiff"];

/// One file found in a reference or extracted directory, with its derived
/// identifier (basename without extension).
#[derive(Debug, Clone)]
pub struct DiscoveredImage {
    pub id: String,
    pub path: PathBuf,
}

/// Lists image files directly inside `directory`, sorted by `id` ascending.
/// Non-image files are skipped with a `log::warn!`.
pub fn discover(directory: &Path) -> Result<Vec<DiscoveredImage>> {
    if !directory.exists() {
        return Err(Error::InputMissing(directory.to_path_buf()));
    }

    let mut found = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        if !is_image_path(&path) {
            log::warn!("skipping non-image file: {}", path.display());
            continue;
        }

        let id = match path.file_stem().and_then(|s| s.to_str()) {
            Some(s) => s.to_string(),
            None => {
                log::warn!("skipping file with non-UTF8 name: {}", path.display());
                continue;
            }
        };

        found.push(DiscoveredImage { id, path });
    }

    found.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(found)
}

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
