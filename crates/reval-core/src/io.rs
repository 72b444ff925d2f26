//! Byte-safe image loading.
//!
//! Paths are never handed to the decoder directly: the whole file is read
//! into memory first, then decoded from bytes. This avoids the
//! platform-dependent narrow-string path handling that caused silent zeros
//! upstream (spec §4.1/§9) — grounded on the teacher's
//! `processing::perceptual::phash_from_file` family, minus its TIFF/HEIC/RAW
//! fallback chain, which has no counterpart in a PNG/JPEG rendering
//! pipeline's output.

use crate::error::{Error, Result};
use image::DynamicImage;
use std::path::Path;

pub fn load(path: &Path) -> Result<DynamicImage> {
    let bytes = std::fs::read(path)?;
    image::load_from_memory(&bytes).map_err(|source| Error::DecodeFailure {
        path: path.to_path_buf(),
        source,
    })
}
