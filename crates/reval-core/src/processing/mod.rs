//! Signal extraction: phash, dhash, local features, fallback signature
//! (spec §4.2).

pub mod dhash;
pub mod fallback;
pub mod features;
pub mod phash;

use crate::types::Signatures;
use image::DynamicImage;

/// Computes all four signatures for one decoded image. Pure function of
/// pixel data, satisfying the determinism invariant of spec §3.
pub fn compute_signatures(img: &DynamicImage) -> Signatures {
    Signatures {
        phash: phash::compute(img),
        dhash: dhash::compute(img),
        features: features::compute(img),
        fallback: fallback::compute(img),
    }
}
