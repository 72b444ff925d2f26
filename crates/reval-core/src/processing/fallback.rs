//! Fallback grayscale signature (spec §4.2). Grounded on the teacher's
//! direct grayscale-resize idiom in `calculate_phash`/`calculate_enhanced_phash`.

use crate::types::FallbackSignature;
use image::{imageops::FilterType, DynamicImage};

pub fn compute(img: &DynamicImage) -> FallbackSignature {
    let side = FallbackSignature::SIDE as u32;
    let gray = img
        .grayscale()
        .resize_exact(side, side, FilterType::Triangle)
        .to_luma8();

    let pixels = gray.pixels().map(|p| p[0] as f32 / 255.0).collect();
    FallbackSignature { pixels }
}

/// Similarity is `1 - mean(|a - b|)`, a real in [0, 1], higher is better.
pub fn similarity(a: &FallbackSignature, b: &FallbackSignature) -> f64 {
    debug_assert_eq!(a.pixels.len(), b.pixels.len());
    let n = a.pixels.len().min(b.pixels.len());
    if n == 0 {
        return 0.0;
    }
    let sum: f64 = a.pixels[..n]
        .iter()
        .zip(b.pixels[..n].iter())
        .map(|(x, y)| (*x as f64 - *y as f64).abs())
        .sum();
    1.0 - (sum / n as f64)
}
