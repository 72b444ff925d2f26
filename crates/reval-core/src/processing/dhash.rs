//! Difference hash (spec §4.2). Grounded directly on
//! `jterrazz-lossless-vault`'s `compute_dhash`: resize to 9x8 grayscale,
//! compare each pixel with its right neighbor, emit 64 bits.

use image::{imageops::FilterType, DynamicImage};

const WIDTH: u32 = 9;
const HEIGHT: u32 = 8;

pub fn compute(img: &DynamicImage) -> u64 {
    let gray = img
        .grayscale()
        .resize_exact(WIDTH, HEIGHT, FilterType::Triangle)
        .to_luma8();

    let mut hash: u64 = 0;
    let mut bit = 0usize;
    for y in 0..HEIGHT {
        for x in 0..(WIDTH - 1) {
            let left = gray.get_pixel(x, y)[0];
            let right = gray.get_pixel(x + 1, y)[0];
            if left > right {
                hash |= 1 << (63 - bit);
            }
            bit += 1;
        }
    }
    hash
}

pub fn distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}
