//! Perceptual hash
//!
//! DCT-based 64-bit fingerprint: grayscale, shrink to 32x32, take the
//! lowest 8x8 frequencies and set one bit per coefficient above their median.
//! Visually similar images land within a few bits of each other.

use image::imageops::{self, FilterType};
use image::RgbImage;

const SAMPLE_SIZE: usize = 32;
const HASH_SIZE: usize = 8;

/// Compute the perceptual hash of a bitmap as 16 lowercase hex characters
pub fn perceptual_hash(bitmap: &RgbImage) -> String {
    let gray = imageops::grayscale(bitmap);
    let small = imageops::resize(
        &gray,
        SAMPLE_SIZE as u32,
        SAMPLE_SIZE as u32,
        FilterType::Lanczos3,
    );

    let pixels: Vec<f64> = small.pixels().map(|p| p.0[0] as f64).collect();
    let coefficients = dct_2d(&pixels, SAMPLE_SIZE);

    let mut low = Vec::with_capacity(HASH_SIZE * HASH_SIZE);
    for row in 0..HASH_SIZE {
        for col in 0..HASH_SIZE {
            low.push(coefficients[row * SAMPLE_SIZE + col]);
        }
    }

    let median = median(&low);
    let bits = low
        .iter()
        .fold(0u64, |acc, &c| (acc << 1) | u64::from(c > median));

    format!("{:016x}", bits)
}

/// Separable unnormalized DCT-II over a square `size` x `size` block.
/// Scaling is irrelevant since only comparisons against the median matter.
fn dct_2d(input: &[f64], size: usize) -> Vec<f64> {
    let n = size as f64;
    let mut cosines = vec![0.0; size * size];
    for k in 0..size {
        for i in 0..size {
            cosines[k * size + i] =
                (std::f64::consts::PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n)).cos();
        }
    }

    // Columns first, then rows
    let mut columns = vec![0.0; size * size];
    for col in 0..size {
        for k in 0..size {
            columns[k * size + col] = (0..size)
                .map(|row| input[row * size + col] * cosines[k * size + row])
                .sum();
        }
    }

    let mut output = vec![0.0; size * size];
    for row in 0..size {
        for k in 0..size {
            output[row * size + k] = (0..size)
                .map(|col| columns[row * size + col] * cosines[k * size + col])
                .sum();
        }
    }

    output
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
