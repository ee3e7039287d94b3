//! Color-block descriptor extraction and similarity scoring.
//!
//! The descriptor is a coarse summary: the sampled grid is cut into
//! non-overlapping B×B blocks, row-major, and each block contributes
//! its three normalized channel means. For a 64-pixel grid with
//! 8-pixel blocks that is 3 × (64/8)² = 192 values in [0, 1].

use crate::sampler::PixelGrid;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Block side used in the verification path.
pub const DEFAULT_BLOCK_SIDE: u32 = 8;

/// Distance at which similarity bottoms out at 0. Empirical, not
/// derived: the true maximal Euclidean distance for n values in [0,1]
/// is √n, well above 2.0 for any real grid, so dissimilar images can
/// floor at exactly 0. Overridable per call; do not re-derive it
/// without re-tuning the acceptance threshold.
pub const DEFAULT_MAX_DISTANCE: f32 = 2.0;

const CHANNEL_MAX: f32 = 255.0;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("block side {block_side} does not divide grid side {grid_side}")]
    BlockGrid { grid_side: u32, block_side: u32 },
}

/// Fixed-length feature vector for one photo.
///
/// Two descriptors are only comparable when extracted with the same
/// grid and block sides; [`similarity_with`](Self::similarity_with)
/// yields the defined degenerate 0.0 for mismatched lengths rather
/// than an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    pub values: Vec<f32>,
    /// Grid side the values were sampled at.
    pub sample_side: u32,
    /// Block side used to cut the grid.
    pub block_side: u32,
}

impl Descriptor {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Similarity in [0, 1] using [`DEFAULT_MAX_DISTANCE`].
    pub fn similarity(&self, other: &Descriptor) -> f32 {
        self.similarity_with(other, DEFAULT_MAX_DISTANCE)
    }

    /// Similarity in [0, 1]: `max(0, 1 − dist/max_distance)` with
    /// Euclidean `dist`.
    ///
    /// Unequal or zero lengths return 0.0 — a defined degenerate
    /// output, not an error. Callers that must distinguish "genuinely
    /// dissimilar" from "malformed comparison" check lengths first.
    /// Symmetric; self-similarity of a nonempty descriptor is 1.0.
    pub fn similarity_with(&self, other: &Descriptor, max_distance: f32) -> f32 {
        if self.values.is_empty() || self.values.len() != other.values.len() {
            return 0.0;
        }

        let dist = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt();

        (1.0 - dist / max_distance).max(0.0)
    }
}

/// Extract a descriptor from a sampled grid.
///
/// Blocks are visited top-to-bottom by row, left-to-right within a
/// row; each appends mean R, mean G, mean B normalized by 255. Pure
/// and deterministic: identical grids always yield identical values.
pub fn extract(grid: &PixelGrid, block_side: u32) -> Result<Descriptor, ExtractError> {
    let side = grid.side();
    if block_side == 0 || side % block_side != 0 {
        return Err(ExtractError::BlockGrid {
            grid_side: side,
            block_side,
        });
    }

    let blocks_per_side = side / block_side;
    let mut values = Vec::with_capacity((3 * blocks_per_side * blocks_per_side) as usize);
    let pixels = grid.pixels();
    let block_area = (block_side * block_side) as f32;

    for block_y in 0..blocks_per_side {
        for block_x in 0..blocks_per_side {
            let mut sum = [0.0f32; 3];
            for dy in 0..block_side {
                for dx in 0..block_side {
                    let p = pixels.get_pixel(block_x * block_side + dx, block_y * block_side + dy);
                    sum[0] += p.0[0] as f32;
                    sum[1] += p.0[1] as f32;
                    sum[2] += p.0[2] as f32;
                }
            }
            values.push(sum[0] / block_area / CHANNEL_MAX);
            values.push(sum[1] / block_area / CHANNEL_MAX);
            values.push(sum[2] / block_area / CHANNEL_MAX);
        }
    }

    Ok(Descriptor {
        values,
        sample_side: side,
        block_side,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(img: &RgbImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn solid_grid(color: [u8; 3]) -> PixelGrid {
        let img = RgbImage::from_pixel(64, 64, Rgb(color));
        sampler::sample(&png_bytes(&img), 64).unwrap()
    }

    #[test]
    fn test_extract_length_is_three_per_block() {
        let grid = solid_grid([10, 20, 30]);
        let d = extract(&grid, 8).unwrap();
        // 64/8 = 8 blocks per side → 64 blocks → 192 values
        assert_eq!(d.len(), 192);
        assert_eq!(d.sample_side, 64);
        assert_eq!(d.block_side, 8);
    }

    #[test]
    fn test_extract_solid_color_means() {
        let grid = solid_grid([255, 0, 128]);
        let d = extract(&grid, 8).unwrap();
        for chunk in d.values.chunks(3) {
            assert!((chunk[0] - 1.0).abs() < 1e-6);
            assert!(chunk[1].abs() < 1e-6);
            assert!((chunk[2] - 128.0 / 255.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_extract_row_major_block_order() {
        // Left half red, right half blue: within the first block row,
        // blocks 0..4 must read red and blocks 4..8 blue.
        let mut img = RgbImage::new(64, 64);
        for (x, _, p) in img.enumerate_pixels_mut() {
            *p = if x < 32 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) };
        }
        let grid = sampler::sample(&png_bytes(&img), 64).unwrap();
        let d = extract(&grid, 8).unwrap();

        let block = |i: usize| &d.values[i * 3..i * 3 + 3];
        assert!((block(0)[0] - 1.0).abs() < 1e-3, "block 0 should be red");
        assert!(block(0)[2] < 1e-3);
        assert!((block(7)[2] - 1.0).abs() < 1e-3, "block 7 should be blue");
        assert!(block(7)[0] < 1e-3);
        // Second block row starts back at the left edge.
        assert!((block(8)[0] - 1.0).abs() < 1e-3, "block 8 wraps to row 1");
    }

    #[test]
    fn test_extract_values_in_unit_range() {
        let grid = solid_grid([255, 255, 255]);
        let d = extract(&grid, 8).unwrap();
        assert!(d.values.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_extract_is_deterministic() {
        let img = RgbImage::from_fn(64, 64, |x, y| Rgb([(x * 4) as u8, (y * 4) as u8, 77]));
        let payload = png_bytes(&img);
        let a = extract(&sampler::sample(&payload, 64).unwrap(), 8).unwrap();
        let b = extract(&sampler::sample(&payload, 64).unwrap(), 8).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_extract_rejects_non_dividing_block() {
        let grid = solid_grid([0, 0, 0]);
        assert!(matches!(
            extract(&grid, 7),
            Err(ExtractError::BlockGrid { grid_side: 64, block_side: 7 })
        ));
        assert!(matches!(extract(&grid, 0), Err(ExtractError::BlockGrid { .. })));
    }

    #[test]
    fn test_similarity_identity_is_one() {
        let d = extract(&solid_grid([13, 200, 90]), 8).unwrap();
        assert!((d.similarity(&d) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let a = extract(&solid_grid([255, 0, 0]), 8).unwrap();
        let b = extract(&solid_grid([250, 5, 0]), 8).unwrap();
        assert_eq!(a.similarity(&b), b.similarity(&a));
    }

    #[test]
    fn test_similarity_stays_in_unit_range() {
        // Red vs blue is far beyond max_distance and must clamp at 0.
        let a = extract(&solid_grid([255, 0, 0]), 8).unwrap();
        let b = extract(&solid_grid([0, 0, 255]), 8).unwrap();
        let sim = a.similarity(&b);
        assert_eq!(sim, 0.0);
        let near = extract(&solid_grid([254, 1, 0]), 8).unwrap();
        let sim = a.similarity(&near);
        assert!((0.0..=1.0).contains(&sim));
        assert!(sim > 0.9);
    }

    #[test]
    fn test_similarity_length_mismatch_is_zero() {
        let a = extract(&solid_grid([9, 9, 9]), 8).unwrap();
        let b = extract(&solid_grid([9, 9, 9]), 16).unwrap();
        assert_ne!(a.len(), b.len());
        assert_eq!(a.similarity(&b), 0.0);
    }

    #[test]
    fn test_similarity_empty_is_zero() {
        let empty = Descriptor { values: vec![], sample_side: 0, block_side: 0 };
        assert_eq!(empty.similarity(&empty), 0.0);
    }

    #[test]
    fn test_similarity_respects_max_distance_override() {
        let a = Descriptor { values: vec![0.0, 0.0], sample_side: 1, block_side: 1 };
        let b = Descriptor { values: vec![1.0, 0.0], sample_side: 1, block_side: 1 };
        // dist = 1.0: default constant gives 0.5, a wider one gives 0.75
        assert!((a.similarity(&b) - 0.5).abs() < 1e-6);
        assert!((a.similarity_with(&b, 4.0) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_descriptor_serde_round_trip() {
        let d = extract(&solid_grid([1, 2, 3]), 8).unwrap();
        let json = serde_json::to_string(&d).unwrap();
        let back: Descriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(d, back);
    }
}
