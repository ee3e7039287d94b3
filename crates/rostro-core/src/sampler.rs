//! Image sampler — decode an arbitrary photo payload and resample it
//! into a fixed square RGB grid for descriptor extraction.

use image::imageops::FilterType;
use image::RgbImage;
use thiserror::Error;

/// Side length of the sampled grid in the verification path.
pub const DEFAULT_SAMPLE_SIDE: u32 = 64;

#[derive(Error, Debug)]
pub enum SampleError {
    #[error("empty image payload")]
    EmptyPayload,
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("sample side must be nonzero")]
    ZeroSide,
}

/// A decoded photo resampled to a fixed side×side RGB buffer.
///
/// Construction goes through [`sample`]; the side invariant always
/// holds for an existing grid.
pub struct PixelGrid {
    pixels: RgbImage,
}

impl PixelGrid {
    /// Side length in pixels (width == height).
    pub fn side(&self) -> u32 {
        self.pixels.width()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }
}

/// Decode `payload` and resample it to a `side`×`side` RGB grid.
///
/// Accepts any container format the `image` crate can sniff (PNG, JPEG,
/// WebP, …). Malformed or empty payloads are errors; a partial grid is
/// never produced.
pub fn sample(payload: &[u8], side: u32) -> Result<PixelGrid, SampleError> {
    if payload.is_empty() {
        return Err(SampleError::EmptyPayload);
    }
    if side == 0 {
        return Err(SampleError::ZeroSide);
    }

    let decoded = image::load_from_memory(payload)?;
    tracing::trace!(
        width = decoded.width(),
        height = decoded.height(),
        side,
        "decoded payload, resampling"
    );

    // Triangle (bilinear) filtering, same as the crop preprocessing in
    // the recognition path. Non-square inputs are stretched, not
    // cropped; the descriptor only needs a stable deterministic layout.
    let resized = decoded.resize_exact(side, side, FilterType::Triangle);

    Ok(PixelGrid {
        pixels: resized.to_rgb8(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb(color));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_sample_resizes_to_requested_side() {
        let payload = png_bytes(640, 480, [200, 10, 10]);
        let grid = sample(&payload, 64).unwrap();
        assert_eq!(grid.side(), 64);
        assert_eq!(grid.pixels().width(), 64);
        assert_eq!(grid.pixels().height(), 64);
    }

    #[test]
    fn test_sample_preserves_solid_color() {
        let payload = png_bytes(128, 128, [255, 0, 0]);
        let grid = sample(&payload, 64).unwrap();
        for pixel in grid.pixels().pixels() {
            assert_eq!(pixel.0, [255, 0, 0]);
        }
    }

    #[test]
    fn test_sample_empty_payload_is_error() {
        assert!(matches!(sample(&[], 64), Err(SampleError::EmptyPayload)));
    }

    #[test]
    fn test_sample_garbage_payload_is_error() {
        let garbage = vec![0xde, 0xad, 0xbe, 0xef, 0x00, 0x01];
        assert!(matches!(sample(&garbage, 64), Err(SampleError::Decode(_))));
    }

    #[test]
    fn test_sample_zero_side_is_error() {
        let payload = png_bytes(32, 32, [1, 2, 3]);
        assert!(matches!(sample(&payload, 0), Err(SampleError::ZeroSide)));
    }
}
