//! Image loading and RGB normalization
//!
//! Every image handed to the PDF assembler must be plain 8-bit RGB.
//! Transparent sources are flattened onto an opaque white background using
//! their own alpha channel as the mask; everything else goes through the
//! standard mode conversion.

use std::path::Path;

use image::{imageops, DynamicImage, RgbImage, Rgba, RgbaImage};
use tracing::debug;

use crate::error::{Error, Result};

/// Load `path` and normalize it to an 8-bit RGB raster.
///
/// Fails with [`Error::Decode`] when the file cannot be opened or decoded.
pub fn load_normalized(path: &Path) -> Result<RgbImage> {
    let decoded = image::open(path).map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(
        source = %path.display(),
        color = ?decoded.color(),
        "normalizing image"
    );

    Ok(normalize(decoded))
}

/// Normalize an already-decoded image to 8-bit RGB.
pub fn normalize(image: DynamicImage) -> RgbImage {
    match image {
        DynamicImage::ImageRgb8(rgb) => rgb,
        DynamicImage::ImageRgba8(rgba) => flatten_onto_white(rgba),
        DynamicImage::ImageRgba16(_) | DynamicImage::ImageRgba32F(_) => {
            flatten_onto_white(image.to_rgba8())
        }
        other => other.to_rgb8(),
    }
}

/// Composite a transparent image onto an opaque white canvas.
///
/// A pixel with alpha 0 comes out pure white regardless of its RGB channels;
/// partial alpha blends toward white.
fn flatten_onto_white(rgba: RgbaImage) -> RgbImage {
    let (width, height) = rgba.dimensions();
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    imageops::overlay(&mut canvas, &rgba, 0, 0);
    DynamicImage::ImageRgba8(canvas).to_rgb8()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_rgb_passes_through_unchanged() {
        let source = RgbImage::from_fn(8, 4, |x, y| Rgb([x as u8, y as u8, 200]));

        let normalized = normalize(DynamicImage::ImageRgb8(source.clone()));

        assert_eq!(normalized, source);
    }

    #[test]
    fn test_fully_transparent_becomes_white() {
        let mut source = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        // Saturated red, but invisible.
        source.put_pixel(1, 2, Rgba([255, 0, 0, 0]));

        let normalized = normalize(DynamicImage::ImageRgba8(source));

        assert_eq!(normalized.get_pixel(1, 2), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_opaque_rgba_keeps_its_colors() {
        let source = RgbaImage::from_pixel(3, 3, Rgba([10, 20, 30, 255]));

        let normalized = normalize(DynamicImage::ImageRgba8(source));

        assert_eq!(normalized.get_pixel(0, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_partial_alpha_blends_toward_white() {
        let source = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128]));

        let normalized = normalize(DynamicImage::ImageRgba8(source));

        let Rgb([r, g, b]) = *normalized.get_pixel(0, 0);
        // Half-transparent black over white lands near mid-gray.
        for channel in [r, g, b] {
            assert!((120..=135).contains(&channel), "channel {channel} out of range");
        }
    }

    #[test]
    fn test_grayscale_converts_to_rgb() {
        let source = image::GrayImage::from_pixel(2, 2, image::Luma([90]));

        let normalized = normalize(DynamicImage::ImageLuma8(source));

        assert_eq!(normalized.get_pixel(0, 0), &Rgb([90, 90, 90]));
    }

    #[test]
    fn test_load_rejects_non_image() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("not_an_image.png");
        std::fs::write(&path, b"plainly not a PNG").expect("write file");

        let result = load_normalized(&path);

        assert!(matches!(result, Err(Error::Decode { .. })));
    }
}
