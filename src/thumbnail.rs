//! Optional thumbnail rendering for embedded placemark previews.

use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat};

/// Decode the source image, honor its EXIF orientation, downscale to at
/// most `max_dim` on the longest side and re-encode as JPEG.
pub fn render_thumbnail(path: &Path, orientation: u32, max_dim: u32) -> Result<Vec<u8>> {
    let img = image::open(path)
        .with_context(|| format!("failed to decode image: {}", path.display()))?;
    let img = apply_orientation(img, orientation);
    let thumb = img.thumbnail(max_dim, max_dim);

    // JPEG has no alpha channel.
    let thumb = DynamicImage::ImageRgb8(thumb.to_rgb8());
    let mut buf = Vec::new();
    thumb
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .context("failed to encode thumbnail")?;
    Ok(buf)
}

/// Apply the transform named by an EXIF orientation value (1-8). Unknown
/// values leave the image untouched.
pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate270().fliph(),
        6 => img.rotate90(),
        7 => img.rotate90().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    #[test]
    fn test_rotation_swaps_dimensions() {
        let img = gradient(4, 2);
        assert_eq!(apply_orientation(img.clone(), 6).width(), 2);
        assert_eq!(apply_orientation(img.clone(), 8).height(), 4);
        // Flips and 180 rotation keep dimensions.
        assert_eq!(apply_orientation(img.clone(), 2).width(), 4);
        assert_eq!(apply_orientation(img.clone(), 3).width(), 4);
        // Unknown orientation is a no-op.
        assert_eq!(apply_orientation(img, 42).width(), 4);
    }

    #[test]
    fn test_render_thumbnail_bounds_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        gradient(64, 32).save(&path).unwrap();

        let bytes = render_thumbnail(&path, 1, 16).unwrap();
        let thumb = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg).unwrap();
        assert!(thumb.width() <= 16 && thumb.height() <= 16);
        // Aspect ratio preserved: 2:1 input stays 2:1.
        assert_eq!(thumb.width(), 16);
        assert_eq!(thumb.height(), 8);
    }

    #[test]
    fn test_render_thumbnail_undecodable_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();
        assert!(render_thumbnail(&path, 1, 16).is_err());
    }
}
