//! Image encoding: page images → PNG / JPEG bytes.
//!
//! PNG is lossless and keeps stroke edges crisp; it is also what gets
//! embedded in DOCX output. JPEG has no alpha channel, so pages are
//! flattened to RGB before encoding.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};
use std::io::Cursor;
use tracing::debug;

/// Largest width or height the JPEG format can store.
pub const JPEG_MAX_DIMENSION: u32 = 65_535;

/// Encode one image as PNG.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!("Encoded {}x{} → {} bytes PNG", img.width(), img.height(), buf.len());
    Ok(buf)
}

/// Encode one image as JPEG at `quality` (1–100).
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)))?;
    debug!("Encoded {}x{} → {} bytes JPEG", img.width(), img.height(), buf.len());
    Ok(buf)
}

/// Stack pages top to bottom into one image on a white canvas as wide as
/// the widest page.
pub fn stack_vertically(pages: &[DynamicImage]) -> DynamicImage {
    if let [single] = pages {
        return single.clone();
    }

    let width = pages.iter().map(|p| p.width()).max().unwrap_or(1).max(1);
    let height = pages.iter().map(|p| p.height()).sum::<u32>().max(1);
    let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

    let mut y = 0i64;
    for page in pages {
        image::imageops::replace(&mut canvas, &page.to_rgb8(), 0, y);
        y += i64::from(page.height());
    }
    DynamicImage::ImageRgb8(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn solid(w: u32, h: u32, px: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb(px)))
    }

    #[test]
    fn png_has_signature() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let data = encode_png(&img).expect("encode should succeed");
        assert!(data.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn jpeg_flattens_alpha() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 255, 128])));
        let data = encode_jpeg(&img, 80).expect("encode should succeed");
        assert!(data.starts_with(&[0xFF, 0xD8]));
    }

    #[test]
    fn stacking_sums_heights() {
        let pages = vec![solid(10, 20, [0, 0, 0]), solid(6, 5, [255, 0, 0])];
        let stacked = stack_vertically(&pages);
        assert_eq!((stacked.width(), stacked.height()), (10, 25));

        let rgb = stacked.to_rgb8();
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(rgb.get_pixel(0, 20), &Rgb([255, 0, 0]));
        // Narrower page leaves the canvas white to its right.
        assert_eq!(rgb.get_pixel(9, 24), &Rgb([255, 255, 255]));
    }

    #[test]
    fn single_page_is_unchanged() {
        let page = solid(4, 4, [1, 2, 3]);
        assert_eq!(stack_vertically(std::slice::from_ref(&page)), page);
    }
}
