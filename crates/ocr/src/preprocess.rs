use image::{imageops::FilterType, DynamicImage, GrayImage, ImageBuffer, Luma};
use std::io::Cursor;
use thiserror::Error;

use crate::config::PreprocessConfig;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image: {0}")]
    Load(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

/// Decode raw image bytes (JPEG / PNG / WEBP / …), clean them up for OCR and
/// re-encode as PNG. With preprocessing disabled the input is passed through
/// untouched, not even decoded.
pub fn prepare_for_ocr(data: &[u8], config: &PreprocessConfig) -> Result<Vec<u8>, PreprocessError> {
    if !config.enabled {
        return Ok(data.to_vec());
    }
    let img = image::load_from_memory(data)?;
    encode_as_png(normalize(img, config))
}

/// Downscale oversized photos, convert to grayscale, optionally stretch contrast.
fn normalize(img: DynamicImage, config: &PreprocessConfig) -> DynamicImage {
    let max = config.max_dimension;
    let img = if img.width() > max || img.height() > max {
        img.resize(max, max, FilterType::Lanczos3)
    } else {
        img
    };

    let gray = img.to_luma8();
    if config.contrast_stretch {
        DynamicImage::ImageLuma8(stretch_contrast(gray))
    } else {
        DynamicImage::ImageLuma8(gray)
    }
}

/// Map the darkest pixel to 0 and the brightest to 255. Receipts photographed
/// under poor light often use only a narrow band of gray.
fn stretch_contrast(gray: GrayImage) -> GrayImage {
    let (min_px, max_px) = gray
        .pixels()
        .fold((u8::MAX, u8::MIN), |(mn, mx), p| (mn.min(p[0]), mx.max(p[0])));

    if max_px == min_px {
        return gray;
    }

    let range = u32::from(max_px - min_px);
    ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        let p = gray.get_pixel(x, y)[0];
        Luma([(u32::from(p - min_px) * 255 / range) as u8])
    })
}

fn encode_as_png(img: DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> DynamicImage {
        DynamicImage::ImageLuma8(ImageBuffer::from_fn(width, height, |x, y| Luma([f(x, y)])))
    }

    fn png_bytes(img: &DynamicImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png).unwrap();
        buf
    }

    #[test]
    fn uniform_image_is_left_alone() {
        let out = normalize(gray(10, 10, |_, _| 128), &PreprocessConfig::default());
        assert_eq!((out.width(), out.height()), (10, 10));
        assert!(out.to_luma8().pixels().all(|p| p[0] == 128));
    }

    #[test]
    fn narrow_band_is_stretched_to_full_range() {
        let out = normalize(gray(64, 1, |x, _| 100 + (x as u8 % 50)), &PreprocessConfig::default());
        let px = out.to_luma8();
        assert_eq!(px.pixels().map(|p| p[0]).min(), Some(0));
        assert_eq!(px.pixels().map(|p| p[0]).max(), Some(255));
    }

    #[test]
    fn stretch_can_be_disabled() {
        let config = PreprocessConfig { contrast_stretch: false, ..PreprocessConfig::default() };
        let out = normalize(gray(8, 1, |x, _| 100 + x as u8), &config);
        assert_eq!(out.to_luma8().pixels().map(|p| p[0]).max(), Some(107));
    }

    #[test]
    fn oversized_image_is_downscaled() {
        let config = PreprocessConfig { max_dimension: 50, ..PreprocessConfig::default() };
        let out = normalize(gray(200, 100, |_, _| 200), &config);
        assert!(out.width() <= 50 && out.height() <= 50);
    }

    #[test]
    fn prepare_produces_png() {
        let out = prepare_for_ocr(&png_bytes(&gray(4, 4, |_, _| 100)), &PreprocessConfig::default()).unwrap();
        assert_eq!(&out[..4], b"\x89PNG");
    }

    #[test]
    fn disabled_passes_bytes_through() {
        let config = PreprocessConfig { enabled: false, ..PreprocessConfig::default() };
        assert_eq!(prepare_for_ocr(b"not an image", &config).unwrap(), b"not an image");
    }

    #[test]
    fn garbage_bytes_fail_to_load() {
        let err = prepare_for_ocr(b"not an image", &PreprocessConfig::default()).unwrap_err();
        assert!(matches!(err, PreprocessError::Load(_)));
    }
}
