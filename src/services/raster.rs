// src/services/raster.rs
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, RgbaImage};

use crate::errors::PlatingError;

/// Decode/encode capability the pipeline stages run on. Pixel work itself
/// happens directly on the decoded `RgbaImage`.
pub trait RasterSurface: Send + Sync {
    fn decode(&self, data: &[u8]) -> Result<RgbaImage, PlatingError>;

    fn encode(&self, raster: &RgbaImage, quality: u8) -> Result<Bytes, PlatingError>;
}

/// Decodes anything the `image` crate understands and always encodes JPEG.
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegSurface;

impl RasterSurface for JpegSurface {
    fn decode(&self, data: &[u8]) -> Result<RgbaImage, PlatingError> {
        let img = image::load_from_memory(data)
            .map_err(|e| PlatingError::ImageProcessing(format!("Invalid image format: {}", e)))?;
        Ok(img.to_rgba8())
    }

    fn encode(&self, raster: &RgbaImage, quality: u8) -> Result<Bytes, PlatingError> {
        // JPEG has no alpha channel; it is dropped, not composited.
        let rgb = image::DynamicImage::ImageRgba8(raster.clone()).to_rgb8();

        let mut output = Vec::new();
        JpegEncoder::new_with_quality(&mut output, quality.clamp(1, 100))
            .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
            .map_err(|e| PlatingError::ImageProcessing(format!("Failed to encode JPEG: {}", e)))?;

        Ok(Bytes::from(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn encode_then_decode_keeps_dimensions() {
        let raster = RgbaImage::from_pixel(7, 5, Rgba([120, 80, 40, 255]));
        let surface = JpegSurface;

        let jpeg = surface.encode(&raster, 90).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let decoded = surface.decode(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (7, 5));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = JpegSurface.decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, PlatingError::ImageProcessing(_)));
    }
}
