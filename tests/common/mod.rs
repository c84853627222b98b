#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use image::{Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use plating::config::Config;
use plating::errors::PlatingError;
use plating::services::{BackgroundRemover, ImageProcessor, JpegSurface, RasterSurface};

/// Uniform-colour JPEG of the given size.
pub fn jpeg(width: u32, height: u32, rgb: [u8; 3]) -> Bytes {
    let raster = RgbaImage::from_pixel(width, height, Rgba([rgb[0], rgb[1], rgb[2], 255]));
    JpegSurface.encode(&raster, 95).unwrap()
}

/// Uniform-colour PNG of the given size.
pub fn png(width: u32, height: u32, rgba: [u8; 4]) -> Bytes {
    let raster = RgbaImage::from_pixel(width, height, Rgba(rgba));
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(raster)
        .write_to(&mut Cursor::new(&mut out), image::ImageOutputFormat::Png)
        .unwrap();
    Bytes::from(out)
}

pub fn decode(data: &[u8]) -> RgbaImage {
    JpegSurface.decode(data).unwrap()
}

/// Mean of (R+G+B)/3 over all pixels, 0..255.
pub fn mean_level(data: &[u8]) -> f64 {
    let raster = decode(data);
    let sum: f64 = raster
        .pixels()
        .map(|p| (p[0] as f64 + p[1] as f64 + p[2] as f64) / 3.0)
        .sum();
    sum / (raster.width() as f64 * raster.height() as f64)
}

/// Background remover that records calls instead of touching the network.
pub struct FakeRemover {
    pub calls: AtomicUsize,
    pub delay: Duration,
    pub response: Result<Bytes, PlatingError>,
}

impl FakeRemover {
    pub fn returning(response: Result<Bytes, PlatingError>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            response,
        })
    }

    pub fn slow(response: Result<Bytes, PlatingError>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
            response,
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackgroundRemover for FakeRemover {
    async fn remove_background(
        &self,
        _image: Bytes,
        _api_key: &str,
    ) -> Result<Bytes, PlatingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.response.clone()
    }
}

pub fn processor_with(remover: Arc<FakeRemover>, api_key: Option<&str>) -> ImageProcessor {
    let config = Config {
        remove_bg_api_key: api_key.map(str::to_string),
        ..Config::default()
    };
    ImageProcessor::with_remover(&config, remover)
}

/// Processor without an API key whose remover always fails.
pub fn offline_processor() -> ImageProcessor {
    processor_with(FakeRemover::returning(Err(PlatingError::ProcessingFailed)), None)
}
