// src/services/analyzer.rs
use image::RgbaImage;

use crate::models::PixelMetrics;

/// Compute brightness, contrast, saturation and sharpness of a raster.
///
/// Brightness and saturation are means over every pixel, contrast is the
/// population standard deviation of per-pixel brightness, and sharpness is
/// the mean absolute 4-neighbour Laplacian response over interior pixels
/// (the 1-pixel border is excluded from both sum and count).
pub fn analyze(raster: &RgbaImage) -> PixelMetrics {
    let (width, height) = raster.dimensions();
    let pixel_count = width as usize * height as usize;
    if pixel_count == 0 {
        return PixelMetrics::default();
    }
    let n = pixel_count as f64;

    let mut brightness_sum = 0.0f64;
    let mut saturation_sum = 0.0f64;
    for pixel in raster.pixels() {
        let [r, g, b, _] = pixel.0;
        brightness_sum += pixel_brightness(r, g, b);
        saturation_sum += pixel_saturation(r, g, b);
    }
    let brightness = brightness_sum / n;

    let mut squared_deviation = 0.0f64;
    for pixel in raster.pixels() {
        let [r, g, b, _] = pixel.0;
        let d = pixel_brightness(r, g, b) - brightness;
        squared_deviation += d * d;
    }
    let contrast = (squared_deviation / n).sqrt();

    PixelMetrics {
        brightness,
        contrast,
        saturation: saturation_sum / n,
        sharpness: sharpness(raster),
    }
}

fn pixel_brightness(r: u8, g: u8, b: u8) -> f64 {
    (r as f64 + g as f64 + b as f64) / (3.0 * 255.0)
}

/// Already a 0..1 ratio, not rescaled by 255.
fn pixel_saturation(r: u8, g: u8, b: u8) -> f64 {
    let max = r.max(g).max(b);
    if max == 0 {
        return 0.0;
    }
    let min = r.min(g).min(b);
    (max - min) as f64 / max as f64
}

fn channel_mean(raster: &RgbaImage, x: u32, y: u32) -> f64 {
    let [r, g, b, _] = raster.get_pixel(x, y).0;
    (r as f64 + g as f64 + b as f64) / 3.0
}

fn sharpness(raster: &RgbaImage) -> f64 {
    let (w, h) = raster.dimensions();
    if w < 3 || h < 3 {
        return 0.0;
    }

    let mut sum = 0.0f64;
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let response = 4.0 * channel_mean(raster, x, y)
                - channel_mean(raster, x, y - 1)
                - channel_mean(raster, x, y + 1)
                - channel_mean(raster, x - 1, y)
                - channel_mean(raster, x + 1, y);
            sum += response.abs() / 255.0;
        }
    }

    let interior = ((w - 2) as f64) * ((h - 2) as f64);
    sum / interior
}
