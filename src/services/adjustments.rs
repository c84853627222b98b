// src/services/adjustments.rs
use image::RgbaImage;

use crate::models::Adjustments;

const QUALITY_GAIN: f64 = 1.05;

/// Store a channel value the way an 8-bit clamped pixel buffer does:
/// clamp to [0, 255], round half to even.
fn quantize(value: f64) -> f64 {
    value.clamp(0.0, 255.0).round_ties_even()
}

/// Fixed quality pass: scale R, G and B by 1.05. Alpha is untouched.
pub fn quality_boost(raster: &mut RgbaImage) {
    for pixel in raster.pixels_mut() {
        for channel in pixel.0.iter_mut().take(3) {
            *channel = quantize(*channel as f64 * QUALITY_GAIN) as u8;
        }
    }
}

/// Per-channel transform shared by the auto-enhance and manual paths.
///
/// Steps run brightness, contrast, saturation; a step is skipped when its
/// value is absent or zero, and each step's output is clamped before the
/// next one reads it. `sharpness` has no pixel effect.
pub fn apply_adjustments(raster: &mut RgbaImage, adjustments: &Adjustments) {
    let brightness = adjustments.brightness.filter(|v| *v != 0);
    let contrast = adjustments.contrast.filter(|v| *v != 0);
    let saturation = adjustments.saturation.filter(|v| *v != 0);

    if brightness.is_none() && contrast.is_none() && saturation.is_none() {
        return;
    }

    let offset = brightness.map(|b| (b as f64 / 100.0) * 255.0);
    let contrast_factor = contrast.map(|c| (c as f64 + 100.0) / 100.0);
    let saturation_factor = saturation.map(|s| (s as f64 + 100.0) / 100.0);

    for pixel in raster.pixels_mut() {
        let mut rgb = [pixel[0] as f64, pixel[1] as f64, pixel[2] as f64];

        if let Some(offset) = offset {
            for c in rgb.iter_mut() {
                *c = quantize(*c + offset);
            }
        }

        if let Some(factor) = contrast_factor {
            for c in rgb.iter_mut() {
                *c = quantize((*c - 128.0) * factor + 128.0);
            }
        }

        if let Some(factor) = saturation_factor {
            let gray = 0.299 * rgb[0] + 0.587 * rgb[1] + 0.114 * rgb[2];
            for c in rgb.iter_mut() {
                *c = quantize(gray + factor * (*c - gray));
            }
        }

        pixel[0] = rgb[0] as u8;
        pixel[1] = rgb[1] as u8;
        pixel[2] = rgb[2] as u8;
    }
}
