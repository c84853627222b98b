// src/config.rs
use anyhow::Context;
use log::{info, warn};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

pub const DEFAULT_REMOVE_BG_URL: &str = "https://api.remove.bg/v1.0/removebg";

/// JPEG quality (1..=100) per re-encoding step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegQuality {
    pub optimize: u8,
    pub adjust: u8,
    pub template: u8,
}

impl Default for JpegQuality {
    fn default() -> Self {
        Self {
            optimize: 85,
            adjust: 90,
            template: 90,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub remove_bg_api_key: Option<String>,
    pub remove_bg_url: String,
    pub max_image_dimension: u32,
    pub jpeg_quality: JpegQuality,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            remove_bg_api_key: None,
            remove_bg_url: DEFAULT_REMOVE_BG_URL.to_string(),
            max_image_dimension: 4096,
            jpeg_quality: JpegQuality::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Config::default();

        let remove_bg_api_key = env::var("REMOVE_BG_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        if remove_bg_api_key.is_none() {
            warn!("REMOVE_BG_API_KEY not set, background removal requests will be rejected");
        }

        let jpeg_quality = JpegQuality {
            optimize: quality_var("JPEG_QUALITY_OPTIMIZE", defaults.jpeg_quality.optimize)?,
            adjust: quality_var("JPEG_QUALITY_ADJUST", defaults.jpeg_quality.adjust)?,
            template: quality_var("JPEG_QUALITY_TEMPLATE", defaults.jpeg_quality.template)?,
        };

        Ok(Self {
            bind_addr: load_or("BIND_ADDR", defaults.bind_addr)?,
            remove_bg_api_key,
            remove_bg_url: load_or("REMOVE_BG_URL", defaults.remove_bg_url)?,
            max_image_dimension: load_or("MAX_IMAGE_DIMENSION", defaults.max_image_dimension)?,
            jpeg_quality,
        })
    }
}

fn load_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr + Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        Err(_) => {
            info!("{} not set, using default: {}", key, default);
            Ok(default)
        }
    }
}

fn quality_var(key: &str, default: u8) -> anyhow::Result<u8> {
    let quality: u8 = load_or(key, default)?;
    anyhow::ensure!(
        (1..=100).contains(&quality),
        "{} must be within 1..=100, got {}",
        key,
        quality
    );
    Ok(quality)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_qualities_match_pipeline_steps() {
        let q = JpegQuality::default();
        assert_eq!(q.optimize, 85);
        assert_eq!(q.adjust, 90);
        assert_eq!(q.template, 90);
    }

    #[test]
    fn default_config_has_no_api_key() {
        let config = Config::default();
        assert!(config.remove_bg_api_key.is_none());
        assert_eq!(config.remove_bg_url, DEFAULT_REMOVE_BG_URL);
        assert_eq!(config.max_image_dimension, 4096);
    }
}
