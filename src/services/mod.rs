// src/services/mod.rs
pub mod adjustments;
pub mod analyzer;
pub mod background;
pub mod image_processor;
pub mod in_flight;
pub mod raster;
pub mod suggestions;
pub mod templates;

pub use background::{BackgroundRemover, RemoveBgClient};
pub use image_processor::{BATCH_SIZE, ImageProcessor};
pub use in_flight::InFlightRegistry;
pub use raster::{JpegSurface, RasterSurface};
