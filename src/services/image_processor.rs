// src/services/image_processor.rs
use bytes::Bytes;
use futures_util::FutureExt;
use futures_util::future::try_join_all;
use image::RgbaImage;
use log::{debug, error, warn};
use std::io::Cursor;
use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{Config, JpegQuality};
use crate::errors::PlatingError;
use crate::models::*;
use crate::services::adjustments::{apply_adjustments, quality_boost};
use crate::services::analyzer::analyze;
use crate::services::background::{BackgroundRemover, RemoveBgClient};
use crate::services::in_flight::InFlightRegistry;
use crate::services::raster::{JpegSurface, RasterSurface};
use crate::services::suggestions::suggest;
use crate::services::templates;

/// Images processed concurrently per batch group.
pub const BATCH_SIZE: usize = 3;

/// Menu-photo enhancement pipeline.
///
/// Cheap to clone; clones share the raster surface, the background-removal
/// client and the in-flight registry.
#[derive(Clone)]
pub struct ImageProcessor {
    api_key: Option<String>,
    quality: JpegQuality,
    max_image_dimension: u32,
    surface: Arc<dyn RasterSurface>,
    remover: Arc<dyn BackgroundRemover>,
    in_flight: Arc<InFlightRegistry>,
}

impl ImageProcessor {
    pub fn new(config: &Config) -> Self {
        Self::with_remover(config, Arc::new(RemoveBgClient::new(config.remove_bg_url.clone())))
    }

    pub fn with_remover(config: &Config, remover: Arc<dyn BackgroundRemover>) -> Self {
        Self {
            api_key: config.remove_bg_api_key.clone(),
            quality: config.jpeg_quality,
            max_image_dimension: config.max_image_dimension,
            surface: Arc::new(JpegSurface),
            remover,
            in_flight: Arc::new(InFlightRegistry::new()),
        }
    }

    /// A processor identical to this one but using `api_key` for background
    /// removal. Calls already running on `self` keep the old key.
    pub fn with_api_key(&self, api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            in_flight: Arc::new(InFlightRegistry::new()),
            ..self.clone()
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn validate_image(&self, data: &[u8]) -> Result<(u32, u32), PlatingError> {
        let (width, height) = image::io::Reader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| PlatingError::ImageProcessing(format!("Failed to read image: {}", e)))?
            .into_dimensions()
            .map_err(|e| PlatingError::ImageProcessing(format!("Invalid image format: {}", e)))?;

        if width > self.max_image_dimension || height > self.max_image_dimension {
            return Err(PlatingError::Validation(format!(
                "Image dimensions exceed {0}x{0}",
                self.max_image_dimension
            )));
        }

        Ok((width, height))
    }

    /// Decode, run `op` on the raster and re-encode, off the async runtime.
    async fn transform<F>(&self, blob: Bytes, quality: u8, op: F) -> Result<Bytes, PlatingError>
    where
        F: FnOnce(RgbaImage) -> RgbaImage + Send + 'static,
    {
        let surface = Arc::clone(&self.surface);
        tokio::task::spawn_blocking(move || {
            let raster = surface.decode(&blob)?;
            surface.encode(&op(raster), quality)
        })
        .await?
    }

    /// Fixed quality pass (R, G, B × 1.05). Not idempotent.
    pub async fn optimize_image_quality(&self, blob: Bytes) -> Result<Bytes, PlatingError> {
        self.transform(blob, self.quality.optimize, |mut raster| {
            quality_boost(&mut raster);
            raster
        })
        .await
    }

    /// Delegate to the background-removal service.
    ///
    /// Fails with `MissingApiKey` before any request when no key is
    /// configured. Service failures are logged and the input is returned.
    pub async fn remove_background(&self, blob: Bytes) -> Result<Bytes, PlatingError> {
        let api_key = self.api_key.as_deref().ok_or(PlatingError::MissingApiKey)?;

        match self.remover.remove_background(blob.clone(), api_key).await {
            Ok(processed) => Ok(processed),
            Err(e) => {
                warn!("Background removal failed, keeping image unchanged: {}", e);
                Ok(blob)
            }
        }
    }

    pub async fn analyze_image(&self, blob: Bytes) -> Result<PixelMetrics, PlatingError> {
        let surface = Arc::clone(&self.surface);
        tokio::task::spawn_blocking(move || surface.decode(&blob).map(|raster| analyze(&raster)))
            .await?
    }

    pub async fn analyze_and_suggest_enhancements(
        &self,
        blob: Bytes,
    ) -> Result<Vec<EnhancementSuggestion>, PlatingError> {
        let metrics = self.analyze_image(blob).await?;
        debug!("Image metrics: {:?}", metrics);
        Ok(suggest(&metrics))
    }

    pub async fn apply_enhancements(
        &self,
        blob: Bytes,
        adjustments: &Adjustments,
    ) -> Result<Bytes, PlatingError> {
        let adjustments = *adjustments;
        self.transform(blob, self.quality.adjust, move |mut raster| {
            apply_adjustments(&mut raster, &adjustments);
            raster
        })
        .await
    }

    pub fn get_image_template(&self, category: TemplateCategory) -> CategoryTemplate {
        templates::get_image_template(category)
    }

    pub async fn resize_and_crop_image(
        &self,
        blob: Bytes,
        template: &CategoryTemplate,
    ) -> Result<Bytes, PlatingError> {
        let template = template.clone();
        self.transform(blob, self.quality.template, move |raster| {
            templates::resize_and_crop(&raster, &template)
        })
        .await
    }

    /// Run the full pipeline on one image.
    ///
    /// Identical overlapping calls (same bytes, same options) share a single
    /// computation. Any step failure is logged and reported as
    /// `ProcessingFailed`.
    pub async fn process_image(
        &self,
        blob: Bytes,
        options: &EnhancementOptions,
    ) -> Result<ProcessedImageResult, PlatingError> {
        let key = InFlightRegistry::key(&blob, options);
        let processor = self.clone();
        let options = options.clone();

        self.in_flight
            .run(key, move || {
                async move {
                    let started = Instant::now();
                    match processor.run_steps(blob.clone(), &options).await {
                        Ok((processed, enhancements)) => Ok(ProcessedImageResult {
                            original: blob,
                            processed,
                            enhancements,
                            processing_time_ms: started.elapsed().as_millis() as u64,
                        }),
                        Err(e) => {
                            error!("Image processing failed: {}", e);
                            Err(PlatingError::ProcessingFailed)
                        }
                    }
                }
                .boxed()
            })
            .await
    }

    /// quality → background removal → auto-enhance → manual → template.
    async fn run_steps(
        &self,
        blob: Bytes,
        options: &EnhancementOptions,
    ) -> Result<(Bytes, Vec<EnhancementSuggestion>), PlatingError> {
        let mut current = self.optimize_image_quality(blob).await?;
        debug!("Quality pass done ({} bytes)", current.len());

        if options.remove_background {
            current = self.remove_background(current).await?;
            debug!("Background removal step done ({} bytes)", current.len());
        }

        let mut enhancements = Vec::new();
        if options.auto_enhance {
            enhancements = self.analyze_and_suggest_enhancements(current.clone()).await?;
            let adjustments = Adjustments::from_suggestions(&enhancements);
            current = self.apply_enhancements(current, &adjustments).await?;
            debug!("Auto-enhance applied {} suggestion(s)", enhancements.len());
        }

        if options.has_manual_adjustments() {
            current = self.apply_enhancements(current, &options.adjustments()).await?;
            debug!("Manual adjustments applied");
        }

        if let Some(category) = options.aspect_ratio {
            let template = self.get_image_template(category);
            current = self.resize_and_crop_image(current, &template).await?;
            debug!("Cropped to {} template", category);
        }

        Ok((current, enhancements))
    }

    /// Process `files` in sequential groups of `BATCH_SIZE`.
    ///
    /// Images within a group run concurrently. If any image of a group fails,
    /// the whole group is logged and skipped; later groups still run.
    /// Surviving results keep their input order.
    pub async fn batch_process_images(
        &self,
        files: Vec<Bytes>,
        options: &EnhancementOptions,
    ) -> Vec<ProcessedImageResult> {
        let mut results = Vec::with_capacity(files.len());

        for (index, range) in batch_ranges(files.len(), BATCH_SIZE).into_iter().enumerate() {
            let group = files[range.clone()]
                .iter()
                .cloned()
                .map(|file| self.process_image(file, options));

            match try_join_all(group).await {
                Ok(mut processed) => results.append(&mut processed),
                Err(e) => warn!(
                    "Batch group {} (images {}..{}) failed and was skipped: {}",
                    index + 1,
                    range.start,
                    range.end,
                    e
                ),
            }
        }

        results
    }
}

/// Split `len` items into consecutive ranges of at most `size` items.
pub fn batch_ranges(len: usize, size: usize) -> Vec<Range<usize>> {
    let size = size.max(1);
    (0..len)
        .step_by(size)
        .map(|start| start..(start + size).min(len))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seven_items_make_three_groups() {
        let sizes: Vec<usize> = batch_ranges(7, BATCH_SIZE).iter().map(|r| r.len()).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
    }

    #[test]
    fn empty_and_exact_batches() {
        assert!(batch_ranges(0, BATCH_SIZE).is_empty());
        assert_eq!(batch_ranges(6, 3), vec![0..3, 3..6]);
    }

    #[test]
    fn with_api_key_leaves_original_untouched() {
        let processor = ImageProcessor::new(&Config::default());
        let keyed = processor.with_api_key("secret");

        assert!(!processor.has_api_key());
        assert!(keyed.has_api_key());
    }
}
