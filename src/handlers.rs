// src/handlers.rs
use crate::{AppState, errors::PlatingError, models::*, services::suggestions::suggest};
use actix_multipart::Multipart;
use actix_web::{Error, HttpResponse, web};
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use futures_util::TryStreamExt;
use log::{debug, info};
use uuid::Uuid;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/images/process", web::post().to(process_image))
            .route("/images/analyze", web::post().to(analyze_image))
            .route("/images/optimize", web::post().to(optimize_image))
            .route("/images/batch", web::post().to(batch_process))
            .route("/images/crop/{category}", web::post().to(crop_image))
            .route("/templates/{category}", web::get().to(get_template))
            .route("/settings/api-key", web::put().to(update_api_key)),
    )
    .route("/health", web::get().to(health_check));
}

struct UploadedImage {
    filename: String,
    data: Bytes,
}

struct UploadForm {
    images: Vec<UploadedImage>,
    options: EnhancementOptions,
}

/// Collect `image`/`images` file fields and an optional `options` JSON field.
async fn read_upload(mut payload: Multipart) -> Result<UploadForm, Error> {
    let mut images = Vec::new();
    let mut options = EnhancementOptions::default();

    while let Some(mut field) = payload.try_next().await? {
        let content_disposition = field.content_disposition();
        let name = content_disposition.get_name().unwrap_or_default().to_string();
        let filename = content_disposition
            .get_filename()
            .map(|f| f.to_string())
            .unwrap_or_else(|| "upload".to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            data.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "options" => {
                options = serde_json::from_slice(&data).map_err(|e| {
                    PlatingError::Validation(format!("Invalid options JSON: {}", e))
                })?;
            }
            "image" | "images" => images.push(UploadedImage {
                filename,
                data: Bytes::from(data),
            }),
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    options.validate()?;

    Ok(UploadForm { images, options })
}

fn first_image(images: Vec<UploadedImage>) -> Result<UploadedImage, PlatingError> {
    images
        .into_iter()
        .next()
        .ok_or_else(|| PlatingError::Validation("No image provided".to_string()))
}

fn content_type_of(data: &[u8]) -> &'static str {
    match image::guess_format(data) {
        Ok(image::ImageFormat::Png) => "image/png",
        Ok(image::ImageFormat::Jpeg) => "image/jpeg",
        Ok(image::ImageFormat::WebP) => "image/webp",
        _ => "application/octet-stream",
    }
}

fn processed_response(request_id: Uuid, result: &ProcessedImageResult) -> ProcessedImageResponse {
    ProcessedImageResponse {
        request_id,
        original_size: result.original.len(),
        processed_size: result.processed.len(),
        enhancements: result.enhancements.clone(),
        processing_time_ms: result.processing_time_ms,
        content_type: content_type_of(&result.processed).to_string(),
        image: general_purpose::STANDARD.encode(&result.processed),
        processed_at: chrono::Utc::now(),
    }
}

pub async fn process_image(
    payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let request_id = Uuid::new_v4();
    let UploadForm { images, options } = read_upload(payload).await?;
    let image = first_image(images)?;

    let processor = data.processor();
    processor.validate_image(&image.data)?;

    info!(
        "[{}] Processing {} ({} bytes) with {:?}",
        request_id,
        image.filename,
        image.data.len(),
        options
    );

    let result = processor.process_image(image.data, &options).await?;

    info!(
        "[{}] Processed in {}ms ({} -> {} bytes)",
        request_id,
        result.processing_time_ms,
        result.original.len(),
        result.processed.len()
    );

    Ok(HttpResponse::Ok().json(processed_response(request_id, &result)))
}

pub async fn analyze_image(
    payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let request_id = Uuid::new_v4();
    let image = first_image(read_upload(payload).await?.images)?;

    let processor = data.processor();
    processor.validate_image(&image.data)?;

    let metrics = processor.analyze_image(image.data).await?;
    let suggestions = suggest(&metrics);
    info!(
        "[{}] Analyzed {}: {} suggestion(s)",
        request_id,
        image.filename,
        suggestions.len()
    );

    Ok(HttpResponse::Ok().json(AnalysisResponse {
        request_id,
        metrics,
        suggestions,
        analyzed_at: chrono::Utc::now(),
    }))
}

pub async fn optimize_image(
    payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let image = first_image(read_upload(payload).await?.images)?;

    let processor = data.processor();
    processor.validate_image(&image.data)?;
    let optimized = processor.optimize_image_quality(image.data).await?;

    Ok(HttpResponse::Ok().content_type("image/jpeg").body(optimized))
}

pub async fn batch_process(
    payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let request_id = Uuid::new_v4();
    let UploadForm { images, options } = read_upload(payload).await?;
    if images.is_empty() {
        return Err(PlatingError::Validation("No images provided".to_string()).into());
    }

    // Oversized uploads reject the request; undecodable ones are left to the
    // batch, which skips the group they land in.
    let processor = data.processor();
    for image in &images {
        if let Err(PlatingError::Validation(e)) = processor.validate_image(&image.data) {
            return Err(PlatingError::Validation(format!("{}: {}", image.filename, e)).into());
        }
    }

    let submitted = images.len();
    info!("[{}] Batch of {} image(s)", request_id, submitted);

    let files = images.into_iter().map(|image| image.data).collect();
    let results: Vec<ProcessedImageResponse> = processor
        .batch_process_images(files, &options)
        .await
        .iter()
        .map(|result| processed_response(request_id, result))
        .collect();

    Ok(HttpResponse::Ok().json(BatchResponse {
        request_id,
        submitted,
        processed: results.len(),
        results,
    }))
}

pub async fn crop_image(
    path: web::Path<String>,
    payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let category: TemplateCategory = path.into_inner().parse()?;
    let image = first_image(read_upload(payload).await?.images)?;

    let processor = data.processor();
    processor.validate_image(&image.data)?;

    let template = processor.get_image_template(category);
    let cropped = processor.resize_and_crop_image(image.data, &template).await?;

    Ok(HttpResponse::Ok().content_type("image/jpeg").body(cropped))
}

pub async fn get_template(
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let category: TemplateCategory = path.into_inner().parse()?;
    Ok(HttpResponse::Ok().json(data.processor().get_image_template(category)))
}

pub async fn update_api_key(
    body: web::Json<ApiKeyUpdate>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let api_key = body.into_inner().api_key.trim().to_string();
    if api_key.is_empty() {
        return Err(PlatingError::Validation("api_key must not be empty".to_string()).into());
    }

    data.replace_api_key(api_key);
    info!("Background removal API key updated");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "updated"
    })))
}

pub async fn health_check(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "plating",
        "version": env!("CARGO_PKG_VERSION"),
        "background_removal": data.processor().has_api_key()
    }))
}
