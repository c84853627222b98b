// src/services/templates.rs
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::models::{CategoryTemplate, TemplateCategory, TemplateStyle};

const FOOD: CategoryTemplate = CategoryTemplate {
    category: TemplateCategory::Food,
    width: 400,
    height: 300,
    style: TemplateStyle::Rounded,
    aspect_ratio: "landscape",
    border: "2px solid #f3f4f6",
    shadow: "0 4px 6px rgba(0, 0, 0, 0.1)",
};

const DRINK: CategoryTemplate = CategoryTemplate {
    category: TemplateCategory::Drink,
    width: 300,
    height: 400,
    style: TemplateStyle::Circle,
    aspect_ratio: "portrait",
    border: "3px solid #dbeafe",
    shadow: "0 8px 16px rgba(59, 130, 246, 0.15)",
};

const DESSERT: CategoryTemplate = CategoryTemplate {
    category: TemplateCategory::Dessert,
    width: 350,
    height: 350,
    style: TemplateStyle::Square,
    aspect_ratio: "square",
    border: "2px solid #fce7f3",
    shadow: "0 6px 12px rgba(236, 72, 153, 0.12)",
};

pub fn get_image_template(category: TemplateCategory) -> CategoryTemplate {
    match category {
        TemplateCategory::Food => FOOD,
        TemplateCategory::Drink => DRINK,
        TemplateCategory::Dessert => DESSERT,
    }
}

/// Cover-fit `raster` into the template: scale until both template sides are
/// covered, center it, and composite over a white canvas of exactly the
/// template's size. Overhang on the long side is cropped.
pub fn resize_and_crop(raster: &RgbaImage, template: &CategoryTemplate) -> RgbaImage {
    let white = Rgba([255, 255, 255, 255]);
    let mut canvas = RgbaImage::from_pixel(template.width, template.height, white);

    let (w, h) = raster.dimensions();
    if w == 0 || h == 0 {
        return canvas;
    }

    let scale = f64::max(
        template.width as f64 / w as f64,
        template.height as f64 / h as f64,
    );
    let scaled_w = ((w as f64 * scale).round() as u32).max(1);
    let scaled_h = ((h as f64 * scale).round() as u32).max(1);

    let scaled = imageops::resize(raster, scaled_w, scaled_h, FilterType::Triangle);

    let x = ((template.width as f64 - scaled_w as f64) / 2.0).round() as i64;
    let y = ((template.height as f64 - scaled_h as f64) / 2.0).round() as i64;
    imageops::overlay(&mut canvas, &scaled, x, y);

    canvas
}
