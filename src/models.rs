// src/models.rs
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::PlatingError;

/// Caller-supplied knobs for one `process_image` call.
///
/// `sharpness`, `width`, `height` and `style` are accepted and carried
/// through but no pixel operation reads them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancementOptions {
    pub brightness: Option<i32>,
    pub contrast: Option<i32>,
    pub saturation: Option<i32>,
    pub sharpness: Option<i32>,
    pub remove_background: bool,
    pub auto_enhance: bool,
    pub aspect_ratio: Option<TemplateCategory>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub style: Option<TemplateStyle>,
}

impl EnhancementOptions {
    pub fn validate(&self) -> Result<(), PlatingError> {
        let signed = [
            ("brightness", self.brightness),
            ("contrast", self.contrast),
            ("saturation", self.saturation),
        ];
        for (name, value) in signed {
            if let Some(v) = value {
                if !(-100..=100).contains(&v) {
                    return Err(PlatingError::Validation(format!(
                        "{} must be within -100..100, got {}",
                        name, v
                    )));
                }
            }
        }

        if let Some(v) = self.sharpness {
            if !(0..=100).contains(&v) {
                return Err(PlatingError::Validation(format!(
                    "sharpness must be within 0..100, got {}",
                    v
                )));
            }
        }

        Ok(())
    }

    /// Manual adjustment runs whenever any of the four knobs is present,
    /// independent of auto-enhance.
    pub fn has_manual_adjustments(&self) -> bool {
        self.brightness.is_some()
            || self.contrast.is_some()
            || self.saturation.is_some()
            || self.sharpness.is_some()
    }

    pub fn adjustments(&self) -> Adjustments {
        Adjustments {
            brightness: self.brightness,
            contrast: self.contrast,
            saturation: self.saturation,
            sharpness: self.sharpness,
        }
    }
}

/// Input of the per-channel transform, shared by the auto and manual paths.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Adjustments {
    pub brightness: Option<i32>,
    pub contrast: Option<i32>,
    pub saturation: Option<i32>,
    pub sharpness: Option<i32>,
}

impl Adjustments {
    /// Folds suggestion values into adjustments; a later suggestion of the
    /// same type overwrites an earlier one.
    pub fn from_suggestions(suggestions: &[EnhancementSuggestion]) -> Self {
        let mut adjustments = Adjustments::default();
        for suggestion in suggestions {
            let Some(value) = suggestion.value else {
                continue;
            };
            match suggestion.kind {
                SuggestionType::Brightness => adjustments.brightness = Some(value),
                SuggestionType::Contrast => adjustments.contrast = Some(value),
                SuggestionType::Saturation => adjustments.saturation = Some(value),
                SuggestionType::Sharpness => adjustments.sharpness = Some(value),
                SuggestionType::Background => {}
            }
        }
        adjustments
    }
}

/// Aggregate image-quality measures, each on a 0..1 scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelMetrics {
    pub brightness: f64,
    pub contrast: f64,
    pub saturation: f64,
    pub sharpness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionType {
    Brightness,
    Contrast,
    Saturation,
    Background,
    Sharpness,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancementSuggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionType,
    pub message: String,
    pub value: Option<i32>,
    pub priority: Priority,
}

/// Outcome of one top-level `process_image` call.
#[derive(Debug, Clone)]
pub struct ProcessedImageResult {
    pub original: Bytes,
    pub processed: Bytes,
    pub enhancements: Vec<EnhancementSuggestion>,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateCategory {
    Food,
    Drink,
    Dessert,
}

impl TemplateCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateCategory::Food => "food",
            TemplateCategory::Drink => "drink",
            TemplateCategory::Dessert => "dessert",
        }
    }
}

impl fmt::Display for TemplateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateCategory {
    type Err = PlatingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "food" => Ok(TemplateCategory::Food),
            "drink" => Ok(TemplateCategory::Drink),
            "dessert" => Ok(TemplateCategory::Dessert),
            _ => Err(PlatingError::UnknownTemplate(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateStyle {
    Rounded,
    Circle,
    Square,
}

/// Fixed output geometry for a menu-item category. `border` and `shadow`
/// are presentation hints for the menu front end only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTemplate {
    pub category: TemplateCategory,
    pub width: u32,
    pub height: u32,
    pub style: TemplateStyle,
    pub aspect_ratio: &'static str,
    pub border: &'static str,
    pub shadow: &'static str,
}

// HTTP response bodies

#[derive(Debug, Clone, Serialize)]
pub struct ProcessedImageResponse {
    pub request_id: Uuid,
    pub original_size: usize,
    pub processed_size: usize,
    pub enhancements: Vec<EnhancementSuggestion>,
    pub processing_time_ms: u64,
    pub content_type: String,
    pub image: String,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResponse {
    pub request_id: Uuid,
    pub metrics: PixelMetrics,
    pub suggestions: Vec<EnhancementSuggestion>,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResponse {
    pub request_id: Uuid,
    pub submitted: usize,
    pub processed: usize,
    pub results: Vec<ProcessedImageResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyUpdate {
    pub api_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_range_checks() {
        assert!(EnhancementOptions::default().validate().is_ok());

        let too_bright = EnhancementOptions {
            brightness: Some(101),
            ..Default::default()
        };
        assert!(matches!(too_bright.validate(), Err(PlatingError::Validation(_))));

        let negative_sharpness = EnhancementOptions {
            sharpness: Some(-1),
            ..Default::default()
        };
        assert!(negative_sharpness.validate().is_err());
    }

    #[test]
    fn sharpness_alone_counts_as_manual_adjustment() {
        let options = EnhancementOptions {
            sharpness: Some(30),
            ..Default::default()
        };
        assert!(options.has_manual_adjustments());
        assert!(!EnhancementOptions::default().has_manual_adjustments());
    }

    #[test]
    fn last_suggestion_per_type_wins() {
        let suggestion = |kind, value| EnhancementSuggestion {
            kind,
            message: String::new(),
            value: Some(value),
            priority: Priority::Low,
        };
        let adjustments = Adjustments::from_suggestions(&[
            suggestion(SuggestionType::Brightness, 20),
            suggestion(SuggestionType::Contrast, 25),
            suggestion(SuggestionType::Brightness, -15),
            suggestion(SuggestionType::Background, 99),
        ]);

        assert_eq!(adjustments.brightness, Some(-15));
        assert_eq!(adjustments.contrast, Some(25));
        assert_eq!(adjustments.saturation, None);
    }

    #[test]
    fn options_deserialize_from_snake_case_json() {
        let json = r#"{
            "brightness": -10,
            "auto_enhance": true,
            "aspect_ratio": "dessert",
            "style": "circle"
        }"#;
        let options: EnhancementOptions = serde_json::from_str(json).unwrap();
        assert_eq!(options.brightness, Some(-10));
        assert!(options.auto_enhance);
        assert!(!options.remove_background);
        assert_eq!(options.aspect_ratio, Some(TemplateCategory::Dessert));
        assert_eq!(options.style, Some(TemplateStyle::Circle));
    }

    #[test]
    fn category_parsing() {
        assert_eq!("Drink".parse::<TemplateCategory>().unwrap(), TemplateCategory::Drink);
        assert_eq!(
            "soup".parse::<TemplateCategory>().unwrap_err(),
            PlatingError::UnknownTemplate("soup".to_string())
        );
    }
}
