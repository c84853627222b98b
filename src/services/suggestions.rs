// src/services/suggestions.rs
use crate::models::{EnhancementSuggestion, PixelMetrics, Priority, SuggestionType};

const DARK_THRESHOLD: f64 = 0.30;
const BRIGHT_THRESHOLD: f64 = 0.80;
const LOW_CONTRAST_THRESHOLD: f64 = 0.30;
const LOW_SATURATION_THRESHOLD: f64 = 0.40;
const SOFT_THRESHOLD: f64 = 0.50;

/// Map metrics to suggestions. Checks run in a fixed order (brightness,
/// contrast, saturation, sharpness) and each fires independently; the
/// result keeps that order and is not sorted by priority.
pub fn suggest(metrics: &PixelMetrics) -> Vec<EnhancementSuggestion> {
    let mut suggestions = Vec::new();

    if metrics.brightness < DARK_THRESHOLD {
        suggestions.push(suggestion(
            SuggestionType::Brightness,
            "Image looks too dark, brightening it will make the dish more appealing",
            20,
            Priority::High,
        ));
    } else if metrics.brightness > BRIGHT_THRESHOLD {
        suggestions.push(suggestion(
            SuggestionType::Brightness,
            "Image looks overexposed, slightly reducing brightness",
            -15,
            Priority::Medium,
        ));
    }

    if metrics.contrast < LOW_CONTRAST_THRESHOLD {
        suggestions.push(suggestion(
            SuggestionType::Contrast,
            "Low contrast, increasing it will help the dish stand out",
            25,
            Priority::High,
        ));
    }

    if metrics.saturation < LOW_SATURATION_THRESHOLD {
        suggestions.push(suggestion(
            SuggestionType::Saturation,
            "Colours look washed out, boosting saturation",
            20,
            Priority::Medium,
        ));
    }

    if metrics.sharpness < SOFT_THRESHOLD {
        suggestions.push(suggestion(
            SuggestionType::Sharpness,
            "Image looks soft, consider sharpening",
            15,
            Priority::Medium,
        ));
    }

    suggestions
}

fn suggestion(
    kind: SuggestionType,
    message: &str,
    value: i32,
    priority: Priority,
) -> EnhancementSuggestion {
    EnhancementSuggestion {
        kind,
        message: message.to_string(),
        value: Some(value),
        priority,
    }
}
