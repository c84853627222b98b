// src/lib.rs
use std::sync::{Arc, RwLock};

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;

use crate::services::ImageProcessor;

#[derive(Clone)]
pub struct AppState {
    processor: Arc<RwLock<ImageProcessor>>,
}

impl AppState {
    pub fn new(processor: ImageProcessor) -> Self {
        Self {
            processor: Arc::new(RwLock::new(processor)),
        }
    }

    /// Snapshot of the current processor; a later key swap does not affect it.
    pub fn processor(&self) -> ImageProcessor {
        self.processor
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn replace_api_key(&self, api_key: String) {
        let mut processor = self.processor.write().unwrap_or_else(|e| e.into_inner());
        let updated = processor.with_api_key(api_key);
        *processor = updated;
    }
}
