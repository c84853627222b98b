// src/services/background.rs
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::multipart::{Form, Part};

use crate::errors::PlatingError;

/// External background-removal capability.
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    async fn remove_background(&self, image: Bytes, api_key: &str) -> Result<Bytes, PlatingError>;
}

/// remove.bg style HTTP API: multipart `image_file` + `size=auto`,
/// authenticated with the `X-Api-Key` header. No timeout beyond the
/// client's defaults.
pub struct RemoveBgClient {
    endpoint: String,
    client: Client,
}

impl RemoveBgClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl BackgroundRemover for RemoveBgClient {
    async fn remove_background(&self, image: Bytes, api_key: &str) -> Result<Bytes, PlatingError> {
        let part = Part::bytes(image.to_vec())
            .file_name("image.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| {
                PlatingError::BackgroundRemoval(format!("Invalid multipart part: {}", e))
            })?;

        let form = Form::new().part("image_file", part).text("size", "auto");

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Api-Key", api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PlatingError::BackgroundRemoval(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PlatingError::BackgroundRemoval(format!(
                "Service returned {}: {}",
                status, error_text
            )));
        }

        response.bytes().await.map_err(|e| {
            PlatingError::BackgroundRemoval(format!("Failed to read response body: {}", e))
        })
    }
}
