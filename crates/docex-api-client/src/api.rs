//! Domain methods for the extraction service client.

use crate::ApiClient;
use anyhow::Result;
use async_trait::async_trait;
use docex_core::{ExtractionResult, Extractor, FileBody, SelectedFile, SubmitError};
use std::io;

/// Health probe response. Matches GET {prefix}/health.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_formats: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<String>,
    /// Anything else the service reports (e.g. which model backend is configured).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Error body the service sends with non-2xx responses.
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    error: String,
}

/// Contents of the file, read from disk if needed.
/// The size must still be the one that was validated at selection time.
async fn read_body(file: &SelectedFile) -> Result<Vec<u8>, SubmitError> {
    let path = match &file.body {
        FileBody::Memory(bytes) => return Ok(bytes.to_vec()),
        FileBody::Path(path) => path,
    };

    let data = tokio::fs::read(path)
        .await
        .map_err(|source| SubmitError::ReadFile {
            path: path.clone(),
            source,
        })?;

    if data.len() as u64 != file.size {
        return Err(SubmitError::ReadFile {
            path: path.clone(),
            source: io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "file changed since it was selected ({} bytes, now {})",
                    file.size,
                    data.len()
                ),
            ),
        });
    }

    Ok(data)
}

fn error_detail(body: &str) -> Option<String> {
    if body.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => Some(parsed.error),
        Err(_) => Some(body.trim().to_string()),
    }
}

impl ApiClient {
    fn transport_error(&self, error: reqwest::Error) -> SubmitError {
        if error.is_timeout() {
            SubmitError::Timeout(self.timeout())
        } else {
            SubmitError::Transport(error.to_string())
        }
    }

    /// Upload one document as multipart field `file` and parse the extraction result.
    #[tracing::instrument(skip(self, file), fields(file_name = %file.name, size = file.size))]
    pub async fn extract_document(
        &self,
        file: &SelectedFile,
    ) -> Result<ExtractionResult, SubmitError> {
        let data = read_body(file).await?;
        let part = reqwest::multipart::Part::bytes(data)
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| SubmitError::Transport(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let url = self.build_url(&self.extract_path);
        tracing::debug!(url = %url, "Submitting document for extraction");

        let response = self
            .client()
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SubmitError::HttpStatus {
                status: status.as_u16(),
                detail: error_detail(&error_text),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        ExtractionResult::from_json(&body)
    }

    /// Service health probe.
    pub async fn health(&self) -> Result<HealthResponse> {
        tracing::debug!(path = %self.health_path, "Probing extraction service health");
        self.get(&self.health_path).await
    }
}

#[async_trait]
impl Extractor for ApiClient {
    async fn extract(&self, file: &SelectedFile) -> Result<ExtractionResult, SubmitError> {
        self.extract_document(file).await
    }
}
