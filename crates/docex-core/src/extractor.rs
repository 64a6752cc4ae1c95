//! Seam between the upload controller and the extraction service.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::SubmitError;
use crate::models::{ExtractionResult, SelectedFile};

/// Submits one validated file and returns the parsed extraction fields.
///
/// Implemented by the HTTP client; tests provide their own.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, file: &SelectedFile) -> Result<ExtractionResult, SubmitError>;
}

#[async_trait]
impl<T: Extractor + ?Sized> Extractor for Arc<T> {
    async fn extract(&self, file: &SelectedFile) -> Result<ExtractionResult, SubmitError> {
        (**self).extract(file).await
    }
}
