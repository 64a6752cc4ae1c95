//! Domain models: the file a user selected and the fields the extraction
//! service returns for it.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::SubmitError;
use crate::validation::content_type_for_path;

/// Where the bytes of a selected file come from.
#[derive(Clone, PartialEq)]
pub enum FileBody {
    /// Contents already held in memory.
    Memory(Bytes),
    /// Contents read from disk at submit time.
    Path(PathBuf),
}

impl fmt::Debug for FileBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileBody::Memory(bytes) => write!(f, "Memory({} bytes)", bytes.len()),
            FileBody::Path(path) => write!(f, "Path({})", path.display()),
        }
    }
}

/// A candidate or held file. Only files that pass
/// [`validate`](crate::validation::validate) are ever held by the upload state.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub body: FileBody,
}

impl SelectedFile {
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            size: data.len() as u64,
            mime_type: mime_type.into(),
            body: FileBody::Memory(data),
        }
    }

    /// Describe a file on disk without reading it. The declared MIME type is
    /// `mime_override` if given, otherwise derived from the extension.
    pub fn from_path(path: &Path, mime_override: Option<&str>) -> io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();

        let mime_type = match mime_override {
            Some(mime) => mime.to_string(),
            None => content_type_for_path(path).to_string(),
        };

        Ok(Self {
            name,
            size: metadata.len(),
            mime_type,
            body: FileBody::Path(path.to_path_buf()),
        })
    }

    pub fn kind(&self) -> FileKind {
        FileKind::from_mime(&self.mime_type)
    }

    /// Size in megabytes with two decimals, e.g. `"2.00"`.
    pub fn size_mb(&self) -> String {
        format!("{:.2}", self.size as f64 / 1024.0 / 1024.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Png,
    Other,
}

impl FileKind {
    pub fn from_mime(mime_type: &str) -> Self {
        match mime_type {
            "application/pdf" => FileKind::Pdf,
            "image/png" => FileKind::Png,
            _ => FileKind::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FileKind::Pdf => "PDF document",
            FileKind::Png => "PNG image",
            FileKind::Other => "File",
        }
    }
}

/// Entry point a selection arrived through. Both go through the same validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    DragDrop,
    FilePicker,
}

impl fmt::Display for SelectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionSource::DragDrop => f.write_str("drag-drop"),
            SelectionSource::FilePicker => f.write_str("file-picker"),
        }
    }
}

/// Fields returned by the extraction endpoint. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// In `[0, 1]` when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
}

impl ExtractionResult {
    /// Parse a response body. Anything that is not a JSON object of the
    /// expected shape is malformed. A confidence outside `[0, 1]` is dropped
    /// and the rest of the result kept.
    pub fn from_json(body: &[u8]) -> Result<Self, SubmitError> {
        let mut result: ExtractionResult = serde_json::from_slice(body)
            .map_err(|e| SubmitError::MalformedResponse(e.to_string()))?;

        if let Some(confidence) = result.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                tracing::warn!(confidence, "Ignoring confidence outside [0, 1]");
                result.confidence = None;
            }
        }

        Ok(result)
    }
}
