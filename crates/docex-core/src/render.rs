//! What each phase shows.
//!
//! [`View::of`] turns a state into display-ready text; the CLI only decides
//! where to print it.

use std::fmt;

use crate::models::{ExtractionResult, SelectedFile};
use crate::state::UploadState;

pub const NOT_FOUND: &str = "Not found";
pub const RAW_TEXT_PREVIEW_CHARS: usize = 500;
pub const ELLIPSIS: &str = "...";

pub const IDLE_PROMPT: &str = "Drop your document here";
pub const IDLE_HINT: &str = "Supports PDF and PNG files (max 10MB)";
pub const BROWSE_LABEL: &str = "Browse Files";
pub const LOADING_INDICATOR: &str = "Processing document...";

/// Value of an optional field, or [`NOT_FOUND`]. Empty strings count as absent.
pub fn display_field(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_FOUND.to_string(),
    }
}

/// Confidence as a whole percentage, rounded half away from zero.
pub fn format_confidence(confidence: f64) -> String {
    format!("{}%", (confidence * 100.0).round() as i64)
}

/// First [`RAW_TEXT_PREVIEW_CHARS`] characters, with [`ELLIPSIS`] appended
/// when anything was cut.
pub fn preview_text(text: &str) -> String {
    match text.char_indices().nth(RAW_TEXT_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub name: String,
    pub size_mb: String,
    pub kind: &'static str,
}

impl From<&SelectedFile> for FileSummary {
    fn from(file: &SelectedFile) -> Self {
        Self {
            name: file.name.clone(),
            size_mb: file.size_mb(),
            kind: file.kind().label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub name: String,
    pub email: String,
    /// `None` means no confidence row.
    pub confidence: Option<String>,
    /// `None` means no preview block.
    pub text_preview: Option<String>,
    pub extraction_method: Option<String>,
    pub warning: Option<String>,
}

impl From<&ExtractionResult> for ResultView {
    fn from(result: &ExtractionResult) -> Self {
        Self {
            name: display_field(result.name.as_deref()),
            email: display_field(result.email.as_deref()),
            confidence: result.confidence.map(format_confidence),
            text_preview: result
                .raw_text
                .as_deref()
                .filter(|t| !t.is_empty())
                .map(preview_text),
            extraction_method: result.extraction_method.clone(),
            warning: result.warning.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Idle {
        prompt: &'static str,
        hint: &'static str,
        browse: &'static str,
    },
    Loading {
        indicator: &'static str,
        file: FileSummary,
    },
    Error {
        message: String,
    },
    Success {
        file: FileSummary,
        result: ResultView,
    },
}

impl View {
    pub fn of(state: &UploadState) -> Self {
        match state {
            UploadState::Idle => View::Idle {
                prompt: IDLE_PROMPT,
                hint: IDLE_HINT,
                browse: BROWSE_LABEL,
            },
            UploadState::Loading { file, .. } => View::Loading {
                indicator: LOADING_INDICATOR,
                file: file.into(),
            },
            UploadState::Error { message, .. } => View::Error {
                message: message.clone(),
            },
            UploadState::Success { file, result } => View::Success {
                file: file.into(),
                result: result.into(),
            },
        }
    }
}

impl fmt::Display for FileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {} MB)", self.name, self.kind, self.size_mb)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Idle {
                prompt,
                hint,
                browse,
            } => {
                writeln!(f, "{}", prompt)?;
                writeln!(f, "{}", hint)?;
                write!(f, "[{}]", browse)
            }
            View::Loading { indicator, file } => {
                writeln!(f, "{}", file)?;
                write!(f, "{}", indicator)
            }
            View::Error { message } => write!(f, "Error: {}", message),
            View::Success { file, result } => {
                writeln!(f, "{}", file)?;
                writeln!(f, "Extraction Successful")?;
                writeln!(f, "Name: {}", result.name)?;
                write!(f, "Email: {}", result.email)?;
                if let Some(confidence) = &result.confidence {
                    write!(f, "\nConfidence: {}", confidence)?;
                }
                if let Some(method) = &result.extraction_method {
                    write!(f, "\nMethod: {}", method)?;
                }
                if let Some(warning) = &result.warning {
                    write!(f, "\nWarning: {}", warning)?;
                }
                if let Some(preview) = &result.text_preview {
                    write!(f, "\n\nExtracted Text Preview\n{}", preview)?;
                }
                Ok(())
            }
        }
    }
}
