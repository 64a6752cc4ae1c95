//! docex core library
//!
//! Domain models, the file acceptance policy, the upload state machine and
//! the rendering rules shared by every docex component. Nothing in here
//! performs I/O beyond reading file metadata and environment variables.

pub mod config;
pub mod error;
pub mod extractor;
pub mod models;
pub mod render;
pub mod state;
pub mod validation;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{
    ConfigError, ErrorMetadata, LogLevel, SubmitError, SubmitErrorKind, GENERIC_FAILURE_MESSAGE,
};
pub use extractor::Extractor;
pub use models::{ExtractionResult, FileBody, FileKind, SelectedFile, SelectionSource};
pub use render::View;
pub use state::{Effect, Phase, RequestToken, Transition, UploadEvent, UploadState};
pub use validation::{validate, ValidationError, MAX_FILE_SIZE_BYTES};
