//! Upload state machine.
//!
//! [`UploadState::apply`] is a pure transition `(state, event) -> (state, effect)`.
//! The only effect is [`Effect::Submit`], returned exactly when a transition
//! enters `Loading`; running it is the caller's job.
//!
//! Each request is tagged with a [`RequestToken`]. Completions are only
//! applied when their token is the one the current `Loading` phase tracks,
//! so a response for a file the user has since replaced is dropped.

use std::fmt;

use crate::error::{ErrorMetadata, SubmitError};
use crate::models::{ExtractionResult, SelectedFile};
use crate::validation::ValidationError;

/// Monotonically increasing request sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn first() -> Self {
        RequestToken(1)
    }

    pub fn next(self) -> Self {
        RequestToken(self.0 + 1)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Error,
    Success,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::Loading => "loading",
            Phase::Error => "error",
            Phase::Success => "success",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum UploadState {
    #[default]
    Idle,
    Loading {
        token: RequestToken,
        file: SelectedFile,
    },
    Error {
        message: String,
        /// File whose request failed. `None` when the error is a rejection.
        file: Option<SelectedFile>,
    },
    Success {
        file: SelectedFile,
        result: ExtractionResult,
    },
}

#[derive(Debug)]
pub enum UploadEvent {
    FileAccepted {
        token: RequestToken,
        file: SelectedFile,
    },
    FileRejected(ValidationError),
    RequestSucceeded {
        token: RequestToken,
        result: ExtractionResult,
    },
    RequestFailed {
        token: RequestToken,
        error: SubmitError,
    },
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Submit {
        token: RequestToken,
        file: SelectedFile,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: UploadState,
    pub effect: Option<Effect>,
    /// False when the event was ignored (stale completion, reset on idle).
    pub changed: bool,
}

impl Transition {
    fn to(state: UploadState) -> Self {
        Self {
            state,
            effect: None,
            changed: true,
        }
    }

    fn unchanged(state: UploadState) -> Self {
        Self {
            state,
            effect: None,
            changed: false,
        }
    }
}

impl UploadState {
    pub fn phase(&self) -> Phase {
        match self {
            UploadState::Idle => Phase::Idle,
            UploadState::Loading { .. } => Phase::Loading,
            UploadState::Error { .. } => Phase::Error,
            UploadState::Success { .. } => Phase::Success,
        }
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        match self {
            UploadState::Idle => None,
            UploadState::Loading { file, .. } | UploadState::Success { file, .. } => Some(file),
            UploadState::Error { file, .. } => file.as_ref(),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            UploadState::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&ExtractionResult> {
        match self {
            UploadState::Success { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Token of the request currently in flight, if any.
    pub fn tracked_token(&self) -> Option<RequestToken> {
        match self {
            UploadState::Loading { token, .. } => Some(*token),
            _ => None,
        }
    }

    pub fn apply(self, event: UploadEvent) -> Transition {
        match event {
            UploadEvent::Reset => match self {
                UploadState::Idle => Transition::unchanged(UploadState::Idle),
                _ => Transition::to(UploadState::Idle),
            },

            // Re-entrant from every phase; a request still in flight becomes stale.
            UploadEvent::FileAccepted { token, file } => Transition {
                state: UploadState::Loading {
                    token,
                    file: file.clone(),
                },
                effect: Some(Effect::Submit { token, file }),
                changed: true,
            },

            UploadEvent::FileRejected(error) => Transition::to(UploadState::Error {
                message: error.to_string(),
                file: None,
            }),

            UploadEvent::RequestSucceeded { token, result } => match self {
                UploadState::Loading {
                    token: current,
                    file,
                } if current == token => Transition::to(UploadState::Success { file, result }),
                other => Transition::unchanged(other),
            },

            UploadEvent::RequestFailed { token, error } => match self {
                UploadState::Loading {
                    token: current,
                    file,
                } if current == token => Transition::to(UploadState::Error {
                    message: error.client_message(),
                    file: Some(file),
                }),
                other => Transition::unchanged(other),
            },
        }
    }
}
