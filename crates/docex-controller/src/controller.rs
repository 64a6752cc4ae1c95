//! The upload controller: owns the state, validates selections and hands out
//! request tokens. It never performs I/O itself; [`submit`] runs the one
//! effect the state machine can emit.

use std::time::Duration;

use docex_core::{
    validate, Effect, ErrorMetadata, ExtractionResult, Extractor, LogLevel, RequestToken,
    SelectedFile, SelectionSource, SubmitError, UploadEvent, UploadState,
};

/// Result of one extraction request, tagged with the token it was issued under.
#[derive(Debug)]
pub struct Completion {
    pub token: RequestToken,
    pub outcome: Result<ExtractionResult, SubmitError>,
}

/// What a selection did: the effect to run, and whether the state moved.
#[derive(Debug, Default)]
pub struct Dispatched {
    pub effect: Option<Effect>,
    pub changed: bool,
}

#[derive(Debug)]
pub struct UploadController {
    state: UploadState,
    next_token: RequestToken,
}

impl Default for UploadController {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadController {
    pub fn new() -> Self {
        Self {
            state: UploadState::Idle,
            next_token: RequestToken::first(),
        }
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    /// Handle a drop or picker selection. Only the first file is considered;
    /// an empty selection changes nothing.
    ///
    /// The outcome carries the submit effect when the file was accepted.
    pub fn select(
        &mut self,
        source: SelectionSource,
        files: impl IntoIterator<Item = SelectedFile>,
    ) -> Dispatched {
        let mut files = files.into_iter();
        let candidate = match files.next() {
            Some(candidate) => candidate,
            None => return Dispatched::default(),
        };

        let ignored = files.count();
        if ignored > 0 {
            tracing::debug!(
                source = %source,
                ignored,
                "Multiple files selected, using the first one"
            );
        }

        let event = match validate(&candidate) {
            Ok(()) => {
                let token = self.next_token;
                self.next_token = token.next();
                tracing::info!(
                    source = %source,
                    token = %token,
                    file_name = %candidate.name,
                    size = candidate.size,
                    mime_type = %candidate.mime_type,
                    "File accepted"
                );
                UploadEvent::FileAccepted {
                    token,
                    file: candidate,
                }
            }
            Err(error) => {
                tracing::debug!(
                    source = %source,
                    file_name = %candidate.name,
                    size = candidate.size,
                    mime_type = %candidate.mime_type,
                    error = ?error,
                    "File rejected"
                );
                UploadEvent::FileRejected(error)
            }
        };

        self.dispatch(event)
    }

    /// Return to idle from any phase. Returns false when already idle.
    pub fn reset(&mut self) -> bool {
        self.dispatch(UploadEvent::Reset).changed
    }

    /// Apply a finished request. Returns false when the completion was stale.
    pub fn complete(&mut self, completion: Completion) -> bool {
        let Completion { token, outcome } = completion;

        let tracked = self.state.tracked_token();
        if tracked != Some(token) {
            tracing::debug!(
                token = %token,
                tracked = ?tracked.map(|t| t.get()),
                failed = outcome.is_err(),
                "Discarding stale extraction response"
            );
        }

        let event = match outcome {
            Ok(result) => UploadEvent::RequestSucceeded { token, result },
            Err(error) => {
                if tracked == Some(token) {
                    log_failure(token, &error);
                }
                UploadEvent::RequestFailed { token, error }
            }
        };

        self.dispatch(event).changed
    }

    fn dispatch(&mut self, event: UploadEvent) -> Dispatched {
        let state = std::mem::take(&mut self.state);
        let transition = state.apply(event);
        if transition.changed {
            tracing::debug!(phase = %transition.state.phase(), "Upload state changed");
        }
        self.state = transition.state;
        Dispatched {
            effect: transition.effect,
            changed: transition.changed,
        }
    }
}

fn log_failure(token: RequestToken, error: &SubmitError) {
    match error.log_level() {
        LogLevel::Error => tracing::error!(
            token = %token,
            code = error.error_code(),
            error = %error,
            "Extraction request failed"
        ),
        LogLevel::Warn => tracing::warn!(
            token = %token,
            code = error.error_code(),
            error = %error,
            "Extraction request failed"
        ),
    }
}

/// Run a submit effect with a bounded wait. Expiry becomes a failed completion.
pub async fn submit(extractor: &dyn Extractor, effect: Effect, timeout: Duration) -> Completion {
    let Effect::Submit { token, file } = effect;
    tracing::debug!(token = %token, file_name = %file.name, "Starting extraction request");

    let outcome = match tokio::time::timeout(timeout, extractor.extract(&file)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(SubmitError::Timeout(timeout)),
    };

    Completion { token, outcome }
}
