//! Event loop around [`UploadController`].
//!
//! One task owns the controller and applies inputs in arrival order, so user
//! actions and request completions never interleave. Each accepted file is
//! submitted from its own task, which reports back through the same channel.
//! The loop ends once every [`ControllerHandle`] is dropped and no request is
//! still running.

use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use docex_core::{Extractor, SelectedFile, SelectionSource, UploadState};

use crate::controller::{submit, Completion, UploadController};

#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// Upper bound on a single extraction request.
    pub request_timeout: Duration,
    /// Capacity of the input channel.
    pub channel_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
            channel_capacity: 32,
        }
    }
}

#[derive(Debug)]
enum Input {
    Select {
        source: SelectionSource,
        files: Vec<SelectedFile>,
        ack: oneshot::Sender<UploadState>,
    },
    Reset {
        ack: oneshot::Sender<UploadState>,
    },
    Completed(Completion),
}

/// Cloneable handle to a running controller.
#[derive(Clone, Debug)]
pub struct ControllerHandle {
    tx: mpsc::Sender<Input>,
    state_rx: watch::Receiver<UploadState>,
}

/// Start the event loop on the current tokio runtime.
pub fn spawn(
    extractor: Arc<dyn Extractor>,
    config: ControllerConfig,
) -> (ControllerHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
    let (state_tx, state_rx) = watch::channel(UploadState::Idle);

    let loop_tx = tx.downgrade();
    let join = tokio::spawn(async move {
        run(extractor, config, rx, loop_tx, state_tx).await;
    });

    (ControllerHandle { tx, state_rx }, join)
}

async fn run(
    extractor: Arc<dyn Extractor>,
    config: ControllerConfig,
    mut rx: mpsc::Receiver<Input>,
    tx: mpsc::WeakSender<Input>,
    state_tx: watch::Sender<UploadState>,
) {
    let mut controller = UploadController::new();
    tracing::debug!(timeout = ?config.request_timeout, "Upload controller started");

    while let Some(input) = rx.recv().await {
        match input {
            Input::Select { source, files, ack } => {
                let outcome = controller.select(source, files);
                if outcome.changed {
                    state_tx.send_replace(controller.state().clone());
                }

                if let Some(effect) = outcome.effect {
                    match tx.upgrade() {
                        Some(tx) => {
                            let extractor = Arc::clone(&extractor);
                            let timeout = config.request_timeout;
                            tokio::spawn(async move {
                                let completion = submit(extractor.as_ref(), effect, timeout).await;
                                if tx.send(Input::Completed(completion)).await.is_err() {
                                    tracing::debug!("Controller stopped before request finished");
                                }
                            });
                        }
                        None => tracing::debug!("Controller shutting down, request not sent"),
                    }
                }

                let _ = ack.send(controller.state().clone());
            }
            Input::Reset { ack } => {
                if controller.reset() {
                    state_tx.send_replace(controller.state().clone());
                }
                let _ = ack.send(controller.state().clone());
            }
            Input::Completed(completion) => {
                if controller.complete(completion) {
                    state_tx.send_replace(controller.state().clone());
                }
            }
        }
    }

    tracing::debug!("Upload controller stopped");
}

impl ControllerHandle {
    /// Hand over a selection. Returns the state right after validation
    /// (`Loading` or `Error`, or unchanged for an empty selection).
    pub async fn select(
        &self,
        source: SelectionSource,
        files: Vec<SelectedFile>,
    ) -> Result<UploadState> {
        let (ack, reply) = oneshot::channel();
        self.tx
            .send(Input::Select { source, files, ack })
            .await
            .map_err(|_| anyhow!("Upload controller is not running"))?;
        reply.await.context("Upload controller dropped the selection")
    }

    pub async fn reset(&self) -> Result<UploadState> {
        let (ack, reply) = oneshot::channel();
        self.tx
            .send(Input::Reset { ack })
            .await
            .map_err(|_| anyhow!("Upload controller is not running"))?;
        reply.await.context("Upload controller dropped the reset")
    }

    /// Latest state snapshot.
    pub fn state(&self) -> UploadState {
        self.state_rx.borrow().clone()
    }

    /// Receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.state_rx.clone()
    }

    /// Wait until the request tracked by `after` is no longer in flight.
    /// States that track no request are returned as they are.
    pub async fn settled(&self, after: UploadState) -> Result<UploadState> {
        let token = match after.tracked_token() {
            Some(token) => token,
            None => return Ok(after),
        };

        let mut rx = self.state_rx.clone();
        let state = rx
            .wait_for(|state| state.tracked_token() != Some(token))
            .await
            .context("Upload controller stopped while a request was in flight")?;
        Ok(state.clone())
    }

    /// Select and wait for the outcome of the request it started.
    pub async fn select_and_settle(
        &self,
        source: SelectionSource,
        files: Vec<SelectedFile>,
    ) -> Result<UploadState> {
        let after = self.select(source, files).await?;
        self.settled(after).await
    }
}
