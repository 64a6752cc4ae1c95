//! Upload controller for docex.
//!
//! [`UploadController`] is the synchronous owner of the upload state;
//! [`spawn`] runs it as a serialized event loop with request tokens and a
//! per-request timeout.

pub mod controller;
pub mod runtime;

pub use controller::{submit, Completion, Dispatched, UploadController};
pub use runtime::{spawn, ControllerConfig, ControllerHandle};
