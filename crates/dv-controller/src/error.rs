use crate::registry::InstanceId;
use dv_core::ViewportError;
use thiserror::Error;

/// Failures reported by the document host.
#[derive(Debug, Error)]
pub enum HostError {
    /// A JavaScript call threw or returned an unexpected value.
    #[error("host call failed: {0}")]
    Js(String),

    /// The element is no longer attached where the caller expected it.
    #[error("element detached")]
    Detached,

    /// The environment lacks a capability (e.g. the fullscreen API).
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
}

/// Failures reported by a pan/zoom engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Viewport(#[from] ViewportError),

    #[error(transparent)]
    Host(#[from] HostError),
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("no attached diagram {0}")]
    UnknownInstance(InstanceId),
}
