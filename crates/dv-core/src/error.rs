use thiserror::Error;

/// Failures raised by the viewport engine and configuration loading.
#[derive(Debug, Error)]
pub enum ViewportError {
    /// The on-screen viewport has no area yet (layout not finalized).
    #[error("viewport has no area")]
    EmptyViewport,

    /// The graphic's content box has no area.
    #[error("content box has no area")]
    EmptyContent,

    /// The engine was destroyed and can no longer be driven.
    #[error("pan/zoom engine already destroyed")]
    Destroyed,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures raised by a post source.
#[derive(Debug, Error)]
pub enum PostError {
    #[error("post source unavailable: {0}")]
    Source(String),

    #[error("post JSON: {0}")]
    Json(#[from] serde_json::Error),
}
