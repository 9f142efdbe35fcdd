pub mod config;
pub mod error;
pub mod post;
pub mod viewport;

pub use config::{ControllerConfig, PanZoomOptions, RendererConfig};
pub use error::{PostError, ViewportError};
pub use post::{BlogPost, PostRoute, PostSource, PostTag, StaticPosts, format_date, resolve_post};
pub use viewport::{PanZoom, ViewportState};

// Re-export kurbo geometry so downstream crates don't need a direct dependency
pub use kurbo::{Affine, Point, Rect, Size, Vec2};
