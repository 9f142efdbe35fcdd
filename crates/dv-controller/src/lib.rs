//! Diagram viewport controller.
//!
//! Turns rendered diagram graphics into interactive viewports: pan/zoom, an
//! overlay control strip, and a fullscreen overlay with its own viewport.
//! The controller never touches a real DOM; everything goes through the
//! [`host::Host`] trait so the lifecycle can be driven from tests.

pub mod controller;
pub mod controls;
pub mod engine;
pub mod error;
pub mod event;
pub mod fullscreen;
pub mod host;
pub mod registry;

pub use controller::{AttachOutcome, RenderTicket, ViewportController};
pub use controls::{ControlAction, ControlStrip, StripKind};
pub use engine::PanZoomEngine;
pub use error::{ControllerError, EngineError, HostError};
pub use event::{ControlTarget, EventKind, EventSource, Subscription, ViewportEvent};
pub use fullscreen::{FullscreenSession, Presentation};
pub use host::{Discovered, Host};
pub use registry::{DiagramInstance, InstanceId, InstanceSet};
