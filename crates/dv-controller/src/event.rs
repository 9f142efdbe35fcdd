//! Events flowing from the document back into the controller.
//!
//! The host owns the real listeners. When one fires it hands the controller
//! the `ViewportEvent` it was registered with, so wiring a control is just
//! "subscribe this element's click to this event".

use crate::controls::ControlAction;
use crate::registry::InstanceId;

/// Handle to one registered listener. Returned by `Host::subscribe` and
/// consumed by `Host::unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subscription(pub u64);

/// DOM event types the controller listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Resize,
    FullscreenChange,
    /// A fullscreen request was refused after it was issued.
    FullscreenError,
}

impl EventKind {
    pub fn dom_name(&self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::Resize => "resize",
            EventKind::FullscreenChange => "fullscreenchange",
            EventKind::FullscreenError => "fullscreenerror",
        }
    }
}

/// Where a listener is attached.
#[derive(Debug, Clone, PartialEq)]
pub enum EventSource<'a, E> {
    Window,
    Document,
    Element(&'a E),
}

/// Which viewport a control strip drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlTarget {
    Instance(InstanceId),
    /// The active fullscreen overlay, whichever diagram it was opened from.
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportEvent {
    Control {
        target: ControlTarget,
        action: ControlAction,
    },
    /// Shared window resize: re-fit every attached diagram.
    WindowResize,
    /// Resize while the overlay is up: re-fit the overlay clone.
    OverlayResize,
    /// Document fullscreen state changed.
    FullscreenChange,
    /// The overlay's fullscreen request was refused asynchronously.
    FullscreenRefused,
    /// Post-transition re-fit of a page diagram, scheduled by the controller.
    Settle {
        instance: InstanceId,
        generation: u64,
    },
}
