//! The document host: everything the controller needs from the page.
//!
//! A browser build implements this over `web-sys`; tests implement it over an
//! in-memory tree. The controller is generic over `Host` and never holds a
//! global handle to the document.

use crate::engine::PanZoomEngine;
use crate::error::{EngineError, HostError};
use crate::event::{EventKind, EventSource, Subscription, ViewportEvent};
use dv_core::PanZoomOptions;

/// A diagram container found under the content root, with the graphic the
/// renderer put inside it (if rendering succeeded).
#[derive(Debug, Clone, PartialEq)]
pub struct Discovered<E> {
    pub container: E,
    pub graphic: Option<E>,
}

pub trait Host {
    type Element: Clone + PartialEq + std::fmt::Debug;
    type Engine: PanZoomEngine;

    // ─── Discovery & styling ─────────────────────────────────────────────

    /// Containers matching `diagram_selector` under `root`, in document order.
    fn query_graphics(
        &self,
        root: &Self::Element,
        diagram_selector: &str,
        graphic_selector: &str,
    ) -> Result<Vec<Discovered<Self::Element>>, HostError>;

    /// The computed CSS `position` of an element.
    fn computed_position(&self, element: &Self::Element) -> Result<String, HostError>;

    fn set_style(
        &mut self,
        element: &Self::Element,
        property: &str,
        value: &str,
    ) -> Result<(), HostError>;

    // ─── Tree ────────────────────────────────────────────────────────────

    fn create_element(&mut self, tag: &str) -> Result<Self::Element, HostError>;

    /// A `type="button"` element with text `label` and tooltip `title`.
    fn create_button(&mut self, label: &str, title: &str) -> Result<Self::Element, HostError>;

    fn append_child(
        &mut self,
        parent: &Self::Element,
        child: &Self::Element,
    ) -> Result<(), HostError>;

    fn remove_child(
        &mut self,
        parent: &Self::Element,
        child: &Self::Element,
    ) -> Result<(), HostError>;

    /// Deep clone of a graphic, not yet inserted anywhere.
    fn clone_graphic(&mut self, graphic: &Self::Element) -> Result<Self::Element, HostError>;

    fn body(&self) -> Result<Self::Element, HostError>;

    // ─── Engines ─────────────────────────────────────────────────────────

    /// Bind a pan/zoom engine to a graphic that is already in the document.
    fn create_engine(
        &mut self,
        graphic: &Self::Element,
        options: &PanZoomOptions,
    ) -> Result<Self::Engine, EngineError>;

    // ─── Fullscreen ──────────────────────────────────────────────────────

    /// Ask for true fullscreen presentation of `element`.
    fn request_fullscreen(&mut self, element: &Self::Element) -> Result<(), HostError>;

    fn exit_fullscreen(&mut self) -> Result<(), HostError>;

    fn is_fullscreen(&self) -> bool;

    // ─── Listeners & timers ──────────────────────────────────────────────

    /// Deliver `event` to the controller whenever `kind` fires on `source`.
    fn subscribe(
        &mut self,
        source: EventSource<'_, Self::Element>,
        kind: EventKind,
        event: ViewportEvent,
    ) -> Result<Subscription, HostError>;

    fn unsubscribe(&mut self, subscription: Subscription) -> Result<(), HostError>;

    /// Deliver `event` once after `delay_ms`.
    fn schedule(&mut self, delay_ms: u32, event: ViewportEvent) -> Result<(), HostError>;

    /// Drop every pending `schedule`d delivery.
    fn cancel_scheduled(&mut self);
}

/// Apply a list of inline styles, stopping at the first failure.
pub fn set_styles<H: Host + ?Sized>(
    host: &mut H,
    element: &H::Element,
    styles: &[(&str, &str)],
) -> Result<(), HostError> {
    for (property, value) in styles {
        host.set_style(element, property, value)?;
    }
    Ok(())
}

/// Unsubscribe during teardown. Failures mean the listener is already gone.
pub(crate) fn release<H: Host + ?Sized>(host: &mut H, subscriptions: Vec<Subscription>) {
    for subscription in subscriptions {
        if let Err(err) = host.unsubscribe(subscription) {
            log::debug!("unsubscribe {subscription:?} failed: {err}");
        }
    }
}
