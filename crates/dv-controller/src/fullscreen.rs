//! The fullscreen overlay session.
//!
//! Opening clones the diagram's graphic into a fixed full-viewport layer with
//! its own control strip and engine, then asks for true fullscreen on that
//! layer. The page diagram is never touched, so closing only has to remove
//! what the session created.
//!
//! ```text
//! body
//! └── overlay (fixed, inset 0, dark backdrop)
//!     └── wrap (relative, 100% × 100%)
//!         ├── clone of the graphic (90%)
//!         └── overlay control strip
//! ```

use crate::controls::{self, ControlAction, StripKind};
use crate::engine::{self, PanZoomEngine};
use crate::error::ControllerError;
use crate::event::{ControlTarget, EventKind, EventSource, Subscription, ViewportEvent};
use crate::host::{Host, release, set_styles};
use crate::registry::InstanceId;
use dv_core::{PanZoomOptions, ViewportState};

const OVERLAY_STYLE: &[(&str, &str)] = &[
    ("position", "fixed"),
    ("inset", "0"),
    ("background", "rgba(0,0,0,0.85)"),
    ("display", "flex"),
    ("align-items", "center"),
    ("justify-content", "center"),
    ("z-index", "9999"),
    ("padding", "24px"),
];

const WRAP_STYLE: &[(&str, &str)] = &[
    ("position", "relative"),
    ("width", "100%"),
    ("height", "100%"),
    ("display", "flex"),
    ("align-items", "center"),
    ("justify-content", "center"),
];

const CLONE_STYLE: &[(&str, &str)] = &[
    ("width", "90%"),
    ("height", "90%"),
    ("max-width", "1600px"),
    ("max-height", "90%"),
];

/// How the overlay ended up being shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    /// Fullscreen was requested and has not been refused.
    Fullscreen,
    /// Fullscreen was refused; the overlay is a full-viewport modal instead.
    Modal,
}

pub struct FullscreenSession<H: Host> {
    origin: InstanceId,
    overlay: H::Element,
    clone: H::Element,
    engine: Option<H::Engine>,
    subscriptions: Vec<Subscription>,
    presentation: Presentation,
}

impl<H: Host> FullscreenSession<H> {
    /// Build the overlay for `graphic` and present it.
    ///
    /// On any failure after the overlay is in the document, everything built
    /// so far is torn down before the error is returned.
    pub fn open(
        host: &mut H,
        origin: InstanceId,
        graphic: &H::Element,
        options: &PanZoomOptions,
    ) -> Result<Self, ControllerError> {
        let overlay = host.create_element("div")?;
        set_styles(host, &overlay, OVERLAY_STYLE)?;
        let wrap = host.create_element("div")?;
        set_styles(host, &wrap, WRAP_STYLE)?;
        host.append_child(&overlay, &wrap)?;

        let clone = host.clone_graphic(graphic)?;
        set_styles(host, &clone, CLONE_STYLE)?;
        host.append_child(&wrap, &clone)?;

        let strip = controls::build_strip(host, StripKind::Overlay)?;
        host.append_child(&wrap, &strip.root)?;

        let body = host.body()?;
        host.append_child(&body, &overlay)?;

        let mut session = Self {
            origin,
            overlay,
            clone,
            engine: None,
            subscriptions: Vec::new(),
            presentation: Presentation::Modal,
        };
        if let Err(err) = session.activate(host, options, &strip) {
            session.close(host);
            return Err(err);
        }
        Ok(session)
    }

    fn activate(
        &mut self,
        host: &mut H,
        options: &PanZoomOptions,
        strip: &controls::ControlStrip<H::Element>,
    ) -> Result<(), ControllerError> {
        // The clone must be in the document before it can be measured
        let mut pan_zoom = host.create_engine(&self.clone, options)?;
        if let Err(err) = engine::recenter(&mut pan_zoom) {
            log::debug!("overlay pan/zoom init failed: {err}");
        }
        self.engine = Some(pan_zoom);

        self.subscriptions = controls::wire_strip(host, strip, ControlTarget::Overlay)?;

        self.presentation = match host.request_fullscreen(&self.overlay) {
            Ok(()) => Presentation::Fullscreen,
            Err(err) => {
                log::debug!("overlay fullscreen request failed, showing modal: {err}");
                Presentation::Modal
            }
        };

        let listeners = [
            (
                EventSource::Window,
                EventKind::Resize,
                ViewportEvent::OverlayResize,
            ),
            (
                EventSource::Element(&self.overlay),
                EventKind::FullscreenChange,
                ViewportEvent::OverlayResize,
            ),
            (
                EventSource::Document,
                EventKind::FullscreenChange,
                ViewportEvent::FullscreenChange,
            ),
            (
                EventSource::Document,
                EventKind::FullscreenError,
                ViewportEvent::FullscreenRefused,
            ),
        ];
        for (source, kind, event) in listeners {
            let sub = host.subscribe(source, kind, event)?;
            self.subscriptions.push(sub);
        }
        Ok(())
    }

    /// The page diagram this overlay was opened from.
    pub fn origin(&self) -> InstanceId {
        self.origin
    }

    pub fn overlay(&self) -> &H::Element {
        &self.overlay
    }

    pub fn clone_element(&self) -> &H::Element {
        &self.clone
    }

    /// `Fullscreen` until the environment refuses the request, which may
    /// happen after `open` returned.
    pub fn presentation(&self) -> Presentation {
        self.presentation
    }

    /// The fullscreen request was refused late; keep showing the overlay as
    /// a modal.
    pub fn fall_back_to_modal(&mut self) {
        self.presentation = Presentation::Modal;
    }

    pub fn state(&self) -> Option<ViewportState> {
        self.engine.as_ref().map(|e| e.state())
    }

    pub fn recenter(&mut self) {
        if let Some(pan_zoom) = self.engine.as_mut()
            && let Err(err) = engine::recenter(pan_zoom)
        {
            log::debug!("overlay resize recenter failed: {err}");
        }
    }

    /// Apply a zoom/reset control to the clone. `Close` and `Fullscreen`
    /// are session-level and handled by the controller.
    pub fn apply(&mut self, action: ControlAction, zoom_step: f64) {
        let Some(pan_zoom) = self.engine.as_mut() else {
            return;
        };
        let result = match action {
            ControlAction::ZoomIn => pan_zoom.zoom_by(zoom_step),
            ControlAction::ZoomOut => pan_zoom.zoom_by(1.0 / zoom_step),
            ControlAction::Reset => engine::reset_view(pan_zoom),
            ControlAction::Fullscreen | ControlAction::Close => Ok(()),
        };
        if let Err(err) = result {
            log::debug!("overlay {action:?} failed: {err}");
        }
    }

    /// Release everything the session created. Consumes the session, so a
    /// second close cannot happen.
    pub fn close(mut self, host: &mut H) {
        if let Some(mut pan_zoom) = self.engine.take() {
            engine::discard(&mut pan_zoom, "overlay");
        }
        match host.body() {
            Ok(body) => {
                if let Err(err) = host.remove_child(&body, &self.overlay) {
                    log::debug!("overlay removal failed: {err}");
                }
            }
            Err(err) => log::debug!("overlay removal failed: {err}"),
        }
        release(host, std::mem::take(&mut self.subscriptions));
        if self.presentation == Presentation::Fullscreen
            && host.is_fullscreen()
            && let Err(err) = host.exit_fullscreen()
        {
            log::debug!("exit fullscreen failed: {err}");
        }
    }
}
