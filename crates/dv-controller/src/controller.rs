//! The viewport controller: attach, detach, fullscreen, and event dispatch.
//!
//! ## Lifecycle
//!
//! ```text
//! content load ─► begin_render() ─► (renderer finishes) ─► attach(ticket)
//!                     │                                        │
//!                     └──── detach() bumps the generation ─────┘
//!                           so a late attach becomes a no-op
//! ```
//!
//! The controller is owned by whatever mounts the content view. It holds the
//! instance set, the shared resize listener, and the optional fullscreen
//! session; nothing lives in global state.

use crate::controls::{self, ControlAction, StripKind};
use crate::engine::{self, PanZoomEngine};
use crate::error::{ControllerError, HostError};
use crate::event::{ControlTarget, ViewportEvent};
use crate::fullscreen::FullscreenSession;
use crate::host::Host;
use crate::registry::{DiagramInstance, InstanceId, InstanceSet};
use dv_core::{ControllerConfig, ViewportState};

/// Proof that an attach belongs to the current content load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTicket {
    generation: u64,
}

impl RenderTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    Attached {
        /// Diagrams now registered.
        instances: usize,
        /// Containers without a graphic, or whose setup failed.
        skipped: usize,
    },
    /// The content was torn down (or replaced) before rendering finished.
    Stale,
}

pub struct ViewportController<H: Host> {
    config: ControllerConfig,
    instances: InstanceSet<H>,
    session: Option<FullscreenSession<H>>,
    generation: u64,
    next_id: u32,
}

impl<H: Host> ViewportController<H> {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            instances: InstanceSet::new(),
            session: None,
            generation: 0,
            next_id: 0,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    // ─── Attach / detach ─────────────────────────────────────────────────

    /// Start a content load. Only the newest ticket can attach.
    pub fn begin_render(&mut self) -> RenderTicket {
        self.generation += 1;
        RenderTicket {
            generation: self.generation,
        }
    }

    /// `begin_render` + `attach`, for content that is already rendered.
    pub fn attach_now(
        &mut self,
        host: &mut H,
        root: &H::Element,
    ) -> Result<AttachOutcome, ControllerError> {
        let ticket = self.begin_render();
        self.attach(host, ticket, root)
    }

    /// Discover rendered graphics under `root` and make each interactive.
    ///
    /// Anything still attached from an earlier pass is torn down first, so
    /// repeated attaches never stack strips or resize listeners.
    pub fn attach(
        &mut self,
        host: &mut H,
        ticket: RenderTicket,
        root: &H::Element,
    ) -> Result<AttachOutcome, ControllerError> {
        if ticket.generation != self.generation {
            log::debug!(
                "dropping stale attach (ticket {}, current {})",
                ticket.generation,
                self.generation
            );
            return Ok(AttachOutcome::Stale);
        }
        if !self.instances.is_empty() || self.session.is_some() {
            log::debug!("re-attach: releasing {} diagrams", self.instances.len());
            self.teardown(host);
        }

        let found = host.query_graphics(
            root,
            &self.config.diagram_selector,
            &self.config.graphic_selector,
        )?;
        let mut skipped = 0;
        for discovered in found {
            let Some(graphic) = discovered.graphic else {
                log::warn!("diagram container has no rendered graphic, skipping");
                skipped += 1;
                continue;
            };
            if let Err(err) = self.attach_one(host, discovered.container, graphic) {
                log::warn!("skipping diagram: {err}");
                skipped += 1;
            }
        }

        if !self.instances.is_empty() {
            self.instances.ensure_resize_listener(host)?;
        }
        log::debug!(
            "attached {} diagrams ({skipped} skipped)",
            self.instances.len()
        );
        Ok(AttachOutcome::Attached {
            instances: self.instances.len(),
            skipped,
        })
    }

    fn attach_one(
        &mut self,
        host: &mut H,
        container: H::Element,
        graphic: H::Element,
    ) -> Result<(), ControllerError> {
        prepare_container(host, &container)?;

        let mut pan_zoom = host.create_engine(&graphic, &self.config.inline)?;
        // Layout may not be final when the engine is created
        if let Err(err) = engine::recenter(&mut pan_zoom) {
            log::debug!("initial recenter failed: {err}");
        }

        let strip = match controls::build_strip(host, StripKind::Inline)
            .and_then(|strip| host.append_child(&container, &strip.root).map(|()| strip))
        {
            Ok(strip) => strip,
            Err(err) => {
                engine::discard(&mut pan_zoom, "diagram");
                return Err(err.into());
            }
        };

        self.next_id += 1;
        let id = InstanceId(self.next_id);
        let subscriptions = match controls::wire_strip(host, &strip, ControlTarget::Instance(id)) {
            Ok(subs) => subs,
            Err(err) => {
                if let Err(err) = host.remove_child(&container, &strip.root) {
                    log::debug!("controls removal failed: {err}");
                }
                engine::discard(&mut pan_zoom, "diagram");
                return Err(err.into());
            }
        };

        self.instances.push(DiagramInstance {
            id,
            container,
            graphic,
            controls: strip.root,
            engine: pan_zoom,
            subscriptions,
        });
        Ok(())
    }

    /// Release every diagram, the shared listener, any overlay, and pending
    /// timers. Pending tickets become stale. Safe to call when nothing is
    /// attached.
    pub fn detach(&mut self, host: &mut H) {
        self.generation += 1;
        self.teardown(host);
    }

    fn teardown(&mut self, host: &mut H) {
        if let Some(session) = self.session.take() {
            session.close(host);
        }
        self.instances.clear(host);
        host.cancel_scheduled();
    }

    // ─── Fullscreen ──────────────────────────────────────────────────────

    /// Open the overlay for `id`, or close the overlay if one is open.
    pub fn toggle_fullscreen(
        &mut self,
        host: &mut H,
        id: InstanceId,
    ) -> Result<(), ControllerError> {
        if self.session.is_some() {
            self.close_fullscreen(host);
            return Ok(());
        }
        let graphic = self
            .instances
            .get(id)
            .map(|instance| instance.graphic.clone())
            .ok_or(ControllerError::UnknownInstance(id))?;
        let session = FullscreenSession::open(host, id, &graphic, &self.config.overlay)?;
        log::debug!("{id} fullscreen ({:?})", session.presentation());
        self.session = Some(session);
        self.schedule_settle(host, id);
        Ok(())
    }

    /// Tear down the overlay. Returns `false` if there was none, which makes
    /// a close racing a browser fullscreen-change a no-op.
    pub fn close_fullscreen(&mut self, host: &mut H) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        let origin = session.origin();
        session.close(host);
        self.schedule_settle(host, origin);
        true
    }

    /// Re-fit the page diagram once the fullscreen transition has settled.
    fn schedule_settle(&mut self, host: &mut H, instance: InstanceId) {
        let event = ViewportEvent::Settle {
            instance,
            generation: self.generation,
        };
        if let Err(err) = host.schedule(self.config.settle_delay_ms, event) {
            log::debug!("settle recenter not scheduled: {err}");
        }
    }

    // ─── Events ──────────────────────────────────────────────────────────

    pub fn handle_event(&mut self, host: &mut H, event: ViewportEvent) {
        match event {
            ViewportEvent::Control {
                target: ControlTarget::Instance(id),
                action,
            } => self.handle_instance_control(host, id, action),
            ViewportEvent::Control {
                target: ControlTarget::Overlay,
                action,
            } => {
                if action == ControlAction::Close {
                    self.close_fullscreen(host);
                } else if let Some(session) = self.session.as_mut() {
                    session.apply(action, self.config.zoom_step);
                } else {
                    log::debug!("overlay {action:?} with no overlay open");
                }
            }
            ViewportEvent::WindowResize => self.instances.recenter_all(),
            ViewportEvent::OverlayResize => {
                if let Some(session) = self.session.as_mut() {
                    session.recenter();
                }
            }
            ViewportEvent::FullscreenChange => {
                if !host.is_fullscreen() {
                    self.close_fullscreen(host);
                }
            }
            ViewportEvent::FullscreenRefused => {
                if let Some(session) = self.session.as_mut() {
                    log::debug!("fullscreen refused, overlay stays as a modal");
                    session.fall_back_to_modal();
                }
            }
            ViewportEvent::Settle {
                instance,
                generation,
            } => {
                if generation != self.generation {
                    return;
                }
                if let Some(instance) = self.instances.get_mut(instance) {
                    instance.recenter();
                }
            }
        }
    }

    fn handle_instance_control(&mut self, host: &mut H, id: InstanceId, action: ControlAction) {
        if action == ControlAction::Fullscreen {
            if let Err(err) = self.toggle_fullscreen(host, id) {
                log::error!("fullscreen failed: {err}");
            }
            return;
        }
        let step = self.config.zoom_step;
        let Some(instance) = self.instances.get_mut(id) else {
            log::debug!("{action:?} for released {id}");
            return;
        };
        let result = match action {
            ControlAction::ZoomIn => instance.engine.zoom_by(step),
            ControlAction::ZoomOut => instance.engine.zoom_by(1.0 / step),
            ControlAction::Reset => engine::reset_view(&mut instance.engine),
            ControlAction::Fullscreen | ControlAction::Close => Ok(()),
        };
        if let Err(err) = result {
            log::debug!("{id} {action:?} failed: {err}");
        }
    }

    // ─── Introspection ───────────────────────────────────────────────────

    pub fn instances(&self) -> &InstanceSet<H> {
        &self.instances
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn instance_ids(&self) -> Vec<InstanceId> {
        self.instances.ids()
    }

    pub fn instance(&self, id: InstanceId) -> Option<&DiagramInstance<H>> {
        self.instances.get(id)
    }

    pub fn instance_state(&self, id: InstanceId) -> Option<ViewportState> {
        self.instances.get(id).map(|i| i.engine.state())
    }

    pub fn has_resize_listener(&self) -> bool {
        self.instances.has_resize_listener()
    }

    pub fn session(&self) -> Option<&FullscreenSession<H>> {
        self.session.as_ref()
    }

    pub fn session_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn overlay_state(&self) -> Option<ViewportState> {
        self.session.as_ref().and_then(|s| s.state())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl<H: Host> Default for ViewportController<H> {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}

/// Let the container host an absolutely positioned strip. Positioning is only
/// assigned when the container is `static`, so re-attaching is harmless.
fn prepare_container<H: Host + ?Sized>(
    host: &mut H,
    container: &H::Element,
) -> Result<(), HostError> {
    if host.computed_position(container)? == "static" {
        host.set_style(container, "position", "relative")?;
    }
    // Span the available width so centering has room to work
    host.set_style(container, "width", "100%")?;
    host.set_style(container, "overflow", "visible")
}

