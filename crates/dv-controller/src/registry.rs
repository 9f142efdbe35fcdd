//! The registered instance set: every diagram attached for the current
//! content, plus the one window-resize listener they share.

use crate::engine::{self, PanZoomEngine};
use crate::error::HostError;
use crate::event::{EventKind, EventSource, Subscription, ViewportEvent};
use crate::host::{Host, release};
use std::fmt;

/// Identifies an attached diagram. Never reused within one controller, so
/// events that outlive their diagram simply stop resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub(crate) u32);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "diagram#{}", self.0)
    }
}

pub struct DiagramInstance<H: Host> {
    pub id: InstanceId,
    pub container: H::Element,
    pub graphic: H::Element,
    /// The inline control strip root, appended to `container`.
    pub controls: H::Element,
    pub engine: H::Engine,
    pub(crate) subscriptions: Vec<Subscription>,
}

impl<H: Host> DiagramInstance<H> {
    /// Re-fit and re-center. Failures are logged, never propagated.
    pub fn recenter(&mut self) {
        if let Err(err) = engine::recenter(&mut self.engine) {
            log::debug!("{} recenter failed: {err}", self.id);
        }
    }

    /// Destroy the engine, remove the strip, drop the click listeners.
    /// The graphic itself is left in place.
    pub(crate) fn teardown(mut self, host: &mut H) {
        engine::discard(&mut self.engine, "diagram");
        if let Err(err) = host.remove_child(&self.container, &self.controls) {
            log::debug!("{} controls removal failed: {err}", self.id);
        }
        release(host, std::mem::take(&mut self.subscriptions));
    }
}

pub struct InstanceSet<H: Host> {
    instances: Vec<DiagramInstance<H>>,
    resize: Option<Subscription>,
}

impl<H: Host> Default for InstanceSet<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Host> InstanceSet<H> {
    pub fn new() -> Self {
        Self {
            instances: Vec::new(),
            resize: None,
        }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn has_resize_listener(&self) -> bool {
        self.resize.is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagramInstance<H>> {
        self.instances.iter()
    }

    pub fn ids(&self) -> Vec<InstanceId> {
        self.instances.iter().map(|i| i.id).collect()
    }

    pub fn get(&self, id: InstanceId) -> Option<&DiagramInstance<H>> {
        self.instances.iter().find(|i| i.id == id)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut DiagramInstance<H>> {
        self.instances.iter_mut().find(|i| i.id == id)
    }

    pub(crate) fn push(&mut self, instance: DiagramInstance<H>) {
        self.instances.push(instance);
    }

    /// Register the shared resize listener unless one is already registered.
    pub(crate) fn ensure_resize_listener(&mut self, host: &mut H) -> Result<(), HostError> {
        if self.resize.is_none() {
            let sub = host.subscribe(
                EventSource::Window,
                EventKind::Resize,
                ViewportEvent::WindowResize,
            )?;
            self.resize = Some(sub);
        }
        Ok(())
    }

    /// Re-fit every instance; one failing engine does not stop the rest.
    pub fn recenter_all(&mut self) {
        for instance in &mut self.instances {
            instance.recenter();
        }
    }

    /// Tear down every instance and the shared listener. Safe when empty.
    pub(crate) fn clear(&mut self, host: &mut H) {
        for instance in self.instances.drain(..) {
            instance.teardown(host);
        }
        if let Some(sub) = self.resize.take() {
            release(host, vec![sub]);
        }
    }
}
