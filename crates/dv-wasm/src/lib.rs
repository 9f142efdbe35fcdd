//! WASM bridge for Diagram Viewports. Exposes the controller to the blog's
//! post page.
//!
//! Compiled via `wasm-pack build --target web`. The page owns one
//! `DiagramViewports` per mounted post and calls `render_and_attach` after
//! inserting the post markup, then `detach` (or drops it) when navigating
//! away.

mod host;
mod panzoom;

pub use host::WebHost;
pub use panzoom::{WebPanZoom, clean_copy, parse_view_box};

use dv_controller::{InstanceId, RenderTicket, ViewportController, ViewportEvent};
use dv_core::{ControllerConfig, RendererConfig};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::Element;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = mermaid, js_name = initialize, catch)]
    fn mermaid_initialize(config: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = mermaid, js_name = run, catch)]
    fn mermaid_run(options: &JsValue) -> Result<js_sys::Promise, JsValue>;
}

/// Controller plus the host it drives. Listener closures reach it through a
/// `Weak`, so dropping `DiagramViewports` is enough to silence them.
pub(crate) struct Shared {
    controller: ViewportController<WebHost>,
    host: WebHost,
}

pub(crate) type Handle = Weak<RefCell<Shared>>;

/// Deliver a DOM event to the controller.
pub(crate) fn dispatch(handle: &Handle, event: ViewportEvent) {
    deliver(handle, None, event);
}

/// Deliver a fired timer's event and drop the timer.
pub(crate) fn dispatch_scheduled(handle: &Handle, timer: u64, event: ViewportEvent) {
    deliver(handle, Some(timer), event);
}

fn deliver(handle: &Handle, timer: Option<u64>, event: ViewportEvent) {
    let Some(shared) = handle.upgrade() else {
        return;
    };
    let Ok(mut shared) = shared.try_borrow_mut() else {
        log::debug!("dropping re-entrant {event:?}");
        return;
    };
    let Shared { controller, host } = &mut *shared;
    host.bury_dead_listeners();
    if let Some(timer) = timer {
        host.retire_timer(timer);
    }
    controller.handle_event(host, event);
}

fn attach_with(handle: &Handle, ticket: RenderTicket, root: &Element) {
    let Some(shared) = handle.upgrade() else {
        return;
    };
    let Ok(mut shared) = shared.try_borrow_mut() else {
        log::warn!("controller busy, diagrams not attached");
        return;
    };
    let Shared { controller, host } = &mut *shared;
    if let Err(err) = controller.attach(host, ticket, root) {
        log::error!("attach failed: {err}");
    }
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// The JS-facing controller for one mounted post.
#[wasm_bindgen]
pub struct DiagramViewports {
    shared: Rc<RefCell<Shared>>,
    renderer: RendererConfig,
}

#[wasm_bindgen]
impl DiagramViewports {
    /// Create a controller. `config_json` overrides `ControllerConfig`
    /// fields (camelCase); omitted fields keep their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<DiagramViewports, JsValue> {
        console_error_panic_hook_setup();

        let config = match config_json.as_deref() {
            Some(json) => ControllerConfig::from_json(json).map_err(to_js)?,
            None => ControllerConfig::default(),
        };
        let host = WebHost::new().map_err(to_js)?;
        let shared = Rc::new(RefCell::new(Shared {
            controller: ViewportController::new(config),
            host,
        }));
        shared.borrow_mut().host.bind(Rc::downgrade(&shared));
        Ok(Self {
            shared,
            renderer: RendererConfig::default(),
        })
    }

    /// Attach to already rendered diagrams under `root`. Returns how many
    /// became interactive.
    pub fn attach(&self, root: &Element) -> Result<usize, JsValue> {
        self.with(|Shared { controller, host }| controller.attach_now(host, root))?
            .map_err(to_js)?;
        self.instance_count()
    }

    /// Attach once `rendered` settles. A rejected promise is logged and
    /// attach still runs for whatever did render. If `detach` (or another
    /// attach) happens first, this one is dropped.
    #[wasm_bindgen(js_name = attachAfter)]
    pub fn attach_after(&self, root: Element, rendered: js_sys::Promise) -> Result<(), JsValue> {
        let ticket = self.with(|shared| shared.controller.begin_render())?;
        let handle = Rc::downgrade(&self.shared);
        spawn_local(async move {
            if let Err(err) = JsFuture::from(rendered).await {
                log::warn!("diagram rendering failed: {err:?}");
            }
            attach_with(&handle, ticket, &root);
        });
        Ok(())
    }

    /// Run Mermaid over the post's diagram placeholders, then attach.
    #[wasm_bindgen(js_name = renderAndAttach)]
    pub fn render_and_attach(&self, root: Element) -> Result<(), JsValue> {
        let selector = self.with(|shared| shared.controller.config().diagram_selector.clone())?;
        match self.start_renderer(&selector) {
            Ok(rendered) => self.attach_after(root, rendered),
            Err(err) => {
                log::warn!("diagram renderer unavailable: {err:?}");
                self.attach(&root).map(|_| ())
            }
        }
    }

    /// Release every diagram, listener, overlay and pending timer.
    pub fn detach(&self) -> Result<(), JsValue> {
        self.with(|Shared { controller, host }| controller.detach(host))
    }

    /// Open the overlay for the `index`th attached diagram (document order),
    /// or close the overlay if one is open.
    #[wasm_bindgen(js_name = toggleFullscreen)]
    pub fn toggle_fullscreen(&self, index: usize) -> Result<(), JsValue> {
        self.with(|Shared { controller, host }| {
            let id: InstanceId = controller
                .instance_ids()
                .get(index)
                .copied()
                .ok_or_else(|| JsValue::from_str("no diagram at that index"))?;
            controller.toggle_fullscreen(host, id).map_err(to_js)
        })?
    }

    #[wasm_bindgen(js_name = instanceCount)]
    pub fn instance_count(&self) -> Result<usize, JsValue> {
        self.with(|shared| shared.controller.instance_count())
    }

    #[wasm_bindgen(js_name = sessionActive)]
    pub fn session_active(&self) -> Result<bool, JsValue> {
        self.with(|shared| shared.controller.session_active())
    }
}

impl DiagramViewports {
    /// Settle timers scheduled and not yet fired.
    pub fn pending_timers(&self) -> Result<usize, JsValue> {
        self.with(|shared| shared.host.pending_timers())
    }

    fn with<R>(&self, f: impl FnOnce(&mut Shared) -> R) -> Result<R, JsValue> {
        let mut shared = self
            .shared
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("diagram controller is busy"))?;
        Ok(f(&mut shared))
    }

    fn start_renderer(&self, selector: &str) -> Result<js_sys::Promise, JsValue> {
        let config = self.renderer.to_json().map_err(to_js)?;
        mermaid_initialize(&js_sys::JSON::parse(&config)?)?;
        let options = serde_json::json!({ "querySelector": selector }).to_string();
        mermaid_run(&js_sys::JSON::parse(&options)?)
    }
}

impl Drop for DiagramViewports {
    fn drop(&mut self) {
        if let Ok(mut shared) = self.shared.try_borrow_mut() {
            let Shared { controller, host } = &mut *shared;
            controller.detach(host);
        }
    }
}

// ─── Panic hook and logging ──────────────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("diagram viewports panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
            if let Err(err) = console_log::init_with_level(log::Level::Debug) {
                web_sys::console::warn_1(&format!("logger not installed: {err}").into());
            }
        });
    }
}

// ─── Standalone helpers (no controller needed) ───────────────────────────

/// Human-readable post date, e.g. `"2024-03-05"` → `"March 5, 2024"`.
#[wasm_bindgen(js_name = formatPostDate)]
pub fn format_post_date(date: &str) -> String {
    dv_core::format_date(date)
}
