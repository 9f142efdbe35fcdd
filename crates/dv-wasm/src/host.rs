//! `Host` over the real browser DOM.

use crate::panzoom::{self, WebPanZoom};
use crate::{Handle, dispatch, dispatch_scheduled};
use dv_controller::{
    Discovered, EngineError, EventKind, EventSource, Host, HostError, Subscription, ViewportEvent,
};
use dv_core::PanZoomOptions;
use gloo_timers::callback::Timeout;
use std::collections::HashMap;
use std::rc::Weak;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Event, EventTarget, HtmlElement, SvgElement, Window};

pub(crate) fn js_err(value: JsValue) -> HostError {
    HostError::Js(format!("{value:?}"))
}

struct Listener {
    target: EventTarget,
    names: &'static [&'static str],
    closure: Closure<dyn FnMut(Event)>,
}

pub struct WebHost {
    window: Window,
    document: Document,
    handle: Handle,
    listeners: HashMap<u64, Listener>,
    next_subscription: u64,
    // Closures removed from the DOM while one of them may still be running
    graveyard: Vec<Closure<dyn FnMut(Event)>>,
    timers: HashMap<u64, Timeout>,
    next_timer: u64,
    // Timers whose callback is running; freed at the next dispatch
    spent_timers: Vec<Timeout>,
}

impl WebHost {
    pub(crate) fn new() -> Result<Self, HostError> {
        let window = web_sys::window().ok_or(HostError::Unsupported("window"))?;
        let document = window
            .document()
            .ok_or(HostError::Unsupported("document"))?;
        Ok(Self {
            window,
            document,
            handle: Weak::new(),
            listeners: HashMap::new(),
            next_subscription: 0,
            graveyard: Vec::new(),
            timers: HashMap::new(),
            next_timer: 0,
            spent_timers: Vec::new(),
        })
    }

    /// Route listener and timer callbacks to the shared controller.
    pub(crate) fn bind(&mut self, handle: Handle) {
        self.handle = handle;
    }

    /// Free closures unsubscribed during earlier dispatches.
    pub(crate) fn bury_dead_listeners(&mut self) {
        self.graveyard.clear();
        self.spent_timers.clear();
    }

    /// Forget a timer that has fired.
    pub(crate) fn retire_timer(&mut self, timer: u64) {
        if let Some(timeout) = self.timers.remove(&timer) {
            self.spent_timers.push(timeout);
        }
    }

    /// Timers scheduled and not yet fired or cancelled.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    fn event_names(kind: EventKind) -> &'static [&'static str] {
        match kind {
            EventKind::Click => &["click"],
            EventKind::Resize => &["resize"],
            EventKind::FullscreenChange => &["fullscreenchange", "webkitfullscreenchange"],
            EventKind::FullscreenError => &["fullscreenerror", "webkitfullscreenerror"],
        }
    }

    fn webkit_fullscreen_element(&self) -> bool {
        js_sys::Reflect::get(&self.document, &JsValue::from_str("webkitFullscreenElement"))
            .map(|el| !el.is_null() && !el.is_undefined())
            .unwrap_or(false)
    }
}

/// Call a prefixed DOM method (`webkitRequestFullscreen` and friends) if the
/// browser has it.
fn call_prefixed(target: &JsValue, method: &'static str) -> Result<(), HostError> {
    let function = js_sys::Reflect::get(target, &JsValue::from_str(method)).map_err(js_err)?;
    let function = function
        .dyn_ref::<js_sys::Function>()
        .ok_or(HostError::Unsupported(method))?;
    function.call0(target).map(|_| ()).map_err(js_err)
}

fn style_of(element: &Element) -> Option<web_sys::CssStyleDeclaration> {
    if let Some(html) = element.dyn_ref::<HtmlElement>() {
        return Some(html.style());
    }
    element.dyn_ref::<SvgElement>().map(SvgElement::style)
}

impl Host for WebHost {
    type Element = Element;
    type Engine = WebPanZoom;

    fn query_graphics(
        &self,
        root: &Element,
        diagram_selector: &str,
        graphic_selector: &str,
    ) -> Result<Vec<Discovered<Element>>, HostError> {
        let containers = root.query_selector_all(diagram_selector).map_err(js_err)?;
        let mut found = Vec::with_capacity(containers.length() as usize);
        for index in 0..containers.length() {
            let Some(container) = containers
                .item(index)
                .and_then(|node| node.dyn_into::<Element>().ok())
            else {
                continue;
            };
            let graphic = container.query_selector(graphic_selector).map_err(js_err)?;
            found.push(Discovered { container, graphic });
        }
        Ok(found)
    }

    fn computed_position(&self, element: &Element) -> Result<String, HostError> {
        let style = self
            .window
            .get_computed_style(element)
            .map_err(js_err)?
            .ok_or(HostError::Unsupported("getComputedStyle"))?;
        style.get_property_value("position").map_err(js_err)
    }

    fn set_style(&mut self, element: &Element, property: &str, value: &str) -> Result<(), HostError> {
        style_of(element)
            .ok_or(HostError::Unsupported("inline style"))?
            .set_property(property, value)
            .map_err(js_err)
    }

    fn create_element(&mut self, tag: &str) -> Result<Element, HostError> {
        self.document.create_element(tag).map_err(js_err)
    }

    fn create_button(&mut self, label: &str, title: &str) -> Result<Element, HostError> {
        let button = self.document.create_element("button").map_err(js_err)?;
        button.set_attribute("type", "button").map_err(js_err)?;
        button.set_attribute("title", title).map_err(js_err)?;
        button.set_attribute("aria-label", title).map_err(js_err)?;
        button.set_text_content(Some(label));
        Ok(button)
    }

    fn append_child(&mut self, parent: &Element, child: &Element) -> Result<(), HostError> {
        parent.append_child(child).map(|_| ()).map_err(js_err)
    }

    fn remove_child(&mut self, parent: &Element, child: &Element) -> Result<(), HostError> {
        if child.parent_element().as_ref() != Some(parent) {
            return Err(HostError::Detached);
        }
        parent.remove_child(child).map(|_| ()).map_err(js_err)
    }

    fn clone_graphic(&mut self, graphic: &Element) -> Result<Element, HostError> {
        panzoom::clean_copy(graphic)
    }

    fn body(&self) -> Result<Element, HostError> {
        self.document
            .body()
            .map(Element::from)
            .ok_or(HostError::Detached)
    }

    fn create_engine(
        &mut self,
        graphic: &Element,
        options: &PanZoomOptions,
    ) -> Result<WebPanZoom, EngineError> {
        WebPanZoom::attach(graphic, *options)
    }

    fn request_fullscreen(&mut self, element: &Element) -> Result<(), HostError> {
        match element.request_fullscreen() {
            Ok(()) => Ok(()),
            Err(err) => {
                log::debug!("requestFullscreen failed ({err:?}), trying prefixed");
                call_prefixed(element, "webkitRequestFullscreen")
            }
        }
    }

    fn exit_fullscreen(&mut self) -> Result<(), HostError> {
        if self.document.fullscreen_element().is_some() {
            self.document.exit_fullscreen();
            return Ok(());
        }
        call_prefixed(&self.document, "webkitExitFullscreen")
    }

    fn is_fullscreen(&self) -> bool {
        self.document.fullscreen_element().is_some() || self.webkit_fullscreen_element()
    }

    fn subscribe(
        &mut self,
        source: EventSource<'_, Element>,
        kind: EventKind,
        event: ViewportEvent,
    ) -> Result<Subscription, HostError> {
        let target: EventTarget = match source {
            EventSource::Window => self.window.clone().into(),
            EventSource::Document => self.document.clone().into(),
            EventSource::Element(element) => element.clone().into(),
        };
        let handle = self.handle.clone();
        let closure = Closure::<dyn FnMut(Event)>::new(move |_: Event| dispatch(&handle, event));
        let names = Self::event_names(kind);
        for name in names {
            if let Err(err) =
                target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
            {
                for registered in names {
                    if let Err(err) = target.remove_event_listener_with_callback(
                        registered,
                        closure.as_ref().unchecked_ref(),
                    ) {
                        log::debug!("rolling back {registered} listener failed: {err:?}");
                    }
                }
                self.graveyard.push(closure);
                return Err(js_err(err));
            }
        }
        self.next_subscription += 1;
        let subscription = Subscription(self.next_subscription);
        self.listeners.insert(
            subscription.0,
            Listener {
                target,
                names,
                closure,
            },
        );
        Ok(subscription)
    }

    fn unsubscribe(&mut self, subscription: Subscription) -> Result<(), HostError> {
        let listener = self
            .listeners
            .remove(&subscription.0)
            .ok_or(HostError::Detached)?;
        let mut result = Ok(());
        for name in listener.names {
            if let Err(err) = listener
                .target
                .remove_event_listener_with_callback(name, listener.closure.as_ref().unchecked_ref())
            {
                result = Err(js_err(err));
            }
        }
        self.graveyard.push(listener.closure);
        result
    }

    fn schedule(&mut self, delay_ms: u32, event: ViewportEvent) -> Result<(), HostError> {
        let handle = self.handle.clone();
        self.next_timer += 1;
        let timer = self.next_timer;
        let timeout = Timeout::new(delay_ms, move || dispatch_scheduled(&handle, timer, event));
        self.timers.insert(timer, timeout);
        Ok(())
    }

    fn cancel_scheduled(&mut self) {
        self.timers.clear();
    }
}
