//! SVG pan/zoom engine on top of `dv_core::PanZoom`.
//!
//! The SVG's children are moved into a viewport `<g>` whose `transform`
//! carries the pan/zoom matrix. The `viewBox` becomes the content box and is
//! removed so user units are screen pixels. `destroy` puts everything back.

use dv_controller::{EngineError, HostError, PanZoomEngine};
use dv_core::{PanZoom, PanZoomOptions, Point, Rect, Size, Vec2, ViewportState};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{AddEventListenerOptions, Element, Event, MouseEvent, WheelEvent};

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const VIEWPORT_CLASS: &str = "dv-viewport";
// The pre-bind attributes, kept on the SVG so a deep copy can be cleaned
const VIEW_BOX_STASH: &str = "data-dv-view-box";
const STYLE_STASH: &str = "data-dv-style";

type Listener = (&'static str, Closure<dyn FnMut(Event)>);

struct Inner {
    svg: Element,
    viewport: Element,
    original_view_box: Option<String>,
    original_style: Option<String>,
    state: RefCell<PanZoom>,
    drag_from: Cell<Option<Point>>,
    listeners: RefCell<Vec<Listener>>,
}

pub struct WebPanZoom {
    inner: Rc<Inner>,
}

/// Parse an SVG `viewBox` (`"min-x min-y width height"`, space or comma
/// separated).
pub fn parse_view_box(value: &str) -> Option<Rect> {
    let numbers: Vec<f64> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match numbers.as_slice() {
        [x, y, w, h] if *w > 0.0 && *h > 0.0 => Some(Rect::new(*x, *y, x + w, y + h)),
        _ => None,
    }
}

fn js_err(value: wasm_bindgen::JsValue) -> HostError {
    HostError::Js(format!("{value:?}"))
}

fn measure(element: &Element) -> Size {
    let rect = element.get_bounding_client_rect();
    Size::new(rect.width(), rect.height())
}

impl WebPanZoom {
    /// Bind to a rendered SVG. Everything that can fail before the SVG is
    /// rewritten runs first; a failure after that point restores the SVG,
    /// so a diagram that cannot be bound is left exactly as it was.
    pub fn attach(svg: &Element, options: PanZoomOptions) -> Result<Self, EngineError> {
        let original_view_box = svg.get_attribute("viewBox");
        let original_style = svg.get_attribute("style");
        let rendered = measure(svg);
        let content = original_view_box
            .as_deref()
            .and_then(parse_view_box)
            .unwrap_or_else(|| Rect::from_origin_size(Point::ZERO, rendered));
        let state = PanZoom::new(options, rendered, content)?;

        let document = svg
            .owner_document()
            .ok_or(EngineError::Host(HostError::Detached))?;
        let viewport = document
            .create_element_ns(Some(SVG_NS), "g")
            .map_err(js_err)?;
        viewport.set_attribute("class", VIEWPORT_CLASS).map_err(js_err)?;

        let engine = Self {
            inner: Rc::new(Inner {
                svg: svg.clone(),
                viewport,
                original_view_box,
                original_style,
                state: RefCell::new(state),
                drag_from: Cell::new(None),
                listeners: RefCell::new(Vec::new()),
            }),
        };
        let bound = engine
            .inner
            .rewrite(rendered)
            .map_err(EngineError::from)
            .and_then(|()| engine.wire_gestures());
        if let Err(err) = bound {
            if let Err(restore) = engine.inner.restore() {
                log::debug!("restoring unbound svg failed: {restore}");
            }
            return Err(err);
        }
        engine.inner.apply();
        Ok(engine)
    }

    fn wire_gestures(&self) -> Result<(), EngineError> {
        let weak = Rc::downgrade(&self.inner);
        self.listen("wheel", &weak, |inner, event| {
            let Some(wheel) = event.dyn_ref::<WheelEvent>() else {
                return;
            };
            let point = inner.local_point(wheel);
            match inner.state.borrow_mut().wheel_zoom(wheel.delta_y(), point) {
                Ok(true) => event.prevent_default(),
                Ok(false) => return,
                Err(err) => {
                    log::debug!("wheel zoom failed: {err}");
                    return;
                }
            }
            inner.apply();
        })?;
        self.listen("pointerdown", &weak, |inner, event| {
            if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
                inner.drag_from.set(Some(inner.local_point(mouse)));
            }
        })?;
        self.listen("pointermove", &weak, |inner, event| {
            let (Some(from), Some(mouse)) = (inner.drag_from.get(), event.dyn_ref::<MouseEvent>())
            else {
                return;
            };
            let to = inner.local_point(mouse);
            if let Err(err) = inner.state.borrow_mut().pan_by(to - from) {
                log::debug!("pan failed: {err}");
                return;
            }
            inner.drag_from.set(Some(to));
            inner.apply();
        })?;
        for end in ["pointerup", "pointerleave"] {
            self.listen(end, &weak, |inner, _| inner.drag_from.set(None))?;
        }
        Ok(())
    }

    fn listen(
        &self,
        kind: &'static str,
        weak: &Weak<Inner>,
        handler: impl Fn(&Inner, &Event) + 'static,
    ) -> Result<(), EngineError> {
        let weak = weak.clone();
        let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if let Some(inner) = weak.upgrade() {
                handler(&inner, &event);
            }
        });
        let options = AddEventListenerOptions::new();
        options.set_passive(false);
        self.inner
            .svg
            .add_event_listener_with_callback_and_add_event_listener_options(
                kind,
                closure.as_ref().unchecked_ref(),
                &options,
            )
            .map_err(js_err)?;
        self.inner.listeners.borrow_mut().push((kind, closure));
        Ok(())
    }

    fn update(
        &self,
        op: impl FnOnce(&mut PanZoom) -> Result<(), dv_core::ViewportError>,
    ) -> Result<(), EngineError> {
        op(&mut self.inner.state.borrow_mut())?;
        self.inner.apply();
        Ok(())
    }
}

impl Inner {
    fn local_point(&self, event: &MouseEvent) -> Point {
        let rect = self.svg.get_bounding_client_rect();
        Point::new(
            f64::from(event.client_x()) - rect.left(),
            f64::from(event.client_y()) - rect.top(),
        )
    }

    fn apply(&self) {
        let [a, b, c, d, e, f] = self.state.borrow().transform().as_coeffs();
        let matrix = format!("matrix({a},{b},{c},{d},{e},{f})");
        if let Err(err) = self.viewport.set_attribute("transform", &matrix) {
            log::debug!("viewport transform failed: {err:?}");
        }
    }

    /// Wrap the children in the viewport group and trade the `viewBox` for
    /// a pinned height.
    fn rewrite(&self, rendered: Size) -> Result<(), HostError> {
        let svg = &self.svg;
        if let Some(view_box) = &self.original_view_box {
            svg.set_attribute(VIEW_BOX_STASH, view_box).map_err(js_err)?;
        }
        if let Some(style) = &self.original_style {
            svg.set_attribute(STYLE_STASH, style).map_err(js_err)?;
        }
        while let Some(child) = svg.first_child() {
            self.viewport.append_child(&child).map_err(js_err)?;
        }
        svg.append_child(&self.viewport).map_err(js_err)?;

        // Without a viewBox the SVG would collapse to its default height
        if self.original_view_box.is_some() {
            svg.remove_attribute("viewBox").map_err(js_err)?;
            if svg.get_attribute("height").is_none() && rendered.height > 0.0 {
                let style = self.original_style.clone().unwrap_or_default();
                svg.set_attribute("style", &format!("{style};height:{}px", rendered.height))
                    .map_err(js_err)?;
            }
        }
        Ok(())
    }

    /// Undo `rewrite` and drop the gesture listeners. Works on a partial
    /// rewrite too.
    fn restore(&self) -> Result<(), HostError> {
        for (kind, closure) in self.listeners.borrow_mut().drain(..) {
            if let Err(err) = self
                .svg
                .remove_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())
            {
                log::debug!("removing {kind} listener failed: {err:?}");
            }
        }
        unwrap_viewport(&self.svg, &self.viewport)?;
        restore_attribute(&self.svg, "viewBox", self.original_view_box.as_deref())?;
        restore_attribute(&self.svg, "style", self.original_style.as_deref())?;
        self.svg.remove_attribute(VIEW_BOX_STASH).map_err(js_err)?;
        self.svg.remove_attribute(STYLE_STASH).map_err(js_err)
    }
}

/// Move the group's children back where they came from and drop the group.
fn unwrap_viewport(svg: &Element, viewport: &Element) -> Result<(), HostError> {
    if viewport.parent_element().as_ref() == Some(svg) {
        while let Some(child) = viewport.first_child() {
            svg.insert_before(&child, Some(viewport)).map_err(js_err)?;
        }
    } else {
        // Interrupted wrap: the moved children were the leading ones
        while let Some(child) = viewport.last_child() {
            svg.insert_before(&child, svg.first_child().as_ref())
                .map_err(js_err)?;
        }
    }
    viewport.remove();
    Ok(())
}

fn restore_attribute(element: &Element, name: &str, value: Option<&str>) -> Result<(), HostError> {
    match value {
        Some(value) => element.set_attribute(name, value).map_err(js_err),
        None => element.remove_attribute(name).map_err(js_err),
    }
}

/// Deep copy of `svg` as the renderer produced it.
///
/// When `svg` is bound to an engine the copy loses the viewport group, the
/// pinned height and the stash, and gets the original `viewBox` back. An
/// unbound SVG is copied as is.
pub fn clean_copy(svg: &Element) -> Result<Element, HostError> {
    let copy = svg
        .clone_node_with_deep(true)
        .map_err(js_err)?
        .dyn_into::<Element>()
        .map_err(|_| HostError::Unsupported("copy of a non-element"))?;
    let selector = format!(":scope > g.{VIEWPORT_CLASS}");
    let Some(viewport) = copy.query_selector(&selector).map_err(js_err)? else {
        return Ok(copy);
    };
    unwrap_viewport(&copy, &viewport)?;
    let view_box = copy.get_attribute(VIEW_BOX_STASH);
    let style = copy.get_attribute(STYLE_STASH);
    restore_attribute(&copy, "viewBox", view_box.as_deref())?;
    restore_attribute(&copy, "style", style.as_deref())?;
    copy.remove_attribute(VIEW_BOX_STASH).map_err(js_err)?;
    copy.remove_attribute(STYLE_STASH).map_err(js_err)?;
    Ok(copy)
}

impl PanZoomEngine for WebPanZoom {
    fn zoom_by(&mut self, factor: f64) -> Result<(), EngineError> {
        self.update(|s| s.zoom_by(factor))
    }

    fn reset_zoom(&mut self) -> Result<(), EngineError> {
        self.update(PanZoom::reset_zoom)
    }

    fn fit(&mut self) -> Result<(), EngineError> {
        self.update(PanZoom::fit)
    }

    fn center(&mut self) -> Result<(), EngineError> {
        self.update(PanZoom::center)
    }

    fn resize(&mut self) -> Result<(), EngineError> {
        let size = measure(&self.inner.svg);
        self.update(|s| s.resize(size))
    }

    fn destroy(&mut self) -> Result<(), EngineError> {
        self.inner.state.borrow_mut().destroy()?;
        self.inner.restore()?;
        Ok(())
    }

    fn state(&self) -> ViewportState {
        self.inner.state.borrow().state()
    }
}

impl WebPanZoom {
    /// Nudge the view by a screen-space offset.
    pub fn pan_by(&mut self, delta: Vec2) -> Result<(), EngineError> {
        self.update(|s| s.pan_by(delta))
    }
}
