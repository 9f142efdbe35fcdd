//! In-memory document host for driving the controller in tests.
//!
//! Elements live in an arena; listeners, timers, and fullscreen state are
//! plain data the tests can inspect and fire by hand.

#![allow(dead_code)]

use dv_controller::{
    Discovered, EngineError, EventKind, EventSource, Host, HostError, InstanceId, PanZoomEngine,
    Subscription, ViewportController, ViewportEvent,
};
use dv_core::{PanZoom, PanZoomOptions, Rect, Size, ViewportState};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

pub type Controller = ViewportController<FakeHost>;

/// Size the fake lays out an inline diagram at.
pub const INLINE_SIZE: Size = Size::new(800.0, 400.0);
/// Size the fake lays out the fullscreen clone at.
pub const SCREEN_SIZE: Size = Size::new(1600.0, 900.0);
/// Intrinsic box of every fake diagram.
pub const VIEW_BOX: Rect = Rect::new(0.0, 0.0, 400.0, 300.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Window,
    Document,
    Node(usize),
}

#[derive(Debug, Clone, Default)]
struct Node {
    tag: String,
    class: Option<String>,
    text: String,
    title: String,
    styles: BTreeMap<String, String>,
    parent: Option<usize>,
    children: Vec<usize>,
}

#[derive(Debug, Clone)]
struct Listener {
    source: Source,
    kind: EventKind,
    event: ViewportEvent,
}

type Layout = Rc<RefCell<HashMap<usize, Size>>>;
type ViewBoxes = Rc<RefCell<HashMap<usize, Rect>>>;

/// `viewBox` attributes, split the way the browser engine leaves them: a
/// bound graphic has its box moved into `stashed` until the engine is
/// destroyed.
#[derive(Default, Clone)]
struct Boxes {
    live: ViewBoxes,
    stashed: ViewBoxes,
}

pub struct FakeEngine {
    node: usize,
    layout: Layout,
    pan_zoom: PanZoom,
    boxes: Boxes,
    destroyed: Rc<RefCell<Vec<usize>>>,
}

impl PanZoomEngine for FakeEngine {
    fn zoom_by(&mut self, factor: f64) -> Result<(), EngineError> {
        Ok(self.pan_zoom.zoom_by(factor)?)
    }

    fn reset_zoom(&mut self) -> Result<(), EngineError> {
        Ok(self.pan_zoom.reset_zoom()?)
    }

    fn fit(&mut self) -> Result<(), EngineError> {
        Ok(self.pan_zoom.fit()?)
    }

    fn center(&mut self) -> Result<(), EngineError> {
        Ok(self.pan_zoom.center()?)
    }

    fn resize(&mut self) -> Result<(), EngineError> {
        let size = self
            .layout
            .borrow()
            .get(&self.node)
            .copied()
            .unwrap_or(Size::ZERO);
        Ok(self.pan_zoom.resize(size)?)
    }

    fn destroy(&mut self) -> Result<(), EngineError> {
        self.pan_zoom.destroy()?;
        if let Some(view_box) = self.boxes.stashed.borrow_mut().remove(&self.node) {
            self.boxes.live.borrow_mut().insert(self.node, view_box);
        }
        self.destroyed.borrow_mut().push(self.node);
        Ok(())
    }

    fn state(&self) -> ViewportState {
        self.pan_zoom.state()
    }
}

pub struct FakeHost {
    nodes: Vec<Node>,
    body: usize,
    layout: Layout,
    boxes: Boxes,
    listeners: BTreeMap<u64, Listener>,
    next_subscription: u64,
    scheduled: Vec<(u32, ViewportEvent)>,
    fullscreen: Option<usize>,
    pub fullscreen_supported: bool,
    /// Accept fullscreen requests but never enter fullscreen, the way a
    /// browser that rejects the request's promise behaves.
    pub fullscreen_refused_later: bool,
    /// Graphics whose engine creation fails.
    pub failing_engines: HashSet<usize>,
    /// Graphic nodes whose engine was destroyed, in order.
    destroyed: Rc<RefCell<Vec<usize>>>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHost {
    pub fn new() -> Self {
        let body = Node {
            tag: "body".to_string(),
            ..Node::default()
        };
        Self {
            nodes: vec![body],
            body: 0,
            layout: Rc::new(RefCell::new(HashMap::new())),
            boxes: Boxes::default(),
            listeners: BTreeMap::new(),
            next_subscription: 0,
            scheduled: Vec::new(),
            fullscreen: None,
            fullscreen_supported: true,
            fullscreen_refused_later: false,
            failing_engines: HashSet::new(),
            destroyed: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn add(&mut self, parent: Option<usize>, tag: &str, class: Option<&str>) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node {
            tag: tag.to_string(),
            class: class.map(str::to_string),
            parent,
            ..Node::default()
        });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(id);
        }
        id
    }

    // ─── Fixtures ────────────────────────────────────────────────────────

    /// `<article class="prose">` under body with `n` rendered diagrams and a
    /// paragraph between each.
    pub fn article_with_diagrams(&mut self, n: usize) -> NodeRef {
        let article = self.add(Some(self.body), "article", Some("prose"));
        for _ in 0..n {
            self.add(Some(article), "p", None);
            let container = self.add(Some(article), "div", Some("mermaid"));
            let svg = self.add(Some(container), "svg", None);
            self.boxes.live.borrow_mut().insert(svg, VIEW_BOX);
            self.layout.borrow_mut().insert(svg, INLINE_SIZE);
        }
        NodeRef(article)
    }

    /// A diagram placeholder the renderer never filled in.
    pub fn add_unrendered_diagram(&mut self, root: NodeRef) -> NodeRef {
        NodeRef(self.add(Some(root.0), "div", Some("mermaid")))
    }

    pub fn remove_from_body(&mut self, node: NodeRef) {
        let body = self.body;
        self.nodes[body].children.retain(|c| *c != node.0);
        self.nodes[node.0].parent = None;
    }

    /// Remove a node behind the controller's back.
    pub fn remove_child_raw(&mut self, parent: NodeRef, child: NodeRef) {
        self.nodes[parent.0].children.retain(|c| *c != child.0);
        self.nodes[child.0].parent = None;
    }

    // ─── Inspection ──────────────────────────────────────────────────────

    pub fn body_node(&self) -> NodeRef {
        NodeRef(self.body)
    }

    pub fn children(&self, node: NodeRef) -> Vec<NodeRef> {
        self.nodes[node.0].children.iter().map(|c| NodeRef(*c)).collect()
    }

    pub fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        self.nodes[node.0].parent.map(NodeRef)
    }

    pub fn tag(&self, node: NodeRef) -> &str {
        &self.nodes[node.0].tag
    }

    pub fn style(&self, node: NodeRef, property: &str) -> Option<&str> {
        self.nodes[node.0].styles.get(property).map(String::as_str)
    }

    pub fn set_style_raw(&mut self, node: NodeRef, property: &str, value: &str) {
        self.nodes[node.0]
            .styles
            .insert(property.to_string(), value.to_string());
    }

    /// Button titled `title` inside `strip`.
    pub fn find_button(&self, strip: NodeRef, title: &str) -> NodeRef {
        self.nodes[strip.0]
            .children
            .iter()
            .copied()
            .find(|c| self.nodes[*c].tag == "button" && self.nodes[*c].title == title)
            .map(NodeRef)
            .unwrap_or_else(|| panic!("no {title:?} button in strip {strip:?}"))
    }

    pub fn button_labels(&self, strip: NodeRef) -> Vec<String> {
        self.nodes[strip.0]
            .children
            .iter()
            .map(|c| self.nodes[*c].text.clone())
            .collect()
    }

    /// Structural dump of a subtree: tags, classes, styles, text.
    pub fn snapshot(&self, node: NodeRef) -> String {
        let n = &self.nodes[node.0];
        let mut out = n.tag.clone();
        if let Some(class) = &n.class {
            out.push('.');
            out.push_str(class);
        }
        if !n.styles.is_empty() {
            let styles: Vec<String> = n.styles.iter().map(|(k, v)| format!("{k}:{v}")).collect();
            out.push_str(&format!("[{}]", styles.join(";")));
        }
        if !n.text.is_empty() {
            out.push_str(&format!("{{{}}}", n.text));
        }
        let children: Vec<String> = n
            .children
            .iter()
            .map(|c| self.snapshot(NodeRef(*c)))
            .collect();
        if !children.is_empty() {
            out.push_str(&format!("({})", children.join(",")));
        }
        out
    }

    /// The `viewBox` currently on `node`, if any.
    pub fn view_box(&self, node: NodeRef) -> Option<Rect> {
        self.boxes.live.borrow().get(&node.0).copied()
    }

    pub fn set_layout(&mut self, node: NodeRef, size: Size) {
        self.layout.borrow_mut().insert(node.0, size);
    }

    pub fn listener_count(&self, source: Source, kind: EventKind) -> usize {
        self.listeners
            .values()
            .filter(|l| l.source == source && l.kind == kind)
            .count()
    }

    pub fn total_listeners(&self) -> usize {
        self.listeners.len()
    }

    /// Events the listeners on `source` would deliver for `kind`.
    pub fn events(&self, source: Source, kind: EventKind) -> Vec<ViewportEvent> {
        self.listeners
            .values()
            .filter(|l| l.source == source && l.kind == kind)
            .map(|l| l.event)
            .collect()
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduled.len()
    }

    pub fn take_scheduled(&mut self) -> Vec<ViewportEvent> {
        self.scheduled.drain(..).map(|(_, event)| event).collect()
    }

    pub fn fullscreen_element(&self) -> Option<NodeRef> {
        self.fullscreen.map(NodeRef)
    }

    /// The browser left fullscreen on its own (Escape key).
    pub fn user_exits_fullscreen(&mut self) {
        self.fullscreen = None;
    }

    pub fn destroyed_engines(&self) -> Vec<NodeRef> {
        self.destroyed.borrow().iter().map(|n| NodeRef(*n)).collect()
    }

    fn source_key(&self, source: EventSource<'_, NodeRef>) -> Source {
        match source {
            EventSource::Window => Source::Window,
            EventSource::Document => Source::Document,
            EventSource::Element(node) => Source::Node(node.0),
        }
    }

    fn descendants(&self, node: usize, out: &mut Vec<usize>) {
        for &child in &self.nodes[node].children {
            out.push(child);
            self.descendants(child, out);
        }
    }

    fn deep_clone(&mut self, node: usize, parent: Option<usize>) -> usize {
        let mut copy = self.nodes[node].clone();
        copy.parent = parent;
        copy.children = Vec::new();
        let id = self.nodes.len();
        self.nodes.push(copy);
        if let Some(parent) = parent {
            self.nodes[parent].children.push(id);
        }
        let children = self.nodes[node].children.clone();
        for child in children {
            self.deep_clone(child, Some(id));
        }
        id
    }
}

impl Host for FakeHost {
    type Element = NodeRef;
    type Engine = FakeEngine;

    fn query_graphics(
        &self,
        root: &NodeRef,
        diagram_selector: &str,
        graphic_selector: &str,
    ) -> Result<Vec<Discovered<NodeRef>>, HostError> {
        // Only the last compound of the selector matters here: `.mermaid`
        let class = diagram_selector
            .rsplit(' ')
            .next()
            .unwrap_or_default()
            .trim_start_matches('.');
        let mut all = Vec::new();
        self.descendants(root.0, &mut all);
        let found = all
            .into_iter()
            .filter(|n| self.nodes[*n].class.as_deref() == Some(class))
            .map(|container| {
                let mut inner = Vec::new();
                self.descendants(container, &mut inner);
                let graphic = inner
                    .into_iter()
                    .find(|n| self.nodes[*n].tag == graphic_selector)
                    .map(NodeRef);
                Discovered {
                    container: NodeRef(container),
                    graphic,
                }
            })
            .collect();
        Ok(found)
    }

    fn computed_position(&self, element: &NodeRef) -> Result<String, HostError> {
        Ok(self
            .style(*element, "position")
            .unwrap_or("static")
            .to_string())
    }

    fn set_style(&mut self, element: &NodeRef, property: &str, value: &str) -> Result<(), HostError> {
        self.set_style_raw(*element, property, value);
        Ok(())
    }

    fn create_element(&mut self, tag: &str) -> Result<NodeRef, HostError> {
        Ok(NodeRef(self.add(None, tag, None)))
    }

    fn create_button(&mut self, label: &str, title: &str) -> Result<NodeRef, HostError> {
        let id = self.add(None, "button", None);
        self.nodes[id].text = label.to_string();
        self.nodes[id].title = title.to_string();
        Ok(NodeRef(id))
    }

    fn append_child(&mut self, parent: &NodeRef, child: &NodeRef) -> Result<(), HostError> {
        if let Some(old) = self.nodes[child.0].parent.take() {
            self.nodes[old].children.retain(|c| *c != child.0);
        }
        self.nodes[child.0].parent = Some(parent.0);
        self.nodes[parent.0].children.push(child.0);
        Ok(())
    }

    fn remove_child(&mut self, parent: &NodeRef, child: &NodeRef) -> Result<(), HostError> {
        if self.nodes[child.0].parent != Some(parent.0) {
            return Err(HostError::Detached);
        }
        self.nodes[parent.0].children.retain(|c| *c != child.0);
        self.nodes[child.0].parent = None;
        Ok(())
    }

    fn clone_graphic(&mut self, graphic: &NodeRef) -> Result<NodeRef, HostError> {
        let clone = self.deep_clone(graphic.0, None);
        // A bound graphic has lost its viewBox; the copy gets the original
        let view_box = self
            .view_box(*graphic)
            .or_else(|| self.boxes.stashed.borrow().get(&graphic.0).copied());
        if let Some(view_box) = view_box {
            self.boxes.live.borrow_mut().insert(clone, view_box);
        }
        self.layout.borrow_mut().insert(clone, SCREEN_SIZE);
        Ok(NodeRef(clone))
    }

    fn body(&self) -> Result<NodeRef, HostError> {
        Ok(NodeRef(self.body))
    }

    fn create_engine(
        &mut self,
        graphic: &NodeRef,
        options: &PanZoomOptions,
    ) -> Result<FakeEngine, EngineError> {
        if self.failing_engines.contains(&graphic.0) {
            return Err(HostError::Js("svg is not measurable".to_string()).into());
        }
        let content = self
            .view_box(*graphic)
            .ok_or_else(|| HostError::Js("graphic has no viewBox".to_string()))?;
        let viewport = self
            .layout
            .borrow()
            .get(&graphic.0)
            .copied()
            .unwrap_or(Size::ZERO);
        let pan_zoom = PanZoom::new(*options, viewport, content)?;
        // The browser engine takes the viewBox off the graphic while bound
        self.boxes.live.borrow_mut().remove(&graphic.0);
        self.boxes.stashed.borrow_mut().insert(graphic.0, content);
        Ok(FakeEngine {
            node: graphic.0,
            layout: Rc::clone(&self.layout),
            pan_zoom,
            boxes: self.boxes.clone(),
            destroyed: Rc::clone(&self.destroyed),
        })
    }

    fn request_fullscreen(&mut self, element: &NodeRef) -> Result<(), HostError> {
        if !self.fullscreen_supported {
            return Err(HostError::Unsupported("fullscreen"));
        }
        if self.fullscreen_refused_later {
            return Ok(());
        }
        self.fullscreen = Some(element.0);
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<(), HostError> {
        match self.fullscreen.take() {
            Some(_) => Ok(()),
            None => Err(HostError::Js("document not in fullscreen".to_string())),
        }
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen.is_some()
    }

    fn subscribe(
        &mut self,
        source: EventSource<'_, NodeRef>,
        kind: EventKind,
        event: ViewportEvent,
    ) -> Result<Subscription, HostError> {
        self.next_subscription += 1;
        let source = self.source_key(source);
        self.listeners.insert(
            self.next_subscription,
            Listener {
                source,
                kind,
                event,
            },
        );
        Ok(Subscription(self.next_subscription))
    }

    fn unsubscribe(&mut self, subscription: Subscription) -> Result<(), HostError> {
        self.listeners
            .remove(&subscription.0)
            .map(|_| ())
            .ok_or(HostError::Detached)
    }

    fn schedule(&mut self, delay_ms: u32, event: ViewportEvent) -> Result<(), HostError> {
        self.scheduled.push((delay_ms, event));
        Ok(())
    }

    fn cancel_scheduled(&mut self) {
        self.scheduled.clear();
    }
}

// ─── Drivers ─────────────────────────────────────────────────────────────

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Fire `kind` on `source`, delivering whatever the listeners registered.
pub fn dispatch(controller: &mut Controller, host: &mut FakeHost, source: Source, kind: EventKind) {
    for event in host.events(source, kind) {
        controller.handle_event(host, event);
    }
}

pub fn click(controller: &mut Controller, host: &mut FakeHost, button: NodeRef) {
    dispatch(controller, host, Source::Node(button.0), EventKind::Click);
}

/// Click the inline control titled `title` on diagram `id`.
pub fn click_control(controller: &mut Controller, host: &mut FakeHost, id: InstanceId, title: &str) {
    let strip = controller.instance(id).expect("diagram attached").controls;
    let button = host.find_button(strip, title);
    click(controller, host, button);
}

/// Click the overlay control titled `title`.
pub fn click_overlay(controller: &mut Controller, host: &mut FakeHost, title: &str) {
    let overlay = *controller.session().expect("overlay open").overlay();
    let wrap = host.children(overlay)[0];
    let strip = *host
        .children(wrap)
        .iter()
        .find(|n| host.tag(**n) == "div")
        .expect("overlay strip");
    let button = host.find_button(strip, title);
    click(controller, host, button);
}

pub fn resize_window(controller: &mut Controller, host: &mut FakeHost) {
    dispatch(controller, host, Source::Window, EventKind::Resize);
}

pub fn run_timers(controller: &mut Controller, host: &mut FakeHost) {
    for event in host.take_scheduled() {
        controller.handle_event(host, event);
    }
}

pub fn graphic_of(controller: &Controller, id: InstanceId) -> NodeRef {
    controller.instance(id).expect("diagram attached").graphic
}
