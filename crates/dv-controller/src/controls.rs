//! Control strips: the small button rows overlaid on each diagram.
//!
//! | Strip   | Buttons (left → right)                | Placement          |
//! |---------|---------------------------------------|--------------------|
//! | Inline  | zoom out, zoom in, reset, fullscreen  | top-right, 8px     |
//! | Overlay | zoom out, zoom in, reset, close       | top-right, 16px    |

use crate::error::HostError;
use crate::event::{ControlTarget, EventKind, EventSource, Subscription, ViewportEvent};
use crate::host::{Host, release, set_styles};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    ZoomIn,
    ZoomOut,
    Reset,
    Fullscreen,
    Close,
}

impl ControlAction {
    pub fn label(&self) -> &'static str {
        match self {
            ControlAction::ZoomIn => "+",
            ControlAction::ZoomOut => "-",
            ControlAction::Reset => "⟳",
            ControlAction::Fullscreen => "⛶",
            ControlAction::Close => "✕",
        }
    }

    pub fn title(&self, kind: StripKind) -> &'static str {
        match (self, kind) {
            (ControlAction::ZoomIn, _) => "Zoom in",
            (ControlAction::ZoomOut, _) => "Zoom out",
            (ControlAction::Reset, StripKind::Inline) => "Reset view",
            (ControlAction::Reset, StripKind::Overlay) => "Reset",
            (ControlAction::Fullscreen, _) => "Fullscreen",
            (ControlAction::Close, _) => "Close",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StripKind {
    Inline,
    Overlay,
}

const INLINE_ACTIONS: [ControlAction; 4] = [
    ControlAction::ZoomOut,
    ControlAction::ZoomIn,
    ControlAction::Reset,
    ControlAction::Fullscreen,
];

const OVERLAY_ACTIONS: [ControlAction; 4] = [
    ControlAction::ZoomOut,
    ControlAction::ZoomIn,
    ControlAction::Reset,
    ControlAction::Close,
];

const INLINE_STRIP_STYLE: &[(&str, &str)] = &[
    ("position", "absolute"),
    ("top", "8px"),
    ("right", "8px"),
    ("display", "flex"),
    ("gap", "6px"),
    ("z-index", "10"),
    ("background", "rgba(255,255,255,0.8)"),
    ("border-radius", "8px"),
    ("padding", "4px"),
    ("box-shadow", "0 1px 6px rgba(0,0,0,0.12)"),
];

const OVERLAY_STRIP_STYLE: &[(&str, &str)] = &[
    ("position", "absolute"),
    ("top", "16px"),
    ("right", "16px"),
    ("display", "flex"),
    ("gap", "8px"),
    ("z-index", "10000"),
    ("background", "rgba(255,255,255,0.9)"),
    ("border-radius", "10px"),
    ("padding", "6px"),
    ("box-shadow", "0 2px 10px rgba(0,0,0,0.25)"),
];

const INLINE_BUTTON_STYLE: &[(&str, &str)] = &[
    ("padding", "4px 8px"),
    ("line-height", "1"),
    ("font-size", "12px"),
    ("border", "1px solid rgba(0,0,0,0.1)"),
    ("border-radius", "6px"),
    ("background", "white"),
    ("cursor", "pointer"),
    ("color", "rgb(31 41 55)"),
];

const OVERLAY_BUTTON_STYLE: &[(&str, &str)] = &[
    ("padding", "6px 10px"),
    ("line-height", "1"),
    ("font-size", "13px"),
    ("border", "1px solid rgba(0,0,0,0.1)"),
    ("border-radius", "8px"),
    ("background", "white"),
    ("cursor", "pointer"),
    ("color", "rgb(31 41 55)"),
];

impl StripKind {
    pub fn actions(&self) -> &'static [ControlAction] {
        match self {
            StripKind::Inline => &INLINE_ACTIONS,
            StripKind::Overlay => &OVERLAY_ACTIONS,
        }
    }

    fn strip_style(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            StripKind::Inline => INLINE_STRIP_STYLE,
            StripKind::Overlay => OVERLAY_STRIP_STYLE,
        }
    }

    fn button_style(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            StripKind::Inline => INLINE_BUTTON_STYLE,
            StripKind::Overlay => OVERLAY_BUTTON_STYLE,
        }
    }
}

/// A built (but not yet wired) control strip.
#[derive(Debug, Clone)]
pub struct ControlStrip<E> {
    pub kind: StripKind,
    pub root: E,
    pub buttons: Vec<(ControlAction, E)>,
}

impl<E> ControlStrip<E> {
    pub fn button(&self, action: ControlAction) -> Option<&E> {
        self.buttons
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, el)| el)
    }
}

/// Create the strip element and its buttons. The caller inserts `root`.
pub fn build_strip<H: Host + ?Sized>(
    host: &mut H,
    kind: StripKind,
) -> Result<ControlStrip<H::Element>, HostError> {
    let root = host.create_element("div")?;
    set_styles(host, &root, kind.strip_style())?;

    let mut buttons = Vec::with_capacity(kind.actions().len());
    for &action in kind.actions() {
        let button = host.create_button(action.label(), action.title(kind))?;
        set_styles(host, &button, kind.button_style())?;
        host.append_child(&root, &button)?;
        buttons.push((action, button));
    }

    Ok(ControlStrip {
        kind,
        root,
        buttons,
    })
}

/// Subscribe every button's click to a `Control` event for `target`.
/// On failure, listeners registered so far are released.
pub fn wire_strip<H: Host + ?Sized>(
    host: &mut H,
    strip: &ControlStrip<H::Element>,
    target: ControlTarget,
) -> Result<Vec<Subscription>, HostError> {
    let mut subscriptions = Vec::with_capacity(strip.buttons.len());
    for (action, button) in &strip.buttons {
        let event = ViewportEvent::Control {
            target,
            action: *action,
        };
        match host.subscribe(EventSource::Element(button), EventKind::Click, event) {
            Ok(sub) => subscriptions.push(sub),
            Err(err) => {
                release(host, subscriptions);
                return Err(err);
            }
        }
    }
    Ok(subscriptions)
}
