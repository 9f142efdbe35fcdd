//! Configuration for the viewport controller, its pan/zoom engines, and the
//! external diagram renderer.
//!
//! Every struct deserializes from camelCase JSON with all fields optional,
//! so the browser side can override a single knob:
//!
//! ```json
//! { "settleDelayMs": 120, "overlay": { "maxZoom": 40 } }
//! ```

use crate::error::ViewportError;
use serde::{Deserialize, Serialize};

/// Options for one pan/zoom engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PanZoomOptions {
    /// Mouse-wheel zoom. Programmatic zoom is always available.
    pub zoom_enabled: bool,
    /// Engine-provided icon controls. The controller draws its own strip.
    pub control_icons_enabled: bool,
    /// Fit content to the viewport on creation.
    pub fit: bool,
    /// Center content in the viewport on creation.
    pub center: bool,
    /// Lower bound on relative zoom (1.0 = fit scale).
    pub min_zoom: f64,
    /// Upper bound on relative zoom.
    pub max_zoom: f64,
    /// Wheel zoom step: one notch zooms by `1 + sensitivity`.
    pub zoom_scale_sensitivity: f64,
    /// Clamp panning so content cannot leave the viewport.
    pub contain: bool,
}

impl Default for PanZoomOptions {
    fn default() -> Self {
        Self::inline()
    }
}

impl PanZoomOptions {
    /// Options for diagrams embedded in the page.
    pub const fn inline() -> Self {
        Self {
            zoom_enabled: true,
            control_icons_enabled: false,
            fit: true,
            center: true,
            min_zoom: 0.2,
            max_zoom: 10.0,
            zoom_scale_sensitivity: 0.2,
            contain: false,
        }
    }

    /// Options for the fullscreen overlay clone.
    pub const fn overlay() -> Self {
        Self {
            min_zoom: 0.1,
            max_zoom: 20.0,
            ..Self::inline()
        }
    }

    pub fn validate(&self) -> Result<(), ViewportError> {
        if !(self.min_zoom.is_finite() && self.min_zoom > 0.0) {
            return Err(ViewportError::InvalidConfig(format!(
                "minZoom must be positive, got {}",
                self.min_zoom
            )));
        }
        if !(self.max_zoom.is_finite() && self.max_zoom >= self.min_zoom) {
            return Err(ViewportError::InvalidConfig(format!(
                "maxZoom must be >= minZoom ({}), got {}",
                self.min_zoom, self.max_zoom
            )));
        }
        if !(self.zoom_scale_sensitivity.is_finite() && self.zoom_scale_sensitivity > 0.0) {
            return Err(ViewportError::InvalidConfig(format!(
                "zoomScaleSensitivity must be positive, got {}",
                self.zoom_scale_sensitivity
            )));
        }
        Ok(())
    }
}

/// Controller-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControllerConfig {
    /// Selector for diagram containers inside the content root.
    pub diagram_selector: String,
    /// Selector for the rendered graphic inside a container.
    pub graphic_selector: String,
    /// Factor applied by the zoom-in button (zoom-out uses its inverse).
    pub zoom_step: f64,
    /// Delay before re-fitting the page diagram after a fullscreen transition.
    pub settle_delay_ms: u32,
    pub inline: PanZoomOptions,
    pub overlay: PanZoomOptions,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            diagram_selector: ".prose .mermaid".to_string(),
            graphic_selector: "svg".to_string(),
            zoom_step: 1.2,
            settle_delay_ms: 60,
            inline: PanZoomOptions::inline(),
            overlay: PanZoomOptions::overlay(),
        }
    }
}

impl ControllerConfig {
    /// Parse a JSON override on top of the defaults, then validate it.
    pub fn from_json(json: &str) -> Result<Self, ViewportError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ViewportError> {
        if self.diagram_selector.trim().is_empty() || self.graphic_selector.trim().is_empty() {
            return Err(ViewportError::InvalidConfig(
                "selectors must not be empty".to_string(),
            ));
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 1.0) {
            return Err(ViewportError::InvalidConfig(format!(
                "zoomStep must be greater than 1, got {}",
                self.zoom_step
            )));
        }
        self.inline.validate()?;
        self.overlay.validate()
    }
}

/// Settings handed to the diagram renderer's `initialize` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RendererConfig {
    /// Rendering is triggered explicitly once content is in the document.
    pub start_on_load: bool,
    pub security_level: String,
    pub theme: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            start_on_load: false,
            security_level: "loose".to_string(),
            theme: "default".to_string(),
        }
    }
}

impl RendererConfig {
    pub fn to_json(&self) -> Result<String, ViewportError> {
        Ok(serde_json::to_string(self)?)
    }
}
