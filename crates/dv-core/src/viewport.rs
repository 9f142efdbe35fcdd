//! Pan/zoom viewport math.
//!
//! A `PanZoom` maps a graphic's intrinsic content box onto its on-screen
//! viewport with a uniform scale and a translation:
//!
//! ```text
//! screen = pan + (p - content.origin) * base_scale * zoom
//! ```
//!
//! `base_scale` is the fit scale computed by the last `fit()`, and `zoom` is
//! relative to it, so `zoom == 1.0` always means "fitted". Zoom bounds apply
//! to the relative zoom.

use crate::config::PanZoomOptions;
use crate::error::ViewportError;
use kurbo::{Affine, Point, Rect, Size, Vec2};

const EPSILON: f64 = 1e-6;

/// Snapshot of one engine's viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    /// Relative zoom (1.0 = fit scale).
    pub zoom: f64,
    /// Absolute scale from content units to screen pixels.
    pub scale: f64,
    /// Screen position of the content box's top-left corner.
    pub pan: Point,
    /// Content is scaled exactly to the viewport bounds.
    pub fitted: bool,
    /// Content midpoint sits on the viewport midpoint.
    pub centered: bool,
}

impl ViewportState {
    pub fn is_settled(&self) -> bool {
        self.fitted && self.centered
    }
}

#[derive(Debug, Clone)]
pub struct PanZoom {
    options: PanZoomOptions,
    viewport: Size,
    content: Rect,
    base_scale: f64,
    zoom: f64,
    pan: Point,
    destroyed: bool,
}

fn is_degenerate(size: Size) -> bool {
    !(size.width.is_finite() && size.height.is_finite() && size.width > 0.0 && size.height > 0.0)
}

impl PanZoom {
    /// Create an engine for `content` shown in `viewport`.
    ///
    /// Only an empty content box is fatal. If the viewport has no area yet,
    /// the initial fit/center is skipped and the engine stays usable; a later
    /// `resize` + `fit` + `center` pass settles it.
    pub fn new(
        options: PanZoomOptions,
        viewport: Size,
        content: Rect,
    ) -> Result<Self, ViewportError> {
        if is_degenerate(content.size()) {
            return Err(ViewportError::EmptyContent);
        }
        let mut engine = Self {
            options,
            viewport,
            content,
            base_scale: 1.0,
            zoom: 1.0,
            pan: Point::ZERO,
            destroyed: false,
        };
        if options.fit
            && let Err(err) = engine.fit()
        {
            log::debug!("initial fit skipped: {err}");
        }
        if options.center
            && let Err(err) = engine.center()
        {
            log::debug!("initial center skipped: {err}");
        }
        Ok(engine)
    }

    pub fn options(&self) -> &PanZoomOptions {
        &self.options
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn content(&self) -> Rect {
        self.content
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn scale(&self) -> f64 {
        self.base_scale * self.zoom
    }

    pub fn pan(&self) -> Point {
        self.pan
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// The scale `fit()` would choose for the current viewport.
    fn fit_scale(&self) -> Option<f64> {
        if is_degenerate(self.viewport) {
            return None;
        }
        let content = self.content.size();
        Some((self.viewport.width / content.width).min(self.viewport.height / content.height))
    }

    /// The pan `center()` would choose at the current scale.
    fn centered_pan(&self) -> Point {
        let scaled = self.content.size() * self.scale();
        Point::new(
            (self.viewport.width - scaled.width) / 2.0,
            (self.viewport.height - scaled.height) / 2.0,
        )
    }

    pub fn is_fitted(&self) -> bool {
        match self.fit_scale() {
            Some(fit) => (self.scale() - fit).abs() <= EPSILON * fit.max(1.0),
            None => false,
        }
    }

    pub fn is_centered(&self) -> bool {
        !is_degenerate(self.viewport) && (self.pan - self.centered_pan()).hypot() <= EPSILON * 1e3
    }

    pub fn state(&self) -> ViewportState {
        ViewportState {
            zoom: self.zoom,
            scale: self.scale(),
            pan: self.pan,
            fitted: self.is_fitted(),
            centered: self.is_centered(),
        }
    }

    /// Content-to-screen transform, suitable for an SVG `matrix(...)`.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.pan.to_vec2())
            * Affine::scale(self.scale())
            * Affine::translate(-self.content.origin().to_vec2())
    }

    fn ensure_live(&self) -> Result<(), ViewportError> {
        if self.destroyed {
            Err(ViewportError::Destroyed)
        } else {
            Ok(())
        }
    }

    /// Record a new viewport size. Does not refit; callers follow up with
    /// `fit` + `center` when they want the settled view back.
    pub fn resize(&mut self, viewport: Size) -> Result<(), ViewportError> {
        self.ensure_live()?;
        self.viewport = viewport;
        Ok(())
    }

    /// Scale content to fill the viewport bounds without clipping.
    /// Resets the relative zoom to 1.0.
    pub fn fit(&mut self) -> Result<(), ViewportError> {
        self.ensure_live()?;
        let fit = self.fit_scale().ok_or(ViewportError::EmptyViewport)?;
        self.base_scale = fit;
        self.zoom = 1.0;
        Ok(())
    }

    /// Translate content so its midpoint lands on the viewport midpoint.
    pub fn center(&mut self) -> Result<(), ViewportError> {
        self.ensure_live()?;
        if is_degenerate(self.viewport) {
            return Err(ViewportError::EmptyViewport);
        }
        self.pan = self.centered_pan();
        Ok(())
    }

    /// Zoom around the viewport midpoint.
    pub fn zoom_by(&mut self, factor: f64) -> Result<(), ViewportError> {
        let midpoint = Point::new(self.viewport.width / 2.0, self.viewport.height / 2.0);
        self.zoom_at(factor, midpoint)
    }

    /// Zoom around a screen point, clamping the relative zoom to the
    /// configured bounds. Non-positive or non-finite factors are ignored.
    pub fn zoom_at(&mut self, factor: f64, point: Point) -> Result<(), ViewportError> {
        self.ensure_live()?;
        if !(factor.is_finite() && factor > 0.0) {
            log::debug!("ignoring zoom factor {factor}");
            return Ok(());
        }
        let target = (self.zoom * factor).clamp(self.options.min_zoom, self.options.max_zoom);
        let effective = target / self.zoom;
        self.pan = point - (point - self.pan) * effective;
        self.zoom = target;
        self.apply_containment();
        Ok(())
    }

    /// Mouse-wheel zoom. Returns `false` when wheel zoom is disabled.
    pub fn wheel_zoom(&mut self, delta_y: f64, point: Point) -> Result<bool, ViewportError> {
        self.ensure_live()?;
        if !self.options.zoom_enabled || delta_y == 0.0 {
            return Ok(false);
        }
        let step = 1.0 + self.options.zoom_scale_sensitivity;
        let factor = if delta_y < 0.0 { step } else { 1.0 / step };
        self.zoom_at(factor, point)?;
        Ok(true)
    }

    pub fn pan_by(&mut self, delta: Vec2) -> Result<(), ViewportError> {
        self.ensure_live()?;
        self.pan += delta;
        self.apply_containment();
        Ok(())
    }

    /// Return to the default relative zoom around the viewport midpoint.
    pub fn reset_zoom(&mut self) -> Result<(), ViewportError> {
        self.ensure_live()?;
        let factor = 1.0 / self.zoom;
        self.zoom_by(factor)
    }

    pub fn destroy(&mut self) -> Result<(), ViewportError> {
        self.ensure_live()?;
        self.destroyed = true;
        Ok(())
    }

    fn apply_containment(&mut self) {
        if !self.options.contain || is_degenerate(self.viewport) {
            return;
        }
        let scaled = self.content.size() * self.scale();
        let slack_x = self.viewport.width - scaled.width;
        let slack_y = self.viewport.height - scaled.height;
        self.pan.x = self.pan.x.clamp(slack_x.min(0.0), slack_x.max(0.0));
        self.pan.y = self.pan.y.clamp(slack_y.min(0.0), slack_y.max(0.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(viewport: Size) -> PanZoom {
        PanZoom::new(
            PanZoomOptions::inline(),
            viewport,
            Rect::new(0.0, 0.0, 400.0, 200.0),
        )
        .unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn new_engine_is_fitted_and_centered() {
        let pz = engine(Size::new(800.0, 600.0));
        let state = pz.state();
        // Width-bound: 800 / 400 = 2
        assert!(approx(state.scale, 2.0));
        assert!(approx(state.zoom, 1.0));
        // Scaled content is 800x400, centered vertically in 600
        assert!(approx(state.pan.x, 0.0));
        assert!(approx(state.pan.y, 100.0));
        assert!(state.is_settled());
    }

    #[test]
    fn transform_maps_content_midpoint_to_viewport_midpoint() {
        let pz = PanZoom::new(
            PanZoomOptions::inline(),
            Size::new(500.0, 500.0),
            Rect::new(-50.0, 10.0, 150.0, 110.0),
        )
        .unwrap();
        let mid = pz.transform() * Point::new(50.0, 60.0);
        assert!(approx(mid.x, 250.0), "x = {}", mid.x);
        assert!(approx(mid.y, 250.0), "y = {}", mid.y);
    }

    #[test]
    fn zoom_round_trip_restores_state() {
        let mut pz = engine(Size::new(800.0, 600.0));
        let before = pz.state();
        pz.zoom_by(1.2).unwrap();
        assert!(!pz.state().fitted);
        pz.zoom_by(1.0 / 1.2).unwrap();
        let after = pz.state();
        assert!(approx(before.zoom, after.zoom));
        assert!((before.pan - after.pan).hypot() < 1e-9);
    }

    #[test]
    fn zoom_by_keeps_viewport_midpoint_fixed() {
        let mut pz = engine(Size::new(800.0, 600.0));
        let mid = Point::new(400.0, 300.0);
        let content_at_mid = pz.transform().inverse() * mid;
        pz.zoom_by(1.2).unwrap();
        let after = pz.transform() * content_at_mid;
        assert!((after - mid).hypot() < 1e-9);
    }

    #[test]
    fn zoom_is_clamped_to_bounds() {
        let mut pz = engine(Size::new(800.0, 600.0));
        for _ in 0..50 {
            pz.zoom_by(1.2).unwrap();
        }
        assert!(approx(pz.zoom(), 10.0));
        for _ in 0..100 {
            pz.zoom_by(1.0 / 1.2).unwrap();
        }
        assert!(approx(pz.zoom(), 0.2));
    }

    #[test]
    fn reset_then_fit_center_settles_after_interaction() {
        let mut pz = engine(Size::new(800.0, 600.0));
        pz.zoom_by(1.2).unwrap();
        pz.pan_by(Vec2::new(-37.0, 52.0)).unwrap();
        assert!(!pz.state().centered);
        pz.reset_zoom().unwrap();
        pz.fit().unwrap();
        pz.center().unwrap();
        assert!(pz.state().is_settled());
    }

    #[test]
    fn resize_unsettles_until_refit() {
        let mut pz = engine(Size::new(800.0, 600.0));
        pz.resize(Size::new(300.0, 900.0)).unwrap();
        assert!(!pz.state().fitted);
        pz.fit().unwrap();
        pz.center().unwrap();
        let state = pz.state();
        assert!(state.is_settled());
        assert!(approx(state.scale, 0.75));
    }

    #[test]
    fn empty_viewport_defers_fit() {
        let mut pz = engine(Size::ZERO);
        assert!(!pz.state().fitted);
        assert!(matches!(pz.fit(), Err(ViewportError::EmptyViewport)));
        assert!(matches!(pz.center(), Err(ViewportError::EmptyViewport)));
        pz.resize(Size::new(400.0, 200.0)).unwrap();
        pz.fit().unwrap();
        pz.center().unwrap();
        assert!(pz.state().is_settled());
    }

    #[test]
    fn empty_content_is_rejected() {
        let err = PanZoom::new(
            PanZoomOptions::inline(),
            Size::new(100.0, 100.0),
            Rect::new(0.0, 0.0, 0.0, 50.0),
        )
        .unwrap_err();
        assert!(matches!(err, ViewportError::EmptyContent));
    }

    #[test]
    fn destroyed_engine_rejects_calls() {
        let mut pz = engine(Size::new(800.0, 600.0));
        pz.destroy().unwrap();
        assert!(pz.is_destroyed());
        assert!(matches!(pz.zoom_by(1.2), Err(ViewportError::Destroyed)));
        assert!(matches!(pz.destroy(), Err(ViewportError::Destroyed)));
    }

    #[test]
    fn wheel_zoom_respects_zoom_enabled() {
        let options = PanZoomOptions {
            zoom_enabled: false,
            ..PanZoomOptions::inline()
        };
        let mut pz = PanZoom::new(
            options,
            Size::new(800.0, 600.0),
            Rect::new(0.0, 0.0, 400.0, 200.0),
        )
        .unwrap();
        assert!(!pz.wheel_zoom(-1.0, Point::new(10.0, 10.0)).unwrap());
        assert!(approx(pz.zoom(), 1.0));

        let mut pz = engine(Size::new(800.0, 600.0));
        assert!(pz.wheel_zoom(-1.0, Point::new(10.0, 10.0)).unwrap());
        assert!(approx(pz.zoom(), 1.2));
    }

    #[test]
    fn containment_keeps_content_in_view() {
        let options = PanZoomOptions {
            contain: true,
            ..PanZoomOptions::inline()
        };
        let mut pz = PanZoom::new(
            options,
            Size::new(800.0, 600.0),
            Rect::new(0.0, 0.0, 400.0, 200.0),
        )
        .unwrap();
        pz.pan_by(Vec2::new(5000.0, -5000.0)).unwrap();
        // Scaled content is 800x400: no horizontal slack, 200px vertical slack
        assert!(approx(pz.pan().x, 0.0));
        assert!(approx(pz.pan().y, 0.0));
    }

    #[test]
    fn uncontained_pan_may_leave_bounds() {
        let mut pz = engine(Size::new(800.0, 600.0));
        pz.pan_by(Vec2::new(5000.0, 0.0)).unwrap();
        assert!(approx(pz.pan().x, 5000.0));
    }
}
