//! Pan/zoom engine seam.
//!
//! One engine is bound to one graphic. The controller treats every call as
//! synchronous and fallible, and isolates failures per call so one bad
//! engine never aborts a batch.

use crate::error::EngineError;
use dv_core::ViewportState;

pub trait PanZoomEngine {
    fn zoom_by(&mut self, factor: f64) -> Result<(), EngineError>;

    /// Back to the default relative zoom.
    fn reset_zoom(&mut self) -> Result<(), EngineError>;

    fn fit(&mut self) -> Result<(), EngineError>;

    fn center(&mut self) -> Result<(), EngineError>;

    /// Re-measure the viewport the graphic occupies.
    fn resize(&mut self) -> Result<(), EngineError>;

    /// Release listeners and restore the graphic. Later calls fail.
    fn destroy(&mut self) -> Result<(), EngineError>;

    fn state(&self) -> ViewportState;
}

/// Re-measure, fit, and center: the settled default view.
pub fn recenter<E: PanZoomEngine + ?Sized>(engine: &mut E) -> Result<(), EngineError> {
    engine.resize()?;
    engine.fit()?;
    engine.center()
}

/// Default zoom, then fit and center. Fit runs before center so the view
/// ends both fitted and centered regardless of prior pan/zoom.
pub fn reset_view<E: PanZoomEngine + ?Sized>(engine: &mut E) -> Result<(), EngineError> {
    engine.reset_zoom()?;
    engine.fit()?;
    engine.center()
}

/// Destroy an engine during teardown. Failures mean it is already gone.
pub(crate) fn discard<E: PanZoomEngine + ?Sized>(engine: &mut E, what: &str) {
    if let Err(err) = engine.destroy() {
        log::debug!("{what} pan/zoom destroy failed: {err}");
    }
}
