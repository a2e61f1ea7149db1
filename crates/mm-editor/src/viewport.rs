//! Viewport controller: zoom, pan, fit and expand.
//!
//! Zoom changes by buttons, shortcuts or the wheel are clamped to the manual
//! range (`ZoomConfig::min..=max`). `fit_to_view` uses its own floor
//! (`fit_min`) so a very large map can still be fit on screen; set
//! `fit_min == min` to get a single canonical floor.

use crate::input::Modifiers;
use mm_core::config::CanvasConfig;
use mm_core::geometry::{Point, Rect, Size, ViewTransform};

#[derive(Debug, Clone)]
pub struct ViewportController {
    config: CanvasConfig,
    zoom: f32,
    /// Screen pixels, relative to the canvas origin.
    pan: Point,
    /// Canvas surface position inside the window.
    origin: Point,
    size: Size,
    /// Whether the view is at 100% (reset or expanded). Drives `toggle_fit`.
    expanded: bool,
}

impl ViewportController {
    pub fn new(config: &CanvasConfig, size: Size) -> Self {
        Self {
            config: *config,
            zoom: 1.0,
            pan: Point::ZERO,
            origin: Point::ZERO,
            size,
            expanded: true,
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn pan(&self) -> Point {
        self.pan
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn transform(&self) -> ViewTransform {
        ViewTransform {
            origin: self.origin,
            pan: self.pan,
            zoom: self.zoom,
        }
    }

    pub fn set_pan(&mut self, pan: Point) {
        self.pan = pan;
    }

    pub fn set_origin(&mut self, origin: Point) {
        self.origin = origin;
    }

    pub fn resize(&mut self, size: Size) {
        self.size = size;
    }

    // ─── Zoom ────────────────────────────────────────────────────────────

    fn set_zoom(&mut self, zoom: f32) {
        // Keep repeated ±step from accumulating float noise.
        let zoom = (zoom * 1000.0).round() / 1000.0;
        self.zoom = self.config.zoom.clamp(zoom);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + self.config.zoom.step);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - self.config.zoom.step);
    }

    /// Wheel zoom, only while ⌘/Ctrl is held (trackpad pinch arrives as
    /// Ctrl+wheel too). Scrolling up zooms in. Returns whether it applied.
    pub fn wheel_zoom(&mut self, delta_y: f32, modifiers: Modifiers) -> bool {
        if !modifiers.command() || delta_y == 0.0 {
            return false;
        }
        let step = self.config.zoom.wheel_step;
        self.set_zoom(self.zoom - step * delta_y.signum());
        true
    }

    pub fn reset_view(&mut self) {
        self.zoom = 1.0;
        self.pan = Point::ZERO;
        self.expanded = true;
    }

    // ─── Fit / expand ────────────────────────────────────────────────────

    fn content_bounds(&self, positions: impl IntoIterator<Item = Point>) -> Option<Rect> {
        Rect::bounding_boxes(positions, self.config.node_size)
    }

    fn center_on(&mut self, world_center: Point) {
        let screen_center = Point::new(self.size.width / 2.0, self.size.height / 2.0);
        self.pan = screen_center - world_center * self.zoom;
    }

    /// Scale and center so every node box fits, with padding. No-op on an
    /// empty map.
    pub fn fit_to_view(&mut self, positions: impl IntoIterator<Item = Point>) -> bool {
        let Some(bounds) = self.content_bounds(positions) else {
            return false;
        };
        let pad = self.config.fit_padding;
        let content_w = bounds.width + 2.0 * pad;
        let content_h = bounds.height + 2.0 * pad;
        let zoom = (self.size.width / content_w)
            .min(self.size.height / content_h)
            .min(self.config.zoom.fit_max)
            .max(self.config.zoom.fit_min);
        self.zoom = zoom;
        self.center_on(bounds.center());
        self.expanded = false;
        log::debug!("fit to view: zoom {zoom:.3}, pan ({:.1}, {:.1})", self.pan.x, self.pan.y);
        true
    }

    /// 100% zoom, content centered. No-op on an empty map.
    pub fn expand_view(&mut self, positions: impl IntoIterator<Item = Point>) -> bool {
        let Some(bounds) = self.content_bounds(positions) else {
            return false;
        };
        self.zoom = 1.0;
        self.center_on(bounds.center());
        self.expanded = true;
        true
    }

    /// The single fit/expand toolbar control: fits when at 100%, expands
    /// otherwise.
    pub fn toggle_fit(&mut self, positions: impl IntoIterator<Item = Point>) -> bool {
        if self.expanded {
            self.fit_to_view(positions)
        } else {
            self.expand_view(positions)
        }
    }
}
