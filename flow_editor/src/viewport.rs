//! Screen/canvas coordinate model.
//!
//! Screen coordinates are pixels relative to the editor container's top-left
//! corner. `canvas = (screen - pan) / scale` with `scale = zoom_percent / 100`.

use glam::Vec2;
use workflow::constants::{
    CANVAS_SIZE, DEFAULT_ZOOM_PERCENT, FIT_PADDING, MAX_FIT_ZOOM_PERCENT, MAX_ZOOM_PERCENT,
    MIN_ZOOM_PERCENT,
};
use workflow::rect::CanvasRect;

#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    zoom_percent: u16,
    pan: Vec2,
    container: Vec2,
}

impl Viewport {
    pub fn new(container: Vec2) -> Viewport {
        let mut viewport = Viewport {
            zoom_percent: DEFAULT_ZOOM_PERCENT,
            pan: Vec2::ZERO,
            container: container.max(Vec2::ZERO),
        };
        viewport.pan = viewport.clamp_pan(Vec2::ZERO);
        viewport
    }

    pub fn zoom_percent(&self) -> u16 {
        self.zoom_percent
    }

    pub fn scale(&self) -> f32 {
        self.zoom_percent as f32 / 100.0
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    pub fn container_size(&self) -> Vec2 {
        self.container
    }

    /// `(pan, scale)`: translate by `pan`, then scale by `scale`.
    pub fn transform(&self) -> (Vec2, f32) {
        (self.pan, self.scale())
    }

    pub fn screen_to_canvas(&self, screen: Vec2) -> Vec2 {
        (screen - self.pan) / self.scale()
    }

    pub fn canvas_to_screen(&self, canvas: Vec2) -> Vec2 {
        canvas * self.scale() + self.pan
    }

    /// The part of the canvas currently inside the container.
    pub fn visible_canvas_rect(&self) -> CanvasRect {
        CanvasRect::from_points(
            self.screen_to_canvas(Vec2::ZERO),
            self.screen_to_canvas(self.container),
        )
    }

    /// Valid pan range per axis: `[container - canvas * scale, 0]`.
    ///
    /// An axis on which the scaled canvas is smaller than the container is
    /// pinned to the canvas origin.
    pub fn pan_range(&self) -> (Vec2, Vec2) {
        let min = (self.container - CANVAS_SIZE * self.scale()).min(Vec2::ZERO);
        (min, Vec2::ZERO)
    }

    pub fn clamp_pan(&self, pan: Vec2) -> Vec2 {
        let (min, max) = self.pan_range();
        let pan = Vec2::new(
            if pan.x.is_finite() { pan.x } else { 0.0 },
            if pan.y.is_finite() { pan.y } else { 0.0 },
        );
        pan.clamp(min, max)
    }

    /// Sets the pan offset, clamped. Returns the offset actually applied.
    pub fn set_pan(&mut self, pan: Vec2) -> Vec2 {
        self.pan = self.clamp_pan(pan);
        self.pan
    }

    /// Moves the pan offset by `delta` screen pixels. Returns the movement
    /// actually applied after clamping.
    pub fn pan_by(&mut self, delta: Vec2) -> Vec2 {
        let before = self.pan;
        self.set_pan(before + delta);
        self.pan - before
    }

    /// Changes zoom by `delta_percent`, keeping `anchor` (screen) over the
    /// same canvas point. Returns whether the view changed.
    pub fn zoom_by(&mut self, delta_percent: i32, anchor: Vec2) -> bool {
        self.set_zoom((self.zoom_percent as i32).saturating_add(delta_percent), anchor)
    }

    pub fn set_zoom(&mut self, zoom_percent: i32, anchor: Vec2) -> bool {
        let zoom_percent =
            zoom_percent.clamp(MIN_ZOOM_PERCENT as i32, MAX_ZOOM_PERCENT as i32) as u16;
        let before = (self.zoom_percent, self.pan);

        let anchored = self.screen_to_canvas(anchor);
        self.zoom_percent = zoom_percent;
        self.pan = self.clamp_pan(anchor - anchored * self.scale());

        before != (self.zoom_percent, self.pan)
    }

    /// Centres the container on `canvas_point` at the current zoom.
    pub fn center_on(&mut self, canvas_point: Vec2) {
        self.pan = self.clamp_pan(self.container * 0.5 - canvas_point * self.scale());
    }

    /// Zooms (never past 100%) and pans so `bounds` plus padding fills the
    /// container. With no bounds this is [`Viewport::reset`].
    pub fn fit_to_view(&mut self, bounds: Option<CanvasRect>) {
        let Some(bounds) = bounds else {
            self.reset();
            return;
        };

        let padded = bounds.expand(FIT_PADDING);
        let fit = self.container / padded.size().max(Vec2::ONE);
        let zoom_percent = (fit.min_element() * 100.0).floor();
        let zoom_percent = if zoom_percent.is_finite() {
            zoom_percent as i32
        } else {
            MAX_FIT_ZOOM_PERCENT as i32
        };
        self.zoom_percent =
            zoom_percent.clamp(MIN_ZOOM_PERCENT as i32, MAX_FIT_ZOOM_PERCENT as i32) as u16;
        self.center_on(padded.center());
    }

    /// 100% zoom, pan at the clamped value nearest the canvas origin.
    pub fn reset(&mut self) {
        self.zoom_percent = DEFAULT_ZOOM_PERCENT;
        self.pan = self.clamp_pan(Vec2::ZERO);
    }

    /// Adopts a new container size and re-clamps the pan.
    pub fn set_container_size(&mut self, container: Vec2) {
        self.container = container.max(Vec2::ZERO);
        self.pan = self.clamp_pan(self.pan);
    }
}
