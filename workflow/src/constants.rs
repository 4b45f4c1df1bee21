//! Fixed canvas geometry and gesture tuning.

use glam::Vec2;

pub const CANVAS_WIDTH: f32 = 20_000.0;
pub const CANVAS_HEIGHT: f32 = 20_000.0;
pub const CANVAS_SIZE: Vec2 = Vec2::new(CANVAS_WIDTH, CANVAS_HEIGHT);

pub const BLOCK_WIDTH: f32 = 320.0;
pub const BLOCK_HEIGHT: f32 = 200.0;
pub const BLOCK_SIZE: Vec2 = Vec2::new(BLOCK_WIDTH, BLOCK_HEIGHT);
pub const BLOCK_AREA: f32 = BLOCK_WIDTH * BLOCK_HEIGHT;

pub const MAX_BLOCK_POSITION: Vec2 =
    Vec2::new(CANVAS_WIDTH - BLOCK_WIDTH, CANVAS_HEIGHT - BLOCK_HEIGHT);

pub const MIN_ZOOM_PERCENT: u16 = 10;
pub const MAX_ZOOM_PERCENT: u16 = 200;
pub const DEFAULT_ZOOM_PERCENT: u16 = 100;
/// Fit-to-view never zooms in past 100%.
pub const MAX_FIT_ZOOM_PERCENT: u16 = 100;
pub const KEYBOARD_ZOOM_STEP: i32 = 10;
pub const FIT_PADDING: f32 = 100.0;

/// Minimum share of a block's footprint, in percent, a marquee must cover.
pub const MARQUEE_MEMBERSHIP_PERCENT: f32 = 25.0;
pub const MARQUEE_MIN_SIZE: f32 = 10.0;

pub const INERTIA_FRICTION: f32 = 0.93;
/// Speed in screen pixels per frame below which inertial panning stops.
pub const INERTIA_STOP_SPEED: f32 = 0.2;

/// Clamps a block's top-left corner into the canvas. Non-finite components collapse to 0.
pub fn clamp_block_position(position: Vec2) -> Vec2 {
    let finite = Vec2::new(
        if position.x.is_finite() { position.x } else { 0.0 },
        if position.y.is_finite() { position.y } else { 0.0 },
    );
    finite.clamp(Vec2::ZERO, MAX_BLOCK_POSITION)
}

/// Top-left corner that centres a block on the canvas.
pub fn canvas_center_block_position() -> Vec2 {
    (CANVAS_SIZE - BLOCK_SIZE) * 0.5
}
