use glam::Vec2;
use workflow::constants::{INERTIA_FRICTION, INERTIA_STOP_SPEED};

use crate::viewport::Viewport;

/// Coasting pan after a pan gesture is released.
#[derive(Debug, Default, Clone)]
pub struct Inertia {
    /// Screen pixels per frame.
    velocity: Vec2,
    running: bool,
}

impl Inertia {
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Records the pan displacement of the latest frame of an active gesture.
    pub fn track(&mut self, frame_delta: Vec2) {
        assert!(!self.running, "tracking while coasting");
        self.velocity = frame_delta;
    }

    /// Starts coasting if the release velocity is above the stop threshold.
    pub fn release(&mut self) -> bool {
        self.running = self.velocity.x.abs() > INERTIA_STOP_SPEED
            || self.velocity.y.abs() > INERTIA_STOP_SPEED;
        if self.running {
            tracing::debug!("Inertial pan started at {:?}", self.velocity);
        } else {
            self.velocity = Vec2::ZERO;
        }
        self.running
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.velocity = Vec2::ZERO;
    }

    /// Advances one animation frame. Returns whether coasting continues.
    pub fn step(&mut self, viewport: &mut Viewport) -> bool {
        if !self.running {
            return false;
        }

        self.velocity *= INERTIA_FRICTION;
        let target = viewport.pan() + self.velocity;
        let applied = viewport.set_pan(target);

        // A clamp boundary absorbs the motion on its axis.
        if applied.x != target.x {
            self.velocity.x = 0.0;
        }
        if applied.y != target.y {
            self.velocity.y = 0.0;
        }

        if self.velocity.x.abs() < INERTIA_STOP_SPEED && self.velocity.y.abs() < INERTIA_STOP_SPEED
        {
            tracing::debug!("Inertial pan stopped");
            self.stop();
        }
        self.running
    }
}
