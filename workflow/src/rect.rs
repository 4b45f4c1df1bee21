use glam::Vec2;

use crate::constants::BLOCK_SIZE;

/// Axis-aligned rectangle in canvas units. `min` is always the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct CanvasRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl CanvasRect {
    pub fn from_min_size(min: Vec2, size: Vec2) -> Self {
        Self {
            min,
            max: min + size,
        }
    }

    /// Normalized rectangle spanned by two arbitrary corners.
    pub fn from_points(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Footprint of a block whose top-left corner is `position`.
    pub fn block_footprint(position: Vec2) -> Self {
        Self::from_min_size(position, BLOCK_SIZE)
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Area of the intersection, 0 when the rectangles are disjoint.
    pub fn overlap_area(&self, other: &CanvasRect) -> f32 {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        let size = (max - min).max(Vec2::ZERO);
        size.x * size.y
    }

    pub fn union(&self, other: &CanvasRect) -> CanvasRect {
        CanvasRect {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn expand(&self, amount: f32) -> CanvasRect {
        CanvasRect {
            min: self.min - Vec2::splat(amount),
            max: self.max + Vec2::splat(amount),
        }
    }

    pub fn translate(&self, delta: Vec2) -> CanvasRect {
        CanvasRect {
            min: self.min + delta,
            max: self.max + delta,
        }
    }
}
