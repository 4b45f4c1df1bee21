use glam::Vec2;

pub trait FloatExt {
    fn approximately_eq(self, other: Self) -> bool;
}

impl FloatExt for f32 {
    fn approximately_eq(self, other: Self) -> bool {
        (self - other).abs() < crate::EPSILON
    }
}

impl FloatExt for f64 {
    fn approximately_eq(self, other: Self) -> bool {
        (self - other).abs() < crate::EPSILON as f64
    }
}

pub trait Vec2Ext {
    /// Component-wise comparison within `tolerance`.
    fn approximately_eq_within(self, other: Self, tolerance: f32) -> bool;
    fn approximately_eq(self, other: Self) -> bool;
}

impl Vec2Ext for Vec2 {
    fn approximately_eq_within(self, other: Self, tolerance: f32) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }

    fn approximately_eq(self, other: Self) -> bool {
        self.approximately_eq_within(other, crate::EPSILON)
    }
}
