//! Minimal 3-component float vector, the unit every other module builds on.

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Absolute per-component tolerance used throughout the tree and integrator
/// to decide whether two positions are "the same point".
pub const EPS: f64 = 1e-3;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length_sq(self) -> f64 {
        self.dot(self)
    }

    pub fn length(self) -> f64 {
        self.length_sq().sqrt()
    }

    pub fn distance(self, other: Vec3) -> f64 {
        (self - other).length()
    }

    /// True if every component differs by no more than [`EPS`].
    pub fn approx_eq(self, other: Vec3) -> bool {
        approx_eq_f64(self.x, other.x) && approx_eq_f64(self.y, other.y) && approx_eq_f64(self.z, other.z)
    }
}

/// True if `a` and `b` are within [`EPS`] of each other.
pub fn approx_eq_f64(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPS
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, rhs: Vec3) {
        *self = *self - rhs;
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;
    fn mul(self, t: f64) -> Vec3 {
        Vec3::new(self.x * t, self.y * t, self.z * t)
    }
}

impl Div<f64> for Vec3 {
    type Output = Vec3;
    fn div(self, t: f64) -> Vec3 {
        Vec3::new(self.x / t, self.y / t, self.z / t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approx_eq_within_tolerance() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(1.0005, 2.0, 2.9995);
        assert!(a.approx_eq(b));
    }

    #[test]
    fn approx_eq_rejects_outside_tolerance() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(0.01, 0.0, 0.0);
        assert!(!a.approx_eq(b));
    }

    #[test]
    fn distance_matches_pythagoras() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 4.0, 0.0);
        assert!((a.distance(b) - 5.0).abs() < 1e-9);
    }
}
