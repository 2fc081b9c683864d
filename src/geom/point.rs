// Copyright (c) 2023 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use core::ops;

use float_cmp::ApproxEq;
use serde::{Deserialize, Serialize};

/// Shared tolerance for float-point equality of geometry derived from
/// tracing, stitching, and simplification.
pub const EPSILON: f64 = 1e-4;

/// A point in image-pixel units (or millimeters, once the output
/// planner has run).
///
/// Equality via `==` is exact; use [`Point::fuzzy_eq`] for the
/// tolerance-aware comparison every stitching/simplification step
/// requires.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub const fn origin() -> Self {
        Self::new(0.0, 0.0)
    }

    #[must_use]
    pub const fn x(&self) -> f64 {
        self.x
    }

    #[must_use]
    pub const fn y(&self) -> f64 {
        self.y
    }

    pub fn set_x(&mut self, x: f64) {
        self.x = x;
    }

    pub fn set_y(&mut self, y: f64) {
        self.y = y;
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        (*self - *other).length()
    }

    #[must_use]
    pub fn distance_squared_to(&self, other: &Self) -> f64 {
        (*self - *other).length_squared()
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    #[must_use]
    pub fn length_squared(&self) -> f64 {
        self.x.mul_add(self.x, self.y * self.y)
    }

    #[must_use]
    pub fn dot_product(&self, other: &Self) -> f64 {
        self.x.mul_add(other.x, self.y * other.y)
    }

    /// Tolerance-aware equality using [`EPSILON`], as required by the
    /// stitching and jitter-removal passes: floats derived from
    /// arithmetic must never be compared with `==`.
    #[must_use]
    pub fn fuzzy_eq(&self, other: &Self) -> bool {
        self.distance_to(other) < EPSILON
    }

    #[must_use]
    pub fn rotated(&self, radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self::new(
            self.x * cos - self.y * sin,
            self.x * sin + self.y * cos,
        )
    }

    #[must_use]
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    /// Rounds to the nearest integer pixel coordinate.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_pixel(&self) -> (i64, i64) {
        (self.x.round() as i64, self.y.round() as i64)
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_pixel(x: i64, y: i64) -> Self {
        Self::new(x as f64, y as f64)
    }

    /// Per-axis tolerance comparison, unlike [`Self::fuzzy_eq`]'s
    /// Euclidean-distance tolerance. Kept for callers that need each
    /// axis within tolerance independently.
    #[must_use]
    pub fn axis_fuzzy_eq(&self, other: &Self) -> bool {
        self.x.approx_eq(other.x, (0.0, 1)) && self.y.approx_eq(other.y, (0.0, 1))
    }
}

impl ops::Add for Point {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl ops::Sub for Point {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl ops::Mul<f64> for Point {
    type Output = Self;

    fn mul(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn distance_matches_pythagoras() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!(approx_eq!(f64, a.distance_to(&b), 5.0, epsilon = 1e-9));
    }

    #[test]
    fn fuzzy_eq_within_tolerance() {
        let a = Point::new(1.0, 1.0);
        let b = Point::new(1.0 + 1e-5, 1.0);
        assert!(a.fuzzy_eq(&b));
        let c = Point::new(1.0 + 1e-2, 1.0);
        assert!(!a.fuzzy_eq(&c));
    }

    #[test]
    fn rotation_preserves_length() {
        let p = Point::new(2.0, 0.0);
        let rotated = p.rotated(std::f64::consts::FRAC_PI_2);
        assert!(approx_eq!(f64, rotated.x(), 0.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, rotated.y(), 2.0, epsilon = 1e-9));
    }
}
