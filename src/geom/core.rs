//! Value-type vector math for road geometry.
//!
//! Every operation takes its operands by value and returns a new value; there
//! is no interior state. `Point3` is a location and `Vec3` a direction or
//! offset, so `Point3 - Point3 = Vec3` and `Point3 + Vec3 = Point3`.

use std::ops::{Add, Div, Mul, Neg, Sub};

/// Direction or offset in 3D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    /// World up for roads.
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn from_array([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    #[must_use]
    pub const fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    /// Right-handed cross product.
    #[must_use]
    pub const fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, or `None` for zero or non-finite input.
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        self.normalized_above(0.0)
    }

    /// Unit vector, or `None` unless the length is finite and above `min_length`.
    #[must_use]
    pub fn normalized_above(self, min_length: f64) -> Option<Self> {
        let len = self.length();
        (len.is_finite() && len > min_length).then(|| self / len)
    }

    /// `self` minus its projection onto the unit vector `axis`.
    #[must_use]
    pub fn reject_from(self, axis: Self) -> Self {
        self - axis * self.dot(axis)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Mul<Vec3> for f64 {
    type Output = Vec3;
    fn mul(self, v: Vec3) -> Vec3 {
        v * self
    }
}

impl Div<f64> for Vec3 {
    type Output = Self;
    fn div(self, s: f64) -> Self {
        Self::new(self.x / s, self.y / s, self.z / s)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Location in 3D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn from_array([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Position vector from the origin.
    #[must_use]
    pub const fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// `2 * self - other`: the phantom neighbour past an open curve end.
    #[must_use]
    pub fn mirror_away_from(self, other: Self) -> Self {
        self + (self - other)
    }

    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (self - other).length()
    }

    #[must_use]
    pub fn distance_squared_to(self, other: Self) -> f64 {
        let d = self - other;
        d.dot(d)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.to_vec3().is_finite()
    }
}

impl Add<Vec3> for Point3 {
    type Output = Self;
    fn add(self, v: Vec3) -> Self {
        Self::new(self.x + v.x, self.y + v.y, self.z + v.z)
    }
}

impl Sub for Point3 {
    type Output = Vec3;
    fn sub(self, rhs: Self) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Row-major affine camera matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    rows: [[f64; 4]; 4],
}

impl Transform {
    /// Camera-to-world placement whose local `-Z` looks from `eye` at
    /// `target`. `None` when the two coincide or `up` is parallel to the view.
    #[must_use]
    pub fn look_at(eye: Point3, target: Point3, up: Vec3) -> Option<Self> {
        let forward = (target - eye).normalized()?;
        let right = forward.cross(up).normalized()?;
        let up = right.cross(forward);
        let back = -forward;
        Some(Self {
            rows: [
                [right.x, up.x, back.x, eye.x],
                [right.y, up.y, back.y, eye.y],
                [right.z, up.z, back.z, eye.z],
                [0.0, 0.0, 0.0, 1.0],
            ],
        })
    }

    /// Column-major copy, the layout WebGL matrix uniforms expect.
    #[must_use]
    pub fn to_column_major(self) -> [f64; 16] {
        std::array::from_fn(|k| self.rows[k % 4][k / 4])
    }
}

/// Axis-aligned bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min: Point3,
    pub max: Point3,
}

impl BBox {
    /// Smallest box around `points`, or `None` when there are none.
    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = Point3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self { min: first, max: first }, Self::expand_point))
    }

    #[must_use]
    pub fn expand_point(self, p: Point3) -> Self {
        Self {
            min: Point3::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z)),
            max: Point3::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z)),
        }
    }
}

/// Named epsilons used across the road kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub eps: f64,
}

impl Tolerance {
    /// General comparisons.
    pub const DEFAULT: Self = Self::new(1e-9);
    /// Curve derivatives at or below this length count as zero.
    pub const ZERO_LENGTH: Self = Self::new(1e-12);
    /// `|tangent . up|` above `1 - eps` switches to the alternate reference axis.
    pub const PARALLEL: Self = Self::new(1e-6);
    /// Flattened lateral axes at or below this length are replaced.
    pub const LATERAL: Self = Self::new(1e-9);
    /// Centripetal and chordal knot spacings below this are replaced.
    pub const KNOT: Self = Self::new(1e-4);

    #[must_use]
    pub const fn new(eps: f64) -> Self {
        Self { eps }
    }

    #[must_use]
    pub fn approx_eq_f64(self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.eps
    }

    #[must_use]
    pub fn approx_eq_vec3(self, a: Vec3, b: Vec3) -> bool {
        (a - b).length() <= self.eps
    }

    #[must_use]
    pub fn approx_eq_point3(self, a: Point3, b: Point3) -> bool {
        a.distance_to(b) <= self.eps
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operators() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(2.0 * a, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(a / 2.0, Vec3::new(0.5, 1.0, 1.5));
        assert_eq!(-a, Vec3::new(-1.0, -2.0, -3.0));
    }

    #[test]
    fn test_cross_follows_right_hand_rule() {
        assert_eq!(Vec3::X.cross(Vec3::Y), Vec3::Z);
        assert_eq!(Vec3::Z.cross(Vec3::Y), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_normalized_rejects_zero() {
        assert!(Vec3::ZERO.normalized().is_none());
        assert!(Vec3::new(1e-12, 0.0, 0.0).normalized_above(1e-9).is_none());
        let n = Vec3::new(3.0, 0.0, 4.0).normalized().unwrap();
        assert!((n.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_reject_from_removes_axis_component() {
        let v = Vec3::new(1.0, 5.0, -2.0).reject_from(Vec3::Y);
        assert_eq!(v, Vec3::new(1.0, 0.0, -2.0));
    }

    #[test]
    fn test_point_mirror() {
        let p0 = Point3::new(-25.0, 0.0, -25.0);
        let p1 = Point3::new(-4.0, 2.0, -9.0);
        assert_eq!(p0.mirror_away_from(p1), Point3::new(-46.0, -2.0, -41.0));
    }

    #[test]
    fn test_look_at_column_major() {
        let eye = Point3::new(1.0, 2.0, 3.0);
        let view = Transform::look_at(eye, Point3::new(1.0, 2.0, -2.0), Vec3::Y).unwrap();
        let cols = view.to_column_major();

        // Columns: right, up, back (-view direction), eye.
        assert_eq!(&cols[0..4], &[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(&cols[4..8], &[0.0, 1.0, 0.0, 0.0]);
        assert_eq!(&cols[8..12], &[0.0, 0.0, 1.0, 0.0]);
        assert_eq!(&cols[12..16], &[1.0, 2.0, 3.0, 1.0]);

        assert!(Transform::look_at(eye, eye, Vec3::Y).is_none());
        assert!(Transform::look_at(eye, Point3::new(1.0, 5.0, 3.0), Vec3::Y).is_none());
    }

    #[test]
    fn test_bbox_from_points() {
        let bbox = BBox::from_points([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, -1.0, 6.0),
            Point3::new(1.0, 4.0, 3.0),
        ])
        .unwrap();

        assert_eq!(bbox.min, Point3::new(0.0, -1.0, 0.0));
        assert_eq!(bbox.max, Point3::new(2.0, 4.0, 6.0));
        assert!(BBox::from_points(Vec::new()).is_none());
    }
}
