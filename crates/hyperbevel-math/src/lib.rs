#![warn(missing_docs)]

//! Math types for the hyperbevel core.
//!
//! Thin wrappers around nalgebra: points, vectors, directions, an affine
//! transform for moving between an object's local frame and world space,
//! tolerances, and the handful of vector helpers the sweep solver leans on.
//! Line/plane intersections live in [`intersect`].

pub mod intersect;

pub use intersect::{
    closest_point_on_line, closest_point_on_triangle, intersect_line_line, intersect_line_plane,
    intersect_ray_triangle,
};

use nalgebra::{Matrix4, Unit, Vector3, Vector4};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A 4x4 affine transformation matrix (an object's world matrix).
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        Self { matrix: m }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Transform a direction vector (no translation).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vector4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }

    /// Transform a normal vector with the inverse transpose of the upper 3x3.
    pub fn apply_normal(&self, n: &Vec3) -> Vec3 {
        let m3 = self.matrix.fixed_view::<3, 3>(0, 0);
        match m3.try_inverse() {
            Some(inv) => inv.transpose() * n,
            None => *n,
        }
    }

    /// Inverse of this transform, if it exists.
    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(|matrix| Self { matrix })
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance.
    pub linear: f64,
    /// Allowed deviation of a direction's length from 1.
    pub unit: f64,
    /// Lengths at or below this never normalize.
    pub zero: f64,
}

impl Tolerance {
    /// Default tolerances.
    pub const DEFAULT: Self = Self {
        linear: 1e-9,
        unit: 1e-4,
        zero: 1e-12,
    };
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Normalize `v`, or `None` for zero-length and non-finite input.
pub fn normalized(v: &Vec3) -> Option<Vec3> {
    let len = v.norm();
    if !len.is_finite() || len <= Tolerance::DEFAULT.zero {
        return None;
    }
    Some(v / len)
}

/// Normalized sum of a set of normals, or `None` if they cancel out.
pub fn average_normals<'a>(normals: impl IntoIterator<Item = &'a Vec3>) -> Option<Vec3> {
    let sum = normals.into_iter().fold(Vec3::zeros(), |acc, n| acc + n);
    normalized(&sum)
}

/// Angle in radians between two vectors, `None` if either is degenerate.
pub fn angle_between(a: &Vec3, b: &Vec3) -> Option<f64> {
    let a = normalized(a)?;
    let b = normalized(b)?;
    Some(a.dot(&b).clamp(-1.0, 1.0).acos())
}

/// Linear interpolation between two vectors.
pub fn lerp_vec(a: &Vec3, b: &Vec3, t: f64) -> Vec3 {
    a + (b - a) * t
}

/// Midpoint of two points.
pub fn midpoint(a: &Point3, b: &Point3) -> Point3 {
    Point3::from((a.coords + b.coords) * 0.5)
}

/// Centroid of a non-empty point set.
pub fn centroid<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Point3> {
    let mut sum = Vec3::zeros();
    let mut count = 0usize;
    for p in points {
        sum += p.coords;
        count += 1;
    }
    (count > 0).then(|| Point3::from(sum / count as f64))
}
