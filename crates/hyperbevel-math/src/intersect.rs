//! Line, plane and triangle intersections.
//!
//! Lines are given by two points on them, planes by a point and a normal.
//! Every function returns `None` for the parallel or degenerate case instead
//! of producing infinities.

use crate::{Point3, Vec3};

const PARALLEL_EPS: f64 = 1e-12;

/// Intersect the infinite line through `a` and `b` with a plane.
pub fn intersect_line_plane(
    a: &Point3,
    b: &Point3,
    plane_co: &Point3,
    plane_no: &Vec3,
) -> Option<Point3> {
    let d = b - a;
    let denom = plane_no.dot(&d);
    if denom.abs() < PARALLEL_EPS * d.norm().max(1.0) {
        return None;
    }
    let t = plane_no.dot(&(plane_co - a)) / denom;
    let p = a + d * t;
    p.coords.iter().all(|c| c.is_finite()).then_some(p)
}

/// Closest points between the infinite lines `a1 a2` and `b1 b2`.
///
/// Returns `(on_a, on_b)`. For intersecting lines both points coincide.
/// `None` when either line is degenerate or the lines are parallel.
pub fn intersect_line_line(
    a1: &Point3,
    a2: &Point3,
    b1: &Point3,
    b2: &Point3,
) -> Option<(Point3, Point3)> {
    let d1 = a2 - a1;
    let d2 = b2 - b1;
    let r = a1 - b1;

    let a = d1.dot(&d1);
    let e = d2.dot(&d2);
    if a <= PARALLEL_EPS || e <= PARALLEL_EPS {
        return None;
    }

    let b = d1.dot(&d2);
    let c = d1.dot(&r);
    let f = d2.dot(&r);
    let denom = a * e - b * b;

    // Relative test: sin^2 of the angle between the lines.
    if denom <= PARALLEL_EPS * a * e {
        return None;
    }

    let s = (b * f - c * e) / denom;
    let t = (a * f - b * c) / denom;
    Some((a1 + d1 * s, b1 + d2 * t))
}

/// Project `p` onto the infinite line through `a` and `b`.
///
/// Returns the projected point and its parameter (0 at `a`, 1 at `b`).
pub fn closest_point_on_line(p: &Point3, a: &Point3, b: &Point3) -> Option<(Point3, f64)> {
    let d = b - a;
    let len2 = d.dot(&d);
    if len2 <= PARALLEL_EPS {
        return None;
    }
    let t = (p - a).dot(&d) / len2;
    Some((a + d * t, t))
}

/// Möller-Trumbore ray/triangle test, two-sided.
///
/// Returns the ray parameter `t >= 0` of the hit.
pub fn intersect_ray_triangle(
    origin: &Point3,
    dir: &Vec3,
    v0: &Point3,
    v1: &Point3,
    v2: &Point3,
) -> Option<f64> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = dir.cross(&edge2);
    let a = edge1.dot(&h);
    if a.abs() < PARALLEL_EPS {
        return None;
    }

    let f = 1.0 / a;
    let s = origin - v0;
    let u = f * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * dir.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(&q);
    (t >= 0.0).then_some(t)
}

/// Closest point to `p` on the triangle `(a, b, c)`.
///
/// Region classification after Ericson, "Real-Time Collision Detection" 5.1.5.
pub fn closest_point_on_triangle(p: &Point3, a: &Point3, b: &Point3, c: &Point3) -> Point3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return *a;
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return *b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return *c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}
