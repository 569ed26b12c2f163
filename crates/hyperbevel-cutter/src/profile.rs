//! Custom bevel profiles.

use serde::{Deserialize, Serialize};

use crate::error::{CutterError, Result};

/// A control point in the unit square.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    /// Across the bevel, 1 at the start.
    pub x: f64,
    /// Across the bevel, 1 at the end.
    pub y: f64,
}

impl ProfilePoint {
    /// A point clamped into the unit square.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
        }
    }
}

/// Persisted form: `{segments, points: [{x, y}]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ProfileRecord {
    segments: usize,
    points: Vec<ProfilePoint>,
}

/// A polyline profile of at least two points. Segments are `points - 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProfileRecord", into = "ProfileRecord")]
pub struct CustomProfile {
    points: Vec<ProfilePoint>,
}

impl CustomProfile {
    /// Points are clamped into the unit square.
    pub fn new(points: Vec<ProfilePoint>) -> Result<Self> {
        if points.len() < 2 {
            return Err(CutterError::InvalidProfile(points.len()));
        }
        let points = points.into_iter().map(|p| ProfilePoint::new(p.x, p.y)).collect();
        Ok(Self { points })
    }

    /// Evenly spaced points on the straight line from `(1, 0)` to `(0, 1)`.
    pub fn linear(segments: usize) -> Self {
        let segments = segments.max(1);
        let points = (0..=segments)
            .map(|i| {
                let t = i as f64 / segments as f64;
                ProfilePoint::new(1.0 - t, t)
            })
            .collect();
        Self { points }
    }

    /// Control points, start to end.
    pub fn points(&self) -> &[ProfilePoint] {
        &self.points
    }

    /// Polyline segment count.
    pub fn segments(&self) -> usize {
        self.points.len() - 1
    }

    /// Mirror the interior points across `x = 0.5`, reversing their order.
    /// The end points stay put.
    pub fn flip(&mut self) {
        let n = self.points.len();
        let interior = &mut self.points[1..n - 1];
        interior.reverse();
        for p in interior {
            p.x = 1.0 - p.x;
        }
    }

    /// Mirror the interior points across `y = 0.5`.
    pub fn flop(&mut self) {
        let n = self.points.len();
        for p in &mut self.points[1..n - 1] {
            p.y = 1.0 - p.y;
        }
    }
}

impl TryFrom<ProfileRecord> for CustomProfile {
    type Error = CutterError;

    fn try_from(record: ProfileRecord) -> Result<Self> {
        CustomProfile::new(record.points)
    }
}

impl From<CustomProfile> for ProfileRecord {
    fn from(profile: CustomProfile) -> Self {
        ProfileRecord {
            segments: profile.segments(),
            points: profile.points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve() -> CustomProfile {
        CustomProfile::new(vec![
            ProfilePoint::new(1.0, 0.0),
            ProfilePoint::new(0.75, 0.125),
            ProfilePoint::new(0.25, 0.625),
            ProfilePoint::new(0.0, 1.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_flip_and_flop_are_involutions() {
        let original = curve();

        let mut p = original.clone();
        p.flip();
        assert_ne!(p, original);
        assert_eq!(p.points()[0], original.points()[0]);
        assert_eq!(p.points()[1], ProfilePoint::new(0.75, 0.625));
        assert_eq!(p.points()[2], ProfilePoint::new(0.25, 0.125));
        p.flip();
        assert_eq!(p, original);

        p.flop();
        assert_eq!(p.points()[1].y, 0.875);
        assert_eq!(p.points()[3].y, 1.0);
        p.flop();
        assert_eq!(p, original);
    }

    #[test]
    fn test_segments_follow_points() {
        assert_eq!(curve().segments(), 3);
        assert_eq!(CustomProfile::linear(5).segments(), 5);
        assert_eq!(CustomProfile::linear(0).segments(), 1);
        assert_eq!(
            CustomProfile::new(vec![ProfilePoint::new(0.0, 0.0)]),
            Err(CutterError::InvalidProfile(1))
        );
    }

    #[test]
    fn test_points_clamped_to_unit_square() {
        let p = CustomProfile::new(vec![ProfilePoint { x: -1.0, y: 2.0 }, ProfilePoint::new(1.0, 0.0)]).unwrap();
        assert_eq!(p.points()[0], ProfilePoint::new(0.0, 1.0));
    }

    #[test]
    fn test_persisted_shape() {
        let json = serde_json::to_value(curve()).unwrap();
        assert_eq!(json["segments"], 3);
        assert_eq!(json["points"][3]["y"], 1.0);

        let back: CustomProfile = serde_json::from_value(json).unwrap();
        assert_eq!(back, curve());

        let bad = serde_json::json!({"segments": 0, "points": [{"x": 0.0, "y": 0.0}]});
        assert!(serde_json::from_value::<CustomProfile>(bad).is_err());
    }
}
