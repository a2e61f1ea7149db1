//! Curved connection geometry.
//!
//! A connection is a quadratic curve between the two node centers. Its one
//! control point sits on the perpendicular through the segment midpoint,
//! offset by `curvature × |AB|`. The perpendicular is taken from the
//! source → target direction, so swapping source and target bends the curve
//! to the other side of the segment.

use kurbo::BezPath;
use mm_core::geometry::{Point, Rect};

/// Length of each arrow barb, world units.
const ARROW_LEN: f32 = 10.0;
/// Half-angle between the barbs, radians (~25°).
const ARROW_SPREAD: f32 = 0.44;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionCurve {
    pub start: Point,
    pub control: Point,
    pub end: Point,
}

/// Curve from `source` to `target`. `None` when the points coincide.
pub fn curve_between(source: Point, target: Point, curvature: f32) -> Option<ConnectionCurve> {
    let d = target - source;
    if d.length() <= f32::EPSILON {
        return None;
    }
    let mid = (source + target) / 2.0;
    let normal = Point::new(-d.y, d.x);
    Some(ConnectionCurve {
        start: source,
        control: mid + normal * curvature,
        end: target,
    })
}

impl ConnectionCurve {
    /// Point on the curve, `t` in [0, 1].
    pub fn point_at(&self, t: f32) -> Point {
        let u = 1.0 - t;
        self.start * (u * u) + self.control * (2.0 * u * t) + self.end * (t * t)
    }

    /// Where a label goes: the curve's midpoint.
    pub fn label_anchor(&self) -> Point {
        self.point_at(0.5)
    }

    /// Which side of the start→end segment the curve bulges toward:
    /// positive for clockwise (y-down), negative otherwise.
    pub fn bend_side(&self) -> f32 {
        (self.end - self.start).cross(self.control - self.start).signum()
    }

    /// Last parameter at which the curve is still outside `rect`, found by
    /// bisection from the end. `None` if the midpoint is already inside
    /// (overlapping nodes).
    pub fn exit_t(&self, rect: &Rect) -> Option<f32> {
        if rect.contains(self.point_at(0.5)) {
            return None;
        }
        if !rect.contains(self.end) {
            return Some(1.0);
        }
        let (mut lo, mut hi) = (0.5_f32, 1.0_f32);
        for _ in 0..16 {
            let mid = (lo + hi) / 2.0;
            if rect.contains(self.point_at(mid)) {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        Some(lo)
    }

    /// Arrow head `[left_barb, tip, right_barb]` at parameter `t`, pointing
    /// along the curve's direction of travel.
    pub fn arrow_head(&self, t: f32) -> [Point; 3] {
        let tip = self.point_at(t);
        // Derivative of the quadratic: 2(1-t)(C-S) + 2t(E-C)
        let dir = (self.control - self.start) * (1.0 - t) + (self.end - self.control) * t;
        let len = dir.length().max(f32::EPSILON);
        let back = -dir / len * ARROW_LEN;
        let rotate = |v: Point, a: f32| {
            let (s, c) = a.sin_cos();
            Point::new(v.x * c - v.y * s, v.x * s + v.y * c)
        };
        [
            tip + rotate(back, ARROW_SPREAD),
            tip,
            tip + rotate(back, -ARROW_SPREAD),
        ]
    }

    /// Minimum distance from `p` to the curve, sampled.
    pub fn distance_to(&self, p: Point) -> f32 {
        (0..=24)
            .map(|i| self.point_at(i as f32 / 24.0).distance(p))
            .fold(f32::MAX, f32::min)
    }

    pub fn to_bez_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(kpt(self.start));
        path.quad_to(kpt(self.control), kpt(self.end));
        path
    }
}

pub(crate) fn kpt(p: Point) -> kurbo::Point {
    kurbo::Point::new(p.x as f64, p.y as f64)
}
