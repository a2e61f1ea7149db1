//! World ↔ screen coordinate transforms.
//!
//! Nodes and connections live in an unbounded world space. The canvas shows
//! that space through a pan offset and a zoom factor:
//!
//! ```text
//! world  = (screen − origin − pan) / zoom
//! screen = world · zoom + pan + origin
//! ```
//!
//! `origin` is where the canvas surface sits inside the window. Pointer
//! events arrive in window coordinates, so every hit test and drag step
//! must go through these functions to behave at any pan/zoom.
//!
//! Zoom is clamped by the viewport controller before it reaches here; no
//! function in this module fails.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

// ─── Point / Size ────────────────────────────────────────────────────────

/// A 2D point or vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// 2D cross product (z component). Positive when `other` is clockwise
    /// of `self` in a y-down coordinate system.
    pub fn cross(self, other: Point) -> f32 {
        self.x * other.y - self.y * other.x
    }

    pub fn distance(self, other: Point) -> f32 {
        (other - self).length()
    }

    pub fn approx_eq(self, other: Point, eps: f32) -> bool {
        (self.x - other.x).abs() <= eps && (self.y - other.y).abs() <= eps
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;
    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Point {
    type Output = Point;
    fn div(self, rhs: f32) -> Point {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Point::new(x, y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

// ─── Rect ────────────────────────────────────────────────────────────────

/// Axis-aligned rectangle, `min` inclusive top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn max(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height)
    }

    /// Smallest rect covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max = self.max();
        let other_max = other.max();
        Rect::new(
            min_x,
            min_y,
            max.x.max(other_max.x) - min_x,
            max.y.max(other_max.y) - min_y,
        )
    }

    /// Grow on every side by `pad`.
    pub fn inflate(&self, pad: f32) -> Rect {
        Rect::new(
            self.x - pad,
            self.y - pad,
            self.width + pad * 2.0,
            self.height + pad * 2.0,
        )
    }

    /// Bounding box of fixed-size boxes anchored at each top-left position.
    /// Returns `None` for an empty iterator.
    pub fn bounding_boxes(positions: impl IntoIterator<Item = Point>, size: Size) -> Option<Rect> {
        positions
            .into_iter()
            .map(|p| Rect::from_origin_size(p, size))
            .reduce(|acc, r| acc.union(&r))
    }
}

// ─── Transform ───────────────────────────────────────────────────────────

/// Screen point → world point for a canvas at the window origin.
pub fn to_world(screen: Point, pan: Point, zoom: f32) -> Point {
    (screen - pan) / zoom
}

/// World point → screen point for a canvas at the window origin.
pub fn to_screen(world: Point, pan: Point, zoom: f32) -> Point {
    world * zoom + pan
}

/// The full view transform of a canvas surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// Top-left of the canvas surface in window coordinates.
    pub origin: Point,
    /// Pan offset in screen pixels.
    pub pan: Point,
    pub zoom: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            origin: Point::ZERO,
            pan: Point::ZERO,
            zoom: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn to_world(&self, screen: Point) -> Point {
        to_world(screen - self.origin, self.pan, self.zoom)
    }

    pub fn to_screen(&self, world: Point) -> Point {
        to_screen(world, self.pan, self.zoom) + self.origin
    }

    /// A pointer delta in screen pixels expressed in world units.
    /// Independent of pan and origin.
    pub fn screen_delta_to_world(&self, delta: Point) -> Point {
        delta / self.zoom
    }
}
