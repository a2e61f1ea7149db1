//! Hit testing: world point → node or connection.
//!
//! Works on a built `RenderFrame`, so ephemeral drag positions and hidden
//! subtrees are already accounted for. Callers convert the pointer to world
//! space first (`ViewTransform::to_world`).

use crate::frame::RenderFrame;
use mm_core::geometry::Point;
use mm_core::id::{ConnectionId, NodeId};

/// Topmost node at `world`. Later sprites paint over earlier ones, so the
/// list is walked back to front.
pub fn hit_test(frame: &RenderFrame, world: Point) -> Option<NodeId> {
    frame
        .nodes
        .iter()
        .rev()
        .find(|n| n.bounds.contains(world))
        .map(|n| n.id)
}

/// Closest connection within `tolerance` world units of `world`. Nodes win
/// over connections; call `hit_test` first.
pub fn hit_test_connection(frame: &RenderFrame, world: Point, tolerance: f32) -> Option<ConnectionId> {
    frame
        .connections
        .iter()
        .map(|c| (c.id, c.curve.distance_to(world)))
        .filter(|(_, d)| *d <= tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}
