//! Render frame assembly: working copy → display list.
//!
//! A `RenderFrame` is everything a painter needs for one frame, in world
//! coordinates, plus the single `ViewTransform` that maps the whole frame to
//! the screen. Nodes and connections therefore always share one
//! transformed space.
//!
//! Connections come first in paint order so nodes cover their endpoints.

use crate::connection::{ConnectionCurve, curve_between};
use mm_core::config::CanvasConfig;
use mm_core::geometry::{Point, Rect, ViewTransform};
use mm_core::id::{ConnectionId, NodeId};
use mm_core::model::{Color, Connection, ConnectionStyle, Node, NodeType};
use mm_core::visibility::Visibility;
use std::collections::HashMap;

/// Stroke color for connections without their own.
pub const DEFAULT_CONNECTION_COLOR: Color = Color::rgba(0.55, 0.58, 0.62, 1.0);

#[derive(Debug, Clone, PartialEq)]
pub struct NodeSprite {
    pub id: NodeId,
    pub text: String,
    pub node_type: NodeType,
    /// World-space box, at the ephemeral drag position if being dragged.
    pub bounds: Rect,
    pub color: Color,
    pub selected: bool,
    pub dragging: bool,
    /// Descendants hidden by this node's collapse. Zero hides the badge.
    pub hidden_children: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSprite {
    pub id: ConnectionId,
    pub curve: ConnectionCurve,
    pub style: ConnectionStyle,
    pub color: Color,
    pub label: Option<String>,
    /// `[left, tip, right]` where the curve meets the target box.
    pub arrow: Option<[Point; 3]>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderFrame {
    pub view: ViewTransform,
    pub connections: Vec<ConnectionSprite>,
    pub nodes: Vec<NodeSprite>,
}

impl RenderFrame {
    pub fn node(&self, id: NodeId) -> Option<&NodeSprite> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&ConnectionSprite> {
        self.connections.iter().find(|c| c.id == id)
    }
}

/// Everything `build_frame` reads.
pub struct FrameInput<'a> {
    pub nodes: &'a [Node],
    pub connections: &'a [Connection],
    pub visibility: &'a Visibility,
    /// Ephemeral position of the node being dragged, overriding its stored one.
    pub drag: Option<(NodeId, Point)>,
    pub selected: Option<NodeId>,
    pub view: ViewTransform,
    pub config: &'a CanvasConfig,
}

pub fn build_frame(input: &FrameInput<'_>) -> RenderFrame {
    let size = input.config.node_size;

    let mut boxes: HashMap<NodeId, Rect> = HashMap::with_capacity(input.nodes.len());
    let mut nodes = Vec::with_capacity(input.nodes.len());
    for node in input.nodes {
        if !input.visibility.is_visible(node.id) {
            continue;
        }
        let (origin, dragging) = match input.drag {
            Some((id, pos)) if id == node.id => (pos, true),
            _ => (node.position(), false),
        };
        let bounds = Rect::from_origin_size(origin, size);
        boxes.insert(node.id, bounds);
        nodes.push(NodeSprite {
            id: node.id,
            text: node.text.clone(),
            node_type: node.node_type,
            bounds,
            color: node.effective_color(),
            selected: input.selected == Some(node.id),
            dragging,
            hidden_children: input.visibility.hidden_child_count(node.id),
        });
    }

    let connections = input
        .connections
        .iter()
        .filter_map(|conn| {
            // Unresolved or hidden endpoints: simply not drawn.
            let src = boxes.get(&conn.source_node_id)?;
            let dst = boxes.get(&conn.target_node_id)?;
            let curve = curve_between(src.center(), dst.center(), input.config.curvature)?;
            let arrow = curve.exit_t(dst).map(|t| curve.arrow_head(t));
            Some(ConnectionSprite {
                id: conn.id,
                curve,
                style: conn.style,
                color: conn.color.unwrap_or(DEFAULT_CONNECTION_COLOR),
                label: conn.label.clone(),
                arrow,
            })
        })
        .collect();

    log::trace!("frame built: {} nodes", nodes.len());

    RenderFrame {
        view: input.view,
        connections,
        nodes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_core::visibility;
    use pretty_assertions::assert_eq;

    fn sample() -> (Vec<Node>, Vec<Connection>) {
        let nodes = vec![
            Node::new(NodeId::intern("fr_a"), "A", NodeType::Central),
            Node::new(NodeId::intern("fr_b"), "B", NodeType::MainBranch).at(200.0, 0.0),
        ];
        let mut conn = Connection::new(
            ConnectionId::intern("fr_ab"),
            NodeId::intern("fr_a"),
            NodeId::intern("fr_b"),
        );
        conn.style = ConnectionStyle::Dashed;
        let dangling = Connection::new(
            ConnectionId::intern("fr_dangling"),
            NodeId::intern("fr_a"),
            NodeId::intern("fr_nowhere"),
        );
        (nodes, vec![conn, dangling])
    }

    #[test]
    fn dangling_connections_are_not_rendered() {
        let (nodes, conns) = sample();
        let vis = visibility::resolve(&nodes, &conns);
        let config = CanvasConfig::default();
        let frame = build_frame(&FrameInput {
            nodes: &nodes,
            connections: &conns,
            visibility: &vis,
            drag: None,
            selected: None,
            view: ViewTransform::default(),
            config: &config,
        });
        assert_eq!(frame.nodes.len(), 2);
        assert_eq!(frame.connections.len(), 1);
        let c = &frame.connections[0];
        assert_eq!(c.style, ConnectionStyle::Dashed);
        assert_eq!(c.curve.start, Point::new(80.0, 25.0));
        assert_eq!(c.curve.end, Point::new(280.0, 25.0));
        assert!(c.arrow.is_some());
    }

    #[test]
    fn drag_override_moves_node_and_its_connections() {
        let (nodes, conns) = sample();
        let vis = visibility::resolve(&nodes, &conns);
        let config = CanvasConfig::default();
        let frame = build_frame(&FrameInput {
            nodes: &nodes,
            connections: &conns,
            visibility: &vis,
            drag: Some((NodeId::intern("fr_b"), Point::new(300.0, 100.0))),
            selected: Some(NodeId::intern("fr_a")),
            view: ViewTransform::default(),
            config: &config,
        });
        let b = frame.node(NodeId::intern("fr_b")).unwrap();
        assert!(b.dragging);
        assert_eq!(b.bounds.x, 300.0);
        assert!(frame.node(NodeId::intern("fr_a")).unwrap().selected);
        assert_eq!(frame.connections[0].curve.end, Point::new(380.0, 125.0));
        // stored position untouched
        assert_eq!(nodes[1].position(), Point::new(200.0, 0.0));
    }

    #[test]
    fn collapsed_parent_hides_child_and_edge() {
        let (mut nodes, conns) = sample();
        nodes[0].is_collapsed = true;
        let vis = visibility::resolve(&nodes, &conns);
        let config = CanvasConfig::default();
        let frame = build_frame(&FrameInput {
            nodes: &nodes,
            connections: &conns,
            visibility: &vis,
            drag: None,
            selected: None,
            view: ViewTransform::default(),
            config: &config,
        });
        assert_eq!(
            frame.nodes,
            vec![NodeSprite {
                id: NodeId::intern("fr_a"),
                text: "A".into(),
                node_type: NodeType::Central,
                bounds: Rect::new(0.0, 0.0, 160.0, 50.0),
                color: NodeType::Central.default_color(),
                selected: false,
                dragging: false,
                hidden_children: 1,
            }]
        );
        assert!(frame.connections.is_empty());
    }
}
