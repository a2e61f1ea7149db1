//! Render frame → Vello drawing commands.
//!
//! Everything is painted in world coordinates under one affine built from
//! the frame's `ViewTransform`, so nodes and connections can never drift
//! apart at any pan/zoom.

use crate::connection::kpt;
use crate::frame::{ConnectionSprite, NodeSprite, RenderFrame};
use kurbo::{Affine, BezPath, Circle, Rect as KurboRect, Stroke};
use mm_core::geometry::ViewTransform;
use peniko::{Color, Fill};
use vello::Scene;

const CORNER_RADIUS: f64 = 8.0;
const BADGE_RADIUS: f64 = 9.0;

/// Colors used for canvas chrome (background, selection, badges).
#[derive(Debug, Clone, Copy)]
pub struct PaintTheme {
    pub background: Color,
    pub node_border: Color,
    pub selection: Color,
    pub drag_shadow: Color,
    pub badge: Color,
}

impl PaintTheme {
    pub fn light() -> Self {
        Self {
            background: Color::from_rgba8(250, 250, 252, 255),
            node_border: Color::from_rgba8(0, 0, 0, 40),
            selection: Color::from_rgba8(0, 132, 255, 255),
            drag_shadow: Color::from_rgba8(0, 0, 0, 30),
            badge: Color::from_rgba8(60, 60, 67, 230),
        }
    }

    pub fn dark() -> Self {
        Self {
            background: Color::from_rgba8(28, 28, 30, 255),
            node_border: Color::from_rgba8(255, 255, 255, 40),
            selection: Color::from_rgba8(10, 132, 255, 255),
            drag_shadow: Color::from_rgba8(0, 0, 0, 90),
            badge: Color::from_rgba8(235, 235, 245, 230),
        }
    }
}

impl Default for PaintTheme {
    fn default() -> Self {
        Self::light()
    }
}

/// World → screen affine for a view: `screen = world · zoom + pan + origin`.
pub fn view_affine(view: &ViewTransform) -> Affine {
    let offset = view.origin + view.pan;
    Affine::translate((offset.x as f64, offset.y as f64)) * Affine::scale(view.zoom as f64)
}

/// Paint a whole frame. Call once per frame with a freshly-reset `Scene`.
/// `viewport` is the canvas surface size in screen pixels.
pub fn paint_frame(scene: &mut Scene, frame: &RenderFrame, theme: &PaintTheme, viewport: (f32, f32)) {
    let o = frame.view.origin;
    let bg = KurboRect::new(
        o.x as f64,
        o.y as f64,
        (o.x + viewport.0) as f64,
        (o.y + viewport.1) as f64,
    );
    scene.fill(Fill::NonZero, Affine::IDENTITY, theme.background, None, &bg);

    let xf = view_affine(&frame.view);
    for conn in &frame.connections {
        paint_connection(scene, xf, conn);
    }
    for node in &frame.nodes {
        paint_node(scene, xf, node, theme);
    }
}

// ─── Connections ─────────────────────────────────────────────────────────

fn paint_connection(scene: &mut Scene, xf: Affine, conn: &ConnectionSprite) {
    let color = to_peniko(conn.color);
    let stroke = match conn.style {
        mm_core::model::ConnectionStyle::Solid => Stroke::new(2.0),
        mm_core::model::ConnectionStyle::Dashed => Stroke::new(2.0).with_dashes(0.0, [6.0, 4.0]),
    };
    scene.stroke(&stroke, xf, color, None, &conn.curve.to_bez_path());

    if let Some([l, tip, r]) = conn.arrow {
        let mut head = BezPath::new();
        head.move_to(kpt(l));
        head.line_to(kpt(tip));
        head.line_to(kpt(r));
        head.close_path();
        scene.fill(Fill::NonZero, xf, color, None, &head);
    }

    if let Some(label) = &conn.label {
        let at = conn.curve.label_anchor();
        log::trace!("LABEL @{} {:?} at ({}, {})", conn.id, label, at.x, at.y);
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

fn paint_node(scene: &mut Scene, xf: Affine, node: &NodeSprite, theme: &PaintTheme) {
    let b = node.bounds;
    let rect = KurboRect::new(
        b.x as f64,
        b.y as f64,
        (b.x + b.width) as f64,
        (b.y + b.height) as f64,
    );
    let shape = rect.to_rounded_rect(CORNER_RADIUS);

    if node.dragging {
        let shadow = (rect + kurbo::Vec2::new(3.0, 4.0)).to_rounded_rect(CORNER_RADIUS);
        scene.fill(Fill::NonZero, xf, theme.drag_shadow, None, &shadow);
    }

    scene.fill(Fill::NonZero, xf, to_peniko(node.color), None, &shape);
    let (border, width) = if node.selected {
        (theme.selection, 2.5)
    } else {
        (theme.node_border, 1.0)
    };
    scene.stroke(&Stroke::new(width), xf, border, None, &shape);

    // Text shaping needs a font context; the host draws labels for now.
    log::trace!("TEXT @{} {:?} at ({}, {})", node.id, node.text, b.x, b.y);

    if node.hidden_children > 0 {
        let badge = Circle::new((rect.x1, rect.y1), BADGE_RADIUS);
        scene.fill(Fill::NonZero, xf, theme.badge, None, &badge);
        log::trace!("BADGE @{} +{}", node.id, node.hidden_children);
    }
}

fn to_peniko(c: mm_core::model::Color) -> Color {
    let [r, g, b, a] = c.to_rgba8();
    Color::from_rgba8(r, g, b, a)
}
