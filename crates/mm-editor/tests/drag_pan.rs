//! Integration tests: drag/pan through the canvas (mm-editor ↔ mm-render).
//!
//! Pointer events go in as window coordinates; positions come out in world
//! space, at any pan and zoom.

use mm_core::*;
use mm_editor::input::{InputEvent, Modifiers, PointerButton};
use mm_editor::store::StoreCommand;
use mm_editor::{CanvasEvent, MindMapCanvas};
use pretty_assertions::assert_eq;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn canvas_with_node(x: f32, y: f32) -> MindMapCanvas {
    let mut canvas = MindMapCanvas::new(CanvasConfig::default(), Size::new(800.0, 600.0));
    canvas.load(
        vec![Node::new(NodeId::intern("dp_node"), "Node", NodeType::Feature).at(x, y)],
        Vec::new(),
    );
    canvas
}

fn middle(x: f32, y: f32, down: bool) -> InputEvent {
    if down {
        InputEvent::PointerDown {
            x,
            y,
            button: PointerButton::Middle,
            modifiers: Modifiers::NONE,
        }
    } else {
        InputEvent::PointerUp {
            x,
            y,
            button: PointerButton::Middle,
            modifiers: Modifiers::NONE,
        }
    }
}

/// Pan the canvas by a screen delta with a middle-button gesture.
fn pan_by(canvas: &mut MindMapCanvas, dx: f32, dy: f32) {
    canvas.handle_event(&middle(700.0, 500.0, true));
    canvas.handle_event(&InputEvent::moved(700.0 + dx, 500.0 + dy));
    canvas.handle_event(&middle(700.0 + dx, 500.0 + dy, false));
}

/// Screen point over the node's center.
fn grab_point(canvas: &MindMapCanvas) -> Point {
    let node = &canvas.nodes()[0];
    let center = Rect::from_origin_size(node.position(), canvas.config().node_size).center();
    canvas.viewport().transform().to_screen(center)
}

fn drag(canvas: &mut MindMapCanvas, from: Point, dx: f32, dy: f32) -> Vec<CanvasEvent> {
    let mut events = Vec::new();
    events.extend(canvas.handle_event(&InputEvent::down(from.x, from.y)));
    events.extend(canvas.handle_event(&InputEvent::moved(from.x + dx / 2.0, from.y + dy / 2.0)));
    events.extend(canvas.handle_event(&InputEvent::moved(from.x + dx, from.y + dy)));
    events.extend(canvas.handle_event(&InputEvent::up(from.x + dx, from.y + dy)));
    events
}

#[test]
fn drag_moves_by_screen_delta_over_zoom() {
    init_logs();
    // (zoom-in steps from 1.0, pan)
    let cases = [(0, (0.0, 0.0)), (3, (120.0, -40.0)), (10, (-300.0, 75.0)), (-7, (55.0, 260.0))];
    for (steps, (px, py)) in cases {
        let mut canvas = canvas_with_node(100.0, 100.0);
        for _ in 0..steps {
            canvas.zoom_in();
        }
        for _ in steps..0 {
            canvas.zoom_out();
        }
        pan_by(&mut canvas, px, py);
        let zoom = canvas.viewport().zoom();
        canvas.take_commands();

        let from = grab_point(&canvas);
        let (dx, dy) = (48.0, -30.0);
        drag(&mut canvas, from, dx, dy);

        let moved = canvas.nodes()[0].position();
        let expected = Point::new(100.0 + dx / zoom, 100.0 + dy / zoom);
        assert!(moved.approx_eq(expected, 1e-2), "zoom {zoom}: {moved:?} vs {expected:?}");

        let commands = canvas.take_commands();
        assert_eq!(commands.len(), 1, "zoom {zoom}");
        match &commands[0] {
            StoreCommand::UpdatePosition { id, x, y } => {
                assert_eq!(*id, NodeId::intern("dp_node"));
                assert!(Point::new(*x, *y).approx_eq(expected, 1e-2));
            }
            other => panic!("expected UpdatePosition, got {other:?}"),
        }
    }
}

#[test]
fn ephemeral_position_renders_until_release() {
    let mut canvas = canvas_with_node(0.0, 0.0);
    let from = grab_point(&canvas);
    canvas.handle_event(&InputEvent::down(from.x, from.y));
    let events = canvas.handle_event(&InputEvent::moved(from.x + 40.0, from.y));
    assert_eq!(
        events.as_slice(),
        &[CanvasEvent::NodeMoved {
            id: NodeId::intern("dp_node"),
            position: Point::new(40.0, 0.0),
        }]
    );

    // Stored position untouched, frame shows the drag.
    assert_eq!(canvas.nodes()[0].position(), Point::ZERO);
    let frame = canvas.frame();
    assert!(frame.nodes[0].dragging);
    assert_eq!(frame.nodes[0].bounds.x, 40.0);
    assert!(canvas.take_commands().is_empty());
}

#[test]
fn release_outside_canvas_still_commits() {
    let mut canvas = canvas_with_node(0.0, 0.0);
    canvas.set_bounds(Point::new(50.0, 80.0), Size::new(400.0, 300.0));
    let from = grab_point(&canvas);
    assert_eq!(from, Point::new(130.0, 105.0));

    canvas.handle_event(&InputEvent::down(from.x, from.y));
    canvas.handle_event(&InputEvent::moved(-200.0, 900.0));
    let events = canvas.handle_event(&InputEvent::up(-200.0, 900.0));

    let expected = Point::new(-330.0, 795.0);
    assert_eq!(
        events.as_slice(),
        &[CanvasEvent::PositionCommitted {
            id: NodeId::intern("dp_node"),
            position: expected,
        }]
    );
    assert_eq!(canvas.nodes()[0].position(), expected);
    assert!(canvas.interaction().is_idle());
}

#[test]
fn panning_never_commits() {
    let mut canvas = canvas_with_node(0.0, 0.0);
    pan_by(&mut canvas, 150.0, -20.0);
    assert_eq!(canvas.viewport().pan(), Point::new(150.0, -20.0));
    assert!(canvas.take_commands().is_empty());
    assert_eq!(canvas.nodes()[0].position(), Point::ZERO);

    // Modifier-press on empty canvas pans as well.
    canvas.handle_event(&InputEvent::PointerDown {
        x: 700.0,
        y: 500.0,
        button: PointerButton::Primary,
        modifiers: Modifiers::SHIFT,
    });
    canvas.handle_event(&InputEvent::moved(690.0, 500.0));
    canvas.handle_event(&InputEvent::up(690.0, 500.0));
    assert_eq!(canvas.viewport().pan(), Point::new(140.0, -20.0));
    assert!(canvas.take_commands().is_empty());
}

#[test]
fn pan_mode_turns_node_press_into_pan() {
    let mut canvas = canvas_with_node(0.0, 0.0);
    canvas.handle_event(&InputEvent::key("h", Modifiers::NONE));
    let from = grab_point(&canvas);
    let events = drag(&mut canvas, from, 25.0, 25.0);
    assert!(events.iter().all(|e| *e == CanvasEvent::ViewChanged));
    assert_eq!(canvas.nodes()[0].position(), Point::ZERO);
    assert_eq!(canvas.viewport().pan(), Point::new(25.0, 25.0));
}

#[test]
fn wheel_zoom_only_with_modifier() {
    let mut canvas = canvas_with_node(0.0, 0.0);
    let plain = InputEvent::Wheel {
        x: 10.0,
        y: 10.0,
        delta_y: -100.0,
        modifiers: Modifiers::NONE,
    };
    assert!(canvas.handle_event(&plain).is_empty());
    assert_eq!(canvas.viewport().zoom(), 1.0);

    let with_ctrl = InputEvent::Wheel {
        x: 10.0,
        y: 10.0,
        delta_y: -100.0,
        modifiers: Modifiers::CTRL,
    };
    assert_eq!(canvas.handle_event(&with_ctrl).as_slice(), &[CanvasEvent::ViewChanged]);
    assert_eq!(canvas.viewport().zoom(), 1.1);
}
