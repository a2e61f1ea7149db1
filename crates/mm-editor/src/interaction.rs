//! Drag/pan interaction state machine.
//!
//! One controller per canvas, owning the only piece of gesture state:
//!
//! ```text
//!            press on node                 move: pos = world − grab
//!   Idle ─────────────────────▶ DraggingNode ◀─┐
//!    ▲ ▲                          │  └─────────┘
//!    │ └──── release (commit) ────┘
//!    │
//!    │       middle / modifier / pan mode  move: pan = start_pan + Δscreen
//!    ├──────────────────────────▶ PanningViewport ◀─┐
//!    └──────── release ───────────┘        └────────┘
//! ```
//!
//! The dragged node id, its starting position and the grab offset are all
//! captured when the drag starts and live here until release, so a release
//! never depends on what was last rendered. Releases are accepted from
//! anywhere (the host listens on the window), and any release returns the
//! controller to `Idle`.

use crate::input::{InputEvent, Modifiers, PointerButton};
use mm_core::geometry::{Point, ViewTransform};
use mm_core::id::NodeId;
use smallvec::{SmallVec, smallvec};

/// Screen pixels a press may travel and still count as a click.
const CLICK_SLOP: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionState {
    Idle,
    DraggingNode {
        node_id: NodeId,
        /// `pointer_world − node_position` at press time.
        grab_offset: Point,
        /// Stored position when the drag started.
        origin_position: Point,
        /// Ephemeral position, authoritative for rendering until release.
        current: Point,
    },
    PanningViewport {
        start_screen: Point,
        start_pan: Point,
    },
}

/// The node under the pointer at press time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeHit {
    pub id: NodeId,
    /// Position the node is drawn at (its stored position).
    pub position: Point,
}

/// What the composition root should do in response to an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionOutcome {
    /// New pan offset, screen pixels.
    Pan(Point),
    /// Ephemeral drag position changed.
    NodeMoved { node_id: NodeId, position: Point },
    /// Drag released: persist this position.
    CommitPosition { node_id: NodeId, position: Point },
    /// Primary press landed on a node (selects it).
    NodePressed(NodeId),
    /// Plain click on empty canvas (clears selection).
    CanvasClicked,
}

pub type Outcomes = SmallVec<[InteractionOutcome; 2]>;

#[derive(Debug)]
pub struct InteractionController {
    state: InteractionState,
    pan_mode: bool,
    /// Screen point of a plain press on empty canvas, until it moves too far.
    click_candidate: Option<Point>,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self {
            state: InteractionState::Idle,
            pan_mode: false,
            click_candidate: None,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == InteractionState::Idle
    }

    pub fn pan_mode(&self) -> bool {
        self.pan_mode
    }

    pub fn set_pan_mode(&mut self, on: bool) {
        self.pan_mode = on;
    }

    pub fn toggle_pan_mode(&mut self) -> bool {
        self.pan_mode = !self.pan_mode;
        self.pan_mode
    }

    /// The node being dragged and its ephemeral position.
    pub fn current_drag(&self) -> Option<(NodeId, Point)> {
        match self.state {
            InteractionState::DraggingNode { node_id, current, .. } => Some((node_id, current)),
            _ => None,
        }
    }

    /// Drop any gesture without committing (e.g. the dragged node was deleted).
    pub fn cancel(&mut self) {
        if !self.is_idle() {
            log::debug!("interaction cancelled from {:?}", self.state);
        }
        self.state = InteractionState::Idle;
        self.click_candidate = None;
    }

    /// Feed one event. `hit` is the topmost visible node under the pointer,
    /// only consulted on press.
    pub fn handle(&mut self, event: &InputEvent, hit: Option<NodeHit>, view: &ViewTransform) -> Outcomes {
        match event {
            InputEvent::PointerDown {
                x,
                y,
                button,
                modifiers,
            } => self.press(Point::new(*x, *y), *button, *modifiers, hit, view),
            InputEvent::PointerMove { x, y, .. } => self.motion(Point::new(*x, *y), view),
            InputEvent::PointerUp { .. } => self.release(),
            InputEvent::Wheel { .. } | InputEvent::Key { .. } => SmallVec::new(),
        }
    }

    fn press(
        &mut self,
        screen: Point,
        button: PointerButton,
        modifiers: Modifiers,
        hit: Option<NodeHit>,
        view: &ViewTransform,
    ) -> Outcomes {
        self.click_candidate = None;
        if !self.is_idle() {
            // A second button while a gesture runs; the single state rules it out.
            return SmallVec::new();
        }

        let pans = match button {
            PointerButton::Middle => true,
            PointerButton::Primary => self.pan_mode || (hit.is_none() && modifiers.any()),
            PointerButton::Secondary => return SmallVec::new(),
        };
        if pans {
            self.state = InteractionState::PanningViewport {
                start_screen: screen,
                start_pan: view.pan,
            };
            log::debug!("pan start at ({}, {})", screen.x, screen.y);
            return SmallVec::new();
        }

        match hit {
            Some(node) => {
                let grab_offset = view.to_world(screen) - node.position;
                self.state = InteractionState::DraggingNode {
                    node_id: node.id,
                    grab_offset,
                    origin_position: node.position,
                    current: node.position,
                };
                log::debug!("drag start {}", node.id);
                smallvec![InteractionOutcome::NodePressed(node.id)]
            }
            None => {
                self.click_candidate = Some(screen);
                SmallVec::new()
            }
        }
    }

    fn motion(&mut self, screen: Point, view: &ViewTransform) -> Outcomes {
        match &mut self.state {
            InteractionState::DraggingNode {
                node_id,
                grab_offset,
                current,
                ..
            } => {
                *current = view.to_world(screen) - *grab_offset;
                smallvec![InteractionOutcome::NodeMoved {
                    node_id: *node_id,
                    position: *current,
                }]
            }
            InteractionState::PanningViewport {
                start_screen,
                start_pan,
            } => smallvec![InteractionOutcome::Pan(*start_pan + (screen - *start_screen))],
            InteractionState::Idle => {
                if self
                    .click_candidate
                    .is_some_and(|start| start.distance(screen) > CLICK_SLOP)
                {
                    self.click_candidate = None;
                }
                SmallVec::new()
            }
        }
    }

    fn release(&mut self) -> Outcomes {
        let previous = std::mem::replace(&mut self.state, InteractionState::Idle);
        let click = self.click_candidate.take();
        match previous {
            InteractionState::DraggingNode {
                node_id,
                origin_position,
                current,
                ..
            } => {
                log::debug!("drag end {node_id} at ({}, {})", current.x, current.y);
                if current == origin_position {
                    SmallVec::new()
                } else {
                    smallvec![InteractionOutcome::CommitPosition {
                        node_id,
                        position: current,
                    }]
                }
            }
            InteractionState::PanningViewport { .. } => {
                log::debug!("pan end");
                SmallVec::new()
            }
            InteractionState::Idle => match click {
                Some(_) => smallvec![InteractionOutcome::CanvasClicked],
                None => SmallVec::new(),
            },
        }
    }
}
