//! The interactive mind-map canvas.
//!
//! `MindMapCanvas` owns the editing session: the working copy of nodes and
//! connections, the drag/pan controller, the viewport, the selection, the
//! queue of pending store writes and the notifications for the host.
//!
//! Edits land in the working copy first and are authoritative immediately.
//! Nothing here awaits: the host drains `take_commands` into
//! [`store::flush`] and feeds the failures back through `report`, so drags
//! and pans keep working while a save or an AI-enhance call is pending.
//! Failed writes are never rolled back.

use crate::entity_editor::EntityEditor;
use crate::error::EditorError;
use crate::input::InputEvent;
use crate::interaction::{InteractionController, InteractionOutcome, NodeHit};
use crate::notify::Notification;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::store::{self, StoreCommand};
use crate::viewport::ViewportController;
use mm_core::config::CanvasConfig;
use mm_core::geometry::{Point, Size};
use mm_core::id::{ConnectionId, NodeId};
use mm_core::model::{Connection, Node, NodePatch, NodeType};
use mm_core::visibility::{self, Visibility};
use mm_render::{FrameInput, RenderFrame, build_frame, hit_test};
use smallvec::SmallVec;

/// What changed in response to an input event or shortcut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasEvent {
    SelectionChanged(Option<NodeId>),
    /// Plain click on empty canvas.
    CanvasClicked,
    /// Pan or zoom changed.
    ViewChanged,
    /// Ephemeral drag position changed (repaint only).
    NodeMoved { id: NodeId, position: Point },
    /// A drag ended and its position was queued for the store.
    PositionCommitted { id: NodeId, position: Point },
    CollapseToggled { id: NodeId, collapsed: bool },
    NodeRemoved(NodeId),
    PanModeChanged(bool),
}

pub type CanvasEvents = SmallVec<[CanvasEvent; 2]>;

pub struct MindMapCanvas {
    config: CanvasConfig,
    nodes: Vec<Node>,
    connections: Vec<Connection>,
    interaction: InteractionController,
    viewport: ViewportController,
    selected: Option<NodeId>,
    commands: Vec<StoreCommand>,
    notifications: Vec<Notification>,
}

impl MindMapCanvas {
    pub fn new(config: CanvasConfig, size: Size) -> Self {
        Self {
            viewport: ViewportController::new(&config, size),
            config,
            nodes: Vec::new(),
            connections: Vec::new(),
            interaction: InteractionController::new(),
            selected: None,
            commands: Vec::new(),
            notifications: Vec::new(),
        }
    }

    /// Replace the working copy. Any running gesture is dropped.
    pub fn load(&mut self, nodes: Vec<Node>, connections: Vec<Connection>) {
        self.interaction.cancel();
        self.nodes = nodes;
        self.connections = connections;
        if self.selected.is_some_and(|sel| self.node(sel).is_none()) {
            self.selected = None;
        }
        log::debug!(
            "canvas loaded: {} nodes, {} connections",
            self.nodes.len(),
            self.connections.len()
        );
    }

    /// Apply the outcome of [`store::load_all`]. On failure the current
    /// copy is kept and an error notification is queued.
    pub fn finish_load(
        &mut self,
        loaded: store::Result<(Vec<Node>, Vec<Connection>)>,
    ) -> Result<(), EditorError> {
        match loaded {
            Ok((nodes, connections)) => {
                self.load(nodes, connections);
                Ok(())
            }
            Err(e) => {
                log::warn!("loading mind map failed: {e}");
                self.notifications.push(Notification::error(format!("Could not load mind map: {e}")));
                Err(e.into())
            }
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, EditorError> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(EditorError::UnknownNode(id))
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn select(&mut self, id: Option<NodeId>) {
        self.selected = id.filter(|id| self.node(*id).is_some());
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    /// Host-side layout changes: canvas position in the window and size.
    pub fn set_bounds(&mut self, origin: Point, size: Size) {
        self.viewport.set_origin(origin);
        self.viewport.resize(size);
    }

    /// Ephemeral drag position, if a node is being dragged.
    pub fn current_drag(&self) -> Option<(NodeId, Point)> {
        self.interaction.current_drag()
    }

    /// Recomputed from the full working copy on every call.
    pub fn visibility(&self) -> Visibility {
        visibility::resolve(&self.nodes, &self.connections)
    }

    pub fn frame(&self) -> RenderFrame {
        let visibility = self.visibility();
        build_frame(&FrameInput {
            nodes: &self.nodes,
            connections: &self.connections,
            visibility: &visibility,
            drag: self.interaction.current_drag(),
            selected: self.selected,
            view: self.viewport.transform(),
            config: &self.config,
        })
    }

    // ─── Input ───────────────────────────────────────────────────────────

    pub fn handle_event(&mut self, event: &InputEvent) -> CanvasEvents {
        match event {
            InputEvent::Wheel { delta_y, modifiers, .. } => {
                let mut events = CanvasEvents::new();
                if self.viewport.wheel_zoom(*delta_y, *modifiers) {
                    events.push(CanvasEvent::ViewChanged);
                }
                events
            }
            InputEvent::Key { key, modifiers } => match ShortcutMap::resolve(key, *modifiers) {
                Some(action) => self.run_shortcut(action),
                None => CanvasEvents::new(),
            },
            _ => self.handle_pointer(event),
        }
    }

    fn handle_pointer(&mut self, event: &InputEvent) -> CanvasEvents {
        let view = self.viewport.transform();
        let hit = match (event, event.position()) {
            (InputEvent::PointerDown { .. }, Some(screen)) => hit_test(&self.frame(), view.to_world(screen))
                .and_then(|id| self.node(id))
                .map(|n| NodeHit {
                    id: n.id,
                    position: n.position(),
                }),
            _ => None,
        };

        let outcomes = self.interaction.handle(event, hit, &view);
        let mut events = CanvasEvents::new();
        for outcome in outcomes {
            match outcome {
                InteractionOutcome::Pan(pan) => {
                    self.viewport.set_pan(pan);
                    events.push(CanvasEvent::ViewChanged);
                }
                InteractionOutcome::NodeMoved { node_id, position } => {
                    events.push(CanvasEvent::NodeMoved { id: node_id, position });
                }
                InteractionOutcome::CommitPosition { node_id, position } => {
                    if self.commit_position(node_id, position) {
                        events.push(CanvasEvent::PositionCommitted { id: node_id, position });
                    }
                }
                InteractionOutcome::NodePressed(id) => {
                    if self.selected != Some(id) {
                        self.selected = Some(id);
                        events.push(CanvasEvent::SelectionChanged(Some(id)));
                    }
                }
                InteractionOutcome::CanvasClicked => {
                    events.push(CanvasEvent::CanvasClicked);
                    if self.selected.take().is_some() {
                        events.push(CanvasEvent::SelectionChanged(None));
                    }
                }
            }
        }
        events
    }

    fn commit_position(&mut self, id: NodeId, position: Point) -> bool {
        let Ok(node) = self.node_mut(id) else {
            log::debug!("dropping commit for removed node {id}");
            return false;
        };
        node.set_position(position);
        self.commands.push(StoreCommand::UpdatePosition {
            id,
            x: position.x,
            y: position.y,
        });
        true
    }

    pub fn run_shortcut(&mut self, action: ShortcutAction) -> CanvasEvents {
        let mut events = CanvasEvents::new();
        match action {
            ShortcutAction::ZoomIn => {
                self.zoom_in();
                events.push(CanvasEvent::ViewChanged);
            }
            ShortcutAction::ZoomOut => {
                self.zoom_out();
                events.push(CanvasEvent::ViewChanged);
            }
            ShortcutAction::ResetView => {
                self.reset_view();
                events.push(CanvasEvent::ViewChanged);
            }
            ShortcutAction::ToggleFit => {
                if self.toggle_fit() {
                    events.push(CanvasEvent::ViewChanged);
                }
            }
            ShortcutAction::TogglePanMode => {
                events.push(CanvasEvent::PanModeChanged(self.interaction.toggle_pan_mode()));
            }
            ShortcutAction::ToggleCollapse => {
                if let Some(id) = self.selected {
                    if let Ok(collapsed) = self.toggle_collapse(id) {
                        events.push(CanvasEvent::CollapseToggled { id, collapsed });
                    }
                }
            }
            ShortcutAction::DeleteSelected => {
                if let Some(id) = self.selected {
                    if self.remove_node(id).is_ok() {
                        events.push(CanvasEvent::NodeRemoved(id));
                        events.push(CanvasEvent::SelectionChanged(None));
                    }
                }
            }
            ShortcutAction::Deselect => {
                if self.selected.take().is_some() {
                    events.push(CanvasEvent::SelectionChanged(None));
                }
            }
        }
        events
    }

    // ─── View ────────────────────────────────────────────────────────────

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset_view();
    }

    fn positions(&self) -> Vec<Point> {
        self.nodes.iter().map(Node::position).collect()
    }

    pub fn fit_to_view(&mut self) -> bool {
        let positions = self.positions();
        self.viewport.fit_to_view(positions)
    }

    pub fn expand_view(&mut self) -> bool {
        let positions = self.positions();
        self.viewport.expand_view(positions)
    }

    pub fn toggle_fit(&mut self) -> bool {
        let positions = self.positions();
        self.viewport.toggle_fit(positions)
    }

    // ─── Editing ─────────────────────────────────────────────────────────

    /// Flip a node's collapsed flag. Returns the new state.
    pub fn toggle_collapse(&mut self, id: NodeId) -> Result<bool, EditorError> {
        let node = self.node_mut(id)?;
        node.is_collapsed = !node.is_collapsed;
        let collapsed = node.is_collapsed;
        self.commands.push(StoreCommand::UpdateNode {
            id,
            patch: NodePatch::collapsed(collapsed),
        });

        if collapsed && self.selected.is_some_and(|sel| !self.visibility().is_visible(sel)) {
            self.selected = None;
        }
        log::debug!("node {id} collapsed={collapsed}");
        Ok(collapsed)
    }

    pub fn add_node(&mut self, text: impl Into<String>, node_type: NodeType, position: Point) -> NodeId {
        let id = NodeId::generate("node");
        let node = Node::new(id, text, node_type).at(position.x, position.y);
        self.nodes.push(node.clone());
        self.commands.push(StoreCommand::CreateNode(node));
        id
    }

    /// Remove a node and every connection touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), EditorError> {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != id);
        if self.nodes.len() == before {
            return Err(EditorError::UnknownNode(id));
        }
        self.connections.retain(|c| !c.touches(id));
        if self.current_drag().is_some_and(|(drag, _)| drag == id) {
            self.interaction.cancel();
        }
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.commands.push(StoreCommand::DeleteNode(id));
        Ok(())
    }

    pub fn connect(&mut self, source: NodeId, target: NodeId) -> Result<ConnectionId, EditorError> {
        for id in [source, target] {
            if self.node(id).is_none() {
                return Err(EditorError::UnknownNode(id));
            }
        }
        let id = ConnectionId::generate("conn");
        let connection = Connection::new(id, source, target);
        self.connections.push(connection.clone());
        self.commands.push(StoreCommand::CreateConnection(connection));
        Ok(id)
    }

    pub fn disconnect(&mut self, id: ConnectionId) -> Result<(), EditorError> {
        let before = self.connections.len();
        self.connections.retain(|c| c.id != id);
        if self.connections.len() == before {
            return Err(EditorError::UnknownConnection(id));
        }
        self.commands.push(StoreCommand::DeleteConnection(id));
        Ok(())
    }

    /// Apply a partial update to the working copy and queue it.
    pub fn update_node(&mut self, id: NodeId, patch: NodePatch) -> Result<(), EditorError> {
        if patch.is_empty() {
            return Ok(());
        }
        patch.apply(self.node_mut(id)?);
        self.commands.push(StoreCommand::UpdateNode { id, patch });
        Ok(())
    }

    pub fn set_node_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), EditorError> {
        self.update_node(
            id,
            NodePatch {
                text: Some(text.into()),
                ..Default::default()
            },
        )
    }

    // ─── Entity editing ──────────────────────────────────────────────────

    pub fn open_entity_editor(&self, id: NodeId) -> Result<EntityEditor, EditorError> {
        let node = self.node(id).ok_or(EditorError::UnknownNode(id))?;
        let editor = EntityEditor::open(node)?;
        if editor.discarded_schema() {
            // Stays local: the dialog still opens.
            log::warn!("entity {id}: opened with an empty field list");
        }
        Ok(editor)
    }

    /// Names of every entity node other than `except`, for AI-enhance.
    pub fn entity_names(&self, except: NodeId) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| n.is_entity() && n.id != except)
            .map(|n| n.text.clone())
            .collect()
    }

    /// Persist what the entity editor holds.
    pub fn apply_entity_patch(&mut self, editor: &EntityEditor) -> Result<(), EditorError> {
        let id = editor.node_id();
        let node = self.node(id).ok_or(EditorError::UnknownNode(id))?;
        if !node.is_entity() {
            return Err(EditorError::NotAnEntity(id));
        }
        self.update_node(id, editor.save())
    }

    /// Surface a failed AI-enhance for `id`. The editor's fields are
    /// already untouched by then.
    pub fn enhance_failed(&mut self, id: NodeId, error: &EditorError) {
        log::warn!("AI enhance for {id} failed: {error}");
        self.notifications.push(Notification::error(format!("AI enhance failed: {error}")));
    }

    // ─── Store sync ──────────────────────────────────────────────────────

    /// Pending store writes, oldest first.
    pub fn pending_commands(&self) -> &[StoreCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<StoreCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    /// Queue notifications produced away from the canvas, such as the
    /// failures returned by [`store::flush`].
    pub fn report(&mut self, notifications: impl IntoIterator<Item = Notification>) {
        self.notifications.extend(notifications);
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }
}
