//! Backing store interface for nodes and connections.
//!
//! The canvas never talks to the store inline with event handling. Edits
//! are applied to the working copy immediately and queued as
//! [`StoreCommand`]s; the host drains the queue and hands it to [`flush`]
//! without holding the canvas. A failed command is reported, not retried, and
//! the working copy is not rolled back.

use crate::error::StoreError;
use crate::notify::Notification;
use async_trait::async_trait;
use mm_core::id::{ConnectionId, NodeId};
use mm_core::model::{Connection, Node, NodePatch};
use std::collections::HashSet;
use std::sync::RwLock;

pub type Result<T> = std::result::Result<T, StoreError>;

/// CRUD surface of the node/connection store.
#[async_trait]
pub trait MindMapStore: Send + Sync {
    async fn list_nodes(&self) -> Result<Vec<Node>>;

    async fn list_connections(&self) -> Result<Vec<Connection>>;

    async fn update_position(&self, id: NodeId, x: f32, y: f32) -> Result<()>;

    async fn update_node(&self, id: NodeId, patch: NodePatch) -> Result<()>;

    async fn create_node(&self, node: Node) -> Result<()>;

    /// Deleting a node also deletes the connections touching it.
    async fn delete_node(&self, id: NodeId) -> Result<()>;

    async fn create_connection(&self, connection: Connection) -> Result<()>;

    async fn delete_connection(&self, id: ConnectionId) -> Result<()>;
}

// ─── Command queue ───────────────────────────────────────────────────────

/// A pending store write produced by the canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCommand {
    UpdatePosition { id: NodeId, x: f32, y: f32 },
    UpdateNode { id: NodeId, patch: NodePatch },
    CreateNode(Node),
    DeleteNode(NodeId),
    CreateConnection(Connection),
    DeleteConnection(ConnectionId),
}

impl StoreCommand {
    pub async fn dispatch(self, store: &dyn MindMapStore) -> Result<()> {
        match self {
            StoreCommand::UpdatePosition { id, x, y } => store.update_position(id, x, y).await,
            StoreCommand::UpdateNode { id, patch } => store.update_node(id, patch).await,
            StoreCommand::CreateNode(node) => store.create_node(node).await,
            StoreCommand::DeleteNode(id) => store.delete_node(id).await,
            StoreCommand::CreateConnection(conn) => store.create_connection(conn).await,
            StoreCommand::DeleteConnection(id) => store.delete_connection(id).await,
        }
    }

    /// Short label for notifications and logs.
    pub fn describe(&self) -> String {
        match self {
            StoreCommand::UpdatePosition { id, .. } => format!("move {id}"),
            StoreCommand::UpdateNode { id, .. } => format!("update {id}"),
            StoreCommand::CreateNode(node) => format!("create {}", node.id),
            StoreCommand::DeleteNode(id) => format!("delete {id}"),
            StoreCommand::CreateConnection(conn) => format!("connect {}", conn.id),
            StoreCommand::DeleteConnection(id) => format!("disconnect {id}"),
        }
    }
}

// ─── In-memory store ─────────────────────────────────────────────────────

#[derive(Default)]
struct Tables {
    nodes: Vec<Node>,
    connections: Vec<Connection>,
}

/// Store kept in process memory. Preserves insertion order on `list_*`.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(nodes: Vec<Node>, connections: Vec<Connection>) -> Self {
        Self {
            tables: RwLock::new(Tables { nodes, connections }),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| StoreError::backend("store lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| StoreError::backend("store lock poisoned"))
    }

    fn node_mut(tables: &mut Tables, id: NodeId) -> Result<&mut Node> {
        tables
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(StoreError::NodeNotFound(id))
    }
}

#[async_trait]
impl MindMapStore for InMemoryStore {
    async fn list_nodes(&self) -> Result<Vec<Node>> {
        Ok(self.read()?.nodes.clone())
    }

    async fn list_connections(&self) -> Result<Vec<Connection>> {
        Ok(self.read()?.connections.clone())
    }

    async fn update_position(&self, id: NodeId, x: f32, y: f32) -> Result<()> {
        let mut tables = self.write()?;
        let node = Self::node_mut(&mut tables, id)?;
        node.position_x = x;
        node.position_y = y;
        Ok(())
    }

    async fn update_node(&self, id: NodeId, patch: NodePatch) -> Result<()> {
        let mut tables = self.write()?;
        patch.apply(Self::node_mut(&mut tables, id)?);
        Ok(())
    }

    async fn create_node(&self, node: Node) -> Result<()> {
        let mut tables = self.write()?;
        if tables.nodes.iter().any(|n| n.id == node.id) {
            return Err(StoreError::Duplicate(node.id.to_string()));
        }
        tables.nodes.push(node);
        Ok(())
    }

    async fn delete_node(&self, id: NodeId) -> Result<()> {
        let mut tables = self.write()?;
        let before = tables.nodes.len();
        tables.nodes.retain(|n| n.id != id);
        if tables.nodes.len() == before {
            return Err(StoreError::NodeNotFound(id));
        }
        tables.connections.retain(|c| !c.touches(id));
        Ok(())
    }

    async fn create_connection(&self, connection: Connection) -> Result<()> {
        let mut tables = self.write()?;
        if tables.connections.iter().any(|c| c.id == connection.id) {
            return Err(StoreError::Duplicate(connection.id.to_string()));
        }
        tables.connections.push(connection);
        Ok(())
    }

    async fn delete_connection(&self, id: ConnectionId) -> Result<()> {
        let mut tables = self.write()?;
        let before = tables.connections.len();
        tables.connections.retain(|c| c.id != id);
        if tables.connections.len() == before {
            return Err(StoreError::ConnectionNotFound(id));
        }
        Ok(())
    }
}

/// Fetch both lists, as done when (re)loading the canvas.
pub async fn load_all(store: &dyn MindMapStore) -> Result<(Vec<Node>, Vec<Connection>)> {
    let nodes = store.list_nodes().await?;
    let connections = store.list_connections().await?;
    let ids: HashSet<NodeId> = nodes.iter().map(|n| n.id).collect();
    let dangling = connections
        .iter()
        .filter(|c| !ids.contains(&c.source_node_id) || !ids.contains(&c.target_node_id))
        .count();
    if dangling > 0 {
        log::debug!("loaded {dangling} connections with missing endpoints");
    }
    Ok((nodes, connections))
}

/// Send `commands` to `store` in order. Failures are not retried; each one
/// becomes an error notification for the canvas.
///
/// Takes the drained queue rather than the canvas, so input keeps flowing
/// into the canvas while the writes are awaited.
pub async fn flush(store: &dyn MindMapStore, commands: Vec<StoreCommand>) -> Vec<Notification> {
    let mut failures = Vec::new();
    for command in commands {
        let what = command.describe();
        if let Err(e) = command.dispatch(store).await {
            log::warn!("store command `{what}` failed: {e}");
            failures.push(Notification::error(format!("Could not save ({what}): {e}")));
        }
    }
    failures
}
