//! Mind-map data model.
//!
//! Nodes and connections are owned by an external store. The canvas keeps a
//! working copy for the editing session and pushes position/collapse changes
//! back through explicit update calls. Entity schemas are carried as raw
//! JSON so an unparsable schema survives loading untouched; only the entity
//! editor interprets it (see [`crate::schema`]).

use crate::geometry::Point;
use crate::id::{ConnectionId, NodeId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0], persisted as a hex string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0)
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA`. The `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let byte = |i: usize| -> Option<u8> { Some(hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?) };

        match bytes.len() {
            3 => {
                let r = hex_val(bytes[0])?;
                let g = hex_val(bytes[1])?;
                let b = hex_val(bytes[2])?;
                Some(Self::rgb8(r * 17, g * 17, b * 17))
            }
            6 => Some(Self::rgb8(byte(0)?, byte(2)?, byte(4)?)),
            8 => {
                let mut c = Self::rgb8(byte(0)?, byte(2)?, byte(4)?);
                c.a = byte(6)? as f32 / 255.0;
                Some(c)
            }
            _ => None,
        }
    }

    /// Emit `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid color `{s}`")))
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// What a node represents on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Central,
    MainBranch,
    #[default]
    SubBranch,
    Feature,
    Entity,
    Page,
    Note,
}

impl NodeType {
    pub const ALL: [NodeType; 7] = [
        NodeType::Central,
        NodeType::MainBranch,
        NodeType::SubBranch,
        NodeType::Feature,
        NodeType::Entity,
        NodeType::Page,
        NodeType::Note,
    ];

    /// Fill used when a node carries no explicit color.
    pub fn default_color(self) -> Color {
        match self {
            NodeType::Central => Color::rgb8(0x6C, 0x5C, 0xE7),
            NodeType::MainBranch => Color::rgb8(0x00, 0x84, 0xFF),
            NodeType::SubBranch => Color::rgb8(0x00, 0xB8, 0x94),
            NodeType::Feature => Color::rgb8(0xFD, 0xCB, 0x6E),
            NodeType::Entity => Color::rgb8(0xE1, 0x70, 0x55),
            NodeType::Page => Color::rgb8(0x74, 0xB9, 0xFF),
            NodeType::Note => Color::rgb8(0xB2, 0xBE, 0xC3),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Central => "central",
            NodeType::MainBranch => "main_branch",
            NodeType::SubBranch => "sub_branch",
            NodeType::Feature => "feature",
            NodeType::Entity => "entity",
            NodeType::Page => "page",
            NodeType::Note => "note",
        }
    }
}

/// A single node on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub text: String,
    pub node_type: NodeType,
    /// World-space top-left. Unbounded.
    #[serde(default)]
    pub position_x: f32,
    #[serde(default)]
    pub position_y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default)]
    pub is_collapsed: bool,
    /// Persisted entity schema. Only meaningful on `entity` nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_schema: Option<serde_json::Value>,
    /// Relationships derived from the schema fields, persisted redundantly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_relationships: Option<serde_json::Value>,
}

impl Node {
    pub fn new(id: NodeId, text: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id,
            text: text.into(),
            node_type,
            position_x: 0.0,
            position_y: 0.0,
            color: None,
            is_collapsed: false,
            entity_schema: None,
            entity_relationships: None,
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position_x = x;
        self.position_y = y;
        self
    }

    pub fn position(&self) -> Point {
        Point::new(self.position_x, self.position_y)
    }

    pub fn set_position(&mut self, p: Point) {
        self.position_x = p.x;
        self.position_y = p.y;
    }

    pub fn is_entity(&self) -> bool {
        self.node_type == NodeType::Entity
    }

    pub fn effective_color(&self) -> Color {
        self.color.unwrap_or_else(|| self.node_type.default_color())
    }

    /// Attach a schema. Refused (returns `false`) on non-entity nodes.
    pub fn set_entity_schema(
        &mut self,
        schema: serde_json::Value,
        relationships: serde_json::Value,
    ) -> bool {
        if !self.is_entity() {
            log::warn!("refusing entity schema on {} node {}", self.node_type.as_str(), self.id);
            return false;
        }
        self.entity_schema = Some(schema);
        self.entity_relationships = Some(relationships);
        true
    }
}

/// Partial node update, the payload of the store's `update_node`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeType>,
    /// `Some(None)` clears the color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Option<Color>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_collapsed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_schema: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_relationships: Option<serde_json::Value>,
}

impl NodePatch {
    pub fn collapsed(is_collapsed: bool) -> Self {
        Self {
            is_collapsed: Some(is_collapsed),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply to a node. A type change away from `entity` drops the schema;
    /// a schema on a non-entity node is ignored.
    pub fn apply(&self, node: &mut Node) {
        if let Some(text) = &self.text {
            node.text = text.clone();
        }
        if let Some(node_type) = self.node_type {
            node.node_type = node_type;
            if node_type != NodeType::Entity {
                node.entity_schema = None;
                node.entity_relationships = None;
            }
        }
        if let Some(color) = self.color {
            node.color = color;
        }
        if let Some(collapsed) = self.is_collapsed {
            node.is_collapsed = collapsed;
        }
        if node.is_entity() {
            if let Some(schema) = &self.entity_schema {
                node.entity_schema = Some(schema.clone());
            }
            if let Some(rels) = &self.entity_relationships {
                node.entity_relationships = Some(rels.clone());
            }
        }
    }
}

// ─── Connections ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStyle {
    #[default]
    Solid,
    Dashed,
}

/// A directed edge between two nodes. Both endpoints must resolve to
/// existing nodes to render; dangling connections are skipped silently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub source_node_id: NodeId,
    pub target_node_id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default)]
    pub style: ConnectionStyle,
}

impl Connection {
    pub fn new(id: ConnectionId, source: NodeId, target: NodeId) -> Self {
        Self {
            id,
            source_node_id: source,
            target_node_id: target,
            label: None,
            color: None,
            style: ConnectionStyle::Solid,
        }
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.source_node_id == node || self.target_node_id == node
    }
}
