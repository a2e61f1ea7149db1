pub mod config;
pub mod geometry;
pub mod id;
pub mod model;
pub mod schema;
pub mod visibility;

pub use config::{CanvasConfig, ConfigError, ZoomConfig};
pub use geometry::{Point, Rect, Size, ViewTransform, to_screen, to_world};
pub use id::{ConnectionId, NodeId};
pub use model::*;
pub use schema::{EntitySchema, Field, FieldType, Relationship, RelationshipKind, SchemaError};
pub use visibility::{ChildIndex, Visibility};
