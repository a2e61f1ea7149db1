//! Entity schemas: flat field list ↔ persisted object schema.
//!
//! The entity editor works on a flat list of [`Field`]s. What gets persisted
//! on the node is an [`EntitySchema`]: a JSON-Schema-like object with
//! `properties`, `required` and a redundant list of [`Relationship`]s.
//!
//! Relationships are always foreign-key-like string ids, never nested
//! objects. In the persisted form a relationship is only recognizable by its
//! description, which reads exactly `Reference to <Entity>`. Recovering it
//! means matching that pattern, so a description edited away from it turns
//! the field back into a plain string. Conversely a plain field whose
//! description happens to match becomes a relationship on reload. Both are
//! known limitations of the persisted format.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

static RELATIONSHIP_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Reference to (\w+)").expect("static regex"));

const REFERENCE_PREFIX: &str = "Reference to ";

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Malformed entity schema: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Entity schema must be an object type, found `{0}`")]
    NotAnObject(String),
}

// ─── Editor-side fields ──────────────────────────────────────────────────

/// Field type as offered by the entity editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    #[default]
    String,
    Number,
    Boolean,
    Date,
    DateTime,
    Array,
    Object,
}

impl FieldType {
    pub const ALL: [FieldType; 7] = [
        FieldType::String,
        FieldType::Number,
        FieldType::Boolean,
        FieldType::Date,
        FieldType::DateTime,
        FieldType::Array,
        FieldType::Object,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::DateTime => "date-time",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }
}

/// One row of the entity editor. Transient: rebuilt from the schema when
/// the editor opens and flattened back on save.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub description: String,
    pub required: bool,
    /// Target entity name when this field references another entity.
    pub related_entity: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            ..Default::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn referencing(mut self, entity: impl Into<String>) -> Self {
        self.related_entity = Some(entity.into());
        self
    }

    pub fn is_relationship(&self) -> bool {
        self.related_entity.as_deref().is_some_and(|e| !e.trim().is_empty())
    }
}

// ─── Persisted schema ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    #[default]
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

/// A single property of an entity schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Property {
    #[serde(rename = "type", default)]
    pub property_type: PropertyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl Property {
    /// Target entity if the description carries the relationship marker.
    pub fn referenced_entity(&self) -> Option<&str> {
        RELATIONSHIP_MARKER
            .captures(&self.description)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }
}

/// Property map in field order. Inserting an existing name replaces the
/// entry in place.
pub type Properties = IndexMap<String, Property>;

/// Hand-edited schemas sometimes carry `null` where a string belongs.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn object_type() -> String {
    "object".to_string()
}

/// The structured schema persisted on an entity node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySchema {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(rename = "type", default = "object_type")]
    pub schema_type: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub required: Vec<String>,
}

impl EntitySchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema_type: object_type(),
            description: description.into(),
            properties: Properties::new(),
            required: Vec::new(),
        }
    }

    /// Parse a persisted schema. `required` entries naming no property are
    /// dropped so every remaining entry resolves.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, SchemaError> {
        let mut schema: EntitySchema = serde_json::from_value(value.clone())?;
        if schema.schema_type != "object" {
            return Err(SchemaError::NotAnObject(schema.schema_type));
        }
        let before = schema.required.len();
        let props = &schema.properties;
        schema.required.retain(|r| props.contains_key(r));
        if schema.required.len() != before {
            log::debug!(
                "schema {}: dropped {} dangling required entries",
                schema.name,
                before - schema.required.len()
            );
        }
        Ok(schema)
    }

    pub fn to_value(&self) -> serde_json::Value {
        // A struct of strings, vecs and string-keyed maps always serializes.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }
}

// ─── Relationships ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipKind {
    ManyToOne,
    OneToMany,
    ManyToMany,
}

/// A derived foreign-key-like link from one entity field to another entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub field: String,
    pub target_entity: String,
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
}

/// Relationships implied by a field list. Every reference field is stored
/// as a single string id, so the owning side is always many-to-one.
pub fn derive_relationships(fields: &[Field]) -> Vec<Relationship> {
    fields
        .iter()
        .filter(|f| !f.name.trim().is_empty() && f.is_relationship())
        .filter_map(|f| {
            let target = f.related_entity.as_deref()?.trim();
            Some(Relationship {
                field: f.name.trim().to_string(),
                target_entity: target.to_string(),
                kind: RelationshipKind::ManyToOne,
            })
        })
        .collect()
}

/// Parse persisted relationships, empty on anything malformed.
pub fn relationships_from_value(value: Option<&serde_json::Value>) -> Vec<Relationship> {
    let Some(value) = value else {
        return Vec::new();
    };
    serde_json::from_value(value.clone()).unwrap_or_else(|e| {
        log::warn!("discarding malformed entity relationships: {e}");
        Vec::new()
    })
}

pub fn relationships_to_value(relationships: &[Relationship]) -> serde_json::Value {
    serde_json::to_value(relationships).unwrap_or(serde_json::Value::Array(Vec::new()))
}

// ─── Conversion ──────────────────────────────────────────────────────────

/// Flatten editor fields into a persisted schema.
///
/// Relationship fields become `type: "string"` with the description
/// `Reference to <Entity>`. Date and date-time fields become strings with a
/// `format`. Blank names are skipped; a repeated name replaces the earlier
/// property in place.
pub fn fields_to_schema(name: &str, description: &str, fields: &[Field]) -> EntitySchema {
    let mut schema = EntitySchema::new(name, description);

    for field in fields {
        let field_name = field.name.trim();
        if field_name.is_empty() {
            log::debug!("schema {name}: skipping unnamed field");
            continue;
        }

        let property = match (&field.related_entity, field.field_type) {
            (Some(entity), _) if field.is_relationship() => Property {
                property_type: PropertyType::String,
                description: format!("{REFERENCE_PREFIX}{}", entity.trim()),
                ..Default::default()
            },
            (_, FieldType::Date | FieldType::DateTime) => Property {
                property_type: PropertyType::String,
                format: Some(field.field_type.as_str().to_string()),
                description: field.description.clone(),
                ..Default::default()
            },
            (_, ft) => Property {
                property_type: match ft {
                    FieldType::Number => PropertyType::Number,
                    FieldType::Boolean => PropertyType::Boolean,
                    FieldType::Array => PropertyType::Array,
                    FieldType::Object => PropertyType::Object,
                    _ => PropertyType::String,
                },
                description: field.description.clone(),
                ..Default::default()
            },
        };

        schema.properties.insert(field_name.to_string(), property);
        schema.required.retain(|r| r != field_name);
        if field.required {
            schema.required.push(field_name.to_string());
        }
    }

    schema
}

/// Rebuild editor fields from a persisted schema.
///
/// A property is a relationship iff its description matches
/// `Reference to (\w+)`; the captured name becomes the target entity and the
/// description is left empty (the marker is regenerated on save).
pub fn schema_to_fields(schema: &EntitySchema) -> Vec<Field> {
    schema
        .properties
        .iter()
        .map(|(name, prop)| {
            let required = schema.is_required(name);
            if let Some(entity) = prop.referenced_entity() {
                return Field {
                    name: name.to_string(),
                    field_type: FieldType::String,
                    description: String::new(),
                    required,
                    related_entity: Some(entity.to_string()),
                };
            }

            let field_type = match (prop.property_type, prop.format.as_deref()) {
                (PropertyType::String, Some("date")) => FieldType::Date,
                (PropertyType::String, Some("date-time")) => FieldType::DateTime,
                (PropertyType::String, _) => FieldType::String,
                (PropertyType::Number | PropertyType::Integer, _) => FieldType::Number,
                (PropertyType::Boolean, _) => FieldType::Boolean,
                (PropertyType::Array, _) => FieldType::Array,
                (PropertyType::Object, _) => FieldType::Object,
            };

            Field {
                name: name.to_string(),
                field_type,
                description: prop.description.clone(),
                required,
                related_entity: None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn order_fields() -> Vec<Field> {
        vec![
            Field::new("id", FieldType::String).required().described("Primary key"),
            Field::new("total", FieldType::Number).described("Order total"),
            Field::new("placed_at", FieldType::DateTime).required(),
            Field::new("due", FieldType::Date),
            Field::new("customer", FieldType::String).required().referencing("Customer"),
            Field::new("paid", FieldType::Boolean),
        ]
    }

    #[test]
    fn relationship_fields_become_reference_strings() {
        let schema = fields_to_schema("Order", "A purchase", &order_fields());
        let customer = schema.properties.get("customer").unwrap();
        assert_eq!(customer.property_type, PropertyType::String);
        assert_eq!(customer.description, "Reference to Customer");
        assert_eq!(customer.referenced_entity(), Some("Customer"));
    }

    #[test]
    fn dates_emit_string_with_format() {
        let schema = fields_to_schema("Order", "", &order_fields());
        let placed = schema.properties.get("placed_at").unwrap();
        assert_eq!(placed.property_type, PropertyType::String);
        assert_eq!(placed.format.as_deref(), Some("date-time"));
        assert_eq!(
            schema.properties.get("due").unwrap().format.as_deref(),
            Some("date")
        );
    }

    #[test]
    fn required_entries_all_resolve() {
        let schema = fields_to_schema("Order", "", &order_fields());
        assert_eq!(schema.required, vec!["id", "placed_at", "customer"]);
        assert!(schema.required.iter().all(|r| schema.properties.contains_key(r)));
    }

    #[test]
    fn persisted_shape_keeps_field_order() {
        let schema = fields_to_schema(
            "Tag",
            "Label",
            &[
                Field::new("zeta", FieldType::String).required(),
                Field::new("alpha", FieldType::Number),
            ],
        );
        let text = serde_json::to_string(&schema).unwrap();
        assert!(text.find("zeta").unwrap() < text.find("alpha").unwrap());
        assert_eq!(
            schema.to_value(),
            json!({
                "name": "Tag",
                "type": "object",
                "description": "Label",
                "properties": {
                    "zeta": { "type": "string", "description": "" },
                    "alpha": { "type": "number", "description": "" }
                },
                "required": ["zeta"]
            })
        );
    }

    #[test]
    fn roundtrip_reconstructs_fields() {
        let fields = order_fields();
        let schema = fields_to_schema("Order", "A purchase", &fields);
        let value = schema.to_value();
        let back = schema_to_fields(&EntitySchema::from_value(&value).unwrap());
        // Relationship descriptions are regenerated, everything else survives.
        let mut expected = fields.clone();
        expected[4].description.clear();
        assert_eq!(back, expected);
    }

    #[test]
    fn edited_marker_degrades_to_plain_field() {
        let value = json!({
            "name": "Order",
            "type": "object",
            "properties": {
                "customer": { "type": "string", "description": "Customer reference" }
            }
        });
        let fields = schema_to_fields(&EntitySchema::from_value(&value).unwrap());
        assert_eq!(fields[0].related_entity, None);
        assert_eq!(fields[0].description, "Customer reference");
    }

    #[test]
    fn duplicate_and_blank_names() {
        let schema = fields_to_schema(
            "Dup",
            "",
            &[
                Field::new("a", FieldType::String).required(),
                Field::new("  ", FieldType::Number),
                Field::new("b", FieldType::Boolean),
                Field::new("a", FieldType::Number),
            ],
        );
        let names: Vec<&str> = schema.properties.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(schema.properties.get("a").unwrap().property_type, PropertyType::Number);
        assert!(schema.required.is_empty());
    }

    #[test]
    fn malformed_schema_is_an_error() {
        assert!(matches!(
            EntitySchema::from_value(&json!("not a schema")),
            Err(SchemaError::Malformed(_))
        ));
        assert!(matches!(
            EntitySchema::from_value(&json!({ "type": "array" })),
            Err(SchemaError::NotAnObject(_))
        ));
    }

    #[test]
    fn null_descriptions_read_as_empty() {
        let schema = EntitySchema::from_value(&json!({
            "name": "Note",
            "type": "object",
            "description": null,
            "properties": {
                "body": { "type": "string", "description": null },
                "owner": { "type": "string", "description": "Reference to User" }
            }
        }))
        .unwrap();
        assert_eq!(schema.description, "");
        assert_eq!(schema.properties["body"].description, "");
        let fields = schema_to_fields(&schema);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1].related_entity.as_deref(), Some("User"));
    }

    #[test]
    fn dangling_required_entries_are_dropped_on_load() {
        let schema = EntitySchema::from_value(&json!({
            "name": "X",
            "type": "object",
            "properties": { "a": { "type": "string" } },
            "required": ["a", "ghost"]
        }))
        .unwrap();
        assert_eq!(schema.required, vec!["a"]);
    }

    #[test]
    fn relationships_are_derived_from_reference_fields() {
        let fields = vec![
            Field::new("owner", FieldType::String).referencing("User"),
            Field::new("tag", FieldType::String).referencing("Tag"),
            Field::new("title", FieldType::String),
        ];
        let rels = derive_relationships(&fields);
        assert_eq!(
            rels,
            vec![
                Relationship {
                    field: "owner".into(),
                    target_entity: "User".into(),
                    kind: RelationshipKind::ManyToOne,
                },
                Relationship {
                    field: "tag".into(),
                    target_entity: "Tag".into(),
                    kind: RelationshipKind::ManyToOne,
                },
            ]
        );
        assert_eq!(
            relationships_to_value(&rels)[1],
            json!({ "field": "tag", "targetEntity": "Tag", "type": "many-to-one" })
        );
    }

    #[test]
    fn malformed_relationships_fall_back_to_empty() {
        assert!(relationships_from_value(Some(&json!({ "oops": true }))).is_empty());
        assert!(relationships_from_value(None).is_empty());
    }
}
