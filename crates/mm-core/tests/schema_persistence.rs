//! Integration tests: entity schemas persisted on nodes and read back.

use mm_core::schema::{self, PropertyType};
use mm_core::*;
use pretty_assertions::assert_eq;
use serde_json::json;

fn order_fields() -> Vec<Field> {
    vec![
        Field::new("id", FieldType::String).required().described("Order id"),
        Field::new("placedAt", FieldType::DateTime).required(),
        Field::new("lines", FieldType::Array),
        Field::new("customerId", FieldType::String).required().referencing("Customer"),
    ]
}

#[test]
fn schema_survives_node_serialization() {
    let fields = order_fields();
    let schema = schema::fields_to_schema("Order", "A placed order", &fields);
    let relationships = schema::derive_relationships(&fields);

    let mut node = Node::new(NodeId::intern("sp_order"), "Order", NodeType::Entity);
    assert!(node.set_entity_schema(schema.to_value(), schema::relationships_to_value(&relationships)));

    let text = serde_json::to_string(&node).unwrap();
    let back: Node = serde_json::from_str(&text).unwrap();

    let loaded = EntitySchema::from_value(back.entity_schema.as_ref().unwrap()).unwrap();
    assert_eq!(loaded, schema);
    assert_eq!(schema::schema_to_fields(&loaded), fields);
    assert_eq!(
        schema::relationships_from_value(back.entity_relationships.as_ref()),
        relationships
    );
}

#[test]
fn persisted_shape_is_json_schema_like() {
    let schema = schema::fields_to_schema("Order", "", &order_fields());
    let value = schema.to_value();

    assert_eq!(value["type"], "object");
    assert_eq!(value["properties"]["placedAt"], json!({ "type": "string", "format": "date-time", "description": "" }));
    assert_eq!(value["properties"]["customerId"]["description"], "Reference to Customer");
    assert_eq!(value["required"], json!(["id", "placedAt", "customerId"]));

    let keys: Vec<&String> = value["properties"].as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["id", "placedAt", "lines", "customerId"]);
}

#[test]
fn hand_written_schema_is_sanitized_on_load() {
    let value = json!({
        "name": "Invoice",
        "type": "object",
        "properties": {
            "total": { "type": "integer" },
            "buyer": { "type": "string", "description": "Reference to Customer" }
        },
        "required": ["total", "ghost"]
    });

    let schema = EntitySchema::from_value(&value).unwrap();
    assert_eq!(schema.required, vec!["total".to_string()]);
    assert_eq!(schema.properties.get("total").unwrap().property_type, PropertyType::Integer);

    let fields = schema::schema_to_fields(&schema);
    assert_eq!(fields[0].field_type, FieldType::Number);
    assert_eq!(fields[1].related_entity.as_deref(), Some("Customer"));
    assert_eq!(schema::derive_relationships(&fields).len(), 1);
}

#[test]
fn schemas_only_live_on_entities() {
    let mut page = Node::new(NodeId::intern("sp_page"), "Checkout", NodeType::Page);
    assert!(!page.set_entity_schema(json!({}), json!([])));
    assert!(page.entity_schema.is_none());

    let mut entity = Node::new(NodeId::intern("sp_cart"), "Cart", NodeType::Entity);
    let schema = schema::fields_to_schema("Cart", "", &[Field::new("id", FieldType::String)]);
    entity.set_entity_schema(schema.to_value(), json!([]));

    NodePatch {
        node_type: Some(NodeType::Feature),
        ..Default::default()
    }
    .apply(&mut entity);
    assert!(entity.entity_schema.is_none());
    assert!(entity.entity_relationships.is_none());
}
