//! Entity editor view-model.
//!
//! Backs the dialog opened on an `entity` node. The field list is rebuilt
//! from the node's persisted schema on open and flattened back on save; the
//! schema is the durable form. A persisted schema that does not parse is
//! discarded (the dialog opens empty) instead of failing.
//!
//! AI-enhance is split in two so the host can keep the UI live while the
//! generation call runs: `begin_enhance` builds the request and marks the
//! editor busy, `finish_enhance` applies (or rejects) the result. While busy
//! a second `begin_enhance` is refused; `cancel_enhance` abandons the call.
//! There is no retry.

use crate::error::{EditorError, GenerationError};
use crate::generation::GenerationService;
use mm_core::id::NodeId;
use mm_core::model::{Node, NodePatch};
use mm_core::schema::{
    self, EntitySchema, Field, FieldType, Relationship, RelationshipKind, derive_relationships, fields_to_schema,
    schema_to_fields,
};
use serde::Deserialize;
use serde_json::{Value, json};

/// Prompt and response schema for one AI-enhance call.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhanceRequest {
    pub prompt: String,
    pub response_schema: Value,
}

#[derive(Debug, Clone)]
pub struct EntityEditor {
    node_id: NodeId,
    name: String,
    description: String,
    fields: Vec<Field>,
    relationships: Vec<Relationship>,
    enhancing: bool,
    discarded_schema: bool,
}

impl EntityEditor {
    /// Open the editor on an entity node.
    pub fn open(node: &Node) -> Result<Self, EditorError> {
        if !node.is_entity() {
            return Err(EditorError::NotAnEntity(node.id));
        }

        let parsed = node.entity_schema.as_ref().map(EntitySchema::from_value);
        let (schema, discarded_schema) = match parsed {
            Some(Ok(schema)) => (Some(schema), false),
            Some(Err(e)) => {
                log::warn!("entity {}: discarding unreadable schema: {e}", node.id);
                (None, true)
            }
            None => (None, false),
        };

        let (name, description, fields) = match schema {
            Some(s) => {
                let fields = schema_to_fields(&s);
                let name = if s.name.trim().is_empty() { node.text.clone() } else { s.name };
                (name, s.description, fields)
            }
            None => (node.text.clone(), String::new(), Vec::new()),
        };

        let persisted = if discarded_schema {
            Vec::new()
        } else {
            schema::relationships_from_value(node.entity_relationships.as_ref())
        };

        let mut editor = Self {
            node_id: node.id,
            name,
            description,
            fields,
            relationships: Vec::new(),
            enhancing: false,
            discarded_schema,
        };
        editor.relationships = reconcile(&editor.fields, &persisted);
        Ok(editor)
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn is_enhancing(&self) -> bool {
        self.enhancing
    }

    /// The persisted schema could not be read and was dropped on open.
    pub fn discarded_schema(&self) -> bool {
        self.discarded_schema
    }

    // ─── Field editing ───────────────────────────────────────────────────

    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
        self.refresh_relationships();
    }

    /// Replace the field at `index`. Returns `false` if out of range.
    pub fn update_field(&mut self, index: usize, field: Field) -> bool {
        let Some(slot) = self.fields.get_mut(index) else {
            return false;
        };
        *slot = field;
        self.refresh_relationships();
        true
    }

    pub fn remove_field(&mut self, index: usize) -> Option<Field> {
        if index >= self.fields.len() {
            return None;
        }
        let removed = self.fields.remove(index);
        self.refresh_relationships();
        Some(removed)
    }

    fn refresh_relationships(&mut self) {
        self.relationships = reconcile(&self.fields, &self.relationships);
    }

    // ─── Save ────────────────────────────────────────────────────────────

    pub fn schema(&self) -> EntitySchema {
        fields_to_schema(&self.name, &self.description, &self.fields)
    }

    /// The node update persisting this editor's state.
    pub fn save(&self) -> NodePatch {
        NodePatch {
            entity_schema: Some(self.schema().to_value()),
            entity_relationships: Some(schema::relationships_to_value(&self.relationships)),
            ..Default::default()
        }
    }

    // ─── AI enhance ──────────────────────────────────────────────────────

    pub fn begin_enhance(&mut self, sibling_entities: &[String], context: &str) -> Result<EnhanceRequest, EditorError> {
        if self.enhancing {
            return Err(EditorError::EnhanceInFlight);
        }
        self.enhancing = true;
        log::debug!("entity {}: enhance started", self.node_id);
        Ok(EnhanceRequest {
            prompt: self.enhance_prompt(sibling_entities, context),
            response_schema: enhance_response_schema(),
        })
    }

    /// Apply the generation result. On any failure the current fields are
    /// left as they were and the error is returned for the caller to surface.
    pub fn finish_enhance(&mut self, result: Result<Value, GenerationError>) -> Result<(), EditorError> {
        if !self.enhancing {
            return Err(EditorError::NoEnhanceInFlight);
        }
        self.enhancing = false;

        let response: EnhanceResponse = serde_json::from_value(result?)
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        let mut fields: Vec<Field> = response.fields.into_iter().map(Field::from).collect();
        // A relationship the service listed separately marks its field too.
        for rel in &response.relationships {
            if let Some(f) = fields.iter_mut().find(|f| f.name == rel.field && !f.is_relationship()) {
                f.related_entity = Some(rel.target_entity.clone());
            }
        }

        self.relationships = reconcile(&fields, &response.relationships);
        self.fields = fields;
        log::debug!("entity {}: enhance applied, {} fields", self.node_id, self.fields.len());
        Ok(())
    }

    /// Drop an in-flight enhance without touching the fields, e.g. when the
    /// dialog closes. Returns whether one was in flight.
    pub fn cancel_enhance(&mut self) -> bool {
        let was = std::mem::replace(&mut self.enhancing, false);
        if was {
            log::debug!("entity {}: enhance cancelled", self.node_id);
        }
        was
    }

    /// Run a full enhance round trip against `service`. Dropping the future
    /// before it completes cancels the enhance.
    pub async fn enhance(
        &mut self,
        service: &dyn GenerationService,
        sibling_entities: &[String],
        context: &str,
    ) -> Result<(), EditorError> {
        let request = self.begin_enhance(sibling_entities, context)?;
        let mut guard = EnhanceGuard { editor: self };
        let result = service.generate(&request.prompt, &request.response_schema).await;
        guard.editor.finish_enhance(result)
    }

    fn enhance_prompt(&self, sibling_entities: &[String], context: &str) -> String {
        let mut lines = vec![format!("Improve the data model of the entity \"{}\".", self.name)];
        if !self.description.trim().is_empty() {
            lines.push(format!("Description: {}", self.description.trim()));
        }

        if self.fields.is_empty() {
            lines.push("It has no fields yet.".to_string());
        } else {
            lines.push("Current fields:".to_string());
            lines.extend(self.fields.iter().map(describe_field));
        }

        if !sibling_entities.is_empty() {
            lines.push(format!(
                "Other entities in this application: {}. Relationships may only target these.",
                sibling_entities.join(", ")
            ));
        }
        if !context.trim().is_empty() {
            lines.push(format!("Additional context: {}", context.trim()));
        }
        lines.push("Return the complete improved field list and the relationships between entities.".to_string());
        lines.join("\n")
    }
}

/// Clears the in-flight flag if `enhance` is dropped mid-call.
struct EnhanceGuard<'a> {
    editor: &'a mut EntityEditor,
}

impl Drop for EnhanceGuard<'_> {
    fn drop(&mut self) {
        self.editor.cancel_enhance();
    }
}

fn describe_field(f: &Field) -> String {
    let required = if f.required { ", required" } else { "" };
    let mut line = format!("- {} ({}{required})", f.name, f.field_type.as_str());
    if let Some(target) = f.related_entity.as_deref().filter(|_| f.is_relationship()) {
        line.push_str(&format!(" references {target}"));
    } else if !f.description.is_empty() {
        line.push_str(&format!(": {}", f.description));
    }
    line
}

/// Relationships derived from `fields`, keeping a previously known kind for
/// the same field and target.
fn reconcile(fields: &[Field], known: &[Relationship]) -> Vec<Relationship> {
    derive_relationships(fields)
        .into_iter()
        .map(|mut rel| {
            if let Some(prev) = known
                .iter()
                .find(|k| k.field == rel.field && k.target_entity == rel.target_entity)
            {
                rel.kind = prev.kind;
            }
            rel
        })
        .collect()
}

// ─── Generation wire format ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct EnhanceResponse {
    fields: Vec<SuggestedField>,
    #[serde(default)]
    relationships: Vec<Relationship>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestedField {
    name: String,
    #[serde(rename = "type", default)]
    field_type: FieldType,
    #[serde(default)]
    description: String,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    is_relationship: bool,
    #[serde(default)]
    related_entity: Option<String>,
}

impl From<SuggestedField> for Field {
    fn from(s: SuggestedField) -> Self {
        Field {
            name: s.name,
            field_type: s.field_type,
            description: s.description,
            required: s.required,
            related_entity: s.related_entity.filter(|_| s.is_relationship),
        }
    }
}

fn enhance_response_schema() -> Value {
    let field_types: Vec<&str> = FieldType::ALL.iter().map(|t| t.as_str()).collect();
    let kinds: Vec<Value> = [
        RelationshipKind::ManyToOne,
        RelationshipKind::OneToMany,
        RelationshipKind::ManyToMany,
    ]
    .iter()
    .filter_map(|k| serde_json::to_value(k).ok())
    .collect();

    json!({
        "type": "object",
        "properties": {
            "fields": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "type": { "type": "string", "enum": field_types },
                        "description": { "type": "string" },
                        "required": { "type": "boolean" },
                        "isRelationship": { "type": "boolean" },
                        "relatedEntity": { "type": "string" }
                    },
                    "required": ["name", "type"]
                }
            },
            "relationships": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "field": { "type": "string" },
                        "targetEntity": { "type": "string" },
                        "type": { "type": "string", "enum": kinds }
                    },
                    "required": ["field", "targetEntity", "type"]
                }
            }
        },
        "required": ["fields"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_core::model::NodeType;
    use pretty_assertions::assert_eq;

    fn entity(id: &str) -> Node {
        Node::new(NodeId::intern(id), "Order", NodeType::Entity)
    }

    fn sample_fields() -> Vec<Field> {
        vec![
            Field::new("id", FieldType::String).required(),
            Field::new("total", FieldType::Number).described("Sum in cents"),
            Field::new("customer", FieldType::String).referencing("Customer").required(),
        ]
    }

    #[test]
    fn open_refuses_non_entity() {
        let node = Node::new(NodeId::intern("ee_page"), "Home", NodeType::Page);
        assert!(matches!(EntityEditor::open(&node), Err(EditorError::NotAnEntity(_))));
    }

    #[test]
    fn malformed_schema_opens_empty() {
        let mut node = entity("ee_bad");
        node.entity_schema = Some(json!({ "properties": "not a map" }));
        node.entity_relationships = Some(json!([{ "field": "x", "targetEntity": "Y", "type": "many-to-one" }]));
        let editor = EntityEditor::open(&node).unwrap();
        assert!(editor.discarded_schema());
        assert!(editor.fields().is_empty());
        assert!(editor.relationships().is_empty());
        assert_eq!(editor.name(), "Order");
    }

    #[test]
    fn save_then_reopen_round_trips() {
        let mut node = entity("ee_round");
        let mut editor = EntityEditor::open(&node).unwrap();
        editor.set_description("A placed order");
        for f in sample_fields() {
            editor.add_field(f);
        }
        assert_eq!(editor.relationships().len(), 1);

        editor.save().apply(&mut node);
        let reopened = EntityEditor::open(&node).unwrap();
        assert!(!reopened.discarded_schema());
        assert_eq!(reopened.description(), "A placed order");
        assert_eq!(reopened.fields(), sample_fields().as_slice());
        assert_eq!(reopened.relationships(), editor.relationships());
    }

    #[test]
    fn persisted_relationship_kind_survives_open() {
        let mut node = entity("ee_kind");
        let schema = fields_to_schema("Order", "", &sample_fields());
        node.entity_schema = Some(schema.to_value());
        node.entity_relationships = Some(json!([
            { "field": "customer", "targetEntity": "Customer", "type": "many-to-many" }
        ]));
        let editor = EntityEditor::open(&node).unwrap();
        assert_eq!(editor.relationships()[0].kind, RelationshipKind::ManyToMany);
    }

    #[test]
    fn field_edits_recompute_relationships() {
        let mut editor = EntityEditor::open(&entity("ee_edit")).unwrap();
        editor.add_field(Field::new("owner", FieldType::String).referencing("User"));
        assert_eq!(editor.relationships()[0].target_entity, "User");

        assert!(editor.update_field(0, Field::new("owner", FieldType::String)));
        assert!(editor.relationships().is_empty());
        assert!(!editor.update_field(5, Field::default()));

        assert_eq!(editor.remove_field(0).map(|f| f.name), Some("owner".to_string()));
        assert_eq!(editor.remove_field(0), None);
    }

    #[test]
    fn enhance_is_not_reentrant() {
        let mut editor = EntityEditor::open(&entity("ee_busy")).unwrap();
        let req = editor.begin_enhance(&["Customer".into()], "shop").unwrap();
        assert!(req.prompt.contains("\"Order\""));
        assert!(req.prompt.contains("Customer"));
        assert_eq!(req.response_schema["required"], json!(["fields"]));
        assert!(editor.is_enhancing());
        assert!(matches!(editor.begin_enhance(&[], ""), Err(EditorError::EnhanceInFlight)));
    }

    #[test]
    fn prompt_lists_fields_one_per_line() {
        let mut editor = EntityEditor::open(&entity("ee_prompt")).unwrap();
        for f in sample_fields() {
            editor.add_field(f);
        }
        let req = editor.begin_enhance(&[], "  ").unwrap();
        let lines: Vec<&str> = req.prompt.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Improve the data model of the entity \"Order\".",
                "Current fields:",
                "- id (string, required)",
                "- total (number): Sum in cents",
                "- customer (string, required) references Customer",
                "Return the complete improved field list and the relationships between entities.",
            ]
        );
    }

    #[test]
    fn cancel_allows_a_new_enhance() {
        let mut editor = EntityEditor::open(&entity("ee_cancel")).unwrap();
        assert!(!editor.cancel_enhance());

        editor.begin_enhance(&[], "").unwrap();
        assert!(editor.cancel_enhance());
        assert!(!editor.is_enhancing());
        // A late result for the abandoned call is refused.
        assert!(matches!(
            editor.finish_enhance(Ok(json!({ "fields": [] }))),
            Err(EditorError::NoEnhanceInFlight)
        ));
        assert!(editor.begin_enhance(&[], "").is_ok());
    }

    #[test]
    fn failed_enhance_keeps_fields() {
        let mut editor = EntityEditor::open(&entity("ee_fail")).unwrap();
        editor.add_field(Field::new("id", FieldType::String));
        editor.begin_enhance(&[], "").unwrap();
        let err = editor
            .finish_enhance(Err(GenerationError::Request("timeout".into())))
            .unwrap_err();
        assert!(matches!(err, EditorError::Generation(_)));
        assert!(!editor.is_enhancing());
        assert_eq!(editor.fields().len(), 1);

        editor.begin_enhance(&[], "").unwrap();
        let err = editor.finish_enhance(Ok(json!({ "nope": true }))).unwrap_err();
        assert!(matches!(err, EditorError::Generation(GenerationError::InvalidResponse(_))));
        assert_eq!(editor.fields().len(), 1);
    }

    #[test]
    fn successful_enhance_replaces_wholesale() {
        let mut editor = EntityEditor::open(&entity("ee_ok")).unwrap();
        editor.add_field(Field::new("legacy", FieldType::String));
        editor.begin_enhance(&["Customer".into()], "").unwrap();
        editor
            .finish_enhance(Ok(json!({
                "fields": [
                    { "name": "id", "type": "string", "required": true },
                    { "name": "placedAt", "type": "date-time" },
                    { "name": "customerId", "type": "string" }
                ],
                "relationships": [
                    { "field": "customerId", "targetEntity": "Customer", "type": "many-to-one" }
                ]
            })))
            .unwrap();
        let names: Vec<&str> = editor.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "placedAt", "customerId"]);
        assert_eq!(editor.fields()[1].field_type, FieldType::DateTime);
        assert_eq!(editor.fields()[2].related_entity.as_deref(), Some("Customer"));
        assert_eq!(
            editor.relationships(),
            &[Relationship {
                field: "customerId".into(),
                target_entity: "Customer".into(),
                kind: RelationshipKind::ManyToOne,
            }]
        );
    }

    #[test]
    fn finish_without_begin_is_an_error() {
        let mut editor = EntityEditor::open(&entity("ee_idle")).unwrap();
        assert!(matches!(
            editor.finish_enhance(Ok(json!({ "fields": [] }))),
            Err(EditorError::NoEnhanceInFlight)
        ));
    }
}
