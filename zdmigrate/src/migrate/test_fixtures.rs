//! Shared fixture constructors for engine tests

use serde_json::Value;

use crate::api::models::FieldType;

use super::types::{
    Audience, Catalog, ChildFieldRef, ConditionalRule, CustomObjectType, FieldDefinition,
    RelationshipTarget,
};

pub fn make_field(id: u64, key: &str, field_type: FieldType) -> FieldDefinition {
    FieldDefinition {
        key: key.to_string(),
        field_type,
        title: key.replace('_', " "),
        id,
        description: String::new(),
        position: None,
        active: true,
        required: false,
        collapsed_for_agents: false,
        regexp_for_validation: None,
        title_in_portal: None,
        visible_in_portal: true,
        editable_in_portal: true,
        required_in_portal: false,
        tag: None,
        custom_field_options: vec![],
        sub_type_id: None,
        removable: true,
        relationship_target: None,
        conditions: vec![],
    }
}

pub fn make_lookup_field(id: u64, key: &str, object_key: &str) -> FieldDefinition {
    let mut field = make_field(id, key, FieldType::Lookup);
    field.relationship_target = Some(RelationshipTarget::CustomObject(object_key.to_string()));
    field
}

pub fn make_object(id: u64, key: &str) -> CustomObjectType {
    CustomObjectType {
        key: key.to_string(),
        title: key.to_string(),
        title_pluralized: format!("{}s", key),
        description: String::new(),
        id,
    }
}

pub fn make_condition(parent: &str, value: &str, children: &[&str]) -> ConditionalRule {
    ConditionalRule {
        audience: Audience::Agent,
        parent_field: parent.to_string(),
        operator: "is".to_string(),
        value: Value::from(value),
        child_fields: children
            .iter()
            .map(|key| ChildFieldRef {
                key: key.to_string(),
                is_required: false,
            })
            .collect(),
    }
}

pub fn make_catalog(fields: Vec<FieldDefinition>, object_types: Vec<CustomObjectType>) -> Catalog {
    Catalog {
        fields,
        object_types,
    }
}
