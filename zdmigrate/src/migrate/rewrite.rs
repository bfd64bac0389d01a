//! Rewriting cross-entity references into destination creation payloads
//!
//! Pure functions: given an entity and the id mapping accumulated so far,
//! produce the payload the destination account expects, with every
//! cross-entity reference replaced by its destination-side value. A missing
//! mapping entry means the plan failed to guarantee resolvability and is
//! surfaced as [`UnresolvedReferenceError`] rather than written.

use serde::Serialize;
use serde_json::Value;

use crate::api::models::FieldType;

use super::error::UnresolvedReferenceError;
use super::mapping::IdMapping;
use super::types::{
    Audience, ConditionalRule, CustomObjectType, EntityRef, FieldDefinition, RelationshipTarget,
};

/// Creation payload for `POST /api/v2/ticket_fields`, references already
/// destination-valid. Absent attributes are omitted from the JSON, matching
/// what the API expects.
#[derive(Debug, Clone, Serialize)]
pub struct FieldPayload {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    pub active: bool,
    pub required: bool,
    pub collapsed_for_agents: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regexp_for_validation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_in_portal: Option<String>,
    pub visible_in_portal: bool,
    pub editable_in_portal: bool,
    pub required_in_portal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_field_options: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_type_id: Option<u64>,
    pub removable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship_target_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub agent_conditions: Vec<ConditionPayload>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub end_user_conditions: Vec<ConditionPayload>,
}

/// A condition with destination-side field ids
#[derive(Debug, Clone, Serialize)]
pub struct ConditionPayload {
    pub parent_field_id: u64,
    pub operator: String,
    pub value: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub child_fields: Vec<ChildFieldPayload>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChildFieldPayload {
    pub id: u64,
    pub is_required: bool,
}

/// Creation payload for `POST /api/v2/custom_objects`: the type only,
/// never records
#[derive(Debug, Clone, Serialize)]
pub struct ObjectPayload {
    pub key: String,
    pub title: String,
    pub title_pluralized: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Build the destination creation payload for a field, rewriting every
/// reference through the mapping.
pub fn rewrite_field(
    field: &FieldDefinition,
    mapping: &IdMapping,
) -> Result<FieldPayload, UnresolvedReferenceError> {
    let relationship_target_type = match &field.relationship_target {
        Some(target @ RelationshipTarget::CustomObject(key)) => {
            // The wire reference is key-addressed, but the target must still
            // be confirmed present at the destination before we write it
            let reference = EntityRef::object(key);
            if !mapping.contains(&reference) {
                return Err(UnresolvedReferenceError {
                    entity: field.entity_ref(),
                    reference,
                });
            }
            Some(target.as_wire())
        }
        Some(builtin @ RelationshipTarget::Builtin(_)) => Some(builtin.as_wire()),
        None => None,
    };

    let mut agent_conditions = Vec::new();
    let mut end_user_conditions = Vec::new();
    for rule in &field.conditions {
        let payload = rewrite_condition(field, rule, mapping)?;
        match rule.audience {
            Audience::Agent => agent_conditions.push(payload),
            Audience::EndUser => end_user_conditions.push(payload),
        }
    }

    Ok(FieldPayload {
        field_type: field.field_type.clone(),
        title: field.title.clone(),
        description: field.description.clone(),
        position: field.position,
        active: field.active,
        required: field.required,
        collapsed_for_agents: field.collapsed_for_agents,
        regexp_for_validation: field.regexp_for_validation.clone(),
        title_in_portal: field.title_in_portal.clone(),
        visible_in_portal: field.visible_in_portal,
        editable_in_portal: field.editable_in_portal,
        required_in_portal: field.required_in_portal,
        tag: field.tag.clone(),
        custom_field_options: field.custom_field_options.clone(),
        sub_type_id: field.sub_type_id,
        removable: field.removable,
        relationship_target_type,
        agent_conditions,
        end_user_conditions,
    })
}

fn rewrite_condition(
    owner: &FieldDefinition,
    rule: &ConditionalRule,
    mapping: &IdMapping,
) -> Result<ConditionPayload, UnresolvedReferenceError> {
    let parent_field_id = resolve_reference(owner, &rule.parent_field, mapping)?;

    let child_fields = rule
        .child_fields
        .iter()
        .map(|child| {
            resolve_reference(owner, &child.key, mapping).map(|id| ChildFieldPayload {
                id,
                is_required: child.is_required,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ConditionPayload {
        parent_field_id,
        operator: rule.operator.clone(),
        value: rule.value.clone(),
        child_fields,
    })
}

fn resolve_reference(
    owner: &FieldDefinition,
    key: &str,
    mapping: &IdMapping,
) -> Result<u64, UnresolvedReferenceError> {
    let reference = EntityRef::field(key);
    mapping
        .destination_of(&reference)
        .ok_or_else(|| UnresolvedReferenceError {
            entity: owner.entity_ref(),
            reference,
        })
}

/// Build the destination creation payload for a custom object type
pub fn object_payload(object: &CustomObjectType) -> ObjectPayload {
    ObjectPayload {
        key: object.key.clone(),
        title: object.title.clone(),
        title_pluralized: object.title_pluralized.clone(),
        description: object.description.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::test_fixtures::{make_condition, make_field, make_lookup_field, make_object};
    use crate::migrate::types::{Audience, ChildFieldRef};

    #[test]
    fn condition_references_become_destination_ids() {
        let mut field = make_field(3, "serial_number", FieldType::Text);
        field.conditions = vec![make_condition("category", "hardware", &["warranty_date"])];

        let mut mapping = IdMapping::new();
        mapping.record(EntityRef::field("category"), 1, 501).unwrap();
        mapping.record(EntityRef::field("warranty_date"), 2, 502).unwrap();

        let payload = rewrite_field(&field, &mapping).unwrap();
        assert_eq!(payload.agent_conditions.len(), 1);
        assert_eq!(payload.agent_conditions[0].parent_field_id, 501);
        assert_eq!(payload.agent_conditions[0].child_fields[0].id, 502);
        assert!(payload.end_user_conditions.is_empty());
    }

    #[test]
    fn audiences_split_into_separate_condition_lists() {
        let mut field = make_field(3, "serial_number", FieldType::Text);
        let mut end_user_rule = make_condition("category", "software", &[]);
        end_user_rule.audience = Audience::EndUser;
        field.conditions = vec![make_condition("category", "hardware", &[]), end_user_rule];

        let mut mapping = IdMapping::new();
        mapping.record(EntityRef::field("category"), 1, 501).unwrap();

        let payload = rewrite_field(&field, &mapping).unwrap();
        assert_eq!(payload.agent_conditions.len(), 1);
        assert_eq!(payload.end_user_conditions.len(), 1);
    }

    #[test]
    fn unmapped_reference_is_an_unresolved_reference_error() {
        let mut field = make_field(3, "serial_number", FieldType::Text);
        field.conditions = vec![ConditionalRule {
            audience: Audience::Agent,
            parent_field: "category".to_string(),
            operator: "is".to_string(),
            value: "hardware".into(),
            child_fields: vec![ChildFieldRef {
                key: "warranty_date".to_string(),
                is_required: false,
            }],
        }];

        let err = rewrite_field(&field, &IdMapping::new()).unwrap_err();
        assert_eq!(err.reference, EntityRef::field("category"));
        assert_eq!(err.entity, EntityRef::field("serial_number"));
    }

    #[test]
    fn custom_object_target_requires_a_mapping() {
        let field = make_lookup_field(1, "asset_ref", "asset");

        let err = rewrite_field(&field, &IdMapping::new()).unwrap_err();
        assert_eq!(err.reference, EntityRef::object("asset"));

        let mut mapping = IdMapping::new();
        mapping.record(EntityRef::object("asset"), 10, 90).unwrap();
        let payload = rewrite_field(&field, &mapping).unwrap();
        assert_eq!(
            payload.relationship_target_type.as_deref(),
            Some("zen:custom_object:asset")
        );
    }

    #[test]
    fn builtin_target_passes_through_without_mapping() {
        let mut field = make_field(1, "requester_ref", FieldType::Lookup);
        field.relationship_target = Some(RelationshipTarget::Builtin("zen:user".to_string()));

        let payload = rewrite_field(&field, &IdMapping::new()).unwrap();
        assert_eq!(payload.relationship_target_type.as_deref(), Some("zen:user"));
    }

    #[test]
    fn absent_attributes_are_omitted_from_json() {
        let field = make_field(1, "category", FieldType::Tagger);
        let json = serde_json::to_value(rewrite_field(&field, &IdMapping::new()).unwrap()).unwrap();

        let object = json.as_object().unwrap();
        assert!(!object.contains_key("tag"));
        assert!(!object.contains_key("description"));
        assert!(!object.contains_key("agent_conditions"));
        assert_eq!(object["type"], "tagger");
    }

    #[test]
    fn object_payload_carries_no_ids() {
        let json = serde_json::to_value(object_payload(&make_object(10, "asset"))).unwrap();
        assert!(!json.as_object().unwrap().contains_key("id"));
        assert_eq!(json["key"], "asset");
    }
}
