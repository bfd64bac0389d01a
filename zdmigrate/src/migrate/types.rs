//! Core data types for the field migration engine
//!
//! These types define the account-independent view of ticket fields and
//! custom object types. All cross-entity references are expressed through
//! natural keys; account-local numeric ids appear only as the id the entity
//! carried in the account it was read from.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::models::FieldType;

/// Kind of migratable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    CustomObjectType,
    TicketField,
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::CustomObjectType => "custom object",
            Self::TicketField => "field",
        }
    }
}

/// Stable cross-account identity of an entity: kind plus natural key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub key: String,
}

impl EntityRef {
    pub fn field(key: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::TicketField,
            key: key.into(),
        }
    }

    pub fn object(key: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::CustomObjectType,
            key: key.into(),
        }
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}'", self.kind.label(), self.key)
    }
}

/// Target of a lookup/relationship field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationshipTarget {
    /// A custom object type, referenced by key; must exist at the
    /// destination before the field is created
    CustomObject(String),
    /// A builtin Zendesk target such as "zen:user"; exists in every account
    Builtin(String),
}

impl RelationshipTarget {
    const CUSTOM_OBJECT_PREFIX: &'static str = "zen:custom_object:";

    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix(Self::CUSTOM_OBJECT_PREFIX) {
            Some(key) => Self::CustomObject(key.to_string()),
            None => Self::Builtin(raw.to_string()),
        }
    }

    /// Wire representation for a creation payload
    pub fn as_wire(&self) -> String {
        match self {
            Self::CustomObject(key) => format!("{}{}", Self::CUSTOM_OBJECT_PREFIX, key),
            Self::Builtin(raw) => raw.clone(),
        }
    }

    pub fn custom_object_key(&self) -> Option<&str> {
        match self {
            Self::CustomObject(key) => Some(key),
            Self::Builtin(_) => None,
        }
    }
}

/// Audience a conditional rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    Agent,
    EndUser,
}

/// A field affected by a condition, referenced by key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildFieldRef {
    pub key: String,
    pub is_required: bool,
}

/// One conditional-display rule owned by a field definition
///
/// Field references are natural keys, never numeric ids, so rules stay
/// meaningful across accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalRule {
    pub audience: Audience,
    pub parent_field: String,
    pub operator: String,
    pub value: Value,
    pub child_fields: Vec<ChildFieldRef>,
}

/// A ticket field definition with all references already keyed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Natural key, unique within an account; for system fields this is the
    /// type name since they carry no key of their own
    pub key: String,
    pub field_type: FieldType,
    pub title: String,
    /// Numeric id in the account this definition was read from
    pub id: u64,
    pub description: String,
    pub position: Option<i64>,
    pub active: bool,
    pub required: bool,
    pub collapsed_for_agents: bool,
    pub regexp_for_validation: Option<String>,
    pub title_in_portal: Option<String>,
    pub visible_in_portal: bool,
    pub editable_in_portal: bool,
    pub required_in_portal: bool,
    pub tag: Option<String>,
    /// Dropdown/multiselect options, passed through untouched
    pub custom_field_options: Vec<Value>,
    pub sub_type_id: Option<u64>,
    pub removable: bool,
    /// Present only for lookup fields
    pub relationship_target: Option<RelationshipTarget>,
    pub conditions: Vec<ConditionalRule>,
}

impl FieldDefinition {
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::field(&self.key)
    }

    /// Keys of every field this field's conditions reference, in rule order,
    /// deduplicated. A condition naming the owning field itself is included:
    /// the resulting self-edge makes the graph reject it as a cycle.
    pub fn referenced_field_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for rule in &self.conditions {
            for key in std::iter::once(rule.parent_field.as_str())
                .chain(rule.child_fields.iter().map(|c| c.key.as_str()))
            {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }
}

/// A custom object type; only the type is ever migrated, never its records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomObjectType {
    pub key: String,
    pub title: String,
    pub title_pluralized: String,
    pub description: String,
    /// Numeric id in the account this definition was read from
    pub id: u64,
}

impl CustomObjectType {
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::object(&self.key)
    }
}

/// Everything read from one account, in the account's listing order
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub fields: Vec<FieldDefinition>,
    pub object_types: Vec<CustomObjectType>,
}

impl Catalog {
    pub fn field_by_key(&self, key: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn object_by_key(&self, key: &str) -> Option<&CustomObjectType> {
        self.object_types.iter().find(|o| o.key == key)
    }
}

/// One step of the ordered migration plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationStep {
    pub entity: EntityRef,
    /// Entities that must exist at the destination before this one,
    /// in plan order
    pub dependencies: Vec<EntityRef>,
}

/// Topologically ordered migration plan: dependencies always precede
/// their dependents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationPlan {
    pub steps: Vec<MigrationStep>,
}

impl MigrationPlan {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn position_of(&self, entity: &EntityRef) -> Option<usize> {
        self.steps.iter().position(|s| &s.entity == entity)
    }
}
