//! Zendesk REST API wire models
//!
//! These structs mirror the JSON shapes of the `/api/v2/ticket_fields` and
//! `/api/v2/custom_objects` endpoints. They carry account-local numeric ids;
//! translation to account-independent keys happens in the migrate layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ticket field types as reported by the Zendesk API
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    // System types: exactly one field of each per account, no key
    Subject,
    Description,
    Status,
    Priority,
    #[serde(rename = "tickettype")]
    TicketType,
    Assignee,
    Group,
    // Custom types
    Text,
    Textarea,
    Checkbox,
    Date,
    Integer,
    Decimal,
    Regexp,
    Tagger,
    Multiselect,
    Lookup,
    #[serde(untagged)]
    Other(String),
}

impl FieldType {
    /// System fields exist in every account and are never created by us
    pub fn is_system(&self) -> bool {
        matches!(
            self,
            Self::Subject
                | Self::Description
                | Self::Status
                | Self::Priority
                | Self::TicketType
                | Self::Assignee
                | Self::Group
        )
    }

    /// Wire name, as sent to and received from the API
    pub fn as_wire(&self) -> &str {
        match self {
            Self::Subject => "subject",
            Self::Description => "description",
            Self::Status => "status",
            Self::Priority => "priority",
            Self::TicketType => "tickettype",
            Self::Assignee => "assignee",
            Self::Group => "group",
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Checkbox => "checkbox",
            Self::Date => "date",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Regexp => "regexp",
            Self::Tagger => "tagger",
            Self::Multiselect => "multiselect",
            Self::Lookup => "lookup",
            Self::Other(s) => s,
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// A ticket field as returned by `GET /api/v2/ticket_fields`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketFieldResource {
    pub id: u64,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub title: String,
    /// Stable textual identifier; system fields do not carry one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub collapsed_for_agents: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regexp_for_validation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_in_portal: Option<String>,
    #[serde(default = "default_true")]
    pub visible_in_portal: bool,
    #[serde(default = "default_true")]
    pub editable_in_portal: bool,
    #[serde(default)]
    pub required_in_portal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_field_options: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type_id: Option<u64>,
    #[serde(default = "default_true")]
    pub removable: bool,
    /// Lookup fields only, e.g. "zen:custom_object:asset" or "zen:user"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_target_type: Option<String>,
    /// Conditional display rules scoped to agents
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agent_conditions: Vec<ConditionResource>,
    /// Conditional display rules scoped to end users
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub end_user_conditions: Vec<ConditionResource>,
}

fn default_true() -> bool {
    true
}

/// One conditional-display rule; all field references are numeric ids
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionResource {
    pub parent_field_id: u64,
    pub operator: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_fields: Vec<ChildFieldResource>,
}

/// A field affected by a condition when it is active
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildFieldResource {
    pub id: u64,
    #[serde(default)]
    pub is_required: bool,
}

/// A custom object type as returned by `GET /api/v2/custom_objects`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomObjectResource {
    pub id: u64,
    pub key: String,
    pub title: String,
    pub title_pluralized: String,
    #[serde(default)]
    pub description: String,
}

/// Cursor pagination links shared by list endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageLinks {
    #[serde(default)]
    pub next: Option<String>,
}

/// Cursor pagination metadata
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub has_more: bool,
}

/// Response envelope for `GET /api/v2/ticket_fields`
#[derive(Debug, Clone, Deserialize)]
pub struct TicketFieldsPage {
    pub ticket_fields: Vec<TicketFieldResource>,
    #[serde(default)]
    pub links: Option<PageLinks>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
    /// Offset pagination fallback
    #[serde(default)]
    pub next_page: Option<String>,
}

/// Response envelope for `GET /api/v2/custom_objects`
#[derive(Debug, Clone, Deserialize)]
pub struct CustomObjectsPage {
    pub custom_objects: Vec<CustomObjectResource>,
    #[serde(default)]
    pub links: Option<PageLinks>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
    #[serde(default)]
    pub next_page: Option<String>,
}

/// Response envelope for `POST /api/v2/ticket_fields`
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedTicketField {
    pub ticket_field: TicketFieldResource,
}

/// Response envelope for `POST /api/v2/custom_objects`
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedCustomObject {
    pub custom_object: CustomObjectResource,
}
