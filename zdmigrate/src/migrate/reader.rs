//! Reading full account catalogs
//!
//! The [`AccountReader`] trait is the only capability the engine needs from
//! the transport layer for reads. Conversion from wire resources to the
//! account-independent domain model happens here: every numeric condition
//! reference is translated to a natural key using the account's own
//! id-to-key index, so nothing downstream ever touches a raw source id.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::api::error::TransportError;
use crate::api::models::{ConditionResource, CustomObjectResource, TicketFieldResource};

use super::error::{IntegrityError, MigrateError};
use super::types::{
    Audience, Catalog, ChildFieldRef, ConditionalRule, CustomObjectType, EntityRef,
    FieldDefinition, RelationshipTarget,
};

/// Read capability against one account. Implementations must fully
/// enumerate; a transport failure fails the whole read.
#[async_trait]
pub trait AccountReader {
    async fn list_fields(&self) -> Result<Vec<TicketFieldResource>, TransportError>;
    async fn list_custom_object_types(&self) -> Result<Vec<CustomObjectResource>, TransportError>;
}

/// Read and convert the full catalog of one account.
///
/// Either both listings succeed completely or the read fails; a partial
/// catalog is never returned.
pub async fn read_catalog<R: AccountReader + ?Sized>(reader: &R) -> Result<Catalog, MigrateError> {
    let fields = reader.list_fields().await?;
    let object_types = reader.list_custom_object_types().await?;
    let catalog = build_catalog(fields, object_types)?;
    log::info!(
        "read catalog: {} fields, {} custom object types",
        catalog.fields.len(),
        catalog.object_types.len()
    );
    Ok(catalog)
}

/// Natural key of a wire field. System fields use their type name (they
/// carry no key and exist once per account); custom fields use their key,
/// falling back to the title for fields created before keys existed.
fn natural_key(field: &TicketFieldResource) -> String {
    if field.field_type.is_system() {
        return field.field_type.as_wire().to_string();
    }
    match &field.key {
        Some(key) if !key.is_empty() => key.clone(),
        _ => field.title.clone(),
    }
}

/// Convert wire resources into a domain catalog, preserving listing order
pub fn build_catalog(
    fields: Vec<TicketFieldResource>,
    object_types: Vec<CustomObjectResource>,
) -> Result<Catalog, IntegrityError> {
    let key_of: HashMap<u64, String> = fields.iter().map(|f| (f.id, natural_key(f))).collect();

    let mut catalog = Catalog::default();

    for object in object_types {
        if catalog.object_by_key(&object.key).is_some() {
            return Err(IntegrityError::duplicate_in_catalog(&EntityRef::object(
                &object.key,
            )));
        }
        catalog.object_types.push(CustomObjectType {
            key: object.key,
            title: object.title,
            title_pluralized: object.title_pluralized,
            description: object.description,
            id: object.id,
        });
    }

    for field in fields {
        let key = natural_key(&field);
        if catalog.field_by_key(&key).is_some() {
            return Err(IntegrityError::duplicate_in_catalog(&EntityRef::field(&key)));
        }

        let mut conditions = Vec::new();
        for rule in &field.agent_conditions {
            conditions.push(convert_condition(&key, Audience::Agent, rule, &key_of)?);
        }
        for rule in &field.end_user_conditions {
            conditions.push(convert_condition(&key, Audience::EndUser, rule, &key_of)?);
        }

        let relationship_target = field
            .relationship_target_type
            .as_deref()
            .map(RelationshipTarget::parse);

        catalog.fields.push(FieldDefinition {
            key,
            field_type: field.field_type,
            title: field.title,
            id: field.id,
            description: field.description,
            position: field.position,
            active: field.active,
            required: field.required,
            collapsed_for_agents: field.collapsed_for_agents,
            regexp_for_validation: field.regexp_for_validation,
            title_in_portal: field.title_in_portal,
            visible_in_portal: field.visible_in_portal,
            editable_in_portal: field.editable_in_portal,
            required_in_portal: field.required_in_portal,
            tag: field.tag,
            custom_field_options: field.custom_field_options,
            sub_type_id: field.sub_type_id,
            removable: field.removable,
            relationship_target,
            conditions,
        });
    }

    Ok(catalog)
}

fn convert_condition(
    owner_key: &str,
    audience: Audience,
    rule: &ConditionResource,
    key_of: &HashMap<u64, String>,
) -> Result<ConditionalRule, IntegrityError> {
    let parent_field = key_of
        .get(&rule.parent_field_id)
        .cloned()
        .ok_or_else(|| IntegrityError::unknown_field_id(owner_key, rule.parent_field_id))?;

    let child_fields = rule
        .child_fields
        .iter()
        .map(|child| {
            key_of
                .get(&child.id)
                .cloned()
                .map(|key| ChildFieldRef {
                    key,
                    is_required: child.is_required,
                })
                .ok_or_else(|| IntegrityError::unknown_field_id(owner_key, child.id))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ConditionalRule {
        audience,
        parent_field,
        operator: rule.operator.clone(),
        value: rule.value.clone(),
        child_fields,
    })
}
