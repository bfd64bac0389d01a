//! Identity resolution between source entities and the destination catalog
//!
//! Numeric ids are account-local and never comparable across accounts, so
//! matching always goes through the natural key. System fields carry no key
//! and exist exactly once per account, so they match on their type instead.

use super::error::IntegrityError;
use super::types::{Catalog, CustomObjectType, FieldDefinition};

/// Outcome of resolving one source entity against the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    /// A matching entity already exists; carries its destination id
    Existing(u64),
    /// No match; the entity must be created
    Absent,
}

/// Resolve a source field against the destination catalog.
///
/// Exact, case-sensitive key equality for custom fields; type equality for
/// system fields. More than one candidate means the destination violates
/// Zendesk's own uniqueness constraints and is fatal.
pub fn resolve_field(
    source: &FieldDefinition,
    destination: &Catalog,
) -> Result<Match, IntegrityError> {
    let candidates: Vec<&FieldDefinition> = if source.field_type.is_system() {
        destination
            .fields
            .iter()
            .filter(|f| f.field_type == source.field_type)
            .collect()
    } else {
        destination
            .fields
            .iter()
            .filter(|f| !f.field_type.is_system() && f.key == source.key)
            .collect()
    };

    match candidates.as_slice() {
        [] => Ok(Match::Absent),
        [found] => Ok(Match::Existing(found.id)),
        _ => Err(IntegrityError::duplicate_key(&source.entity_ref())),
    }
}

/// Resolve a source custom object type against the destination catalog
/// by exact, case-sensitive key equality.
pub fn resolve_object(
    source: &CustomObjectType,
    destination: &Catalog,
) -> Result<Match, IntegrityError> {
    let candidates: Vec<&CustomObjectType> = destination
        .object_types
        .iter()
        .filter(|o| o.key == source.key)
        .collect();

    match candidates.as_slice() {
        [] => Ok(Match::Absent),
        [found] => Ok(Match::Existing(found.id)),
        _ => Err(IntegrityError::duplicate_key(&source.entity_ref())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::FieldType;
    use crate::migrate::test_fixtures::{make_catalog, make_field, make_object};

    #[test]
    fn matches_by_key_not_by_id() {
        // Same key exists at the destination with a different numeric id
        let source = make_field(123, "priority_level", FieldType::Tagger);
        let destination = make_catalog(
            vec![make_field(777, "priority_level", FieldType::Tagger)],
            vec![],
        );

        assert_eq!(resolve_field(&source, &destination).unwrap(), Match::Existing(777));
    }

    #[test]
    fn key_matching_is_case_sensitive() {
        let source = make_field(1, "priority_level", FieldType::Tagger);
        let destination = make_catalog(
            vec![make_field(2, "Priority_Level", FieldType::Tagger)],
            vec![],
        );

        assert_eq!(resolve_field(&source, &destination).unwrap(), Match::Absent);
    }

    #[test]
    fn absent_when_destination_lacks_key() {
        let source = make_field(1, "warranty_date", FieldType::Date);
        let destination = make_catalog(vec![], vec![]);

        assert_eq!(resolve_field(&source, &destination).unwrap(), Match::Absent);
    }

    #[test]
    fn duplicate_destination_keys_are_fatal() {
        let source = make_field(1, "category", FieldType::Tagger);
        let destination = make_catalog(
            vec![
                make_field(2, "category", FieldType::Tagger),
                make_field(3, "category", FieldType::Text),
            ],
            vec![],
        );

        assert!(resolve_field(&source, &destination).is_err());
    }

    #[test]
    fn type_mismatch_still_matches_by_key() {
        // Match-by-key only; attribute differences are not a conflict
        let source = make_field(1, "category", FieldType::Tagger);
        let destination = make_catalog(vec![make_field(9, "category", FieldType::Text)], vec![]);

        assert_eq!(resolve_field(&source, &destination).unwrap(), Match::Existing(9));
    }

    #[test]
    fn system_fields_match_on_type() {
        let mut source = make_field(100, "priority", FieldType::Priority);
        source.key = "priority".to_string();
        let mut existing = make_field(900, "priority", FieldType::Priority);
        existing.key = "priority".to_string();
        let destination = make_catalog(vec![existing], vec![]);

        assert_eq!(resolve_field(&source, &destination).unwrap(), Match::Existing(900));
    }

    #[test]
    fn objects_match_by_key() {
        let source = make_object(5, "asset");
        let destination = make_catalog(vec![], vec![make_object(50, "asset")]);

        assert_eq!(resolve_object(&source, &destination).unwrap(), Match::Existing(50));

        let missing = make_object(6, "license");
        assert_eq!(resolve_object(&missing, &destination).unwrap(), Match::Absent);
    }
}
