use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::{info, warn};

use crate::types::{PlacementRecord, RegistryRecord, ResultSet};

/// Match placement records against the citizen registry by national
/// identifier. Matches get their name fields filled in from the registry
/// row; the rest pass through untouched into the unmatched set. Both sets
/// preserve input order and together account for every input record.
pub fn join_registry(records: Vec<PlacementRecord>, registry: &[RegistryRecord]) -> ResultSet {
    let by_identifier = index_registry(registry);

    let mut results = ResultSet::default();
    for mut record in records {
        match by_identifier.get(record.identifier.as_str()) {
            Some(row) => {
                record.given_name = Some(row.given_name.clone());
                record.family_name = Some(row.family_name.clone());
                // preferred name defaults to the given name
                record.preferred_name = Some(row.given_name.clone());
                results.matched.push(record);
            }
            None => results.unmatched.push(record),
        }
    }

    info!(
        matched = results.matched.len(),
        unmatched = results.unmatched.len(),
        "identity join complete"
    );
    results
}

/// Key the registry by identifier. The exports are assumed to hold no
/// duplicates; if one shows up anyway the first occurrence wins, which keeps
/// the first-match join semantics while making the conflict visible.
fn index_registry(registry: &[RegistryRecord]) -> HashMap<&str, &RegistryRecord> {
    let mut by_identifier: HashMap<&str, &RegistryRecord> = HashMap::with_capacity(registry.len());
    for row in registry {
        match by_identifier.entry(row.identifier.as_str()) {
            Entry::Vacant(slot) => {
                slot.insert(row);
            }
            Entry::Occupied(_) => {
                warn!(identifier = %row.identifier, "duplicate registry identifier, keeping first occurrence");
            }
        }
    }
    by_identifier
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RefField;

    fn placement(identifier: &str) -> PlacementRecord {
        PlacementRecord {
            identifier: identifier.to_string(),
            given_name: None,
            family_name: None,
            preferred_name: None,
            group: RefField::Resolved("Ryhmä A".to_string()),
            unit: RefField::Resolved("Päiväkoti Keskusta".to_string()),
            student_category: "esioppilas".to_string(),
        }
    }

    fn citizen(identifier: &str, family: &str, given: &str) -> RegistryRecord {
        RegistryRecord {
            identifier: identifier.to_string(),
            given_name: given.to_string(),
            family_name: family.to_string(),
        }
    }

    #[test]
    fn match_fills_names_and_defaults_preferred_to_given() {
        let registry = vec![citizen("010101-123A", "Virtanen", "Maija")];
        let results = join_registry(vec![placement("010101-123A")], &registry);

        assert_eq!(results.matched.len(), 1);
        assert!(results.unmatched.is_empty());
        let record = &results.matched[0];
        assert_eq!(record.family_name.as_deref(), Some("Virtanen"));
        assert_eq!(record.given_name.as_deref(), Some("Maija"));
        assert_eq!(record.preferred_name.as_deref(), Some("Maija"));
    }

    #[test]
    fn unmatched_record_passes_through_untouched() {
        let registry = vec![citizen("020202-456B", "Korhonen", "Antti")];
        let input = placement("010101-123A");
        let expected = input.clone();
        let results = join_registry(vec![input], &registry);

        assert!(results.matched.is_empty());
        assert_eq!(results.unmatched, vec![expected]);
    }

    #[test]
    fn partition_is_complete_disjoint_and_order_preserving() {
        let registry = vec![
            citizen("010101-123A", "Virtanen", "Maija"),
            citizen("030303-789C", "Nieminen", "Liisa"),
        ];
        let input = vec![
            placement("010101-123A"),
            placement("020202-456B"),
            placement("030303-789C"),
            placement("040404-000D"),
        ];
        let total = input.len();
        let results = join_registry(input, &registry);

        assert_eq!(results.total(), total);
        let matched_ids: Vec<&str> = results
            .matched
            .iter()
            .map(|r| r.identifier.as_str())
            .collect();
        let unmatched_ids: Vec<&str> = results
            .unmatched
            .iter()
            .map(|r| r.identifier.as_str())
            .collect();
        assert_eq!(matched_ids, vec!["010101-123A", "030303-789C"]);
        assert_eq!(unmatched_ids, vec!["020202-456B", "040404-000D"]);
        assert!(matched_ids.iter().all(|id| !unmatched_ids.contains(id)));
    }

    #[test]
    fn duplicate_registry_identifier_keeps_first_occurrence() {
        let registry = vec![
            citizen("010101-123A", "Virtanen", "Maija"),
            citizen("010101-123A", "Lahtinen", "Maria"),
        ];
        let results = join_registry(vec![placement("010101-123A")], &registry);

        assert_eq!(results.matched[0].family_name.as_deref(), Some("Virtanen"));
    }
}
