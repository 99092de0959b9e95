use tracing::{debug, info};

use crate::types::{PlacementRecord, RefField, ReferenceMap};

/// Resolve group and unit foreign keys against the reference maps, in place.
/// Resolution is best-effort: an id with no reference row stays `Unresolved`
/// and travels on through the pipeline untouched.
pub fn resolve_references(
    records: &mut [PlacementRecord],
    groups: &ReferenceMap,
    units: &ReferenceMap,
) {
    let mut misses = 0usize;
    for record in records.iter_mut() {
        misses += resolve_field(&mut record.group, groups, "group", &record.identifier);
        misses += resolve_field(&mut record.unit, units, "unit", &record.identifier);
    }
    info!(records = records.len(), misses, "reference resolution complete");
}

fn resolve_field(
    field: &mut RefField,
    map: &ReferenceMap,
    kind: &'static str,
    identifier: &str,
) -> usize {
    if let RefField::Unresolved(raw) = *field {
        match map.get(raw) {
            Some(name) => {
                *field = RefField::Resolved(name.to_string());
                0
            }
            None => {
                debug!(kind, raw, identifier, "no reference entry, leaving raw id in place");
                1
            }
        }
    } else {
        0
    }
}
