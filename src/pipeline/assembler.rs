use crate::types::PlacementRecord;

/// Output column order. The tabular artifacts carry no header row, so this
/// order is the whole contract; the structured dump reuses the same names as
/// explicit keys.
pub const COLUMNS: [&str; 7] = [
    "identifier",
    "given_name",
    "family_name",
    "preferred_name",
    "group_name",
    "unit_name",
    "student_category",
];

pub type DatasetRow = [String; 7];

/// An ordered, fully projected dataset ready for a writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub rows: Vec<DatasetRow>,
}

/// Project records onto the fixed output schema, preserving order. This is a
/// faithful passthrough: never-matched name fields project to empty strings
/// and unresolved refs to their raw ids, exactly as the join left them.
pub fn assemble(records: &[PlacementRecord]) -> Dataset {
    Dataset {
        rows: records.iter().map(project).collect(),
    }
}

fn project(record: &PlacementRecord) -> DatasetRow {
    [
        record.identifier.clone(),
        record.given_name.clone().unwrap_or_default(),
        record.family_name.clone().unwrap_or_default(),
        record.preferred_name.clone().unwrap_or_default(),
        record.group.display_value(),
        record.unit.display_value(),
        record.student_category.clone(),
    ]
}
