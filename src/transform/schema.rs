//! Entry lookup built from a form definition

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::model::{FormDefinition, FormIdentity};

/// Where an entry sits inside its form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryLocation {
    pub section_name: String,
    pub sheet_name: String,
    pub sheet_position: i64,
    pub guid: String,
    pub label: String,
    pub entry_position: i64,
}

/// A distinct section name and the position it was first seen with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionOrder {
    pub name: String,
    pub position: i64,
}

/// Entry id lookup plus canonical section ordering for one form
#[derive(Debug, Clone, Default)]
pub struct SchemaIndex {
    pub form: FormIdentity,
    pub entries: HashMap<u64, EntryLocation>,
    pub section_order: Vec<SectionOrder>,
    /// Entry ids that appeared more than once; the last occurrence is kept
    pub collisions: Vec<u64>,
}

impl SchemaIndex {
    pub fn build(form: &FormDefinition) -> Self {
        let mut index = SchemaIndex {
            form: form.identity(),
            ..Default::default()
        };

        for section in &form.sections {
            let section_name = section.title();
            if !index.section_order.iter().any(|s| s.name == section_name) {
                index.section_order.push(SectionOrder {
                    name: section_name.to_string(),
                    position: section.position,
                });
            }

            for sheet in &section.sheets {
                for entry in &sheet.entries {
                    let Some(entry_id) = entry.id else {
                        continue;
                    };
                    let location = EntryLocation {
                        section_name: section_name.to_string(),
                        sheet_name: sheet.title().to_string(),
                        sheet_position: sheet.position,
                        guid: entry.guid.clone(),
                        label: entry.label.clone(),
                        entry_position: entry.position,
                    };
                    if let Some(previous) = index.entries.insert(entry_id, location) {
                        warn!(
                            "Entry id {entry_id} appears more than once in form {}; \
                             '{}' in section '{}' replaces it",
                            index.form.id, entry.label, section_name
                        );
                        debug!("Replaced entry {entry_id} location: {previous:?}");
                        index.collisions.push(entry_id);
                    }
                }
            }
        }

        // sort_by_key is stable, so equal positions keep encounter order
        index.section_order.sort_by_key(|s| s.position);

        debug!(
            "Indexed form {}: {} entries across {} sections",
            index.form.id,
            index.entries.len(),
            index.section_order.len()
        );
        index
    }

    pub fn get(&self, entry_id: u64) -> Option<&EntryLocation> {
        self.entries.get(&entry_id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(value: serde_json::Value) -> FormDefinition {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_sections_sorted_by_position() {
        let form = form(json!({
            "id": 1,
            "sections": [
                {"description": "S1", "position": 2, "sheets": [
                    {"description": "A", "position": 1, "entries": [{"id": 11, "position": 1}]}
                ]},
                {"description": "S2", "position": 1, "sheets": [
                    {"description": "B", "position": 1, "entries": [{"id": 21, "position": 1}]}
                ]}
            ]
        }));

        let index = SchemaIndex::build(&form);
        let names: Vec<_> = index.section_order.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["S2", "S1"]);
    }

    #[test]
    fn test_entry_locations() {
        let form = form(json!({
            "id": 7,
            "name": "Survey",
            "sections": [{"description": "Intake", "position": 1, "sheets": [
                {"description": "Basics", "position": 3, "entries": [
                    {"id": 101, "guid": "g1", "label": "First", "position": 1},
                    {"id": 102, "guid": "g2", "label": "Second", "position": 2}
                ]}
            ]}]
        }));

        let index = SchemaIndex::build(&form);
        assert_eq!(index.form.name, "Survey");
        assert_eq!(
            index.get(102),
            Some(&EntryLocation {
                section_name: "Intake".into(),
                sheet_name: "Basics".into(),
                sheet_position: 3,
                guid: "g2".into(),
                label: "Second".into(),
                entry_position: 2,
            })
        );
        assert!(index.get(999).is_none());
        assert!(index.collisions.is_empty());
    }

    #[test]
    fn test_duplicate_section_names_merge() {
        let form = form(json!({
            "sections": [
                {"description": "Repeat", "position": 5, "sheets": []},
                {"description": "Other", "position": 3, "sheets": []},
                {"description": "Repeat", "position": 1, "sheets": []}
            ]
        }));

        let index = SchemaIndex::build(&form);
        assert_eq!(
            index.section_order,
            vec![
                SectionOrder { name: "Other".into(), position: 3 },
                SectionOrder { name: "Repeat".into(), position: 5 },
            ]
        );
    }

    #[test]
    fn test_equal_positions_keep_encounter_order() {
        let form = form(json!({
            "sections": [
                {"description": "Zulu", "position": 1},
                {"description": "Alpha", "position": 1},
                {"description": "Mike", "position": 0}
            ]
        }));

        let index = SchemaIndex::build(&form);
        let names: Vec<_> = index.section_order.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Mike", "Zulu", "Alpha"]);
    }

    #[test]
    fn test_colliding_entry_ids_last_write_wins() {
        let form = form(json!({
            "sections": [
                {"description": "First", "position": 1, "sheets": [
                    {"description": "One", "entries": [{"id": 5, "label": "early"}]}
                ]},
                {"description": "Second", "position": 2, "sheets": [
                    {"description": "Two", "entries": [{"id": 5, "label": "late"}]}
                ]}
            ]
        }));

        let index = SchemaIndex::build(&form);
        let location = index.get(5).unwrap();
        assert_eq!(location.label, "late");
        assert_eq!(location.section_name, "Second");
        assert_eq!(index.collisions, vec![5]);
    }

    #[test]
    fn test_entries_without_id_are_skipped() {
        let form = form(json!({
            "sections": [{"description": "S", "sheets": [
                {"description": "T", "entries": [{"label": "no id"}, {"id": 0}, {"id": 3}]}
            ]}]
        }));

        let index = SchemaIndex::build(&form);
        assert_eq!(index.entries.len(), 1);
        assert!(index.get(3).is_some());
    }

    #[test]
    fn test_empty_form() {
        let index = SchemaIndex::build(&FormDefinition::default());
        assert!(index.is_empty());
        assert!(index.section_order.is_empty());
    }
}
