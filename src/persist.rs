//! Save and load shapes for the external persistence layer.
//!
//! Field names here are the storage contract and must not change: they are
//! read back verbatim when a saved timetable is loaded.

use crate::data::{Day, Entry, SlotId};
use crate::error::StoreError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One stored entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct PersistedEntry {
    pub class_academic_year_id: String,
    pub subject_id: String,
    pub teacher_id: String,
    pub schedule_slot_id: String,
    pub day_name: Day,
    pub period_order: u32,
}

impl From<&Entry> for PersistedEntry {
    fn from(e: &Entry) -> Self {
        Self {
            class_academic_year_id: e.class_id.clone(),
            subject_id: e.subject_id.clone(),
            teacher_id: e.teacher_id.clone(),
            schedule_slot_id: e.schedule_slot_id.clone(),
            day_name: e.day,
            period_order: e.period_order,
        }
    }
}

impl From<&PersistedEntry> for Entry {
    fn from(p: &PersistedEntry) -> Self {
        Self {
            teacher_id: p.teacher_id.clone(),
            class_id: p.class_academic_year_id.clone(),
            subject_id: p.subject_id.clone(),
            schedule_slot_id: p.schedule_slot_id.clone(),
            day: p.day_name,
            period_order: p.period_order,
        }
    }
}

fn default_timetable_type() -> String {
    "teaching".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SaveTimetableRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_timetable_type")]
    pub timetable_type: String,
    #[serde(default)]
    pub academic_year_id: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub entries: Vec<PersistedEntry>,
}

/// Builds a save request for the given entries with default header fields.
pub fn to_save_request(name: impl Into<String>, entries: &[Entry]) -> SaveTimetableRequest {
    SaveTimetableRequest {
        name: name.into(),
        description: None,
        timetable_type: default_timetable_type(),
        academic_year_id: None,
        is_active: true,
        entries: entries.iter().map(PersistedEntry::from).collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimetableHeader {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub timetable_type: String,
    pub academic_year_id: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoadedTimetable {
    pub timetable: TimetableHeader,
    pub entries: Vec<PersistedEntry>,
}

/// Placement state rebuilt from a stored timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoredTimetable {
    /// Distinct slot ids, first-seen order.
    pub slot_ids: Vec<SlotId>,
    /// Distinct weekdays, first-seen order. Empty when `all_year`.
    pub days: Vec<Day>,
    pub all_year: bool,
    pub entries: Vec<Entry>,
}

/// Rebuilds placement state. Trusts the stored data: no constraint checks,
/// and references to slots or teachers that no longer exist pass through.
pub fn load(loaded: &LoadedTimetable) -> RestoredTimetable {
    let mut slot_ids: Vec<SlotId> = Vec::new();
    let mut days: Vec<Day> = Vec::new();
    let mut all_year = false;

    for e in &loaded.entries {
        if !e.schedule_slot_id.is_empty() && !slot_ids.contains(&e.schedule_slot_id) {
            slot_ids.push(e.schedule_slot_id.clone());
        }
        if e.day_name.is_all_year() {
            all_year = true;
        } else if !days.contains(&e.day_name) {
            days.push(e.day_name);
        }
    }
    if all_year {
        days.clear();
    }

    debug!(
        "Restored timetable {} with {} entries over {} slots.",
        loaded.timetable.id,
        loaded.entries.len(),
        slot_ids.len()
    );
    RestoredTimetable {
        slot_ids,
        days,
        all_year,
        entries: loaded.entries.iter().map(Entry::from).collect(),
    }
}

/// The external persistence layer.
pub trait TimetableStore {
    fn save(&mut self, request: SaveTimetableRequest) -> Result<String, StoreError>;
    fn load(&self, id: &str) -> Result<LoadedTimetable, StoreError>;
    fn list(&self) -> Vec<TimetableHeader>;
    fn delete(&mut self, id: &str) -> Result<(), StoreError>;
}

/// Keeps timetables in memory, ordered by id.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    next_id: u64,
    timetables: BTreeMap<String, LoadedTimetable>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimetableStore for InMemoryStore {
    fn save(&mut self, request: SaveTimetableRequest) -> Result<String, StoreError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidRequest("name is required".to_string()));
        }
        self.next_id += 1;
        let id = format!("tt-{:06}", self.next_id);
        info!("Saving timetable {} ({} entries).", id, request.entries.len());
        let header = TimetableHeader {
            id: id.clone(),
            name: name.to_string(),
            description: request.description,
            timetable_type: request.timetable_type,
            academic_year_id: request.academic_year_id,
            is_active: request.is_active,
        };
        let mut entries = request.entries;
        entries.sort_by_key(|e| e.period_order);
        self.timetables.insert(
            id.clone(),
            LoadedTimetable {
                timetable: header,
                entries,
            },
        );
        Ok(id)
    }

    fn load(&self, id: &str) -> Result<LoadedTimetable, StoreError> {
        self.timetables
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn list(&self) -> Vec<TimetableHeader> {
        self.timetables.values().map(|t| t.timetable.clone()).collect()
    }

    fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        self.timetables
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(slot: &str, day: Day, order: u32) -> Entry {
        Entry {
            teacher_id: "t1".into(),
            class_id: "c1".into(),
            subject_id: "m".into(),
            schedule_slot_id: slot.into(),
            day,
            period_order: order,
        }
    }

    #[test]
    fn wire_names_match_storage_contract() {
        let p = PersistedEntry::from(&entry("s1", Day::AllYear, 2));
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "class_academic_year_id": "c1",
                "subject_id": "m",
                "teacher_id": "t1",
                "schedule_slot_id": "s1",
                "day_name": "all_year",
                "period_order": 2
            })
        );
    }

    #[test]
    fn save_request_defaults() {
        let req: SaveTimetableRequest =
            serde_json::from_str(r#"{"name":"Term 1","entries":[]}"#).unwrap();
        assert_eq!(req.timetable_type, "teaching");
        assert!(req.is_active);
        assert_eq!(req.description, None);
    }

    #[test]
    fn load_collects_slots_and_days() {
        let entries = vec![
            entry("s2", Day::Monday, 2),
            entry("s1", Day::Sunday, 1),
            entry("s2", Day::Sunday, 2),
        ];
        let loaded = LoadedTimetable {
            timetable: TimetableHeader {
                id: "x".into(),
                name: "x".into(),
                description: None,
                timetable_type: "teaching".into(),
                academic_year_id: None,
                is_active: true,
            },
            entries: entries.iter().map(PersistedEntry::from).collect(),
        };
        let restored = load(&loaded);
        assert_eq!(restored.slot_ids, vec!["s2", "s1"]);
        assert_eq!(restored.days, vec![Day::Monday, Day::Sunday]);
        assert!(!restored.all_year);
        assert_eq!(restored.entries, entries);
    }

    #[test]
    fn all_year_sentinel_is_detected() {
        let mut store = InMemoryStore::new();
        let id = store
            .save(to_save_request("Year", &[entry("s1", Day::AllYear, 1)]))
            .unwrap();
        let restored = load(&store.load(&id).unwrap());
        assert!(restored.all_year);
        assert!(restored.days.is_empty());
    }

    #[test]
    fn store_rejects_blank_names_and_missing_ids() {
        let mut store = InMemoryStore::new();
        assert!(matches!(
            store.save(to_save_request("   ", &[])),
            Err(StoreError::InvalidRequest(_))
        ));
        assert_eq!(store.load("tt-9"), Err(StoreError::NotFound("tt-9".into())));
        let id = store.save(to_save_request(" Draft ", &[])).unwrap();
        assert_eq!(store.list()[0].name, "Draft");
        store.delete(&id).unwrap();
        assert!(store.list().is_empty());
        assert!(store.delete(&id).is_err());
    }
}
