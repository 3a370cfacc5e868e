//! Turns solver placements into caller-facing entries and grid views.
//!
//! `period_order` ranks a slot among the slots that actually appear in the
//! result, not among all input slots, so a reloaded timetable that references
//! slots outside the current selection still orders sensibly.

use crate::data::{Assignment, Day, Entry, ScheduleSlot, SlotId};
use crate::slots::by_start_time;
use itertools::Itertools;
use serde::Serialize;
use std::collections::HashMap;

/// One assignment bound to a cell, as tracked by the solver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub assignment: usize,
    pub day: Day,
    pub slot_id: SlotId,
}

/// Builds entries in assignment input order.
pub fn project(
    assignments: &[Assignment],
    placements: &[Placement],
    slots: &[ScheduleSlot],
) -> Vec<Entry> {
    let mut entries: Vec<Entry> = placements
        .iter()
        .sorted_by_key(|p| p.assignment)
        .filter_map(|p| {
            let a = assignments.get(p.assignment)?;
            Some(Entry {
                teacher_id: a.teacher_id.clone(),
                class_id: a.class_id.clone(),
                subject_id: a.subject_id.clone(),
                schedule_slot_id: p.slot_id.clone(),
                day: p.day,
                period_order: 0,
            })
        })
        .collect();
    assign_period_orders(&mut entries, slots);
    entries
}

/// Recomputes `period_order` for every entry: the 1-based rank of its slot
/// among the distinct slots in use. Slots missing from `known_slots` rank
/// after the known ones, by id.
pub fn assign_period_orders(entries: &mut [Entry], known_slots: &[ScheduleSlot]) {
    let orders: Vec<u32> = {
        let ranks = period_ranks(entries, known_slots);
        entries
            .iter()
            .map(|e| ranks.get(e.schedule_slot_id.as_str()).copied().unwrap_or(0))
            .collect()
    };
    for (entry, order) in entries.iter_mut().zip(orders) {
        entry.period_order = order;
    }
}

fn period_ranks<'a>(
    entries: &'a [Entry],
    known_slots: &[ScheduleSlot],
) -> HashMap<&'a str, u32> {
    let known: HashMap<&str, &ScheduleSlot> =
        known_slots.iter().map(|s| (s.id.as_str(), s)).collect();

    let (mut known_used, mut unknown_used): (Vec<&str>, Vec<&str>) = entries
        .iter()
        .map(|e| e.schedule_slot_id.as_str())
        .unique()
        .partition(|id| known.contains_key(id));
    known_used.sort_by(|a, b| by_start_time(known[a], known[b]));
    unknown_used.sort();

    known_used
        .into_iter()
        .chain(unknown_used)
        .enumerate()
        .map(|(rank, id)| (id, rank as u32 + 1))
        .collect()
}

/// Display names keyed by id, taken from the assignment list.
#[derive(Debug, Clone, Default)]
pub struct Labels {
    teachers: HashMap<String, String>,
    classes: HashMap<String, String>,
    subjects: HashMap<String, String>,
}

impl Labels {
    pub fn from_assignments(assignments: &[Assignment]) -> Self {
        let mut labels = Self::default();
        for a in assignments {
            insert_label(&mut labels.teachers, &a.teacher_id, &a.teacher_name);
            insert_label(&mut labels.classes, &a.class_id, &a.class_name);
            insert_label(&mut labels.subjects, &a.subject_id, &a.subject_name);
        }
        labels
    }

    /// Falls back to the id when no name is known.
    pub fn teacher<'a>(&'a self, id: &'a str) -> &'a str {
        self.teachers.get(id).map(String::as_str).unwrap_or(id)
    }

    pub fn class<'a>(&'a self, id: &'a str) -> &'a str {
        self.classes.get(id).map(String::as_str).unwrap_or(id)
    }

    pub fn subject<'a>(&'a self, id: &'a str) -> &'a str {
        self.subjects.get(id).map(String::as_str).unwrap_or(id)
    }
}

fn insert_label(map: &mut HashMap<String, String>, id: &str, name: &str) {
    if !name.is_empty() {
        map.entry(id.to_string()).or_insert_with(|| name.to_string());
    }
}

/// A text cell of a grid view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    /// Indices into the entry list the view was built from.
    pub entries: Vec<usize>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRow {
    pub key: String,
    pub label: String,
    /// One cell per (day, slot), day-major.
    pub cells: Vec<GridCell>,
}

/// A teacher-by-cell or class-by-cell table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridView {
    pub days: Vec<Day>,
    pub slots: Vec<ScheduleSlot>,
    pub rows: Vec<GridRow>,
}

impl GridView {
    pub fn cell(&self, row_key: &str, day: Day, slot_id: &str) -> Option<&GridCell> {
        let row = self.rows.iter().find(|r| r.key == row_key)?;
        let d = self.days.iter().position(|x| *x == day)?;
        let s = self.slots.iter().position(|x| x.id == slot_id)?;
        row.cells.get(d * self.slots.len() + s)
    }
}

/// Rows per teacher, in first-appearance order. Cells read "class\nsubject".
pub fn teacher_view(
    entries: &[Entry],
    days: &[Day],
    slots: &[ScheduleSlot],
    labels: &Labels,
) -> GridView {
    build_view(
        entries,
        days,
        slots,
        |e| e.teacher_id.as_str(),
        |k| labels.teacher(k).to_string(),
        |e| format!("{}\n{}", labels.class(&e.class_id), labels.subject(&e.subject_id)),
    )
}

/// Rows per class. Parallel entries in one cell are separated by "\n---\n".
pub fn class_view(
    entries: &[Entry],
    days: &[Day],
    slots: &[ScheduleSlot],
    labels: &Labels,
) -> GridView {
    build_view(
        entries,
        days,
        slots,
        |e| e.class_id.as_str(),
        |k| labels.class(k).to_string(),
        |e| format!("{}\n{}", labels.subject(&e.subject_id), labels.teacher(&e.teacher_id)),
    )
}

fn build_view<'e>(
    entries: &'e [Entry],
    days: &[Day],
    slots: &[ScheduleSlot],
    row_key: impl Fn(&'e Entry) -> &'e str,
    row_label: impl Fn(&str) -> String,
    cell_text: impl Fn(&Entry) -> String,
) -> GridView {
    let day_pos: HashMap<Day, usize> =
        days.iter().enumerate().map(|(i, d)| (*d, i)).collect();
    let slot_pos: HashMap<&str, usize> =
        slots.iter().enumerate().map(|(i, s)| (s.id.as_str(), i)).collect();
    let width = days.len() * slots.len();

    let keys: Vec<&str> = entries.iter().map(&row_key).unique().collect();
    let row_index: HashMap<&str, usize> =
        keys.iter().enumerate().map(|(i, k)| (*k, i)).collect();
    let mut cells: Vec<Vec<Vec<usize>>> = vec![vec![Vec::new(); width]; keys.len()];

    for (i, entry) in entries.iter().enumerate() {
        let day = day_pos.get(&entry.day);
        let slot = slot_pos.get(entry.schedule_slot_id.as_str());
        let (Some(d), Some(s)) = (day, slot) else {
            continue;
        };
        cells[row_index[row_key(entry)]][d * slots.len() + s].push(i);
    }

    let rows = keys
        .iter()
        .zip(cells)
        .map(|(key, row_cells)| GridRow {
            key: key.to_string(),
            label: row_label(key),
            cells: row_cells
                .into_iter()
                .map(|idx| GridCell {
                    text: idx.iter().map(|i| cell_text(&entries[*i])).join("\n---\n"),
                    entries: idx,
                })
                .collect(),
        })
        .collect();

    GridView {
        days: days.to_vec(),
        slots: slots.to_vec(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(id: &str, start: &str) -> ScheduleSlot {
        ScheduleSlot::new(id, id, start, "23:00")
    }

    fn entry(teacher: &str, class: &str, slot_id: &str, day: Day) -> Entry {
        Entry {
            teacher_id: teacher.into(),
            class_id: class.into(),
            subject_id: "math".into(),
            schedule_slot_id: slot_id.into(),
            day,
            period_order: 0,
        }
    }

    #[test]
    fn period_order_ranks_only_used_slots() {
        let slots = vec![
            slot("s1", "08:00"),
            slot("s2", "09:00"),
            slot("s3", "10:00"),
        ];
        let mut entries = vec![
            entry("t1", "c1", "s3", Day::Monday),
            entry("t2", "c2", "s1", Day::Monday),
        ];
        assign_period_orders(&mut entries, &slots);
        assert_eq!(entries[0].period_order, 2);
        assert_eq!(entries[1].period_order, 1);
    }

    #[test]
    fn unknown_slots_rank_after_known() {
        let slots = vec![slot("s1", "08:00")];
        let mut entries = vec![
            entry("t1", "c1", "zz-old", Day::Monday),
            entry("t2", "c2", "s1", Day::Monday),
            entry("t3", "c3", "aa-old", Day::Monday),
        ];
        assign_period_orders(&mut entries, &slots);
        let orders: Vec<u32> = entries.iter().map(|e| e.period_order).collect();
        assert_eq!(orders, vec![3, 1, 2]);
    }

    #[test]
    fn project_keeps_input_order() {
        let assignments = vec![
            Assignment::new("t1", "c1", "m"),
            Assignment::new("t2", "c2", "p"),
        ];
        let placements = vec![
            Placement {
                assignment: 1,
                day: Day::Sunday,
                slot_id: "s1".into(),
            },
            Placement {
                assignment: 0,
                day: Day::Sunday,
                slot_id: "s2".into(),
            },
        ];
        let slots = vec![slot("s1", "08:00"), slot("s2", "09:00")];
        let entries = project(&assignments, &placements, &slots);
        assert_eq!(entries[0].teacher_id, "t1");
        assert_eq!(entries[0].period_order, 2);
        assert_eq!(entries[1].subject_id, "p");
        assert_eq!(entries[1].period_order, 1);
    }

    #[test]
    fn class_view_stacks_parallel_entries() {
        let assignments = vec![
            Assignment::new("t1", "c1", "math").with_labels("Ahmad", "7A", "Math"),
            Assignment::new("t2", "c1", "math").with_labels("Bilal", "7A", "Math"),
        ];
        let labels = Labels::from_assignments(&assignments);
        let slots = vec![slot("s1", "08:00")];
        let entries = vec![
            entry("t1", "c1", "s1", Day::Monday),
            entry("t2", "c1", "s1", Day::Monday),
        ];
        let view = class_view(&entries, &[Day::Monday], &slots, &labels);
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].label, "7A");
        let cell = view.cell("c1", Day::Monday, "s1").unwrap();
        assert_eq!(cell.entries, vec![0, 1]);
        assert_eq!(cell.text, "Math\nAhmad\n---\nMath\nBilal");
    }

    #[test]
    fn teacher_view_skips_cells_outside_grid() {
        let labels = Labels::default();
        let slots = vec![slot("s1", "08:00")];
        let entries = vec![
            entry("t1", "c1", "s1", Day::Monday),
            entry("t1", "c2", "s1", Day::Tuesday),
        ];
        let view = teacher_view(&entries, &[Day::Monday], &slots, &labels);
        assert_eq!(view.rows[0].label, "t1");
        assert_eq!(view.rows[0].cells.len(), 1);
        assert_eq!(view.rows[0].cells[0].text, "c1\nmath");
    }
}
