#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use timetable_solver::{
    Assignment, ClassCapacity, Day, Entry, Preference, ScheduleSlot, SolveResult,
};

pub fn slots(n: usize) -> Vec<ScheduleSlot> {
    (0..n)
        .map(|i| {
            ScheduleSlot::new(
                format!("slot-{i}"),
                format!("Period {}", i + 1),
                format!("{:02}:00", 8 + i),
                format!("{:02}:40", 8 + i),
            )
        })
        .collect()
}

/// Panics with a description of the first broken timetable invariant.
pub fn assert_invariants(
    assignments: &[Assignment],
    slots: &[ScheduleSlot],
    days: &[Day],
    preferences: &[Preference],
    capacity: &ClassCapacity,
    result: &SolveResult,
) {
    assert_entries_consistent(&result.entries, capacity);

    let slot_ids: HashSet<&str> = slots.iter().map(|s| s.id.as_str()).collect();
    let mut blocked: HashMap<&str, HashSet<&str>> = HashMap::new();
    for p in preferences.iter().filter(|p| p.is_active) {
        blocked
            .entry(p.teacher_id.as_str())
            .or_default()
            .extend(p.blocked_slot_ids.iter().map(String::as_str));
    }
    for e in &result.entries {
        assert!(
            !blocked
                .get(e.teacher_id.as_str())
                .is_some_and(|b| b.contains(e.schedule_slot_id.as_str())),
            "teacher {} placed in blocked slot {}",
            e.teacher_id,
            e.schedule_slot_id
        );
        assert!(
            slot_ids.contains(e.schedule_slot_id.as_str()),
            "unselected slot {}",
            e.schedule_slot_id
        );
        assert!(days.contains(&e.day), "unselected day {}", e.day);
    }

    let mut balance: HashMap<(&str, &str, &str), i64> = HashMap::new();
    for a in assignments {
        *balance.entry(assignment_key(a)).or_default() += 1;
    }
    for e in &result.entries {
        let key = (
            e.teacher_id.as_str(),
            e.class_id.as_str(),
            e.subject_id.as_str(),
        );
        *balance.entry(key).or_default() -= 1;
    }
    for a in &result.unscheduled {
        *balance.entry(assignment_key(a)).or_default() -= 1;
    }
    assert!(
        balance.values().all(|v| *v == 0),
        "placed + unscheduled differs from the input: {:?}",
        balance.iter().filter(|(_, v)| **v != 0).collect::<Vec<_>>()
    );
    assert_eq!(result.entries.len() + result.unscheduled.len(), assignments.len());
}

fn assignment_key(a: &Assignment) -> (&str, &str, &str) {
    (
        a.teacher_id.as_str(),
        a.class_id.as_str(),
        a.subject_id.as_str(),
    )
}

/// No teacher double-booked and no class over capacity.
pub fn assert_entries_consistent(entries: &[Entry], capacity: &ClassCapacity) {
    assert!(entries_consistent(entries, capacity), "conflicting entries: {:?}", entries);
}

pub fn entries_consistent(entries: &[Entry], capacity: &ClassCapacity) -> bool {
    let mut teachers = HashSet::new();
    let mut classes: HashMap<(&str, Day, &str), usize> = HashMap::new();
    for e in entries {
        if !teachers.insert((e.teacher_id.as_str(), e.day, e.schedule_slot_id.as_str())) {
            return false;
        }
        let load = classes
            .entry((e.class_id.as_str(), e.day, e.schedule_slot_id.as_str()))
            .or_default();
        *load += 1;
        if *load > capacity.get(&e.class_id) {
            return false;
        }
    }
    true
}
