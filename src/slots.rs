use crate::data::{ScheduleSlot, SlotId};
use itertools::Itertools;
use log::trace;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Collapses duplicate slot ids (first occurrence wins) and sorts by start time.
pub fn normalize_slots(slots: &[ScheduleSlot]) -> Vec<ScheduleSlot> {
    let normalized: Vec<ScheduleSlot> = slots
        .iter()
        .unique_by(|s| s.id.as_str())
        .cloned()
        .sorted_by(by_start_time)
        .collect();
    if normalized.len() != slots.len() {
        trace!(
            "Collapsed {} duplicate schedule slots.",
            slots.len() - normalized.len()
        );
    }
    normalized
}

/// Start time first; end time and id break ties so the order is total.
pub fn by_start_time(a: &ScheduleSlot, b: &ScheduleSlot) -> Ordering {
    a.start_time
        .cmp(&b.start_time)
        .then_with(|| a.end_time.cmp(&b.end_time))
        .then_with(|| a.id.cmp(&b.id))
}

/// The normalized subset of `available` whose ids were selected.
pub fn select_slots(available: &[ScheduleSlot], selected_ids: &[SlotId]) -> Vec<ScheduleSlot> {
    let wanted: HashSet<&str> = selected_ids.iter().map(String::as_str).collect();
    normalize_slots(available)
        .into_iter()
        .filter(|s| wanted.contains(s.id.as_str()))
        .collect()
}

/// Resolves slot ids in use (e.g. from a reloaded timetable). Unknown ids are skipped.
pub fn slots_for_ids<'a, I>(available: &[ScheduleSlot], ids: I) -> Vec<ScheduleSlot>
where
    I: IntoIterator<Item = &'a SlotId>,
{
    let used: HashSet<&str> = ids.into_iter().map(String::as_str).collect();
    normalize_slots(available)
        .into_iter()
        .filter(|s| used.contains(s.id.as_str()))
        .collect()
}
