//! Validation of manual moves during interactive repair.
//!
//! `can_move` is a pure linear scan, cheap enough to run on every drag
//! gesture. Blocked-slot preferences are not part of it; callers filter drop
//! targets with [`MoveValidator::drop_targets`] before offering them.

use crate::data::{ClassCapacity, Day, Entry, Preference, ScheduleSlot};
use crate::error::MoveError;
use log::{debug, trace};
use std::collections::HashSet;

/// Result of [`MoveValidator::apply_move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// Destination is the entry's current cell; nothing changed.
    NoOp,
    /// Teacher double-booking or class capacity would be violated.
    Rejected,
}

pub struct MoveValidator<'a> {
    slots: Option<&'a [ScheduleSlot]>,
    capacity: &'a ClassCapacity,
}

impl<'a> MoveValidator<'a> {
    /// Validator that also rejects slot ids missing from `slots`.
    pub fn new(slots: &'a [ScheduleSlot], capacity: &'a ClassCapacity) -> Self {
        Self {
            slots: Some(slots),
            capacity,
        }
    }

    /// Validator without a slot list, e.g. for a reloaded timetable whose
    /// slots are no longer all known.
    pub fn without_slot_check(capacity: &'a ClassCapacity) -> Self {
        Self {
            slots: None,
            capacity,
        }
    }

    /// Whether the entry at `moving_index` may go to (`new_slot_id`, `new_day`).
    ///
    /// Out-of-range indices and unknown slot ids are errors: they mean the
    /// caller's view is out of sync with the entry list.
    pub fn can_move(
        &self,
        entries: &[Entry],
        moving_index: usize,
        new_slot_id: &str,
        new_day: Day,
    ) -> Result<bool, MoveError> {
        let moving = entries.get(moving_index).ok_or(MoveError::EntryOutOfRange {
            index: moving_index,
            len: entries.len(),
        })?;
        if let Some(slots) = self.slots {
            if !slots.iter().any(|s| s.id == new_slot_id) {
                return Err(MoveError::UnknownSlot(new_slot_id.to_string()));
            }
        }

        let mut class_count = 0;
        for (i, e) in entries.iter().enumerate() {
            if i == moving_index || e.day != new_day || e.schedule_slot_id != new_slot_id {
                continue;
            }
            if e.teacher_id == moving.teacher_id {
                trace!("Teacher {} already busy at {} {}.", e.teacher_id, new_day, new_slot_id);
                return Ok(false);
            }
            if e.class_id == moving.class_id {
                class_count += 1;
            }
        }
        Ok(class_count < self.capacity.get(&moving.class_id))
    }

    /// Moving an entry onto its own cell changes nothing.
    pub fn is_noop(entry: &Entry, new_slot_id: &str, new_day: Day) -> bool {
        entry.schedule_slot_id == new_slot_id && entry.day == new_day
    }

    /// Every cell of the given grid the entry could be dropped on, skipping
    /// slots blocked for its teacher. Its current cell is included.
    pub fn drop_targets(
        &self,
        entries: &[Entry],
        moving_index: usize,
        days: &[Day],
        grid_slots: &[ScheduleSlot],
        preferences: &[Preference],
    ) -> Result<Vec<(Day, String)>, MoveError> {
        let moving = entries.get(moving_index).ok_or(MoveError::EntryOutOfRange {
            index: moving_index,
            len: entries.len(),
        })?;
        let blocked: HashSet<&str> = preferences
            .iter()
            .filter(|p| p.is_active && p.teacher_id == moving.teacher_id)
            .flat_map(|p| p.blocked_slot_ids.iter().map(String::as_str))
            .collect();

        let mut targets = Vec::new();
        for day in days {
            for slot in grid_slots.iter().filter(|s| !blocked.contains(s.id.as_str())) {
                if self.can_move(entries, moving_index, &slot.id, *day)? {
                    targets.push((*day, slot.id.clone()));
                }
            }
        }
        Ok(targets)
    }

    /// Validates and, when admissible, applies the move in place.
    pub fn apply_move(
        &self,
        entries: &mut [Entry],
        moving_index: usize,
        new_slot_id: &str,
        new_day: Day,
    ) -> Result<MoveOutcome, MoveError> {
        let entry = entries.get(moving_index).ok_or(MoveError::EntryOutOfRange {
            index: moving_index,
            len: entries.len(),
        })?;
        if Self::is_noop(entry, new_slot_id, new_day) {
            return Ok(MoveOutcome::NoOp);
        }
        if !self.can_move(entries, moving_index, new_slot_id, new_day)? {
            debug!(
                "Rejected move of entry {} to {} {}: conflict with another assignment.",
                moving_index, new_day, new_slot_id
            );
            return Ok(MoveOutcome::Rejected);
        }
        let entry = &mut entries[moving_index];
        entry.schedule_slot_id = new_slot_id.to_string();
        entry.day = new_day;
        Ok(MoveOutcome::Moved)
    }
}
