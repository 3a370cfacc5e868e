use crate::data::{Assignment, ClassCapacity, ClassId, Day};
use itertools::Itertools;
use log::debug;

/// Capacity used when a class has more obligations than grid cells.
pub const OVERFLOW_CAPACITY: usize = 2;

/// Computes per-class cell capacity.
///
/// A class gets [`OVERFLOW_CAPACITY`] parallel placements per cell when its
/// assignment count exceeds `slot_count × day_count` (one day when `all_year`),
/// otherwise 1. Never fails.
pub fn plan_capacity(
    assignments: &[Assignment],
    days: &[Day],
    all_year: bool,
    slot_count: usize,
) -> ClassCapacity {
    let per_day = if all_year { 1 } else { days.iter().unique().count() };
    let per_class_slots = slot_count * per_day;

    assignments
        .iter()
        .counts_by(|a| a.class_id.clone())
        .into_iter()
        .map(|(class_id, count): (ClassId, usize)| {
            let capacity = if count > per_class_slots {
                debug!(
                    "Class {} has {} assignments for {} cells; allowing {} per cell.",
                    class_id,
                    count,
                    per_class_slots,
                    OVERFLOW_CAPACITY
                );
                OVERFLOW_CAPACITY
            } else {
                1
            };
            (class_id, capacity)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignments(class_id: &str, n: usize) -> Vec<Assignment> {
        (0..n)
            .map(|i| Assignment::new(format!("t{i}"), class_id, format!("s{i}")))
            .collect()
    }

    #[test]
    fn overflowing_class_gets_two() {
        let cap = plan_capacity(&assignments("c1", 3), &[Day::Monday], false, 2);
        assert_eq!(cap.get("c1"), 2);
    }

    #[test]
    fn exact_fit_stays_at_one() {
        let cap = plan_capacity(&assignments("c1", 4), &[Day::Monday, Day::Tuesday], false, 2);
        assert_eq!(cap.get("c1"), 1);
    }

    #[test]
    fn all_year_counts_a_single_day() {
        let days = Day::WEEK.to_vec();
        let cap = plan_capacity(&assignments("c1", 3), &days, true, 2);
        assert_eq!(cap.get("c1"), 2);
        let cap = plan_capacity(&assignments("c1", 3), &days, false, 2);
        assert_eq!(cap.get("c1"), 1);
    }

    #[test]
    fn classes_are_planned_independently() {
        let mut all = assignments("big", 5);
        all.extend(assignments("small", 1));
        let cap = plan_capacity(&all, &[Day::Sunday], false, 3);
        assert_eq!(cap.get("big"), 2);
        assert_eq!(cap.get("small"), 1);
        assert_eq!(cap.len(), 2);
    }

    #[test]
    fn no_slots_means_every_class_overflows() {
        let cap = plan_capacity(&assignments("c1", 1), &[Day::Monday], false, 0);
        assert_eq!(cap.get("c1"), 2);
    }
}
