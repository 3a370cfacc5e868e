//! Best-effort timetable search.
//!
//! Assignments are placed most-constrained-first: at every step the pending
//! assignment with the fewest legal cells under the current partial placement
//! goes next (ties by input order). Its first legal cell in day-then-slot order
//! wins. An assignment with no legal cell gets one bounded local repair, which
//! relocates a single placed entry that stands in the way, before it is given
//! up as unscheduled. There is no deeper backtracking.
//!
//! The time budget is cooperative: the clock is read every
//! [`DEADLINE_CHECK_INTERVAL`] placement attempts, never inside one.

#[cfg(feature = "milp")]
mod exact;

use crate::data::{
    Assignment, ClassCapacity, Day, Preference, ScheduleSlot, SolveOptions, SolveResult,
    SolveStats, Strategy,
};
use crate::projector::{Placement, project};
use crate::slots::normalize_slots;
use log::{debug, info, trace, warn};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Placement attempts between two reads of the clock.
pub const DEADLINE_CHECK_INTERVAL: u64 = 4;

/// Solves the timetable. Never fails: whatever cannot be placed within the
/// budget comes back in `unscheduled`.
pub fn solve(
    assignments: &[Assignment],
    slots: &[ScheduleSlot],
    preferences: &[Preference],
    options: &SolveOptions,
) -> SolveResult {
    let start_time = Instant::now();
    let slots = normalize_slots(slots);
    let days = options.effective_days();

    info!(
        "Solving {} assignments over {} days x {} slots...",
        assignments.len(),
        days.len(),
        slots.len()
    );

    if slots.is_empty() || days.is_empty() {
        info!("No slots or no days selected; nothing is placeable.");
        return SolveResult {
            entries: Vec::new(),
            unscheduled: assignments.to_vec(),
            stats: SolveStats {
                elapsed_ms: elapsed_ms(start_time),
                ..SolveStats::default()
            },
        };
    }

    let mut grid = Grid::new(assignments, &slots, &days, preferences, &options.class_capacity);
    let (mut pending, malformed): (Vec<usize>, Vec<usize>) =
        (0..assignments.len()).partition(|&i| assignments[i].is_well_formed());
    if !malformed.is_empty() {
        warn!(
            "{} assignments are missing a teacher, class or subject id and were skipped.",
            malformed.len()
        );
    }

    if options.strategy == Strategy::Exact {
        pending = seed_exact(&mut grid, pending, options.time_budget);
    }

    let budget = Budget {
        start: start_time,
        time: options.time_budget,
        max_attempts: options.max_attempts,
    };
    let mut stats = SolveStats::default();
    let mut unscheduled = malformed;
    grid.run(&mut pending, &mut unscheduled, &budget, &mut stats);
    stats.elapsed_ms = elapsed_ms(start_time);

    unscheduled.sort_unstable();
    let placements = grid.placements();
    let result = SolveResult {
        entries: project(assignments, &placements, &slots),
        unscheduled: unscheduled.iter().map(|&i| assignments[i].clone()).collect(),
        stats,
    };
    info!("Solve finished in {:.2?}: {}", start_time.elapsed(), result);
    result
}

#[cfg(feature = "milp")]
fn seed_exact(grid: &mut Grid<'_>, pending: Vec<usize>, time_budget: Duration) -> Vec<usize> {
    match exact::solve_exact(grid, &pending, time_budget) {
        Ok(cells) => {
            for (a, cell) in cells {
                if grid.is_legal(a, cell) {
                    grid.place(a, cell);
                }
            }
            debug!("ILP seeded {} placements.", grid.placed_count());
            pending.into_iter().filter(|&a| grid.cell_of[a].is_none()).collect()
        }
        Err(e) => {
            warn!("Exact solve failed, falling back to greedy search: {}", e);
            pending
        }
    }
}

#[cfg(not(feature = "milp"))]
fn seed_exact(_grid: &mut Grid<'_>, pending: Vec<usize>, _time_budget: Duration) -> Vec<usize> {
    warn!("Exact strategy needs the `milp` feature; using greedy search.");
    pending
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis().try_into().unwrap_or(u64::MAX)
}

struct Budget {
    start: Instant,
    time: Duration,
    max_attempts: Option<u64>,
}

impl Budget {
    fn exhausted(&self, attempts: u64) -> bool {
        if self.max_attempts.is_some_and(|max| attempts >= max) {
            return true;
        }
        attempts % DEADLINE_CHECK_INTERVAL == 0 && self.start.elapsed() >= self.time
    }
}

/// Working placement state. A cell is `day_index * slots.len() + slot_index`.
pub(crate) struct Grid<'a> {
    assignments: &'a [Assignment],
    slots: &'a [ScheduleSlot],
    days: &'a [Day],
    capacity: &'a ClassCapacity,
    /// teacher id -> blocked slot indices
    blocked: HashMap<&'a str, HashSet<usize>>,
    teacher_cells: HashMap<(&'a str, usize), usize>,
    class_cells: HashMap<(&'a str, usize), Vec<usize>>,
    cell_of: Vec<Option<usize>>,
    /// Assignments per teacher and per class, the only ones whose legal
    /// cells change when an entry of that teacher or class moves.
    by_teacher: HashMap<&'a str, Vec<usize>>,
    by_class: HashMap<&'a str, Vec<usize>>,
    /// Legal cell count per assignment under the current placement.
    legal: Vec<usize>,
}

impl<'a> Grid<'a> {
    fn new(
        assignments: &'a [Assignment],
        slots: &'a [ScheduleSlot],
        days: &'a [Day],
        preferences: &'a [Preference],
        capacity: &'a ClassCapacity,
    ) -> Self {
        let slot_index: HashMap<&str, usize> =
            slots.iter().enumerate().map(|(i, s)| (s.id.as_str(), i)).collect();
        let mut blocked: HashMap<&str, HashSet<usize>> = HashMap::new();
        for pref in preferences.iter().filter(|p| p.is_active) {
            let set = blocked.entry(pref.teacher_id.as_str()).or_default();
            set.extend(
                pref.blocked_slot_ids
                    .iter()
                    .filter_map(|id| slot_index.get(id.as_str()).copied()),
            );
        }
        trace!("{} teachers have blocked slots in this grid.", blocked.len());

        let mut by_teacher: HashMap<&str, Vec<usize>> = HashMap::new();
        let mut by_class: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, a) in assignments.iter().enumerate() {
            by_teacher.entry(a.teacher_id.as_str()).or_default().push(i);
            by_class.entry(a.class_id.as_str()).or_default().push(i);
        }

        let mut grid = Self {
            assignments,
            slots,
            days,
            capacity,
            blocked,
            teacher_cells: HashMap::new(),
            class_cells: HashMap::new(),
            cell_of: vec![None; assignments.len()],
            by_teacher,
            by_class,
            legal: Vec::new(),
        };
        grid.legal = (0..assignments.len()).map(|a| grid.count_legal(a)).collect();
        grid
    }

    pub(crate) fn cell_count(&self) -> usize {
        self.days.len() * self.slots.len()
    }

    #[cfg(feature = "milp")]
    pub(crate) fn assignment(&self, a: usize) -> &'a Assignment {
        &self.assignments[a]
    }

    #[cfg(feature = "milp")]
    pub(crate) fn class_capacity(&self, class_id: &str) -> usize {
        self.capacity.get(class_id)
    }

    #[cfg(feature = "milp")]
    fn placed_count(&self) -> usize {
        self.cell_of.iter().filter(|c| c.is_some()).count()
    }

    /// The cell falls in a slot the teacher has blocked.
    pub(crate) fn is_blocked(&self, a: usize, cell: usize) -> bool {
        let teacher = self.assignments[a].teacher_id.as_str();
        self.blocked
            .get(teacher)
            .is_some_and(|set| set.contains(&(cell % self.slots.len())))
    }

    fn class_load(&self, class_id: &str, cell: usize) -> usize {
        self.class_cells.get(&(class_id, cell)).map_or(0, Vec::len)
    }

    fn is_legal(&self, a: usize, cell: usize) -> bool {
        let asg = &self.assignments[a];
        !self.is_blocked(a, cell)
            && !self.teacher_cells.contains_key(&(asg.teacher_id.as_str(), cell))
            && self.class_load(&asg.class_id, cell) < self.capacity.get(&asg.class_id)
    }

    fn first_legal(&self, a: usize) -> Option<usize> {
        (0..self.cell_count()).find(|&cell| self.is_legal(a, cell))
    }

    fn count_legal(&self, a: usize) -> usize {
        (0..self.cell_count()).filter(|&cell| self.is_legal(a, cell)).count()
    }

    fn legal_count(&self, a: usize) -> usize {
        self.legal[a]
    }

    /// Assignments sharing a teacher or a class with `a`, `a` included.
    fn peers(&self, a: usize) -> Vec<usize> {
        let asg = &self.assignments[a];
        let same_teacher = self
            .by_teacher
            .get(asg.teacher_id.as_str())
            .into_iter()
            .flatten();
        // class peers of the same teacher are already listed
        let same_class = self
            .by_class
            .get(asg.class_id.as_str())
            .into_iter()
            .flatten()
            .filter(|&&b| self.assignments[b].teacher_id != asg.teacher_id);
        same_teacher.chain(same_class).copied().collect()
    }

    /// Occupancy only changes at `cell`, so only the peers' legality there
    /// needs rechecking.
    fn update_legal(&mut self, peers: &[usize], was_legal: &[bool], cell: usize) {
        for (&b, &was) in peers.iter().zip(was_legal) {
            match (was, self.is_legal(b, cell)) {
                (true, false) => self.legal[b] -= 1,
                (false, true) => self.legal[b] += 1,
                _ => {}
            }
        }
    }

    fn place(&mut self, a: usize, cell: usize) {
        let peers = self.peers(a);
        let was_legal: Vec<bool> = peers.iter().map(|&b| self.is_legal(b, cell)).collect();

        let asg: &'a Assignment = &self.assignments[a];
        self.teacher_cells.insert((asg.teacher_id.as_str(), cell), a);
        self.class_cells
            .entry((asg.class_id.as_str(), cell))
            .or_default()
            .push(a);
        self.cell_of[a] = Some(cell);

        self.update_legal(&peers, &was_legal, cell);
    }

    fn unplace(&mut self, a: usize) -> Option<usize> {
        let cell = self.cell_of[a]?;
        let peers = self.peers(a);
        let was_legal: Vec<bool> = peers.iter().map(|&b| self.is_legal(b, cell)).collect();

        self.cell_of[a] = None;
        let asg = &self.assignments[a];
        self.teacher_cells.remove(&(asg.teacher_id.as_str(), cell));
        if let Some(list) = self.class_cells.get_mut(&(asg.class_id.as_str(), cell)) {
            list.retain(|&x| x != a);
        }

        self.update_legal(&peers, &was_legal, cell);
        Some(cell)
    }

    /// Placed entries that keep `a` out of `cell`, when relocating exactly one
    /// of them would be enough to admit it.
    fn single_blockers(&self, a: usize, cell: usize) -> Vec<usize> {
        let asg = &self.assignments[a];
        let teacher_occupant = self
            .teacher_cells
            .get(&(asg.teacher_id.as_str(), cell))
            .copied();
        let class_occupants = self
            .class_cells
            .get(&(asg.class_id.as_str(), cell))
            .cloned()
            .unwrap_or_default();
        let cap = self.capacity.get(&asg.class_id);
        // relocating one occupant only helps if the class is not over capacity
        let frees_seat = class_occupants.len() <= cap;

        match (teacher_occupant, class_occupants.len() >= cap) {
            (Some(b), false) => vec![b],
            (Some(b), true) if frees_seat && class_occupants.contains(&b) => vec![b],
            (None, true) if frees_seat => class_occupants,
            _ => Vec::new(),
        }
    }

    /// One bounded local repair: frees a cell for `a` by moving a single
    /// placed entry to its first other legal cell.
    fn try_repair(&mut self, a: usize) -> Option<usize> {
        for cell in 0..self.cell_count() {
            if self.is_blocked(a, cell) {
                continue;
            }
            for b in self.single_blockers(a, cell) {
                let Some(from) = self.unplace(b) else {
                    continue;
                };
                let target = (0..self.cell_count()).find(|&c| c != cell && self.is_legal(b, c));
                if let Some(to) = target {
                    self.place(b, to);
                    if self.is_legal(a, cell) {
                        self.place(a, cell);
                        trace!(
                            "Repaired: moved assignment {} from cell {} to {} to place {} at {}.",
                            b, from, to, a, cell
                        );
                        return Some(cell);
                    }
                    self.unplace(b);
                }
                self.place(b, from);
            }
        }
        None
    }

    fn run(
        &mut self,
        pending: &mut Vec<usize>,
        unscheduled: &mut Vec<usize>,
        budget: &Budget,
        stats: &mut SolveStats,
    ) {
        while !pending.is_empty() {
            if budget.exhausted(stats.attempts) {
                stats.budget_exhausted = true;
                warn!(
                    "Budget spent after {} attempts; {} assignments left unscheduled.",
                    stats.attempts,
                    pending.len()
                );
                unscheduled.append(pending);
                return;
            }
            stats.attempts += 1;

            // pending stays in input order, so the lowest position wins ties
            let Some((pos, legal)) = pending
                .iter()
                .enumerate()
                .map(|(pos, &a)| (pos, self.legal_count(a)))
                .min_by_key(|&(pos, legal)| (legal, pos))
            else {
                return;
            };
            let a = pending.remove(pos);

            if legal > 0 {
                if let Some(cell) = self.first_legal(a) {
                    self.place(a, cell);
                    continue;
                }
            }
            if self.try_repair(a).is_some() {
                stats.repairs += 1;
            } else {
                debug!(
                    "No cell for teacher {} / class {} / subject {}.",
                    self.assignments[a].teacher_id,
                    self.assignments[a].class_id,
                    self.assignments[a].subject_id
                );
                unscheduled.push(a);
            }
        }
    }

    fn placements(&self) -> Vec<Placement> {
        let slot_count = self.slots.len();
        self.cell_of
            .iter()
            .enumerate()
            .filter_map(|(a, cell)| {
                cell.map(|cell| Placement {
                    assignment: a,
                    day: self.days[cell / slot_count],
                    slot_id: self.slots[cell % slot_count].id.clone(),
                })
            })
            .collect()
    }
}
