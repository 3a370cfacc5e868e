use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

// Type aliases for clarity
pub type TeacherId = String;
pub type ClassId = String;
pub type SubjectId = String;
pub type SlotId = String;

/// A teaching obligation: this teacher teaches this subject to this class.
///
/// Identity is the position in the input list, so two assignments with
/// identical ids are still two separate obligations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub teacher_id: TeacherId,
    pub class_id: ClassId,
    pub subject_id: SubjectId,
    #[serde(default)]
    pub teacher_name: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub subject_name: String,
}

impl Assignment {
    pub fn new(
        teacher_id: impl Into<String>,
        class_id: impl Into<String>,
        subject_id: impl Into<String>,
    ) -> Self {
        Self {
            teacher_id: teacher_id.into(),
            class_id: class_id.into(),
            subject_id: subject_id.into(),
            teacher_name: String::new(),
            class_name: String::new(),
            subject_name: String::new(),
        }
    }

    pub fn with_labels(
        mut self,
        teacher_name: impl Into<String>,
        class_name: impl Into<String>,
        subject_name: impl Into<String>,
    ) -> Self {
        self.teacher_name = teacher_name.into();
        self.class_name = class_name.into();
        self.subject_name = subject_name.into();
        self
    }

    /// All three ids are present. Anything else is kept out of the solver's work set.
    pub fn is_well_formed(&self) -> bool {
        !self.teacher_id.is_empty() && !self.class_id.is_empty() && !self.subject_id.is_empty()
    }
}

/// A named period of the day, e.g. "Period 3, 09:40-10:20".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSlot {
    pub id: SlotId,
    pub name: String,
    pub start_time: String,
    pub end_time: String,
}

impl ScheduleSlot {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }
}

/// A weekday, or the `all_year` sentinel used when weekdays are not distinguished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Day {
    Saturday,
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    AllYear,
}

impl Day {
    /// The school week in display order. Starts on Saturday.
    pub const WEEK: [Day; 7] = [
        Day::Saturday,
        Day::Sunday,
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Saturday => "saturday",
            Day::Sunday => "sunday",
            Day::Monday => "monday",
            Day::Tuesday => "tuesday",
            Day::Wednesday => "wednesday",
            Day::Thursday => "thursday",
            Day::Friday => "friday",
            Day::AllYear => "all_year",
        }
    }

    pub fn is_all_year(&self) -> bool {
        matches!(self, Day::AllYear)
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Slots a teacher must never be placed in, on any day.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preference {
    pub teacher_id: TeacherId,
    pub blocked_slot_ids: Vec<SlotId>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Preference {
    pub fn new<I, S>(teacher_id: impl Into<String>, blocked_slot_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            teacher_id: teacher_id.into(),
            blocked_slot_ids: blocked_slot_ids.into_iter().map(Into::into).collect(),
            is_active: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Per-class limit on concurrent entries in one (day, slot) cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ClassCapacity(HashMap<ClassId, usize>);

impl ClassCapacity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, class_id: impl Into<String>, capacity: usize) {
        self.0.insert(class_id.into(), capacity);
    }

    /// Missing classes default to 1; a stored zero is read as 1.
    pub fn get(&self, class_id: &str) -> usize {
        self.0.get(class_id).copied().unwrap_or(1).max(1)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ClassId, &usize)> {
        self.0.iter()
    }
}

impl FromIterator<(ClassId, usize)> for ClassCapacity {
    fn from_iter<T: IntoIterator<Item = (ClassId, usize)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A placed assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub teacher_id: TeacherId,
    pub class_id: ClassId,
    pub subject_id: SubjectId,
    pub schedule_slot_id: SlotId,
    pub day: Day,
    /// Display rank of the slot among the slots in use. No constraint meaning.
    pub period_order: u32,
}

/// Search strategy used by [`crate::solver::solve`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    #[default]
    Greedy,
    /// ILP via HiGHS. Needs the `milp` feature, otherwise greedy is used.
    Exact,
}

#[derive(Debug, Clone)]
pub struct SolveOptions {
    pub all_year: bool,
    pub days: Vec<Day>,
    pub class_capacity: ClassCapacity,
    pub time_budget: Duration,
    /// Deterministic cap on placement attempts, used by tests instead of wall-clock.
    pub max_attempts: Option<u64>,
    pub strategy: Strategy,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            all_year: false,
            days: Day::WEEK.to_vec(),
            class_capacity: ClassCapacity::new(),
            time_budget: Duration::from_millis(8000),
            max_attempts: None,
            strategy: Strategy::Greedy,
        }
    }
}

impl SolveOptions {
    pub fn all_year() -> Self {
        Self {
            all_year: true,
            days: Vec::new(),
            ..Self::default()
        }
    }

    pub fn with_days(mut self, days: impl Into<Vec<Day>>) -> Self {
        self.days = days.into();
        self
    }

    pub fn with_capacity(mut self, capacity: ClassCapacity) -> Self {
        self.class_capacity = capacity;
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u64) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// The days the grid actually has: the sentinel alone for all-year,
    /// otherwise the selected weekdays with duplicates collapsed in order.
    /// A stray `AllYear` in a weekday selection is dropped.
    pub fn effective_days(&self) -> Vec<Day> {
        if self.all_year {
            return vec![Day::AllYear];
        }
        let mut days = Vec::with_capacity(self.days.len());
        for day in self.days.iter().filter(|d| !d.is_all_year()) {
            if !days.contains(day) {
                days.push(*day);
            }
        }
        days
    }
}

/// Counters reported alongside a solve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveStats {
    pub attempts: u64,
    pub repairs: u64,
    pub elapsed_ms: u64,
    pub budget_exhausted: bool,
}

/// The final output of the solver.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveResult {
    pub entries: Vec<Entry>,
    pub unscheduled: Vec<Assignment>,
    pub stats: SolveStats,
}

impl fmt::Display for SolveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} placed, {} unscheduled in {} attempts ({} repairs)",
            self.entries.len(),
            self.unscheduled.len(),
            self.stats.attempts,
            self.stats.repairs
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_wire_names() {
        assert_eq!(serde_json::to_string(&Day::AllYear).unwrap(), "\"all_year\"");
        let d: Day = serde_json::from_str("\"wednesday\"").unwrap();
        assert_eq!(d, Day::Wednesday);
        assert_eq!(Day::Friday.to_string(), "friday");
    }

    #[test]
    fn capacity_defaults_to_one() {
        let mut cap = ClassCapacity::new();
        cap.set("c1", 2);
        cap.set("c2", 0);
        assert_eq!(cap.get("c1"), 2);
        assert_eq!(cap.get("c2"), 1);
        assert_eq!(cap.get("unknown"), 1);
    }

    #[test]
    fn effective_days_dedupes_and_respects_all_year() {
        let opts = SolveOptions::default().with_days(vec![Day::Monday, Day::Sunday, Day::Monday]);
        assert_eq!(opts.effective_days(), vec![Day::Monday, Day::Sunday]);
        assert_eq!(SolveOptions::all_year().effective_days(), vec![Day::AllYear]);
    }

    #[test]
    fn preference_active_by_default_on_the_wire() {
        let p: Preference =
            serde_json::from_str(r#"{"teacherId":"t1","blockedSlotIds":["s1"]}"#).unwrap();
        assert!(p.is_active);
        assert_eq!(p.blocked_slot_ids, vec!["s1".to_string()]);
    }

    #[test]
    fn malformed_assignment_detected() {
        assert!(Assignment::new("t", "c", "s").is_well_formed());
        assert!(!Assignment::new("", "c", "s").is_well_formed());
    }
}
