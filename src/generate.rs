//! End-to-end generation: validate the request, pick slots, plan class
//! capacity and solve.

use crate::capacity::plan_capacity;
use crate::data::{
    Assignment, ClassCapacity, Day, Entry, Preference, ScheduleSlot, SlotId, SolveOptions,
    SolveStats, Strategy,
};
use crate::slots::{normalize_slots, select_slots};
use crate::solver;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub assignments: Vec<Assignment>,
    /// Every slot known for the academic year.
    pub slots: Vec<ScheduleSlot>,
    #[serde(default)]
    pub preferences: Vec<Preference>,
    /// Slots ticked for this timetable; all of `slots` when absent.
    #[serde(default)]
    pub selected_slot_ids: Option<Vec<SlotId>>,
    #[serde(default)]
    pub days: Vec<Day>,
    #[serde(default)]
    pub all_year: bool,
    #[serde(default)]
    pub time_budget_ms: Option<u64>,
    #[serde(default)]
    pub strategy: Strategy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestIssueKind {
    NoSlots,
    NoDays,
    NoAssignments,
    UnknownSlot,
    MixedDays,
}

/// A reason the request cannot be solved as asked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestIssue {
    pub kind: RequestIssueKind,
    pub message: String,
}

impl RequestIssue {
    fn new(kind: RequestIssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for RequestIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl GenerateRequest {
    pub fn new(assignments: Vec<Assignment>, slots: Vec<ScheduleSlot>) -> Self {
        Self {
            assignments,
            slots,
            preferences: Vec::new(),
            selected_slot_ids: None,
            days: Day::WEEK.to_vec(),
            all_year: false,
            time_budget_ms: None,
            strategy: Strategy::Greedy,
        }
    }

    /// The normalized slots this request schedules into.
    pub fn chosen_slots(&self) -> Vec<ScheduleSlot> {
        match &self.selected_slot_ids {
            Some(ids) => select_slots(&self.slots, ids),
            None => normalize_slots(&self.slots),
        }
    }

    /// Collects every problem at once rather than stopping at the first.
    pub fn validate(&self) -> Result<(), Vec<RequestIssue>> {
        let mut issues = Vec::new();

        if let Some(ids) = &self.selected_slot_ids {
            let known: HashSet<&str> = self.slots.iter().map(|s| s.id.as_str()).collect();
            for id in ids.iter().filter(|id| !known.contains(id.as_str())) {
                issues.push(RequestIssue::new(
                    RequestIssueKind::UnknownSlot,
                    format!("Selected schedule slot '{}' does not exist", id),
                ));
            }
        }
        if self.chosen_slots().is_empty() {
            issues.push(RequestIssue::new(
                RequestIssueKind::NoSlots,
                "Please select at least one period",
            ));
        }
        if !self.all_year {
            if self.days.iter().any(|d| d.is_all_year()) {
                issues.push(RequestIssue::new(
                    RequestIssueKind::MixedDays,
                    "Choose either all year or specific days, not both",
                ));
            }
            if self.days.iter().all(|d| d.is_all_year()) {
                issues.push(RequestIssue::new(
                    RequestIssueKind::NoDays,
                    "Please select at least one day",
                ));
            }
        }
        if self.assignments.is_empty() {
            issues.push(RequestIssue::new(
                RequestIssueKind::NoAssignments,
                "No teacher-subject assignments found for the selected classes",
            ));
        }

        if issues.is_empty() { Ok(()) } else { Err(issues) }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub entries: Vec<Entry>,
    pub unscheduled: Vec<Assignment>,
    pub capacity: ClassCapacity,
    pub stats: SolveStats,
}

/// Runs a generation. Does not validate; call [`GenerateRequest::validate`]
/// first when the request comes from outside.
pub fn generate(request: &GenerateRequest, default_budget: Duration) -> GenerateResponse {
    let slots = request.chosen_slots();
    let budget = request
        .time_budget_ms
        .map(Duration::from_millis)
        .unwrap_or(default_budget);
    let mut options = SolveOptions {
        all_year: request.all_year,
        days: request.days.clone(),
        class_capacity: ClassCapacity::new(),
        time_budget: budget,
        max_attempts: None,
        strategy: request.strategy,
    };
    options.days = options.effective_days();

    let capacity = plan_capacity(
        &request.assignments,
        &options.days,
        request.all_year,
        slots.len(),
    );
    options.class_capacity = capacity.clone();
    let result = solver::solve(&request.assignments, &slots, &request.preferences, &options);

    if result.unscheduled.is_empty() {
        info!(
            "Timetable generated successfully with {} scheduled entries.",
            result.entries.len()
        );
    } else {
        warn!(
            "Timetable generated, but {} assignment(s) could not be scheduled.",
            result.unscheduled.len()
        );
    }

    GenerateResponse {
        entries: result.entries,
        unscheduled: result.unscheduled,
        capacity,
        stats: result.stats,
    }
}
