//! Timetable generation and repair.
//!
//! Places teacher/class/subject assignments into (day, slot) cells under hard
//! constraints: no teacher in two places at once, per-class cell capacity and
//! teacher blocked slots. The search is best-effort within a time budget and
//! reports what it could not place instead of failing.
//!
//! - [`solver::solve`] builds a timetable.
//! - [`moves::MoveValidator`] checks manual moves of placed entries.
//! - [`persist`] converts to and from the stored timetable shape.
//! - [`generate::generate`] runs the whole pipeline for a host request.

pub mod capacity;
pub mod config;
pub mod data;
pub mod error;
pub mod generate;
pub mod moves;
pub mod persist;
pub mod projector;
pub mod server;
pub mod slots;
pub mod solver;

pub use capacity::plan_capacity;
pub use data::{
    Assignment, ClassCapacity, Day, Entry, Preference, ScheduleSlot, SolveOptions, SolveResult,
    Strategy,
};
pub use error::{MoveError, StoreError};
pub use moves::{MoveOutcome, MoveValidator};
pub use solver::solve;
