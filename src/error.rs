use thiserror::Error;

/// A move request that does not match the entry list. Always a caller bug,
/// never a scheduling conflict.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("entry index {index} is out of range for {len} entries")]
    EntryOutOfRange { index: usize, len: usize },

    #[error("schedule slot {0} is not part of this timetable")]
    UnknownSlot(String),
}

/// Persistence layer failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("timetable {0} not found")]
    NotFound(String),

    #[error("invalid timetable: {0}")]
    InvalidRequest(String),
}
