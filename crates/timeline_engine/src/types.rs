use thiserror::Error;
use timeline_core::{PaginationView, ProjectedList};

/// What the consumer receives from a running timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineEvent {
    /// Throttled projection snapshot.
    Projected(ProjectedList),
    Pagination(PaginationView),
}

/// Why a timeline handle can no longer deliver events or accept commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("timeline coordinator panicked: {0}")]
    Panicked(String),
    #[error("timeline coordinator exited")]
    Exited,
}

/// Store failures. The coordinator treats these as invariant violations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("malformed predicate: {0}")]
    MalformedPredicate(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
