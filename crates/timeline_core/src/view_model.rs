use crate::{AvailableActions, PaginationState, ScopeFilter};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaginationView {
    pub state: PaginationState,
    pub actions: AvailableActions,
}

impl PaginationView {
    pub fn from_state(state: &PaginationState) -> Self {
        Self {
            state: state.clone(),
            actions: state.actions(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimelineView {
    pub scope: ScopeFilter,
    pub ledger_len: usize,
    pub pagination: PaginationView,
    pub query_in_flight: bool,
}
