use crate::{
    ChangeSet, IdentifierLedger, ItemId, Pagination, PaginationView, Projector, ScopeFilter,
    ScopeKey, TimelineView,
};

/// Everything the coordination context owns for one timeline session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineState {
    pub(crate) ledger: IdentifierLedger,
    pub(crate) scope: ScopeKey,
    pub(crate) projector: Projector,
    pub(crate) pagination: Pagination,
}

impl Default for TimelineState {
    fn default() -> Self {
        Self::new(ScopeFilter::default())
    }
}

impl TimelineState {
    /// Fresh session. The first flush publishes the (empty) initial projection.
    pub fn new(scope: ScopeFilter) -> Self {
        let mut projector = Projector::new();
        projector.mark_requery();
        Self {
            ledger: IdentifierLedger::new(),
            scope: ScopeKey::new(scope),
            projector,
            pagination: Pagination::new(),
        }
    }

    pub fn view(&self) -> TimelineView {
        TimelineView {
            scope: self.scope.current().clone(),
            ledger_len: self.ledger.len(),
            pagination: PaginationView::from_state(self.pagination.state()),
            query_in_flight: self.projector.in_flight().is_some(),
        }
    }

    pub fn ledger(&self) -> &IdentifierLedger {
        &self.ledger
    }

    pub fn scope(&self) -> &ScopeFilter {
        self.scope.current()
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    pub(crate) fn append_identifiers(&mut self, ids: Vec<ItemId>) {
        if self.ledger.append(ids).is_some() {
            self.projector.mark_requery();
        }
    }

    pub(crate) fn set_scope(&mut self, scope: ScopeFilter) {
        if self.scope.replace(scope).is_some() {
            self.projector.mark_requery();
        }
    }

    /// A change matters when it touches a ledger identifier inside the active domain.
    pub(crate) fn is_relevant(&self, changes: &ChangeSet) -> bool {
        match changes {
            ChangeSet::Overflowed => true,
            ChangeSet::Records(records) => records.iter().any(|record| {
                self.scope.current().matches_domain(&record.domain)
                    && self.ledger.contains(&record.id)
            }),
        }
    }
}
