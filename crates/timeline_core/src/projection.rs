use crate::{IdentifierLedger, ItemHandle, ItemId, ScopeFilter};

/// One store row matching a query: the identifier and the handle it lives under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedItem {
    pub id: ItemId,
    pub handle: ItemHandle,
}

/// Ordered, materialized view of the timeline. Regenerated wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectedList {
    revision: u64,
    items: Vec<MaterializedItem>,
}

impl ProjectedList {
    pub fn new(revision: u64, items: Vec<MaterializedItem>) -> Self {
        Self { revision, items }
    }

    /// Monotonic counter; a larger revision was computed later.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn items(&self) -> &[MaterializedItem] {
        &self.items
    }

    pub fn handles(&self) -> Vec<ItemHandle> {
        self.items.iter().map(|item| item.handle).collect()
    }

    pub fn ids(&self) -> Vec<&ItemId> {
        self.items.iter().map(|item| &item.id).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Predicate handed to the store: active scope plus the full identifier set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreQuery {
    scope: ScopeFilter,
    ids: Vec<ItemId>,
}

impl StoreQuery {
    pub fn new(scope: ScopeFilter, ids: &[ItemId]) -> Self {
        Self {
            scope,
            ids: ids.to_vec(),
        }
    }

    pub fn scope(&self) -> &ScopeFilter {
        &self.scope
    }

    pub fn ids(&self) -> &[ItemId] {
        &self.ids
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryTicket(u64);

impl QueryTicket {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Store mutation notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSet {
    Records(Vec<ChangedRecord>),
    /// The observer fell behind and lost notifications; treat everything as changed.
    Overflowed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedRecord {
    pub domain: String,
    pub id: ItemId,
}

/// Sorts store rows into ledger order, dropping rows whose identifier is not in the ledger.
pub fn order_by_ledger(
    ledger: &IdentifierLedger,
    rows: Vec<MaterializedItem>,
) -> Vec<MaterializedItem> {
    let mut positioned: Vec<(usize, MaterializedItem)> = rows
        .into_iter()
        .filter_map(|row| ledger.position(&row.id).map(|position| (position, row)))
        .collect();
    positioned.sort_by_key(|(position, _)| *position);
    positioned.dedup_by_key(|(position, _)| *position);
    positioned.into_iter().map(|(_, row)| row).collect()
}

/// Query bookkeeping for the projection: which query is active, which run is
/// in flight, and what must happen once it lands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Projector {
    next_ticket: u64,
    in_flight: Option<QueryTicket>,
    active_query: Option<StoreQuery>,
    requery_pending: bool,
    refresh_pending: bool,
    revision: u64,
}

impl Projector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> Option<QueryTicket> {
        self.in_flight
    }

    pub fn active_query(&self) -> Option<&StoreQuery> {
        self.active_query.as_ref()
    }

    pub fn is_requery_pending(&self) -> bool {
        self.requery_pending
    }

    /// Scope or ledger changed; the predicate is rebuilt at the end of the tick.
    pub(crate) fn mark_requery(&mut self) {
        self.requery_pending = true;
    }

    /// Rebuilds the predicate from the current scope and ledger if anything changed this tick.
    pub(crate) fn flush(
        &mut self,
        scope: &ScopeFilter,
        ledger: &IdentifierLedger,
    ) -> Option<(QueryTicket, StoreQuery)> {
        if !self.requery_pending {
            return None;
        }
        self.requery_pending = false;
        // The rebuilt query observes the store as it is now.
        self.refresh_pending = false;
        let query = StoreQuery::new(scope.clone(), ledger.current());
        self.active_query = Some(query.clone());
        Some((self.issue(), query))
    }

    /// Store records matching the scope changed; re-run the active predicate.
    pub(crate) fn store_changed(&mut self) -> Option<(QueryTicket, StoreQuery)> {
        if self.requery_pending {
            return None;
        }
        let query = self.active_query.clone()?;
        if self.in_flight.is_some() {
            self.refresh_pending = true;
            return None;
        }
        Some((self.issue(), query))
    }

    /// Applies a finished query. Returns `None` for a superseded ticket.
    ///
    /// On success yields the new list and, when a store change arrived while
    /// the query was running, the follow-up refresh to issue.
    pub(crate) fn complete(
        &mut self,
        ticket: QueryTicket,
        rows: Vec<MaterializedItem>,
        ledger: &IdentifierLedger,
    ) -> Option<(ProjectedList, Option<(QueryTicket, StoreQuery)>)> {
        if self.in_flight != Some(ticket) {
            return None;
        }
        self.in_flight = None;
        self.revision += 1;
        let list = ProjectedList::new(self.revision, order_by_ledger(ledger, rows));

        let follow_up = if self.refresh_pending {
            self.refresh_pending = false;
            self.active_query.clone().map(|query| (self.issue(), query))
        } else {
            None
        };
        Some((list, follow_up))
    }

    fn issue(&mut self) -> QueryTicket {
        self.next_ticket += 1;
        let ticket = QueryTicket(self.next_ticket);
        self.in_flight = Some(ticket);
        ticket
    }
}
