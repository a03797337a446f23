use crate::{
    ChangeSet, FetchError, ItemId, MaterializedItem, Page, PageTicket, QueryTicket, ScopeFilter,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Identifiers learned outside pagination, e.g. from a streaming feed.
    AppendIdentifiers(Vec<ItemId>),
    /// Caller replaced the query scope.
    SetScope(ScopeFilter),
    /// User opened the timeline.
    BeginLoad,
    /// User scrolled to the end of the list.
    LoadMore,
    /// Pull-to-refresh.
    Reload,
    /// User tapped retry on a failed page.
    Retry,
    /// Page fetch finished.
    PageFetched {
        ticket: PageTicket,
        result: Result<Page, FetchError>,
    },
    /// Store query finished.
    QueryCompleted {
        ticket: QueryTicket,
        items: Vec<MaterializedItem>,
    },
    /// Store records were written by someone.
    StoreChanged(ChangeSet),
    /// End of a reactive tick; coalesced re-queries fire here.
    Flush,
}
