use crate::{PageRequest, PaginationView, ProjectedList, QueryTicket, StoreQuery};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchPage(PageRequest),
    RunQuery {
        ticket: QueryTicket,
        query: StoreQuery,
    },
    /// Hand the list to the publication throttle.
    Publish(ProjectedList),
    /// Forwarded to the consumer unthrottled.
    PaginationChanged(PaginationView),
}
