//! Timeline core: pure ledger, projection and pagination state machine.
mod effect;
mod error;
mod ids;
mod ledger;
mod msg;
mod pagination;
mod projection;
mod scope;
mod state;
mod throttle;
mod update;
mod view_model;

pub use effect::Effect;
pub use error::{FailureKind, FetchError};
pub use ids::{Cursor, ItemHandle, ItemId};
pub use ledger::IdentifierLedger;
pub use msg::Msg;
pub use pagination::{
    transition, AvailableActions, Page, PageRequest, PageTicket, Pagination, PaginationEffect,
    PaginationEvent, PaginationState, RequestKind,
};
pub use projection::{
    order_by_ledger, ChangeSet, ChangedRecord, MaterializedItem, ProjectedList, Projector,
    QueryTicket, StoreQuery,
};
pub use scope::{QueryFilter, ScopeFilter, ScopeKey};
pub use state::TimelineState;
pub use throttle::{Throttle, DEFAULT_THROTTLE_INTERVAL};
pub use update::update;
pub use view_model::{PaginationView, TimelineView};
