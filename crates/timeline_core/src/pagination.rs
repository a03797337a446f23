use crate::{Cursor, FetchError, ItemId, QueryFilter};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PaginationState {
    #[default]
    Initial,
    Reloading,
    Loading,
    Idle,
    NoMore,
    Fail(FetchError),
}

impl PaginationState {
    pub fn name(&self) -> &'static str {
        match self {
            PaginationState::Initial => "initial",
            PaginationState::Reloading => "reloading",
            PaginationState::Loading => "loading",
            PaginationState::Idle => "idle",
            PaginationState::NoMore => "no_more",
            PaginationState::Fail(_) => "fail",
        }
    }

    /// A page request is outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(self, PaginationState::Loading | PaginationState::Reloading)
    }

    /// Which user actions the presentation layer should offer right now.
    pub fn actions(&self) -> AvailableActions {
        match self {
            PaginationState::Initial => AvailableActions::default(),
            PaginationState::Loading | PaginationState::Reloading => AvailableActions {
                show_spinner: true,
                ..AvailableActions::default()
            },
            PaginationState::Idle => AvailableActions {
                can_load_more: true,
                can_reload: true,
                ..AvailableActions::default()
            },
            PaginationState::NoMore => AvailableActions {
                can_reload: true,
                show_end_marker: true,
                ..AvailableActions::default()
            },
            PaginationState::Fail(_) => AvailableActions {
                can_reload: true,
                can_retry: true,
                ..AvailableActions::default()
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AvailableActions {
    pub can_load_more: bool,
    /// Pull-to-refresh.
    pub can_reload: bool,
    pub can_retry: bool,
    pub show_spinner: bool,
    pub show_end_marker: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageTicket(u64);

impl PageTicket {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    First,
    Next,
    Reload,
    Retry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub ticket: PageTicket,
    pub kind: RequestKind,
    /// `None` asks for the newest page.
    pub cursor: Option<Cursor>,
    /// Filter of the scope active when the request was issued.
    pub filter: QueryFilter,
}

/// One batch of identifiers from the remote source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    pub ids: Vec<ItemId>,
    pub next_cursor: Option<Cursor>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationEvent {
    Begin,
    LoadMore,
    Reload,
    Retry,
    PageReceived { ticket: PageTicket, page: Page },
    PageFailed { ticket: PageTicket, error: FetchError },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationEffect {
    Request(PageRequest),
    Merge(Vec<ItemId>),
}

/// Pagination machine: current state plus the request bookkeeping it needs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pagination {
    state: PaginationState,
    next_ticket: u64,
    in_flight: Option<PageTicket>,
    last_request: Option<PageRequest>,
    cursor: Option<Cursor>,
    exhausted: bool,
}

impl Pagination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    /// Whether an outcome for `ticket` would be applied rather than discarded.
    pub fn expects(&self, ticket: PageTicket) -> bool {
        self.in_flight == Some(ticket)
    }

    fn request(&mut self, kind: RequestKind, cursor: Option<Cursor>) -> PaginationEffect {
        self.next_ticket += 1;
        let ticket = PageTicket(self.next_ticket);
        let request = PageRequest {
            ticket,
            kind,
            cursor,
            filter: QueryFilter::default(),
        };
        self.in_flight = Some(ticket);
        self.last_request = Some(request.clone());
        PaginationEffect::Request(request)
    }
}

/// Pure transition: applies `event` and returns the effect the caller must run.
///
/// Events that are not valid in the current state leave it untouched and
/// produce no effect. Outcomes for tickets other than the outstanding one are
/// stale and discarded the same way.
pub fn transition(
    mut machine: Pagination,
    event: PaginationEvent,
) -> (Pagination, Option<PaginationEffect>) {
    let current = machine.state.clone();
    let effect = match (current, event) {
        (PaginationState::Initial, PaginationEvent::Begin) => {
            machine.state = PaginationState::Loading;
            Some(machine.request(RequestKind::First, None))
        }
        (PaginationState::Idle, PaginationEvent::LoadMore) => {
            if machine.exhausted {
                machine.state = PaginationState::NoMore;
                None
            } else {
                machine.state = PaginationState::Loading;
                let cursor = machine.cursor.clone();
                Some(machine.request(RequestKind::Next, cursor))
            }
        }
        (
            PaginationState::Idle | PaginationState::NoMore | PaginationState::Fail(_),
            PaginationEvent::Reload,
        ) => {
            machine.state = PaginationState::Reloading;
            Some(machine.request(RequestKind::Reload, None))
        }
        (PaginationState::Fail(_), PaginationEvent::Retry) => match machine.last_request.clone() {
            Some(last) => {
                machine.state = PaginationState::Loading;
                Some(machine.request(RequestKind::Retry, last.cursor))
            }
            None => None,
        },
        (
            PaginationState::Loading | PaginationState::Reloading,
            PaginationEvent::PageReceived { ticket, page },
        ) if machine.in_flight == Some(ticket) => {
            machine.in_flight = None;
            if page.ids.is_empty() {
                machine.state = PaginationState::NoMore;
                None
            } else {
                machine.exhausted = page.next_cursor.is_none();
                if page.next_cursor.is_some() {
                    machine.cursor = page.next_cursor;
                }
                machine.state = PaginationState::Idle;
                Some(PaginationEffect::Merge(page.ids))
            }
        }
        (
            PaginationState::Loading | PaginationState::Reloading,
            PaginationEvent::PageFailed { ticket, error },
        ) if machine.in_flight == Some(ticket) => {
            machine.in_flight = None;
            machine.state = PaginationState::Fail(error);
            None
        }
        _ => None,
    };
    debug_assert!(
        machine.in_flight.is_some() == machine.state.is_busy(),
        "outstanding request must match busy state"
    );
    (machine, effect)
}
