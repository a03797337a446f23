use crate::{
    transition, Effect, Msg, PaginationEffect, PaginationEvent, PaginationView, QueryTicket,
    StoreQuery, TimelineState,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: TimelineState, msg: Msg) -> (TimelineState, Vec<Effect>) {
    let effects = match msg {
        Msg::AppendIdentifiers(ids) => {
            state.append_identifiers(ids);
            Vec::new()
        }
        Msg::SetScope(scope) => {
            state.set_scope(scope);
            Vec::new()
        }
        Msg::BeginLoad => drive_pagination(&mut state, PaginationEvent::Begin),
        Msg::LoadMore => drive_pagination(&mut state, PaginationEvent::LoadMore),
        Msg::Reload => drive_pagination(&mut state, PaginationEvent::Reload),
        Msg::Retry => drive_pagination(&mut state, PaginationEvent::Retry),
        Msg::PageFetched { ticket, result } => {
            let event = match result {
                Ok(page) => PaginationEvent::PageReceived { ticket, page },
                Err(error) => PaginationEvent::PageFailed { ticket, error },
            };
            drive_pagination(&mut state, event)
        }
        Msg::QueryCompleted { ticket, items } => {
            match state.projector.complete(ticket, items, &state.ledger) {
                Some((list, follow_up)) => {
                    let mut effects = vec![Effect::Publish(list)];
                    effects.extend(follow_up.map(run_query));
                    effects
                }
                None => Vec::new(),
            }
        }
        Msg::StoreChanged(changes) => {
            if state.is_relevant(&changes) {
                state
                    .projector
                    .store_changed()
                    .map(run_query)
                    .into_iter()
                    .collect()
            } else {
                Vec::new()
            }
        }
        Msg::Flush => state
            .projector
            .flush(state.scope.current(), &state.ledger)
            .map(run_query)
            .into_iter()
            .collect(),
    };

    (state, effects)
}

fn drive_pagination(state: &mut TimelineState, event: PaginationEvent) -> Vec<Effect> {
    let machine = std::mem::take(&mut state.pagination);
    let before = machine.state().clone();
    let (machine, effect) = transition(machine, event);
    state.pagination = machine;

    let mut effects = Vec::with_capacity(2);
    match effect {
        Some(PaginationEffect::Request(mut request)) => {
            request.filter = state.scope.current().filter().copied().unwrap_or_default();
            effects.push(Effect::FetchPage(request));
        }
        Some(PaginationEffect::Merge(ids)) => state.append_identifiers(ids),
        None => {}
    }
    if state.pagination.state() != &before {
        effects.push(Effect::PaginationChanged(PaginationView::from_state(
            state.pagination.state(),
        )));
    }
    effects
}

fn run_query((ticket, query): (QueryTicket, StoreQuery)) -> Effect {
    Effect::RunQuery { ticket, query }
}
