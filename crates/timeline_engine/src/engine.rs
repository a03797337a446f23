use std::any::Any;
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use timeline_core::{
    update, ChangeSet, Effect, ItemId, Msg, ProjectedList, ScopeFilter, Throttle, TimelineState,
};
use timeline_logging::{
    set_coordination_tick, timeline_debug, timeline_error, timeline_info, timeline_trace,
    timeline_warn,
};
use tokio::sync::{broadcast, mpsc as async_mpsc};
use tokio::task::JoinSet;

use crate::{EngineConfig, EngineError, ItemStore, PageFetcher, TimelineEvent};

enum EngineCommand {
    AppendIdentifiers(Vec<ItemId>),
    SetScope(ScopeFilter),
    BeginLoad,
    LoadMore,
    Reload,
    Retry,
}

impl From<EngineCommand> for Msg {
    fn from(command: EngineCommand) -> Self {
        match command {
            EngineCommand::AppendIdentifiers(ids) => Msg::AppendIdentifiers(ids),
            EngineCommand::SetScope(scope) => Msg::SetScope(scope),
            EngineCommand::BeginLoad => Msg::BeginLoad,
            EngineCommand::LoadMore => Msg::LoadMore,
            EngineCommand::Reload => Msg::Reload,
            EngineCommand::Retry => Msg::Retry,
        }
    }
}

/// Consumer-side handle to a running timeline.
///
/// The coordination task runs on its own thread with its own runtime and stops
/// once the handle is dropped. If it dies, every later call on the handle
/// reports why with an [`EngineError`].
pub struct TimelineHandle {
    cmd_tx: async_mpsc::UnboundedSender<EngineCommand>,
    event_rx: mpsc::Receiver<TimelineEvent>,
    coordinator: Mutex<CoordinatorThread>,
}

struct CoordinatorThread {
    thread: Option<JoinHandle<()>>,
    outcome: Option<EngineError>,
}

impl TimelineHandle {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn ItemStore>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = async_mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();

        let thread = thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let coordinator = Coordinator::new(config, store, fetcher, event_tx);
            runtime.block_on(coordinator.run(cmd_rx));
        });

        Self {
            cmd_tx,
            event_rx,
            coordinator: Mutex::new(CoordinatorThread {
                thread: Some(thread),
                outcome: None,
            }),
        }
    }

    /// Identifiers learned outside pagination.
    pub fn append_identifiers(
        &self,
        ids: impl IntoIterator<Item = ItemId>,
    ) -> Result<(), EngineError> {
        self.send(EngineCommand::AppendIdentifiers(ids.into_iter().collect()))
    }

    pub fn set_scope(&self, scope: ScopeFilter) -> Result<(), EngineError> {
        self.send(EngineCommand::SetScope(scope))
    }

    pub fn begin_load(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::BeginLoad)
    }

    pub fn load_more(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::LoadMore)
    }

    pub fn reload(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::Reload)
    }

    pub fn retry(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::Retry)
    }

    /// `Ok(None)` when nothing is queued yet.
    pub fn try_recv(&self) -> Result<Option<TimelineEvent>, EngineError> {
        match self.event_rx.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::TryRecvError::Empty) => Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => Err(self.stopped()),
        }
    }

    /// Waits up to `timeout` for the next event. `Ok(None)` on timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<TimelineEvent>, EngineError> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(self.stopped()),
        }
    }

    fn send(&self, command: EngineCommand) -> Result<(), EngineError> {
        self.cmd_tx.send(command).map_err(|_| self.stopped())
    }

    /// Joins the dead coordinator thread once and remembers how it ended.
    fn stopped(&self) -> EngineError {
        let mut coordinator = self
            .coordinator
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(thread) = coordinator.thread.take() {
            let outcome = match thread.join() {
                Ok(()) => EngineError::Exited,
                Err(payload) => EngineError::Panicked(panic_message(&*payload)),
            };
            timeline_error!("{}", outcome);
            coordinator.outcome = Some(outcome);
        }
        coordinator.outcome.clone().unwrap_or(EngineError::Exited)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "non-string panic payload".to_string()
}

struct Coordinator {
    state: TimelineState,
    store: Arc<dyn ItemStore>,
    fetcher: Arc<dyn PageFetcher>,
    throttle: Throttle<ProjectedList>,
    tasks: JoinSet<Msg>,
    event_tx: mpsc::Sender<TimelineEvent>,
    tick: u64,
}

impl Coordinator {
    fn new(
        config: EngineConfig,
        store: Arc<dyn ItemStore>,
        fetcher: Arc<dyn PageFetcher>,
        event_tx: mpsc::Sender<TimelineEvent>,
    ) -> Self {
        Self {
            state: TimelineState::new(config.initial_scope),
            store,
            fetcher,
            throttle: Throttle::new(config.throttle_interval),
            tasks: JoinSet::new(),
            event_tx,
            tick: 0,
        }
    }

    async fn run(mut self, mut cmd_rx: async_mpsc::UnboundedReceiver<EngineCommand>) {
        let mut changes = Some(self.store.subscribe());
        timeline_info!(
            "timeline coordinator started scope={:?}",
            self.state.scope().domain()
        );
        self.dispatch_tick(Vec::new());

        loop {
            let deadline = self.throttle.deadline();
            let msg = tokio::select! {
                command = cmd_rx.recv() => match command {
                    Some(command) => Msg::from(command),
                    None => break,
                },
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => match joined {
                    Ok(msg) => msg,
                    Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                    Err(err) => {
                        timeline_warn!("background task ended without a result: {}", err);
                        continue;
                    }
                },
                change = next_change(&mut changes) => match change {
                    Some(set) => Msg::StoreChanged(set),
                    None => continue,
                },
                _ = sleep_until(deadline), if deadline.is_some() => {
                    self.publish_due();
                    continue;
                }
            };

            // Everything already queued belongs to this tick.
            let mut inbox = vec![msg];
            while let Ok(command) = cmd_rx.try_recv() {
                inbox.push(Msg::from(command));
            }
            self.dispatch_tick(inbox);
        }

        timeline_info!("timeline coordinator stopped after {} ticks", self.tick);
    }

    fn dispatch_tick(&mut self, inbox: Vec<Msg>) {
        self.tick += 1;
        set_coordination_tick(self.tick);
        for msg in inbox.into_iter().chain(std::iter::once(Msg::Flush)) {
            self.dispatch(msg);
        }
        self.publish_due();
    }

    fn dispatch(&mut self, msg: Msg) {
        if let Msg::PageFetched { ticket, .. } = &msg {
            if !self.state.pagination().expects(*ticket) {
                timeline_debug!("discarding stale page ticket={}", ticket.value());
            }
        }
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in effects {
            self.run_effect(effect);
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::FetchPage(request) => {
                timeline_debug!(
                    "page request ticket={} kind={:?}",
                    request.ticket.value(),
                    request.kind
                );
                let fetcher = self.fetcher.clone();
                self.tasks.spawn(async move {
                    let result = fetcher.fetch_page(&request).await;
                    Msg::PageFetched {
                        ticket: request.ticket,
                        result,
                    }
                });
            }
            Effect::RunQuery { ticket, query } => {
                timeline_trace!(
                    "store query ticket={} domain={:?} ids={}",
                    ticket.value(),
                    query.scope().domain(),
                    query.ids().len()
                );
                let store = self.store.clone();
                self.tasks.spawn(async move {
                    match store.query(&query).await {
                        Ok(items) => Msg::QueryCompleted { ticket, items },
                        Err(err) => {
                            timeline_error!(
                                "store query ticket={} failed: {}",
                                ticket.value(),
                                err
                            );
                            panic!("store query failed: {err}");
                        }
                    }
                });
            }
            Effect::Publish(list) => {
                self.throttle.offer(list, Instant::now());
            }
            Effect::PaginationChanged(view) => {
                timeline_debug!("pagination -> {}", view.state.name());
                self.emit(TimelineEvent::Pagination(view));
            }
        }
    }

    fn publish_due(&mut self) {
        if let Some(list) = self.throttle.poll(Instant::now()) {
            timeline_trace!(
                "publishing revision={} items={}",
                list.revision(),
                list.len()
            );
            self.emit(TimelineEvent::Projected(list));
        }
    }

    fn emit(&self, event: TimelineEvent) {
        // The consumer may have stopped listening; the session runs until the handle drops.
        let _ = self.event_tx.send(event);
    }
}

async fn next_change(changes: &mut Option<broadcast::Receiver<ChangeSet>>) -> Option<ChangeSet> {
    let Some(receiver) = changes.as_mut() else {
        return std::future::pending().await;
    };
    match receiver.recv().await {
        Ok(set) => Some(set),
        Err(broadcast::error::RecvError::Lagged(skipped)) => {
            timeline_warn!("store notifications lagged by {}; re-deriving", skipped);
            Some(ChangeSet::Overflowed)
        }
        Err(broadcast::error::RecvError::Closed) => {
            timeline_warn!("store notification stream closed");
            *changes = None;
            None
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}
