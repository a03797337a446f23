use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use timeline_core::{PaginationState, ProjectedList, ScopeFilter};
use timeline_engine::{MastodonFetcher, MemoryStore, TimelineEvent, TimelineHandle};
use timeline_logging::{timeline_info, timeline_warn};

use crate::config::AppConfig;

const PREVIEW_ITEMS: usize = 3;
const PREVIEW_CHARS: usize = 60;

/// Follows one account timeline until it runs out of pages, fails, or hits `max_pages`.
pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    let scope = ScopeFilter::for_instance(&config.base_url)
        .with_context(|| format!("invalid base url {:?}", config.base_url))?
        .with_filter(config.filter());
    let store = MemoryStore::new();
    let fetcher = MastodonFetcher::new(config.fetch_settings(), store.clone())
        .context("building page fetcher")?;
    let handle = TimelineHandle::new(
        config.engine_config(scope),
        Arc::new(store.clone()),
        Arc::new(fetcher),
    );

    // Generous enough for one request plus a throttle window.
    let idle_timeout = Duration::from_secs(config.request_timeout_secs.saturating_add(5));
    let mut pages = 0u32;
    handle.begin_load()?;

    loop {
        let Some(event) = handle.recv_timeout(idle_timeout)? else {
            anyhow::bail!("timeline went quiet for {:?}", idle_timeout);
        };
        match event {
            TimelineEvent::Projected(list) => print_snapshot(&store, &list),
            TimelineEvent::Pagination(view) => match view.state {
                PaginationState::Idle => {
                    pages += 1;
                    if pages >= config.max_pages {
                        timeline_info!("Stopping after {} pages", pages);
                        break;
                    }
                    handle.load_more()?;
                }
                PaginationState::NoMore => {
                    timeline_info!("Reached the end of the timeline after {} pages", pages);
                    break;
                }
                PaginationState::Fail(error) => {
                    timeline_warn!("Page fetch failed: {}", error);
                    return Err(error).context("following timeline");
                }
                PaginationState::Initial
                | PaginationState::Loading
                | PaginationState::Reloading => {}
            },
        }
    }

    // The trailing snapshot lands at most one throttle window later.
    let grace = Duration::from_millis(config.throttle_ms.saturating_mul(3));
    while let Some(event) = handle.recv_timeout(grace)? {
        if let TimelineEvent::Projected(list) = event {
            print_snapshot(&store, &list);
        }
    }
    Ok(())
}

fn print_snapshot(store: &MemoryStore, list: &ProjectedList) {
    println!(
        "{} revision={} items={}",
        Local::now().format("%H:%M:%S%.3f"),
        list.revision(),
        list.len()
    );
    for handle in list.handles().into_iter().take(PREVIEW_ITEMS) {
        if let Ok(Some(record)) = store.get(handle) {
            let preview: String = record.content.chars().take(PREVIEW_CHARS).collect();
            println!("  {} {} {}", record.id, record.created_at, preview);
        }
    }
}
