//! Timeline engine: coordination task, store and page-fetch collaborators.
mod config;
mod engine;
mod fetch;
mod store;
mod types;

pub use config::EngineConfig;
pub use engine::TimelineHandle;
pub use fetch::{FetchSettings, MastodonFetcher, PageFetcher};
pub use store::{ItemStore, MemoryStore, StatusRecord};
pub use types::{EngineError, StoreError, TimelineEvent};
