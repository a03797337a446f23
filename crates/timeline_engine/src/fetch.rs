use std::time::Duration;

use serde::Deserialize;
use timeline_core::{
    Cursor, FailureKind, FetchError, ItemId, Page, PageRequest, ScopeFilter,
};
use timeline_logging::{timeline_debug, timeline_error};
use url::Url;

use crate::{MemoryStore, StatusRecord};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Instance root, e.g. `https://mastodon.social`.
    pub base_url: String,
    pub account_id: String,
    pub page_limit: u32,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: "https://mastodon.social".to_string(),
            account_id: String::new(),
            page_limit: 20,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Remote source of identifier pages.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page, FetchError>;
}

/// Account timeline fetcher for Mastodon-compatible instances.
///
/// Statuses are written to the store before their identifiers are returned,
/// so a merged page is already materialized when the projector queries it.
#[derive(Debug, Clone)]
pub struct MastodonFetcher {
    settings: FetchSettings,
    endpoint: Url,
    domain: String,
    client: reqwest::Client,
    store: MemoryStore,
}

impl MastodonFetcher {
    pub fn new(settings: FetchSettings, store: MemoryStore) -> Result<Self, FetchError> {
        let mut base = Url::parse(settings.base_url.trim())
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join(&format!("api/v1/accounts/{}/statuses", settings.account_id))
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let domain = ScopeFilter::for_instance(base.as_str())
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?
            .domain()
            .to_string();

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            settings,
            endpoint,
            domain,
            client,
            store,
        })
    }

    /// Domain the fetched records are stored under.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    fn page_url(&self, request: &PageRequest) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("limit", &self.settings.page_limit.to_string());
            if let Some(cursor) = &request.cursor {
                pairs.append_pair("max_id", cursor.as_str());
            }
            // exclude_deleted has no remote counterpart; the store applies it.
            let filter = &request.filter;
            for (flag, name) in [
                (filter.exclude_replies, "exclude_replies"),
                (filter.exclude_reblogs, "exclude_reblogs"),
                (filter.only_media, "only_media"),
            ] {
                if flag {
                    pairs.append_pair(name, "true");
                }
            }
        }
        url
    }
}

#[async_trait::async_trait]
impl PageFetcher for MastodonFetcher {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page, FetchError> {
        let url = self.page_url(request);
        timeline_debug!(
            "fetching page ticket={} kind={:?} url={}",
            request.ticket.value(),
            request.kind,
            url
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let statuses: Vec<WireStatus> = serde_json::from_slice(&body)
            .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))?;

        let records: Vec<StatusRecord> = statuses
            .into_iter()
            .map(|wire| wire.into_record(&self.domain))
            .collect();
        let ids: Vec<ItemId> = records.iter().map(|record| record.id.clone()).collect();
        let next_cursor = ids.last().map(|id| Cursor::new(id.as_str()));

        if let Err(err) = self.store.upsert_many(records) {
            timeline_error!("store rejected page ticket={}: {}", request.ticket.value(), err);
            panic!("store rejected fetched page: {err}");
        }

        Ok(Page { ids, next_cursor })
    }
}

#[derive(Debug, Deserialize)]
struct WireStatus {
    id: String,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    in_reply_to_id: Option<String>,
    #[serde(default)]
    reblog: Option<serde_json::Value>,
    #[serde(default)]
    media_attachments: Vec<serde_json::Value>,
}

impl WireStatus {
    fn into_record(self, domain: &str) -> StatusRecord {
        StatusRecord {
            id: ItemId::new(self.id),
            domain: domain.to_string(),
            content: self.content,
            created_at: self.created_at,
            is_reply: self.in_reply_to_id.is_some(),
            is_reblog: self.reblog.is_some(),
            has_media: !self.media_attachments.is_empty(),
            deleted: false,
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return FetchError::new(FailureKind::Decode, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
