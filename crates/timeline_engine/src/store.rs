use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use timeline_core::{
    ChangeSet, ChangedRecord, ItemHandle, ItemId, MaterializedItem, QueryFilter, StoreQuery,
};
use tokio::sync::broadcast;

use crate::StoreError;

const CHANGE_CAPACITY: usize = 256;

/// Keyed, observable store the projector reads from.
#[async_trait::async_trait]
pub trait ItemStore: Send + Sync {
    /// Rows matching the query, in no particular order.
    async fn query(&self, query: &StoreQuery) -> Result<Vec<MaterializedItem>, StoreError>;

    /// Mutation notifications for every write to the store.
    fn subscribe(&self) -> broadcast::Receiver<ChangeSet>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusRecord {
    pub id: ItemId,
    pub domain: String,
    pub content: String,
    pub created_at: String,
    pub is_reply: bool,
    pub is_reblog: bool,
    pub has_media: bool,
    pub deleted: bool,
}

impl StatusRecord {
    fn passes(&self, filter: &QueryFilter) -> bool {
        !(filter.exclude_replies && self.is_reply
            || filter.exclude_reblogs && self.is_reblog
            || filter.only_media && !self.has_media
            || filter.exclude_deleted && self.deleted)
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    record: Option<StatusRecord>,
}

#[derive(Debug, Default)]
struct Arena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    index: HashMap<(String, ItemId), u32>,
}

impl Arena {
    fn insert(&mut self, record: StatusRecord) -> ItemHandle {
        let key = (record.domain.clone(), record.id.clone());
        if let Some(&slot) = self.index.get(&key) {
            let entry = &mut self.slots[slot as usize];
            entry.record = Some(record);
            return ItemHandle::new(slot, entry.generation);
        }
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.slots.push(Slot::default());
                (self.slots.len() - 1) as u32
            }
        };
        let entry = &mut self.slots[slot as usize];
        entry.record = Some(record);
        self.index.insert(key, slot);
        ItemHandle::new(slot, entry.generation)
    }

    fn record_mut(&mut self, domain: &str, id: &ItemId) -> Option<&mut StatusRecord> {
        let slot = *self.index.get(&(domain.to_string(), id.clone()))?;
        self.slots[slot as usize].record.as_mut()
    }

    fn evict(&mut self, domain: &str, id: &ItemId) -> Option<StatusRecord> {
        let slot = self.index.remove(&(domain.to_string(), id.clone()))?;
        let entry = &mut self.slots[slot as usize];
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(slot);
        entry.record.take()
    }

    fn resolve(&self, handle: ItemHandle) -> Option<&StatusRecord> {
        let entry = self.slots.get(handle.slot() as usize)?;
        if entry.generation != handle.generation() {
            return None;
        }
        entry.record.as_ref()
    }
}

/// In-memory arena store. Records live in stable slots; handles are
/// slot keys checked against the slot generation.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    arena: Arc<RwLock<Arena>>,
    changes: broadcast::Sender<ChangeSet>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            arena: Arc::new(RwLock::new(Arena::default())),
            changes,
        }
    }

    /// Inserts or replaces a record. Replacing keeps the existing handle.
    pub fn upsert(&self, record: StatusRecord) -> Result<ItemHandle, StoreError> {
        let mut handles = self.upsert_many(vec![record])?;
        handles
            .pop()
            .ok_or_else(|| StoreError::Unavailable("upsert produced no handle".into()))
    }

    /// Writes a batch under one lock and one change notification.
    pub fn upsert_many(&self, records: Vec<StatusRecord>) -> Result<Vec<ItemHandle>, StoreError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let changed = records.iter().map(changed_record).collect();
        let handles = {
            let mut arena = self.write()?;
            records
                .into_iter()
                .map(|record| arena.insert(record))
                .collect()
        };
        self.notify(changed);
        Ok(handles)
    }

    /// Flags a record as deleted without evicting it. Returns false if absent.
    pub fn mark_deleted(&self, domain: &str, id: &ItemId) -> Result<bool, StoreError> {
        let found = {
            let mut arena = self.write()?;
            match arena.record_mut(domain, id) {
                Some(record) => {
                    record.deleted = true;
                    true
                }
                None => false,
            }
        };
        if found {
            self.notify(vec![ChangedRecord {
                domain: domain.to_string(),
                id: id.clone(),
            }]);
        }
        Ok(found)
    }

    /// Evicts a record; outstanding handles to it stop resolving.
    pub fn remove(&self, domain: &str, id: &ItemId) -> Result<Option<StatusRecord>, StoreError> {
        let removed = self.write()?.evict(domain, id);
        if removed.is_some() {
            self.notify(vec![ChangedRecord {
                domain: domain.to_string(),
                id: id.clone(),
            }]);
        }
        Ok(removed)
    }

    pub fn get(&self, handle: ItemHandle) -> Result<Option<StatusRecord>, StoreError> {
        Ok(self.read()?.resolve(handle).cloned())
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.index.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn notify(&self, records: Vec<ChangedRecord>) {
        // No subscribers is fine.
        let _ = self.changes.send(ChangeSet::Records(records));
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Arena>, StoreError> {
        self.arena
            .read()
            .map_err(|_| StoreError::Unavailable("arena lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Arena>, StoreError> {
        self.arena
            .write()
            .map_err(|_| StoreError::Unavailable("arena lock poisoned".into()))
    }
}

#[async_trait::async_trait]
impl ItemStore for MemoryStore {
    async fn query(&self, query: &StoreQuery) -> Result<Vec<MaterializedItem>, StoreError> {
        validate(query)?;
        let wanted: HashSet<&ItemId> = query.ids().iter().collect();
        let scope = query.scope();
        let arena = self.read()?;

        let rows = arena
            .slots
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| {
                let record = entry.record.as_ref()?;
                let matches = scope.matches_domain(&record.domain)
                    && wanted.contains(&record.id)
                    && scope.filter().is_none_or(|filter| record.passes(filter));
                matches.then(|| MaterializedItem {
                    id: record.id.clone(),
                    handle: ItemHandle::new(slot as u32, entry.generation),
                })
            })
            .collect();
        Ok(rows)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeSet> {
        self.changes.subscribe()
    }
}

fn changed_record(record: &StatusRecord) -> ChangedRecord {
    ChangedRecord {
        domain: record.domain.clone(),
        id: record.id.clone(),
    }
}

fn validate(query: &StoreQuery) -> Result<(), StoreError> {
    let domain = query.scope().domain();
    if domain.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(StoreError::MalformedPredicate(format!(
            "domain {domain:?} is not a host name"
        )));
    }
    Ok(())
}
