use std::collections::HashSet;

use pretty_assertions::assert_eq;
use timeline_core::{ChangeSet, ItemId, QueryFilter, ScopeFilter, StoreQuery};
use timeline_engine::{ItemStore, MemoryStore, StatusRecord, StoreError};

fn status(domain: &str, id: &str) -> StatusRecord {
    StatusRecord {
        id: ItemId::from(id),
        domain: domain.to_string(),
        content: format!("status {id}"),
        ..StatusRecord::default()
    }
}

fn ids(raw: &[&str]) -> Vec<ItemId> {
    raw.iter().copied().map(ItemId::from).collect()
}

#[tokio::test]
async fn query_returns_only_scoped_requested_records() {
    let store = MemoryStore::new();
    store
        .upsert_many(vec![
            status("x", "1"),
            status("x", "2"),
            status("y", "1"),
            status("x", "3"),
        ])
        .unwrap();

    let query = StoreQuery::new(ScopeFilter::new("x"), &ids(&["1", "3", "9"]));
    let rows = store.query(&query).await.unwrap();

    let found: HashSet<_> = rows.iter().map(|row| row.id.as_str().to_string()).collect();
    assert_eq!(found, HashSet::from(["1".to_string(), "3".to_string()]));
    for row in rows {
        assert_eq!(store.get(row.handle).unwrap().unwrap().domain, "x");
    }
}

#[tokio::test]
async fn filter_excludes_deleted_and_replies() {
    let store = MemoryStore::new();
    store
        .upsert_many(vec![
            status("x", "1"),
            StatusRecord {
                is_reply: true,
                ..status("x", "2")
            },
            status("x", "3"),
        ])
        .unwrap();
    assert!(store.mark_deleted("x", &ItemId::from("3")).unwrap());

    let scope = ScopeFilter::new("x").with_filter(QueryFilter {
        exclude_replies: true,
        exclude_deleted: true,
        ..QueryFilter::default()
    });
    let rows = store
        .query(&StoreQuery::new(scope, &ids(&["1", "2", "3"])))
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, ItemId::from("1"));
}

#[test]
fn replacing_a_record_keeps_its_handle() {
    let store = MemoryStore::new();
    let first = store.upsert(status("x", "1")).unwrap();
    let second = store
        .upsert(StatusRecord {
            content: "edited".to_string(),
            ..status("x", "1")
        })
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(store.get(first).unwrap().unwrap().content, "edited");
    assert_eq!(store.len().unwrap(), 1);
}

#[test]
fn removed_record_handle_no_longer_resolves() {
    let store = MemoryStore::new();
    let handle = store.upsert(status("x", "1")).unwrap();

    let removed = store.remove("x", &ItemId::from("1")).unwrap();
    assert_eq!(removed.map(|record| record.id), Some(ItemId::from("1")));
    assert!(store.get(handle).unwrap().is_none());

    let reused = store.upsert(status("x", "2")).unwrap();
    assert_eq!(reused.slot(), handle.slot());
    assert!(store.get(handle).unwrap().is_none());
    assert!(!store.is_empty().unwrap());
}

#[test]
fn writes_are_broadcast_as_change_sets() {
    let store = MemoryStore::new();
    let mut changes = store.subscribe();

    store
        .upsert_many(vec![status("x", "1"), status("x", "2")])
        .unwrap();
    store.mark_deleted("x", &ItemId::from("missing")).unwrap();
    store.remove("x", &ItemId::from("2")).unwrap();

    let ChangeSet::Records(batch) = changes.try_recv().unwrap() else {
        panic!("expected records");
    };
    assert_eq!(batch.len(), 2);
    let ChangeSet::Records(removal) = changes.try_recv().unwrap() else {
        panic!("expected records");
    };
    assert_eq!(removal[0].id, ItemId::from("2"));
    assert!(changes.try_recv().is_err(), "absent record is not a change");
}

#[tokio::test]
async fn malformed_domain_is_rejected() {
    let store = MemoryStore::new();
    let query = StoreQuery::new(ScopeFilter::new("bad domain/x"), &ids(&["1"]));

    let err = store.query(&query).await.unwrap_err();
    assert!(matches!(err, StoreError::MalformedPredicate(_)));
}
