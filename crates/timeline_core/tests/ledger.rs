use timeline_core::{IdentifierLedger, ItemId};

fn ids(raw: &[&str]) -> Vec<ItemId> {
    raw.iter().copied().map(ItemId::from).collect()
}

fn first_seen(batches: &[&[&str]]) -> Vec<ItemId> {
    let mut seen = Vec::new();
    for id in batches.iter().flat_map(|batch| batch.iter()) {
        let id = ItemId::from(*id);
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

#[test]
fn order_is_first_seen_order_of_concatenated_input() {
    let batches: &[&[&str]] = &[&["5", "3"], &["3", "9", "1"], &[], &["1", "5", "7"]];
    let mut ledger = IdentifierLedger::new();
    for batch in batches {
        ledger.append(ids(batch));
    }

    assert_eq!(ledger.current(), first_seen(batches).as_slice());
    assert_eq!(ledger.len(), 5);
}

#[test]
fn re_append_is_idempotent() {
    let mut ledger = IdentifierLedger::new();
    ledger.append(ids(&["a", "b", "c"]));
    let before = ledger.clone();

    assert!(ledger.append(ids(&["c", "a"])).is_none());
    assert!(ledger.append(Vec::<ItemId>::new()).is_none());
    assert_eq!(ledger, before);
}

#[test]
fn append_reports_full_sequence_on_change() {
    let mut ledger = IdentifierLedger::new();
    ledger.append(ids(&["a"]));

    let current = ledger.append(ids(&["a", "b"])).map(<[ItemId]>::to_vec);
    assert_eq!(current, Some(ids(&["a", "b"])));
}
