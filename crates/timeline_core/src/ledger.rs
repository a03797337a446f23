use std::collections::HashMap;

use crate::ItemId;

/// Ordered identifier set: first-seen order, no duplicates, append-only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdentifierLedger {
    order: Vec<ItemId>,
    positions: HashMap<ItemId, usize>,
}

impl IdentifierLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends every identifier not already present, keeping input order.
    ///
    /// Returns the full sequence when at least one identifier was added and
    /// `None` when the call changed nothing.
    pub fn append<I>(&mut self, ids: I) -> Option<&[ItemId]>
    where
        I: IntoIterator<Item = ItemId>,
    {
        let before = self.order.len();
        for id in ids {
            if self.positions.contains_key(&id) {
                continue;
            }
            self.positions.insert(id.clone(), self.order.len());
            self.order.push(id);
        }
        if self.order.len() > before {
            Some(&self.order)
        } else {
            None
        }
    }

    pub fn current(&self) -> &[ItemId] {
        &self.order
    }

    pub fn position(&self, id: &ItemId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.positions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
