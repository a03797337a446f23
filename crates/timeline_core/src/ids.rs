use std::fmt;

/// Opaque key naming one content record in the remote system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ItemId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Arena key into a store's record slots.
///
/// The generation changes whenever a slot is reused, so a handle to an
/// evicted record never resolves to its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemHandle {
    slot: u32,
    generation: u32,
}

impl ItemHandle {
    pub fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }

    pub fn slot(self) -> u32 {
        self.slot
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// Continuation token handed back by the remote page source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_item_id_is_empty() {
        assert_eq!(ItemId::default().as_str(), "");
        assert_eq!(ItemId::default(), ItemId::from(""));
    }
}
