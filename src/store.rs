use std::collections::BTreeMap;

use crate::models::{EventKind, EventRecord};

/// Upsert-by-id sink for event records.
pub trait EntityStore {
    fn upsert(&mut self, record: EventRecord);
}

/// In-memory store with last-write-wins semantics per (kind, id).
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<(EventKind, String), EventRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: EventKind, id: &str) -> Option<&EventRecord> {
        self.records.get(&(kind, id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &EventRecord> {
        self.records.values()
    }

    /// Remove and return every buffered record, ordered by kind then id.
    pub fn drain(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.records).into_values().collect()
    }
}

impl EntityStore for MemoryStore {
    fn upsert(&mut self, record: EventRecord) {
        self.records.insert((record.kind(), record.id().to_string()), record);
    }
}

impl<S: EntityStore + ?Sized> EntityStore for &mut S {
    fn upsert(&mut self, record: EventRecord) {
        (**self).upsert(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EnvelopeFields, Provenance};
    use crate::projector::PartialRecord;

    fn record(kind: EventKind, id: &str, event: &str) -> EventRecord {
        let provenance = Provenance {
            block_time: 1,
            block_height: 1,
            block_hash: "h".into(),
            predecessor_id: "p".into(),
            receiver_id: "r".into(),
            signer_id: "s".into(),
            signer_public_key: "k".into(),
            gas_burned: 1,
            tokens_burned: 1,
            outcome_id: "o".into(),
            executor_id: "e".into(),
            outcome_block_hash: "h".into(),
        };
        let envelope = EnvelopeFields {
            event: Some(event.to_string()),
            ..Default::default()
        };
        EventRecord::assemble(kind, id.to_string(), provenance, envelope, PartialRecord::default())
    }

    #[test]
    fn test_last_write_wins() {
        let mut store = MemoryStore::new();
        store.upsert(record(EventKind::Init, "a", "first"));
        store.upsert(record(EventKind::Init, "a", "second"));

        assert_eq!(store.len(), 1);
        let stored = store.get(EventKind::Init, "a").unwrap();
        assert_eq!(stored.envelope().event.as_deref(), Some("second"));
    }

    #[test]
    fn test_kinds_do_not_collide() {
        let mut store = MemoryStore::new();
        store.upsert(record(EventKind::Init, "a", "x"));
        store.upsert(record(EventKind::TransferAdmin, "a", "y"));

        assert_eq!(store.len(), 2);

        let drained = store.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].kind(), EventKind::Init);
        assert_eq!(drained[1].kind(), EventKind::TransferAdmin);
        assert!(store.is_empty());
    }
}
