use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Size the table may reach before idle entries are pruned.
const MIN_PRUNE_AT: usize = 64;

/// One mutex per session key.
///
/// Requests for the same (user, attitude) run one at a time; requests for
/// different keys only share the brief lookup in `slot`. Entries nobody holds
/// are dropped once the table doubles in size, so it stays proportional to
/// the sessions in flight.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    table: Mutex<Table>,
}

#[derive(Debug, Default)]
struct Table {
    slots: HashMap<String, Arc<Mutex<()>>>,
    prune_at: usize,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mutex guarding `key`, created on first use.
    pub fn slot(&self, key: &str) -> Arc<Mutex<()>> {
        let mut table = self.table.lock().expect("session lock table poisoned");

        if table.slots.len() >= table.prune_at {
            // Held or awaited slots have clones outside the table
            table.slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            table.prune_at = (table.slots.len() * 2).max(MIN_PRUNE_AT);
        }

        table.slots.entry(key.to_string()).or_default().clone()
    }

    pub fn len(&self) -> usize {
        self.table
            .lock()
            .expect("session lock table poisoned")
            .slots
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
