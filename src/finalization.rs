//! Per-date "day finalized" flag over a string key-value store.

use crate::attendance::ProgressionStateMachine;
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::info;

/// Minimal string key-value persistence.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// `HashMap` backed store, for tests and embedding.
#[derive(Clone, Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: HashMap<String, String>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

pub const DEFAULT_KEY_PREFIX: &str = "day-finalized-";

/// Stores `"true"`/`"false"` under `day-finalized-{YYYY-MM-DD}`.
pub struct DayFinalizationStore<K: KeyValueStore> {
    kv: K,
    prefix: String,
}

impl<K: KeyValueStore> DayFinalizationStore<K> {
    pub fn new(kv: K) -> Self {
        Self::with_prefix(kv, DEFAULT_KEY_PREFIX)
    }

    pub fn with_prefix(kv: K, prefix: impl Into<String>) -> Self {
        Self {
            kv,
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, date: NaiveDate) -> String {
        format!("{}{}", self.prefix, date.format("%Y-%m-%d"))
    }

    /// Anything other than a stored `"true"` reads as not finalized.
    pub fn is_finalized(&self, date: NaiveDate) -> bool {
        self.kv.get(&self.key(date)).as_deref() == Some("true")
    }

    pub fn set_finalized(&mut self, date: NaiveDate, finalized: bool) {
        let key = self.key(date);
        self.kv.set(&key, if finalized { "true" } else { "false" });
        info!(%date, finalized, "Day finalization flag written");
    }

    pub fn inner(&self) -> &K {
        &self.kv
    }
}

/// Un-finalize the machine's current date and unlock its board.
pub fn reopen_day<K: KeyValueStore>(
    store: &mut DayFinalizationStore<K>,
    machine: &mut ProgressionStateMachine,
) {
    let date = machine.board().date();
    store.set_finalized(date, false);
    machine.set_finalized(false);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::AttendanceBoard;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 17).unwrap()
    }

    #[test]
    fn key_uses_iso_date() {
        let store = DayFinalizationStore::new(MemoryKeyValueStore::new());
        assert_eq!(store.key(date()), "day-finalized-2025-09-17");
    }

    #[test]
    fn flag_round_trips_through_store() {
        let mut store = DayFinalizationStore::new(MemoryKeyValueStore::new());
        assert!(!store.is_finalized(date()));

        store.set_finalized(date(), true);
        assert!(store.is_finalized(date()));
        assert_eq!(
            store.inner().get("day-finalized-2025-09-17").as_deref(),
            Some("true")
        );

        store.set_finalized(date(), false);
        assert!(!store.is_finalized(date()));
    }

    #[test]
    fn unexpected_values_read_as_not_finalized() {
        let mut kv = MemoryKeyValueStore::new();
        kv.set("day-finalized-2025-09-17", "yes");
        let store = DayFinalizationStore::new(kv);
        assert!(!store.is_finalized(date()));
    }

    #[test]
    fn replace_board_reads_flag_and_reopen_clears_it() {
        let mut store = DayFinalizationStore::new(MemoryKeyValueStore::new());
        store.set_finalized(date(), true);

        let mut machine = ProgressionStateMachine::new(AttendanceBoard::new(date()));
        machine.replace_board(AttendanceBoard::new(date()), &store);
        assert!(machine.is_finalized());

        reopen_day(&mut store, &mut machine);
        assert!(!machine.is_finalized());
        assert!(!store.is_finalized(date()));
    }
}
