//! Reference [`KvStore`] implementation (spec SPEC_FULL "Supplemented
//! Features"): an in-process, `Mutex`-guarded store. Not a production
//! backend — no persistence, no cross-process sharing — but exercises the
//! same contract a real backend must, and is what every unit/integration
//! test in this crate runs against.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use serde_json::Value;

use super::{glob_match, KvStore, ScanFilter, WriteMeta};
use crate::error::Result;

struct Record {
    value: Value,
    #[allow(dead_code)]
    meta: WriteMeta,
}

/// In-memory reference implementation of [`KvStore`].
#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<HashMap<String, Record>>,
    sets: Mutex<HashMap<String, HashSet<String>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let records = self.records.lock().expect("store lock poisoned");
        Ok(records.get(key).map(|r| r.value.clone()))
    }

    fn put(&self, key: &str, value: Value, meta: WriteMeta) -> Result<()> {
        let mut records = self.records.lock().expect("store lock poisoned");
        records.insert(key.to_string(), Record { value, meta });
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let records = self.records.lock().expect("store lock poisoned");
        Ok(records.contains_key(key))
    }

    fn scan(&self, pattern: &str, filter: Option<&ScanFilter>) -> Result<Vec<Value>> {
        let records = self.records.lock().expect("store lock poisoned");
        let mut out: Vec<Value> = records
            .iter()
            .filter(|(key, _)| glob_match(pattern, key))
            .map(|(_, record)| record.value.clone())
            .collect();
        if let Some(filter) = filter {
            out.retain(|v| filter.matches(v));
        }
        Ok(out)
    }

    fn add_to_set(&self, key: &str, member: &str) -> Result<()> {
        let mut sets = self.sets.lock().expect("store lock poisoned");
        sets.entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    fn remove_from_set(&self, key: &str, member: &str) -> Result<()> {
        let mut sets = self.sets.lock().expect("store lock poisoned");
        if let Some(set) = sets.get_mut(key) {
            set.remove(member);
        }
        Ok(())
    }

    fn set_members(&self, key: &str) -> Result<Vec<String>> {
        let sets = self.sets.lock().expect("store lock poisoned");
        Ok(sets.get(key).map(|s| s.iter().cloned().collect()).unwrap_or_default())
    }

    fn set_contains(&self, key: &str, member: &str) -> Result<bool> {
        let sets = self.sets.lock().expect("store lock poisoned");
        Ok(sets.get(key).map(|s| s.contains(member)).unwrap_or(false))
    }

    fn set_count(&self, key: &str) -> Result<usize> {
        let sets = self.sets.lock().expect("store lock poisoned");
        Ok(sets.get(key).map(|s| s.len()).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_roundtrips() {
        let store = InMemoryStore::new();
        store
            .put("k1", serde_json::json!({"a": 1}), WriteMeta::new("t", "claim"))
            .unwrap();
        assert_eq!(store.get("k1").unwrap(), Some(serde_json::json!({"a": 1})));
        assert!(store.exists("k1").unwrap());
        assert!(!store.exists("missing").unwrap());
    }

    #[test]
    fn sets_are_deduplicated() {
        let store = InMemoryStore::new();
        store.add_to_set("s", "x").unwrap();
        store.add_to_set("s", "x").unwrap();
        store.add_to_set("s", "y").unwrap();
        assert_eq!(store.set_count("s").unwrap(), 2);
        store.remove_from_set("s", "x").unwrap();
        assert_eq!(store.set_count("s").unwrap(), 1);
        assert!(store.set_contains("s", "y").unwrap());
    }

    #[test]
    fn scan_filters_by_glob_and_predicate() {
        let store = InMemoryStore::new();
        store
            .put("layer_index:t:hot", serde_json::json!({"score": 0.9}), WriteMeta::new("t", "idx"))
            .unwrap();
        store
            .put("layer_index:t:cold", serde_json::json!({"score": 0.1}), WriteMeta::new("t", "idx"))
            .unwrap();
        let all = store.scan("layer_index:t:*", None).unwrap();
        assert_eq!(all.len(), 2);

        let filter = ScanFilter::eq(
            super::super::FieldRef::one("score"),
            serde_json::json!(0.9),
        );
        let filtered = store.scan("layer_index:t:*", Some(&filter)).unwrap();
        assert_eq!(filtered.len(), 1);
    }
}
