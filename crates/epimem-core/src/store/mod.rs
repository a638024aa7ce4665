//! Store facade (spec §4.A, §6.1).
//!
//! A typed wrapper over a pluggable external KV store. The core never talks
//! to a concrete backend directly; every component goes through
//! [`StoreFacade`], which in turn goes through the [`KvStore`] trait object
//! supplied at construction — the same shape as `vestige-core::Storage`
//! wrapping `rusqlite::Connection`, except here the "connection" is an
//! interface, not a concrete crate, per spec §1 ("the pluggable key/value
//! store... specified only by the interface the core consumes").

mod memory;

pub use memory::InMemoryStore;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{CoreError, Result};

/// Write-side metadata every store mutation carries (spec §4.A).
#[derive(Debug, Clone)]
pub struct WriteMeta {
    pub tenant: String,
    pub record_type: String,
    pub immutable: bool,
    pub timestamp: DateTime<Utc>,
}

impl WriteMeta {
    pub fn new(tenant: impl Into<String>, record_type: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            record_type: record_type.into(),
            immutable: false,
            timestamp: Utc::now(),
        }
    }

    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }
}

/// Comparison operator for the scan filter DSL (spec §4.A).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
}

/// Which JSON field(s) a filter clause reads.
///
/// `AnyOf` implements "first non-null" semantics over an ordered list of
/// candidate field names — spec §4.A: "`field` may be an array meaning
/// 'first non-null'".
#[derive(Debug, Clone)]
pub enum FieldRef {
    Single(String),
    AnyOf(Vec<String>),
}

impl FieldRef {
    pub fn one(name: impl Into<String>) -> Self {
        FieldRef::Single(name.into())
    }

    pub fn any_of(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        FieldRef::AnyOf(names.into_iter().map(|n| n.into()).collect())
    }

    fn resolve<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        let obj = value.as_object()?;
        match self {
            FieldRef::Single(name) => obj.get(name).filter(|v| !v.is_null()),
            FieldRef::AnyOf(names) => names
                .iter()
                .find_map(|name| obj.get(name).filter(|v| !v.is_null())),
        }
    }
}

/// A single scan-filter clause (spec §4.A: `field`, `operator`, `value`).
#[derive(Debug, Clone)]
pub struct ScanFilter {
    pub field: FieldRef,
    pub op: FilterOp,
    pub value: Value,
}

impl ScanFilter {
    pub fn eq(field: FieldRef, value: Value) -> Self {
        Self { field, op: FilterOp::Eq, value }
    }

    pub(crate) fn matches(&self, candidate: &Value) -> bool {
        let Some(actual) = self.field.resolve(candidate) else {
            return false;
        };
        match self.op {
            FilterOp::Eq => actual == &self.value,
            FilterOp::Gt | FilterOp::Lt | FilterOp::Ge | FilterOp::Le => {
                let (Some(a), Some(b)) = (as_f64(actual), as_f64(&self.value)) else {
                    return false;
                };
                match self.op {
                    FilterOp::Gt => a > b,
                    FilterOp::Lt => a < b,
                    FilterOp::Ge => a >= b,
                    FilterOp::Le => a <= b,
                    FilterOp::Eq => unreachable!(),
                }
            }
        }
    }
}

fn as_f64(v: &Value) -> Option<f64> {
    v.as_f64().or_else(|| v.as_str().and_then(|s| s.parse().ok()))
}

/// The interface the core consumes from an external key/value store
/// (spec §6.1). Implementations must be safe under concurrent calls;
/// stronger ordering is not assumed.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn put(&self, key: &str, value: Value, meta: WriteMeta) -> Result<()>;
    fn exists(&self, key: &str) -> Result<bool>;
    /// Glob scan (`*` wildcard) returning matching *values*, not keys
    /// (spec §6.1: "`scan` returns values (not keys)").
    fn scan(&self, pattern: &str, filter: Option<&ScanFilter>) -> Result<Vec<Value>>;
    fn add_to_set(&self, key: &str, member: &str) -> Result<()>;
    fn remove_from_set(&self, key: &str, member: &str) -> Result<()>;
    fn set_members(&self, key: &str) -> Result<Vec<String>>;
    fn set_contains(&self, key: &str, member: &str) -> Result<bool>;
    fn set_count(&self, key: &str) -> Result<usize>;
}

/// Typed wrapper over a [`KvStore`] trait object.
///
/// Every component takes a `StoreFacade` (or a clone of it — it's a thin
/// `Arc` handle) rather than a `dyn KvStore` directly, so typed
/// `get_as`/`put_typed` helpers live in one place.
#[derive(Clone)]
pub struct StoreFacade {
    backend: Arc<dyn KvStore>,
}

impl StoreFacade {
    pub fn new(backend: Arc<dyn KvStore>) -> Self {
        Self { backend }
    }

    pub fn get_raw(&self, key: &str) -> Result<Option<Value>> {
        self.backend.get(key)
    }

    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.backend.get(key)? {
            Some(v) => Ok(Some(serde_json::from_value(v).map_err(|e| {
                CoreError::backend("store.decode", e.to_string())
            })?)),
            None => Ok(None),
        }
    }

    pub fn put_typed<T: Serialize>(&self, key: &str, value: &T, meta: WriteMeta) -> Result<()> {
        let v = serde_json::to_value(value)
            .map_err(|e| CoreError::backend("store.encode", e.to_string()))?;
        self.backend.put(key, v, meta)
    }

    pub fn put_many<T: Serialize>(&self, items: &[(&str, &T, WriteMeta)]) -> Result<()> {
        for (key, value, meta) in items {
            self.put_typed(key, *value, meta.clone())?;
        }
        Ok(())
    }

    pub fn get_many<T: DeserializeOwned>(&self, keys: &[&str]) -> Result<HashMap<String, T>> {
        let mut out = HashMap::new();
        for key in keys {
            if let Some(v) = self.get_as::<T>(key)? {
                out.insert((*key).to_string(), v);
            }
        }
        Ok(out)
    }

    pub fn exists(&self, key: &str) -> Result<bool> {
        self.backend.exists(key)
    }

    pub fn scan_as<T: DeserializeOwned>(
        &self,
        pattern: &str,
        filter: Option<&ScanFilter>,
    ) -> Result<Vec<T>> {
        self.backend
            .scan(pattern, filter)?
            .into_iter()
            .map(|v| {
                serde_json::from_value(v).map_err(|e| CoreError::backend("store.decode", e.to_string()))
            })
            .collect()
    }

    pub fn add_to_set(&self, key: &str, member: &str) -> Result<()> {
        self.backend.add_to_set(key, member)
    }

    pub fn remove_from_set(&self, key: &str, member: &str) -> Result<()> {
        self.backend.remove_from_set(key, member)
    }

    pub fn set_members(&self, key: &str) -> Result<Vec<String>> {
        self.backend.set_members(key)
    }

    pub fn set_contains(&self, key: &str, member: &str) -> Result<bool> {
        self.backend.set_contains(key, member)
    }

    pub fn set_count(&self, key: &str) -> Result<usize> {
        self.backend.set_count(key)
    }

    /// Resolve a set of member keys to typed records, silently dropping
    /// members whose record is missing (spec §5: "readers resolve indices by
    /// fetching the record and dropping missing entries").
    pub fn resolve_set<T: DeserializeOwned>(&self, index_key: &str, key_of: impl Fn(&str) -> String) -> Result<Vec<T>> {
        let members = self.set_members(index_key)?;
        let mut out = Vec::with_capacity(members.len());
        for member in members {
            if let Some(record) = self.get_as::<T>(&key_of(&member))? {
                out.push(record);
            }
        }
        Ok(out)
    }
}

/// Simple single-or-multi `*` glob matcher (spec §4.A: "a glob with `*`
/// wildcard").
pub fn glob_match(pattern: &str, candidate: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == candidate;
    }
    let mut pos = 0usize;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            if !candidate[pos..].starts_with(part) {
                return false;
            }
            pos += part.len();
        } else if i == parts.len() - 1 {
            return candidate[pos..].ends_with(part) && candidate.len() - pos >= part.len();
        } else {
            match candidate[pos..].find(part) {
                Some(found) => pos += found + part.len(),
                None => return false,
            }
        }
    }
    true
}
