//! Query result caching.
//!
//! Reads are cached under a fingerprint of the rendered statement and its
//! bound values. The built-in cache is a process-wide in-memory map keyed
//! per connection; a [`CacheBackend`] registered on a connection's
//! configuration replaces fingerprinting, lookup and store wholesale, and
//! is additionally notified on clears so custom backends can run their own
//! invalidation.
//!
//! Entries are never invalidated by content. The only granularity offered
//! is a full clear, which writes trigger automatically when the
//! connection's auto-clear flag is set.

use std::collections::HashMap;

use crate::value::{RawRow, Value};

/// Pluggable cache storage for one connection.
///
/// Implementations take `&self`; interior mutability is the backend's
/// concern. All methods receive the table and connection names so a backend
/// may partition or isolate by either.
pub trait CacheBackend {
    /// Derive the cache key for a statement and its bound values.
    fn fingerprint(&self, sql: &str, values: &[Value], table: &str, connection: &str) -> String {
        let _ = (table, connection);
        default_fingerprint(sql, values)
    }

    /// Fetch a previously stored row set, or `None` on a miss.
    fn lookup(&self, key: &str, table: &str, connection: &str) -> Option<Vec<RawRow>>;

    /// Store a fetched row set under a key.
    fn store(&self, key: &str, rows: &[RawRow], table: &str, connection: &str);

    /// Drop cached entries. `table` is advisory; the built-in cache always
    /// clears everything, and backends are free to do the same.
    fn clear(&self, table: Option<&str>, connection: &str);
}

/// Content-hash fingerprint of a statement and its values.
pub fn default_fingerprint(sql: &str, values: &[Value]) -> String {
    let joined = values
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(",");
    let key = format!("{sql}:{joined}");
    blake3::hash(key.as_bytes()).to_hex().to_string()
}

/// The built-in whole-process cache: connection name, then fingerprint.
#[derive(Debug, Default)]
pub(crate) struct QueryCache {
    entries: HashMap<String, HashMap<String, Vec<RawRow>>>,
}

impl QueryCache {
    pub(crate) fn get(&self, connection: &str, key: &str) -> Option<Vec<RawRow>> {
        self.entries.get(connection)?.get(key).cloned()
    }

    pub(crate) fn insert(&mut self, connection: &str, key: String, rows: Vec<RawRow>) {
        self.entries
            .entry(connection.to_string())
            .or_default()
            .insert(key, rows);
    }

    /// Unconditional: drops every entry for every connection.
    pub(crate) fn clear_all(&mut self) {
        self.entries.clear();
    }
}
