//! Backing store abstraction
//!
//! The adapter never talks to a concrete key-value engine; it goes through
//! [`Store`], which any ordered KV backend can implement. [`MemoryStore`]
//! is the in-process implementation used by tests and single-node setups.

use std::collections::BTreeMap;
use std::ops::Bound;

/// Logical partition of the backing store
///
/// Database option entries and table definition entries live in separate
/// families so a prefix scan over one never sees the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnFamily {
    /// `db.opt` entries, one per database
    Db,
    /// `*.frm` entries, one per table
    Frm,
}

/// Ordered key-value backend the adapter runs against
///
/// Keys are the schema-validated relative paths, values are raw file
/// contents. Implementations do not need interior locking; the adapter
/// serializes all access behind its own lock.
pub trait Store: Send {
    /// Fetch the value stored under `key`, if any
    fn get(&self, cf: ColumnFamily, key: &str) -> Option<Vec<u8>>;

    /// Insert or replace the value under `key`
    fn put(&mut self, cf: ColumnFamily, key: &str, value: Vec<u8>);

    /// Remove the entry under `key`; removing a missing key is a no-op
    fn delete(&mut self, cf: ColumnFamily, key: &str);

    /// All keys starting with `prefix`, in key order
    fn keys_with_prefix(&self, cf: ColumnFamily, prefix: &str) -> Vec<String>;
}

/// In-memory [`Store`] backed by one ordered map per column family
#[derive(Debug, Default)]
pub struct MemoryStore {
    db: BTreeMap<String, Vec<u8>>,
    frm: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn family(&self, cf: ColumnFamily) -> &BTreeMap<String, Vec<u8>> {
        match cf {
            ColumnFamily::Db => &self.db,
            ColumnFamily::Frm => &self.frm,
        }
    }

    fn family_mut(&mut self, cf: ColumnFamily) -> &mut BTreeMap<String, Vec<u8>> {
        match cf {
            ColumnFamily::Db => &mut self.db,
            ColumnFamily::Frm => &mut self.frm,
        }
    }
}

impl Store for MemoryStore {
    fn get(&self, cf: ColumnFamily, key: &str) -> Option<Vec<u8>> {
        self.family(cf).get(key).cloned()
    }

    fn put(&mut self, cf: ColumnFamily, key: &str, value: Vec<u8>) {
        self.family_mut(cf).insert(key.to_string(), value);
    }

    fn delete(&mut self, cf: ColumnFamily, key: &str) {
        self.family_mut(cf).remove(key);
    }

    fn keys_with_prefix(&self, cf: ColumnFamily, prefix: &str) -> Vec<String> {
        self.family(cf)
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect()
    }
}
