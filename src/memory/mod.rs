//! Memory table: the mutable, ordered stage in front of the on-disk tables.

use crate::collections::skiplist::{Iter, SkipList};
use crate::comparator::Comparator;
use std::cmp::Ordering;
use std::sync::Arc;

/// Byte-keyed ordered map over the skip list.
///
/// Entries are ordered by the injected comparator, which must match the one
/// the destination table will be written with. Like the skip list beneath
/// it, a mem table is single-writer: the caller serializes mutation against
/// any concurrent access.
pub struct MemTable {
    entries: SkipList<Vec<u8>, Vec<u8>>,
    comparator: Arc<dyn Comparator>,
}

impl MemTable {
    pub fn new(comparator: Arc<dyn Comparator>) -> MemTable {
        let cmp = comparator.clone();
        let less = move |a: &Vec<u8>, b: &Vec<u8>| cmp.compare(a, b) == Ordering::Less;
        MemTable {
            entries: SkipList::new(Box::new(less)),
            comparator,
        }
    }

    pub fn comparator(&self) -> &Arc<dyn Comparator> {
        &self.comparator
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(&key.to_vec()).map(|v| v.as_slice())
    }

    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.entries.put(key, value);
    }

    /// Removes `key` and returns its value.
    pub fn remove(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.remove(&key.to_vec()).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first_key_value(&self) -> Option<(&[u8], &[u8])> {
        self.entries
            .min()
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    pub fn last_key_value(&self) -> Option<(&[u8], &[u8])> {
        self.entries
            .max()
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    /// Entries in comparator order, ready to feed a table writer.
    pub fn iter(&self) -> Iter<'_, Vec<u8>, Vec<u8>> {
        self.entries.iter()
    }
}
