use crate::comparator::Comparator;
use crate::sstable::block::Block;
use crate::sstable::footer::BlockHandle;
use crate::Result;
use std::cmp::Ordering;

/// One index entry: the handle of a block whose keys are all less or equal
/// to `key`, and less than the next entry's key.
#[derive(Clone, Debug)]
pub struct IndexEntry {
    pub key: Vec<u8>,
    pub handle: BlockHandle,
}

/// The decoded form of an index or meta index block: an ordered list of
/// `(key, handle)` pairs.
pub struct IndexSlice {
    entries: Vec<IndexEntry>,
}

impl IndexSlice {
    /// Decodes the first `num_restarts` entries of `block`; index blocks
    /// store every entry as its own restart, so that count is the entry
    /// count. Each entry's value is a serialized block handle.
    pub fn decode(block: &Block) -> Result<IndexSlice> {
        let count = block.num_restarts() as usize;
        let mut entries = Vec::with_capacity(count);
        let mut iter = block.iter();
        for _ in 0..count {
            match iter.next_entry()? {
                Some(entry) => {
                    let (handle, _) = BlockHandle::decode(&entry.value)?;
                    entries.push(IndexEntry {
                        key: entry.key,
                        handle,
                    });
                }
                None => break,
            }
        }
        Ok(IndexSlice { entries })
    }

    /// Smallest `i` with `entries[i].key >= key`, or `len` if none.
    pub fn search(&self, key: &[u8], cmp: &dyn Comparator) -> usize {
        let mut left = 0;
        let mut right = self.entries.len();
        while left < right {
            let mid = left + (right - left) / 2;
            if cmp.compare(&self.entries[mid].key, key) == Ordering::Less {
                left = mid + 1;
            } else {
                right = mid;
            }
        }
        left
    }

    /// Entry under exactly `key`, for meta-index lookups by name.
    pub fn find(&self, key: &[u8], cmp: &dyn Comparator) -> Option<&IndexEntry> {
        let i = self.search(key, cmp);
        match self.entries.get(i) {
            Some(entry) if cmp.compare(&entry.key, key) == Ordering::Equal => Some(entry),
            _ => None,
        }
    }

    pub fn get(&self, i: usize) -> Option<&IndexEntry> {
        self.entries.get(i)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IndexEntry> {
        self.entries.iter()
    }
}
