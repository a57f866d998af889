use crate::byteutils::{u32_from_le_bytes, uvarint};
use crate::comparator::Comparator;
use crate::error::SSTLiteError;
use crate::Result;
use std::cmp::Ordering;

/// The uncompressed contents of one stored block, trailer already removed.
///
/// Layout: prefix-compressed entries, then `num_restarts` little-endian u32
/// restart offsets, then `num_restarts` itself. The block bytes are never
/// mutated; decoded keys are reconstructed into fresh buffers.
pub struct Block {
    data: Vec<u8>,
}

/// One decoded block entry with its reconstructed key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockEntry {
    pub shared: u64,
    pub unshared: u64,
    pub value_len: u64,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl Block {
    pub fn new(data: Vec<u8>) -> Block {
        Block { data }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn num_restarts(&self) -> u32 {
        if self.data.len() < 4 {
            return 0;
        }
        u32_from_le_bytes(&self.data[self.data.len() - 4..])
    }

    /// Offset where the restart array begins; the entries region ends here.
    /// A block whose restart count does not fit its length is degenerate and
    /// reads as empty.
    pub fn restart_offset_start(&self) -> usize {
        let len = self.data.len();
        if len < 4 {
            return 0;
        }
        let wanted = 4 * (self.num_restarts() as usize + 1);
        if wanted > len {
            return 0;
        }
        len - wanted
    }

    /// Offset of the `i`th restart point within the entries region.
    pub fn restart_point(&self, i: usize) -> u32 {
        debug_assert!(i < self.num_restarts() as usize);
        let start = self.restart_offset_start() + 4 * i;
        u32_from_le_bytes(&self.data[start..start + 4])
    }

    pub fn restart_array(&self) -> Vec<u32> {
        (0..self.num_restarts() as usize)
            .map(|i| self.restart_point(i))
            .collect()
    }

    fn entries_region(&self) -> &[u8] {
        &self.data[..self.restart_offset_start()]
    }

    /// Full key stored at restart point `i`. Restart entries carry their
    /// whole key; a nonzero shared length there is corruption.
    fn restart_key(&self, i: usize) -> Result<&[u8]> {
        let region = self.entries_region();
        let off = self.restart_point(i) as usize;
        if off >= region.len() {
            return Err(SSTLiteError::BlockReadCorruption);
        }
        let (shared, n0) =
            uvarint(&region[off..]).map_err(|_| SSTLiteError::BlockReadCorruption)?;
        let (unshared, n1) =
            uvarint(&region[off + n0..]).map_err(|_| SSTLiteError::BlockReadCorruption)?;
        let (_value_len, n2) =
            uvarint(&region[off + n0 + n1..]).map_err(|_| SSTLiteError::BlockReadCorruption)?;
        if shared != 0 {
            return Err(SSTLiteError::BlockReadCorruption);
        }

        let start = off + n0 + n1 + n2;
        let end = start
            .checked_add(unshared as usize)
            .ok_or(SSTLiteError::BlockReadCorruption)?;
        if end > region.len() {
            return Err(SSTLiteError::BlockReadCorruption);
        }
        Ok(&region[start..end])
    }

    /// Looks up `key`: binary search over the restart points for the
    /// rightmost restart at or before the key, then a linear scan with
    /// prefix reconstruction until the key is met or passed.
    pub fn search(&self, key: &[u8], cmp: &dyn Comparator) -> Result<Option<BlockEntry>> {
        let num_restarts = self.num_restarts() as usize;
        if num_restarts == 0 {
            return Ok(None);
        }

        // First restart whose key is strictly greater than the target.
        let mut left = 0;
        let mut right = num_restarts;
        while left < right {
            let mid = left + (right - left) / 2;
            match cmp.compare(self.restart_key(mid)?, key) {
                Ordering::Greater => right = mid,
                _ => left = mid + 1,
            }
        }
        let start_restart = left.saturating_sub(1);

        let mut iter = BlockIter {
            region: self.entries_region(),
            pos: self.restart_point(start_restart) as usize,
            key: Vec::new(),
        };
        while let Some(entry) = iter.next_entry()? {
            match cmp.compare(&entry.key, key) {
                Ordering::Equal => return Ok(Some(entry)),
                Ordering::Greater => return Ok(None),
                Ordering::Less => {}
            }
        }
        Ok(None)
    }

    /// Sequential decode of every entry in the block.
    pub fn iter(&self) -> BlockIter<'_> {
        BlockIter {
            region: self.entries_region(),
            pos: 0,
            key: Vec::new(),
        }
    }

    /// Like [`iter`](Block::iter), but owning the block bytes; used where
    /// the iterator must outlive the block binding.
    pub fn into_entries(self) -> BlockIntoIter {
        let end = self.restart_offset_start();
        BlockIntoIter {
            data: self.data,
            end,
            pos: 0,
            key: Vec::new(),
        }
    }
}

/// Decodes the entry at `pos`, reusing `key_buf` for the prefix-share
/// reconstruction. Returns the entry (key cloned out of the buffer) and the
/// offset just past it, or `None` at the end of the region.
fn parse_entry(
    region: &[u8],
    pos: usize,
    key_buf: &mut Vec<u8>,
) -> Result<Option<(BlockEntry, usize)>> {
    if pos >= region.len() {
        return Ok(None);
    }

    let (shared, n0) = uvarint(&region[pos..]).map_err(|_| SSTLiteError::BlockReadCorruption)?;
    let (unshared, n1) =
        uvarint(&region[pos + n0..]).map_err(|_| SSTLiteError::BlockReadCorruption)?;
    let (value_len, n2) =
        uvarint(&region[pos + n0 + n1..]).map_err(|_| SSTLiteError::BlockReadCorruption)?;

    if shared as usize > key_buf.len() {
        return Err(SSTLiteError::BlockReadCorruption);
    }
    let key_start = pos + n0 + n1 + n2;
    let key_end = key_start
        .checked_add(unshared as usize)
        .ok_or(SSTLiteError::BlockReadCorruption)?;
    let end = key_end
        .checked_add(value_len as usize)
        .ok_or(SSTLiteError::BlockReadCorruption)?;
    if end > region.len() {
        return Err(SSTLiteError::BlockReadCorruption);
    }

    key_buf.truncate(shared as usize);
    key_buf.extend_from_slice(&region[key_start..key_end]);

    let entry = BlockEntry {
        shared,
        unshared,
        value_len,
        key: key_buf.clone(),
        value: region[key_end..end].to_vec(),
    };
    Ok(Some((entry, end)))
}

/// Iterator over the entries of a borrowed [`Block`].
pub struct BlockIter<'a> {
    region: &'a [u8],
    pos: usize,
    key: Vec<u8>,
}

impl BlockIter<'_> {
    pub fn next_entry(&mut self) -> Result<Option<BlockEntry>> {
        match parse_entry(self.region, self.pos, &mut self.key) {
            Ok(Some((entry, next_pos))) => {
                self.pos = next_pos;
                Ok(Some(entry))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                // A decode error is terminal for this iterator.
                self.pos = self.region.len();
                Err(e)
            }
        }
    }
}

impl Iterator for BlockIter<'_> {
    type Item = Result<BlockEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose()
    }
}

/// Iterator over the entries of an owned block.
pub struct BlockIntoIter {
    data: Vec<u8>,
    end: usize,
    pos: usize,
    key: Vec<u8>,
}

impl BlockIntoIter {
    pub fn next_entry(&mut self) -> Result<Option<BlockEntry>> {
        match parse_entry(&self.data[..self.end], self.pos, &mut self.key) {
            Ok(Some((entry, next_pos))) => {
                self.pos = next_pos;
                Ok(Some(entry))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                self.pos = self.end;
                Err(e)
            }
        }
    }
}

impl Iterator for BlockIntoIter {
    type Item = Result<BlockEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose()
    }
}
