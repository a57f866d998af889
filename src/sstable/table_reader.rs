use crate::bloom::BloomFilter;
use crate::byteutils::{masked_crc32c, u32_from_le_bytes};
use crate::comparator::BytewiseComparator;
use crate::error::SSTLiteError;
use crate::sstable::block::{Block, BlockIntoIter};
use crate::sstable::filter_block;
use crate::sstable::footer::{BlockHandle, Footer};
use crate::sstable::index_block::IndexSlice;
use crate::sstable::options::Options;
use crate::sstable::{Compression, BLOCK_TRAILER_SIZE, FOOTER_ENCODED_LENGTH};
use crate::Result;
use log::{debug, warn};
use std::cmp::Ordering;
use std::fmt;
use std::fs::File;
use std::io;
use std::os::unix::fs::FileExt;
use std::path::Path;

/// A sorted string table opened for reading.
///
/// The footer, meta index and block index are materialized once at open and
/// never change afterwards. Block fetches use positional reads, so a shared
/// reader never races on a seek cursor: concurrent `read` calls are safe.
pub struct TableReader {
    /// `None` once the reader has been closed.
    file: Option<File>,
    options: Options,
    meta_index_handle: BlockHandle,
    block_index_handle: BlockHandle,
    meta_index: IndexSlice,
    block_index: IndexSlice,
    filter: Option<BloomFilter>,
}

impl TableReader {
    /// Opens a table file read-only: decodes the footer, materializes the
    /// meta index and block index, and fetches the bloom filter when the
    /// meta index announces one and the options ask for it.
    pub fn open<P: AsRef<Path>>(path: P, options: Options) -> Result<TableReader> {
        let file = File::open(path.as_ref())?;
        let file_size = file.metadata()?.len();
        if file_size < FOOTER_ENCODED_LENGTH as u64 {
            return Err(SSTLiteError::WrongTableFormat);
        }

        let mut footer_buf = [0u8; FOOTER_ENCODED_LENGTH];
        read_exact_at(&file, &mut footer_buf, file_size - FOOTER_ENCODED_LENGTH as u64)?;
        let footer = Footer::decode(&footer_buf)?;

        let meta_block = read_block(&file, &footer.meta_index_handle, &options)?;
        let meta_index = IndexSlice::decode(&meta_block)?;

        // Meta-index keys are ASCII names and always bytewise-ordered,
        // whatever comparator the data uses.
        let filter = if options.filter_policy {
            let filter_key = filter_block::meta_key(BloomFilter::NAME);
            match meta_index.find(&filter_key, &BytewiseComparator) {
                Some(entry) => {
                    let block = read_block(&file, &entry.handle, &options)?;
                    Some(filter_block::decode(block))
                }
                None => None,
            }
        } else {
            None
        };

        let index_block = read_block(&file, &footer.block_index_handle, &options)?;
        let block_index = IndexSlice::decode(&index_block)?;

        debug!(
            "opened table: {} data blocks, filter {}",
            block_index.len(),
            if filter.is_some() { "present" } else { "absent" }
        );

        Ok(TableReader {
            file: Some(file),
            options,
            meta_index_handle: footer.meta_index_handle,
            block_index_handle: footer.block_index_handle,
            meta_index,
            block_index,
            filter,
        })
    }

    /// Point lookup. `NotFound` when the key is absent; corruption along the
    /// path surfaces as the corresponding error and does not poison the
    /// reader.
    pub fn read(&self, key: &[u8]) -> Result<Vec<u8>> {
        if let Some(filter) = &self.filter {
            if !filter.key_may_match(key) {
                return Err(SSTLiteError::NotFound);
            }
        }

        let cmp = self.options.comparator.as_ref();
        let i = self.block_index.search(key, cmp);
        let entry = match self.block_index.get(i) {
            Some(entry) => entry,
            None => return Err(SSTLiteError::NotFound),
        };

        let block = self.read_block(&entry.handle)?;
        match block.search(key, cmp)? {
            Some(found) => Ok(found.value),
            None => Err(SSTLiteError::NotFound),
        }
    }

    /// Iterator over every entry of every data block, in block-index order.
    pub fn iter(&self) -> TableIter<'_> {
        TableIter {
            table: self,
            next_block: 0,
            current: None,
            pending: None,
            done: false,
        }
    }

    /// Approximate byte offset in the file where data for `key` begins (or
    /// would begin). Keys past the last block map to the end of the data
    /// region.
    pub fn approximate_offset_of(&self, key: &[u8]) -> u64 {
        let i = self
            .block_index
            .search(key, self.options.comparator.as_ref());
        match self.block_index.get(i) {
            Some(entry) => entry.handle.offset,
            None => self.meta_index_handle.offset,
        }
    }

    /// Releases the file handle. Safe to call more than once; reads after
    /// close fail.
    pub fn close(&mut self) -> Result<()> {
        self.file = None;
        Ok(())
    }

    pub fn meta_index(&self) -> &IndexSlice {
        &self.meta_index
    }

    pub fn block_index(&self) -> &IndexSlice {
        &self.block_index
    }

    fn file(&self) -> Result<&File> {
        self.file
            .as_ref()
            .ok_or_else(|| SSTLiteError::Io(io::Error::new(io::ErrorKind::Other, "table is closed")))
    }

    pub(crate) fn read_block(&self, handle: &BlockHandle) -> Result<Block> {
        read_block(self.file()?, handle, &self.options)
    }
}

impl fmt::Display for TableReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SSTable {{ meta_index: {:?}, block_index: {:?} }}",
            self.meta_index_handle, self.block_index_handle
        )
    }
}

fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> Result<()> {
    file.read_exact_at(buf, offset).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            SSTLiteError::BlockReadCorruption
        } else {
            SSTLiteError::Io(e)
        }
    })
}

/// Fetches one stored block: positional read of `size + 5` bytes, checksum
/// verification over the stored bytes plus the compression tag, then
/// decompression per the tag.
fn read_block(file: &File, handle: &BlockHandle, options: &Options) -> Result<Block> {
    let size = handle.size as usize;
    let mut buffer = vec![0u8; size + BLOCK_TRAILER_SIZE];
    read_exact_at(file, &mut buffer, handle.offset)?;

    if options.verify_checksums {
        let stored = u32_from_le_bytes(&buffer[size + 1..size + 5]);
        let computed = masked_crc32c(&buffer[..size + 1]);
        if stored != computed {
            warn!(
                "block at offset {}: checksum mismatch, stored {:#010x} computed {:#010x}",
                handle.offset, stored, computed
            );
            return Err(SSTLiteError::BlockCRC32Corruption);
        }
    }

    match Compression::from_tag(buffer[size])? {
        Compression::None => {
            buffer.truncate(size);
            Ok(Block::new(buffer))
        }
        Compression::Snappy => {
            let decoded = snap::raw::Decoder::new().decompress_vec(&buffer[..size])?;
            Ok(Block::new(decoded))
        }
    }
}

/// Cursor over a whole table. Yields `(key, value)` pairs in comparator
/// order; an error ends iteration and is surfaced once.
pub struct TableIter<'a> {
    table: &'a TableReader,
    next_block: usize,
    current: Option<BlockIntoIter>,
    pending: Option<(Vec<u8>, Vec<u8>)>,
    done: bool,
}

impl TableIter<'_> {
    /// Positions the cursor so the next yielded entry is the first one with
    /// key greater or equal to `key`; returns whether such an entry exists.
    pub fn seek(&mut self, key: &[u8]) -> Result<bool> {
        self.pending = None;
        self.current = None;
        self.done = false;

        let cmp = self.table.options.comparator.as_ref();
        let i = self.table.block_index.search(key, cmp);
        let entry = match self.table.block_index.get(i) {
            Some(entry) => entry,
            None => {
                self.next_block = i;
                self.done = true;
                return Ok(false);
            }
        };

        let block = self.table.read_block(&entry.handle)?;
        let mut entries = block.into_entries();
        self.next_block = i + 1;
        while let Some(e) = entries.next_entry()? {
            if cmp.compare(&e.key, key) != Ordering::Less {
                self.pending = Some((e.key, e.value));
                break;
            }
        }
        self.current = Some(entries);

        // A miss inside this block means the target falls between blocks;
        // iteration continues at the next block's first entry.
        Ok(self.pending.is_some() || self.next_block < self.table.block_index.len())
    }
}

impl Iterator for TableIter<'_> {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(pending) = self.pending.take() {
            return Some(Ok(pending));
        }
        loop {
            if let Some(entries) = &mut self.current {
                match entries.next_entry() {
                    Ok(Some(e)) => return Some(Ok((e.key, e.value))),
                    Ok(None) => self.current = None,
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                }
            }

            let entry = match self.table.block_index.get(self.next_block) {
                Some(entry) => entry,
                None => {
                    self.done = true;
                    return None;
                }
            };
            self.next_block += 1;
            match self.table.read_block(&entry.handle) {
                Ok(block) => self.current = Some(block.into_entries()),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
