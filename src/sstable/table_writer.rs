use crate::bloom::{BloomFilter, BITS_PER_KEY};
use crate::byteutils::masked_crc32c;
use crate::ioutils::BufWriterWithPos;
use crate::sstable::block_builder::BlockBuilder;
use crate::sstable::filter_block;
use crate::sstable::footer::{BlockHandle, Footer};
use crate::sstable::options::Options;
use crate::sstable::{Compression, FOOTER_ENCODED_LENGTH, MAX_ENCODED_LENGTH};
use crate::Result;
use log::debug;
use std::cmp::Ordering;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Builds a complete table file.
///
/// Keys must be added in strictly increasing comparator order. Data blocks
/// are cut when they reach `options.block_size`; every stored block gets the
/// 5-byte trailer with the masked checksum the reader verifies. `finish`
/// writes the filter block (when the options ask for one), the meta index,
/// the index and the footer.
pub struct TableWriter {
    writer: BufWriterWithPos<File>,
    options: Options,
    data_block: BlockBuilder,
    index_entries: Vec<(Vec<u8>, BlockHandle)>,
    filter_keys: Option<Vec<Vec<u8>>>,
    last_key: Vec<u8>,
    num_entries: usize,
}

impl TableWriter {
    pub fn new<P: AsRef<Path>>(path: P, options: Options) -> Result<TableWriter> {
        let file = File::create(path)?;
        let writer = BufWriterWithPos::new(file)?;
        let data_block = BlockBuilder::new(options.block_restart_interval);
        let filter_keys = options.filter_policy.then(Vec::new);
        Ok(TableWriter {
            writer,
            options,
            data_block,
            index_entries: Vec::new(),
            filter_keys,
            last_key: Vec::new(),
            num_entries: 0,
        })
    }

    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        debug_assert!(
            self.num_entries == 0
                || self.options.comparator.compare(&self.last_key, key) == Ordering::Less,
            "keys must be added in increasing comparator order"
        );

        if let Some(keys) = &mut self.filter_keys {
            keys.push(key.to_vec());
        }

        self.data_block.add(key, value);
        self.last_key.clear();
        self.last_key.extend_from_slice(key);
        self.num_entries += 1;

        if self.data_block.current_size_estimate() >= self.options.block_size {
            self.flush_data_block()?;
        }
        Ok(())
    }

    pub fn num_entries(&self) -> usize {
        self.num_entries
    }

    fn flush_data_block(&mut self) -> Result<()> {
        if self.data_block.is_empty() {
            return Ok(());
        }
        let builder = std::mem::replace(
            &mut self.data_block,
            BlockBuilder::new(self.options.block_restart_interval),
        );
        let contents = builder.finish();
        let handle = self.write_block(&contents, self.options.compression)?;
        // The index keys the block by its last key; anything at or below it
        // resolves here, anything above falls through to the next block.
        self.index_entries.push((self.last_key.clone(), handle));
        Ok(())
    }

    /// Writes one block plus its trailer and returns the handle. The
    /// handle's size excludes the trailer; the checksum covers the stored
    /// bytes and the compression tag.
    fn write_block(&mut self, contents: &[u8], compression: Compression) -> Result<BlockHandle> {
        let offset = self.writer.pos;
        let mut stored = match compression {
            Compression::None => contents.to_vec(),
            Compression::Snappy => snap::raw::Encoder::new().compress_vec(contents)?,
        };
        let size = stored.len() as u64;
        stored.push(compression.tag());
        let checksum = masked_crc32c(&stored);
        self.writer.write_all(&stored)?;
        self.writer.write_all(&checksum.to_le_bytes())?;
        Ok(BlockHandle::new(offset, size))
    }

    /// Writes everything after the data blocks and syncs the file.
    pub fn finish(mut self) -> Result<()> {
        self.flush_data_block()?;

        let mut meta_block = BlockBuilder::new(1);
        if let Some(keys) = self.filter_keys.take() {
            let filter = BloomFilter::new(&keys, BITS_PER_KEY);
            // Filter blocks are stored uncompressed.
            let handle = self.write_block(filter.as_bytes(), Compression::None)?;
            let mut handle_buf = [0u8; MAX_ENCODED_LENGTH];
            let n = handle.encode(&mut handle_buf)?;
            meta_block.add(&filter_block::meta_key(filter.name()), &handle_buf[..n]);
        }
        let meta_contents = meta_block.finish();
        let meta_index_handle = self.write_block(&meta_contents, self.options.compression)?;

        let mut index_block = BlockBuilder::new(1);
        let mut handle_buf = [0u8; MAX_ENCODED_LENGTH];
        for (key, handle) in &self.index_entries {
            let n = handle.encode(&mut handle_buf)?;
            index_block.add(key, &handle_buf[..n]);
        }
        let index_contents = index_block.finish();
        let block_index_handle = self.write_block(&index_contents, self.options.compression)?;

        let mut footer_buf = [0u8; FOOTER_ENCODED_LENGTH];
        Footer::new(meta_index_handle, block_index_handle).encode(&mut footer_buf)?;
        self.writer.write_all(&footer_buf)?;
        self.writer.flush()?;
        self.writer.sync_data()?;

        debug!(
            "finished table: {} entries in {} data blocks",
            self.num_entries,
            self.index_entries.len()
        );
        Ok(())
    }
}
