use crate::byteutils::append_uvarint;
use crate::comparator::shared_prefix;

/// Encodes one block: prefix-compressed entries followed by the restart
/// array and restart count.
///
/// Keys must be added in increasing order; the builder stores the full key
/// at every `restart_interval`th entry and only the unshared suffix in
/// between. Index blocks use an interval of 1 so each entry is its own
/// restart point.
pub struct BlockBuilder {
    buffer: Vec<u8>,
    restarts: Vec<u32>,
    restart_interval: usize,
    counter: usize,
    last_key: Vec<u8>,
    num_entries: usize,
}

impl BlockBuilder {
    pub fn new(restart_interval: usize) -> BlockBuilder {
        debug_assert!(restart_interval >= 1);
        BlockBuilder {
            buffer: Vec::new(),
            restarts: Vec::new(),
            restart_interval,
            counter: 0,
            last_key: Vec::new(),
            num_entries: 0,
        }
    }

    pub fn add(&mut self, key: &[u8], value: &[u8]) {
        let shared = if self.counter % self.restart_interval == 0 {
            self.restarts.push(self.buffer.len() as u32);
            self.counter = 0;
            0
        } else {
            shared_prefix(&self.last_key, key)
        };

        append_uvarint(&mut self.buffer, shared as u64);
        append_uvarint(&mut self.buffer, (key.len() - shared) as u64);
        append_uvarint(&mut self.buffer, value.len() as u64);
        self.buffer.extend_from_slice(&key[shared..]);
        self.buffer.extend_from_slice(value);

        self.last_key.clear();
        self.last_key.extend_from_slice(key);
        self.counter += 1;
        self.num_entries += 1;
    }

    /// Appends the restart array and count, consuming the builder.
    pub fn finish(mut self) -> Vec<u8> {
        for restart in &self.restarts {
            self.buffer.extend_from_slice(&restart.to_le_bytes());
        }
        self.buffer
            .extend_from_slice(&(self.restarts.len() as u32).to_le_bytes());
        self.buffer
    }

    /// Encoded size the block would have if finished now.
    pub fn current_size_estimate(&self) -> usize {
        self.buffer.len() + 4 * self.restarts.len() + 4
    }

    pub fn num_entries(&self) -> usize {
        self.num_entries
    }

    pub fn is_empty(&self) -> bool {
        self.num_entries == 0
    }

    pub fn last_key(&self) -> &[u8] {
        &self.last_key
    }
}
