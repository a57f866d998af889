use crate::comparator::{BytewiseComparator, Comparator};
use crate::sstable::Compression;
use std::sync::Arc;

/// Parameters for reading and writing tables.
#[derive(Clone)]
pub struct Options {
    /// Number of keys between restart points for delta encoding of keys.
    /// The reader tolerates any value a writer used.
    pub block_restart_interval: usize,

    /// Approximate size of user data packed per block, before compression.
    pub block_size: usize,

    /// Defines the order of keys in the table. The same ordering must be
    /// used for reads and writes of one table.
    pub comparator: Arc<dyn Comparator>,

    /// Compression applied to blocks written with these options.
    pub compression: Compression,

    /// Whether the reader checks the per-block checksum on every fetch.
    /// On by default; `false` is an explicit opt-out.
    pub verify_checksums: bool,

    /// Whether the writer emits a bloom filter block and the reader consults
    /// it before lookups.
    pub filter_policy: bool,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            block_restart_interval: 16,
            block_size: 4096,
            comparator: Arc::new(BytewiseComparator),
            compression: Compression::None,
            verify_checksums: true,
            filter_policy: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Options;
    use crate::sstable::Compression;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.block_restart_interval, 16);
        assert_eq!(options.block_size, 4096);
        assert_eq!(options.compression, Compression::None);
        assert!(options.verify_checksums);
        assert_eq!(options.comparator.name(), "leveldb.BytewiseComparator");
    }
}
